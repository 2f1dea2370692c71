//! Seams for the external collaborators the core depends on.
//!
//! The search engine and the page rasterizer are injected into the importer
//! and the query-time components as trait objects, with lifecycle owned by
//! the caller (open at service start, close at shutdown). The core never
//! instantiates clients itself.

use crate::error::Result;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One per-page document fed into the search engine at import time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageFeed {
    /// Detected page language (ISO 639-1, or `"un"`)
    pub language: String,
    /// Name of the parent document
    pub parent_doc: String,
    /// Zero-based page number
    pub page: u32,
    /// Collection this document belongs to
    pub collection: String,
    /// The page's full text
    pub body: String,
}

/// A candidate (document, page) pair returned by the search engine.
///
/// Engine-specific ranking metadata is opaque to the core and not modelled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Name of the parent document
    pub parent_doc: String,
    /// Zero-based page number
    pub page: u32,
    /// Language the engine detected for the page at feed time
    pub language: String,
}

/// The external full-text search engine.
pub trait SearchEngine {
    /// Feed one page document for indexing.
    ///
    /// Fails with [`crate::Error::EngineUnavailable`] when the engine is
    /// unreachable; such failures abort the remainder of a batch import.
    fn feed(&self, page: &PageFeed) -> Result<()>;

    /// Run a query and return candidate hits.
    ///
    /// Fails with [`crate::Error::EngineTimeout`] when the engine does not
    /// respond within budget, distinctly from a missing page record.
    fn query(&self, phrases: &[String]) -> Result<Vec<SearchHit>>;
}

/// The external page rasterizer.
pub trait PageRasterizer {
    /// Render one page of a source document to a full-resolution raster.
    ///
    /// `page_number` is 1-based, matching the rasterizer convention.
    fn rasterize(&self, source: &Path, page_number: u32) -> Result<DynamicImage>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_feed_serializes_with_engine_field_names() {
        let feed = PageFeed {
            language: "en".to_string(),
            parent_doc: "report".to_string(),
            page: 2,
            collection: "archive".to_string(),
            body: "the signal corps".to_string(),
        };
        let json = serde_json::to_value(&feed).unwrap();
        assert_eq!(json["parent_doc"], "report");
        assert_eq!(json["page"], 2);
        assert_eq!(json["language"], "en");
    }
}
