//! # pagemark
//!
//! Page indexing and snippet-relevance engine for multilingual full-text
//! search over scanned/digital documents.
//!
//! At import time the [`index`] module walks a parsed page layout, builds an
//! inverted word → bounding-box index plus a per-language stem table, and
//! persists one JSON record per page through the [`store`] module. At query
//! time the [`relevance`] module decides which on-page terms justify a hit
//! (stem matches across translated query variants plus phrase-level synonym
//! matches), and the [`snippet`] module merges the matching boxes into
//! full-width row strips, crops them out of the page raster and annotates
//! every contained word box.
//!
//! The HTTP surface, document ranking, PDF parsing and rasterization are
//! external collaborators; see the traits in [`engine`] and the layout input
//! model in [`layout`].
//!
//! ## Quick start
//!
//! ```no_run
//! use pagemark::engine::{PageRasterizer, SearchEngine};
//! use pagemark::index::DocumentImporter;
//! use pagemark::relevance::{resolve, QueryTermSet, TranslationVariant};
//! use pagemark::snippet::SnippetBuilder;
//! use pagemark::store::PageStore;
//!
//! # fn run(rasterizer: &dyn PageRasterizer, engine: &dyn SearchEngine,
//! #        pages: &[pagemark::layout::PageLayout]) -> pagemark::Result<()> {
//! let store = PageStore::new("data/metadata", "data/snippets")?;
//! let importer = DocumentImporter::new(&store, rasterizer, engine);
//! importer.import_document("report", "archive", "report.pdf".as_ref(), pages)?;
//!
//! let query = QueryTermSet::from_translations(
//!     &[TranslationVariant { language_code: "en".into(), content: vec!["signal".into()] }],
//!     vec![],
//! );
//! for hit in engine.query(&["signal".into()])? {
//!     let page_index = store.load_page_index(&hit.parent_doc, hit.page)?;
//!     let relevant = resolve(&page_index, &hit.language, &query);
//!     let snippets = SnippetBuilder::new(&store).build(&hit.parent_doc, hit.page, &relevant)?;
//!     println!("{} snippets for {}/{}", snippets.len(), hit.parent_doc, hit.page);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

// Error handling
pub mod error;

// Pure geometry over word bounding boxes
pub mod geometry;

// Multilingual stem tables
pub mod stem;

// Phrase-level synonym matching
pub mod synonym;

// Parsed-page input model (external Document Layout Parser output)
pub mod layout;

// Import-time page indexing
pub mod index;

// Durable page artifacts and snippet images
pub mod store;

// Query-time relevance resolution
pub mod relevance;

// Query-time snippet building
pub mod snippet;

// External collaborator seams (search engine, rasterizer)
pub mod engine;

// Re-exports
pub use error::{Error, Result};
pub use geometry::{DocBox, PixelBox};
pub use index::{DocumentImporter, PageDimensions, PageIndex};
pub use relevance::{QueryTermSet, RelevantTermSet};
pub use snippet::{Snippet, SnippetBuilder};
pub use store::PageStore;

// Internal utilities
pub(crate) mod utils {
    //! Internal utility functions for the library.

    use std::cmp::Ordering;

    /// Safely compare two floating point numbers, handling NaN cases.
    ///
    /// NaN values are treated as equal to each other and greater than all
    /// other values, so sorting operations never panic on NaN.
    #[inline]
    pub fn safe_float_cmp(a: f32, b: f32) -> Ordering {
        match (a.is_nan(), b.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => {
                // Both are normal numbers, safe to unwrap
                a.partial_cmp(&b).unwrap()
            },
        }
    }

}

// Version info
/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
