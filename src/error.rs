//! Error types for the page indexing and snippet engine.
//!
//! Pure geometry/stemming/synonym functions never fail on malformed but
//! well-typed input; only I/O-bound steps (rasterization, artifact writes,
//! search-engine calls) produce errors.

/// Result type alias for pagemark operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while importing pages or building snippets.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// One page of a document failed to import; the rest of the document
    /// continues. All partial artifacts for the page have been removed.
    #[error("failed to import page {page} of '{document}': {source}")]
    PageImport {
        /// Document the page belongs to
        document: String,
        /// Zero-based page number
        page: u32,
        /// Underlying failure
        #[source]
        source: Box<Error>,
    },

    /// The document failed before any page was reached (e.g. the raw file
    /// could not be read); the whole import is abandoned.
    #[error("failed to import document '{document}': {source}")]
    DocumentImport {
        /// Document name
        document: String,
        /// Underlying failure
        #[source]
        source: Box<Error>,
    },

    /// The search engine is unreachable at feed time. Aborts the remaining
    /// import since further feeds will also fail.
    #[error("search engine unavailable: {0}")]
    EngineUnavailable(String),

    /// The search engine did not respond within budget. Distinct from
    /// [`Error::NotFound`] so callers can choose to retry.
    #[error("search engine timed out: {0}")]
    EngineTimeout(String),

    /// A requested (document, page) has no page record.
    #[error("no page record for '{document}' page {page:?}")]
    NotFound {
        /// Document name
        document: String,
        /// Page number, when the lookup was page-scoped
        page: Option<u32>,
    },

    /// Page rasterization failed.
    #[error("rasterization error: {0}")]
    Raster(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decode/encode error
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// Page record (de)serialization error
    #[error("page record error: {0}")]
    Record(#[from] serde_json::Error),
}

impl Error {
    /// True for search-engine failures that will also hit every later page,
    /// so a batch import should abort instead of cleaning up and continuing.
    pub fn aborts_import(&self) -> bool {
        matches!(self, Error::EngineUnavailable(_) | Error::EngineTimeout(_))
    }
}
