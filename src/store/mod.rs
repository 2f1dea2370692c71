//! Durable storage for page artifacts and snippet images.
//!
//! Layout under the store root is deterministic per document:
//!
//! ```text
//! {root}/{document}.pdf          copied source file
//! {root}/{document}/{page}.png   full-resolution raster
//! {root}/{document}/{page}_thumb.png
//! {root}/{document}/{page}.json  page record (boxes, stems, dimensions)
//! ```
//!
//! The page record is the visibility marker: it is written last, to a
//! temporary path followed by an atomic rename, so a concurrent query never
//! observes a half-written page. Loads fail fast on missing files and
//! surface [`Error::NotFound`] rather than blocking.

use crate::error::{Error, Result};
use crate::index::PageIndex;
use image::DynamicImage;
use std::fs;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// File extension of rasters, thumbnails and snippet images.
pub const RASTER_EXTENSION: &str = "png";

/// Access to the per-document artifact tree and the snippet image store.
#[derive(Debug, Clone)]
pub struct PageStore {
    root: PathBuf,
    snippet_dir: PathBuf,
}

impl PageStore {
    /// Open a store rooted at `root`, with snippet images under
    /// `snippet_dir`. Both directories are created if absent.
    pub fn new(root: impl Into<PathBuf>, snippet_dir: impl Into<PathBuf>) -> Result<Self> {
        let store = Self {
            root: root.into(),
            snippet_dir: snippet_dir.into(),
        };
        fs::create_dir_all(&store.root)?;
        fs::create_dir_all(&store.snippet_dir)?;
        Ok(store)
    }

    /// Directory holding one document's page artifacts.
    pub fn document_dir(&self, document: &str) -> PathBuf {
        self.root.join(document)
    }

    /// Path of the copied source file.
    pub fn source_path(&self, document: &str) -> PathBuf {
        self.root.join(format!("{document}.pdf"))
    }

    /// Path of a page's full-resolution raster.
    pub fn raster_path(&self, document: &str, page: u32) -> PathBuf {
        self.document_dir(document)
            .join(format!("{page}.{RASTER_EXTENSION}"))
    }

    /// Path of a page's thumbnail raster.
    pub fn thumbnail_path(&self, document: &str, page: u32) -> PathBuf {
        self.document_dir(document)
            .join(format!("{page}_thumb.{RASTER_EXTENSION}"))
    }

    /// Path of a page's persisted record.
    pub fn record_path(&self, document: &str, page: u32) -> PathBuf {
        self.document_dir(document).join(format!("{page}.json"))
    }

    /// Path of a stored snippet image.
    pub fn snippet_path(&self, name: &str) -> PathBuf {
        self.snippet_dir.join(format!("{name}.{RASTER_EXTENSION}"))
    }

    /// Create the document directory and copy the source file in, unless a
    /// copy already exists.
    pub fn prepare_document(&self, document: &str, source: &Path) -> Result<()> {
        fs::create_dir_all(self.document_dir(document))?;
        let copy = self.source_path(document);
        if !copy.is_file() {
            fs::copy(source, &copy)?;
        }
        Ok(())
    }

    /// Whether a page's record (the visibility marker) exists.
    pub fn page_record_exists(&self, document: &str, page: u32) -> bool {
        self.record_path(document, page).is_file()
    }

    /// Load a page's persisted record.
    ///
    /// A missing record surfaces [`Error::NotFound`]; it is never retried.
    pub fn load_page_index(&self, document: &str, page: u32) -> Result<PageIndex> {
        let path = self.record_path(document, page);
        let file = fs::File::open(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::NotFound {
                    document: document.to_string(),
                    page: Some(page),
                }
            } else {
                Error::Io(e)
            }
        })?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    /// Persist a page record atomically: write to a temporary sibling path,
    /// then rename over the final name.
    pub fn write_page_index(&self, document: &str, page: u32, index: &PageIndex) -> Result<()> {
        let path = self.record_path(document, page);
        let tmp = self
            .document_dir(document)
            .join(format!("{page}.json.tmp"));
        let file = fs::File::create(&tmp)?;
        serde_json::to_writer(BufWriter::new(file), index)?;
        fs::rename(&tmp, &path)?;
        log::debug!("wrote page record {}", path.display());
        Ok(())
    }

    /// Write a page's full-resolution raster.
    pub fn write_page_raster(&self, document: &str, page: u32, image: &DynamicImage) -> Result<()> {
        image.save(self.raster_path(document, page))?;
        Ok(())
    }

    /// Write a page's thumbnail raster.
    pub fn write_page_thumbnail(
        &self,
        document: &str,
        page: u32,
        image: &DynamicImage,
    ) -> Result<()> {
        image.save(self.thumbnail_path(document, page))?;
        Ok(())
    }

    /// Open a page's thumbnail raster.
    ///
    /// Missing thumbnails surface [`Error::NotFound`] like missing records.
    pub fn load_page_thumbnail(&self, document: &str, page: u32) -> Result<DynamicImage> {
        let path = self.thumbnail_path(document, page);
        if !path.is_file() {
            return Err(Error::NotFound {
                document: document.to_string(),
                page: Some(page),
            });
        }
        Ok(image::open(path)?)
    }

    /// Persist a snippet crop under a generated unique name and return the
    /// name.
    pub fn store_snippet(&self, image: &DynamicImage) -> Result<String> {
        let name = Uuid::new_v4().simple().to_string();
        image.save(self.snippet_path(&name))?;
        Ok(name)
    }

    /// Remove whatever artifacts exist for one page. Best effort: used while
    /// cleaning up after a failed page import, so individual misses are fine.
    pub fn remove_page_artifacts(&self, document: &str, page: u32) {
        for path in [
            self.raster_path(document, page),
            self.thumbnail_path(document, page),
            self.record_path(document, page),
        ] {
            if let Err(e) = fs::remove_file(&path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    log::warn!("could not remove {}: {}", path.display(), e);
                }
            }
        }
    }

    /// Remove a document's artifact directory and its copied source file.
    ///
    /// Returns the removed paths. Fails with [`Error::NotFound`] when neither
    /// existed.
    pub fn remove_document(&self, document: &str) -> Result<Vec<PathBuf>> {
        let mut removed = Vec::new();

        let dir = self.document_dir(document);
        match fs::remove_dir_all(&dir) {
            Ok(()) => removed.push(dir),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {},
            Err(e) => return Err(Error::Io(e)),
        }

        let source = self.source_path(document);
        match fs::remove_file(&source) {
            Ok(()) => removed.push(source),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {},
            Err(e) => return Err(Error::Io(e)),
        }

        if removed.is_empty() {
            return Err(Error::NotFound {
                document: document.to_string(),
                page: None,
            });
        }
        log::info!("removed document '{}' ({} paths)", document, removed.len());
        Ok(removed)
    }

    /// Delete every stored snippet image and return how many were removed.
    pub fn clear_snippets(&self) -> Result<usize> {
        let mut removed = 0;
        for entry in fs::read_dir(&self.snippet_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                fs::remove_file(entry.path())?;
                removed += 1;
            }
        }
        log::info!("snippet cleanup removed {} files", removed);
        Ok(removed)
    }
}
