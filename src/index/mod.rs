//! Import-time page indexing.
//!
//! For each parsed page this module builds the inverted word → bounding-box
//! index (walking the layout tree line by line, accumulating valid characters
//! into words), detects the page's dominant language, computes the stem table
//! and the document-unit → pixel scale factors, and persists everything as
//! the page's record. [`DocumentImporter`] orchestrates a whole document:
//! page failures are cleaned up and reported per page so the rest of the
//! document continues; search-engine unavailability aborts the remainder.

use crate::engine::{PageFeed, PageRasterizer, SearchEngine};
use crate::error::{Error, Result};
use crate::geometry::DocBox;
use crate::layout::{LayoutNode, PageLayout};
use crate::stem::{self, StemEntry, UNKNOWN_LANGUAGE};
use crate::store::PageStore;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Punctuation characters allowed inside a word besides alphanumerics.
const ALLOWED_PUNCTUATION: [char; 3] = ['-', '&', '/'];

/// Thumbnails are bounded to at least this many document units per axis.
const THUMBNAIL_MIN_BOUND: f32 = 1500.0;

/// Scale factors between document units and the page's rasters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageDimensions {
    /// Document units → pixels for the full-resolution raster
    pub scale: f32,
    /// Document units → pixels for the thumbnail raster
    #[serde(rename = "thumbScale")]
    pub thumb_scale: f32,
    /// Page width in document units
    #[serde(rename = "origWidth")]
    pub orig_width: f32,
    /// Page height in document units
    #[serde(rename = "origHeight")]
    pub orig_height: f32,
}

/// One page's persisted index record: created once at import, immutable
/// thereafter (a re-import overwrites it wholesale), read-only to all
/// query-time consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageIndex {
    /// Inverted index: lower-cased word → bounding boxes in document space,
    /// in first-seen order
    pub boxes: IndexMap<String, Vec<DocBox>>,
    /// Stem → surface terms and languages for the page's word set
    pub stems: BTreeMap<String, StemEntry>,
    /// Scale factors and original page size
    pub dimensions: PageDimensions,
}

/// Whether a character glyph can join the current word.
///
/// Alphanumerics and a fixed punctuation set (`-`, `&`, `/`) are valid;
/// spaces and everything else end the word. Multi-character glyph text (e.g.
/// a ligature expansion) is valid only if every character is.
fn is_word_char(text: &str) -> bool {
    !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_alphanumeric() || ALLOWED_PUNCTUATION.contains(&c))
}

/// Extract the inverted word → boxes index for one page.
///
/// Runs per line: consecutive valid characters accumulate into the current
/// word while its bounding box grows by min/max over the characters' extents;
/// any invalid character (including space) flushes the word lower-cased.
/// Word boundaries never cross lines.
pub fn extract_word_boxes(layout: &PageLayout) -> IndexMap<String, Vec<DocBox>> {
    let mut boxes: IndexMap<String, Vec<DocBox>> = IndexMap::new();
    for line in layout.root.lines() {
        let LayoutNode::Line { children } = line else {
            continue;
        };
        let mut current_word = String::new();
        let mut current_box = DocBox::seed();
        for child in children {
            match child {
                LayoutNode::Char {
                    text,
                    x0,
                    y0,
                    x1,
                    y1,
                } if is_word_char(text) => {
                    current_word.push_str(text);
                    current_box.expand(*x0, *y0, *x1, *y1);
                },
                _ => flush_word(&mut boxes, &mut current_word, &mut current_box),
            }
        }
        flush_word(&mut boxes, &mut current_word, &mut current_box);
    }
    boxes
}

/// Store the accumulated word (if any) and reset the accumulator.
fn flush_word(
    boxes: &mut IndexMap<String, Vec<DocBox>>,
    current_word: &mut String,
    current_box: &mut DocBox,
) {
    if !current_word.is_empty() {
        boxes
            .entry(current_word.to_lowercase())
            .or_default()
            .push(*current_box);
    }
    current_word.clear();
    *current_box = DocBox::seed();
}

/// Detect the dominant language of a page's text.
///
/// Returns an ISO 639-1 code from the stemmer table, or
/// [`UNKNOWN_LANGUAGE`] when detection is indeterminate. Never fails.
pub fn detect_page_language(text: &str) -> String {
    match whatlang::detect_lang(text) {
        Some(lang) => iso639_1(lang).to_string(),
        None => UNKNOWN_LANGUAGE.to_string(),
    }
}

/// Map a detected language to the ISO 639-1 codes the stemmer table uses.
fn iso639_1(lang: whatlang::Lang) -> &'static str {
    use whatlang::Lang;
    match lang {
        Lang::Deu => "de",
        Lang::Eng => "en",
        Lang::Fra => "fr",
        Lang::Cat => "ca",
        Lang::Ita => "it",
        Lang::Spa => "es",
        Lang::Rus => "ru",
        Lang::Pol => "pl",
        Lang::Ben => "bn",
        Lang::Dan => "da",
        _ => UNKNOWN_LANGUAGE,
    }
}

/// Build one page's index record.
///
/// `language` is the page's detected language; `raster_width` and
/// `thumb_width` are the pixel widths of the two rasters the scale factors
/// refer to.
pub fn index_page(
    layout: &PageLayout,
    language: &str,
    raster_width: u32,
    thumb_width: u32,
) -> PageIndex {
    let boxes = extract_word_boxes(layout);
    let stems = stem::stems_for_words(boxes.keys().map(String::as_str), language);
    PageIndex {
        boxes,
        stems,
        dimensions: PageDimensions {
            scale: raster_width as f32 / layout.width,
            thumb_scale: thumb_width as f32 / layout.width,
            orig_width: layout.width,
            orig_height: layout.height,
        },
    }
}

/// Result of importing one document.
#[derive(Debug, Default)]
pub struct ImportOutcome {
    /// Pages whose artifacts were written and fed
    pub pages_imported: Vec<u32>,
    /// Pages skipped because their record already existed
    pub pages_skipped: Vec<u32>,
    /// Page-scoped failures; each page's partial artifacts were removed
    pub page_failures: Vec<Error>,
}

/// Imports documents page by page: raster, thumbnail, index record, search
/// engine feed. Collaborators are injected; the importer owns no clients.
pub struct DocumentImporter<'a> {
    store: &'a PageStore,
    rasterizer: &'a dyn PageRasterizer,
    engine: &'a dyn SearchEngine,
}

impl<'a> DocumentImporter<'a> {
    /// Create an importer over the given store and collaborators.
    pub fn new(
        store: &'a PageStore,
        rasterizer: &'a dyn PageRasterizer,
        engine: &'a dyn SearchEngine,
    ) -> Self {
        Self {
            store,
            rasterizer,
            engine,
        }
    }

    /// Import a whole document.
    ///
    /// Pages are independent: a failing page is cleaned up, recorded in the
    /// outcome and the rest of the document continues. Two failures are not
    /// page-recoverable and abort instead: anything before the first page is
    /// reached (document-scoped), and search-engine unavailability (later
    /// feeds would also fail).
    pub fn import_document(
        &self,
        document: &str,
        collection: &str,
        source: &Path,
        pages: &[PageLayout],
    ) -> Result<ImportOutcome> {
        self.store
            .prepare_document(document, source)
            .map_err(|e| Error::DocumentImport {
                document: document.to_string(),
                source: Box::new(e),
            })?;

        let mut outcome = ImportOutcome::default();
        for (page_no, layout) in pages.iter().enumerate() {
            let page = page_no as u32;
            if self.store.page_record_exists(document, page) {
                log::debug!("page {}/{} already imported, skipping", document, page);
                outcome.pages_skipped.push(page);
                continue;
            }
            match self.import_page(document, collection, source, page, layout) {
                Ok(()) => outcome.pages_imported.push(page),
                Err(e) if e.aborts_import() => return Err(e),
                Err(e) => {
                    log::warn!("cleaning up failed page {}/{}: {}", document, page, e);
                    self.store.remove_page_artifacts(document, page);
                    outcome.page_failures.push(Error::PageImport {
                        document: document.to_string(),
                        page,
                        source: Box::new(e),
                    });
                },
            }
        }
        Ok(outcome)
    }

    /// Import one page. The record write comes last so the page only becomes
    /// visible once every artifact exists.
    fn import_page(
        &self,
        document: &str,
        collection: &str,
        source: &Path,
        page: u32,
        layout: &PageLayout,
    ) -> Result<()> {
        // Rasterizer page numbers are 1-based.
        let raster = self.rasterizer.rasterize(source, page + 1)?;
        let thumb = raster.thumbnail(
            layout.width.max(THUMBNAIL_MIN_BOUND) as u32,
            layout.height.max(THUMBNAIL_MIN_BOUND) as u32,
        );

        let language = detect_page_language(&layout.text);
        let index = index_page(layout, &language, raster.width(), thumb.width());

        self.store.write_page_raster(document, page, &raster)?;
        self.store.write_page_thumbnail(document, page, &thumb)?;
        self.engine.feed(&PageFeed {
            language,
            parent_doc: document.to_string(),
            page,
            collection: collection.to_string(),
            body: layout.text.clone(),
        })?;
        self.store.write_page_index(document, page, &index)?;
        log::info!("imported page {}/{}", document, page);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(chars: &[(&str, f32)]) -> LayoutNode {
        // Each char is 10 units wide, 10 tall, at y 100..110.
        LayoutNode::Line {
            children: chars
                .iter()
                .map(|(text, x)| LayoutNode::ch(text, *x, 100.0, x + 10.0, 110.0))
                .collect(),
        }
    }

    fn page_with(root: LayoutNode, text: &str) -> PageLayout {
        PageLayout {
            width: 600.0,
            height: 800.0,
            text: text.to_string(),
            root,
        }
    }

    #[test]
    fn test_words_split_on_space_and_lowercased() {
        let root = LayoutNode::Container {
            children: vec![line(&[
                ("S", 0.0),
                ("o", 10.0),
                (" ", 20.0),
                ("B", 30.0),
                ("e", 40.0),
            ])],
        };
        let boxes = extract_word_boxes(&page_with(root, ""));
        assert_eq!(boxes.len(), 2);
        assert_eq!(boxes["so"], vec![DocBox::new(0.0, 20.0, 100.0, 110.0)]);
        assert_eq!(boxes["be"], vec![DocBox::new(30.0, 50.0, 100.0, 110.0)]);
    }

    #[test]
    fn test_allowed_punctuation_stays_in_word() {
        let root = LayoutNode::Container {
            children: vec![line(&[
                ("a", 0.0),
                ("-", 10.0),
                ("b", 20.0),
                (".", 30.0),
                ("c", 40.0),
            ])],
        };
        let boxes = extract_word_boxes(&page_with(root, ""));
        assert!(boxes.contains_key("a-b"));
        assert!(boxes.contains_key("c"));
        assert!(!boxes.contains_key("."));
    }

    #[test]
    fn test_word_boundaries_never_cross_lines() {
        let root = LayoutNode::Container {
            children: vec![line(&[("a", 0.0), ("b", 10.0)]), line(&[("c", 0.0)])],
        };
        let boxes = extract_word_boxes(&page_with(root, ""));
        assert!(boxes.contains_key("ab"));
        assert!(boxes.contains_key("c"));
        assert!(!boxes.contains_key("abc"));
    }

    #[test]
    fn test_repeated_word_accumulates_boxes() {
        let root = LayoutNode::Container {
            children: vec![
                line(&[("h", 0.0), ("i", 10.0)]),
                line(&[("h", 200.0), ("i", 210.0)]),
            ],
        };
        let boxes = extract_word_boxes(&page_with(root, ""));
        assert_eq!(boxes["hi"].len(), 2);
    }

    #[test]
    fn test_detect_language_fallback_on_empty() {
        assert_eq!(detect_page_language(""), UNKNOWN_LANGUAGE);
    }

    #[test]
    fn test_detect_language_english() {
        let text = "The signal corps established communication lines across the \
                    valley while the engineers surveyed the northern bridge for \
                    the coming winter campaign.";
        assert_eq!(detect_page_language(text), "en");
    }

    #[test]
    fn test_index_page_dimensions() {
        let root = LayoutNode::Container { children: vec![] };
        let layout = page_with(root, "");
        let index = index_page(&layout, "en", 1200, 600);
        assert_eq!(index.dimensions.scale, 2.0);
        assert_eq!(index.dimensions.thumb_scale, 1.0);
        assert_eq!(index.dimensions.orig_width, 600.0);
        assert_eq!(index.dimensions.orig_height, 800.0);
    }

    #[test]
    fn test_index_page_stems_cover_words() {
        let root = LayoutNode::Container {
            children: vec![line(&[
                ("s", 0.0),
                ("i", 10.0),
                ("g", 20.0),
                ("n", 30.0),
                ("a", 40.0),
                ("l", 50.0),
                ("s", 60.0),
            ])],
        };
        let index = index_page(&page_with(root, ""), "en", 1200, 600);
        assert!(index.stems["signal"].terms.contains("signals"));
    }
}
