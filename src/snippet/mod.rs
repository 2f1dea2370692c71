//! Snippet image construction for resolved hits.
//!
//! For each hit, the boxes of every relevant term are converted into the
//! thumbnail's pixel space, padded vertically, merged into full-width row
//! strips, and cropped out of the thumbnail raster. Each crop is persisted
//! under a unique name and returned together with its document-space bounds
//! and a snippet-local word-box list in which relevant words are marked.

use crate::error::Result;
use crate::geometry::{self, DocBox, PixelBox};
use crate::relevance::RelevantTermSet;
use crate::store::PageStore;
use serde::{Deserialize, Serialize};

/// Default vertical padding around merged snippet strips, as a fraction of
/// the thumbnail height.
pub const DEFAULT_MARGIN_FRACTION: f32 = 0.01;

/// One word box inside a snippet, with coordinates local to the snippet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnippetBox {
    /// The word's box, re-based to the snippet's bottom edge
    #[serde(rename = "box")]
    pub bounds: DocBox,
    /// The lower-cased word
    pub word: String,
    /// Whether this word justified the hit
    pub relevant: bool,
}

/// A cropped, annotated snippet image for one hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snippet {
    /// Name of the stored crop in the snippet store
    #[serde(rename = "imageReference")]
    pub image_reference: String,
    /// The snippet's extent on the page, in document space
    pub bounds: DocBox,
    /// Every word box inside the snippet, relevance-marked
    pub boxes: Vec<SnippetBox>,
}

/// Builds snippet images from a page's stored artifacts.
pub struct SnippetBuilder<'a> {
    store: &'a PageStore,
    margin_fraction: f32,
}

impl<'a> SnippetBuilder<'a> {
    /// Create a builder with [`DEFAULT_MARGIN_FRACTION`].
    pub fn new(store: &'a PageStore) -> Self {
        Self {
            store,
            margin_fraction: DEFAULT_MARGIN_FRACTION,
        }
    }

    /// Override the vertical margin fraction.
    pub fn with_margin_fraction(mut self, margin_fraction: f32) -> Self {
        self.margin_fraction = margin_fraction;
        self
    }

    /// Build all snippets for one resolved hit.
    ///
    /// Loads the page record and thumbnail, so a page that was never imported
    /// surfaces [`crate::Error::NotFound`]. A hit with no relevant terms
    /// yields an empty list.
    pub fn build(
        &self,
        document: &str,
        page: u32,
        relevant: &RelevantTermSet,
    ) -> Result<Vec<Snippet>> {
        let index = self.store.load_page_index(document, page)?;
        let thumbnail = self.store.load_page_thumbnail(document, page)?;
        let thumb_width = thumbnail.width() as f32;
        let thumb_height = thumbnail.height() as f32;
        let thumb_scale = index.dimensions.thumb_scale;

        let mut term_boxes: Vec<PixelBox> = Vec::new();
        for term in &relevant.terms {
            if let Some(boxes) = index.boxes.get(term) {
                for b in boxes {
                    let px = geometry::document_to_pixel(b, thumb_scale, thumb_height);
                    term_boxes.push(geometry::apply_margin(
                        &px,
                        thumb_width,
                        thumb_height,
                        self.margin_fraction,
                    ));
                }
            }
        }
        let merged = geometry::merge_vertically(&term_boxes, thumb_width);
        log::debug!(
            "building {} snippets for '{}' page {}",
            merged.len(),
            document,
            page
        );

        let mut snippets = Vec::with_capacity(merged.len());
        for strip in merged {
            let crop = crop_strip(&thumbnail, &strip);
            if crop.width() == 0 || crop.height() == 0 {
                continue;
            }
            let image_reference = self.store.store_snippet(&crop)?;
            let bounds = geometry::pixel_to_document(&strip, thumb_scale, thumb_height);
            let boxes = geometry::flatten_and_clip(&index.boxes, &bounds)
                .into_iter()
                .map(|c| SnippetBox {
                    relevant: relevant.terms.contains(&c.word)
                        || relevant.positions.contains(&c.page_position),
                    bounds: c.bounds,
                    word: c.word,
                })
                .collect();
            snippets.push(Snippet {
                image_reference,
                bounds,
                boxes,
            });
        }
        Ok(snippets)
    }
}

/// Crop one merged strip out of the thumbnail, clamped to the image.
fn crop_strip(image: &image::DynamicImage, strip: &PixelBox) -> image::DynamicImage {
    let x0 = strip.x0.max(0.0) as u32;
    let y0 = strip.y0.max(0.0) as u32;
    let x1 = (strip.x1.ceil() as u32).min(image.width());
    let y1 = (strip.y1.ceil() as u32).min(image.height());
    image.crop_imm(x0, y0, x1.saturating_sub(x0), y1.saturating_sub(y0))
}
