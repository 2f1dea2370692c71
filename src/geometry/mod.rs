//! Geometric primitives for word bounding boxes.
//!
//! Two coordinate spaces are in play and each gets its own type so the space
//! tag is explicit at the seams:
//!
//! - [`DocBox`] — document space, `[x0, x1, y0, y1]`, origin at the bottom
//!   left, y increasing upward. This is what the layout parser yields and what
//!   page records persist.
//! - [`PixelBox`] — raster space, `[x0, y0, x1, y1]`, origin at the top left,
//!   y increasing downward. This is what image cropping consumes.
//!
//! All functions here are pure: empty inputs are normal, never errors.

use crate::utils::safe_float_cmp;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Two boxes whose top edges differ by at most this many document units are
/// considered part of the same text row when sorting into reading order.
pub const ROW_TOLERANCE: f32 = 10.0;

/// An axis-aligned box in document space (y up), stored as `[x0, x1, y0, y1]`.
///
/// Built by min/max accumulation, so `x0 <= x1` and `y0 <= y1` always hold
/// for boxes produced by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct DocBox {
    /// Left edge
    pub x0: f32,
    /// Right edge
    pub x1: f32,
    /// Bottom edge (document space: smaller y is lower on the page)
    pub y0: f32,
    /// Top edge
    pub y1: f32,
}

impl DocBox {
    /// Create a box from its four edges.
    pub fn new(x0: f32, x1: f32, y0: f32, y1: f32) -> Self {
        Self { x0, x1, y0, y1 }
    }

    /// An inverted box that any [`expand`](Self::expand) call will replace.
    /// Used as the seed while accumulating character boxes into a word box.
    pub fn seed() -> Self {
        Self {
            x0: f32::MAX,
            x1: f32::MIN,
            y0: f32::MAX,
            y1: f32::MIN,
        }
    }

    /// Grow the box to cover another character's extent.
    pub fn expand(&mut self, x0: f32, y0: f32, x1: f32, y1: f32) {
        self.x0 = self.x0.min(x0);
        self.x1 = self.x1.max(x1);
        self.y0 = self.y0.min(y0);
        self.y1 = self.y1.max(y1);
    }
}

impl From<[f32; 4]> for DocBox {
    fn from(v: [f32; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<DocBox> for [f32; 4] {
    fn from(b: DocBox) -> Self {
        [b.x0, b.x1, b.y0, b.y1]
    }
}

/// An axis-aligned box in raster space (y down), stored as `[x0, y0, x1, y1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct PixelBox {
    /// Left edge
    pub x0: f32,
    /// Top edge (raster space: smaller y is higher in the image)
    pub y0: f32,
    /// Right edge
    pub x1: f32,
    /// Bottom edge
    pub y1: f32,
}

impl PixelBox {
    /// Create a box from its four edges.
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }
}

impl From<[f32; 4]> for PixelBox {
    fn from(v: [f32; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<PixelBox> for [f32; 4] {
    fn from(b: PixelBox) -> Self {
        [b.x0, b.y0, b.x1, b.y1]
    }
}

/// One word box in a flattened reading-order sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatBox {
    /// The word's bounding box in document space
    pub bounds: DocBox,
    /// The lower-cased word
    pub word: String,
}

/// A [`FlatBox`] that survived clipping to a snippet region.
#[derive(Debug, Clone, PartialEq)]
pub struct ClippedBox {
    /// The word's box, vertically re-based to the snippet's bottom edge
    pub bounds: DocBox,
    /// The lower-cased word
    pub word: String,
    /// Index of this word in the *page's* reading-order sequence
    pub page_position: usize,
}

/// Flatten a word → boxes index into a reading-order sequence.
///
/// Boxes whose rounded right edge exceeds `max_width` or whose rounded top
/// edge exceeds `max_height` are dropped; pass `f32::INFINITY` for no cap.
///
/// Reading order is row-tolerant: boxes whose top edges differ by more than
/// [`ROW_TOLERANCE`] order top-to-bottom (document space, so the larger y
/// is higher up and sorts first); boxes within tolerance are the same row and
/// order left-to-right. Row membership is decided by pairwise comparison, not
/// bucketing, so the comparator is explicit.
pub fn flatten(
    boxes: &IndexMap<String, Vec<DocBox>>,
    max_width: f32,
    max_height: f32,
) -> Vec<FlatBox> {
    let mut flat: Vec<FlatBox> = Vec::new();
    for (word, word_boxes) in boxes {
        for b in word_boxes {
            if b.x1.round() <= max_width && b.y1.round() <= max_height {
                flat.push(FlatBox {
                    bounds: *b,
                    word: word.clone(),
                });
            }
        }
    }
    flat.sort_by(cmp_reading_order);
    flat
}

/// Pairwise reading-order comparison of two word boxes.
fn cmp_reading_order(a: &FlatBox, b: &FlatBox) -> Ordering {
    let height_difference = a.bounds.y0 - b.bounds.y0;
    if height_difference > ROW_TOLERANCE {
        // first box higher up the page
        Ordering::Less
    } else if height_difference.abs() <= ROW_TOLERANCE {
        // approximately the same row: left to right
        safe_float_cmp(a.bounds.x0, b.bounds.x0)
    } else {
        Ordering::Greater
    }
}

/// Flatten into reading order, then keep only boxes fully contained in
/// `surrounding` and re-base their vertical coordinates to its bottom edge,
/// so the result is snippet-local.
///
/// Containment uses the box's rounded edges, like [`flatten`]'s caps. Each
/// surviving box keeps its position in the full page sequence so callers can
/// mark relevance against page-relative synonym positions.
pub fn flatten_and_clip(
    boxes: &IndexMap<String, Vec<DocBox>>,
    surrounding: &DocBox,
) -> Vec<ClippedBox> {
    flatten(boxes, f32::INFINITY, f32::INFINITY)
        .into_iter()
        .enumerate()
        .filter(|(_, f)| {
            f.bounds.x0.round() >= surrounding.x0
                && f.bounds.x1.round() <= surrounding.x1
                && f.bounds.y0.round() >= surrounding.y0
                && f.bounds.y1.round() <= surrounding.y1
        })
        .map(|(page_position, f)| ClippedBox {
            bounds: DocBox::new(
                f.bounds.x0,
                f.bounds.x1,
                f.bounds.y0 - surrounding.y0,
                f.bounds.y1 - surrounding.y0,
            ),
            word: f.word,
            page_position,
        })
        .collect()
}

/// Merge vertically overlapping or touching pixel boxes into disjoint
/// full-width row strips.
///
/// Boxes are sorted by top edge; each box is unioned into the first already
/// accepted box whose vertical span overlaps or touches its own, with the
/// horizontal span fixed at `[0, image_width]`. Merging an already merged
/// (disjoint) list returns it unchanged.
pub fn merge_vertically(boxes: &[PixelBox], image_width: f32) -> Vec<PixelBox> {
    let mut sorted = boxes.to_vec();
    sorted.sort_by(|a, b| safe_float_cmp(a.y0, b.y0));

    let mut merged: Vec<PixelBox> = Vec::new();
    for b in sorted {
        match first_colliding_index(&b, &merged) {
            Some(i) => {
                let hit = merged.remove(i);
                merged.push(PixelBox::new(
                    0.0,
                    b.y0.min(hit.y0),
                    image_width,
                    b.y1.max(hit.y1),
                ));
            },
            None => merged.push(b),
        }
    }
    merged
}

/// Find the first accepted box whose vertical span overlaps or touches `b`.
fn first_colliding_index(b: &PixelBox, accepted: &[PixelBox]) -> Option<usize> {
    accepted.iter().position(|a| {
        (a.y0 == b.y0 || a.y1 == b.y1)
            || (b.y0 <= a.y0 && a.y0 <= b.y1)
            || (a.y0 <= b.y0 && b.y0 <= a.y1)
    })
}

/// Convert a document-space box to raster pixels.
///
/// Flips the vertical axis: document space has its origin at the bottom,
/// pixel space at the top. `image_height` is the raster height in pixels.
///
/// # Examples
///
/// ```
/// use pagemark::geometry::{document_to_pixel, DocBox};
///
/// let b = DocBox::new(10.0, 20.0, 0.0, 5.0);
/// let px = document_to_pixel(&b, 2.0, 100.0);
/// assert_eq!(px.x0, 20.0);
/// assert_eq!(px.y0, 90.0); // 100 - 5 * 2
/// assert_eq!(px.x1, 40.0);
/// assert_eq!(px.y1, 100.0);
/// ```
pub fn document_to_pixel(b: &DocBox, scale: f32, image_height: f32) -> PixelBox {
    PixelBox::new(
        b.x0 * scale,
        image_height - b.y1 * scale,
        b.x1 * scale,
        image_height - b.y0 * scale,
    )
}

/// Convert a raster-pixel box back to document space.
///
/// Exact inverse of [`document_to_pixel`] for the same `(scale,
/// image_height)` pair.
pub fn pixel_to_document(b: &PixelBox, scale: f32, image_height: f32) -> DocBox {
    DocBox::new(
        b.x0 / scale,
        b.x1 / scale,
        (image_height - b.y1) / scale,
        (image_height - b.y0) / scale,
    )
}

/// Expand a pixel box vertically by `margin_fraction` of the image height on
/// each side, clipped to the image, and force the horizontal span to the full
/// image width.
///
/// Margins are vertical-only because snippets are full-width text strips.
pub fn apply_margin(
    b: &PixelBox,
    image_width: f32,
    image_height: f32,
    margin_fraction: f32,
) -> PixelBox {
    let margin = (margin_fraction * image_height).round();
    PixelBox::new(
        0.0,
        (b.y0 - margin).max(0.0),
        image_width,
        (b.y1 + margin).min(image_height),
    )
}
