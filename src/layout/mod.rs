//! Parsed-page input model.
//!
//! The external Document Layout Parser supplies, per page, a tree of nested
//! boxes containing lines containing characters, each character exposing its
//! Unicode text and document-space position. [`LayoutNode`] is the generic
//! node abstraction over that tree; traversal is iterative (explicit stack)
//! so dense pages cannot exhaust the call stack.

/// One node of the parsed layout tree.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutNode {
    /// A nested box grouping lines or further boxes
    Container {
        /// Child nodes in document order
        children: Vec<LayoutNode>,
    },
    /// A text line; word boundaries never cross lines
    Line {
        /// Character nodes in visual order
        children: Vec<LayoutNode>,
    },
    /// A single character glyph with its document-space position
    Char {
        /// The character's Unicode text
        text: String,
        /// Left edge
        x0: f32,
        /// Bottom edge
        y0: f32,
        /// Right edge
        x1: f32,
        /// Top edge
        y1: f32,
    },
}

impl LayoutNode {
    /// Convenience constructor for a character node.
    pub fn ch(text: &str, x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        LayoutNode::Char {
            text: text.to_string(),
            x0,
            y0,
            x1,
            y1,
        }
    }

    /// Collect all line nodes of the tree in document order.
    ///
    /// Iterative traversal with an explicit stack; children are pushed in
    /// reverse so they pop in original order.
    pub fn lines(&self) -> Vec<&LayoutNode> {
        let mut lines = Vec::new();
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            match node {
                LayoutNode::Container { children } => {
                    pending.extend(children.iter().rev());
                },
                LayoutNode::Line { .. } => lines.push(node),
                LayoutNode::Char { .. } => {},
            }
        }
        lines
    }
}

/// One parsed page: the layout tree plus page-level text and dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    /// Page width in document units
    pub width: f32,
    /// Page height in document units
    pub height: f32,
    /// The page's concatenated text, used for language detection and feeding
    pub text: String,
    /// Root of the layout tree
    pub root: LayoutNode,
}
