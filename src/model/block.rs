//! Block-level types.

use super::{Align, Inline};

/// A block inside a section or list item.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Heading of level 1 to 3
    Heading(Heading),
    /// Paragraph of inline content
    Paragraph(Paragraph),
    /// Ordered or bulleted list
    List(List),
    /// Image referenced by URL
    Image(Image),
}

impl Block {
    /// Alignment declared on the block itself, if any.
    pub fn own_align(&self) -> Option<Align> {
        match self {
            Block::Heading(h) => h.align,
            Block::Paragraph(p) => p.align,
            Block::Image(i) => i.align,
            Block::List(_) => None,
        }
    }
}

/// A heading.
#[derive(Debug, Clone, PartialEq)]
pub struct Heading {
    /// Heading level, always within 1..=3
    pub level: u8,

    /// Alignment override
    pub align: Option<Align>,

    /// Inline content
    pub content: Vec<Inline>,
}

impl Heading {
    /// Create a heading with plain text. The level is clamped to 1..=3.
    pub fn new(level: u8, text: impl Into<String>) -> Self {
        Self {
            level: level.clamp(1, 3),
            align: None,
            content: vec![Inline::text(text)],
        }
    }
}

/// A paragraph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Paragraph {
    /// Alignment override
    pub align: Option<Align>,

    /// Inline content
    pub content: Vec<Inline>,
}

impl Paragraph {
    /// Create a paragraph from inline content.
    pub fn new(content: Vec<Inline>) -> Self {
        Self {
            align: None,
            content,
        }
    }

    /// Create a paragraph with plain text.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self::new(vec![Inline::text(text)])
    }

    /// Set the alignment override.
    pub fn aligned(mut self, align: Align) -> Self {
        self.align = Some(align);
        self
    }
}

/// List flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    /// Numbered list
    Ordered,
    /// Bulleted list
    Bullet,
}

/// An ordered or bulleted list.
#[derive(Debug, Clone, PartialEq)]
pub struct List {
    /// Ordered or bulleted
    pub kind: ListKind,

    /// List items
    pub items: Vec<ListItem>,
}

impl List {
    /// Create a list.
    pub fn new(kind: ListKind, items: Vec<ListItem>) -> Self {
        Self { kind, items }
    }
}

/// A list item holding nested blocks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListItem {
    /// Blocks in the item
    pub content: Vec<Block>,
}

impl ListItem {
    /// Create a list item.
    pub fn new(content: Vec<Block>) -> Self {
        Self { content }
    }
}

/// An image.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    /// Source URL
    pub src: String,

    /// Alternative text
    pub alt: Option<String>,

    /// Requested width in pixels (1 px = 1 pt in PDF output)
    pub width: Option<u32>,

    /// Requested height in pixels
    pub height: Option<u32>,

    /// Alignment override
    pub align: Option<Align>,
}

impl Image {
    /// Create an image with only a source.
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            alt: None,
            width: None,
            height: None,
            align: None,
        }
    }

    /// Set the requested width.
    pub fn with_width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }
}
