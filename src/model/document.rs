//! Document-level types.

use super::{Block, Inline};
use serde::{Deserialize, Serialize};

/// Language used when a document does not declare one.
pub const DEFAULT_LANGUAGE: &str = "en";

/// A validated document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Locale tag (e.g. "fr", "en-GB")
    pub language: String,

    /// Document title
    pub title: String,

    /// Top-level sections and grids, in order
    pub content: Vec<TopLevel>,
}

impl Document {
    /// Create an empty document with the default language.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            title: title.into(),
            content: Vec::new(),
        }
    }

    /// Set the document language.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Append a full-width section.
    pub fn add_section(&mut self, section: Section) {
        self.content.push(TopLevel::Section(section));
    }

    /// Append a grid of columns.
    pub fn add_grid(&mut self, grid: Grid) {
        self.content.push(TopLevel::Grid(grid));
    }

    /// Check if the document has no content.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Visit every block in document order, including blocks nested in lists.
    pub fn for_each_block<'a>(&'a self, f: &mut impl FnMut(&'a Block)) {
        fn walk<'a>(blocks: &'a [Block], f: &mut impl FnMut(&'a Block)) {
            for block in blocks {
                f(block);
                if let Block::List(list) = block {
                    for item in &list.items {
                        walk(&item.content, f);
                    }
                }
            }
        }

        for node in &self.content {
            match node {
                TopLevel::Section(section) => walk(&section.content, f),
                TopLevel::Grid(grid) => {
                    for column in &grid.columns {
                        walk(&column.content, f);
                    }
                }
            }
        }
    }

    /// Distinct placeholder ids referenced by the document, in first-use order.
    pub fn tag_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::new();
        self.for_each_block(&mut |block| {
            let content = match block {
                Block::Heading(heading) => &heading.content,
                Block::Paragraph(paragraph) => &paragraph.content,
                Block::List(_) | Block::Image(_) => return,
            };
            for inline in content {
                if let Inline::Tag { id, .. } = inline {
                    if !ids.contains(&id.as_str()) {
                        ids.push(id);
                    }
                }
            }
        });
        ids
    }
}

/// A node directly under the document root.
#[derive(Debug, Clone, PartialEq)]
pub enum TopLevel {
    /// Full-width vertical stack of blocks
    Section(Section),
    /// Horizontal row of equal-width columns
    Grid(Grid),
}

/// A vertical run of blocks sharing one alignment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Section {
    /// Alignment applied to the direct children
    pub align: Align,

    /// Blocks in the section
    pub content: Vec<Block>,
}

impl Section {
    /// Create a left-aligned section.
    pub fn new(content: Vec<Block>) -> Self {
        Self {
            align: Align::Left,
            content,
        }
    }

    /// Set the section alignment.
    pub fn aligned(mut self, align: Align) -> Self {
        self.align = align;
        self
    }
}

/// A horizontal row of sections acting as columns.
///
/// Grids never contain grids.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grid {
    /// Columns, rendered with equal widths
    pub columns: Vec<Section>,
}

impl Grid {
    /// Create a grid from its columns.
    pub fn new(columns: Vec<Section>) -> Self {
        Self { columns }
    }
}

/// Text alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    /// Left alignment (default)
    #[default]
    Left,
    /// Center alignment
    Center,
    /// Right alignment
    Right,
    /// Justified alignment
    Justify,
}

impl Align {
    /// Parse an alignment keyword.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "left" => Some(Align::Left),
            "center" => Some(Align::Center),
            "right" => Some(Align::Right),
            "justify" => Some(Align::Justify),
            _ => None,
        }
    }

    /// The keyword used in markup attributes.
    pub fn as_str(self) -> &'static str {
        match self {
            Align::Left => "left",
            Align::Center => "center",
            Align::Right => "right",
            Align::Justify => "justify",
        }
    }

    /// Alignment for a box that cannot be justified, such as an image.
    pub fn for_box(self) -> Self {
        match self {
            Align::Justify => Align::Center,
            other => other,
        }
    }
}
