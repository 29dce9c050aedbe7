//! Format-independent traversal of the document tree.
//!
//! The [`walk`] function owns traversal order, alignment propagation, depth
//! tracking and tag resolution. Output formats implement [`RenderTarget`],
//! which has one hook per node kind; a hook receives its children already
//! rendered, so targets only decide which primitive to emit.
//!
//! # Example
//!
//! ```
//! use impress::error::Result;
//! use impress::model::{Align, Block, Document, Heading, Image, ListKind, MarkSet, Paragraph, Section, Tags};
//! use impress::render::visitor::{walk, BlockContext, RenderContext, RenderTarget};
//!
//! /// Counts words in paragraphs and headings.
//! struct WordCount;
//!
//! impl RenderTarget for WordCount {
//!     type Inline = usize;
//!     type Block = usize;
//!     type Output = usize;
//!
//!     fn text(&mut self, text: &str, _marks: &MarkSet) -> Result<usize> {
//!         Ok(text.split_whitespace().count())
//!     }
//!     fn hard_break(&mut self) -> Result<Option<usize>> { Ok(None) }
//!     fn heading(&mut self, _h: &Heading, _cx: BlockContext, c: Vec<usize>) -> Result<usize> {
//!         Ok(c.iter().sum())
//!     }
//!     fn paragraph(&mut self, _p: &Paragraph, _cx: BlockContext, c: Vec<usize>) -> Result<usize> {
//!         Ok(c.iter().sum())
//!     }
//!     fn list(&mut self, _k: ListKind, _cx: BlockContext, items: Vec<Vec<usize>>) -> Result<usize> {
//!         Ok(items.iter().flatten().sum())
//!     }
//!     fn image(&mut self, _i: &Image, _cx: BlockContext) -> Result<usize> { Ok(0) }
//!     fn section(&mut self, _a: Align, blocks: Vec<usize>) -> Result<usize> {
//!         Ok(blocks.iter().sum())
//!     }
//!     fn grid(&mut self, columns: Vec<usize>) -> Result<usize> { Ok(columns.iter().sum()) }
//!     fn document(&mut self, _d: &Document, body: Vec<usize>) -> Result<usize> {
//!         Ok(body.iter().sum())
//!     }
//! }
//!
//! let mut doc = Document::new("T");
//! doc.add_section(Section::new(vec![Block::Paragraph(Paragraph::with_text("one two"))]));
//! let tags = Tags::default();
//! let words = walk(&doc, &RenderContext::new("en", &tags), &mut WordCount).unwrap();
//! assert_eq!(words, 2);
//! ```

use crate::error::Result;
use crate::format::format_tag_value;
use crate::model::{
    Align, Block, Document, Heading, Image, Inline, ListKind, MarkSet, Paragraph, Section, Tags,
    TopLevel,
};

/// Per-call values shared by the whole traversal.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    /// Locale used to format tag values
    pub locale: &'a str,
    /// Tag values of this render
    pub tags: &'a Tags,
}

impl<'a> RenderContext<'a> {
    /// Create a context.
    pub fn new(locale: &'a str, tags: &'a Tags) -> Self {
        Self { locale, tags }
    }
}

/// Position of a block in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockContext {
    /// 0 for blocks directly in a section or column, +1 per list level
    pub depth: usize,
    /// Effective alignment
    pub align: Align,
}

impl BlockContext {
    /// Whether this block sits directly in a section or column.
    pub fn is_top(&self) -> bool {
        self.depth == 0
    }
}

/// One output format.
pub trait RenderTarget {
    /// Rendered inline content
    type Inline;
    /// Rendered block, section or grid
    type Block;
    /// Final output for a whole document
    type Output;

    /// Emit a text run. `text` may contain `\n` line breaks.
    fn text(&mut self, text: &str, marks: &MarkSet) -> Result<Self::Inline>;

    /// Emit an explicit line break, or `None` to drop it.
    fn hard_break(&mut self) -> Result<Option<Self::Inline>>;

    /// Emit a heading.
    fn heading(
        &mut self,
        heading: &Heading,
        cx: BlockContext,
        content: Vec<Self::Inline>,
    ) -> Result<Self::Block>;

    /// Emit a paragraph.
    fn paragraph(
        &mut self,
        paragraph: &Paragraph,
        cx: BlockContext,
        content: Vec<Self::Inline>,
    ) -> Result<Self::Block>;

    /// Emit a list. Each item holds its blocks rendered at `depth + 1`.
    fn list(
        &mut self,
        kind: ListKind,
        cx: BlockContext,
        items: Vec<Vec<Self::Block>>,
    ) -> Result<Self::Block>;

    /// Emit an image.
    fn image(&mut self, image: &Image, cx: BlockContext) -> Result<Self::Block>;

    /// Emit a full-width section, or a grid column.
    fn section(&mut self, align: Align, blocks: Vec<Self::Block>) -> Result<Self::Block>;

    /// Emit a grid from its already rendered columns.
    fn grid(&mut self, columns: Vec<Self::Block>) -> Result<Self::Block>;

    /// Wrap the rendered top-level nodes into the final output.
    fn document(&mut self, doc: &Document, body: Vec<Self::Block>) -> Result<Self::Output>;
}

/// Render `doc` with `target`.
pub fn walk<T: RenderTarget>(doc: &Document, ctx: &RenderContext<'_>, target: &mut T) -> Result<T::Output> {
    let mut body = Vec::with_capacity(doc.content.len());
    for node in &doc.content {
        let rendered = match node {
            TopLevel::Section(section) => walk_section(section, ctx, target)?,
            TopLevel::Grid(grid) => {
                let columns = grid
                    .columns
                    .iter()
                    .map(|column| walk_section(column, ctx, target))
                    .collect::<Result<Vec<_>>>()?;
                target.grid(columns)?
            }
        };
        body.push(rendered);
    }
    target.document(doc, body)
}

fn walk_section<T: RenderTarget>(
    section: &Section,
    ctx: &RenderContext<'_>,
    target: &mut T,
) -> Result<T::Block> {
    let blocks = section
        .content
        .iter()
        .map(|block| walk_block(block, 0, section.align, ctx, target))
        .collect::<Result<Vec<_>>>()?;
    target.section(section.align, blocks)
}

fn walk_block<T: RenderTarget>(
    block: &Block,
    depth: usize,
    inherited: Align,
    ctx: &RenderContext<'_>,
    target: &mut T,
) -> Result<T::Block> {
    let cx = BlockContext {
        depth,
        align: block.own_align().unwrap_or(inherited),
    };

    match block {
        Block::Heading(heading) => {
            let content = walk_inlines(&heading.content, ctx, target)?;
            target.heading(heading, cx, content)
        }
        Block::Paragraph(paragraph) => {
            let content = walk_inlines(&paragraph.content, ctx, target)?;
            target.paragraph(paragraph, cx, content)
        }
        Block::List(list) => {
            let mut items = Vec::with_capacity(list.items.len());
            for item in &list.items {
                // Nested blocks do not inherit the section alignment.
                let blocks = item
                    .content
                    .iter()
                    .map(|child| walk_block(child, depth + 1, Align::Left, ctx, target))
                    .collect::<Result<Vec<_>>>()?;
                items.push(blocks);
            }
            target.list(list.kind, cx, items)
        }
        Block::Image(image) => target.image(image, cx),
    }
}

fn walk_inlines<T: RenderTarget>(
    inlines: &[Inline],
    ctx: &RenderContext<'_>,
    target: &mut T,
) -> Result<Vec<T::Inline>> {
    let mut out = Vec::with_capacity(inlines.len());
    for inline in inlines {
        match inline {
            Inline::Text { text, marks } => out.push(target.text(text, marks)?),
            Inline::Tag { id, marks } => {
                let value = format_tag_value(ctx.locale, ctx.tags.get(id));
                out.push(target.text(&value, marks)?);
            }
            Inline::HardBreak => {
                if let Some(node) = target.hard_break()? {
                    out.push(node);
                }
            }
        }
    }
    Ok(out)
}
