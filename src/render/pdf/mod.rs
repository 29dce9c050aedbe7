//! PDF output.
//!
//! Rendering runs in three steps. [`PdfTarget`] turns the document into a
//! layout tree, the layouter breaks it into unbreakable slabs that are
//! paginated onto A4 pages, and the writer serializes the pages with
//! `lopdf`. Page numbers are stamped only after the page count is known.

mod fonts;
mod layout;
mod writer;

pub use fonts::{encode_win_ansi, Font};
pub use layout::{
    paginate, stamp_page_numbers, Element, ImageBox, Layouter, ListBox, Op, Page, Run, Slab,
    TextBlock, BODY_LINE_HEIGHT, BODY_SIZE, HEADING_LINE_HEIGHT,
};

use super::options::RenderOptions;
use super::visitor::{walk, BlockContext, RenderContext, RenderTarget};
use crate::assets::AssetCache;
use crate::error::Result;
use crate::model::{Align, Document, Heading, Image, ListKind, MarkSet, Paragraph};
use log::debug;
use writer::PdfMeta;

/// Paragraph spacing below top-level blocks.
const PARAGRAPH_PADDING: f32 = 20.0;
/// Paragraph spacing below blocks inside lists.
const NESTED_PARAGRAPH_PADDING: f32 = 5.0;

/// Layout tree of a whole document.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfTree {
    /// Document title
    pub title: String,
    /// Document language
    pub language: String,
    /// Top-level stacks and rows
    pub body: Vec<Element>,
}

/// Builds the layout tree.
#[derive(Debug, Default)]
pub struct PdfTarget;

impl PdfTarget {
    /// Create a target.
    pub fn new() -> Self {
        Self
    }
}

fn heading_metrics(level: u8) -> (f32, f32) {
    // (font size, vertical padding)
    match level {
        1 => (20.0, 20.0),
        2 => (18.0, 10.0),
        _ => (16.0, 5.0),
    }
}

impl RenderTarget for PdfTarget {
    type Inline = Vec<Run>;
    type Block = Element;
    type Output = PdfTree;

    fn text(&mut self, text: &str, marks: &MarkSet) -> Result<Vec<Run>> {
        Ok(vec![Run {
            text: text.to_string(),
            marks: marks.clone(),
        }])
    }

    fn hard_break(&mut self) -> Result<Option<Vec<Run>>> {
        Ok(None)
    }

    fn heading(
        &mut self,
        heading: &Heading,
        cx: BlockContext,
        content: Vec<Vec<Run>>,
    ) -> Result<Element> {
        let (size, padding) = heading_metrics(heading.level);
        Ok(Element::Text(TextBlock {
            runs: content.into_iter().flatten().collect(),
            size,
            line_height: HEADING_LINE_HEIGHT,
            align: cx.align,
            padding_top: padding,
            padding_bottom: padding,
            bold: true,
        }))
    }

    fn paragraph(
        &mut self,
        _paragraph: &Paragraph,
        cx: BlockContext,
        content: Vec<Vec<Run>>,
    ) -> Result<Element> {
        let padding_bottom = if cx.is_top() {
            PARAGRAPH_PADDING
        } else {
            NESTED_PARAGRAPH_PADDING
        };
        Ok(Element::Text(TextBlock {
            runs: content.into_iter().flatten().collect(),
            size: BODY_SIZE,
            line_height: BODY_LINE_HEIGHT,
            align: cx.align,
            padding_top: 0.0,
            padding_bottom,
            bold: false,
        }))
    }

    fn list(
        &mut self,
        kind: ListKind,
        cx: BlockContext,
        items: Vec<Vec<Element>>,
    ) -> Result<Element> {
        Ok(Element::List(ListBox {
            kind,
            depth: cx.depth,
            items,
        }))
    }

    fn image(&mut self, image: &Image, cx: BlockContext) -> Result<Element> {
        Ok(Element::Image(ImageBox {
            src: image.src.clone(),
            width: image.width.map(|w| w as f32),
            height: image.height.map(|h| h as f32),
            align: cx.align,
        }))
    }

    fn section(&mut self, _align: Align, blocks: Vec<Element>) -> Result<Element> {
        Ok(Element::Stack(blocks))
    }

    fn grid(&mut self, columns: Vec<Element>) -> Result<Element> {
        Ok(Element::Row(columns))
    }

    fn document(&mut self, doc: &Document, body: Vec<Element>) -> Result<PdfTree> {
        Ok(PdfTree {
            title: doc.title.clone(),
            language: doc.language.clone(),
            body,
        })
    }
}

/// Render a document to PDF bytes, returning the bytes and the page count.
///
/// Every image source must be present in `cache`; a missing entry is drawn
/// as its source text.
pub fn render_pdf(
    doc: &Document,
    ctx: &RenderContext<'_>,
    cache: &AssetCache,
    options: &RenderOptions,
) -> Result<(Vec<u8>, usize)> {
    let tree = walk(doc, ctx, &mut PdfTarget::new())?;

    let width = options.content_width();
    let mut layouter = Layouter::new(cache, options.content_height());
    let mut slabs = Vec::new();
    for element in &tree.body {
        slabs.extend(layouter.layout(element, width)?);
    }

    let mut pages = paginate(slabs, options);
    stamp_page_numbers(&mut pages, options);
    debug!(
        "Laid out \"{}\" on {} page(s) with {} image(s)",
        tree.title,
        pages.len(),
        layouter.images.len()
    );

    let meta = PdfMeta {
        title: &tree.title,
        language: &tree.language,
        creation_date: options.creation_date,
    };
    let bytes = writer::write_pdf(&meta, &pages, &layouter.images, options)?;
    Ok((bytes, pages.len()))
}
