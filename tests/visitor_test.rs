//! Integration tests for custom render targets.

use impress::error::Result;
use impress::model::{
    Align, Block, Document, Grid, Heading, Image, Inline, List, ListItem, ListKind, MarkSet,
    Paragraph, Section, TagValue, Tags,
};
use impress::render::visitor::{walk, BlockContext, RenderContext, RenderTarget};

/// Custom target that tracks hook counts and alignments.
#[derive(Default)]
struct CountingTarget {
    paragraph_count: usize,
    heading_count: usize,
    image_count: usize,
    list_count: usize,
    grid_count: usize,
    alignments: Vec<(usize, Align)>,
    text: String,
}

impl RenderTarget for CountingTarget {
    type Inline = ();
    type Block = ();
    type Output = ();

    fn text(&mut self, text: &str, _marks: &MarkSet) -> Result<()> {
        self.text.push_str(text);
        Ok(())
    }

    fn hard_break(&mut self) -> Result<Option<()>> {
        self.text.push('|');
        Ok(None)
    }

    fn heading(&mut self, _heading: &Heading, cx: BlockContext, _content: Vec<()>) -> Result<()> {
        self.heading_count += 1;
        self.alignments.push((cx.depth, cx.align));
        Ok(())
    }

    fn paragraph(&mut self, _p: &Paragraph, cx: BlockContext, _content: Vec<()>) -> Result<()> {
        self.paragraph_count += 1;
        self.alignments.push((cx.depth, cx.align));
        Ok(())
    }

    fn list(&mut self, _kind: ListKind, _cx: BlockContext, _items: Vec<Vec<()>>) -> Result<()> {
        self.list_count += 1;
        Ok(())
    }

    fn image(&mut self, _image: &Image, cx: BlockContext) -> Result<()> {
        self.image_count += 1;
        self.alignments.push((cx.depth, cx.align));
        Ok(())
    }

    fn section(&mut self, _align: Align, _blocks: Vec<()>) -> Result<()> {
        Ok(())
    }

    fn grid(&mut self, _columns: Vec<()>) -> Result<()> {
        self.grid_count += 1;
        Ok(())
    }

    fn document(&mut self, _doc: &Document, _body: Vec<()>) -> Result<()> {
        Ok(())
    }
}

fn sample() -> Document {
    let nested = List::new(
        ListKind::Bullet,
        vec![ListItem::new(vec![Block::Paragraph(Paragraph::with_text("inner"))])],
    );
    let mut doc = Document::new("Sample");
    doc.add_section(
        Section::new(vec![
            Block::Heading(Heading::new(1, "Title")),
            Block::Paragraph(Paragraph::with_text("centered")),
            Block::Paragraph(Paragraph::with_text("right").aligned(Align::Right)),
            Block::List(nested),
        ])
        .aligned(Align::Center),
    );
    doc.add_grid(Grid::new(vec![
        Section::new(vec![Block::Image(Image::new("a.png"))]),
        Section::new(vec![Block::Paragraph(Paragraph::new(vec![
            Inline::text("Total: "),
            Inline::tag("total"),
            Inline::HardBreak,
            Inline::tag("unknown"),
        ]))]),
    ]));
    doc
}

#[test]
fn test_counting_target() {
    let tags = Tags::default();
    let mut target = CountingTarget::default();
    walk(&sample(), &RenderContext::new("en", &tags), &mut target).unwrap();

    assert_eq!(target.heading_count, 1);
    assert_eq!(target.paragraph_count, 4);
    assert_eq!(target.image_count, 1);
    assert_eq!(target.list_count, 1);
    assert_eq!(target.grid_count, 1);
}

#[test]
fn test_alignment_propagation() {
    let tags = Tags::default();
    let mut target = CountingTarget::default();
    walk(&sample(), &RenderContext::new("en", &tags), &mut target).unwrap();

    assert_eq!(
        target.alignments,
        vec![
            (0, Align::Center),
            (0, Align::Center),
            (0, Align::Right),
            // Blocks inside list items do not inherit the section alignment
            (1, Align::Left),
            (0, Align::Left),
            (0, Align::Left),
        ]
    );
}

#[test]
fn test_tags_resolved_with_locale() {
    let tags = Tags::new(vec![TagValue::new("total", 1234.5)]);

    let mut english = CountingTarget::default();
    walk(&sample(), &RenderContext::new("en", &tags), &mut english).unwrap();
    assert!(english.text.ends_with("Total: 1,234.5|"));

    let mut german = CountingTarget::default();
    walk(&sample(), &RenderContext::new("de", &tags), &mut german).unwrap();
    assert!(german.text.ends_with("Total: 1.234,5|"));
}
