//! Box layout and pagination.
//!
//! Layout turns the element tree into a flat sequence of [`Slab`]s: bands
//! that must not be split across pages, such as one line of text or one
//! image. A grid becomes a slab holding one slab list per column; pagination
//! advances its columns side by side and breaks each one at the page edge.

use super::fonts::{encode_win_ansi, Font};
use crate::assets::{Asset, AssetCache};
use crate::detect::is_raster_bytes;
use crate::error::{Error, Result};
use crate::model::{Align, ListKind, MarkSet};
use crate::render::options::RenderOptions;
use log::{debug, error};
use std::collections::{HashMap, VecDeque};
use std::io::Cursor;

/// Body text size in points.
pub const BODY_SIZE: f32 = 12.0;
/// Body line height, as a multiple of the font size.
pub const BODY_LINE_HEIGHT: f32 = 1.4;
/// Heading line height, as a multiple of the font size.
pub const HEADING_LINE_HEIGHT: f32 = 1.2;

const ASCENT: f32 = 0.718;
const DESCENT: f32 = 0.207;
const UNDERLINE_OFFSET: f32 = 0.1;
const UNDERLINE_THICKNESS: f32 = 0.05;
const LIST_GAP: f32 = 5.0;
const LIST_ITEM_PADDING: f32 = 2.0;
const BULLET_RADIUS: f32 = 2.0;
const FOOTER_OFFSET: f32 = 20.0;

/// RGB color with components in 0..=1.
pub type Rgb = [f32; 3];

const HIGHLIGHT: Rgb = [1.0, 1.0, 0.0];
const MARKER: Rgb = [0.8, 0.8, 0.8];

/// A run of text sharing one set of marks.
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    /// Text, possibly containing `\n`
    pub text: String,
    /// Marks of the run
    pub marks: MarkSet,
}

/// Layout tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    /// Paragraph or heading
    Text(TextBlock),
    /// Image by source URL
    Image(ImageBox),
    /// List with markers
    List(ListBox),
    /// Vertical stack (a section or column)
    Stack(Vec<Element>),
    /// Equal-width columns (a grid)
    Row(Vec<Element>),
}

/// A block of wrapped text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    /// Styled runs
    pub runs: Vec<Run>,
    /// Font size in points
    pub size: f32,
    /// Line height as a multiple of `size`
    pub line_height: f32,
    /// Horizontal alignment
    pub align: Align,
    /// Space above the block
    pub padding_top: f32,
    /// Space below the block
    pub padding_bottom: f32,
    /// Set every run in a bold face
    pub bold: bool,
}

/// An image box.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBox {
    /// Source URL, the asset cache key
    pub src: String,
    /// Requested width in points
    pub width: Option<f32>,
    /// Requested height in points
    pub height: Option<f32>,
    /// Horizontal alignment
    pub align: Align,
}

/// A list and its items.
#[derive(Debug, Clone, PartialEq)]
pub struct ListBox {
    /// Ordered or bulleted
    pub kind: ListKind,
    /// Nesting depth of the list itself
    pub depth: usize,
    /// Laid out items
    pub items: Vec<Vec<Element>>,
}

/// A drawing operation. Coordinates grow rightwards and downwards.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    /// Encoded text at a baseline
    Text {
        x: f32,
        baseline: f32,
        font: Font,
        size: f32,
        text: Vec<u8>,
    },
    /// Filled rectangle
    Fill {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Rgb,
    },
    /// Circle marker
    Disc {
        cx: f32,
        cy: f32,
        r: f32,
        color: Rgb,
        filled: bool,
    },
    /// Image XObject by index into [`Layouter::images`]
    Image {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        index: usize,
    },
    /// Clickable link area
    Link {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        uri: String,
    },
}

impl Op {
    fn translate(&mut self, dx: f32, dy: f32) {
        match self {
            Op::Text { x, baseline, .. } => {
                *x += dx;
                *baseline += dy;
            }
            Op::Disc { cx, cy, .. } => {
                *cx += dx;
                *cy += dy;
            }
            Op::Fill { x, y, .. } | Op::Image { x, y, .. } | Op::Link { x, y, .. } => {
                *x += dx;
                *y += dy;
            }
        }
    }
}

/// An unbreakable horizontal band.
#[derive(Debug, Clone, PartialEq)]
pub struct Slab {
    /// Height in points
    pub height: f32,
    /// Operations relative to the band's top-left corner
    pub ops: Vec<Op>,
    /// Spacing only; dropped at the top of a page
    pub gap: bool,
    /// Side-by-side columns of a grid, already offset horizontally
    pub columns: Vec<Vec<Slab>>,
}

impl Slab {
    fn line(height: f32, ops: Vec<Op>) -> Self {
        Self {
            height,
            ops,
            gap: false,
            columns: Vec::new(),
        }
    }

    fn gap(height: f32) -> Self {
        Self {
            height,
            ops: Vec::new(),
            gap: true,
            columns: Vec::new(),
        }
    }

    fn translate(&mut self, dx: f32, dy: f32) {
        for op in &mut self.ops {
            op.translate(dx, dy);
        }
        for column in &mut self.columns {
            for slab in column {
                slab.translate(dx, dy);
            }
        }
    }
}

/// An image referenced by at least one `Op::Image`.
#[derive(Debug, Clone)]
pub struct PlacedImage {
    /// Source URL
    pub src: String,
    /// Cached bytes
    pub asset: Asset,
    /// Pixel width
    pub pixel_width: u32,
    /// Pixel height
    pub pixel_height: u32,
}

/// One laid out page.
#[derive(Debug, Clone, Default)]
pub struct Page {
    /// Operations in page coordinates (origin top-left)
    pub ops: Vec<Op>,
}

/// Lays out elements against an asset cache.
pub struct Layouter<'a> {
    cache: &'a AssetCache,
    max_height: f32,
    /// Images in first-use order
    pub images: Vec<PlacedImage>,
    index: HashMap<String, usize>,
}

impl<'a> Layouter<'a> {
    /// Create a layouter; `max_height` is the content height of a page.
    pub fn new(cache: &'a AssetCache, max_height: f32) -> Self {
        Self {
            cache,
            max_height,
            images: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Lay out `element` in a column `width` points wide.
    pub fn layout(&mut self, element: &Element, width: f32) -> Result<Vec<Slab>> {
        match element {
            Element::Text(block) => Ok(layout_text(block, width)),
            Element::Image(image) => self.layout_image(image, width),
            Element::List(list) => self.layout_list(list, width),
            Element::Stack(children) => {
                let mut slabs = Vec::new();
                for child in children {
                    slabs.extend(self.layout(child, width)?);
                }
                Ok(slabs)
            }
            Element::Row(columns) => self.layout_row(columns, width),
        }
    }

    fn layout_row(&mut self, columns: &[Element], width: f32) -> Result<Vec<Slab>> {
        if columns.is_empty() {
            return Ok(Vec::new());
        }
        let column_width = width / columns.len() as f32;
        let mut laid_out = Vec::with_capacity(columns.len());
        let mut height: f32 = 0.0;
        for (i, column) in columns.iter().enumerate() {
            let mut slabs = self.layout(column, column_width)?;
            let first = slabs.iter().position(|slab| !slab.gap).unwrap_or(slabs.len());
            slabs.drain(..first);
            for slab in &mut slabs {
                slab.translate(i as f32 * column_width, 0.0);
            }
            height = height.max(slabs.iter().map(|slab| slab.height).sum());
            laid_out.push(slabs);
        }
        Ok(vec![Slab {
            height,
            ops: Vec::new(),
            gap: false,
            columns: laid_out,
        }])
    }

    fn layout_list(&mut self, list: &ListBox, width: f32) -> Result<Vec<Slab>> {
        let markers: Vec<Marker> = (0..list.items.len())
            .map(|i| Marker::new(list.kind, list.depth, i))
            .collect();
        let marker_width = markers.iter().map(Marker::width).fold(0.0, f32::max);
        let indent = marker_width + LIST_GAP;

        let mut slabs = Vec::new();
        for (item, marker) in list.items.iter().zip(&markers) {
            let mut item_slabs = Vec::new();
            for child in item {
                item_slabs.extend(self.layout(child, (width - indent).max(1.0))?);
            }
            for slab in &mut item_slabs {
                slab.translate(indent, 0.0);
            }

            let first = match item_slabs.iter().position(|slab| !slab.gap) {
                Some(index) => index,
                None => {
                    item_slabs.push(Slab::line(BODY_SIZE * BODY_LINE_HEIGHT, Vec::new()));
                    item_slabs.len() - 1
                }
            };
            item_slabs[first].ops.extend(marker.ops(marker_width));

            slabs.extend(item_slabs);
            slabs.push(Slab::gap(LIST_ITEM_PADDING));
        }
        Ok(slabs)
    }

    fn layout_image(&mut self, image: &ImageBox, width: f32) -> Result<Vec<Slab>> {
        let Some(index) = self.register(&image.src)? else {
            error!("No cached asset for image {}; drawing its source instead", image.src);
            let fallback = TextBlock {
                runs: vec![Run {
                    text: image.src.clone(),
                    marks: MarkSet::default(),
                }],
                size: BODY_SIZE,
                line_height: BODY_LINE_HEIGHT,
                align: image.align.for_box(),
                padding_top: 0.0,
                padding_bottom: 0.0,
                bold: false,
            };
            return Ok(layout_text(&fallback, width));
        };

        let placed = &self.images[index];
        let natural_width = placed.pixel_width as f32;
        let natural_height = placed.pixel_height as f32;

        let mut w = image.width.unwrap_or(natural_width).min(width);
        let mut h = image
            .height
            .unwrap_or(w * natural_height / natural_width);
        if h > self.max_height {
            let scale = self.max_height / h;
            w *= scale;
            h = self.max_height;
        }

        let x = match image.align.for_box() {
            Align::Center => (width - w) / 2.0,
            Align::Right => width - w,
            _ => 0.0,
        };
        Ok(vec![Slab::line(
            h,
            vec![Op::Image {
                x,
                y: 0.0,
                width: w,
                height: h,
                index,
            }],
        )])
    }

    /// Index of the image for `src`, or `None` on a cache miss.
    fn register(&mut self, src: &str) -> Result<Option<usize>> {
        if let Some(&index) = self.index.get(src) {
            return Ok(Some(index));
        }
        let Some(asset) = self.cache.get(src) else {
            return Ok(None);
        };
        if !is_raster_bytes(&asset.data) {
            return Err(Error::resource(src, "not a PNG, JPEG, GIF or WebP image"));
        }

        let (pixel_width, pixel_height) = image::ImageReader::new(Cursor::new(asset.data.as_slice()))
            .with_guessed_format()
            .map_err(|e| Error::resource(src, e))?
            .into_dimensions()
            .map_err(|e| Error::resource(src, e))?;
        if pixel_width == 0 || pixel_height == 0 {
            return Err(Error::resource(src, "image has no pixels"));
        }

        let index = self.images.len();
        self.images.push(PlacedImage {
            src: src.to_string(),
            asset: asset.clone(),
            pixel_width,
            pixel_height,
        });
        self.index.insert(src.to_string(), index);
        Ok(Some(index))
    }
}

/// A list item marker.
#[derive(Debug, Clone, PartialEq)]
enum Marker {
    Disc { filled: bool },
    Square,
    Label(String),
}

impl Marker {
    fn new(kind: ListKind, depth: usize, index: usize) -> Self {
        match (kind, depth % 3) {
            (ListKind::Bullet, 0) => Marker::Disc { filled: true },
            (ListKind::Bullet, 1) => Marker::Disc { filled: false },
            (ListKind::Bullet, _) => Marker::Square,
            (ListKind::Ordered, 0) => Marker::Label(format!("{}.", index + 1)),
            (ListKind::Ordered, 1) => Marker::Label(format!("{}.", alpha(index + 1))),
            (ListKind::Ordered, _) => Marker::Label(format!("{}.", roman(index + 1))),
        }
    }

    fn width(&self) -> f32 {
        match self {
            Marker::Label(label) => Font::Regular.measure(label.as_bytes(), BODY_SIZE),
            _ => BULLET_RADIUS * 2.0,
        }
    }

    /// Operations for a marker right-aligned in a box `box_width` wide.
    fn ops(&self, box_width: f32) -> Vec<Op> {
        let line = BODY_SIZE * BODY_LINE_HEIGHT;
        let center_y = line / 2.0;
        let right = box_width;
        match self {
            Marker::Disc { filled } => vec![Op::Disc {
                cx: right - BULLET_RADIUS,
                cy: center_y,
                r: BULLET_RADIUS,
                color: MARKER,
                filled: *filled,
            }],
            Marker::Square => vec![Op::Fill {
                x: right - BULLET_RADIUS * 2.0,
                y: center_y - BULLET_RADIUS,
                width: BULLET_RADIUS * 2.0,
                height: BULLET_RADIUS * 2.0,
                color: MARKER,
            }],
            Marker::Label(label) => vec![Op::Text {
                x: right - self.width(),
                baseline: baseline(BODY_SIZE, line),
                font: Font::Regular,
                size: BODY_SIZE,
                text: label.as_bytes().to_vec(),
            }],
        }
    }
}

/// Lower-case alphabetic counter: a..z, aa, ab...
fn alpha(mut n: usize) -> String {
    let mut out = Vec::new();
    while n > 0 {
        n -= 1;
        out.push(b'a' + (n % 26) as u8);
        n /= 26;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

/// Lower-case roman numerals.
fn roman(mut n: usize) -> String {
    const TABLE: [(usize, &str); 13] = [
        (1000, "m"),
        (900, "cm"),
        (500, "d"),
        (400, "cd"),
        (100, "c"),
        (90, "xc"),
        (50, "l"),
        (40, "xl"),
        (10, "x"),
        (9, "ix"),
        (5, "v"),
        (4, "iv"),
        (1, "i"),
    ];
    let mut out = String::new();
    for (value, numeral) in TABLE {
        while n >= value {
            out.push_str(numeral);
            n -= value;
        }
    }
    out
}

/// Baseline offset from the top of a line box.
fn baseline(size: f32, line_height: f32) -> f32 {
    (line_height - (ASCENT + DESCENT) * size) / 2.0 + ASCENT * size
}

/// A measured word or space.
#[derive(Debug, Clone)]
struct Piece {
    text: Vec<u8>,
    font: Font,
    size: f32,
    marks: MarkSet,
    width: f32,
    space: bool,
}

#[derive(Debug, Clone)]
enum Token {
    Piece(Piece),
    Newline,
}

#[derive(Debug, Clone, Default)]
struct Line {
    pieces: Vec<Piece>,
    width: f32,
    /// Ends a paragraph or an explicit line break
    hard_end: bool,
}

impl Line {
    fn push(&mut self, piece: Piece) {
        self.width += piece.width;
        self.pieces.push(piece);
    }

    fn trim_end(&mut self) {
        while self.pieces.last().is_some_and(|piece| piece.space) {
            if let Some(piece) = self.pieces.pop() {
                self.width -= piece.width;
            }
        }
    }

    fn spaces(&self) -> usize {
        self.pieces.iter().filter(|piece| piece.space).count()
    }
}

fn is_break_space(ch: char) -> bool {
    ch == ' ' || ch == '\t'
}

fn tokenize(block: &TextBlock) -> Vec<Token> {
    let mut tokens = Vec::new();
    for run in &block.runs {
        let font = Font::for_marks(&run.marks, block.bold);
        let piece = |text: &str, space: bool| {
            let encoded = if space { vec![b' '] } else { encode_win_ansi(text) };
            Piece {
                width: font.measure(&encoded, block.size),
                text: encoded,
                font,
                size: block.size,
                marks: run.marks.clone(),
                space,
            }
        };

        for (i, segment) in run.text.split('\n').enumerate() {
            if i > 0 {
                tokens.push(Token::Newline);
            }
            let mut start = 0;
            let mut in_space = false;
            for (pos, ch) in segment.char_indices() {
                let space = is_break_space(ch);
                if pos > start && space != in_space {
                    tokens.push(Token::Piece(piece(&segment[start..pos], in_space)));
                    start = pos;
                }
                in_space = space;
            }
            if start < segment.len() {
                tokens.push(Token::Piece(piece(&segment[start..], in_space)));
            }
        }
    }
    tokens
}

fn break_lines(tokens: Vec<Token>, width: f32) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut current = Line::default();

    for token in tokens {
        let piece = match token {
            Token::Newline => {
                current.trim_end();
                current.hard_end = true;
                lines.push(std::mem::take(&mut current));
                continue;
            }
            Token::Piece(piece) => piece,
        };

        if piece.space {
            if !current.pieces.is_empty() {
                current.push(piece);
            }
            continue;
        }

        if current.width + piece.width > width && !current.pieces.is_empty() {
            current.trim_end();
            lines.push(std::mem::take(&mut current));
        }

        if piece.width <= width {
            current.push(piece);
            continue;
        }

        // A word wider than the column is split at glyph boundaries.
        let mut chunk = Vec::new();
        let mut chunk_width = 0.0;
        for &byte in &piece.text {
            let advance = piece.font.measure(&[byte], piece.size);
            if chunk_width + advance > width && !chunk.is_empty() {
                current.push(Piece {
                    text: std::mem::take(&mut chunk),
                    width: chunk_width,
                    ..piece.clone()
                });
                lines.push(std::mem::take(&mut current));
                chunk_width = 0.0;
            }
            chunk.push(byte);
            chunk_width += advance;
        }
        current.push(Piece {
            text: chunk,
            width: chunk_width,
            ..piece
        });
    }

    if !current.pieces.is_empty() {
        current.trim_end();
        current.hard_end = true;
        lines.push(current);
    }
    lines
}

/// A run of merged pieces drawn with one text operation.
struct Segment {
    x: f32,
    width: f32,
    text: Vec<u8>,
    font: Font,
    marks: MarkSet,
}

impl Segment {
    fn emit(self, size: f32, line_height: f32, ops: &mut Vec<Op>) {
        let base = baseline(size, line_height);
        if self.marks.highlight {
            ops.push(Op::Fill {
                x: self.x,
                y: 0.0,
                width: self.width,
                height: line_height,
                color: HIGHLIGHT,
            });
        }
        ops.push(Op::Text {
            x: self.x,
            baseline: base,
            font: self.font,
            size,
            text: self.text,
        });
        if self.marks.is_underlined() {
            ops.push(Op::Fill {
                x: self.x,
                y: base + size * UNDERLINE_OFFSET,
                width: self.width,
                height: size * UNDERLINE_THICKNESS,
                color: [0.0, 0.0, 0.0],
            });
        }
        if let Some(link) = &self.marks.link {
            ops.push(Op::Link {
                x: self.x,
                y: 0.0,
                width: self.width,
                height: line_height,
                uri: link.href.clone(),
            });
        }
    }
}

fn layout_line(line: &Line, block: &TextBlock, width: f32) -> Slab {
    let line_height = block.size * block.line_height;
    let extra = (width - line.width).max(0.0);
    let spaces = line.spaces();
    let (mut x, space_extra) = match block.align {
        Align::Left => (0.0, 0.0),
        Align::Center => (extra / 2.0, 0.0),
        Align::Right => (extra, 0.0),
        Align::Justify if line.hard_end || spaces == 0 => (0.0, 0.0),
        Align::Justify => (0.0, extra / spaces as f32),
    };

    let mut ops = Vec::new();
    let mut segment: Option<Segment> = None;
    for piece in &line.pieces {
        if piece.space && space_extra > 0.0 {
            if let Some(done) = segment.take() {
                done.emit(block.size, line_height, &mut ops);
            }
            x += piece.width + space_extra;
            continue;
        }

        let same_style = segment
            .as_ref()
            .is_some_and(|s| s.font == piece.font && s.marks == piece.marks);
        if !same_style {
            if let Some(done) = segment.take() {
                done.emit(block.size, line_height, &mut ops);
            }
        }
        let current = segment.get_or_insert_with(|| Segment {
            x,
            width: 0.0,
            text: Vec::new(),
            font: piece.font,
            marks: piece.marks.clone(),
        });
        current.text.extend_from_slice(&piece.text);
        current.width += piece.width;
        x += piece.width;
    }
    if let Some(done) = segment {
        done.emit(block.size, line_height, &mut ops);
    }

    Slab::line(line_height, ops)
}

/// Lay out a paragraph or heading: padding, then one slab per line.
pub fn layout_text(block: &TextBlock, width: f32) -> Vec<Slab> {
    let mut slabs = Vec::new();
    if block.padding_top > 0.0 {
        slabs.push(Slab::gap(block.padding_top));
    }
    for line in break_lines(tokenize(block), width) {
        slabs.push(layout_line(&line, block, width));
    }
    if block.padding_bottom > 0.0 {
        slabs.push(Slab::gap(block.padding_bottom));
    }
    slabs
}

/// Stack slabs into pages of the content box.
///
/// A slab that does not fit in the remaining space starts a new page. Gaps
/// at the top of a page are dropped. Grid columns advance together and each
/// one continues on the next page where it runs out of room. There is always
/// at least one page.
pub fn paginate(slabs: Vec<Slab>, options: &RenderOptions) -> Vec<Page> {
    let mut pager = Pager::new(options);
    for slab in slabs {
        pager.place(slab);
    }
    pager.finish()
}

/// Page-filling state of [`paginate`].
struct Pager {
    capacity: f32,
    left: f32,
    top: f32,
    pages: Vec<Page>,
    page: Page,
    cursor: f32,
}

impl Pager {
    fn new(options: &RenderOptions) -> Self {
        Self {
            capacity: options.content_height(),
            left: options.margins.left,
            top: options.margins.top,
            pages: Vec::new(),
            page: Page::default(),
            cursor: 0.0,
        }
    }

    fn break_page(&mut self) {
        self.pages.push(std::mem::take(&mut self.page));
        self.cursor = 0.0;
    }

    /// Whether a slab `height` tall fits at page offset `y`. Anything fits
    /// at the top of a page.
    fn fits(&self, y: f32, height: f32) -> bool {
        y <= 0.0 || y + height <= self.capacity
    }

    fn draw(&mut self, mut slab: Slab, y: f32) {
        slab.translate(self.left, self.top + y);
        self.page.ops.extend(slab.ops);
    }

    fn place(&mut self, slab: Slab) {
        if !slab.columns.is_empty() {
            self.place_row(slab.columns);
            return;
        }
        if slab.gap {
            if self.cursor > 0.0 {
                self.cursor += slab.height;
            }
            return;
        }
        if !self.fits(self.cursor, slab.height) {
            self.break_page();
        }
        let height = slab.height;
        self.draw(slab, self.cursor);
        self.cursor += height;
    }

    fn place_row(&mut self, columns: Vec<Vec<Slab>>) {
        let mut columns: Vec<VecDeque<Slab>> = columns.into_iter().map(VecDeque::from).collect();

        // Start on a fresh page when some column cannot place its first line.
        let blocked = columns.iter().any(|column| {
            column
                .iter()
                .find(|slab| !slab.gap)
                .is_some_and(|slab| !self.fits(self.cursor, slab.height))
        });
        if blocked {
            self.break_page();
        }

        let mut top = self.cursor;
        loop {
            let mut bottom = top;
            let mut pending = false;
            for column in &mut columns {
                let mut y = top;
                while let Some(slab) = column.pop_front() {
                    if slab.gap {
                        if y > 0.0 {
                            y += slab.height;
                        }
                        continue;
                    }
                    if !self.fits(y, slab.height) {
                        column.push_front(slab);
                        pending = true;
                        break;
                    }
                    let height = slab.height;
                    self.draw(slab, y);
                    y += height;
                }
                bottom = bottom.max(y);
            }
            if !pending {
                self.cursor = bottom;
                return;
            }
            debug!("Grid row continues on page {}", self.pages.len() + 2);
            self.break_page();
            top = 0.0;
        }
    }

    fn finish(mut self) -> Vec<Page> {
        self.pages.push(self.page);
        self.pages
    }
}

/// Stamp a centered "page / total" footer on every page.
pub fn stamp_page_numbers(pages: &mut [Page], options: &RenderOptions) {
    let total = pages.len();
    let baseline = options.page_size.height - FOOTER_OFFSET - DESCENT * BODY_SIZE;
    for (i, page) in pages.iter_mut().enumerate() {
        let text = format!("{} / {}", i + 1, total).into_bytes();
        let width = Font::Regular.measure(&text, BODY_SIZE);
        page.ops.push(Op::Text {
            x: (options.page_size.width - width) / 2.0,
            baseline,
            font: Font::Regular,
            size: BODY_SIZE,
            text,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Link, Mark};

    fn block(text: &str, align: Align) -> TextBlock {
        TextBlock {
            runs: vec![Run {
                text: text.to_string(),
                marks: MarkSet::default(),
            }],
            size: BODY_SIZE,
            line_height: BODY_LINE_HEIGHT,
            align,
            padding_top: 0.0,
            padding_bottom: 20.0,
            bold: false,
        }
    }

    fn texts(slab: &Slab) -> Vec<String> {
        slab.ops
            .iter()
            .filter_map(|op| match op {
                Op::Text { text, .. } => Some(String::from_utf8_lossy(text).into_owned()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_newlines_stack_lines() {
        let slabs = layout_text(&block("a\nb\nc", Align::Left), 500.0);
        let lines: Vec<&Slab> = slabs.iter().filter(|s| !s.gap).collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(texts(lines[2]), vec!["c"]);
        assert!(slabs.last().unwrap().gap);
    }

    #[test]
    fn test_wrapping() {
        // "aaaa" is 4 * 556 * 12 / 1000 = 26.688pt wide.
        let slabs = layout_text(&block("aaaa aaaa aaaa", Align::Left), 60.0);
        let lines: Vec<Vec<String>> = slabs.iter().filter(|s| !s.gap).map(texts).collect();
        assert_eq!(lines, vec![vec!["aaaa aaaa"], vec!["aaaa"]]);
    }

    #[test]
    fn test_long_word_is_split() {
        let slabs = layout_text(&block("aaaaaaaaaa", Align::Left), 30.0);
        let lines: Vec<Vec<String>> = slabs.iter().filter(|s| !s.gap).map(texts).collect();
        assert_eq!(lines, vec![vec!["aaaa"], vec!["aaaa"], vec!["aa"]]);
    }

    #[test]
    fn test_alignment_offsets() {
        let right = layout_text(&block("a", Align::Right), 100.0);
        let Op::Text { x, .. } = &right[0].ops[0] else {
            panic!("expected text");
        };
        assert!((x - (100.0 - 6.672)).abs() < 1e-3);

        let justified = layout_text(&block("aaaa aaaa aaaa", Align::Justify), 60.0);
        let first = texts(&justified[0]);
        assert_eq!(first, vec!["aaaa", "aaaa"]);
        let Op::Text { x, .. } = &justified[0].ops[1] else {
            panic!("expected text");
        };
        assert!((x - (60.0 - 26.688)).abs() < 1e-3);
    }

    #[test]
    fn test_marks_emit_decorations() {
        let mut text = block("go", Align::Left);
        text.runs[0].marks = [Mark::Highlight, Mark::Link(Link::new("https://e.com"))]
            .into_iter()
            .collect();
        let slabs = layout_text(&text, 100.0);
        let ops = &slabs[0].ops;
        assert!(matches!(ops[0], Op::Fill { color, .. } if color == HIGHLIGHT));
        assert!(matches!(ops[1], Op::Text { .. }));
        assert!(matches!(ops[2], Op::Fill { .. }));
        assert!(matches!(&ops[3], Op::Link { uri, .. } if uri == "https://e.com"));
    }

    #[test]
    fn test_marker_counters() {
        assert_eq!(alpha(1), "a");
        assert_eq!(alpha(27), "aa");
        assert_eq!(roman(4), "iv");
        assert_eq!(roman(14), "xiv");
        assert_eq!(
            Marker::new(ListKind::Ordered, 1, 1),
            Marker::Label("b.".to_string())
        );
        assert_eq!(
            Marker::new(ListKind::Bullet, 1, 0),
            Marker::Disc { filled: false }
        );
        assert_eq!(Marker::new(ListKind::Bullet, 2, 0), Marker::Square);
    }

    #[test]
    fn test_cache_miss_draws_source() {
        let cache = AssetCache::empty();
        let mut layouter = Layouter::new(&cache, 700.0);
        let image = Element::Image(ImageBox {
            src: "https://e.com/missing.png".to_string(),
            width: None,
            height: None,
            align: Align::Left,
        });
        let slabs = layouter.layout(&image, 500.0).unwrap();
        assert_eq!(texts(&slabs[0]), vec!["https://e.com/missing.png"]);
        assert!(layouter.images.is_empty());
    }

    #[test]
    fn test_pagination() {
        let options = RenderOptions::default();
        let line = |height: f32| {
            Slab::line(
                height,
                vec![Op::Fill {
                    x: 0.0,
                    y: 0.0,
                    width: 1.0,
                    height: 1.0,
                    color: [0.0; 3],
                }],
            )
        };
        let slabs = vec![Slab::gap(20.0), line(400.0), Slab::gap(20.0), line(400.0), line(10.0)];
        let mut pages = paginate(slabs, &options);
        assert_eq!(pages.len(), 2);
        // Leading gap dropped: first slab sits at the top margin.
        assert!(matches!(pages[0].ops[0], Op::Fill { y, .. } if y == 35.0));
        assert!(matches!(pages[1].ops[0], Op::Fill { y, .. } if y == 35.0));
        assert!(matches!(pages[1].ops[1], Op::Fill { y, .. } if y == 435.0));

        stamp_page_numbers(&mut pages, &options);
        assert!(matches!(pages[1].ops.last(), Some(Op::Text { text, .. }) if text == b"2 / 2"));
    }

    #[test]
    fn test_tall_grid_breaks_across_pages() {
        let options = RenderOptions::default();
        let column = |prefix: &str| {
            let text = (0..80)
                .map(|i| format!("{}{}", prefix, i))
                .collect::<Vec<_>>()
                .join("\n");
            Element::Stack(vec![Element::Text(block(&text, Align::Left))])
        };
        let row = Element::Row(vec![column("a"), column("b")]);

        let cache = AssetCache::empty();
        let mut layouter = Layouter::new(&cache, options.content_height());
        let slabs = layouter.layout(&row, options.content_width()).unwrap();
        let pages = paginate(slabs, &options);
        assert_eq!(pages.len(), 2);

        let bottom = options.margins.top + options.content_height();
        let mut lines = Vec::new();
        for page in &pages {
            for op in &page.ops {
                if let Op::Text { baseline, text, .. } = op {
                    assert!(*baseline < bottom, "line drawn below the content box");
                    lines.push(String::from_utf8_lossy(text).into_owned());
                }
            }
        }
        assert_eq!(lines.len(), 160);
        assert!(lines.contains(&"a79".to_string()));
        assert!(lines.contains(&"b79".to_string()));

        // Both columns continue side by side on the second page.
        let middle = options.margins.left + options.content_width() / 2.0;
        let second: Vec<f32> = pages[1]
            .ops
            .iter()
            .filter_map(|op| match op {
                Op::Text { x, .. } => Some(*x),
                _ => None,
            })
            .collect();
        assert!(second.iter().any(|x| *x < middle));
        assert!(second.iter().any(|x| *x >= middle));
    }

    #[test]
    fn test_grid_moves_to_next_page_when_first_line_does_not_fit() {
        let options = RenderOptions::default();
        let filler = Slab::line(options.content_height() - 5.0, Vec::new());
        let cache = AssetCache::empty();
        let mut layouter = Layouter::new(&cache, options.content_height());
        let row = Element::Row(vec![Element::Text(block("x", Align::Left))]);

        let mut slabs = vec![filler];
        slabs.extend(layouter.layout(&row, 200.0).unwrap());
        let pages = paginate(slabs, &options);
        assert_eq!(pages.len(), 2);
        assert!(pages[0].ops.is_empty());
        assert!(matches!(pages[1].ops[0], Op::Text { .. }));
    }

    #[test]
    fn test_empty_document_has_one_page() {
        assert_eq!(paginate(Vec::new(), &RenderOptions::default()).len(), 1);
    }

    fn png_cache(src: &str, width: u32, height: u32) -> AssetCache {
        let image = image::RgbImage::new(width, height);
        let mut data = Vec::new();
        image::DynamicImage::ImageRgb8(image)
            .write_to(&mut Cursor::new(&mut data), image::ImageFormat::Png)
            .unwrap();
        vec![(src.to_string(), Asset::new(data))].into_iter().collect()
    }

    fn image_box(width: Option<f32>, align: Align) -> Element {
        Element::Image(ImageBox {
            src: "a.png".to_string(),
            width,
            height: None,
            align,
        })
    }

    #[test]
    fn test_image_sizing() {
        let cache = png_cache("a.png", 8, 4);
        let mut layouter = Layouter::new(&cache, 700.0);

        let slabs = layouter.layout(&image_box(Some(100.0), Align::Center), 300.0).unwrap();
        match slabs[0].ops[0] {
            Op::Image { x, width, height, index, .. } => {
                assert_eq!((x, width, height, index), (100.0, 100.0, 50.0, 0));
            }
            ref other => panic!("unexpected {:?}", other),
        }

        // Wider than the column: clamped, aspect ratio kept, image shared
        let slabs = layouter.layout(&image_box(Some(900.0), Align::Left), 300.0).unwrap();
        assert_eq!(slabs[0].height, 150.0);
        assert_eq!(layouter.images.len(), 1);
    }

    #[test]
    fn test_non_raster_asset_is_rejected() {
        let cache: AssetCache = vec![("a.png".to_string(), Asset::new(b"<html>".to_vec()))]
            .into_iter()
            .collect();
        let mut layouter = Layouter::new(&cache, 700.0);
        let err = layouter.layout(&image_box(None, Align::Left), 300.0).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Resource);
    }
}
