//! Validation of untrusted JSON into the document model.
//!
//! The input follows the editor's node shape: every node is an object with a
//! `type` discriminant, attributes under `attrs` and children under
//! `content`. Validation stops at the first offending value and reports its
//! path, e.g. `content[0].content[2].attrs.level`, together with the shape
//! that was expected there.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//!
//! let raw = json!({
//!     "type": "doc",
//!     "attrs": { "title": "Letter", "language": "fr" },
//!     "content": [
//!         { "type": "section", "content": [
//!             { "type": "paragraph", "content": [{ "type": "text", "text": "Bonjour" }] }
//!         ]}
//!     ]
//! });
//! let doc = impress::schema::validate(&raw).unwrap();
//! assert_eq!(doc.language, "fr");
//! ```

mod normalize;

pub use normalize::to_value;

use crate::error::{Error, Result};
use crate::model::{
    Align, Block, Document, Grid, Heading, Image, Inline, Link, List, ListItem, ListKind, Mark,
    MarkSet, Paragraph, Section, TagData, TagValue, Tags, TopLevel, DEFAULT_LANGUAGE,
};
use crate::render::Format;
use serde_json::{Map, Value};

/// A validated render request.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    /// The document to render
    pub document: Document,
    /// Placeholder values
    pub tags: Tags,
    /// Requested output format
    pub format: Format,
}

/// Validate a raw document tree.
pub fn validate(raw: &Value) -> Result<Document> {
    document(&Cursor::root(raw))
}

/// Validate a raw list of tag values.
pub fn validate_tags(raw: &Value) -> Result<Vec<TagValue>> {
    tag_list(&Cursor::new(raw, "tags".to_string()))
}

/// Validate a whole render request `{ document, tags?, format? }`.
///
/// Missing tags default to an empty list and a missing format to HTML.
pub fn validate_request(raw: &Value) -> Result<RenderRequest> {
    let root = Cursor::root(raw);
    root.object("a render request object")?;

    let document = match root.field("document") {
        Some(node) => self::document(&node)?,
        None => return Err(root.missing("document", "a document object")),
    };
    let tags = match root.field("tags") {
        Some(node) => tag_list(&node)?,
        None => Vec::new(),
    };
    let format = match root.field("format") {
        Some(node) => {
            let name = node.string("one of \"html\", \"text\", \"pdf\", \"mjml\"")?;
            Format::parse(name)
                .ok_or_else(|| node.fail("one of \"html\", \"text\", \"pdf\", \"mjml\""))?
        }
        None => Format::default(),
    };

    Ok(RenderRequest {
        document,
        tags: Tags::new(tags),
        format,
    })
}

/// A value together with its path from the root of the input.
struct Cursor<'a> {
    value: &'a Value,
    path: String,
}

impl<'a> Cursor<'a> {
    fn root(value: &'a Value) -> Self {
        Self::new(value, "$".to_string())
    }

    fn new(value: &'a Value, path: String) -> Self {
        Self { value, path }
    }

    fn join(&self, key: &str) -> String {
        if self.path == "$" {
            key.to_string()
        } else {
            format!("{}.{}", self.path, key)
        }
    }

    fn fail(&self, expected: &str) -> Error {
        Error::validation(self.path.clone(), expected)
    }

    fn missing(&self, key: &str, expected: &str) -> Error {
        Error::validation(self.join(key), expected)
    }

    fn object(&self, expected: &str) -> Result<&'a Map<String, Value>> {
        self.value.as_object().ok_or_else(|| self.fail(expected))
    }

    /// Child field; `null` counts as absent.
    fn field(&self, key: &str) -> Option<Cursor<'a>> {
        match self.value.get(key) {
            None | Some(Value::Null) => None,
            Some(value) => Some(Cursor::new(value, self.join(key))),
        }
    }

    fn required(&self, key: &str, expected: &str) -> Result<Cursor<'a>> {
        self.field(key).ok_or_else(|| self.missing(key, expected))
    }

    fn string(&self, expected: &str) -> Result<&'a str> {
        self.value.as_str().ok_or_else(|| self.fail(expected))
    }

    fn positive_int(&self) -> Result<u32> {
        let expected = "a positive integer";
        let number = match self.value {
            Value::Number(n) => n,
            _ => return Err(self.fail(expected)),
        };
        let int = match (number.as_u64(), number.as_f64()) {
            (Some(v), _) => v,
            (None, Some(v)) if v.fract() == 0.0 && v >= 1.0 => v as u64,
            _ => return Err(self.fail(expected)),
        };
        if int == 0 || int > u32::MAX as u64 {
            return Err(self.fail(expected));
        }
        Ok(int as u32)
    }

    /// Elements of the `content` array; a missing array is empty.
    fn content(&self) -> Result<Vec<Cursor<'a>>> {
        self.items("content")
    }

    fn items(&self, key: &str) -> Result<Vec<Cursor<'a>>> {
        let Some(node) = self.field(key) else {
            return Ok(Vec::new());
        };
        let array = node.value.as_array().ok_or_else(|| node.fail("an array"))?;
        Ok(array
            .iter()
            .enumerate()
            .map(|(i, value)| Cursor::new(value, format!("{}[{}]", node.path, i)))
            .collect())
    }

    fn attrs(&self) -> Result<Option<Cursor<'a>>> {
        match self.field("attrs") {
            Some(attrs) => {
                attrs.object("an attributes object")?;
                Ok(Some(attrs))
            }
            None => Ok(None),
        }
    }

    fn attr(&self, key: &str) -> Result<Option<Cursor<'a>>> {
        Ok(self.attrs()?.and_then(|attrs| attrs.field(key)))
    }

    fn required_attr(&self, key: &str, expected: &str) -> Result<Cursor<'a>> {
        match self.attrs()? {
            Some(attrs) => attrs.required(key, expected),
            None => Err(self.missing(&format!("attrs.{}", key), expected)),
        }
    }

    /// The `type` discriminant of a node.
    fn node_type(&self, expected: &str) -> Result<&'a str> {
        self.object(expected)?;
        self.required("type", "a node type string")?
            .string("a node type string")
    }
}

fn document(node: &Cursor<'_>) -> Result<Document> {
    node.object("a document object")?;
    if let Some(kind) = node.field("type") {
        if kind.string("\"doc\"")? != "doc" {
            return Err(kind.fail("\"doc\""));
        }
    }

    // Title and language may live under `attrs` or on the root itself.
    let attr_or_root = |key: &str| -> Result<Option<Cursor<'_>>> {
        Ok(node.attr(key)?.or_else(|| node.field(key)))
    };

    let title = match attr_or_root("title")? {
        Some(title) => title.string("a string")?.to_string(),
        None => return Err(node.missing("attrs.title", "a title string")),
    };
    let language = match attr_or_root("language")? {
        Some(language) => {
            let value = language.string("a locale tag string")?;
            if value.trim().is_empty() {
                return Err(language.fail("a non-empty locale tag"));
            }
            value.to_string()
        }
        None => DEFAULT_LANGUAGE.to_string(),
    };

    let mut content = Vec::new();
    let mut loose_blocks: Vec<Block> = Vec::new();
    for child in node.content()? {
        let kind = child.node_type("a `section` or `grid` node")?;
        match kind {
            "section" | "grid" => {
                if !loose_blocks.is_empty() {
                    content.push(TopLevel::Section(Section::new(std::mem::take(
                        &mut loose_blocks,
                    ))));
                }
                if kind == "section" {
                    content.push(TopLevel::Section(section(&child)?));
                } else {
                    content.push(TopLevel::Grid(grid(&child)?));
                }
            }
            // Consecutive bare blocks form an implicit left-aligned section.
            _ => loose_blocks.push(block(&child, "a `section`, `grid` or block node")?),
        }
    }
    if !loose_blocks.is_empty() {
        content.push(TopLevel::Section(Section::new(loose_blocks)));
    }

    Ok(Document {
        language,
        title,
        content,
    })
}

fn section(node: &Cursor<'_>) -> Result<Section> {
    let align = match node.attr("align")? {
        Some(value) => alignment(&value)?,
        None => Align::Left,
    };
    let content = node
        .content()?
        .iter()
        .map(|child| block(child, "a block node"))
        .collect::<Result<Vec<_>>>()?;
    Ok(Section { align, content })
}

fn grid(node: &Cursor<'_>) -> Result<Grid> {
    let expected = "a `section` or `column` node";
    let mut columns = Vec::new();
    for child in node.content()? {
        match child.node_type(expected)? {
            "section" | "column" => columns.push(section(&child)?),
            _ => return Err(child.fail(expected)),
        }
    }
    Ok(Grid { columns })
}

fn block(node: &Cursor<'_>, expected: &str) -> Result<Block> {
    match node.node_type(expected)? {
        "heading" => {
            let level_node = node.required_attr("level", "an integer between 1 and 3")?;
            let level = match level_node.value.as_u64() {
                Some(level @ 1..=3) => level as u8,
                _ => return Err(level_node.fail("an integer between 1 and 3")),
            };
            Ok(Block::Heading(Heading {
                level,
                align: text_align(node)?,
                content: inlines(node)?,
            }))
        }
        "paragraph" => Ok(Block::Paragraph(Paragraph {
            align: text_align(node)?,
            content: inlines(node)?,
        })),
        "orderedList" => Ok(Block::List(list(node, ListKind::Ordered)?)),
        "bulletList" => Ok(Block::List(list(node, ListKind::Bullet)?)),
        "image" => image(node).map(Block::Image),
        _ => Err(node.fail(expected)),
    }
}

fn list(node: &Cursor<'_>, kind: ListKind) -> Result<List> {
    let mut items = Vec::new();
    for child in node.content()? {
        if child.node_type("a `listItem` node")? != "listItem" {
            return Err(child.fail("a `listItem` node"));
        }
        let content = child
            .content()?
            .iter()
            .map(|grandchild| {
                block(
                    grandchild,
                    "a `heading`, `paragraph`, `orderedList`, `bulletList` or `image` node",
                )
            })
            .collect::<Result<Vec<_>>>()?;
        items.push(ListItem { content });
    }
    Ok(List { kind, items })
}

fn image(node: &Cursor<'_>) -> Result<Image> {
    let src_node = node.required_attr("src", "an image URL string")?;
    let src = src_node.string("an image URL string")?;
    if src.trim().is_empty() {
        return Err(src_node.fail("a non-empty image URL"));
    }
    let alt = match node.attr("alt")? {
        Some(alt) => Some(alt.string("a string")?.to_string()),
        None => None,
    };
    let width = node.attr("width")?.map(|v| v.positive_int()).transpose()?;
    let height = node.attr("height")?.map(|v| v.positive_int()).transpose()?;

    Ok(Image {
        src: src.to_string(),
        alt,
        width,
        height,
        align: text_align(node)?,
    })
}

fn text_align(node: &Cursor<'_>) -> Result<Option<Align>> {
    node.attr("textAlign")?.map(|v| alignment(&v)).transpose()
}

fn alignment(node: &Cursor<'_>) -> Result<Align> {
    let expected = "one of \"left\", \"center\", \"right\", \"justify\"";
    Align::parse(node.string(expected)?).ok_or_else(|| node.fail(expected))
}

fn inlines(node: &Cursor<'_>) -> Result<Vec<Inline>> {
    node.content()?.iter().map(inline).collect()
}

fn inline(node: &Cursor<'_>) -> Result<Inline> {
    let expected = "a `text`, `tag`, `mention` or `hardBreak` node";
    match node.node_type(expected)? {
        "text" => {
            let text = node.required("text", "a string")?.string("a string")?;
            Ok(Inline::Text {
                text: text.to_string(),
                marks: marks(node)?,
            })
        }
        "tag" | "mention" => {
            let id = node
                .required_attr("id", "a tag id string")?
                .string("a tag id string")?;
            Ok(Inline::Tag {
                id: id.to_string(),
                marks: marks(node)?,
            })
        }
        "hardBreak" => Ok(Inline::HardBreak),
        _ => Err(node.fail(expected)),
    }
}

fn marks(node: &Cursor<'_>) -> Result<MarkSet> {
    let mut set = MarkSet::default();
    for mark in node.items("marks")? {
        set.insert(self::mark(&mark)?);
    }
    Ok(set)
}

fn mark(node: &Cursor<'_>) -> Result<Mark> {
    let expected = "a `bold`, `italic`, `underline`, `highlight` or `link` mark";
    match node.node_type(expected)? {
        "bold" => Ok(Mark::Bold),
        "italic" => Ok(Mark::Italic),
        "underline" => Ok(Mark::Underline),
        "highlight" => Ok(Mark::Highlight),
        "link" => {
            let href = node
                .required_attr("href", "a link URL string")?
                .string("a link URL string")?;
            let optional = |key: &str| -> Result<Option<String>> {
                node.attr(key)?
                    .map(|v| v.string("a string").map(str::to_string))
                    .transpose()
            };
            Ok(Mark::Link(Link {
                href: href.to_string(),
                rel: optional("rel")?,
                target: optional("target")?,
            }))
        }
        _ => Err(node.fail(expected)),
    }
}

fn tag_list(node: &Cursor<'_>) -> Result<Vec<TagValue>> {
    let array = node
        .value
        .as_array()
        .ok_or_else(|| node.fail("an array of tag values"))?;
    array
        .iter()
        .enumerate()
        .map(|(i, value)| tag_value(&Cursor::new(value, format!("{}[{}]", node.path, i))))
        .collect()
}

fn tag_value(node: &Cursor<'_>) -> Result<TagValue> {
    node.object("a tag value object")?;
    let id = node
        .required("id", "a tag id string")?
        .string("a tag id string")?
        .to_string();
    let value = match node.field("value") {
        None => None,
        Some(value) => Some(tag_data(&value)?),
    };
    Ok(TagValue { id, value })
}

fn tag_data(node: &Cursor<'_>) -> Result<TagData> {
    let expected = "a string, a number or an array of strings";
    match node.value {
        Value::String(s) => Ok(TagData::Text(s.clone())),
        Value::Number(n) => n.as_f64().map(TagData::Number).ok_or_else(|| node.fail(expected)),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| Error::validation(format!("{}[{}]", node.path, i), "a string"))
            })
            .collect::<Result<Vec<_>>>()
            .map(TagData::List),
        _ => Err(node.fail(expected)),
    }
}
