//! Intermediate MJML markup tree.
//!
//! Markup targets (HTML, text, MJML) share one tree built by
//! [`MarkupTarget`]. Top-level blocks become MJML components (`mj-text`,
//! `mj-image`), nested blocks become raw HTML elements. The tree is then
//! serialized as MJML or converted by the HTML and text postprocessors.

use super::visitor::{BlockContext, RenderTarget};
use crate::error::Result;
use crate::model::{Align, Document, Heading, Image, ListKind, MarkSet, Paragraph};

/// Elements serialized without a closing tag.
const VOID_ELEMENTS: &[&str] = &["br", "img", "meta", "mj-image"];

/// A markup node.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Element with attributes and children
    Element(Element),
    /// Text content, unescaped
    Text(String),
}

impl Node {
    /// The element, if this node is one.
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

/// A markup element. Attribute order is preserved.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Tag name
    pub name: String,
    /// Attributes in insertion order
    pub attrs: Vec<(String, String)>,
    /// Child nodes
    pub children: Vec<Node>,
}

impl Element {
    /// Create an element without attributes or children.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Add an attribute.
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((key.into(), value.into()));
        self
    }

    /// Add an attribute when `value` is present.
    pub fn attr_opt(self, key: &str, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.attr(key, value),
            None => self,
        }
    }

    /// Append one child.
    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }

    /// Append children.
    pub fn children(mut self, nodes: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(nodes);
        self
    }

    /// Append a text child.
    pub fn text(self, text: impl Into<String>) -> Self {
        self.child(Node::Text(text.into()))
    }

    /// Look up an attribute value.
    pub fn get_attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// First direct child element named `name`.
    pub fn find(&self, name: &str) -> Option<&Element> {
        self.children
            .iter()
            .filter_map(Node::as_element)
            .find(|element| element.name == name)
    }

    /// Whether the element is void (no children, no closing tag).
    pub fn is_void(&self) -> bool {
        VOID_ELEMENTS.contains(&self.name.as_str())
    }
}

/// Serialize a markup tree as compact MJML.
pub fn to_mjml(root: &Element) -> String {
    let mut out = String::new();
    write_element(&mut out, root, "/>");
    out
}

/// Write an element. `void_end` closes void elements (`/>` for XML, `>` for HTML).
pub(crate) fn write_element(out: &mut String, element: &Element, void_end: &str) {
    out.push('<');
    out.push_str(&element.name);
    for (key, value) in &element.attrs {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&escape_attr(value));
        out.push('"');
    }
    if element.is_void() {
        out.push_str(void_end);
        return;
    }
    out.push('>');
    for child in &element.children {
        match child {
            Node::Element(child) => write_element(out, child, void_end),
            Node::Text(text) => out.push_str(&escape_text(text)),
        }
    }
    out.push_str("</");
    out.push_str(&element.name);
    out.push('>');
}

/// Escape text content.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escape an attribute value.
pub fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Builds the MJML tree.
#[derive(Debug, Clone, Default)]
pub struct MarkupTarget;

impl MarkupTarget {
    /// Create a markup target.
    pub fn new() -> Self {
        Self
    }

    /// Wrap a top-level block in `mj-text`; nested blocks stay raw.
    fn wrap_text(cx: BlockContext, element: Element) -> Node {
        if cx.is_top() {
            Element::new("mj-text")
                .attr("align", cx.align.as_str())
                .child(element)
                .into()
        } else {
            element.into()
        }
    }
}

impl RenderTarget for MarkupTarget {
    type Inline = Vec<Node>;
    type Block = Node;
    type Output = Element;

    fn text(&mut self, text: &str, marks: &MarkSet) -> Result<Vec<Node>> {
        let mut nodes = Vec::new();
        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                nodes.push(Element::new("br").into());
            }
            if !line.is_empty() {
                nodes.push(Node::Text(line.to_string()));
            }
        }
        if marks.is_empty() {
            return Ok(nodes);
        }

        // Innermost to outermost.
        let mut wrapped = nodes;
        let wrap = |name: &str, wrapped: &mut Vec<Node>| {
            let inner = std::mem::take(wrapped);
            wrapped.push(Element::new(name).children(inner).into());
        };
        if marks.bold {
            wrap("strong", &mut wrapped);
        }
        if marks.italic {
            wrap("em", &mut wrapped);
        }
        if marks.underline {
            wrap("u", &mut wrapped);
        }
        if marks.highlight {
            wrap("mark", &mut wrapped);
        }
        if let Some(link) = &marks.link {
            let inner = std::mem::take(&mut wrapped);
            wrapped.push(
                Element::new("a")
                    .attr("href", link.href.as_str())
                    .attr_opt("rel", link.rel.as_deref())
                    .attr_opt("target", link.target.as_deref())
                    .children(inner)
                    .into(),
            );
        }
        Ok(wrapped)
    }

    fn hard_break(&mut self) -> Result<Option<Vec<Node>>> {
        Ok(Some(vec![Element::new("br").into()]))
    }

    fn heading(&mut self, heading: &Heading, cx: BlockContext, content: Vec<Vec<Node>>) -> Result<Node> {
        let element = Element::new(format!("h{}", heading.level)).children(content.into_iter().flatten());
        Ok(Self::wrap_text(cx, element))
    }

    fn paragraph(&mut self, _paragraph: &Paragraph, cx: BlockContext, content: Vec<Vec<Node>>) -> Result<Node> {
        let element = Element::new("p").children(content.into_iter().flatten());
        Ok(Self::wrap_text(cx, element))
    }

    fn list(&mut self, kind: ListKind, cx: BlockContext, items: Vec<Vec<Node>>) -> Result<Node> {
        let name = match kind {
            ListKind::Ordered => "ol",
            ListKind::Bullet => "ul",
        };
        let element = Element::new(name).children(
            items
                .into_iter()
                .map(|blocks| Element::new("li").children(blocks).into()),
        );
        Ok(Self::wrap_text(cx, element))
    }

    fn image(&mut self, image: &Image, cx: BlockContext) -> Result<Node> {
        let width = image.width.map(|w| w.to_string());
        let height = image.height.map(|h| h.to_string());
        let element = if cx.is_top() {
            Element::new("mj-image")
                .attr("src", image.src.as_str())
                .attr_opt("width", width.map(|w| format!("{}px", w)))
                .attr_opt("height", height.map(|h| format!("{}px", h)))
                .attr("align", cx.align.for_box().as_str())
                .attr("alt", image.alt.as_deref().unwrap_or(""))
        } else {
            Element::new("img")
                .attr("src", image.src.as_str())
                .attr_opt("alt", image.alt.as_deref())
                .attr_opt("width", width)
                .attr_opt("height", height)
        };
        Ok(element.into())
    }

    fn section(&mut self, _align: Align, blocks: Vec<Node>) -> Result<Node> {
        Ok(Element::new("mj-column").children(blocks).into())
    }

    fn grid(&mut self, columns: Vec<Node>) -> Result<Node> {
        Ok(Element::new("mj-section").children(columns).into())
    }

    fn document(&mut self, doc: &Document, body: Vec<Node>) -> Result<Element> {
        // A full-width section is a one-column `mj-section`; grids already are.
        let body = body.into_iter().map(|node| match node {
            Node::Element(element) if element.name == "mj-column" => {
                Element::new("mj-section").child(element).into()
            }
            other => other,
        });

        let head = Element::new("mj-head")
            .child(Element::new("mj-title").text(doc.title.as_str()))
            .child(
                Element::new("mj-attributes")
                    .child(Element::new("mj-text").attr("line-height", "1.2").attr("padding", "0"))
                    .child(Element::new("mj-section").attr("padding", "10px 0"))
                    .child(Element::new("mj-image").attr("padding", "0")),
            );

        Ok(Element::new("mjml")
            .attr("lang", doc.language.as_str())
            .child(head)
            .child(Element::new("mj-body").attr("width", "700px").children(body)))
    }
}
