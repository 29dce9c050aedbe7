//! Serialization of the model back to normalized wire JSON.

use crate::model::{Block, Document, Inline, ListKind, MarkSet, Section, TopLevel};
use serde_json::{json, Map, Value};

/// Convert a document to its normalized wire form.
///
/// The output always validates back to an equal document: implicit sections
/// become explicit, `mention` nodes become `tag` nodes and grid children are
/// written as `column`.
pub fn to_value(doc: &Document) -> Value {
    let content: Vec<Value> = doc
        .content
        .iter()
        .map(|top| match top {
            TopLevel::Section(section) => section_value("section", section),
            TopLevel::Grid(grid) => json!({
                "type": "grid",
                "content": grid
                    .columns
                    .iter()
                    .map(|column| section_value("column", column))
                    .collect::<Vec<_>>(),
            }),
        })
        .collect();

    json!({
        "type": "doc",
        "attrs": { "title": doc.title, "language": doc.language },
        "content": content,
    })
}

fn section_value(kind: &str, section: &Section) -> Value {
    json!({
        "type": kind,
        "attrs": { "align": section.align.as_str() },
        "content": section.content.iter().map(block_value).collect::<Vec<_>>(),
    })
}

fn block_value(block: &Block) -> Value {
    match block {
        Block::Heading(heading) => {
            let mut attrs = Map::new();
            attrs.insert("level".into(), json!(heading.level));
            if let Some(align) = heading.align {
                attrs.insert("textAlign".into(), json!(align.as_str()));
            }
            json!({
                "type": "heading",
                "attrs": attrs,
                "content": heading.content.iter().map(inline_value).collect::<Vec<_>>(),
            })
        }
        Block::Paragraph(paragraph) => {
            let mut node = Map::new();
            node.insert("type".into(), json!("paragraph"));
            if let Some(align) = paragraph.align {
                node.insert("attrs".into(), json!({ "textAlign": align.as_str() }));
            }
            node.insert(
                "content".into(),
                Value::Array(paragraph.content.iter().map(inline_value).collect()),
            );
            Value::Object(node)
        }
        Block::List(list) => {
            let kind = match list.kind {
                ListKind::Ordered => "orderedList",
                ListKind::Bullet => "bulletList",
            };
            let items: Vec<Value> = list
                .items
                .iter()
                .map(|item| {
                    json!({
                        "type": "listItem",
                        "content": item.content.iter().map(block_value).collect::<Vec<_>>(),
                    })
                })
                .collect();
            json!({ "type": kind, "content": items })
        }
        Block::Image(image) => {
            let mut attrs = Map::new();
            attrs.insert("src".into(), json!(image.src));
            if let Some(alt) = &image.alt {
                attrs.insert("alt".into(), json!(alt));
            }
            if let Some(width) = image.width {
                attrs.insert("width".into(), json!(width));
            }
            if let Some(height) = image.height {
                attrs.insert("height".into(), json!(height));
            }
            if let Some(align) = image.align {
                attrs.insert("textAlign".into(), json!(align.as_str()));
            }
            json!({ "type": "image", "attrs": attrs })
        }
    }
}

fn inline_value(inline: &Inline) -> Value {
    match inline {
        Inline::Text { text, marks } => {
            let mut node = Map::new();
            node.insert("type".into(), json!("text"));
            node.insert("text".into(), json!(text));
            insert_marks(&mut node, marks);
            Value::Object(node)
        }
        Inline::Tag { id, marks } => {
            let mut node = Map::new();
            node.insert("type".into(), json!("tag"));
            node.insert("attrs".into(), json!({ "id": id }));
            insert_marks(&mut node, marks);
            Value::Object(node)
        }
        Inline::HardBreak => json!({ "type": "hardBreak" }),
    }
}

fn insert_marks(node: &mut Map<String, Value>, marks: &MarkSet) {
    if marks.is_empty() {
        return;
    }
    let mut list = Vec::new();
    if marks.bold {
        list.push(json!({ "type": "bold" }));
    }
    if marks.italic {
        list.push(json!({ "type": "italic" }));
    }
    if marks.underline {
        list.push(json!({ "type": "underline" }));
    }
    if marks.highlight {
        list.push(json!({ "type": "highlight" }));
    }
    if let Some(link) = &marks.link {
        let mut attrs = Map::new();
        attrs.insert("href".into(), json!(link.href));
        if let Some(rel) = &link.rel {
            attrs.insert("rel".into(), json!(rel));
        }
        if let Some(target) = &link.target {
            attrs.insert("target".into(), json!(target));
        }
        list.push(json!({ "type": "link", "attrs": attrs }));
    }
    node.insert("marks".into(), Value::Array(list));
}
