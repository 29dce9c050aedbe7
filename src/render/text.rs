//! Plain text output from the MJML tree.
//!
//! Text is read off the same markup tree the HTML output is built from.
//! Rendered HTML is never parsed back (there is no `html2text` round trip),
//! so both outputs share one block structure.

use super::markup::{Element, Node};
use super::options::TextOptions;
use once_cell::sync::Lazy;
use regex::Regex;

/// HTML whitespace, which does not include no-break spaces.
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t\r\n\x0C]+").unwrap());

const INDENT: &str = "  ";

/// Convert a markup tree to plain text.
///
/// Blocks are separated by blank lines. List items are prefixed `* ` or
/// `N. ` and nested lists are indented by two spaces. Links keep their text.
pub fn to_text(root: &Element, options: &TextOptions) -> String {
    let mut blocks = Vec::new();
    collect_blocks(root, options, &mut blocks);
    blocks.join("\n\n").trim().to_string()
}

fn collect_blocks(element: &Element, options: &TextOptions, blocks: &mut Vec<String>) {
    for child in &element.children {
        match child {
            Node::Text(text) => push_block(blocks, collapse(text).trim().to_string()),
            Node::Element(child) => match child.name.as_str() {
                "mj-head" => {}
                "ul" | "ol" => push_block(blocks, list_lines(child, options).join("\n")),
                "mj-image" | "img" => {
                    if options.include_images {
                        push_block(blocks, image_text(child));
                    }
                }
                name if is_text_block(name) => push_block(blocks, block_text(child, options)),
                _ => collect_blocks(child, options, blocks),
            },
        }
    }
}

fn push_block(blocks: &mut Vec<String>, block: String) {
    if !block.is_empty() {
        blocks.push(block);
    }
}

fn is_text_block(name: &str) -> bool {
    matches!(name, "p" | "h1" | "h2" | "h3")
}

/// Text of a paragraph or heading, one entry per line.
fn block_text(element: &Element, options: &TextOptions) -> String {
    let mut raw = String::new();
    inline_text(element, &mut raw);
    let text = raw
        .split('\n')
        .map(|line| collapse(line).trim().to_string())
        .collect::<Vec<_>>()
        .join("\n");
    if options.uppercase_headings && element.name.starts_with('h') {
        text.to_uppercase()
    } else {
        text
    }
}

fn inline_text(element: &Element, out: &mut String) {
    for child in &element.children {
        match child {
            Node::Text(text) => out.push_str(text),
            Node::Element(child) if child.name == "br" => out.push('\n'),
            Node::Element(child) => inline_text(child, out),
        }
    }
}

fn image_text(element: &Element) -> String {
    let src = element.get_attr("src").unwrap_or_default();
    match element.get_attr("alt").map(str::trim) {
        Some(alt) if !alt.is_empty() => format!("{} [{}]", alt, src),
        _ => format!("[{}]", src),
    }
}

fn list_lines(list: &Element, options: &TextOptions) -> Vec<String> {
    let ordered = list.name == "ol";
    let mut lines = Vec::new();
    let items = list
        .children
        .iter()
        .filter_map(Node::as_element)
        .filter(|element| element.name == "li");

    for (index, item) in items.enumerate() {
        let prefix = if ordered {
            format!("{}. ", index + 1)
        } else {
            "* ".to_string()
        };
        let hanging = " ".repeat(prefix.chars().count());

        let mut item_lines: Vec<String> = Vec::new();
        for child in item.children.iter().filter_map(Node::as_element) {
            match child.name.as_str() {
                "ul" | "ol" => {
                    for line in list_lines(child, options) {
                        item_lines.push(format!("{}{}", INDENT, line));
                    }
                }
                "img" | "mj-image" if options.include_images => item_lines.push(image_text(child)),
                name if is_text_block(name) => {
                    let text = block_text(child, options);
                    item_lines.extend(text.split('\n').filter(|l| !l.is_empty()).map(str::to_string));
                }
                _ => {}
            }
        }

        if item_lines.is_empty() {
            lines.push(prefix.trim_end().to_string());
            continue;
        }
        let mut first = true;
        for line in item_lines {
            if first {
                lines.push(format!("{}{}", prefix, line.trim_start()));
                first = false;
            } else if line.starts_with(INDENT) {
                lines.push(line);
            } else {
                lines.push(format!("{}{}", hanging, line));
            }
        }
    }
    lines
}

fn collapse(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").into_owned()
}
