//! Standalone HTML5 output from the MJML tree.
//!
//! Only the component subset produced by [`super::markup::MarkupTarget`] is
//! supported: `mj-section`, `mj-column`, `mj-text` and `mj-image`. Raw HTML
//! elements inside components are written as they are.

use super::markup::{escape_attr, escape_text, write_element, Element, Node};
use crate::error::{Error, Result};
use crate::model::DEFAULT_LANGUAGE;
use std::collections::HashMap;

const BASE_STYLE: &str = "body{margin:0;padding:0;font-family:Helvetica,Arial,sans-serif;font-size:13px;color:#000}\
.impress-body{margin:0 auto}\
.impress-section{display:flex;flex-direction:row}\
.impress-column{flex:1 1 0;min-width:0}\
.impress-image img{max-width:100%;height:auto}";

/// Default attributes per component, from `mj-head > mj-attributes`.
type Defaults = HashMap<String, Vec<(String, String)>>;

/// Convert a markup tree rooted at `mjml` to an HTML document.
pub fn to_html(root: &Element) -> Result<String> {
    if root.name != "mjml" {
        return Err(Error::internal(format!(
            "markup root must be <mjml>, found <{}>",
            root.name
        )));
    }
    let body = root
        .find("mj-body")
        .ok_or_else(|| Error::internal("markup has no <mj-body>"))?;

    let head = root.find("mj-head");
    let title = head
        .and_then(|head| head.find("mj-title"))
        .map(text_content)
        .unwrap_or_default();
    let defaults = head
        .and_then(|head| head.find("mj-attributes"))
        .map(collect_defaults)
        .unwrap_or_default();

    let lang = root.get_attr("lang").unwrap_or(DEFAULT_LANGUAGE);
    let width = body.get_attr("width").unwrap_or("600px");

    let mut out = String::new();
    out.push_str("<!doctype html>");
    out.push_str(&format!("<html lang=\"{}\">", escape_attr(lang)));
    out.push_str("<head><meta charset=\"utf-8\">");
    out.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">");
    out.push_str(&format!("<title>{}</title>", escape_text(&title)));
    out.push_str("<style>");
    out.push_str(BASE_STYLE);
    out.push_str("</style></head><body>");
    out.push_str(&format!(
        "<div class=\"impress-body\" style=\"max-width:{}\">",
        escape_attr(width)
    ));
    for child in &body.children {
        write_component(&mut out, child, &defaults)?;
    }
    out.push_str("</div></body></html>");
    Ok(out)
}

fn collect_defaults(attributes: &Element) -> Defaults {
    attributes
        .children
        .iter()
        .filter_map(Node::as_element)
        .map(|element| (element.name.clone(), element.attrs.clone()))
        .collect()
}

/// Attribute value from the element, falling back to the component default.
fn attr<'a>(element: &'a Element, defaults: &'a Defaults, key: &str) -> Option<&'a str> {
    element.get_attr(key).or_else(|| {
        defaults
            .get(&element.name)?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    })
}

fn style(pairs: &[(&str, Option<&str>)]) -> String {
    pairs
        .iter()
        .filter_map(|(key, value)| value.map(|v| format!("{}:{}", key, v)))
        .collect::<Vec<_>>()
        .join(";")
}

fn write_component(out: &mut String, node: &Node, defaults: &Defaults) -> Result<()> {
    let element = match node {
        Node::Text(text) => {
            out.push_str(&escape_text(text));
            return Ok(());
        }
        Node::Element(element) => element,
    };

    match element.name.as_str() {
        "mj-section" => {
            let css = style(&[("padding", attr(element, defaults, "padding"))]);
            out.push_str(&format!(
                "<div class=\"impress-section\" style=\"{}\">",
                escape_attr(&css)
            ));
            for child in &element.children {
                write_component(out, child, defaults)?;
            }
            out.push_str("</div>");
        }
        "mj-column" => {
            out.push_str("<div class=\"impress-column\">");
            for child in &element.children {
                write_component(out, child, defaults)?;
            }
            out.push_str("</div>");
        }
        "mj-text" => {
            let css = style(&[
                ("text-align", attr(element, defaults, "align")),
                ("line-height", attr(element, defaults, "line-height")),
                ("padding", attr(element, defaults, "padding")),
            ]);
            out.push_str(&format!("<div style=\"{}\">", escape_attr(&css)));
            for child in &element.children {
                write_raw(out, child);
            }
            out.push_str("</div>");
        }
        "mj-image" => {
            let css = style(&[
                ("text-align", attr(element, defaults, "align")),
                ("padding", attr(element, defaults, "padding")),
            ]);
            let img = Element::new("img")
                .attr("src", attr(element, defaults, "src").unwrap_or_default())
                .attr("alt", attr(element, defaults, "alt").unwrap_or_default())
                .attr_opt("width", attr(element, defaults, "width").map(strip_px))
                .attr_opt("height", attr(element, defaults, "height").map(strip_px));
            out.push_str(&format!(
                "<div class=\"impress-image\" style=\"{}\">",
                escape_attr(&css)
            ));
            write_element(out, &img, ">");
            out.push_str("</div>");
        }
        other if other.starts_with("mj-") => {
            return Err(Error::internal(format!("unsupported component <{}>", other)));
        }
        _ => write_raw(out, node),
    }
    Ok(())
}

fn write_raw(out: &mut String, node: &Node) {
    match node {
        Node::Element(element) => write_element(out, element, ">"),
        Node::Text(text) => out.push_str(&escape_text(text)),
    }
}

fn strip_px(value: &str) -> &str {
    value.strip_suffix("px").unwrap_or(value)
}

/// Concatenated text of an element and its descendants.
pub(crate) fn text_content(element: &Element) -> String {
    let mut out = String::new();
    for child in &element.children {
        match child {
            Node::Text(text) => out.push_str(text),
            Node::Element(child) => out.push_str(&text_content(child)),
        }
    }
    out
}
