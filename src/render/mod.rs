//! Rendering module for converting documents to the output formats.
//!
//! Every format starts from the same traversal ([`visitor::walk`]). PDF goes
//! through layout and pagination; the markup formats share one MJML tree that
//! is serialized as MJML, converted to HTML, or flattened to text.

mod html;
mod json;
mod markup;
mod options;
pub mod pdf;
mod result;
mod text;
pub mod visitor;

pub use html::to_html;
pub use json::{to_json, JsonFormat};
pub use markup::{to_mjml, Element, MarkupTarget, Node};
pub use options::{Margins, PageSize, RenderOptions, TextOptions};
pub use result::Rendered;
pub use text::to_text;
pub use visitor::{walk, BlockContext, RenderContext, RenderTarget};

use crate::assets::AssetCache;
use crate::error::Result;
use crate::model::{Document, Tags};
use log::debug;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Output format of a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Standalone HTML5 page
    #[default]
    Html,
    /// Plain text
    Text,
    /// Paginated PDF
    Pdf,
    /// MJML email markup
    Mjml,
}

impl Format {
    /// All formats.
    pub const ALL: [Format; 4] = [Format::Html, Format::Text, Format::Pdf, Format::Mjml];

    /// Parse a format name, case-insensitively.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "html" => Some(Format::Html),
            "text" => Some(Format::Text),
            "pdf" => Some(Format::Pdf),
            "mjml" => Some(Format::Mjml),
            _ => None,
        }
    }

    /// Format name as used in requests.
    pub fn as_str(self) -> &'static str {
        match self {
            Format::Html => "html",
            Format::Text => "text",
            Format::Pdf => "pdf",
            Format::Mjml => "mjml",
        }
    }

    /// MIME type of the rendered body.
    pub fn content_type(self) -> &'static str {
        match self {
            Format::Html => "text/html",
            Format::Text => "text/plain",
            Format::Pdf => "application/pdf",
            Format::Mjml => "text/mjml",
        }
    }

    /// Map an exact `Accept` header value to a format.
    pub fn from_accept(accept: &str) -> Option<Self> {
        let accept = accept.trim();
        Self::ALL
            .into_iter()
            .find(|format| format.content_type().eq_ignore_ascii_case(accept))
    }

    /// Whether the output is binary. Only binary formats need assets.
    pub fn is_binary(self) -> bool {
        matches!(self, Format::Pdf)
    }

    /// Conventional file extension.
    pub fn extension(self) -> &'static str {
        match self {
            Format::Html => "html",
            Format::Text => "txt",
            Format::Pdf => "pdf",
            Format::Mjml => "mjml",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Render a validated document.
///
/// `cache` must hold every image of the document when `format` is PDF; the
/// markup formats reference images by URL and ignore it. A language set in
/// `options` replaces the document's own language.
pub fn render(
    doc: &Document,
    tags: &Tags,
    cache: &AssetCache,
    format: Format,
    options: &RenderOptions,
) -> Result<Rendered> {
    let doc = match &options.language {
        Some(language) => {
            let mut doc = doc.clone();
            doc.language = language.clone();
            Cow::Owned(doc)
        }
        None => Cow::Borrowed(doc),
    };
    let ctx = RenderContext::new(&doc.language, tags);

    match format {
        Format::Pdf => {
            let (body, pages) = pdf::render_pdf(&doc, &ctx, cache, options)?;
            debug!("Rendered PDF: {} bytes, {} page(s)", body.len(), pages);
            Ok(Rendered::new(format, body).with_page_count(pages))
        }
        Format::Html | Format::Text | Format::Mjml => {
            let tree = walk(&doc, &ctx, &mut MarkupTarget::new())?;
            let body = match format {
                Format::Mjml => to_mjml(&tree),
                Format::Html => to_html(&tree)?,
                _ => to_text(&tree, &options.text),
            };
            debug!("Rendered {}: {} bytes", format, body.len());
            Ok(Rendered::new(format, body.into_bytes()))
        }
    }
}
