//! # impress
//!
//! Render rich-text editor documents with placeholder tags to PDF, HTML,
//! MJML and plain text.
//!
//! A document arrives as a JSON tree (the tiptap/ProseMirror shape), is
//! validated into a typed [`Document`], has its placeholder tags substituted
//! with locale-formatted values, and is rendered by one shared traversal into
//! the requested format.
//!
//! ## Quick Start
//!
//! ```no_run
//! use impress::{render_document, schema, Format, Tags, TagValue};
//!
//! # async fn run() -> impress::Result<()> {
//! let raw = serde_json::json!({
//!     "type": "doc",
//!     "attrs": { "title": "Invoice", "language": "fr" },
//!     "content": [
//!         { "type": "paragraph", "content": [
//!             { "type": "text", "text": "Bonjour " },
//!             { "type": "tag", "attrs": { "id": "name" } }
//!         ] }
//!     ]
//! });
//! let document = schema::validate(&raw)?;
//! let tags = Tags::new(vec![TagValue::new("name", "Alice")]);
//!
//! let html = render_document(&document, &tags, Format::Html).await?;
//! println!("{}", html.as_text().unwrap_or_default());
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - **Four output formats**: paginated PDF, standalone HTML, MJML, plain text
//! - **Locale-aware tags**: numbers, lists and missing values formatted per locale
//! - **Image prefetching**: concurrent, single-flight, with SVG rasterization for PDF
//! - **Strict validation**: errors name the exact path of the offending node

pub mod assets;
pub mod detect;
pub mod error;
pub mod format;
pub mod model;
pub mod render;
pub mod schema;

// Re-export commonly used types
pub use assets::{AssetCache, AssetResolver, Fetcher, HttpFetcher};
pub use error::{Error, ErrorKind, Result};
pub use model::{
    Align, Block, Document, Grid, Heading, Image, Inline, List, ListItem, ListKind, Mark, MarkSet,
    Paragraph, Section, TagData, TagValue, Tags,
};
pub use render::{Format, JsonFormat, PageSize, RenderOptions, Rendered, TextOptions};
pub use schema::{validate, validate_request, RenderRequest};

use log::debug;
use std::sync::Arc;

/// Render a validated document with default options and the default fetcher.
///
/// # Arguments
///
/// * `document` - A validated document
/// * `tags` - Placeholder values; missing ids render as empty text
/// * `format` - Output format
///
/// # Example
///
/// ```no_run
/// use impress::{render_document, Document, Format, Tags};
///
/// # async fn run() -> impress::Result<()> {
/// let pdf = render_document(&Document::new("Empty"), &Tags::default(), Format::Pdf).await?;
/// std::fs::write("empty.pdf", &pdf.body)?;
/// # Ok(())
/// # }
/// ```
pub async fn render_document(document: &Document, tags: &Tags, format: Format) -> Result<Rendered> {
    Impress::new().render(document, tags, format).await
}

/// Builder for rendering documents.
///
/// # Example
///
/// ```no_run
/// use impress::{Impress, PageSize, RenderOptions, RenderRequest};
///
/// # async fn run(request: RenderRequest) -> impress::Result<()> {
/// let rendered = Impress::new()
///     .with_options(RenderOptions::new().with_page_size(PageSize::LETTER))
///     .render_request(&request)
///     .await?;
/// println!("{} bytes of {}", rendered.len(), rendered.content_type);
/// # Ok(())
/// # }
/// ```
pub struct Impress {
    options: RenderOptions,
    fetcher: Arc<dyn Fetcher>,
}

impl Impress {
    /// Create a renderer with default options and the HTTP fetcher.
    pub fn new() -> Self {
        Self {
            options: RenderOptions::default(),
            fetcher: Arc::new(HttpFetcher::new()),
        }
    }

    /// Set render options.
    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    /// Use a custom fetcher for images.
    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Current render options.
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Render a document.
    ///
    /// Images are fetched only for binary formats; markup formats reference
    /// them by URL and perform no I/O.
    pub async fn render(&self, document: &Document, tags: &Tags, format: Format) -> Result<Rendered> {
        let cache = if format.is_binary() {
            AssetResolver::new(Arc::clone(&self.fetcher))
                .resolve(document)
                .await?
        } else {
            AssetCache::empty()
        };
        debug!(
            "Rendering \"{}\" as {} with {} tag value(s)",
            document.title,
            format,
            tags.len()
        );
        render::render(document, tags, &cache, format, &self.options)
    }

    /// Render a validated request.
    pub async fn render_request(&self, request: &RenderRequest) -> Result<Rendered> {
        self.render(&request.document, &request.tags, request.format)
            .await
    }

    /// Validate and render a raw request `{ document, tags?, format? }`.
    pub async fn render_json(&self, raw: &serde_json::Value) -> Result<Rendered> {
        let request = validate_request(raw)?;
        self.render_request(&request).await
    }
}

impl Default for Impress {
    fn default() -> Self {
        Self::new()
    }
}
