//! Rendering result.

use super::Format;

/// Output of one render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    /// Format of `body`
    pub format: Format,

    /// Rendered bytes; UTF-8 for every format except PDF
    pub body: Vec<u8>,

    /// MIME type of `body`
    pub content_type: &'static str,

    /// Number of pages, for paginated formats
    pub page_count: Option<usize>,
}

impl Rendered {
    /// Create a result for `format`.
    pub fn new(format: Format, body: Vec<u8>) -> Self {
        Self {
            format,
            body,
            content_type: format.content_type(),
            page_count: None,
        }
    }

    /// Record the page count.
    pub fn with_page_count(mut self, pages: usize) -> Self {
        self.page_count = Some(pages);
        self
    }

    /// Body as text, or `None` for binary formats.
    pub fn as_text(&self) -> Option<&str> {
        if self.format.is_binary() {
            return None;
        }
        std::str::from_utf8(&self.body).ok()
    }

    /// Body length in bytes.
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Whether the body is empty.
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Take the body.
    pub fn into_bytes(self) -> Vec<u8> {
        self.body
    }
}
