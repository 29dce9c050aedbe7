//! Rendering options and configuration.

use chrono::{DateTime, Utc};

/// Options for rendering documents.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    /// Page size for PDF output
    pub page_size: PageSize,

    /// Page padding for PDF output, in points
    pub margins: Margins,

    /// Language that replaces the document's own language
    pub language: Option<String>,

    /// Creation date written into PDF metadata
    pub creation_date: Option<DateTime<Utc>>,

    /// Plain text output options
    pub text: TextOptions,
}

impl RenderOptions {
    /// Create new render options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page size.
    pub fn with_page_size(mut self, size: PageSize) -> Self {
        self.page_size = size;
        self
    }

    /// Set the page margins.
    pub fn with_margins(mut self, margins: Margins) -> Self {
        self.margins = margins;
        self
    }

    /// Override the document language.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Write a creation date into PDF metadata.
    pub fn with_creation_date(mut self, date: DateTime<Utc>) -> Self {
        self.creation_date = Some(date);
        self
    }

    /// Set plain text options.
    pub fn with_text_options(mut self, text: TextOptions) -> Self {
        self.text = text;
        self
    }

    /// Width of the content box, in points.
    pub fn content_width(&self) -> f32 {
        (self.page_size.width - self.margins.left - self.margins.right).max(1.0)
    }

    /// Height of the content box, in points.
    pub fn content_height(&self) -> f32 {
        (self.page_size.height - self.margins.top - self.margins.bottom).max(1.0)
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            page_size: PageSize::A4,
            margins: Margins::default(),
            language: None,
            creation_date: None,
            text: TextOptions::default(),
        }
    }
}

/// Page dimensions in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    /// Width in points
    pub width: f32,
    /// Height in points
    pub height: f32,
}

impl PageSize {
    /// ISO A4
    pub const A4: PageSize = PageSize {
        width: 595.28,
        height: 841.89,
    };

    /// US Letter
    pub const LETTER: PageSize = PageSize {
        width: 612.0,
        height: 792.0,
    };

    /// Parse a page size name ("a4", "letter").
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "a4" => Some(Self::A4),
            "letter" => Some(Self::LETTER),
            _ => None,
        }
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self::A4
    }
}

/// Page padding in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    /// Top padding
    pub top: f32,
    /// Bottom padding; the page number sits inside it
    pub bottom: f32,
    /// Left padding
    pub left: f32,
    /// Right padding
    pub right: f32,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: 35.0,
            bottom: 65.0,
            left: 35.0,
            right: 35.0,
        }
    }
}

/// Options for plain text output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextOptions {
    /// Write headings in upper case
    pub uppercase_headings: bool,

    /// Include `[alt]`/`[src]` placeholders for images
    pub include_images: bool,
}

impl TextOptions {
    /// Keep headings in their original case.
    pub fn with_uppercase_headings(mut self, uppercase: bool) -> Self {
        self.uppercase_headings = uppercase;
        self
    }

    /// Enable or disable image placeholders.
    pub fn with_images(mut self, include: bool) -> Self {
        self.include_images = include;
        self
    }
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            uppercase_headings: true,
            include_images: true,
        }
    }
}
