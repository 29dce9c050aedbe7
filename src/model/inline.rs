//! Inline content and formatting marks.

/// Inline content within a heading or paragraph.
#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    /// Literal text
    Text {
        /// The text, possibly containing `\n`
        text: String,
        /// Formatting marks
        marks: MarkSet,
    },

    /// Placeholder resolved from the tag values at render time
    Tag {
        /// Tag id to look up
        id: String,
        /// Formatting marks
        marks: MarkSet,
    },

    /// Explicit line break (markup targets only)
    HardBreak,
}

impl Inline {
    /// Create unformatted text.
    pub fn text(text: impl Into<String>) -> Self {
        Inline::Text {
            text: text.into(),
            marks: MarkSet::default(),
        }
    }

    /// Create an unformatted tag reference.
    pub fn tag(id: impl Into<String>) -> Self {
        Inline::Tag {
            id: id.into(),
            marks: MarkSet::default(),
        }
    }

    /// Add a mark to text or tag content. Hard breaks are returned unchanged.
    pub fn with_mark(mut self, mark: Mark) -> Self {
        if let Inline::Text { marks, .. } | Inline::Tag { marks, .. } = &mut self {
            marks.insert(mark);
        }
        self
    }
}

/// A single formatting mark as it appears in input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mark {
    /// Bold weight
    Bold,
    /// Italic style
    Italic,
    /// Underline decoration
    Underline,
    /// Highlighted background
    Highlight,
    /// Hyperlink
    Link(Link),
}

/// Hyperlink attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// Link target URL
    pub href: String,
    /// `rel` attribute
    pub rel: Option<String>,
    /// `target` attribute
    pub target: Option<String>,
}

impl Link {
    /// Create a link with only an href.
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            rel: None,
            target: None,
        }
    }
}

/// The set of marks attached to a text run.
///
/// Stored as flags so that the order marks were declared in has no effect on
/// equality or on rendered output. A second link mark replaces the first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkSet {
    /// Bold weight
    pub bold: bool,
    /// Italic style
    pub italic: bool,
    /// Underline decoration
    pub underline: bool,
    /// Highlighted background
    pub highlight: bool,
    /// Hyperlink
    pub link: Option<Link>,
}

impl MarkSet {
    /// Add a mark to the set.
    pub fn insert(&mut self, mark: Mark) {
        match mark {
            Mark::Bold => self.bold = true,
            Mark::Italic => self.italic = true,
            Mark::Underline => self.underline = true,
            Mark::Highlight => self.highlight = true,
            Mark::Link(link) => self.link = Some(link),
        }
    }

    /// Whether text should be drawn underlined. Links are always underlined.
    pub fn is_underlined(&self) -> bool {
        self.underline || self.link.is_some()
    }

    /// Check if no mark is set.
    pub fn is_empty(&self) -> bool {
        !self.bold && !self.italic && !self.underline && !self.highlight && self.link.is_none()
    }
}

impl FromIterator<Mark> for MarkSet {
    fn from_iter<I: IntoIterator<Item = Mark>>(iter: I) -> Self {
        let mut set = MarkSet::default();
        for mark in iter {
            set.insert(mark);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_set_is_order_independent() {
        let a: MarkSet = [Mark::Bold, Mark::Italic].into_iter().collect();
        let b: MarkSet = [Mark::Italic, Mark::Bold].into_iter().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_link_implies_underline() {
        let marks: MarkSet = [Mark::Link(Link::new("https://example.com"))]
            .into_iter()
            .collect();
        assert!(!marks.underline);
        assert!(marks.is_underlined());
        assert!(!marks.is_empty());
    }

    #[test]
    fn test_with_mark_ignores_hard_break() {
        assert_eq!(Inline::HardBreak.with_mark(Mark::Bold), Inline::HardBreak);
        let bold = Inline::text("x").with_mark(Mark::Bold);
        assert!(matches!(bold, Inline::Text { marks, .. } if marks.bold));
    }
}
