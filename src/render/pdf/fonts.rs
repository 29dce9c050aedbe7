//! Standard Type1 Helvetica faces: metrics and WinAnsi encoding.

use crate::model::MarkSet;
use unicode_normalization::UnicodeNormalization;

/// Width of glyphs without an entry in the tables, in 1/1000 em.
const DEFAULT_WIDTH: u16 = 556;

/// Helvetica widths for WinAnsi codes 32..=126.
#[rustfmt::skip]
const REGULAR_ASCII: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

/// Helvetica-Bold widths for WinAnsi codes 32..=126.
#[rustfmt::skip]
const BOLD_ASCII: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

/// One of the four Helvetica faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Font {
    /// Helvetica
    Regular,
    /// Helvetica-Bold
    Bold,
    /// Helvetica-Oblique
    Oblique,
    /// Helvetica-BoldOblique
    BoldOblique,
}

impl Font {
    /// All faces, in resource order.
    pub const ALL: [Font; 4] = [Font::Regular, Font::Bold, Font::Oblique, Font::BoldOblique];

    /// Face for a bold/italic combination.
    pub fn select(bold: bool, italic: bool) -> Self {
        match (bold, italic) {
            (true, true) => Font::BoldOblique,
            (true, false) => Font::Bold,
            (false, true) => Font::Oblique,
            (false, false) => Font::Regular,
        }
    }

    /// Face for a mark set; `force_bold` is used by headings.
    pub fn for_marks(marks: &MarkSet, force_bold: bool) -> Self {
        Self::select(marks.bold || force_bold, marks.italic)
    }

    /// PostScript name of the standard font.
    pub fn base_font(self) -> &'static str {
        match self {
            Font::Regular => "Helvetica",
            Font::Bold => "Helvetica-Bold",
            Font::Oblique => "Helvetica-Oblique",
            Font::BoldOblique => "Helvetica-BoldOblique",
        }
    }

    /// Name of the font in page resources.
    pub fn resource_name(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
            Font::Oblique => "F3",
            Font::BoldOblique => "F4",
        }
    }

    fn is_bold(self) -> bool {
        matches!(self, Font::Bold | Font::BoldOblique)
    }

    /// Width of one WinAnsi code in 1/1000 em. Oblique faces share upright metrics.
    pub fn glyph_width(self, code: u8) -> u16 {
        let bold = self.is_bold();
        match code {
            32..=126 => {
                let table = if bold { &BOLD_ASCII } else { &REGULAR_ASCII };
                table[(code - 32) as usize]
            }
            0x91 | 0x92 => {
                if bold {
                    278
                } else {
                    222
                }
            }
            0x93 | 0x94 => {
                if bold {
                    500
                } else {
                    333
                }
            }
            0x85 | 0x89 | 0x97 => 1000,
            0x95 => 350,
            0xA0 => 278,
            _ => DEFAULT_WIDTH,
        }
    }

    /// Width of encoded text at `size` points.
    pub fn measure(self, encoded: &[u8], size: f32) -> f32 {
        let units: u32 = encoded.iter().map(|&b| self.glyph_width(b) as u32).sum();
        units as f32 * size / 1000.0
    }
}

/// Encode text for a WinAnsi Type1 font.
///
/// Text is NFC-normalized first so that decomposed accents map onto
/// Latin-1 letters. Characters outside the encoding become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.nfc().map(win_ansi_byte).collect()
}

fn win_ansi_byte(ch: char) -> u8 {
    match ch {
        '\t' => b' ',
        ' '..='~' => ch as u8,
        '\u{a0}'..='\u{ff}' => ch as u32 as u8,
        '\u{202f}' | '\u{2007}' | '\u{2009}' => 0xA0,
        '\u{2212}' => b'-',
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        'ˆ' => 0x88,
        '‰' => 0x89,
        'Š' => 0x8A,
        '‹' => 0x8B,
        'Œ' => 0x8C,
        'Ž' => 0x8E,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201c}' => 0x93,
        '\u{201d}' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '˜' => 0x98,
        '™' => 0x99,
        'š' => 0x9A,
        '›' => 0x9B,
        'œ' => 0x9C,
        'ž' => 0x9E,
        'Ÿ' => 0x9F,
        _ => b'?',
    }
}
