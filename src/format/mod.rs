//! Locale-aware formatting of tag values.
//!
//! Formatting is pure per `(locale, value)`. Per-locale formatters are built
//! once and kept in a process-wide cache keyed by the resolved built-in
//! locale, so the cache never outgrows the locale table.

mod locale;

pub use locale::{normalize as normalize_locale, LocaleData};

use crate::model::{TagData, TagValue};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Maximum number of fraction digits written for numbers.
const MAX_FRACTION_DIGITS: usize = 3;

/// Magnitude from which numbers are written without rounding; scaling them
/// for rounding could overflow.
const UNROUNDED_MAGNITUDE: f64 = 1e15;

static FORMATTERS: Lazy<Mutex<HashMap<&'static str, Arc<LocaleFormatter>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Format an optional tag value for `locale`.
///
/// Missing values and values without data format to the empty string.
///
/// # Example
///
/// ```
/// use impress::format::format_tag_value;
/// use impress::model::TagValue;
///
/// let value = TagValue::new("items", vec!["A", "B", "C"]);
/// assert_eq!(format_tag_value("en", Some(&value)), "A, B, and C");
/// assert_eq!(format_tag_value("en", None), "");
/// ```
pub fn format_tag_value(locale: &str, value: Option<&TagValue>) -> String {
    match value.and_then(|tag| tag.value.as_ref()) {
        Some(data) => formatter(locale).format(data),
        None => String::new(),
    }
}

/// Get the memoized formatter for a locale.
pub fn formatter(locale: &str) -> Arc<LocaleFormatter> {
    let data = locale::lookup(&locale::normalize(locale));
    let mut cache = match FORMATTERS.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    cache
        .entry(data.tag)
        .or_insert_with(|| Arc::new(LocaleFormatter::new(data)))
        .clone()
}

/// Formatter bound to one locale's conventions.
#[derive(Debug, Clone)]
pub struct LocaleFormatter {
    data: &'static LocaleData,
}

impl LocaleFormatter {
    fn new(data: &'static LocaleData) -> Self {
        Self { data }
    }

    /// Canonical tag of the resolved locale.
    pub fn tag(&self) -> &'static str {
        self.data.tag
    }

    /// Format typed tag data.
    pub fn format(&self, data: &TagData) -> String {
        match data {
            TagData::Text(text) => text.clone(),
            TagData::Number(number) => self.number(*number),
            TagData::List(items) => self.list(items),
        }
    }

    /// Join items as a conjunction, e.g. "A, B and C".
    pub fn list(&self, items: &[String]) -> String {
        match items {
            [] => String::new(),
            [only] => only.clone(),
            [first, second] => format!("{}{}{}", first, self.data.list_pair, second),
            [init @ .., last] => {
                let mut out = init.join(self.data.list_separator);
                out.push_str(self.data.list_last);
                out.push_str(last);
                out
            }
        }
    }

    /// Format a number with grouping and at most three fraction digits.
    pub fn number(&self, value: f64) -> String {
        if value.is_nan() {
            return "NaN".to_string();
        }
        if value.is_infinite() {
            return if value < 0.0 {
                format!("{}∞", self.data.minus)
            } else {
                "∞".to_string()
            };
        }

        let magnitude = value.abs();
        let rounded = if magnitude >= UNROUNDED_MAGNITUDE {
            magnitude
        } else {
            let scale = 10f64.powi(MAX_FRACTION_DIGITS as i32);
            // f64::round rounds half away from zero.
            (magnitude * scale).round() / scale
        };
        let fixed = format!("{:.*}", MAX_FRACTION_DIGITS, rounded);
        let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
        let frac_part = frac_part.trim_end_matches('0');

        let mut out = String::new();
        if value < 0.0 && rounded != 0.0 {
            out.push_str(self.data.minus);
        }
        out.push_str(&self.group_digits(int_part));
        if !frac_part.is_empty() {
            out.push_str(self.data.decimal);
            out.push_str(frac_part);
        }
        out
    }

    fn group_digits(&self, digits: &str) -> String {
        if digits.len() < 3 + self.data.min_grouping {
            return digits.to_string();
        }
        let mut out = String::with_capacity(digits.len() + digits.len() / 3 * 3);
        let lead = digits.len() % 3;
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (i + 3 - lead) % 3 == 0 {
                out.push_str(self.data.group);
            }
            out.push(ch);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_missing_value() {
        assert_eq!(format_tag_value("en", None), "");
        assert_eq!(format_tag_value("en", Some(&TagValue::empty("x"))), "");
    }

    #[test]
    fn test_string_as_is() {
        let value = TagValue::new("name", "  Alice ");
        assert_eq!(format_tag_value("fr", Some(&value)), "  Alice ");
    }

    #[test]
    fn test_lists() {
        let en = formatter("en");
        assert_eq!(en.list(&list(&[])), "");
        assert_eq!(en.list(&list(&["A"])), "A");
        assert_eq!(en.list(&list(&["A", "B"])), "A and B");
        assert_eq!(en.list(&list(&["A", "B", "C"])), "A, B, and C");
        assert_eq!(formatter("en-GB").list(&list(&["A", "B", "C"])), "A, B and C");
        assert_eq!(formatter("fr").list(&list(&["A", "B", "C"])), "A, B et C");
        assert_eq!(formatter("de_DE").list(&list(&["A", "B"])), "A und B");
    }

    #[test]
    fn test_numbers_en() {
        let en = formatter("en");
        assert_eq!(en.number(0.0), "0");
        assert_eq!(en.number(1234567.891), "1,234,567.891");
        assert_eq!(en.number(1.23456), "1.235");
        assert_eq!(en.number(2.5), "2.5");
        assert_eq!(en.number(10.0), "10");
        assert_eq!(en.number(-1234.5), "-1,234.5");
        assert_eq!(en.number(-0.0001), "0");
        assert_eq!(en.number(999.9999), "1,000");
        assert_eq!(en.number(f64::NAN), "NaN");
        assert_eq!(en.number(f64::INFINITY), "∞");
    }

    #[test]
    fn test_huge_numbers() {
        let en = formatter("en");
        assert_eq!(en.number(1e20), "100,000,000,000,000,000,000");
        assert_eq!(en.number(-1e20), "-100,000,000,000,000,000,000");
        assert_eq!(en.number(1e15 + 0.5), "1,000,000,000,000,000.5");

        let max = en.number(1e308);
        assert!(max.starts_with("100,000,000,000,000,00"));
        assert!(max.chars().all(|c| c.is_ascii_digit() || c == ','));
        assert_eq!(max.chars().filter(|c| c.is_ascii_digit()).count(), 309);
        assert_eq!(formatter("de").number(f64::MAX).chars().filter(|c| *c == '.').count(), 102);
    }

    #[test]
    fn test_numbers_other_locales() {
        assert_eq!(formatter("de").number(1234.5), "1.234,5");
        assert_eq!(formatter("fr").number(1234.5), "1\u{202f}234,5");
        assert_eq!(formatter("es").number(1234.0), "1234");
        assert_eq!(formatter("es").number(12345.0), "12.345");
        assert_eq!(formatter("xx-YY").number(1234.0), "1,234");
    }

    #[test]
    fn test_formatters_are_memoized() {
        let a = formatter("en-UK");
        let b = formatter("en_gb");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.tag(), "en-gb");
    }

    #[test]
    fn test_formatter_cache_is_bounded() {
        for i in 0..500 {
            assert_eq!(formatter(&format!("xx-{}", i)).tag(), "en");
        }
        assert!(Arc::ptr_eq(&formatter("xx-1"), &formatter("en-US")));
        let cached = FORMATTERS.lock().map(|cache| cache.len()).unwrap_or(usize::MAX);
        assert!(cached <= locale::len());
    }
}
