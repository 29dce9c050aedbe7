//! Built-in locale data for numbers and conjunctions.

/// Number and list conventions of one locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocaleData {
    /// Canonical tag
    pub tag: &'static str,
    /// Thousands separator
    pub group: &'static str,
    /// Decimal mark
    pub decimal: &'static str,
    /// Minus sign
    pub minus: &'static str,
    /// Minimum number of integer digits before grouping applies, minus three
    pub min_grouping: usize,
    /// Separator between list items except the last pair
    pub list_separator: &'static str,
    /// Separator between the last two items of a list of three or more
    pub list_last: &'static str,
    /// Separator of a two-item list
    pub list_pair: &'static str,
}

const NBSP: &str = "\u{a0}";
const NNBSP: &str = "\u{202f}";

static LOCALES: &[LocaleData] = &[
    LocaleData {
        tag: "en",
        group: ",",
        decimal: ".",
        minus: "-",
        min_grouping: 1,
        list_separator: ", ",
        list_last: ", and ",
        list_pair: " and ",
    },
    LocaleData {
        tag: "en-gb",
        group: ",",
        decimal: ".",
        minus: "-",
        min_grouping: 1,
        list_separator: ", ",
        list_last: " and ",
        list_pair: " and ",
    },
    LocaleData {
        tag: "fr",
        group: NNBSP,
        decimal: ",",
        minus: "-",
        min_grouping: 1,
        list_separator: ", ",
        list_last: " et ",
        list_pair: " et ",
    },
    LocaleData {
        tag: "de",
        group: ".",
        decimal: ",",
        minus: "-",
        min_grouping: 1,
        list_separator: ", ",
        list_last: " und ",
        list_pair: " und ",
    },
    LocaleData {
        tag: "es",
        group: ".",
        decimal: ",",
        minus: "-",
        min_grouping: 2,
        list_separator: ", ",
        list_last: " y ",
        list_pair: " y ",
    },
    LocaleData {
        tag: "it",
        group: ".",
        decimal: ",",
        minus: "-",
        min_grouping: 1,
        list_separator: ", ",
        list_last: " e ",
        list_pair: " e ",
    },
    LocaleData {
        tag: "pt",
        group: ".",
        decimal: ",",
        minus: "-",
        min_grouping: 1,
        list_separator: ", ",
        list_last: " e ",
        list_pair: " e ",
    },
    LocaleData {
        tag: "nl",
        group: ".",
        decimal: ",",
        minus: "-",
        min_grouping: 1,
        list_separator: ", ",
        list_last: " en ",
        list_pair: " en ",
    },
    LocaleData {
        tag: "sv",
        group: NBSP,
        decimal: ",",
        minus: "\u{2212}",
        min_grouping: 1,
        list_separator: ", ",
        list_last: " och ",
        list_pair: " och ",
    },
    LocaleData {
        tag: "da",
        group: ".",
        decimal: ",",
        minus: "-",
        min_grouping: 1,
        list_separator: ", ",
        list_last: " og ",
        list_pair: " og ",
    },
    LocaleData {
        tag: "nb",
        group: NBSP,
        decimal: ",",
        minus: "\u{2212}",
        min_grouping: 1,
        list_separator: ", ",
        list_last: " og ",
        list_pair: " og ",
    },
    LocaleData {
        tag: "pl",
        group: NBSP,
        decimal: ",",
        minus: "-",
        min_grouping: 2,
        list_separator: ", ",
        list_last: " i ",
        list_pair: " i ",
    },
    LocaleData {
        tag: "ru",
        group: NBSP,
        decimal: ",",
        minus: "-",
        min_grouping: 1,
        list_separator: ", ",
        list_last: " и ",
        list_pair: " и ",
    },
    LocaleData {
        tag: "ja",
        group: ",",
        decimal: ".",
        minus: "-",
        min_grouping: 1,
        list_separator: "、",
        list_last: "、",
        list_pair: "、",
    },
    LocaleData {
        tag: "zh",
        group: ",",
        decimal: ".",
        minus: "-",
        min_grouping: 1,
        list_separator: "、",
        list_last: "和",
        list_pair: "和",
    },
];

/// Normalize a locale tag: trim, lowercase, `_` to `-`, legacy aliases.
pub fn normalize(tag: &str) -> String {
    let tag = tag.trim().to_ascii_lowercase().replace('_', "-");
    match tag.as_str() {
        "en-uk" => "en-gb".to_string(),
        "no" => "nb".to_string(),
        _ => match tag.strip_prefix("no-") {
            Some(rest) => format!("nb-{}", rest),
            None => tag,
        },
    }
}

/// Resolve a normalized tag: full tag, then language subtag, then `en`.
pub fn lookup(normalized: &str) -> &'static LocaleData {
    let language = normalized.split('-').next().unwrap_or(normalized);
    LOCALES
        .iter()
        .find(|data| data.tag == normalized)
        .or_else(|| LOCALES.iter().find(|data| data.tag == language))
        .unwrap_or(&LOCALES[0])
}

/// Number of built-in locales.
#[cfg(test)]
pub(super) fn len() -> usize {
    LOCALES.len()
}
