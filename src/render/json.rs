//! JSON rendering of the normalized document tree.

use crate::error::Result;
use crate::model::Document;
use crate::schema::to_value;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Convert a document to its normalized JSON form.
///
/// The output is accepted by [`crate::schema::validate`] and describes the
/// same document.
pub fn to_json(doc: &Document, format: JsonFormat) -> Result<String> {
    let value = to_value(doc);
    let json = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(&value)?,
        JsonFormat::Compact => serde_json::to_string(&value)?,
    };
    Ok(json)
}
