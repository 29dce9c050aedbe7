//! Placeholder values supplied alongside a document.

use serde::{Deserialize, Serialize};

/// Value bound to a placeholder id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagValue {
    /// Placeholder id referenced by `Tag` inline nodes
    pub id: String,

    /// The value; `None` formats to an empty string
    #[serde(default)]
    pub value: Option<TagData>,
}

impl TagValue {
    /// Create a tag value.
    pub fn new(id: impl Into<String>, value: impl Into<TagData>) -> Self {
        Self {
            id: id.into(),
            value: Some(value.into()),
        }
    }

    /// Create a tag value without data.
    pub fn empty(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            value: None,
        }
    }
}

/// Typed tag data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagData {
    /// Plain string, rendered as is
    Text(String),
    /// Number, rendered with locale grouping and decimal mark
    Number(f64),
    /// List of strings, rendered as a locale conjunction
    List(Vec<String>),
}

impl From<&str> for TagData {
    fn from(value: &str) -> Self {
        TagData::Text(value.to_string())
    }
}

impl From<String> for TagData {
    fn from(value: String) -> Self {
        TagData::Text(value)
    }
}

impl From<f64> for TagData {
    fn from(value: f64) -> Self {
        TagData::Number(value)
    }
}

impl From<i64> for TagData {
    fn from(value: i64) -> Self {
        TagData::Number(value as f64)
    }
}

impl From<Vec<String>> for TagData {
    fn from(value: Vec<String>) -> Self {
        TagData::List(value)
    }
}

impl From<Vec<&str>> for TagData {
    fn from(value: Vec<&str>) -> Self {
        TagData::List(value.into_iter().map(str::to_string).collect())
    }
}

/// The tag values of one render call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tags {
    values: Vec<TagValue>,
}

impl Tags {
    /// Wrap a list of tag values.
    pub fn new(values: Vec<TagValue>) -> Self {
        Self { values }
    }

    /// Find the value for `id`. The first matching entry wins.
    pub fn get(&self, id: &str) -> Option<&TagValue> {
        self.values.iter().find(|tag| tag.id == id)
    }

    /// Number of entries, duplicates included.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over entries in input order.
    pub fn iter(&self) -> impl Iterator<Item = &TagValue> {
        self.values.iter()
    }
}

impl From<Vec<TagValue>> for Tags {
    fn from(values: Vec<TagValue>) -> Self {
        Self::new(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_match_wins() {
        let tags = Tags::new(vec![
            TagValue::new("name", "Alice"),
            TagValue::new("name", "Bob"),
        ]);
        assert_eq!(tags.get("name").unwrap().value, Some(TagData::from("Alice")));
        assert!(tags.get("missing").is_none());
    }

    #[test]
    fn test_tag_data_deserialize() {
        let value: TagValue = serde_json::from_str(r#"{"id":"n","value":12.5}"#).unwrap();
        assert_eq!(value.value, Some(TagData::Number(12.5)));

        let value: TagValue = serde_json::from_str(r#"{"id":"l","value":["a","b"]}"#).unwrap();
        assert_eq!(value.value, Some(TagData::from(vec!["a", "b"])));

        let value: TagValue = serde_json::from_str(r#"{"id":"e","value":null}"#).unwrap();
        assert_eq!(value.value, None);
    }
}
