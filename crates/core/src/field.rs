//! Field values and editable records

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Ordered field name -> value mapping
///
/// Ordered so that flush payloads and log lines are deterministic.
pub type FieldMap = BTreeMap<String, FieldValue>;

/// Value of a single editable field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Boolean preference flag
    Flag(bool),
    /// Free text (titles, descriptions, URLs, choice values)
    Text(String),
}

impl FieldValue {
    /// Borrow as text, if this is a text value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Flag(_) => None,
        }
    }

    /// Convert to a JSON value for the wire
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Flag(b) => serde_json::Value::Bool(*b),
            Self::Text(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag(b) => write!(f, "{b}"),
            Self::Text(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// The editable subset of a remote entity
///
/// Owned by exactly one autosave session; the values always reflect the most
/// recent locally accepted edit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditableRecord {
    fields: FieldMap,
}

impl EditableRecord {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current value of a field
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Set a field, returning the previous value
    pub fn set(&mut self, field: impl Into<String>, value: FieldValue) -> Option<FieldValue> {
        self.fields.insert(field.into(), value)
    }

    /// Check whether the record carries a field
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Iterate over fields in name order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields.iter()
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when the record has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Borrow the underlying map
    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    /// Serialize as a flat JSON object
    pub fn to_json(&self) -> serde_json::Value {
        fields_to_json(&self.fields)
    }
}

impl From<FieldMap> for EditableRecord {
    fn from(fields: FieldMap) -> Self {
        Self { fields }
    }
}

impl FromIterator<(String, FieldValue)> for EditableRecord {
    fn from_iter<T: IntoIterator<Item = (String, FieldValue)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Serialize a field map as a flat JSON object
pub fn fields_to_json(fields: &FieldMap) -> serde_json::Value {
    serde_json::Value::Object(
        fields
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_returns_previous() {
        let mut record = EditableRecord::new();
        assert_eq!(record.set("title", "Foo".into()), None);
        assert_eq!(record.set("title", "Foobar".into()), Some("Foo".into()));
        assert_eq!(record.get("title"), Some(&FieldValue::Text("Foobar".into())));
    }

    #[test]
    fn test_json_shape() {
        let record: EditableRecord = [
            ("title".to_string(), FieldValue::from("Foo")),
            ("trd_prefers_user_pfp".to_string(), FieldValue::from(true)),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            record.to_json(),
            serde_json::json!({ "title": "Foo", "trd_prefers_user_pfp": true })
        );
    }

    #[test]
    fn test_untagged_deserialize() {
        let flag: FieldValue = serde_json::from_str("false").unwrap();
        let text: FieldValue = serde_json::from_str("\"private\"").unwrap();
        assert_eq!(flag, FieldValue::Flag(false));
        assert_eq!(text.as_text(), Some("private"));
    }
}
