//! Field schemas: which fields of a remote row may be edited, and how

use crate::field::{EditableRecord, FieldMap, FieldValue};
use crate::model::Visibility;
use std::collections::BTreeMap;
use thiserror::Error;

/// Kind of value a field accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text
    Text,
    /// Boolean flag
    Flag,
    /// Text restricted to a fixed set of values
    Choice(&'static [&'static str]),
}

/// Why an edit does not fit the schema
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaViolation {
    #[error("unknown field '{0}'")]
    UnknownField(String),

    #[error("field '{field}' expects a {expected} value")]
    KindMismatch {
        field: String,
        expected: &'static str,
    },

    #[error("'{value}' is not an allowed value for '{field}'")]
    InvalidChoice { field: String, value: String },
}

/// Allow-list of editable fields for one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
    table: String,
    fields: BTreeMap<String, FieldKind>,
}

impl FieldSchema {
    /// Start an empty schema for `table`
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Add a text field
    pub fn text(mut self, name: &str) -> Self {
        self.fields.insert(name.to_string(), FieldKind::Text);
        self
    }

    /// Add a boolean field
    pub fn flag(mut self, name: &str) -> Self {
        self.fields.insert(name.to_string(), FieldKind::Flag);
        self
    }

    /// Add a choice field
    pub fn choice(mut self, name: &str, allowed: &'static [&'static str]) -> Self {
        self.fields.insert(name.to_string(), FieldKind::Choice(allowed));
        self
    }

    /// Editable subset of the `projects` table
    pub fn project() -> Self {
        Self::new("projects")
            .text("title")
            .text("description")
            .text("project_cover")
            .choice("visibility", Visibility::ALL)
    }

    /// Editable subset of the `user_settings` table
    pub fn user_settings() -> Self {
        Self::new("user_settings")
            .flag("trd_prefers_notification_ping")
            .flag("trd_prefers_notification_badge")
            .flag("trd_prefers_name_display")
            .flag("trd_prefers_show_email")
            .flag("trd_prefers_user_pfp")
    }

    /// Table the schema belongs to
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Kind of a field, if it is part of the schema
    pub fn kind(&self, field: &str) -> Option<FieldKind> {
        self.fields.get(field).copied()
    }

    /// Field names in order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Comma-separated column list for a select
    pub fn columns(&self) -> String {
        self.field_names().collect::<Vec<_>>().join(",")
    }

    /// Check a single edit against the schema
    pub fn check(&self, field: &str, value: &FieldValue) -> Result<(), SchemaViolation> {
        let kind = self
            .kind(field)
            .ok_or_else(|| SchemaViolation::UnknownField(field.to_string()))?;

        match (kind, value) {
            (FieldKind::Text, FieldValue::Text(_)) => Ok(()),
            (FieldKind::Flag, FieldValue::Flag(_)) => Ok(()),
            (FieldKind::Choice(allowed), FieldValue::Text(v)) => {
                if allowed.contains(&v.as_str()) {
                    Ok(())
                } else {
                    Err(SchemaViolation::InvalidChoice {
                        field: field.to_string(),
                        value: v.clone(),
                    })
                }
            }
            (FieldKind::Flag, _) => Err(SchemaViolation::KindMismatch {
                field: field.to_string(),
                expected: "boolean",
            }),
            (_, _) => Err(SchemaViolation::KindMismatch {
                field: field.to_string(),
                expected: "text",
            }),
        }
    }

    /// Keep only fields that are part of the schema and carry a valid value
    pub fn filter(&self, fields: &FieldMap) -> FieldMap {
        fields
            .iter()
            .filter(|(name, value)| self.check(name, value).is_ok())
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    /// Build an editable record from a JSON row
    ///
    /// Null or missing text columns become empty strings and missing flags
    /// become `false`, so every schema field is present in the record.
    pub fn record_from_row(&self, row: &serde_json::Value) -> EditableRecord {
        self.fields
            .iter()
            .map(|(name, kind)| {
                let raw = row.get(name);
                let value = match kind {
                    FieldKind::Flag => {
                        FieldValue::Flag(raw.and_then(|v| v.as_bool()).unwrap_or(false))
                    }
                    FieldKind::Text | FieldKind::Choice(_) => FieldValue::Text(
                        raw.and_then(|v| v.as_str()).unwrap_or_default().to_string(),
                    ),
                };
                (name.clone(), value)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_project_fields() {
        let schema = FieldSchema::project();
        assert!(schema.check("title", &"Foo".into()).is_ok());
        assert!(schema.check("visibility", &"public".into()).is_ok());
        assert_eq!(
            schema.check("role", &"viewer".into()),
            Err(SchemaViolation::UnknownField("role".into()))
        );
        assert!(matches!(
            schema.check("visibility", &"secret".into()),
            Err(SchemaViolation::InvalidChoice { .. })
        ));
        assert!(matches!(
            schema.check("title", &true.into()),
            Err(SchemaViolation::KindMismatch { expected: "text", .. })
        ));
    }

    #[test]
    fn test_filter_drops_unknown_keys() {
        let schema = FieldSchema::project();
        let mut fields = FieldMap::new();
        fields.insert("title".into(), "Foo".into());
        fields.insert("role".into(), "viewer".into());

        let filtered = schema.filter(&fields);
        assert_eq!(filtered.len(), 1);
        assert!(filtered.contains_key("title"));
    }

    #[test]
    fn test_record_from_row_fills_nulls() {
        let schema = FieldSchema::project();
        let row = serde_json::json!({
            "title": "Atlas",
            "description": null,
            "visibility": "private"
        });
        let record = schema.record_from_row(&row);
        assert_eq!(record.len(), 4);
        assert_eq!(record.get("description"), Some(&FieldValue::Text(String::new())));
        assert_eq!(record.get("project_cover"), Some(&FieldValue::Text(String::new())));
    }

    #[test]
    fn test_columns() {
        assert_eq!(
            FieldSchema::project().columns(),
            "description,project_cover,title,visibility"
        );
    }
}
