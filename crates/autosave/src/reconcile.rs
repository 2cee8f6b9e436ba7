//! Reconciliation with a fresh server snapshot
//!
//! Used when the remote row may have drifted from what this session last
//! saw (another collaborator saved, a write was refused, the page reloaded
//! its data). The server becomes the persisted baseline; local values are
//! replaced only for fields without an unsaved local edit.

use crate::coalesce::Coalescer;
use axiom_core::EditableRecord;
use tracing::debug;

/// Merge `server` into `record`
///
/// `is_dirty` reports fields whose local edit has not been persisted yet
/// (timer armed, queued, in flight or failed). Returns the fields whose
/// local value changed.
pub fn reconcile(
    record: &mut EditableRecord,
    coalescer: &mut Coalescer,
    server: &EditableRecord,
    is_dirty: impl Fn(&str) -> bool,
) -> Vec<String> {
    let mut changed = Vec::new();

    for (field, server_value) in server.iter() {
        if !record.contains(field) {
            continue;
        }
        coalescer
            .persisted_mut()
            .insert(field.clone(), server_value.clone());

        if is_dirty(field) {
            if record.get(field) == Some(server_value) {
                coalescer.forget_failure(field);
            }
            continue;
        }

        if record.get(field) != Some(server_value) {
            debug!(field = %field, value = %server_value, "Adopting server value");
            record.set(field.clone(), server_value.clone());
            changed.push(field.clone());
        }
    }

    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use axiom_core::{FieldSchema, FieldValue};

    #[test]
    fn test_clean_fields_adopt_server_values() {
        let schema = FieldSchema::project();
        let mut record =
            schema.record_from_row(&serde_json::json!({ "title": "Foo", "description": "a" }));
        let mut coalescer = Coalescer::new(&record);

        // Local unsaved edit on the title
        record.set("title", "Foobar".into());

        let server =
            schema.record_from_row(&serde_json::json!({ "title": "Other", "description": "b" }));
        let changed = reconcile(&mut record, &mut coalescer, &server, |f| f == "title");

        assert_eq!(changed, vec!["description"]);
        assert_eq!(record.get("title"), Some(&FieldValue::from("Foobar")));
        assert_eq!(record.get("description"), Some(&FieldValue::from("b")));
        assert_eq!(
            coalescer.persisted().get("title"),
            Some(&FieldValue::from("Other"))
        );
    }
}
