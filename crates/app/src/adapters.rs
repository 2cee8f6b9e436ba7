//! Persistence adapters between autosave coordinators and the remote store

use async_trait::async_trait;
use autosave::PersistenceAdapter;
use axiom_core::field::fields_to_json;
use axiom_core::{FieldMap, FieldSchema, RecordId, RemoteError};
use cache::{keys, LocalCache};
use remote::{Query, RemoteStore};
use std::sync::Arc;
use tracing::{debug, warn};

/// Writes a record's fields with an update-by-id on the schema's table
pub struct TableAdapter {
    store: Arc<dyn RemoteStore>,
    schema: FieldSchema,
    key_column: &'static str,
}

impl TableAdapter {
    pub fn new(store: Arc<dyn RemoteStore>, schema: FieldSchema) -> Self {
        Self {
            store,
            schema,
            key_column: "id",
        }
    }
}

#[async_trait]
impl PersistenceAdapter for TableAdapter {
    async fn flush(&self, record: &RecordId, fields: &FieldMap) -> Result<(), RemoteError> {
        // Never let a column outside the allow-list reach the store
        let allowed = self.schema.filter(fields);
        if allowed.is_empty() {
            return Ok(());
        }

        let table = self.schema.table();
        let query = Query::table(table).eq(self.key_column, record);
        let updated = self.store.update(&query, fields_to_json(&allowed)).await?;

        // Row-level security hides rows instead of refusing the update
        if updated.is_empty() {
            return Err(RemoteError::NotFound(format!(
                "{table} row {record} not found or not writable"
            )));
        }
        debug!(table, record = %record, fields = allowed.len(), "Row updated");
        Ok(())
    }
}

/// Settings writes also drop the cached settings row
pub struct SettingsAdapter {
    inner: TableAdapter,
    cache: Arc<LocalCache>,
}

impl SettingsAdapter {
    pub fn new(store: Arc<dyn RemoteStore>, cache: Arc<LocalCache>) -> Self {
        Self {
            inner: TableAdapter::new(store, FieldSchema::user_settings()),
            cache,
        }
    }
}

#[async_trait]
impl PersistenceAdapter for SettingsAdapter {
    async fn flush(&self, record: &RecordId, fields: &FieldMap) -> Result<(), RemoteError> {
        self.inner.flush(record, fields).await?;
        if let Err(e) = self.cache.invalidate(keys::USER_SETTINGS) {
            warn!(error = %e, "Failed to invalidate cached settings");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use remote::{MemoryStore, SessionHandle};
    use serde_json::json;

    #[tokio::test]
    async fn test_table_adapter_filters_and_reports_missing_rows() {
        let session = SessionHandle::new();
        let store = Arc::new(MemoryStore::new(session.clone()));
        let me = remote::AuthProvider::sign_up(store.as_ref(), "a@example.com", "pw")
            .await
            .unwrap();
        session.set(me.clone());
        store.seed("projects", json!({ "id": "p1", "user_id": me.user_id.to_string(), "title": "Old" }));

        let adapter = TableAdapter::new(store.clone(), FieldSchema::project());
        let mut fields = FieldMap::new();
        fields.insert("title".into(), "New".into());
        fields.insert("user_id".into(), "someone-else".into());

        adapter.flush(&RecordId::new("p1"), &fields).await.unwrap();
        let row = &store.rows("projects")[0];
        assert_eq!(row["title"], "New");
        assert_eq!(row["user_id"], me.user_id.to_string());

        let err = adapter
            .flush(&RecordId::new("missing"), &fields)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
