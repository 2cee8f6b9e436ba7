//! Boundary between the coordinator and the remote data store

use async_trait::async_trait;
use axiom_core::{FieldMap, RecordId, RemoteError};

/// Writes a batch of changed fields to the remote store
///
/// The coordinator guarantees that `fields` is non-empty, contains only
/// schema fields whose value differs from the last persisted one, and that
/// no two calls for the same record overlap.
#[async_trait]
pub trait PersistenceAdapter: Send + Sync {
    /// Persist `fields` on the row identified by `record`
    async fn flush(&self, record: &RecordId, fields: &FieldMap) -> Result<(), RemoteError>;
}
