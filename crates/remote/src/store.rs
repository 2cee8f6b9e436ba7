//! The remote data store boundary

use crate::query::Query;
use async_trait::async_trait;
use axiom_core::RemoteError;
use serde_json::Value;

/// Point reads, writes and stored procedures on the remote service
///
/// Authorization is enforced by the service itself (row-level security and
/// the procedures' own checks); implementations only report its answer as a
/// [`RemoteError`].
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Rows matching `query`
    async fn select(&self, query: &Query) -> Result<Vec<Value>, RemoteError>;

    /// Insert one row and return it as stored
    async fn insert(&self, table: &str, row: Value) -> Result<Value, RemoteError>;

    /// Apply `patch` to every row matching `query`; returns the updated rows
    async fn update(&self, query: &Query, patch: Value) -> Result<Vec<Value>, RemoteError>;

    /// Delete every row matching `query`; returns the number removed
    async fn delete(&self, query: &Query) -> Result<usize, RemoteError>;

    /// Call a stored procedure with named arguments
    async fn rpc(&self, name: &str, args: Value) -> Result<Value, RemoteError>;

    /// Exactly one row
    ///
    /// Zero rows is `NotFound`; more than one is a `Conflict`.
    async fn select_single(&self, query: &Query) -> Result<Value, RemoteError> {
        let mut rows = self.select(query).await?;
        match rows.len() {
            0 => Err(RemoteError::NotFound(format!(
                "no row in {} matches",
                query.table_name()
            ))),
            1 => Ok(rows.remove(0)),
            n => Err(RemoteError::Conflict(format!(
                "expected one row in {}, got {n}",
                query.table_name()
            ))),
        }
    }

    /// At most one row
    async fn select_maybe(&self, query: &Query) -> Result<Option<Value>, RemoteError> {
        match self.select_single(query).await {
            Ok(row) => Ok(Some(row)),
            Err(RemoteError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
