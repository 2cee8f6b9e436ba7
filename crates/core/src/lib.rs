//! Core domain types for Axiom
//!
//! This crate provides:
//! - Typed identifiers for users, projects and editable records
//! - Field values and the `EditableRecord` owned by an autosave session
//! - Field schemas (the allow-lists used to filter writes)
//! - Entity rows shared with the remote store
//! - The remote error taxonomy and local input validation

pub mod error;
pub mod field;
pub mod ids;
pub mod model;
pub mod schema;
pub mod validate;

// Re-exports
pub use error::{RemoteError, ValidationError};
pub use field::{EditableRecord, FieldMap, FieldValue};
pub use ids::{ProjectId, RecordId, UserId};
pub use model::{
    Contributor, ContributorProfile, Project, Relation, Role, UserProfile, UserSettings,
    Visibility,
};
pub use schema::{FieldKind, FieldSchema, SchemaViolation};
