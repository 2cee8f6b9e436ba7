//! Error taxonomy shared by every crate that talks to the remote store

use thiserror::Error;

/// Failure reported by the remote data store or identity provider
///
/// Every remote call is converted into one of these at the adapter boundary,
/// so callers can branch on the kind instead of parsing messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// Transport failure (connection refused, DNS, reset)
    #[error("network error: {0}")]
    Network(String),

    /// The request did not complete within the transport timeout
    #[error("request timed out")]
    Timeout,

    /// No valid session was presented
    #[error("not authenticated")]
    Unauthenticated,

    /// Row-level security or a stored procedure refused the operation
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The referenced row does not exist (or is not visible to the caller)
    #[error("not found: {0}")]
    NotFound(String),

    /// A uniqueness or state constraint rejected the write
    #[error("conflict: {0}")]
    Conflict(String),

    /// Any other service-side failure
    #[error("service error{}: {message}", code.as_ref().map(|c| format!(" ({c})")).unwrap_or_default())]
    Service {
        /// Backend error code (PostgREST / Postgres SQLSTATE) when known
        code: Option<String>,
        /// Human-readable message from the service
        message: String,
    },

    /// The response could not be decoded into the expected shape
    #[error("malformed response: {0}")]
    Decode(String),
}

impl RemoteError {
    /// Build a service error without a code
    pub fn service(message: impl Into<String>) -> Self {
        Self::Service {
            code: None,
            message: message.into(),
        }
    }

    /// True when the caller should offer "request access" instead of a retry
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied(_))
    }

    /// True when the referenced entity has vanished
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// True for failures that may succeed if the same request is sent again
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout)
    }
}

/// Local input validation failure
///
/// These are reported inline where the user typed the value and never reach
/// the autosave coordinator or the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field was empty after trimming
    #[error("{0} cannot be empty")]
    Empty(&'static str),

    /// The role is not one of the assignable roles
    #[error("unknown role '{0}' (expected collaborator or viewer)")]
    UnknownRole(String),

    /// The value is not one of the allowed choices for the field
    #[error("'{value}' is not a valid {field}")]
    InvalidChoice {
        /// Field being validated
        field: &'static str,
        /// Rejected value
        value: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(RemoteError::PermissionDenied("rls".into()).is_permission_denied());
        assert!(RemoteError::NotFound("gone".into()).is_not_found());
        assert!(RemoteError::Timeout.is_transient());
        assert!(RemoteError::Network("reset".into()).is_transient());
        assert!(!RemoteError::Unauthenticated.is_transient());
    }

    #[test]
    fn test_service_display_includes_code() {
        let err = RemoteError::Service {
            code: Some("PGRST301".into()),
            message: "boom".into(),
        };
        assert_eq!(err.to_string(), "service error (PGRST301): boom");
        assert_eq!(RemoteError::service("boom").to_string(), "service error: boom");
    }
}
