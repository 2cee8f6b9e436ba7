//! Mapping of transport and service failures onto [`RemoteError`]

use axiom_core::RemoteError;
use reqwest::StatusCode;
use serde::Deserialize;

/// PostgREST: `.single()` matched zero (or several) rows
pub const NO_ROWS: &str = "PGRST116";
/// PostgREST: JWT expired or invalid
pub const JWT_INVALID: &str = "PGRST301";
/// Postgres: insufficient privilege (row-level security, procedure checks)
pub const INSUFFICIENT_PRIVILEGE: &str = "42501";
/// Postgres: unique violation
pub const UNIQUE_VIOLATION: &str = "23505";
/// Postgres: foreign key violation
pub const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Error body returned by PostgREST and GoTrue
///
/// The two services use different field names, so everything is optional.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: Option<serde_json::Value>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
}

impl ErrorBody {
    fn code(&self) -> Option<String> {
        match &self.code {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(serde_json::Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }

    fn message(&self, status: StatusCode) -> String {
        self.message
            .clone()
            .or_else(|| self.msg.clone())
            .or_else(|| self.error_description.clone())
            .or_else(|| self.details.clone())
            .unwrap_or_else(|| status.to_string())
    }
}

/// Classify an unsuccessful HTTP answer
pub fn from_status(status: StatusCode, body: &str) -> RemoteError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let code = parsed.code();
    let message = parsed.message(status);

    match code.as_deref() {
        Some(NO_ROWS) => return RemoteError::NotFound(message),
        Some(JWT_INVALID) => return RemoteError::Unauthenticated,
        Some(INSUFFICIENT_PRIVILEGE) => return RemoteError::PermissionDenied(message),
        Some(UNIQUE_VIOLATION) => return RemoteError::Conflict(message),
        // The referenced row vanished
        Some(FOREIGN_KEY_VIOLATION) => return RemoteError::NotFound(message),
        _ => {}
    }

    match status {
        StatusCode::UNAUTHORIZED => RemoteError::Unauthenticated,
        StatusCode::FORBIDDEN => RemoteError::PermissionDenied(message),
        StatusCode::NOT_FOUND | StatusCode::NOT_ACCEPTABLE => RemoteError::NotFound(message),
        StatusCode::CONFLICT => RemoteError::Conflict(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => RemoteError::Timeout,
        _ => RemoteError::Service { code, message },
    }
}

/// Classify a transport failure
pub fn from_reqwest(err: reqwest::Error) -> RemoteError {
    if err.is_timeout() {
        RemoteError::Timeout
    } else if err.is_decode() {
        RemoteError::Decode(err.to_string())
    } else if let Some(status) = err.status() {
        from_status(status, "")
    } else {
        RemoteError::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postgrest_codes() {
        let body = r#"{"code":"PGRST116","message":"JSON object requested, multiple (or no) rows returned"}"#;
        assert!(from_status(StatusCode::NOT_ACCEPTABLE, body).is_not_found());

        let body = r#"{"code":"42501","message":"new row violates row-level security policy"}"#;
        assert_eq!(
            from_status(StatusCode::FORBIDDEN, body),
            RemoteError::PermissionDenied("new row violates row-level security policy".into())
        );

        let body = r#"{"code":"23505","message":"duplicate key value"}"#;
        assert!(matches!(
            from_status(StatusCode::CONFLICT, body),
            RemoteError::Conflict(_)
        ));
    }

    #[test]
    fn test_status_fallbacks() {
        assert_eq!(
            from_status(StatusCode::UNAUTHORIZED, "not json"),
            RemoteError::Unauthenticated
        );
        assert_eq!(
            from_status(StatusCode::INTERNAL_SERVER_ERROR, r#"{"code":"P0001","message":"boom"}"#),
            RemoteError::Service {
                code: Some("P0001".into()),
                message: "boom".into()
            }
        );
    }

    #[test]
    fn test_gotrue_body() {
        let body = r#"{"code":400,"msg":"Invalid login credentials"}"#;
        assert_eq!(
            from_status(StatusCode::BAD_REQUEST, body),
            RemoteError::Service {
                code: Some("400".into()),
                message: "Invalid login credentials".into()
            }
        );
    }
}
