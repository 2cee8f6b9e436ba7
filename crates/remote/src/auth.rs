//! Identity provider boundary

use crate::session::Session;
use async_trait::async_trait;
use axiom_core::{RemoteError, UserId};
use chrono::{Duration, Utc};
use serde::Deserialize;

/// Email/password authentication against the hosted identity service
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, RemoteError>;

    /// Register a new principal and sign it in
    async fn sign_up(&self, email: &str, password: &str) -> Result<Session, RemoteError>;

    /// Revoke the session on the service side
    async fn sign_out(&self, session: &Session) -> Result<(), RemoteError>;
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: UserId,
    #[serde(default)]
    email: Option<String>,
}

/// Token grant as returned by GoTrue
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    user: Option<AuthUser>,
}

impl TokenResponse {
    /// Build a session; `email` is used when the response omits it
    pub(crate) fn into_session(self, email: &str) -> Result<Session, RemoteError> {
        let access_token = self.access_token.ok_or_else(|| RemoteError::Service {
            code: Some("email_not_confirmed".to_string()),
            message: "No session was issued. Confirm the email address, then log in.".to_string(),
        })?;
        let user = self
            .user
            .ok_or_else(|| RemoteError::Decode("token response without user".to_string()))?;

        Ok(Session {
            access_token,
            refresh_token: self.refresh_token,
            user_id: user.id,
            email: user.email.unwrap_or_else(|| email.to_string()),
            expires_at: self.expires_in.map(|secs| Utc::now() + Duration::seconds(secs)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_response_into_session() {
        let body = serde_json::json!({
            "access_token": "jwt",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "r",
            "user": { "id": "0e9f1c5a-8c0e-4a43-9f43-3f9b8a1b2c3d", "email": "ada@example.com" }
        });
        let response: TokenResponse = serde_json::from_value(body).unwrap();
        let session = response.into_session("ignored@example.com").unwrap();
        assert_eq!(session.access_token, "jwt");
        assert_eq!(session.email, "ada@example.com");
        assert!(session.expires_at.is_some());
    }

    #[test]
    fn test_unconfirmed_signup_has_no_session() {
        let response: TokenResponse = serde_json::from_value(serde_json::json!({
            "user": { "id": "0e9f1c5a-8c0e-4a43-9f43-3f9b8a1b2c3d" }
        }))
        .unwrap();
        assert!(matches!(
            response.into_session("ada@example.com"),
            Err(RemoteError::Service { .. })
        ));
    }
}
