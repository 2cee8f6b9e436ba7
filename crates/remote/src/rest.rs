//! HTTP client for the hosted backend (PostgREST data API + GoTrue auth)

use crate::auth::{AuthProvider, TokenResponse};
use crate::error::{from_reqwest, from_status};
use crate::query::Query;
use crate::session::{Session, SessionHandle};
use crate::store::RemoteStore;
use async_trait::async_trait;
use axiom_core::RemoteError;
use reqwest::{Method, RequestBuilder};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

/// Connection settings for [`RestClient`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`
    pub url: String,
    /// Public (anon) API key
    pub anon_key: String,
    /// Transport timeout per request
    pub timeout: Duration,
}

/// Remote store and identity provider over HTTP
///
/// Requests carry the anon key plus the current session's access token, so
/// the service applies row-level security for the signed-in principal.
pub struct RestClient {
    base_url: String,
    anon_key: String,
    http: reqwest::Client,
    session: SessionHandle,
}

impl RestClient {
    pub fn new(config: RestConfig, session: SessionHandle) -> Result<Self, RemoteError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(from_reqwest)?;

        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key,
            http,
            session,
        })
    }

    fn rest_url(&self, path: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, path)
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let token = self
            .session
            .access_token()
            .unwrap_or_else(|| self.anon_key.clone());
        self.http
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
    }

    /// Send a request and decode the JSON answer (`Null` for an empty body)
    async fn send(&self, request: RequestBuilder) -> Result<Value, RemoteError> {
        let response = request.send().await.map_err(from_reqwest)?;
        let status = response.status();
        let body = response.text().await.map_err(from_reqwest)?;

        if !status.is_success() {
            let err = from_status(status, &body);
            debug!(%status, error = %err, "Request failed");
            return Err(err);
        }
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| RemoteError::Decode(e.to_string()))
    }

    async fn send_rows(&self, request: RequestBuilder) -> Result<Vec<Value>, RemoteError> {
        match self.send(request).await? {
            Value::Array(rows) => Ok(rows),
            Value::Null => Ok(Vec::new()),
            other => Ok(vec![other]),
        }
    }

    fn filter_params(query: &Query) -> Vec<(String, String)> {
        query
            .filters()
            .iter()
            .map(|(column, value)| (column.clone(), format!("eq.{value}")))
            .collect()
    }

    async fn grant(&self, url: String, email: &str, password: &str) -> Result<Session, RemoteError> {
        let request = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "password": password }));
        let body = self.send(request).await?;
        let response: TokenResponse =
            serde_json::from_value(body).map_err(|e| RemoteError::Decode(e.to_string()))?;
        response.into_session(email)
    }
}

#[async_trait]
impl RemoteStore for RestClient {
    async fn select(&self, query: &Query) -> Result<Vec<Value>, RemoteError> {
        debug!(table = query.table_name(), "select");
        let request = self
            .request(Method::GET, &self.rest_url(query.table_name()))
            .query(&query.to_params());
        self.send_rows(request).await
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value, RemoteError> {
        debug!(table, "insert");
        let request = self
            .request(Method::POST, &self.rest_url(table))
            .header("Prefer", "return=representation")
            .json(&json!([row]));
        self.send_rows(request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RemoteError::Decode(format!("insert into {table} returned no row")))
    }

    async fn update(&self, query: &Query, patch: Value) -> Result<Vec<Value>, RemoteError> {
        if query.filters().is_empty() {
            warn!(table = query.table_name(), "Refusing unfiltered update");
            return Err(RemoteError::service("update without a filter"));
        }
        debug!(table = query.table_name(), "update");
        let request = self
            .request(Method::PATCH, &self.rest_url(query.table_name()))
            .header("Prefer", "return=representation")
            .query(&Self::filter_params(query))
            .json(&patch);
        self.send_rows(request).await
    }

    async fn delete(&self, query: &Query) -> Result<usize, RemoteError> {
        if query.filters().is_empty() {
            warn!(table = query.table_name(), "Refusing unfiltered delete");
            return Err(RemoteError::service("delete without a filter"));
        }
        debug!(table = query.table_name(), "delete");
        let request = self
            .request(Method::DELETE, &self.rest_url(query.table_name()))
            .header("Prefer", "return=representation")
            .query(&Self::filter_params(query));
        Ok(self.send_rows(request).await?.len())
    }

    async fn rpc(&self, name: &str, args: Value) -> Result<Value, RemoteError> {
        debug!(procedure = name, "rpc");
        let request = self
            .request(Method::POST, &self.rest_url(&format!("rpc/{name}")))
            .json(&args);
        self.send(request).await
    }
}

#[async_trait]
impl AuthProvider for RestClient {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, RemoteError> {
        self.grant(self.auth_url("token?grant_type=password"), email, password)
            .await
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Session, RemoteError> {
        self.grant(self.auth_url("signup"), email, password).await
    }

    async fn sign_out(&self, session: &Session) -> Result<(), RemoteError> {
        let request = self
            .http
            .post(self.auth_url("logout"))
            .header("apikey", &self.anon_key)
            .bearer_auth(&session.access_token);
        self.send(request).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> RestClient {
        RestClient::new(
            RestConfig {
                url: "https://example.supabase.co/".into(),
                anon_key: "anon".into(),
                timeout: Duration::from_secs(5),
            },
            SessionHandle::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_urls() {
        let client = client();
        assert_eq!(
            client.rest_url("projects"),
            "https://example.supabase.co/rest/v1/projects"
        );
        assert_eq!(
            client.auth_url("signup"),
            "https://example.supabase.co/auth/v1/signup"
        );
    }

    #[test]
    fn test_filter_params_skip_select() {
        let query = Query::table("projects").select("id").eq("id", "p1");
        assert_eq!(
            RestClient::filter_params(&query),
            vec![("id".to_string(), "eq.p1".to_string())]
        );
    }

    #[tokio::test]
    async fn test_unfiltered_writes_are_refused() {
        let client = client();
        let err = client
            .update(&Query::table("projects"), json!({ "title": "x" }))
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::Service { .. }));
        assert!(client.delete(&Query::table("projects")).await.is_err());
    }
}
