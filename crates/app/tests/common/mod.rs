//! Common utilities for app integration tests

use app::auth::SignupForm;
use app::{App, AppOptions};
use axiom_core::{ProjectId, UserId};
use cache::LocalCache;
use remote::{MemoryStore, Session, SessionHandle};
use serde_json::json;
use std::sync::Arc;

/// An app wired to an in-memory backend and a throwaway cache
pub struct TestApp {
    pub app: App,
    pub store: Arc<MemoryStore>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_options(AppOptions::default())
    }

    pub fn with_options(options: AppOptions) -> Self {
        let session = SessionHandle::new();
        let store = Arc::new(MemoryStore::new(session.clone()));
        let cache = LocalCache::temporary().expect("temporary cache");
        let app = App::new(store.clone(), store.clone(), session, cache, options);
        Self { app, store }
    }

    /// Register `username` through the signup flow; the new user stays logged in
    pub async fn signup(&self, username: &str) -> Session {
        let form = SignupForm {
            email: format!("{username}@example.com"),
            password: "correct horse".to_string(),
            username: username.to_string(),
            role: "designer".to_string(),
        };
        self.app.auth().signup(&form).await.expect("signup")
    }

    /// Switch the current principal
    pub fn act_as(&self, session: &Session) {
        self.app.session().set(session.clone());
    }

    /// Seed a project owned by `owner`
    pub fn seed_project(&self, owner: UserId, title: &str) -> ProjectId {
        let id = ProjectId::new_v4();
        self.store.seed(
            "projects",
            json!({
                "id": id.to_string(),
                "user_id": owner.to_string(),
                "title": title,
                "description": "",
                "visibility": "private",
            }),
        );
        id
    }
}
