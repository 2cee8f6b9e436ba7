//! Login, signup and logout flows

mod common;

use app::auth::SignupForm;
use app::{AppError, AppOptions};
use axiom_core::RemoteError;
use cache::keys;
use common::TestApp;
use remote::{RetryPolicy, Session};
use serde_json::json;
use std::time::Duration;

fn form(username: &str) -> SignupForm {
    SignupForm {
        email: format!("{username}@example.com"),
        password: "correct horse".into(),
        username: username.into(),
        role: "student".into(),
    }
}

#[tokio::test]
async fn test_signup_fills_in_the_profile() {
    let t = TestApp::new();
    let session = t.app.auth().signup(&form("@ada")).await.unwrap();

    assert_eq!(t.app.current_user(), Some(session.user_id));
    let profiles = t.store.rows("user_profiles");
    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles[0]["id"], session.user_id.to_string());
    assert_eq!(profiles[0]["username"], "ada");
    assert_eq!(profiles[0]["role"], "student");
}

#[tokio::test(start_paused = true)]
async fn test_signup_waits_for_the_profile_row() {
    let t = TestApp::new();
    t.store.set_auto_profiles(false);

    // The backend trigger lands a little later
    let store = t.store.clone();
    let session = t.app.session().clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(600)).await;
        let user = session.get().expect("signed up").user_id;
        store.seed("user_profiles", json!({ "id": user.to_string() }));
    });

    let session = t.app.auth().signup(&form("ada")).await.unwrap();
    assert!(t.store.count("select user_profiles") >= 2);
    assert_eq!(t.store.rows("user_profiles")[0]["id"], session.user_id.to_string());
    assert_eq!(t.store.rows("user_profiles")[0]["username"], "ada");
}

#[tokio::test(start_paused = true)]
async fn test_signup_gives_up_when_the_profile_never_appears() {
    let t = TestApp::with_options(AppOptions {
        signup_retry: RetryPolicy {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(10),
            max_backoff: Duration::from_millis(40),
        },
        ..AppOptions::default()
    });
    t.store.set_auto_profiles(false);

    let err = t.app.auth().signup(&form("ada")).await.unwrap_err();
    assert!(matches!(err, AppError::ProfileNotReady { attempts: 3 }));
    assert_eq!(err.to_string(), "User profile creation failed or took too long.");
    assert_eq!(t.store.count("select user_profiles"), 3);
}

#[tokio::test]
async fn test_signup_validation_and_disabled_signup() {
    let t = TestApp::new();
    let mut incomplete = form("ada");
    incomplete.role = " ".into();
    let err = t.app.auth().signup(&incomplete).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    t.store.seed(
        "axiomSiteSettings",
        json!({ "error_messages": { "freeze": { "disabled_features": ["signup"] } } }),
    );
    let err = t.app.auth().signup(&form("ada")).await.unwrap_err();
    assert!(matches!(err, AppError::FeatureDisabled("Signup")));
    assert_eq!(t.store.count("auth sign_up"), 0);
}

#[tokio::test]
async fn test_login_installs_and_caches_the_session() {
    let t = TestApp::new();
    let created = t.signup("ada").await;
    t.app.auth().logout().await.unwrap();
    assert_eq!(t.app.current_user(), None);

    let err = t
        .app
        .auth()
        .login("ada@example.com", "wrong")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Remote(RemoteError::Service { .. })));

    let session = t
        .app
        .auth()
        .login("ada@example.com", "correct horse")
        .await
        .unwrap();
    assert_eq!(session.user_id, created.user_id);
    assert_eq!(t.app.current_user(), Some(created.user_id));
    let cached: Session = t.app.cache().get(keys::SESSION).unwrap().unwrap();
    assert_eq!(cached.user_id, created.user_id);

    // A restart restores it
    t.app.session().clear();
    let restored = t.app.restore_session().unwrap().unwrap();
    assert_eq!(restored.user_id, created.user_id);
    assert_eq!(t.app.current_user(), Some(created.user_id));
}

#[tokio::test]
async fn test_logout_clears_local_state_even_when_the_service_fails() {
    let t = TestApp::new();
    t.signup("ada").await;
    t.app.auth().remember_page("/projects").unwrap();
    assert!(!t.app.cache().is_empty());

    t.store
        .fail_next("auth sign_out", RemoteError::Network("offline".into()));
    t.app.auth().logout().await.unwrap();

    assert_eq!(t.app.current_user(), None);
    assert!(t.app.cache().is_empty());
    assert_eq!(t.app.restore_session().unwrap(), None);
    assert!(matches!(
        t.app.projects().list_owned().await,
        Err(AppError::NotLoggedIn)
    ));
}

#[tokio::test]
async fn test_last_page() {
    let t = TestApp::new();
    assert_eq!(t.app.auth().last_page().unwrap(), "/");

    t.app.auth().remember_page("/settings").unwrap();
    assert_eq!(t.app.auth().last_page().unwrap(), "/settings");
}

#[tokio::test]
async fn test_login_rejects_empty_fields() {
    let t = TestApp::new();
    let err = t.app.auth().login("", "secret").await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(t.store.count("auth sign_in"), 0);
}
