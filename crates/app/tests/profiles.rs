//! Profile pages and user settings

mod common;

use app::profiles::ProfileEdit;
use app::AppError;
use autosave::AutosaveState;
use axiom_core::{Relation, UserSettings};
use cache::keys;
use common::TestApp;
use std::time::Duration;

fn is_cached(t: &TestApp, key: &str) -> bool {
    t.app
        .cache()
        .entries()
        .unwrap()
        .iter()
        .any(|entry| entry.key == key)
}

#[tokio::test]
async fn test_lookup_by_username() {
    let t = TestApp::new();
    let ada = t.signup("ada").await;

    let profile = t.app.profiles().get_by_username("@ada").await.unwrap();
    assert_eq!(profile.id, ada.user_id);
    assert_eq!(profile.display_name(), "ada");

    let err = t.app.profiles().get_by_username("grace").await.unwrap_err();
    assert!(matches!(err, AppError::UserNotFound));
}

#[tokio::test]
async fn test_follow_relation() {
    let t = TestApp::new();
    let ada = t.signup("ada").await;
    let bea = t.signup("bea").await;
    let ada_profile = t.app.profiles().get_by_username("ada").await.unwrap();
    let bea_profile = t.app.profiles().get_by_username("bea").await.unwrap();

    assert_eq!(t.app.profiles().relation(&bea_profile).await.unwrap(), Relation::Edit);
    assert_eq!(t.app.profiles().relation(&ada_profile).await.unwrap(), Relation::Follow);

    assert_eq!(t.app.profiles().follow(ada.user_id).await.unwrap(), Relation::Unfollow);
    // Following twice is harmless
    assert_eq!(t.app.profiles().follow(ada.user_id).await.unwrap(), Relation::Unfollow);
    assert_eq!(t.store.rows("user_relations").len(), 1);
    assert_eq!(t.app.profiles().relation(&ada_profile).await.unwrap(), Relation::Unfollow);

    assert_eq!(t.app.profiles().unfollow(ada.user_id).await.unwrap(), Relation::Follow);
    assert!(t.store.rows("user_relations").is_empty());

    // Users cannot follow themselves
    assert_eq!(t.app.profiles().follow(bea.user_id).await.unwrap(), Relation::Edit);

    t.app.session().clear();
    assert_eq!(t.app.profiles().relation(&ada_profile).await.unwrap(), Relation::Follow);
    assert!(matches!(
        t.app.profiles().follow(ada.user_id).await,
        Err(AppError::NotLoggedIn)
    ));
}

#[tokio::test]
async fn test_update_profile() {
    let t = TestApp::new();
    let ada = t.signup("ada").await;

    let cached = t.app.profiles().cached_profile(false).await.unwrap();
    assert_eq!(cached.id, ada.user_id);
    assert!(is_cached(&t, keys::USER_PROFILE));

    let mut edit = ProfileEdit {
        name: " ".into(),
        username: "ada".into(),
        role: "engineer".into(),
        bio: String::new(),
    };
    let err = t.app.profiles().update_profile(&edit).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    edit.name = "Ada Lovelace".into();
    edit.username = "@countess".into();
    edit.bio = " Analytical engines ".into();
    let updated = t.app.profiles().update_profile(&edit).await.unwrap();
    assert_eq!(updated.name.as_deref(), Some("Ada Lovelace"));
    assert_eq!(updated.username.as_deref(), Some("countess"));
    assert_eq!(updated.bio.as_deref(), Some("Analytical engines"));
    assert!(!is_cached(&t, keys::USER_PROFILE));
}

#[tokio::test]
async fn test_cached_profile_skips_the_store() {
    let t = TestApp::new();
    t.signup("ada").await;

    t.app.profiles().cached_profile(false).await.unwrap();
    let reads = t.store.count("select user_profiles");
    t.app.profiles().cached_profile(false).await.unwrap();
    assert_eq!(t.store.count("select user_profiles"), reads);

    t.app.profiles().cached_profile(true).await.unwrap();
    assert_eq!(t.store.count("select user_profiles"), reads + 1);
}

#[tokio::test]
async fn test_cached_profile_of_another_user_is_refetched() {
    let t = TestApp::new();
    let ada = t.signup("ada").await;
    t.app.profiles().cached_profile(false).await.unwrap();

    // Switch users without logging out
    let bea = t.signup("bea").await;
    let profile = t.app.profiles().cached_profile(false).await.unwrap();
    assert_eq!(profile.id, bea.user_id);
    assert_ne!(profile.id, ada.user_id);
}

#[tokio::test]
async fn test_settings_load_is_cached() {
    let t = TestApp::new();
    t.signup("ada").await;

    let settings = t.app.settings().load(false).await.unwrap();
    assert_eq!(settings, UserSettings::default());
    let reads = t.store.count("select user_settings");

    t.app.settings().load(false).await.unwrap();
    assert_eq!(t.store.count("select user_settings"), reads);
}

#[tokio::test(start_paused = true)]
async fn test_settings_toggles_autosave() {
    let t = TestApp::new();
    t.signup("ada").await;

    let coordinator = t.app.settings().autosave().await.unwrap();
    assert!(is_cached(&t, keys::USER_SETTINGS));
    assert_eq!(coordinator.status().state, AutosaveState::Idle);

    assert!(coordinator
        .on_field_edit("trd_prefers_show_email", true)
        .is_accepted());
    tokio::time::sleep(Duration::from_millis(450)).await;
    assert_eq!(t.store.count("update user_settings"), 0);

    tokio::time::sleep(Duration::from_millis(100)).await;
    coordinator.settled().await;
    assert_eq!(t.store.count("update user_settings"), 1);
    assert_eq!(t.store.rows("user_settings")[0]["trd_prefers_show_email"], true);
    assert!(!is_cached(&t, keys::USER_SETTINGS));

    let settings = t.app.settings().load(false).await.unwrap();
    assert!(settings.trd_prefers_show_email);
}
