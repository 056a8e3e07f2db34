//! Session persistence and cross-tab wiring through the public API

use std::time::Duration;

use tokio::time::sleep;

use storefront_lib::{AppContext, AuthStateChanged, Config, Element, SharedStorage};

use crate::test_harness::{admin_token, temp_storage_path, TestShop};

#[tokio::test]
async fn test_session_survives_a_restart() {
    let path = temp_storage_path();

    {
        let storage = SharedStorage::open(&path).await.unwrap();
        let mut config = Config::default();
        config.session.storage_path = Some(path.clone());
        let tab = AppContext::new(config, &storage).unwrap();
        tab.initialize().await;
        tab.auth.login(&admin_token()).await.unwrap();
        tab.shutdown().await.unwrap();
    }

    let storage = SharedStorage::open(&path).await.unwrap();
    let mut config = Config::default();
    config.sync.bootstrap_delay_ms = 0;
    let tab = AppContext::new(config, &storage).unwrap();
    let link = tab.document.mount(Element::new("admin-link"));
    link.set_hidden(true);
    let mut events = tab.event_bus.subscribe();

    tab.initialize().await;
    let announced = events.recv().await.unwrap();
    assert_eq!(
        AuthStateChanged::from_event(&announced),
        Some(AuthStateChanged::new(true))
    );

    sleep(Duration::from_millis(50)).await;
    assert!(!link.is_hidden());
    assert_eq!(tab.auth.current_user().unwrap().email.as_deref(), Some("ops@example.com"));

    tab.shutdown().await.unwrap();
    let _ = tokio::fs::remove_file(&path).await;
}

#[tokio::test]
async fn test_corrupt_storage_file_is_an_error() {
    let path = temp_storage_path();
    tokio::fs::write(&path, "not json").await.unwrap();

    let err = SharedStorage::open(&path).await.unwrap_err();
    assert_eq!(err.code, storefront_lib::ErrorCode::StorageReadFailed);

    let _ = tokio::fs::remove_file(&path).await;
}

#[tokio::test]
async fn test_config_file_handling() {
    let missing = temp_storage_path();
    let config = Config::load(&missing).await.unwrap();
    assert_eq!(config.session.token_key, "auth_token");
    assert_eq!(config.ui.admin_targets, vec!["admin-link", "admin-nav"]);

    let broken = temp_storage_path();
    tokio::fs::write(&broken, r#"{ "api": { "base_url": 42 } }"#).await.unwrap();
    let err = Config::load(&broken).await.unwrap_err();
    assert_eq!(err.code, storefront_lib::ErrorCode::ConfigInvalid);

    tokio::fs::write(&broken, r#"{ "api": { "max_get_attempts": 0 } }"#).await.unwrap();
    assert!(Config::load(&broken).await.is_err());

    let _ = tokio::fs::remove_file(&broken).await;
}

#[tokio::test]
async fn test_logout_elsewhere_hides_admin_link() {
    let shop = TestShop::start().await;
    let mut config = shop.config();
    config.sync.settle_delay_ms = 10;
    config.sync.bootstrap_delay_ms = 10;

    let admin_tab = AppContext::new(config.clone(), &shop.storage).unwrap();
    let other_tab = AppContext::new(config, &shop.storage).unwrap();
    let link = admin_tab.document.mount(Element::new("admin-link"));

    other_tab.auth.login(&admin_token()).await.unwrap();
    admin_tab.initialize().await;
    other_tab.initialize().await;
    sleep(Duration::from_millis(100)).await;
    assert!(!link.is_hidden());

    other_tab.auth.logout().await;
    sleep(Duration::from_millis(100)).await;
    assert!(link.is_hidden());
    assert!(!admin_tab.auth.is_authenticated());

    admin_tab.shutdown().await.unwrap();
    other_tab.shutdown().await.unwrap();
}
