//! Integration tests for the App ID and Assurance URL surface.

#![allow(clippy::unwrap_used)]

use aep_bootcamp_integration_tests::TestContext;
use aep_bootcamp_tracker::ConfigError;

const URL: &str = "aepbootcamp://assurance?adb_validation_sessionid=f6c6f5b0";

#[tokio::test]
async fn test_configuration_persists_across_restart() {
    let ctx = TestContext::new();
    ctx.config.set_app_id("launch-abc/def/launch-123").await.unwrap();
    ctx.config.set_assurance_url(URL).await.unwrap();

    let ctx = ctx.restart();
    assert_eq!(
        ctx.config.app_id().await.unwrap().as_deref(),
        Some("launch-abc/def/launch-123")
    );
    assert_eq!(ctx.config.assurance_url().await.unwrap().as_deref(), Some(URL));
}

#[tokio::test]
async fn test_assurance_url_requires_session_marker() {
    let ctx = TestContext::new();
    let err = ctx
        .config
        .set_assurance_url("https://experience.adobe.com/assurance")
        .await
        .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidAssuranceUrl(_)));
    assert!(!ctx.store_path().exists());
}
