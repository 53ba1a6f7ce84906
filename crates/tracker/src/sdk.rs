//! Forwarding validated configuration to the mobile SDK.

use async_trait::async_trait;
use tracing::{info, instrument};

use crate::config::{ConfigError, ConfigStore, validate_assurance_url};
use crate::error::ExternalError;

/// The mobile SDK core (configuration and Assurance).
#[async_trait]
pub trait MobileSdk: Send + Sync {
    /// Configure the SDK with an App ID (environment file id).
    async fn initialize_with_app_id(&self, app_id: &str) -> Result<(), ExternalError>;

    /// Start an Assurance session.
    async fn start_assurance_session(&self, url: &str) -> Result<(), ExternalError>;
}

/// Forward the stored App ID to the SDK.
///
/// # Errors
///
/// Returns `ConfigError::MissingAppId` if none is stored, a store error, or
/// `ConfigError::Sdk` if the SDK rejects it.
#[instrument(skip_all)]
pub async fn configure_sdk(config: &ConfigStore, sdk: &dyn MobileSdk) -> Result<String, ConfigError> {
    let app_id = config.app_id().await?.ok_or(ConfigError::MissingAppId)?;
    sdk.initialize_with_app_id(&app_id).await?;
    info!("SDK configured");
    Ok(app_id)
}

/// Forward the stored Assurance URL to the SDK.
///
/// # Errors
///
/// Returns `ConfigError::MissingAssuranceUrl` if none is stored, a
/// validation or store error, or `ConfigError::Sdk` if the SDK rejects it.
#[instrument(skip_all)]
pub async fn start_assurance(config: &ConfigStore, sdk: &dyn MobileSdk) -> Result<String, ConfigError> {
    let stored = config
        .assurance_url()
        .await?
        .ok_or(ConfigError::MissingAssuranceUrl)?;
    let url = validate_assurance_url(&stored)?;
    sdk.start_assurance_session(&url).await?;
    info!("Assurance session started");
    Ok(url)
}
