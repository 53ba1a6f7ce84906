//! Tracker configuration.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `AEP_STORE_PATH` - JSON file backing the key-value store (default: `.aep-bootcamp/store.json`)
//! - `AEP_TENANT` - XDM tenant namespace key (default: `_techmarketingdemos`)
//! - `AEP_IDENTITY_CACHE_TTL_SECS` - Identity snapshot cache TTL (default: 300)
//! - `AEP_APP_ID` - Mobile SDK App ID seeded into the store
//! - `AEP_ASSURANCE_URL` - Assurance session URL seeded into the store
//! - `SENTRY_DSN` - Sentry error tracking DSN
//!
//! [`ConfigStore`] is the operator-facing surface for the App ID and the
//! Assurance URL; values are validated, persisted, and later forwarded to the
//! SDK verbatim (see [`crate::sdk`]).

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, instrument, warn};
use url::Url;

use crate::error::ExternalError;
use crate::store::{KeyValueStore, StoreError, keys};
use crate::xdm::TenantNamespace;

/// Query parameter every Assurance session URL carries.
pub const ASSURANCE_SESSION_MARKER: &str = "adb_validation_sessionid=";

const DEFAULT_STORE_PATH: &str = ".aep-bootcamp/store.json";
const DEFAULT_IDENTITY_CACHE_TTL_SECS: u64 = 300;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("App ID must not be empty")]
    EmptyAppId,
    #[error("No App ID configured")]
    MissingAppId,
    #[error("No Assurance URL configured")]
    MissingAssuranceUrl,
    #[error("Invalid Assurance URL: {0}")]
    InvalidAssuranceUrl(String),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("SDK error: {0}")]
    Sdk(#[from] ExternalError),
}

/// Tracker configuration.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Path of the JSON file backing the key-value store
    pub store_path: PathBuf,
    /// XDM tenant namespace
    pub tenant: TenantNamespace,
    /// How long an identity snapshot stays cached
    pub identity_cache_ttl: Duration,
    /// App ID to seed into the store
    pub app_id: Option<String>,
    /// Assurance URL to seed into the store
    pub assurance_url: Option<String>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            tenant: TenantNamespace::default(),
            identity_cache_ttl: Duration::from_secs(DEFAULT_IDENTITY_CACHE_TTL_SECS),
            app_id: None,
            assurance_url: None,
            sentry_dsn: None,
        }
    }
}

impl TrackerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if a variable is set but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup` instead of the process environment.
    ///
    /// Blank values count as unset.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if a variable is set but invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let tenant = match get("AEP_TENANT") {
            Some(raw) => TenantNamespace::parse(&raw).map_err(|e| {
                ConfigError::InvalidEnvVar("AEP_TENANT".to_string(), e.to_string())
            })?,
            None => defaults.tenant,
        };
        let identity_cache_ttl = match get("AEP_IDENTITY_CACHE_TTL_SECS") {
            Some(raw) => raw.parse::<u64>().map(Duration::from_secs).map_err(|e| {
                ConfigError::InvalidEnvVar("AEP_IDENTITY_CACHE_TTL_SECS".to_string(), e.to_string())
            })?,
            None => defaults.identity_cache_ttl,
        };
        let assurance_url = get("AEP_ASSURANCE_URL")
            .map(|raw| {
                validate_assurance_url(&raw).map_err(|e| {
                    ConfigError::InvalidEnvVar("AEP_ASSURANCE_URL".to_string(), e.to_string())
                })
            })
            .transpose()?;

        Ok(Self {
            store_path: get("AEP_STORE_PATH").map_or(defaults.store_path, PathBuf::from),
            tenant,
            identity_cache_ttl,
            app_id: get("AEP_APP_ID"),
            assurance_url,
            sentry_dsn: get("SENTRY_DSN"),
        })
    }
}

/// Validate an Assurance session URL and return it unchanged.
///
/// Surrounding whitespace is dropped; the URL is otherwise kept verbatim.
///
/// # Errors
///
/// Returns `ConfigError::MissingAssuranceUrl` for blank input and
/// `ConfigError::InvalidAssuranceUrl` if it is not a URL or lacks the
/// session id parameter.
pub fn validate_assurance_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::MissingAssuranceUrl);
    }
    if !trimmed.contains(ASSURANCE_SESSION_MARKER) {
        return Err(ConfigError::InvalidAssuranceUrl(format!(
            "missing {ASSURANCE_SESSION_MARKER}"
        )));
    }
    Url::parse(trimmed).map_err(|e| ConfigError::InvalidAssuranceUrl(e.to_string()))?;
    Ok(trimmed.to_owned())
}

/// Persisted App ID and Assurance URL.
pub struct ConfigStore {
    store: Arc<dyn KeyValueStore>,
}

impl ConfigStore {
    /// Create a config store over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Persist the App ID.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::EmptyAppId` for blank input, or a store error.
    #[instrument(skip(self))]
    pub async fn set_app_id(&self, app_id: &str) -> Result<String, ConfigError> {
        let app_id = app_id.trim();
        if app_id.is_empty() {
            return Err(ConfigError::EmptyAppId);
        }
        self.store.set(keys::APP_ID, app_id).await?;
        info!("App ID saved");
        Ok(app_id.to_owned())
    }

    /// Persist the Assurance URL.
    ///
    /// # Errors
    ///
    /// Returns a validation error (see [`validate_assurance_url`]) or a store
    /// error.
    #[instrument(skip_all)]
    pub async fn set_assurance_url(&self, url: &str) -> Result<String, ConfigError> {
        let url = validate_assurance_url(url)?;
        self.store.set(keys::ASSURANCE_URL, &url).await?;
        info!("Assurance URL saved");
        Ok(url)
    }

    /// The stored App ID, if any.
    ///
    /// # Errors
    ///
    /// Returns a store error.
    pub async fn app_id(&self) -> Result<Option<String>, ConfigError> {
        Ok(self
            .store
            .get(keys::APP_ID)
            .await?
            .filter(|v| !v.trim().is_empty()))
    }

    /// The stored Assurance URL, if any.
    ///
    /// # Errors
    ///
    /// Returns a store error.
    pub async fn assurance_url(&self) -> Result<Option<String>, ConfigError> {
        Ok(self
            .store
            .get(keys::ASSURANCE_URL)
            .await?
            .filter(|v| !v.trim().is_empty()))
    }

    /// Write values from the environment into the store.
    ///
    /// Seeding is best effort; failures are logged and skipped.
    pub async fn seed(&self, config: &TrackerConfig) {
        if let Some(app_id) = &config.app_id {
            if let Err(e) = self.set_app_id(app_id).await {
                warn!(error = %e, "Failed to seed App ID");
            }
        }
        if let Some(url) = &config.assurance_url {
            if let Err(e) = self.set_assurance_url(url).await {
                warn!(error = %e, "Failed to seed Assurance URL");
            }
        }
    }
}

impl std::fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore").finish_non_exhaustive()
    }
}
