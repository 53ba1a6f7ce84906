//! Component wiring for one CLI invocation.

use std::sync::Arc;

use aep_bootcamp_tracker::identity::StaticIdentityProvider;
use aep_bootcamp_tracker::{
    CartSessionManager, ConfigStore, ExternalError, FileStore, IdentityProvider,
    IdentityResolver, KeyValueStore, MobileSdk, ProfileStore, Tracker, TrackerConfig,
};
use async_trait::async_trait;
use tracing::info;

use crate::output::StdoutDispatcher;

/// Mobile SDK stand-in; the CLI has no device runtime to configure.
#[derive(Debug, Default)]
pub struct LoggingSdk;

#[async_trait]
impl MobileSdk for LoggingSdk {
    async fn initialize_with_app_id(&self, app_id: &str) -> Result<(), ExternalError> {
        info!(app_id, "SDK would be configured");
        Ok(())
    }

    async fn start_assurance_session(&self, url: &str) -> Result<(), ExternalError> {
        info!(url, "Assurance session would start");
        Ok(())
    }
}

/// Everything a command needs.
pub struct App {
    pub config: ConfigStore,
    pub tracker: Tracker,
    pub sdk: LoggingSdk,
}

impl App {
    /// Wire the components over the file store named in `config`.
    pub async fn new(config: &TrackerConfig, ecid: Option<&str>) -> Self {
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(config.store_path.clone()));

        let config_store = ConfigStore::new(store.clone());
        config_store.seed(config).await;

        let provider: Arc<dyn IdentityProvider> = match ecid {
            Some(ecid) => Arc::new(StaticIdentityProvider::with_ecid(ecid)),
            None => Arc::new(StaticIdentityProvider::new(serde_json::json!({}))),
        };
        let identity = Arc::new(IdentityResolver::new(provider, config.identity_cache_ttl));

        let tracker = Tracker::new(
            Arc::new(CartSessionManager::new(store.clone())),
            identity,
            Arc::new(ProfileStore::new(store)),
            Arc::new(StdoutDispatcher),
            config.tenant.clone(),
        );

        Self {
            config: config_store,
            tracker,
            sdk: LoggingSdk,
        }
    }
}
