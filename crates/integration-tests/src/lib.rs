//! Integration tests for the AEP bootcamp bookkeeping core.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p aep-bootcamp-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_session` - Session id lifecycle across restarts
//! - `xdm_events` - Event payloads built through the tracker
//! - `identity` - Email hashing and tenant identities
//! - `push_routing` - Adobe message classification
//!
//! Every test runs against a [`TestContext`]: a file-backed store in a
//! temporary directory and a recording dispatcher.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use aep_bootcamp_tracker::identity::StaticIdentityProvider;
use aep_bootcamp_tracker::{
    CartSessionManager, ConfigStore, FileStore, IdentityResolver, KeyValueStore, ProfileStore,
    RecordingDispatcher, TenantNamespace, Tracker,
};
use tempfile::TempDir;

/// ECID reported by the test identity provider.
pub const TEST_ECID: &str = "12345678901234567890123456789012345678";

/// Components wired over a temporary file store.
pub struct TestContext {
    dir: TempDir,
    pub tracker: Tracker,
    pub config: ConfigStore,
    pub recorder: Arc<RecordingDispatcher>,
}

impl TestContext {
    /// Fresh context in a new temporary directory.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        Self::in_dir(dir)
    }

    /// Context over the same store, as after an app restart.
    #[must_use]
    pub fn restart(self) -> Self {
        Self::in_dir(self.dir)
    }

    /// Path of the backing store file.
    #[must_use]
    pub fn store_path(&self) -> PathBuf {
        store_path(self.dir.path())
    }

    fn in_dir(dir: TempDir) -> Self {
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(store_path(dir.path())));
        let recorder = Arc::new(RecordingDispatcher::new());
        let tracker = Tracker::new(
            Arc::new(CartSessionManager::new(store.clone())),
            Arc::new(IdentityResolver::new(
                Arc::new(StaticIdentityProvider::with_ecid(TEST_ECID)),
                Duration::from_secs(60),
            )),
            Arc::new(ProfileStore::new(store.clone())),
            recorder.clone(),
            TenantNamespace::default(),
        );

        Self {
            dir,
            tracker,
            config: ConfigStore::new(store),
            recorder,
        }
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

fn store_path(dir: &Path) -> PathBuf {
    dir.join("store.json")
}
