//! Persistent key-value store.
//!
//! String keys, string values. Structured values are JSON-serialized by the
//! caller (see [`get_json`] / [`set_json`]). Writes are small and keyed
//! independently, so backends only need to serialize their own file access.

use std::collections::{BTreeMap, HashMap};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, instrument, warn};

/// Keys used by the bookkeeping core.
pub mod keys {
    /// Active cart session id.
    pub const CART_SESSION_ID: &str = "cartSessionId";

    /// JSON-serialized [`crate::profile::UserProfile`].
    pub const USER_PROFILE: &str = "userProfile";

    /// Mobile SDK App ID (environment file id).
    pub const APP_ID: &str = "appId";

    /// Assurance session URL.
    pub const ASSURANCE_URL: &str = "assuranceUrl";
}

/// Errors that can occur when reading or writing the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem access failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data could not be (de)serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The backend cannot be used at all.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Async string key-value storage.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value; `Ok(None)` when the key is absent.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a value, replacing any previous one.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove a key. Removing an absent key succeeds.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Read and deserialize a JSON value.
///
/// # Errors
///
/// Returns `StoreError` if the backend fails or the stored JSON is invalid.
pub async fn get_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StoreError> {
    match store.get(key).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Serialize and write a JSON value.
///
/// # Errors
///
/// Returns `StoreError` if serialization or the backend fails.
pub async fn set_json<T: Serialize + Sync>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw).await
}

// =============================================================================
// In-memory backend
// =============================================================================

/// Process-local store. Used in tests and as the fallback when no file
/// store can be opened.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .write()
            .await
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

// =============================================================================
// File backend
// =============================================================================

/// Store backed by a single JSON object file.
///
/// A missing file reads as an empty store; parent directories are created on
/// the first write. Every write rewrites the whole file through a temporary
/// sibling and a rename. A file that no longer parses fails reads until the
/// next write, which moves it aside to `*.json.corrupt` and starts over.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    /// Create a store backed by `path`. Nothing is touched until first use.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<BTreeMap<String, String>, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(BTreeMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Entries to start a write from. Unparseable contents are moved aside.
    async fn read_for_write(&self) -> Result<BTreeMap<String, String>, StoreError> {
        match self.read_all().await {
            Err(StoreError::Json(e)) => {
                let backup = self.path.with_extension("json.corrupt");
                warn!(error = %e, backup = %backup.display(), "Store file is corrupt, starting empty");
                tokio::fs::rename(&self.path, &backup).await?;
                Ok(BTreeMap::new())
            }
            other => other,
        }
    }

    async fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let bytes = serde_json::to_vec_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.read_all().await?.remove(key))
    }

    #[instrument(skip(self, value), fields(path = %self.path.display()))]
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_for_write().await?;
        entries.insert(key.to_owned(), value.to_owned());
        self.write_all(&entries).await?;
        debug!("Stored value");
        Ok(())
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_for_write().await?;
        if entries.remove(key).is_some() {
            self.write_all(&entries).await?;
            debug!("Removed value");
        }
        Ok(())
    }
}
