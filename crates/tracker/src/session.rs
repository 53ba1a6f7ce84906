//! Cart session id lifecycle.
//!
//! The cart session id correlates cart events across app restarts. It is
//! loaded from the store on first use, generated when absent, and replaced
//! only after a purchase event has been dispatched so historical cart
//! contents never get re-associated with the new session.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use aep_bootcamp_core::CartSessionId;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::store::{KeyValueStore, keys};

/// Owns the active [`CartSessionId`].
///
/// Store failures never reach the caller: the manager falls back to a
/// process-local id and logs the degradation.
pub struct CartSessionManager {
    store: Arc<dyn KeyValueStore>,
    current: Mutex<Option<CartSessionId>>,
    loading: AtomicBool,
}

impl CartSessionManager {
    /// Create a manager. The id is resolved lazily on first access.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            current: Mutex::new(None),
            loading: AtomicBool::new(true),
        }
    }

    /// True until the session id has been resolved once.
    ///
    /// Callers that cannot await [`Self::get_or_create_session_id`] should
    /// hold cart events while this is set.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    /// The resolved session id, without triggering a load.
    pub async fn current(&self) -> Option<CartSessionId> {
        self.current.lock().await.clone()
    }

    /// Return the active session id, loading or creating it on first use.
    ///
    /// Idempotent: repeated calls without a reset return the same id, also
    /// across restarts when the store is available.
    #[instrument(skip(self))]
    pub async fn get_or_create_session_id(&self) -> CartSessionId {
        let mut current = self.current.lock().await;
        if let Some(id) = current.as_ref() {
            return id.clone();
        }

        let id = match self.store.get(keys::CART_SESSION_ID).await {
            Ok(Some(stored)) => {
                if let Ok(id) = CartSessionId::parse(&stored) {
                    debug!(cart_session_id = %id, "Loaded cart session");
                    id
                } else {
                    warn!("Stored cart session id is blank, starting a new session");
                    self.create_and_persist().await
                }
            }
            Ok(None) => self.create_and_persist().await,
            Err(e) => {
                warn!(error = %e, "Cart session store unavailable, using in-memory session id");
                CartSessionId::generate()
            }
        };

        *current = Some(id.clone());
        self.loading.store(false, Ordering::Release);
        id
    }

    /// Replace the active session with a brand-new id and persist it.
    ///
    /// Call exactly once, after the purchase event has been dispatched.
    #[instrument(skip(self))]
    pub async fn reset_session_id(&self) -> CartSessionId {
        let mut current = self.current.lock().await;

        let mut id = CartSessionId::generate();
        while current.as_ref() == Some(&id) {
            id = CartSessionId::generate();
        }
        self.persist(&id).await;

        info!(
            previous = current.as_ref().map_or("", CartSessionId::as_str),
            cart_session_id = %id,
            "Cart session reset"
        );
        *current = Some(id.clone());
        self.loading.store(false, Ordering::Release);
        id
    }

    async fn create_and_persist(&self) -> CartSessionId {
        let id = CartSessionId::generate();
        self.persist(&id).await;
        info!(cart_session_id = %id, "Created cart session");
        id
    }

    async fn persist(&self, id: &CartSessionId) {
        if let Err(e) = self.store.set(keys::CART_SESSION_ID, id.as_str()).await {
            warn!(error = %e, "Failed to persist cart session id, keeping it in memory");
        }
    }
}

impl std::fmt::Debug for CartSessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartSessionManager")
            .field("loading", &self.is_loading())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::store::testing::UnavailableStore;

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let manager = CartSessionManager::new(Arc::new(MemoryStore::new()));
        assert!(manager.is_loading());
        assert_eq!(manager.current().await, None);

        let first = manager.get_or_create_session_id().await;
        let second = manager.get_or_create_session_id().await;
        assert_eq!(first, second);
        assert!(!manager.is_loading());
        assert_eq!(manager.current().await, Some(first));
    }

    #[tokio::test]
    async fn test_survives_restart() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let before = CartSessionManager::new(Arc::clone(&store))
            .get_or_create_session_id()
            .await;
        let after = CartSessionManager::new(Arc::clone(&store))
            .get_or_create_session_id()
            .await;
        assert_eq!(before, after);
        assert_eq!(
            store.get(keys::CART_SESSION_ID).await.unwrap().as_deref(),
            Some(before.as_str())
        );
    }

    #[tokio::test]
    async fn test_loads_existing_id() {
        let store = Arc::new(MemoryStore::new());
        store.set(keys::CART_SESSION_ID, "cart-1-abc").await.unwrap();

        let manager = CartSessionManager::new(store);
        assert_eq!(
            manager.get_or_create_session_id().await.as_str(),
            "cart-1-abc"
        );
    }

    #[tokio::test]
    async fn test_blank_stored_id_is_replaced() {
        let store = Arc::new(MemoryStore::new());
        store.set(keys::CART_SESSION_ID, "   ").await.unwrap();

        let manager = CartSessionManager::new(store.clone());
        let id = manager.get_or_create_session_id().await;
        assert!(id.as_str().starts_with("cart-"));
        assert_eq!(
            store.get(keys::CART_SESSION_ID).await.unwrap().as_deref(),
            Some(id.as_str())
        );
    }

    #[tokio::test]
    async fn test_reset_always_changes_id() {
        let store = Arc::new(MemoryStore::new());
        let manager = CartSessionManager::new(store.clone());
        let mut previous = manager.get_or_create_session_id().await;

        for _ in 0..20 {
            let next = manager.reset_session_id().await;
            assert_ne!(next, previous);
            assert_eq!(manager.get_or_create_session_id().await, next);
            assert_eq!(
                store.get(keys::CART_SESSION_ID).await.unwrap().as_deref(),
                Some(next.as_str())
            );
            previous = next;
        }
    }

    #[tokio::test]
    async fn test_unavailable_store_falls_back_to_memory() {
        let manager = CartSessionManager::new(Arc::new(UnavailableStore));
        let first = manager.get_or_create_session_id().await;
        assert!(!manager.is_loading());
        assert_eq!(manager.get_or_create_session_id().await, first);

        let reset = manager.reset_session_id().await;
        assert_ne!(reset, first);
        assert_eq!(manager.current().await, Some(reset));
    }
}
