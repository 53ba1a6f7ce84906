//! Identity resolution and privacy hashing.
//!
//! - [`hash_email`] - SHA-256 of the normalized email, hex encoded
//! - [`build_tenant_identities`] - sparse tenant identity block for events
//! - [`IdentityResolver`] - cached snapshot of the identity SDK's map

use std::sync::Arc;
use std::time::Duration;

use aep_bootcamp_core::IdentityMap;
use async_trait::async_trait;
use moka::future::Cache;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use crate::error::ExternalError;

const IDENTITY_CACHE_KEY: &str = "identity-map";

/// Hash an email for attaching to events.
///
/// Trims and lowercases, then returns the hex-encoded SHA-256 digest.
/// Empty (or whitespace-only) input returns an empty string.
///
/// ```
/// use aep_bootcamp_tracker::hash_email;
///
/// assert_eq!(hash_email("A@B.com"), hash_email(" a@b.com "));
/// assert_eq!(hash_email(""), "");
/// ```
#[must_use]
pub fn hash_email(email: &str) -> String {
    let normalized = email.trim().to_lowercase();
    if normalized.is_empty() {
        return String::new();
    }
    hex::encode(Sha256::digest(normalized.as_bytes()))
}

/// Identity block attached under the tenant namespace of every event.
///
/// Sparse: a field is present only when its input was provided, so
/// consumers can tell "absent" from "empty". `Debug` redacts the plaintext
/// email.
#[derive(Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantIdentities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ecid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hashed_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile_phone: Option<String>,
}

impl TenantIdentities {
    /// True when no identity field is present.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.ecid.is_none()
            && self.email_address.is_none()
            && self.hashed_email.is_none()
            && self.mobile_phone.is_none()
    }
}

impl std::fmt::Debug for TenantIdentities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantIdentities")
            .field("ecid", &self.ecid)
            .field(
                "email_address",
                &self.email_address.as_ref().map(|_| "[REDACTED]"),
            )
            .field("hashed_email", &self.hashed_email)
            .field("mobile_phone", &self.mobile_phone.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Raw inputs for [`build_tenant_identities`].
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityInputs<'a> {
    pub ecid: Option<&'a str>,
    pub email: Option<&'a str>,
    pub phone: Option<&'a str>,
}

/// Build the sparse tenant identity block.
///
/// Blank inputs count as absent. A provided email yields both the trimmed
/// `emailAddress` and its `hashedEmail`.
#[must_use]
pub fn build_tenant_identities(inputs: &IdentityInputs<'_>) -> TenantIdentities {
    fn provided(value: Option<&str>) -> Option<String> {
        value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_owned)
    }

    let email = provided(inputs.email);
    TenantIdentities {
        ecid: provided(inputs.ecid),
        hashed_email: email.as_deref().map(hash_email),
        email_address: email,
        mobile_phone: provided(inputs.phone),
    }
}

/// ECID from a raw identity SDK response; `None` on any missing path.
#[must_use]
pub fn extract_ecid(response: &Value) -> Option<String> {
    IdentityMap::from_value(response).ecid().map(str::to_owned)
}

/// Authenticated email from a raw identity SDK response; `None` on any
/// missing path.
#[must_use]
pub fn extract_email(response: &Value) -> Option<String> {
    IdentityMap::from_value(response).email().map(str::to_owned)
}

// =============================================================================
// Identity SDK boundary
// =============================================================================

/// The external identity SDK.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Current identities as the SDK reports them (loosely structured JSON).
    async fn get_identities(&self) -> Result<Value, ExternalError>;

    /// Drop all identities so the next registration starts clean.
    async fn reset_identities(&self) -> Result<(), ExternalError>;
}

/// Identity provider serving a fixed snapshot.
///
/// Used offline (CLI, tests) where no identity SDK is linked.
#[derive(Debug)]
pub struct StaticIdentityProvider {
    identities: RwLock<Value>,
}

impl StaticIdentityProvider {
    /// Serve `identities` until reset.
    #[must_use]
    pub fn new(identities: Value) -> Self {
        Self {
            identities: RwLock::new(identities),
        }
    }

    /// Provider that knows only the device ECID.
    #[must_use]
    pub fn with_ecid(ecid: &str) -> Self {
        Self::new(serde_json::json!({
            "identityMap": {
                "ECID": [{"id": ecid, "authenticatedState": "ambiguous", "primary": true}]
            }
        }))
    }

    /// Serve a new snapshot, as the SDK does after a login state change.
    pub async fn replace(&self, identities: Value) {
        *self.identities.write().await = identities;
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn get_identities(&self) -> Result<Value, ExternalError> {
        Ok(self.identities.read().await.clone())
    }

    async fn reset_identities(&self) -> Result<(), ExternalError> {
        *self.identities.write().await = Value::Object(serde_json::Map::new());
        Ok(())
    }
}

/// Caches the identity SDK's map between screen focuses.
///
/// Provider failures resolve to an empty map (guest identity); they are
/// logged and never cached.
pub struct IdentityResolver {
    provider: Arc<dyn IdentityProvider>,
    cache: Cache<&'static str, IdentityMap>,
}

impl IdentityResolver {
    /// Create a resolver whose snapshot expires after `ttl`.
    #[must_use]
    pub fn new(provider: Arc<dyn IdentityProvider>, ttl: Duration) -> Self {
        Self {
            provider,
            cache: Cache::builder().time_to_live(ttl).build(),
        }
    }

    /// The cached identity map, fetching it when absent or expired.
    pub async fn resolve(&self) -> IdentityMap {
        if let Some(map) = self.cache.get(&IDENTITY_CACHE_KEY).await {
            return map;
        }
        self.refresh().await
    }

    /// Fetch a fresh snapshot from the SDK, replacing the cached one.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> IdentityMap {
        match self.provider.get_identities().await {
            Ok(response) => {
                let map = IdentityMap::from_value(&response);
                debug!(has_ecid = map.ecid().is_some(), "Fetched identity map");
                self.cache.insert(IDENTITY_CACHE_KEY, map.clone()).await;
                map
            }
            Err(e) => {
                warn!(error = %e, "Identity SDK unavailable, continuing as guest");
                IdentityMap::default()
            }
        }
    }

    /// Forget the cached snapshot.
    pub async fn invalidate(&self) {
        self.cache.invalidate(&IDENTITY_CACHE_KEY).await;
    }

    /// Reset identities in the SDK, then forget the cached snapshot.
    ///
    /// The cache is dropped even when the SDK call fails.
    ///
    /// # Errors
    ///
    /// Returns the SDK error so the caller can decide whether to retry.
    #[instrument(skip(self))]
    pub async fn reset(&self) -> Result<(), ExternalError> {
        let result = self.provider.reset_identities().await;
        self.invalidate().await;
        result
    }
}

impl std::fmt::Debug for IdentityResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityResolver").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;

    /// Counts calls; fails while `failing` is set.
    #[derive(Default)]
    struct CountingProvider {
        calls: AtomicUsize,
        resets: AtomicUsize,
        failing: std::sync::atomic::AtomicBool,
    }

    #[async_trait]
    impl IdentityProvider for CountingProvider {
        async fn get_identities(&self) -> Result<Value, ExternalError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                return Err(ExternalError::call("Identity", "timeout"));
            }
            Ok(json!({"identityMap": {"ECID": [{"id": format!("ecid-{n}")}]}}))
        }

        async fn reset_identities(&self) -> Result<(), ExternalError> {
            self.resets.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                return Err(ExternalError::Unavailable("Identity"));
            }
            Ok(())
        }
    }

    #[test]
    fn test_hash_email_known_digest() {
        assert_eq!(
            hash_email("test@example.com"),
            "973dfe463ec85785f5f95af5ba3906eedb2d931c24e69824a89ea65dba4e813b"
        );
    }

    #[test]
    fn test_hash_email_normalizes() {
        assert_eq!(hash_email("A@B.com"), hash_email(" a@b.com "));
        assert_eq!(hash_email("A@B.com").len(), 64);
        assert_ne!(hash_email("a@b.com"), hash_email("a@c.com"));
    }

    #[test]
    fn test_hash_email_empty() {
        assert_eq!(hash_email(""), "");
        assert_eq!(hash_email("   "), "");
    }

    #[test]
    fn test_hash_email_does_not_leak_plaintext() {
        let hashed = hash_email("ann@x.com");
        assert!(!hashed.contains("ann"));
        assert!(hashed.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_build_tenant_identities_empty() {
        let identities = build_tenant_identities(&IdentityInputs::default());
        assert!(identities.is_empty());
        assert_eq!(serde_json::to_value(&identities).unwrap(), json!({}));
    }

    #[test]
    fn test_build_tenant_identities_sparse() {
        let identities = build_tenant_identities(&IdentityInputs {
            ecid: Some("123"),
            email: Some(""),
            phone: None,
        });
        assert_eq!(
            serde_json::to_value(&identities).unwrap(),
            json!({"ecid": "123"})
        );
    }

    #[test]
    fn test_build_tenant_identities_with_email() {
        let identities = build_tenant_identities(&IdentityInputs {
            ecid: None,
            email: Some(" Ann@X.com "),
            phone: Some("555-0100"),
        });
        assert_eq!(identities.email_address.as_deref(), Some("Ann@X.com"));
        assert_eq!(identities.hashed_email, Some(hash_email("ann@x.com")));
        assert_eq!(identities.mobile_phone.as_deref(), Some("555-0100"));

        let debug = format!("{identities:?}");
        assert!(!debug.contains("Ann@X.com"));
        assert!(!debug.contains("555-0100"));
    }

    #[test]
    fn test_extractors() {
        let response = json!({
            "identityMap": {
                "ECID": [{"id": "ecid-1"}],
                "Email": [{"id": "ann@x.com", "authenticatedState": "authenticated"}]
            }
        });
        assert_eq!(extract_ecid(&response).as_deref(), Some("ecid-1"));
        assert_eq!(extract_email(&response).as_deref(), Some("ann@x.com"));

        assert_eq!(extract_ecid(&json!({})), None);
        assert_eq!(extract_ecid(&json!({"identityMap": null})), None);
        assert_eq!(extract_email(&json!("garbage")), None);
    }

    #[tokio::test]
    async fn test_resolver_caches_snapshot() {
        let provider = Arc::new(CountingProvider::default());
        let resolver = IdentityResolver::new(provider.clone(), Duration::from_secs(60));

        assert_eq!(resolver.resolve().await.ecid(), Some("ecid-0"));
        assert_eq!(resolver.resolve().await.ecid(), Some("ecid-0"));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

        assert_eq!(resolver.refresh().await.ecid(), Some("ecid-1"));
        assert_eq!(resolver.resolve().await.ecid(), Some("ecid-1"));

        resolver.invalidate().await;
        assert_eq!(resolver.resolve().await.ecid(), Some("ecid-2"));
    }

    #[tokio::test]
    async fn test_resolver_degrades_to_guest() {
        let provider = Arc::new(CountingProvider::default());
        provider.failing.store(true, Ordering::SeqCst);
        let resolver = IdentityResolver::new(provider.clone(), Duration::from_secs(60));

        assert!(resolver.resolve().await.is_empty());
        // Failures are not cached.
        provider.failing.store(false, Ordering::SeqCst);
        assert!(resolver.resolve().await.ecid().is_some());
    }

    #[tokio::test]
    async fn test_reset_invalidates_even_on_failure() {
        let provider = Arc::new(CountingProvider::default());
        let resolver = IdentityResolver::new(provider.clone(), Duration::from_secs(60));
        resolver.resolve().await;

        provider.failing.store(true, Ordering::SeqCst);
        assert!(resolver.reset().await.is_err());
        provider.failing.store(false, Ordering::SeqCst);

        assert_eq!(resolver.resolve().await.ecid(), Some("ecid-1"));
        assert_eq!(provider.resets.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_static_provider_reset() {
        let provider = StaticIdentityProvider::with_ecid("device-1");
        assert_eq!(
            extract_ecid(&provider.get_identities().await.unwrap()).as_deref(),
            Some("device-1")
        );
        provider.reset_identities().await.unwrap();
        assert_eq!(extract_ecid(&provider.get_identities().await.unwrap()), None);
    }
}
