//! Per-action orchestration.
//!
//! Every action runs the same pipeline: resolve identity, make sure the cart
//! session is ready, build the event, dispatch it. Dispatch is fire and
//! forget; a failed send is logged and the built event is still returned.

use std::sync::Arc;

use aep_bootcamp_core::{CartSessionId, CurrencyCode, IdentityMap};
use rust_decimal::Decimal;
use tracing::{info, instrument, warn};

use crate::dispatch::EdgeDispatcher;
use crate::error::Result;
use crate::identity::IdentityResolver;
use crate::profile::{ProfileStore, UserProfile};
use crate::session::CartSessionManager;
use crate::xdm::{
    self, AddToCart, Checkout, EventContext, PageView, Product, Purchase, TenantNamespace,
    XdmEvent,
};

/// A built event and whether Edge accepted it.
#[derive(Debug, Clone, PartialEq)]
pub struct Tracked {
    pub event: XdmEvent,
    pub dispatched: bool,
}

/// Identity and profile as of the start of an action.
struct Snapshot {
    identity_map: IdentityMap,
    profile: Option<UserProfile>,
}

impl Snapshot {
    fn context<'a>(&'a self, tenant: &'a TenantNamespace) -> EventContext<'a> {
        EventContext::guest(&self.identity_map, tenant).with_profile(self.profile.as_ref())
    }
}

/// Wires the bookkeeping components to the dispatcher.
pub struct Tracker {
    sessions: Arc<CartSessionManager>,
    identity: Arc<IdentityResolver>,
    profiles: Arc<ProfileStore>,
    dispatcher: Arc<dyn EdgeDispatcher>,
    tenant: TenantNamespace,
}

impl Tracker {
    /// Create a tracker.
    #[must_use]
    pub fn new(
        sessions: Arc<CartSessionManager>,
        identity: Arc<IdentityResolver>,
        profiles: Arc<ProfileStore>,
        dispatcher: Arc<dyn EdgeDispatcher>,
        tenant: TenantNamespace,
    ) -> Self {
        Self {
            sessions,
            identity,
            profiles,
            dispatcher,
            tenant,
        }
    }

    /// The cart session manager.
    #[must_use]
    pub const fn sessions(&self) -> &Arc<CartSessionManager> {
        &self.sessions
    }

    /// The profile store.
    #[must_use]
    pub const fn profiles(&self) -> &Arc<ProfileStore> {
        &self.profiles
    }

    /// The tenant namespace events are built with.
    #[must_use]
    pub const fn tenant(&self) -> &TenantNamespace {
        &self.tenant
    }

    /// Track a page view.
    #[instrument(skip_all, fields(page = %page.name))]
    pub async fn track_page_view(&self, page: &PageView) -> Tracked {
        let snapshot = self.snapshot().await;
        let event = xdm::page_view(&snapshot.context(&self.tenant), page);
        self.dispatch(event).await
    }

    /// Track a product detail view.
    #[instrument(skip_all, fields(sku = %product.sku))]
    pub async fn track_product_view(&self, product: &Product) -> Tracked {
        let snapshot = self.snapshot().await;
        let event = xdm::product_view(&snapshot.context(&self.tenant), product);
        self.dispatch(event).await
    }

    /// Track products added to the cart.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::Build` if the event cannot be built.
    #[instrument(skip_all, fields(items = products.len()))]
    pub async fn track_add_to_cart(&self, products: Vec<Product>) -> Result<Tracked> {
        let snapshot = self.snapshot().await;
        let cart_session_id = Some(self.session_ready().await);
        let event = xdm::add_to_cart(
            &snapshot.context(&self.tenant),
            &AddToCart {
                products,
                cart_session_id,
            },
        )?;
        Ok(self.dispatch(event).await)
    }

    /// Track a checkout start.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::Build` if the event cannot be built.
    #[instrument(skip_all, fields(items = products.len()))]
    pub async fn track_checkout(&self, products: Vec<Product>) -> Result<Tracked> {
        let snapshot = self.snapshot().await;
        let cart_session_id = Some(self.session_ready().await);
        let event = xdm::checkout(
            &snapshot.context(&self.tenant),
            &Checkout {
                products,
                cart_session_id,
            },
        )?;
        Ok(self.dispatch(event).await)
    }

    /// Track a completed purchase.
    ///
    /// The cart session is rotated only once the purchase event has been
    /// dispatched, so a failed send can be retried under the same session.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::Build` if the event cannot be built.
    #[instrument(skip_all, fields(items = products.len(), %total))]
    pub async fn track_purchase(
        &self,
        products: Vec<Product>,
        total: Decimal,
        currency: Option<CurrencyCode>,
    ) -> Result<Tracked> {
        let snapshot = self.snapshot().await;
        let cart_session_id = Some(self.session_ready().await);
        let event = xdm::purchase(
            &snapshot.context(&self.tenant),
            &Purchase {
                products,
                cart_session_id,
                total,
                currency,
                purchase_id: None,
            },
        )?;

        let tracked = self.dispatch(event).await;
        if tracked.dispatched {
            self.sessions.reset_session_id().await;
        } else {
            warn!("Purchase not dispatched, keeping the current cart session");
        }
        Ok(tracked)
    }

    /// Log a user in and send the login event.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::Profile` if the name or email is invalid.
    #[instrument(skip_all)]
    pub async fn login(&self, first_name: &str, email: &str) -> Result<Tracked> {
        let profile = self.profiles.login(first_name, email).await?;
        let identity_map = self.identity.resolve().await;
        let ctx = EventContext::guest(&identity_map, &self.tenant).with_profile(Some(&profile));
        let event = xdm::login(&ctx);
        Ok(self.dispatch(event).await)
    }

    /// Send the logout event, then clear the profile and the cached
    /// identity map so later events go out as guest.
    #[instrument(skip_all)]
    pub async fn logout(&self) -> Tracked {
        let snapshot = self.snapshot().await;
        let event = xdm::logout(&snapshot.context(&self.tenant));
        let tracked = self.dispatch(event).await;
        self.profiles.logout().await;
        self.identity.invalidate().await;
        tracked
    }

    async fn snapshot(&self) -> Snapshot {
        Snapshot {
            identity_map: self.identity.resolve().await,
            profile: self.profiles.load().await,
        }
    }

    /// Wait for the cart session id to be resolved.
    async fn session_ready(&self) -> CartSessionId {
        self.sessions.get_or_create_session_id().await
    }

    async fn dispatch(&self, event: XdmEvent) -> Tracked {
        let dispatched = match self.dispatcher.send_event(&event).await {
            Ok(()) => {
                info!(event_id = %event.id, event_type = %event.event_type, "Event sent");
                true
            }
            Err(e) => {
                warn!(
                    error = %e,
                    event_id = %event.id,
                    event_type = %event.event_type,
                    "Failed to send event"
                );
                false
            }
        };
        Tracked { event, dispatched }
    }
}

impl std::fmt::Debug for Tracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracker")
            .field("tenant", &self.tenant)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use aep_bootcamp_core::EventType;
    use serde_json::json;

    use super::*;
    use crate::dispatch::RecordingDispatcher;
    use crate::dispatch::testing::OfflineDispatcher;
    use crate::error::TrackerError;
    use crate::identity::{StaticIdentityProvider, hash_email};
    use crate::store::{KeyValueStore, MemoryStore};

    fn tracker_with(dispatcher: Arc<dyn EdgeDispatcher>) -> Tracker {
        tracker_with_provider(
            Arc::new(StaticIdentityProvider::with_ecid("ecid-1")),
            dispatcher,
        )
    }

    fn tracker_with_provider(
        provider: Arc<StaticIdentityProvider>,
        dispatcher: Arc<dyn EdgeDispatcher>,
    ) -> Tracker {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        Tracker::new(
            Arc::new(CartSessionManager::new(store.clone())),
            Arc::new(IdentityResolver::new(provider, Duration::from_secs(60))),
            Arc::new(ProfileStore::new(store)),
            dispatcher,
            TenantNamespace::default(),
        )
    }

    fn identities_with_email(state: &str) -> serde_json::Value {
        json!({
            "identityMap": {
                "ECID": [{"id": "e1", "authenticatedState": "ambiguous", "primary": true}],
                "Email": [{"id": "ann@x.com", "authenticatedState": state}]
            }
        })
    }

    fn tent() -> Product {
        Product::new("S1", "Tent", Decimal::from(50))
    }

    #[tokio::test]
    async fn test_guest_page_view() {
        let recorder = Arc::new(RecordingDispatcher::new());
        let tracker = tracker_with(recorder.clone());

        let tracked = tracker.track_page_view(&PageView::new("home")).await;
        assert!(tracked.dispatched);

        let json = tracked.event.to_json().unwrap();
        let tenant = &json["_techmarketingdemos"];
        assert_eq!(tenant["loginStatus"], "guest");
        assert_eq!(tenant["visitorType"], "Guest");
        assert_eq!(tenant["identities"]["ecid"], "ecid-1");
        assert!(tenant["identities"].get("emailAddress").is_none());
        assert_eq!(recorder.events().await.len(), 1);
    }

    #[tokio::test]
    async fn test_cart_events_share_the_session() {
        let recorder = Arc::new(RecordingDispatcher::new());
        let tracker = tracker_with(recorder.clone());

        let add = tracker.track_add_to_cart(vec![tent()]).await.unwrap();
        let checkout = tracker.track_checkout(vec![tent()]).await.unwrap();

        let session = tracker.sessions().current().await.unwrap();
        assert_eq!(add.event.cart_session_id(), Some(&session));
        assert_eq!(checkout.event.cart_session_id(), Some(&session));
    }

    #[tokio::test]
    async fn test_purchase_rotates_session_after_dispatch() {
        let recorder = Arc::new(RecordingDispatcher::new());
        let tracker = tracker_with(recorder.clone());

        let before = tracker.sessions().get_or_create_session_id().await;
        let tracked = tracker
            .track_purchase(vec![tent()], Decimal::new(10500, 2), None)
            .await
            .unwrap();

        assert_eq!(tracked.event.cart_session_id(), Some(&before));
        let json = tracked.event.to_json().unwrap();
        assert_eq!(json["commerce"]["order"]["priceTotal"], 105.0);
        assert_eq!(json["commerce"]["order"]["currencyCode"], "USD");

        let after = tracker.sessions().current().await.unwrap();
        assert_ne!(after, before);
    }

    #[tokio::test]
    async fn test_failed_purchase_keeps_session() {
        let tracker = tracker_with(Arc::new(OfflineDispatcher));

        let before = tracker.sessions().get_or_create_session_id().await;
        let tracked = tracker
            .track_purchase(vec![tent()], Decimal::from(50), Some(CurrencyCode::EUR))
            .await
            .unwrap();

        assert!(!tracked.dispatched);
        assert_eq!(tracked.event.event_type, EventType::Purchase);
        assert_eq!(tracker.sessions().current().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_login_then_logout() {
        let recorder = Arc::new(RecordingDispatcher::new());
        let tracker = tracker_with(recorder.clone());

        let login = tracker.login("Ann", "Ann@Example.com").await.unwrap();
        let json = login.event.to_json().unwrap();
        let tenant = &json["_techmarketingdemos"];
        assert_eq!(tenant["loginStatus"], "logged-in");
        assert_eq!(tenant["visitorType"], "Customer");
        assert_eq!(
            tenant["identities"]["hashedEmail"],
            hash_email("ann@example.com").as_str()
        );

        let view = tracker.track_product_view(&tent()).await;
        assert_eq!(
            view.event.to_json().unwrap()["_techmarketingdemos"]["loginStatus"],
            "logged-in"
        );

        let logout = tracker.logout().await;
        assert_eq!(logout.event.event_type, EventType::Logout);
        assert_eq!(
            logout.event.to_json().unwrap()["_techmarketingdemos"]["loginStatus"],
            "logged-in"
        );
        assert_eq!(tracker.profiles().load().await, None);

        let types: Vec<EventType> = recorder
            .events()
            .await
            .iter()
            .map(|e| e.event_type)
            .collect();
        assert_eq!(
            types,
            vec![EventType::Login, EventType::ProductView, EventType::Logout]
        );
    }

    #[tokio::test]
    async fn test_page_view_after_logout_carries_no_email() {
        let provider = Arc::new(StaticIdentityProvider::new(identities_with_email(
            "authenticated",
        )));
        let recorder = Arc::new(RecordingDispatcher::new());
        let tracker = tracker_with_provider(provider.clone(), recorder.clone());

        let login = tracker.login("Ann", "ann@x.com").await.unwrap();
        assert_eq!(
            login.event.to_json().unwrap()["_techmarketingdemos"]["identities"]["emailAddress"],
            "ann@x.com"
        );

        provider.replace(identities_with_email("loggedOut")).await;
        tracker.logout().await;

        let view = tracker.track_page_view(&PageView::new("home")).await;
        let json = view.event.to_json().unwrap();
        let tenant = &json["_techmarketingdemos"];
        assert_eq!(tenant["loginStatus"], "guest");
        assert_eq!(tenant["visitorType"], "Guest");
        assert_eq!(tenant["identities"], json!({"ecid": "e1"}));
    }

    #[tokio::test]
    async fn test_logged_out_sdk_email_is_not_attached() {
        let provider = Arc::new(StaticIdentityProvider::new(identities_with_email(
            "loggedOut",
        )));
        let tracker = tracker_with_provider(provider, Arc::new(RecordingDispatcher::new()));

        let view = tracker.track_page_view(&PageView::new("home")).await;
        let json = view.event.to_json().unwrap();
        let identities = &json["_techmarketingdemos"]["identities"];
        assert!(identities.get("emailAddress").is_none());
        assert!(identities.get("hashedEmail").is_none());
    }

    #[tokio::test]
    async fn test_invalid_login_sends_nothing() {
        let recorder = Arc::new(RecordingDispatcher::new());
        let tracker = tracker_with(recorder.clone());

        let err = tracker.login("Ann", "not-an-email").await.unwrap_err();
        assert!(matches!(err, TrackerError::Profile(_)));
        assert!(recorder.events().await.is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_failure_still_returns_event() {
        let tracker = tracker_with(Arc::new(OfflineDispatcher));
        let tracked = tracker.track_page_view(&PageView::new("home")).await;
        assert!(!tracked.dispatched);
        assert_eq!(tracked.event.event_type, EventType::PageView);
    }
}
