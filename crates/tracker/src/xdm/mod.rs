//! XDM event payloads.
//!
//! [`XdmEvent`] is the one payload shape dispatched to Edge. Blocks that only
//! some event types carry are optional and skipped when absent. The tenant
//! block is keyed by the configured [`TenantNamespace`] and flattened into
//! the top level of the event.
//!
//! Builders live in [`builders`]; product line items in [`products`].

pub mod builders;
pub mod products;

use aep_bootcamp_core::{
    CartSessionId, CurrencyCode, EventId, EventType, IdentityMap, LoginStatus, VisitorType,
};
use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::identity::TenantIdentities;

pub use builders::{
    AddToCart, Checkout, EventContext, PageView, Purchase, add_to_cart, checkout, login, logout,
    page_view, product_view, purchase,
};
pub use products::{Product, ProductListItem, format_product_items};

/// Errors that can occur when building an event.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    /// A cart event was built without the active cart session.
    #[error("{0} requires an active cart session id")]
    MissingCartSession(EventType),

    /// The tenant namespace is not a valid XDM tenant key.
    #[error("invalid tenant namespace {0:?}: must start with '_' and contain no '.'")]
    InvalidTenant(String),
}

/// XDM tenant namespace key, e.g. `_techmarketingdemos`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TenantNamespace(String);

impl TenantNamespace {
    /// Namespace used when none is configured.
    pub const DEFAULT: &'static str = "_techmarketingdemos";

    /// Parse a tenant namespace.
    ///
    /// # Errors
    ///
    /// Returns `BuildError::InvalidTenant` unless the key starts with `_`,
    /// has at least one more character, and contains no `.`.
    pub fn parse(s: &str) -> Result<Self, BuildError> {
        let s = s.trim();
        if s.len() < 2 || !s.starts_with('_') || s.contains('.') {
            return Err(BuildError::InvalidTenant(s.to_owned()));
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns the namespace key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TenantNamespace {
    fn default() -> Self {
        Self(Self::DEFAULT.to_owned())
    }
}

impl std::fmt::Display for TenantNamespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A value serialized under the tenant namespace key: `{"_tenant": value}`.
///
/// Flattened into its parent so the tenant key sits beside standard fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantScoped<T> {
    pub namespace: TenantNamespace,
    pub body: T,
}

impl<T: Serialize> Serialize for TenantScoped<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.namespace.as_str(), &self.body)?;
        map.end()
    }
}

/// A counter fixed at 1 per dispatched event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Counter {
    pub value: u32,
}

impl Counter {
    /// The only value builders ever emit.
    pub const ONE: Self = Self { value: 1 };
}

/// Cart correlation block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LowerFunnel {
    #[serde(rename = "cartID")]
    pub cart_id: CartSessionId,
}

/// Tenant block carried by every event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantBlock {
    pub identities: TenantIdentities,
    pub login_status: LoginStatus,
    pub visitor_type: VisitorType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lower_funnel: Option<LowerFunnel>,
}

/// `web` block for page views.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Web {
    pub web_page_details: WebPageDetails,
}

/// Page metadata plus the page view counter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebPageDetails {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_section: Option<String>,
    #[serde(rename = "URL", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub page_views: Counter,
}

/// `commerce` block; exactly one counter is set per event.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Commerce {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_views: Option<Counter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_list_adds: Option<Counter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkouts: Option<Counter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchases: Option<Counter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cart: Option<CommerceCart>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<Order>,
}

/// Standard XDM cart reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommerceCart {
    #[serde(rename = "cartID")]
    pub cart_id: CartSessionId,
}

/// Order totals for purchases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "purchaseID")]
    pub purchase_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price_total: Decimal,
    pub currency_code: CurrencyCode,
}

/// One structured event, built by [`builders`] and handed to the dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct XdmEvent {
    #[serde(rename = "_id")]
    pub id: EventId,
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub event_type: EventType,
    pub identity_map: IdentityMap,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web: Option<Web>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commerce: Option<Commerce>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub product_list_items: Vec<ProductListItem>,
    #[serde(flatten)]
    pub tenant: TenantScoped<TenantBlock>,
}

impl XdmEvent {
    /// The cart session the event is tied to, if any.
    #[must_use]
    pub fn cart_session_id(&self) -> Option<&CartSessionId> {
        self.tenant
            .body
            .lower_funnel
            .as_ref()
            .map(|lower_funnel| &lower_funnel.cart_id)
    }

    /// Serialize to the JSON payload sent to Edge.
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if serialization fails.
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// ISO 8601 with millisecond precision and a `Z` suffix.
fn serialize_timestamp<S: Serializer>(
    timestamp: &DateTime<Utc>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&timestamp.to_rfc3339_opts(SecondsFormat::Millis, true))
}
