//! Typed identity map.
//!
//! The identity SDK hands back a loosely structured JSON object of
//! namespace -> list of identity items. [`IdentityMap::from_value`] validates
//! it once at the boundary so the rest of the code never chains optional
//! lookups through raw JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::status::AuthenticatedState;

/// Well-known identity namespaces.
pub mod namespaces {
    /// Experience Cloud ID.
    pub const ECID: &str = "ECID";
    /// Authenticated email address.
    pub const EMAIL: &str = "Email";
    /// Authenticated phone number.
    pub const PHONE: &str = "Phone";
}

/// A single identity within a namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityItem {
    pub id: String,
    #[serde(default)]
    pub authenticated_state: AuthenticatedState,
    #[serde(default)]
    pub primary: bool,
}

impl IdentityItem {
    /// Create an identity item.
    #[must_use]
    pub fn new(id: impl Into<String>, authenticated_state: AuthenticatedState, primary: bool) -> Self {
        Self {
            id: id.into(),
            authenticated_state,
            primary,
        }
    }

    /// Lenient parse: requires a non-empty string `id`, defaults the rest.
    fn from_value(value: &Value) -> Option<Self> {
        let id = value.get("id")?.as_str()?.trim();
        if id.is_empty() {
            return None;
        }

        let authenticated_state = value
            .get("authenticatedState")
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
            .unwrap_or_default();
        let primary = value
            .get("primary")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        Some(Self::new(id, authenticated_state, primary))
    }
}

/// Namespace -> identity items, as serialized into the XDM `identityMap`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityMap(BTreeMap<String, Vec<IdentityItem>>);

impl IdentityMap {
    /// Create an empty identity map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an identity map from an SDK response.
    ///
    /// Accepts either the bare map or an object wrapping it under
    /// `identityMap`. Namespaces that are not arrays and items without a
    /// usable `id` are skipped; anything unrecognisable yields an empty map.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let map = value.get("identityMap").unwrap_or(value);
        let Some(object) = map.as_object() else {
            return Self::default();
        };

        let mut identities = BTreeMap::new();
        for (namespace, items) in object {
            let Some(items) = items.as_array() else {
                continue;
            };
            let parsed: Vec<IdentityItem> =
                items.iter().filter_map(IdentityItem::from_value).collect();
            if !parsed.is_empty() {
                identities.insert(namespace.clone(), parsed);
            }
        }
        Self(identities)
    }

    /// Add an identity, returning the map (builder style).
    #[must_use]
    pub fn with_identity(mut self, namespace: &str, item: IdentityItem) -> Self {
        self.insert(namespace, item);
        self
    }

    /// Add an identity to a namespace.
    pub fn insert(&mut self, namespace: &str, item: IdentityItem) {
        self.0.entry(namespace.to_owned()).or_default().push(item);
    }

    /// Items in a namespace (empty if the namespace is absent).
    #[must_use]
    pub fn items(&self, namespace: &str) -> &[IdentityItem] {
        self.0.get(namespace).map_or(&[], Vec::as_slice)
    }

    /// The primary id in a namespace, falling back to the first one.
    #[must_use]
    pub fn first_id(&self, namespace: &str) -> Option<&str> {
        let items = self.items(namespace);
        items
            .iter()
            .find(|item| item.primary)
            .or_else(|| items.first())
            .map(|item| item.id.as_str())
    }

    /// The device's Experience Cloud ID, if known.
    #[must_use]
    pub fn ecid(&self) -> Option<&str> {
        self.first_id(namespaces::ECID)
    }

    /// The first `authenticated` id in a namespace. Ambiguous and
    /// logged-out items are ignored.
    #[must_use]
    pub fn authenticated_id(&self, namespace: &str) -> Option<&str> {
        self.items(namespace)
            .iter()
            .find(|item| item.authenticated_state == AuthenticatedState::Authenticated)
            .map(|item| item.id.as_str())
    }

    /// The authenticated email identity, if any.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.authenticated_id(namespaces::EMAIL)
    }

    /// The authenticated phone identity, if any.
    #[must_use]
    pub fn phone(&self) -> Option<&str> {
        self.authenticated_id(namespaces::PHONE)
    }

    /// True when no namespace carries an identity.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
