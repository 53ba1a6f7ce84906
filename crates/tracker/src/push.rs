//! Push message classification and token lifecycle.
//!
//! [`is_adobe_message`] is a pure predicate over an inbound payload.
//! [`PushTokenManager`] is constructed once at startup and passed to the
//! call sites that register or repair tokens.

use std::sync::Arc;

use aep_bootcamp_core::{PlatformKind, PushToken};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::ExternalError;
use crate::identity::IdentityResolver;

/// Data keys whose presence marks an Adobe-originated message.
pub const ADOBE_DATA_KEYS: &[&str] = &[
    "adb_uri",
    "adb_a_type",
    "adb_m_id",
    "adb_title",
    "adb_body",
    "adb_image",
    "_xdm",
    "_mId",
    "_dId",
];

/// Sender id substrings (case insensitive) that mark an Adobe-originated
/// message.
pub const ADOBE_SENDER_MARKERS: &[&str] = &["campaign", "journey", "adobe"];

const DEFAULT_NOTIFICATION_TITLE: &str = "New message";

/// Visible notification content of a push message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// Typed view over an inbound push payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushMessage {
    #[serde(default)]
    pub data: Map<String, Value>,
    /// Sender id reported by the push provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification: Option<NotificationContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
}

impl PushMessage {
    /// Lenient parse: fields of the wrong type are treated as absent.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let string = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_owned);
        let notification = value.get("notification").map(|n| NotificationContent {
            title: n.get("title").and_then(Value::as_str).map(str::to_owned),
            body: n.get("body").and_then(Value::as_str).map(str::to_owned),
        });

        Self {
            data: value
                .get("data")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default(),
            from: string("from"),
            notification,
            message_id: string("messageId"),
        }
    }

    fn data_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }
}

/// True when any Adobe marker matches.
///
/// Data keys count by presence, whatever their value; the sender id matches
/// on substring, ignoring case.
#[must_use]
pub fn is_adobe_message(message: &PushMessage) -> bool {
    ADOBE_DATA_KEYS
        .iter()
        .any(|key| message.data.contains_key(*key))
        || message.from.as_deref().is_some_and(|from| {
            let from = from.to_lowercase();
            ADOBE_SENDER_MARKERS
                .iter()
                .any(|marker| from.contains(marker))
        })
}

/// A notification the app schedules itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalNotification {
    pub title: String,
    pub body: String,
}

/// What to do with an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageRoute {
    /// The Messaging SDK renders and tracks it.
    Adobe,
    /// Schedule a local notification.
    Local(LocalNotification),
}

/// Route an inbound message. Pure; scheduling is up to the caller.
#[must_use]
pub fn route_message(message: &PushMessage) -> MessageRoute {
    if is_adobe_message(message) {
        return MessageRoute::Adobe;
    }

    let notification = message.notification.as_ref();
    let title = notification
        .and_then(|n| n.title.as_deref())
        .or_else(|| message.data_str("title"))
        .unwrap_or(DEFAULT_NOTIFICATION_TITLE);
    let body = notification
        .and_then(|n| n.body.as_deref())
        .or_else(|| message.data_str("body"))
        .unwrap_or_default();

    MessageRoute::Local(LocalNotification {
        title: title.to_owned(),
        body: body.to_owned(),
    })
}

// =============================================================================
// Token lifecycle
// =============================================================================

/// Platform push service (FCM, APNs, Expo) issuing raw tokens.
#[async_trait]
pub trait PushProvider: Send + Sync {
    /// Obtain a fresh token for `platform`.
    async fn acquire_token(&self, platform: PlatformKind) -> Result<String, ExternalError>;
}

/// Messaging SDK that delivers pushes to the registered token.
#[async_trait]
pub trait MessagingPlatform: Send + Sync {
    /// Register a token; an empty string clears the registration.
    async fn set_push_identifier(&self, token: &str) -> Result<(), ExternalError>;
}

/// Outcome of [`PushTokenManager::register`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub token: PushToken,
    /// The provider failed and a mock token was substituted.
    pub mock: bool,
    /// The token was accepted by the messaging platform.
    pub registered: bool,
}

/// Outcome of [`PushTokenManager::repair_token_mismatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepairReport {
    pub token_cleared: bool,
    pub identity_reset: bool,
}

impl RepairReport {
    /// Both steps succeeded.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.token_cleared && self.identity_reset
    }
}

/// Acquires, caches, registers and clears push tokens.
pub struct PushTokenManager {
    provider: Arc<dyn PushProvider>,
    platform: Arc<dyn MessagingPlatform>,
    identity: Arc<IdentityResolver>,
    cached: RwLock<Option<PushToken>>,
}

impl PushTokenManager {
    /// Create a manager.
    #[must_use]
    pub fn new(
        provider: Arc<dyn PushProvider>,
        platform: Arc<dyn MessagingPlatform>,
        identity: Arc<IdentityResolver>,
    ) -> Self {
        Self {
            provider,
            platform,
            identity,
            cached: RwLock::new(None),
        }
    }

    /// Acquire a token and register it.
    ///
    /// A provider failure yields a mock token so the rest of the flow can be
    /// exercised; mock tokens are cached but never registered.
    #[instrument(skip(self))]
    pub async fn register(&self, platform_kind: PlatformKind) -> Registration {
        let (value, mock) = match self.provider.acquire_token(platform_kind).await {
            Ok(value) if !value.trim().is_empty() => (value, false),
            Ok(_) => {
                warn!("Push provider returned an empty token, using a mock token");
                (mock_token(platform_kind), true)
            }
            Err(e) => {
                warn!(error = %e, "Push provider unavailable, using a mock token");
                (mock_token(platform_kind), true)
            }
        };

        let token = PushToken::new(value, platform_kind);
        *self.cached.write().await = Some(token.clone());

        let registered = if mock {
            false
        } else {
            match self.platform.set_push_identifier(&token.value).await {
                Ok(()) => {
                    info!(token_len = token.value.len(), "Push token registered");
                    true
                }
                Err(e) => {
                    warn!(error = %e, "Failed to register push token");
                    false
                }
            }
        };

        Registration {
            token,
            mock,
            registered,
        }
    }

    /// The token from the last registration attempt.
    pub async fn cached_token(&self) -> Option<PushToken> {
        self.cached.read().await.clone()
    }

    /// Clear the registered token (set it to an empty string).
    ///
    /// The cached token is dropped even when the platform call fails.
    ///
    /// # Errors
    ///
    /// Returns the platform error so the step can be retried.
    #[instrument(skip(self))]
    pub async fn clear_registered_token(&self) -> Result<(), ExternalError> {
        *self.cached.write().await = None;
        self.platform.set_push_identifier("").await
    }

    /// Reset identities and drop the cached identity snapshot.
    ///
    /// # Errors
    ///
    /// Returns the identity SDK error so the step can be retried.
    pub async fn reset_identity(&self) -> Result<(), ExternalError> {
        self.identity.reset().await
    }

    /// Repair a token mismatch: clear the token, then reset identity.
    ///
    /// A failing step is logged and the next one still runs.
    #[instrument(skip(self))]
    pub async fn repair_token_mismatch(&self) -> RepairReport {
        let token_cleared = match self.clear_registered_token().await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Failed to clear push token");
                false
            }
        };
        let identity_reset = match self.reset_identity().await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Failed to reset identity");
                false
            }
        };

        let report = RepairReport {
            token_cleared,
            identity_reset,
        };
        info!(?report, "Token mismatch repair finished");
        report
    }
}

impl std::fmt::Debug for PushTokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushTokenManager").finish_non_exhaustive()
    }
}

fn mock_token(platform_kind: PlatformKind) -> String {
    match platform_kind {
        PlatformKind::Expo => format!("ExponentPushToken[mock-{}]", Uuid::new_v4().simple()),
        PlatformKind::IosDevice | PlatformKind::AndroidFcm => {
            format!("mock-{platform_kind}-{}", Uuid::new_v4().simple())
        }
    }
}
