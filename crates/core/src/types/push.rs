//! Push token types.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Which push service issued a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlatformKind {
    /// Expo push service token (`ExponentPushToken[...]`).
    Expo,
    /// Raw APNs device token.
    IosDevice,
    /// Firebase Cloud Messaging registration token.
    AndroidFcm,
}

impl PlatformKind {
    /// Wire name of the platform.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Expo => "expo",
            Self::IosDevice => "ios-device",
            Self::AndroidFcm => "android-fcm",
        }
    }
}

impl fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PlatformKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "expo" => Ok(Self::Expo),
            "ios-device" | "ios" => Ok(Self::IosDevice),
            "android-fcm" | "android" | "fcm" => Ok(Self::AndroidFcm),
            _ => Err(format!("invalid push platform: {s}")),
        }
    }
}

/// A push token obtained from a platform push service.
///
/// `Debug` shows only the platform and token length so tokens stay out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushToken {
    pub value: String,
    pub platform_kind: PlatformKind,
}

impl PushToken {
    /// Create a push token.
    #[must_use]
    pub fn new(value: impl Into<String>, platform_kind: PlatformKind) -> Self {
        Self {
            value: value.into(),
            platform_kind,
        }
    }

    /// True when the token carries no value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.value.trim().is_empty()
    }
}

impl fmt::Debug for PushToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PushToken")
            .field("value", &format_args!("[{} chars]", self.value.len()))
            .field("platform_kind", &self.platform_kind)
            .finish()
    }
}
