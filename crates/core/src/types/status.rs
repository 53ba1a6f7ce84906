//! Status enums carried on XDM events.

use serde::{Deserialize, Serialize};

/// Whether the current user is signed in.
///
/// Serialized as `logged-in` / `guest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum LoginStatus {
    LoggedIn,
    #[default]
    Guest,
}

/// Personalization segment derived from the login state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum VisitorType {
    Customer,
    #[default]
    Guest,
}

impl From<LoginStatus> for VisitorType {
    fn from(status: LoginStatus) -> Self {
        match status {
            LoginStatus::LoggedIn => Self::Customer,
            LoginStatus::Guest => Self::Guest,
        }
    }
}

/// The fixed set of XDM event types the builders produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "web.webpagedetails.pageViews")]
    PageView,
    #[serde(rename = "commerce.productViews")]
    ProductView,
    #[serde(rename = "commerce.productListAdds")]
    AddToCart,
    #[serde(rename = "commerce.checkouts")]
    Checkout,
    #[serde(rename = "commerce.purchases")]
    Purchase,
    #[serde(rename = "userAccount.login")]
    Login,
    #[serde(rename = "userAccount.logout")]
    Logout,
}

impl EventType {
    /// All event types, in funnel order.
    pub const ALL: [Self; 7] = [
        Self::PageView,
        Self::ProductView,
        Self::AddToCart,
        Self::Checkout,
        Self::Purchase,
        Self::Login,
        Self::Logout,
    ];

    /// The XDM `eventType` string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PageView => "web.webpagedetails.pageViews",
            Self::ProductView => "commerce.productViews",
            Self::AddToCart => "commerce.productListAdds",
            Self::Checkout => "commerce.checkouts",
            Self::Purchase => "commerce.purchases",
            Self::Login => "userAccount.login",
            Self::Logout => "userAccount.logout",
        }
    }

    /// True for events that must carry the active cart session.
    #[must_use]
    pub const fn is_cart_event(self) -> bool {
        matches!(self, Self::AddToCart | Self::Checkout | Self::Purchase)
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authentication state of an identity item, as reported by the identity SDK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum AuthenticatedState {
    #[default]
    Ambiguous,
    Authenticated,
    LoggedOut,
}

impl std::str::FromStr for AuthenticatedState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ambiguous" => Ok(Self::Ambiguous),
            "authenticated" => Ok(Self::Authenticated),
            "loggedOut" => Ok(Self::LoggedOut),
            _ => Err(format!("invalid authenticated state: {s}")),
        }
    }
}
