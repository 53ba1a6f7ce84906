//! AEP Bootcamp Tracker - client-side event bookkeeping.
//!
//! Glues operator and shopper actions to outbound XDM events:
//!
//! ```text
//! action -> IdentityResolver -> CartSessionManager -> xdm builder -> EdgeDispatcher
//! push SDK -> PushMessage -> is_adobe_message -> MessageRoute
//! ```
//!
//! # Architecture
//!
//! Vendor SDKs (identity, Edge, Messaging, Assurance, the push providers) are
//! external collaborators behind traits: [`identity::IdentityProvider`],
//! [`dispatch::EdgeDispatcher`], [`push::PushProvider`],
//! [`push::MessagingPlatform`] and [`sdk::MobileSdk`]. Everything in this
//! crate is best effort: store and SDK failures are logged and degraded,
//! never surfaced as crashes. Only configuration validation, login input and
//! hard-required builder parameters return errors.
//!
//! # Modules
//!
//! - [`store`] - Persistent key-value store (file and in-memory backends)
//! - [`session`] - Cart session id lifecycle
//! - [`profile`] - Logged-in user profile
//! - [`identity`] - Email hashing, tenant identities, identity snapshot cache
//! - [`xdm`] - XDM event payloads and their builders
//! - [`dispatch`] - Edge dispatch facade
//! - [`push`] - Push message classification and token lifecycle
//! - [`config`] - Environment configuration and the App ID / Assurance surface
//! - [`sdk`] - Forwarding validated configuration to the mobile SDK
//! - [`tracker`] - Per-action orchestration

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod dispatch;
pub mod error;
pub mod identity;
pub mod profile;
pub mod push;
pub mod sdk;
pub mod session;
pub mod store;
pub mod tracker;
pub mod xdm;

pub use config::{ConfigError, ConfigStore, TrackerConfig};
pub use dispatch::{DispatchError, EdgeDispatcher, LogDispatcher, RecordingDispatcher};
pub use error::{ExternalError, TrackerError};
pub use identity::{IdentityProvider, IdentityResolver, TenantIdentities, hash_email};
pub use profile::{ProfileError, ProfileStore, UserProfile};
pub use push::{
    MessageRoute, PushMessage, PushTokenManager, RepairReport, is_adobe_message, route_message,
};
pub use sdk::{MobileSdk, configure_sdk, start_assurance};
pub use session::CartSessionManager;
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};
pub use tracker::{Tracked, Tracker};
pub use xdm::{BuildError, Product, TenantNamespace, XdmEvent};
