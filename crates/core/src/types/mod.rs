//! Core types for the AEP bootcamp.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod identity;
pub mod price;
pub mod push;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use identity::{IdentityItem, IdentityMap, namespaces};
pub use price::{CurrencyCode, CurrencyCodeError, Price};
pub use push::{PlatformKind, PushToken};
pub use status::*;
