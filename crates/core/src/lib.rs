//! AEP Bootcamp Core - Shared types library.
//!
//! This crate provides common types used across all bootcamp components:
//! - `tracker` - Session, identity, XDM event and push token bookkeeping
//! - `cli` - Command-line operator tool replacing the configuration screens
//!
//! # Architecture
//!
//! The core crate contains only types and pure helpers - no I/O, no storage,
//! no SDK calls. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, emails, identities, push
//!   tokens and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
