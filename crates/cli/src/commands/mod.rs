//! Subcommand implementations.

pub mod config;
pub mod identity;
pub mod push;
pub mod session;
pub mod track;
