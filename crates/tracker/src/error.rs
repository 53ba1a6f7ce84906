//! Shared error types.
//!
//! Each module owns its error enum; [`TrackerError`] aggregates the ones that
//! can reach a caller of [`crate::Tracker`].

use thiserror::Error;

use crate::profile::ProfileError;
use crate::xdm::BuildError;

/// A call into a vendor SDK failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExternalError {
    /// The SDK reported a failure.
    #[error("{sdk} call failed: {message}")]
    Call { sdk: &'static str, message: String },

    /// The SDK is not initialized or not linked on this platform.
    #[error("{0} is unavailable")]
    Unavailable(&'static str),
}

impl ExternalError {
    /// Convenience constructor for [`ExternalError::Call`].
    pub fn call(sdk: &'static str, message: impl Into<String>) -> Self {
        Self::Call {
            sdk,
            message: message.into(),
        }
    }
}

/// Errors surfaced by [`crate::Tracker`] actions.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// An event could not be built from the supplied parameters.
    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    /// Login input was rejected.
    #[error("Profile error: {0}")]
    Profile(#[from] ProfileError),
}

/// Result type alias for `TrackerError`.
pub type Result<T> = std::result::Result<T, TrackerError>;
