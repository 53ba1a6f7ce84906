//! Logged-in user profile.
//!
//! The store is the source of truth; an in-memory mirror keeps the last known
//! profile so a failing store degrades to "this process only" instead of
//! logging the user out.

use std::sync::Arc;

use aep_bootcamp_core::{Email, EmailError, LoginStatus};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use crate::identity::hash_email;
use crate::store::{self, KeyValueStore, keys};

/// Errors that can occur when logging in.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// The first name is blank.
    #[error("first name cannot be empty")]
    EmptyFirstName,

    /// The email does not look like an address.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),
}

/// The profile captured on the login screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub first_name: String,
    pub email: Email,
}

impl UserProfile {
    /// `logged-in` when the profile has a name, `guest` otherwise.
    #[must_use]
    pub fn login_status(&self) -> LoginStatus {
        if self.first_name.trim().is_empty() {
            LoginStatus::Guest
        } else {
            LoginStatus::LoggedIn
        }
    }
}

/// Login status for an optional profile; no profile means guest.
#[must_use]
pub fn login_status(profile: Option<&UserProfile>) -> LoginStatus {
    profile.map_or(LoginStatus::Guest, UserProfile::login_status)
}

#[derive(Debug, Clone)]
enum Mirror {
    Unloaded,
    Loaded(Option<UserProfile>),
}

/// Persists the [`UserProfile`] across restarts.
pub struct ProfileStore {
    store: Arc<dyn KeyValueStore>,
    mirror: RwLock<Mirror>,
}

impl ProfileStore {
    /// Create a profile store over the shared key-value store.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            mirror: RwLock::new(Mirror::Unloaded),
        }
    }

    /// Validate and persist a profile.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError` if the first name is blank or the email is
    /// invalid. Store failures are logged; the profile is still kept for the
    /// lifetime of the process.
    #[instrument(skip_all)]
    pub async fn login(&self, first_name: &str, email: &str) -> Result<UserProfile, ProfileError> {
        let first_name = first_name.trim();
        if first_name.is_empty() {
            return Err(ProfileError::EmptyFirstName);
        }
        let profile = UserProfile {
            first_name: first_name.to_owned(),
            email: Email::parse(email)?,
        };

        if let Err(e) = store::set_json(self.store.as_ref(), keys::USER_PROFILE, &profile).await {
            warn!(error = %e, "Failed to persist user profile, keeping it in memory");
        }
        *self.mirror.write().await = Mirror::Loaded(Some(profile.clone()));

        info!(
            hashed_email = %hash_email(profile.email.as_str()),
            "User logged in"
        );
        Ok(profile)
    }

    /// Clear the profile. Never fails; store errors are logged.
    #[instrument(skip_all)]
    pub async fn logout(&self) {
        if let Err(e) = self.store.remove(keys::USER_PROFILE).await {
            warn!(error = %e, "Failed to remove stored user profile");
        }
        *self.mirror.write().await = Mirror::Loaded(None);
        info!("User logged out");
    }

    /// The current profile, reading the store on first use.
    ///
    /// A failing store or a corrupt stored profile reads as "no profile".
    pub async fn load(&self) -> Option<UserProfile> {
        if let Mirror::Loaded(profile) = &*self.mirror.read().await {
            return profile.clone();
        }

        let mut mirror = self.mirror.write().await;
        if let Mirror::Loaded(profile) = &*mirror {
            return profile.clone();
        }

        let profile = match store::get_json::<UserProfile>(self.store.as_ref(), keys::USER_PROFILE).await
        {
            Ok(profile) => profile,
            Err(e) => {
                warn!(error = %e, "Could not read user profile, treating user as guest");
                None
            }
        };
        *mirror = Mirror::Loaded(profile.clone());
        profile
    }
}

impl std::fmt::Debug for ProfileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileStore").finish_non_exhaustive()
    }
}
