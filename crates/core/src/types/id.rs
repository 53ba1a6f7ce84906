//! Newtype IDs for opaque string identifiers.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally passing an event id where a cart session id is expected.
//!
//! Generated ids share one shape: a millisecond epoch timestamp followed by a
//! 9-character lowercase base36 suffix, e.g. `1760000000000-k3j9x0a1q`.

use rand::Rng;

/// Length of the random base36 suffix appended to generated ids.
pub const RANDOM_SUFFIX_LEN: usize = 9;

/// Errors that can occur when parsing an id.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The input string is empty (after trimming).
    #[error("{kind} cannot be empty")]
    Empty {
        /// Name of the id type.
        kind: &'static str,
    },
}

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - `parse()` rejecting blank input, `as_str()`, `Display`
///
/// # Example
///
/// ```rust
/// # use aep_bootcamp_core::define_id;
/// define_id!(SurfaceId);
///
/// let surface = SurfaceId::parse("mobileapp://com.example/home").unwrap();
/// assert_eq!(surface.as_str(), "mobileapp://com.example/home");
/// assert!(SurfaceId::parse("  ").is_err());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Parse an id, rejecting empty or whitespace-only input.
            ///
            /// # Errors
            ///
            /// Returns `IdError::Empty` if the trimmed input is empty.
            pub fn parse(s: &str) -> ::core::result::Result<Self, $crate::types::id::IdError> {
                let s = s.trim();
                if s.is_empty() {
                    return Err($crate::types::id::IdError::Empty {
                        kind: stringify!($name),
                    });
                }
                Ok(Self(s.to_owned()))
            }

            /// Returns the id as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::types::id::IdError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(CartSessionId);
define_id!(EventId);

impl CartSessionId {
    /// Prefix carried by every generated cart session id.
    pub const PREFIX: &'static str = "cart";

    /// Generate a fresh `cart-{epochMillis}-{suffix}` id.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!(
            "{}-{}-{}",
            Self::PREFIX,
            epoch_millis(),
            random_suffix()
        ))
    }
}

impl EventId {
    /// Generate a fresh `{epochMillis}-{suffix}` event id.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("{}-{}", epoch_millis(), random_suffix()))
    }
}

/// Current wall clock time as milliseconds since the Unix epoch.
#[must_use]
pub fn epoch_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// A random lowercase base36 string of [`RANDOM_SUFFIX_LEN`] characters.
#[must_use]
pub fn random_suffix() -> String {
    let mut rng = rand::rng();
    (0..RANDOM_SUFFIX_LEN)
        .map(|_| char::from_digit(rng.random_range(0..36), 36).unwrap_or('0'))
        .collect()
}
