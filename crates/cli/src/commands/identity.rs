//! Identity helpers.

use aep_bootcamp_tracker::hash_email as privacy_hash;

use crate::output;

/// Print the privacy hash of `email`.
///
/// # Errors
///
/// Returns an error if stdout cannot be written.
pub fn hash_email(email: &str) -> Result<(), Box<dyn std::error::Error>> {
    output::line(&privacy_hash(email))?;
    Ok(())
}
