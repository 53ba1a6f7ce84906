//! Cart session inspection.

use tracing::warn;

use crate::app::App;
use crate::output;

/// Print the active cart session id, creating one if needed.
pub async fn show(app: &App) {
    let id = app.tracker.sessions().get_or_create_session_id().await;
    if let Err(e) = output::line(id.as_str()) {
        warn!(error = %e, "Failed to write session id");
    }
}

/// Rotate the cart session id and print the new one.
pub async fn reset(app: &App) {
    let id = app.tracker.sessions().reset_session_id().await;
    if let Err(e) = output::line(id.as_str()) {
        warn!(error = %e, "Failed to write session id");
    }
}
