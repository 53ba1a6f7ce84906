//! App ID and Assurance URL configuration.

use aep_bootcamp_tracker::{configure_sdk, start_assurance};
use serde_json::json;
use tracing::info;

use crate::app::App;
use crate::output;

/// Save the App ID, then configure the SDK with the stored value.
///
/// # Errors
///
/// Returns an error if the App ID is blank, the store fails, or the SDK
/// rejects it.
pub async fn set_app_id(app: &App, app_id: &str) -> Result<(), Box<dyn std::error::Error>> {
    app.config.set_app_id(app_id).await?;
    let forwarded = configure_sdk(&app.config, &app.sdk).await?;
    info!("App ID configured");
    output::line(&forwarded)?;
    Ok(())
}

/// Save the Assurance URL, then start a session with the stored value.
///
/// # Errors
///
/// Returns an error if the URL is invalid, the store fails, or the SDK
/// rejects it.
pub async fn set_assurance_url(app: &App, url: &str) -> Result<(), Box<dyn std::error::Error>> {
    app.config.set_assurance_url(url).await?;
    let forwarded = start_assurance(&app.config, &app.sdk).await?;
    output::line(&forwarded)?;
    Ok(())
}

/// Print the stored configuration.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
pub async fn show(app: &App) -> Result<(), Box<dyn std::error::Error>> {
    output::json(&json!({
        "appId": app.config.app_id().await?,
        "assuranceUrl": app.config.assurance_url().await?,
        "tenant": app.tracker.tenant().as_str(),
    }))
}
