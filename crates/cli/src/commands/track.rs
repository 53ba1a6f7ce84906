//! Event tracking commands.
//!
//! Payloads are printed by the stdout dispatcher as they are sent.

use aep_bootcamp_core::CurrencyCode;
use aep_bootcamp_tracker::Tracked;
use aep_bootcamp_tracker::xdm::PageView;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::app::App;
use crate::product_arg::{ProductArg, into_products};

fn report(tracked: &Tracked) {
    if tracked.dispatched {
        info!(event_id = %tracked.event.id, event_type = %tracked.event.event_type, "Tracked");
    } else {
        warn!(event_id = %tracked.event.id, "Event built but not dispatched");
    }
}

/// Log in and send the login event.
///
/// # Errors
///
/// Returns an error if the name or email is invalid.
pub async fn login(app: &App, first_name: &str, email: &str) -> Result<(), Box<dyn std::error::Error>> {
    report(&app.tracker.login(first_name, email).await?);
    Ok(())
}

/// Send the logout event and clear the profile.
pub async fn logout(app: &App) {
    report(&app.tracker.logout().await);
}

/// Send a page view.
pub async fn page_view(app: &App, name: String, site_section: Option<String>, url: Option<String>) {
    let page = PageView {
        name,
        site_section,
        url,
    };
    report(&app.tracker.track_page_view(&page).await);
}

/// Send a product view.
pub async fn product_view(app: &App, product: ProductArg, category: Option<String>) {
    let ProductArg(mut product) = product;
    if category.is_some() {
        product.category = category;
    }
    report(&app.tracker.track_product_view(&product).await);
}

/// Send an add-to-cart event.
///
/// # Errors
///
/// Returns an error if the event cannot be built.
pub async fn add_to_cart(app: &App, products: Vec<ProductArg>) -> Result<(), Box<dyn std::error::Error>> {
    report(&app.tracker.track_add_to_cart(into_products(products)).await?);
    Ok(())
}

/// Send a checkout event.
///
/// # Errors
///
/// Returns an error if the event cannot be built.
pub async fn checkout(app: &App, products: Vec<ProductArg>) -> Result<(), Box<dyn std::error::Error>> {
    report(&app.tracker.track_checkout(into_products(products)).await?);
    Ok(())
}

/// Send a purchase event; the cart session rotates once it is sent.
///
/// # Errors
///
/// Returns an error if the event cannot be built.
pub async fn purchase(
    app: &App,
    products: Vec<ProductArg>,
    total: Decimal,
    currency: Option<CurrencyCode>,
) -> Result<(), Box<dyn std::error::Error>> {
    let tracked = app
        .tracker
        .track_purchase(into_products(products), total, currency)
        .await?;
    report(&tracked);
    Ok(())
}
