//! One pure builder per event type.
//!
//! Every builder resolves tenant identities, derives `loginStatus` /
//! `visitorType` from the profile, stamps a fresh `_id` and timestamp and
//! sets its counter to 1. Missing optional inputs degrade to guest or empty
//! values; only cart events without a cart session are rejected.

use aep_bootcamp_core::{CartSessionId, CurrencyCode, EventId, EventType, IdentityMap};
use chrono::Utc;
use rust_decimal::Decimal;

use super::products::{Product, format_product_items};
use super::{
    BuildError, Commerce, CommerceCart, Counter, LowerFunnel, Order, TenantBlock,
    TenantNamespace, TenantScoped, Web, WebPageDetails, XdmEvent,
};
use crate::identity::{IdentityInputs, TenantIdentities, build_tenant_identities};
use crate::profile::{UserProfile, login_status};

/// Inputs shared by every builder.
#[derive(Debug, Clone, Copy)]
pub struct EventContext<'a> {
    pub identity_map: &'a IdentityMap,
    pub profile: Option<&'a UserProfile>,
    pub tenant: &'a TenantNamespace,
}

impl<'a> EventContext<'a> {
    /// Context for a visitor without a profile.
    #[must_use]
    pub const fn guest(identity_map: &'a IdentityMap, tenant: &'a TenantNamespace) -> Self {
        Self {
            identity_map,
            profile: None,
            tenant,
        }
    }

    /// Attach a profile.
    #[must_use]
    pub const fn with_profile(mut self, profile: Option<&'a UserProfile>) -> Self {
        self.profile = profile;
        self
    }

    /// The profile email wins over an email identity from the SDK.
    fn tenant_identities(&self) -> TenantIdentities {
        let email = self
            .profile
            .map(|profile| profile.email.as_str())
            .or_else(|| self.identity_map.email());
        build_tenant_identities(&IdentityInputs {
            ecid: self.identity_map.ecid(),
            email,
            phone: self.identity_map.phone(),
        })
    }

    fn event(&self, event_type: EventType, cart_session_id: Option<&CartSessionId>) -> XdmEvent {
        let status = login_status(self.profile);
        XdmEvent {
            id: EventId::generate(),
            timestamp: Utc::now(),
            event_type,
            identity_map: self.identity_map.clone(),
            web: None,
            commerce: None,
            product_list_items: Vec::new(),
            tenant: TenantScoped {
                namespace: self.tenant.clone(),
                body: TenantBlock {
                    identities: self.tenant_identities(),
                    login_status: status,
                    visitor_type: status.into(),
                    lower_funnel: cart_session_id.map(|cart_id| LowerFunnel {
                        cart_id: cart_id.clone(),
                    }),
                },
            },
        }
    }
}

/// Page metadata for a page view.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageView {
    pub name: String,
    pub site_section: Option<String>,
    pub url: Option<String>,
}

impl PageView {
    /// A page view with only a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the site section.
    #[must_use]
    pub fn with_site_section(mut self, site_section: impl Into<String>) -> Self {
        self.site_section = Some(site_section.into());
        self
    }
}

/// Products added to the cart.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AddToCart {
    pub products: Vec<Product>,
    pub cart_session_id: Option<CartSessionId>,
}

/// Checkout started with the current cart contents.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Checkout {
    pub products: Vec<Product>,
    pub cart_session_id: Option<CartSessionId>,
}

/// A completed order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Purchase {
    pub products: Vec<Product>,
    pub cart_session_id: Option<CartSessionId>,
    pub total: Decimal,
    /// Defaults to USD.
    pub currency: Option<CurrencyCode>,
    /// Generated when absent.
    pub purchase_id: Option<String>,
}

/// `web.webpagedetails.pageViews`
#[must_use]
pub fn page_view(ctx: &EventContext<'_>, page: &PageView) -> XdmEvent {
    let mut event = ctx.event(EventType::PageView, None);
    event.web = Some(Web {
        web_page_details: WebPageDetails {
            name: page.name.clone(),
            site_section: page.site_section.clone(),
            url: page.url.clone(),
            page_views: Counter::ONE,
        },
    });
    event
}

/// `commerce.productViews`
#[must_use]
pub fn product_view(ctx: &EventContext<'_>, product: &Product) -> XdmEvent {
    let mut event = ctx.event(EventType::ProductView, None);
    event.commerce = Some(Commerce {
        product_views: Some(Counter::ONE),
        ..Commerce::default()
    });
    event.product_list_items = format_product_items(
        std::slice::from_ref(product),
        None,
        ctx.tenant,
        CurrencyCode::default(),
    );
    event
}

/// `commerce.productListAdds`
///
/// # Errors
///
/// Returns `BuildError::MissingCartSession` without a cart session id.
pub fn add_to_cart(ctx: &EventContext<'_>, params: &AddToCart) -> Result<XdmEvent, BuildError> {
    let cart_id = require_cart(EventType::AddToCart, params.cart_session_id.as_ref())?;
    let mut event = ctx.event(EventType::AddToCart, Some(cart_id));
    event.commerce = Some(Commerce {
        product_list_adds: Some(Counter::ONE),
        cart: Some(CommerceCart {
            cart_id: cart_id.clone(),
        }),
        ..Commerce::default()
    });
    event.product_list_items = format_product_items(
        &params.products,
        Some(cart_id),
        ctx.tenant,
        CurrencyCode::default(),
    );
    Ok(event)
}

/// `commerce.checkouts`
///
/// # Errors
///
/// Returns `BuildError::MissingCartSession` without a cart session id.
pub fn checkout(ctx: &EventContext<'_>, params: &Checkout) -> Result<XdmEvent, BuildError> {
    let cart_id = require_cart(EventType::Checkout, params.cart_session_id.as_ref())?;
    let mut event = ctx.event(EventType::Checkout, Some(cart_id));
    event.commerce = Some(Commerce {
        checkouts: Some(Counter::ONE),
        cart: Some(CommerceCart {
            cart_id: cart_id.clone(),
        }),
        ..Commerce::default()
    });
    event.product_list_items = format_product_items(
        &params.products,
        Some(cart_id),
        ctx.tenant,
        CurrencyCode::default(),
    );
    Ok(event)
}

/// `commerce.purchases`
///
/// # Errors
///
/// Returns `BuildError::MissingCartSession` without a cart session id.
pub fn purchase(ctx: &EventContext<'_>, params: &Purchase) -> Result<XdmEvent, BuildError> {
    let cart_id = require_cart(EventType::Purchase, params.cart_session_id.as_ref())?;
    let currency_code = params.currency.unwrap_or_default();
    let purchase_id = params
        .purchase_id
        .clone()
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| format!("order-{}", EventId::generate()));

    let mut event = ctx.event(EventType::Purchase, Some(cart_id));
    event.commerce = Some(Commerce {
        purchases: Some(Counter::ONE),
        cart: Some(CommerceCart {
            cart_id: cart_id.clone(),
        }),
        order: Some(Order {
            purchase_id,
            price_total: params.total,
            currency_code,
        }),
        ..Commerce::default()
    });
    event.product_list_items =
        format_product_items(&params.products, Some(cart_id), ctx.tenant, currency_code);
    Ok(event)
}

/// `userAccount.login`
#[must_use]
pub fn login(ctx: &EventContext<'_>) -> XdmEvent {
    ctx.event(EventType::Login, None)
}

/// `userAccount.logout`
#[must_use]
pub fn logout(ctx: &EventContext<'_>) -> XdmEvent {
    ctx.event(EventType::Logout, None)
}

fn require_cart(
    event_type: EventType,
    cart_session_id: Option<&CartSessionId>,
) -> Result<&CartSessionId, BuildError> {
    cart_session_id.ok_or(BuildError::MissingCartSession(event_type))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use aep_bootcamp_core::{AuthenticatedState, Email, IdentityItem, namespaces};
    use serde_json::{Value, json};

    use super::*;
    use crate::identity::hash_email;

    fn identity_map() -> IdentityMap {
        IdentityMap::new().with_identity(
            namespaces::ECID,
            IdentityItem::new("ecid-1", AuthenticatedState::Ambiguous, true),
        )
    }

    fn ann() -> UserProfile {
        UserProfile {
            first_name: "Ann".to_string(),
            email: Email::parse("ann@x.com").unwrap(),
        }
    }

    fn cart() -> CartSessionId {
        CartSessionId::parse("cart-1-abc").unwrap()
    }

    fn tent() -> Product {
        Product::new("S1", "Tent", Decimal::from(50))
    }

    fn all_events(ctx: &EventContext<'_>) -> Vec<XdmEvent> {
        vec![
            page_view(ctx, &PageView::new("home")),
            product_view(ctx, &tent()),
            add_to_cart(
                ctx,
                &AddToCart {
                    products: vec![tent()],
                    cart_session_id: Some(cart()),
                },
            )
            .unwrap(),
            checkout(
                ctx,
                &Checkout {
                    products: vec![tent()],
                    cart_session_id: Some(cart()),
                },
            )
            .unwrap(),
            purchase(
                ctx,
                &Purchase {
                    products: vec![tent()],
                    cart_session_id: Some(cart()),
                    total: Decimal::from(50),
                    ..Purchase::default()
                },
            )
            .unwrap(),
            login(ctx),
            logout(ctx),
        ]
    }

    #[test]
    fn test_every_event_has_id_and_timestamp() {
        let re = regex::Regex::new(r"^\d+-[0-9a-z]{6,}$").unwrap();
        let map = identity_map();
        let tenant = TenantNamespace::default();
        let profile = ann();
        let ctx = EventContext::guest(&map, &tenant).with_profile(Some(&profile));

        let events = all_events(&ctx);
        assert_eq!(events.len(), EventType::ALL.len());
        for (event, expected_type) in events.iter().zip(EventType::ALL) {
            assert_eq!(event.event_type, expected_type);
            let json = event.to_json().unwrap();
            let id = json["_id"].as_str().unwrap();
            assert!(re.is_match(id), "bad id {id}");
            let timestamp = json["timestamp"].as_str().unwrap();
            assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
            assert_eq!(json["eventType"], expected_type.as_str());
        }
    }

    #[test]
    fn test_ids_are_unique() {
        let map = identity_map();
        let tenant = TenantNamespace::default();
        let ctx = EventContext::guest(&map, &tenant);
        let ids: std::collections::HashSet<String> = (0..100)
            .map(|_| login(&ctx).id.as_str().to_owned())
            .collect();
        assert_eq!(ids.len(), 100);
    }

    #[test]
    fn test_counters_fixed_at_one() {
        let map = identity_map();
        let tenant = TenantNamespace::default();
        let ctx = EventContext::guest(&map, &tenant);
        let events: Vec<Value> = all_events(&ctx)
            .iter()
            .map(|event| event.to_json().unwrap())
            .collect();

        assert_eq!(events[0]["web"]["webPageDetails"]["pageViews"]["value"], 1);
        assert_eq!(events[1]["commerce"]["productViews"]["value"], 1);
        assert_eq!(events[2]["commerce"]["productListAdds"]["value"], 1);
        assert_eq!(events[3]["commerce"]["checkouts"]["value"], 1);
        assert_eq!(events[4]["commerce"]["purchases"]["value"], 1);
        assert!(events[5].get("commerce").is_none());
    }

    #[test]
    fn test_guest_page_view() {
        let map = IdentityMap::new();
        let tenant = TenantNamespace::default();
        let ctx = EventContext::guest(&map, &tenant);
        let json = page_view(&ctx, &PageView::new("cart").with_site_section("commerce"))
            .to_json()
            .unwrap();

        let block = &json["_techmarketingdemos"];
        assert_eq!(block["loginStatus"], "guest");
        assert_eq!(block["visitorType"], "Guest");
        assert_eq!(block["identities"], json!({}));
        assert!(block.get("lowerFunnel").is_none());
        assert_eq!(json["web"]["webPageDetails"]["name"], "cart");
        assert_eq!(json["web"]["webPageDetails"]["siteSection"], "commerce");
        assert_eq!(json["identityMap"], json!({}));
    }

    #[test]
    fn test_logged_in_identities() {
        let map = identity_map();
        let tenant = TenantNamespace::default();
        let profile = ann();
        let ctx = EventContext::guest(&map, &tenant).with_profile(Some(&profile));
        let json = login(&ctx).to_json().unwrap();

        let block = &json["_techmarketingdemos"];
        assert_eq!(block["loginStatus"], "logged-in");
        assert_eq!(block["visitorType"], "Customer");
        assert_eq!(
            block["identities"],
            json!({
                "ecid": "ecid-1",
                "emailAddress": "ann@x.com",
                "hashedEmail": hash_email("ann@x.com"),
            })
        );
        assert_eq!(json["identityMap"]["ECID"][0]["id"], "ecid-1");
    }

    #[test]
    fn test_identity_map_email_used_without_profile() {
        let map = identity_map().with_identity(
            namespaces::EMAIL,
            IdentityItem::new("bob@x.com", AuthenticatedState::Authenticated, false),
        );
        let tenant = TenantNamespace::default();
        let ctx = EventContext::guest(&map, &tenant);
        let json = logout(&ctx).to_json().unwrap();
        assert_eq!(
            json["_techmarketingdemos"]["identities"]["hashedEmail"],
            hash_email("bob@x.com")
        );
        assert_eq!(json["_techmarketingdemos"]["loginStatus"], "guest");
    }

    #[test]
    fn test_add_to_cart_line_item() {
        let map = identity_map();
        let tenant = TenantNamespace::default();
        let profile = ann();
        let ctx = EventContext::guest(&map, &tenant).with_profile(Some(&profile));
        let event = add_to_cart(
            &ctx,
            &AddToCart {
                products: vec![tent()],
                cart_session_id: Some(cart()),
            },
        )
        .unwrap();
        assert_eq!(event.cart_session_id(), Some(&cart()));

        let json = event.to_json().unwrap();
        let item = &json["productListItems"][0];
        assert_eq!(item["SKU"], "S1");
        assert_eq!(item["priceTotal"], 50.0);
        assert_eq!(item["quantity"], 1);
        assert_eq!(
            item["_techmarketingdemos"]["lowerFunnel"]["cartID"],
            "cart-1-abc"
        );
        assert_eq!(json["commerce"]["cart"]["cartID"], "cart-1-abc");
        assert_eq!(
            json["_techmarketingdemos"]["lowerFunnel"]["cartID"],
            "cart-1-abc"
        );
    }

    #[test]
    fn test_product_view_has_no_cart() {
        let map = identity_map();
        let tenant = TenantNamespace::default();
        let ctx = EventContext::guest(&map, &tenant);
        let json = product_view(&ctx, &tent()).to_json().unwrap();
        assert_eq!(json["productListItems"][0]["SKU"], "S1");
        assert!(json["productListItems"][0].get("_techmarketingdemos").is_none());
        assert!(json["commerce"].get("cart").is_none());
    }

    #[test]
    fn test_purchase_defaults_currency_to_usd() {
        let map = identity_map();
        let tenant = TenantNamespace::default();
        let ctx = EventContext::guest(&map, &tenant);
        let json = purchase(
            &ctx,
            &Purchase {
                products: vec![tent().with_quantity(2)],
                cart_session_id: Some(cart()),
                total: Decimal::new(10500, 2),
                currency: None,
                purchase_id: None,
            },
        )
        .unwrap()
        .to_json()
        .unwrap();

        let order = &json["commerce"]["order"];
        assert_eq!(order["currencyCode"], "USD");
        assert_eq!(order["priceTotal"], 105.0);
        assert!(order["purchaseID"].as_str().unwrap().starts_with("order-"));
        assert_eq!(json["productListItems"][0]["currencyCode"], "USD");
        assert_eq!(json["productListItems"][0]["quantity"], 2);
    }

    #[test]
    fn test_purchase_keeps_explicit_currency_and_id() {
        let map = IdentityMap::new();
        let tenant = TenantNamespace::default();
        let ctx = EventContext::guest(&map, &tenant);
        let event = purchase(
            &ctx,
            &Purchase {
                cart_session_id: Some(cart()),
                total: Decimal::from(20),
                currency: Some(CurrencyCode::EUR),
                purchase_id: Some("PO-7".to_string()),
                ..Purchase::default()
            },
        )
        .unwrap();
        let order = event.commerce.unwrap().order.unwrap();
        assert_eq!(order.currency_code, CurrencyCode::EUR);
        assert_eq!(order.purchase_id, "PO-7");
        assert!(event.product_list_items.is_empty());
    }

    #[test]
    fn test_cart_events_require_session() {
        let map = IdentityMap::new();
        let tenant = TenantNamespace::default();
        let ctx = EventContext::guest(&map, &tenant);

        assert_eq!(
            add_to_cart(&ctx, &AddToCart::default()).unwrap_err(),
            BuildError::MissingCartSession(EventType::AddToCart)
        );
        assert_eq!(
            checkout(&ctx, &Checkout::default()).unwrap_err(),
            BuildError::MissingCartSession(EventType::Checkout)
        );
        assert_eq!(
            purchase(&ctx, &Purchase::default()).unwrap_err(),
            BuildError::MissingCartSession(EventType::Purchase)
        );
    }

    #[test]
    fn test_checkout_without_products() {
        let map = IdentityMap::new();
        let tenant = TenantNamespace::default();
        let ctx = EventContext::guest(&map, &tenant);
        let json = checkout(
            &ctx,
            &Checkout {
                products: Vec::new(),
                cart_session_id: Some(cart()),
            },
        )
        .unwrap()
        .to_json()
        .unwrap();
        assert!(json.get("productListItems").is_none());
        assert_eq!(json["commerce"]["checkouts"]["value"], 1);
    }
}
