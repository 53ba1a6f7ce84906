//! Product line items.

use aep_bootcamp_core::{CartSessionId, CurrencyCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{LowerFunnel, TenantNamespace, TenantScoped};

const fn default_quantity() -> u32 {
    1
}

/// A product as the shopping screens know it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub sku: String,
    pub name: String,
    /// Per-unit price.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Product {
    /// A single unit of a product.
    #[must_use]
    pub fn new(sku: impl Into<String>, name: impl Into<String>, price: Decimal) -> Self {
        Self {
            sku: sku.into(),
            name: name.into(),
            price,
            quantity: 1,
            category: None,
        }
    }

    /// Set the quantity.
    #[must_use]
    pub const fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    /// Set the category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// Line item tenant block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemTenantBlock {
    pub lower_funnel: LowerFunnel,
}

/// XDM `productListItems` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListItem {
    #[serde(rename = "SKU")]
    pub sku: String,
    pub name: String,
    pub quantity: u32,
    /// Per-unit price of the product.
    #[serde(with = "rust_decimal::serde::float")]
    pub price_total: Decimal,
    pub currency_code: CurrencyCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_category: Option<String>,
    #[serde(flatten)]
    pub tenant: Option<TenantScoped<ItemTenantBlock>>,
}

/// Format products as line items.
///
/// Order and quantities are kept verbatim. Each item is tagged with the cart
/// session (when known) under the tenant namespace.
#[must_use]
pub fn format_product_items(
    products: &[Product],
    cart_session_id: Option<&CartSessionId>,
    tenant: &TenantNamespace,
    currency_code: CurrencyCode,
) -> Vec<ProductListItem> {
    products
        .iter()
        .map(|product| ProductListItem {
            sku: product.sku.clone(),
            name: product.name.clone(),
            quantity: product.quantity,
            price_total: product.price,
            currency_code,
            product_category: product.category.clone(),
            tenant: cart_session_id.map(|cart_id| TenantScoped {
                namespace: tenant.clone(),
                body: ItemTenantBlock {
                    lower_funnel: LowerFunnel {
                        cart_id: cart_id.clone(),
                    },
                },
            }),
        })
        .collect()
}
