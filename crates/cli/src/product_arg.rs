//! `SKU:NAME:PRICE[:QTY]` product arguments.

use std::str::FromStr;

use aep_bootcamp_tracker::Product;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors parsing a product argument.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProductArgError {
    #[error("expected SKU:NAME:PRICE[:QTY], got {0:?}")]
    Format(String),
    #[error("invalid price {0:?}")]
    Price(String),
    #[error("invalid quantity {0:?}")]
    Quantity(String),
}

/// A product given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductArg(pub Product);

impl FromStr for ProductArg {
    type Err = ProductArgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').map(str::trim).collect();
        let (sku, name, price, quantity) = match parts.as_slice() {
            [sku, name, price] => (*sku, *name, *price, None),
            [sku, name, price, quantity] => (*sku, *name, *price, Some(*quantity)),
            _ => return Err(ProductArgError::Format(s.to_owned())),
        };
        if sku.is_empty() || name.is_empty() {
            return Err(ProductArgError::Format(s.to_owned()));
        }

        let price = Decimal::from_str(price).map_err(|_| ProductArgError::Price(price.to_owned()))?;
        let mut product = Product::new(sku, name, price);
        if let Some(quantity) = quantity {
            let quantity = quantity
                .parse::<u32>()
                .ok()
                .filter(|q| *q > 0)
                .ok_or_else(|| ProductArgError::Quantity(quantity.to_owned()))?;
            product = product.with_quantity(quantity);
        }
        Ok(Self(product))
    }
}

/// Unwrap parsed arguments.
pub fn into_products(args: Vec<ProductArg>) -> Vec<Product> {
    args.into_iter().map(|ProductArg(product)| product).collect()
}
