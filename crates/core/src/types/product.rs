//! Catalog products, cart entries and stock snapshots.
//!
//! The JSON shape matches the catalog API (`id`, `title`, `price`, `image`),
//! and a cart entry is that same object with an `amount` field added. This is
//! also the format of the persisted cart blob.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;

/// Product metadata as returned by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    #[serde(rename = "title", alias = "name")]
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(rename = "image", alias = "imageUrl")]
    pub image_url: String,
}

impl Product {
    /// Unit price in the store currency.
    #[must_use]
    pub const fn unit_price(&self) -> Price {
        Price::brl(self.price)
    }
}

/// A product in the cart together with the selected quantity.
///
/// `amount` is always at least 1 for entries held by a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(flatten)]
    pub product: Product,
    pub amount: u32,
}

impl CartItem {
    /// Create a cart entry with a quantity of one.
    #[must_use]
    pub const fn new(product: Product) -> Self {
        Self { product, amount: 1 }
    }

    /// The product ID of this entry.
    #[must_use]
    pub const fn id(&self) -> ProductId {
        self.product.id
    }

    /// Price of this line (`unit price * amount`), or `None` if it does not
    /// fit in a `Decimal`.
    #[must_use]
    pub fn checked_subtotal(&self) -> Option<Decimal> {
        self.product.price.checked_mul(Decimal::from(self.amount))
    }

    /// Price of this line, saturating at the `Decimal` bounds.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.product.price.saturating_mul(Decimal::from(self.amount))
    }
}

/// Available quantity of a product at query time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stock {
    pub id: ProductId,
    pub amount: u32,
}
