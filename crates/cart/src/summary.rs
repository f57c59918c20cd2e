//! Display data derived from the cart.

use rocketshoes_core::{CartItem, Price, ProductId};
use rust_decimal::Decimal;

/// One cart line with its prices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub id: ProductId,
    pub name: String,
    pub image_url: String,
    pub amount: u32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
    /// Formatted unit price, e.g. "R$ 179,90"
    pub formatted_price: String,
    /// Formatted line subtotal
    pub formatted_subtotal: String,
}

/// Cart totals for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartSummary {
    pub lines: Vec<CartLine>,
    pub total: Decimal,
    /// Formatted cart total
    pub formatted_total: String,
    /// Distinct products in the cart (the header badge count)
    pub product_count: usize,
    /// Sum of all amounts
    pub unit_count: u64,
}

impl From<&CartItem> for CartLine {
    fn from(item: &CartItem) -> Self {
        let subtotal = item.subtotal();
        Self {
            id: item.id(),
            name: item.product.name.clone(),
            image_url: item.product.image_url.clone(),
            amount: item.amount,
            unit_price: item.product.price,
            subtotal,
            formatted_price: item.product.unit_price().display(),
            formatted_subtotal: Price::brl(subtotal).display(),
        }
    }
}

impl From<&[CartItem]> for CartSummary {
    fn from(cart: &[CartItem]) -> Self {
        let lines: Vec<CartLine> = cart.iter().map(CartLine::from).collect();
        let total = lines
            .iter()
            .fold(Decimal::ZERO, |total, line| total.saturating_add(line.subtotal));
        let unit_count = cart.iter().map(|item| u64::from(item.amount)).sum();

        Self {
            product_count: lines.len(),
            lines,
            total,
            formatted_total: Price::brl(total).display(),
            unit_count,
        }
    }
}
