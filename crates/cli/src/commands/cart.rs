//! Cart commands.
//!
//! # Usage
//!
//! ```bash
//! rocketshoes add 1
//! rocketshoes update 1 3
//! rocketshoes remove 1
//! rocketshoes list
//! rocketshoes summary
//! ```
//!
//! # Environment Variables
//!
//! - `ROCKETSHOES_API_URL` - Products/stock API base URL
//! - `ROCKETSHOES_STORAGE_DIR` - Where the cart file is kept

use rocketshoes_cart::{CartSummary, UpdateProductAmount};
use rocketshoes_core::ProductId;
use tracing::info;

use super::{CommandError, Store};

/// Print every cart entry.
pub fn list(store: &Store) {
    let summary = store.summary();
    if summary.lines.is_empty() {
        info!("Cart is empty");
        return;
    }

    for line in &summary.lines {
        info!(
            "#{} {} - {} x {} = {}",
            line.id, line.name, line.amount, line.formatted_price, line.formatted_subtotal
        );
    }
}

/// Print the cart totals.
pub fn summary(store: &Store) {
    log_totals(&store.summary());
}

/// Add one unit of a product.
///
/// # Errors
///
/// Returns `CommandError::Cart` if the cart store rejects the addition.
pub async fn add(store: &mut Store, product_id: ProductId) -> Result<(), CommandError> {
    store.add_product(product_id).await?;
    if let Some(item) = store.get(product_id) {
        info!("{} now has {} in the cart", item.product.name, item.amount);
    }
    log_totals(&store.summary());
    Ok(())
}

/// Remove a product from the cart.
///
/// # Errors
///
/// Returns `CommandError::Cart` if the product is not in the cart.
pub fn remove(store: &mut Store, product_id: ProductId) -> Result<(), CommandError> {
    store.remove_product(product_id)?;
    info!("Removed product {product_id}");
    log_totals(&store.summary());
    Ok(())
}

/// Set the quantity of a product in the cart.
///
/// # Errors
///
/// Returns `CommandError::Cart` if the update is rejected.
pub async fn update(
    store: &mut Store,
    product_id: ProductId,
    amount: i64,
) -> Result<(), CommandError> {
    store
        .update_product_amount(UpdateProductAmount { product_id, amount })
        .await?;
    if amount <= 0 {
        info!("Quantities below 1 are ignored; use `remove` to drop a product");
    }
    log_totals(&store.summary());
    Ok(())
}

fn log_totals(summary: &CartSummary) {
    info!(
        "{} product(s), {} unit(s), total {}",
        summary.product_count, summary.unit_count, summary.formatted_total
    );
}
