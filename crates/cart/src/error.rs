//! Cart operation errors.
//!
//! Every failed operation maps to one [`CartError`]. The `Display` impl is
//! meant for logs; [`CartError::user_message`] is the text shown to shoppers.

use rocketshoes_core::ProductId;
use thiserror::Error;

use crate::api::ApiError;

/// The cart operation that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartOperation {
    Remove,
    UpdateAmount,
}

impl std::fmt::Display for CartOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Remove => "remove",
            Self::UpdateAmount => "update amount",
        })
    }
}

/// Errors returned by cart store operations.
///
/// None of these leave the cart modified.
#[derive(Debug, Error)]
pub enum CartError {
    /// The catalog could not confirm the product exists.
    #[error("Product {product_id} could not be added: {source}")]
    ExistenceCheckFailed {
        product_id: ProductId,
        #[source]
        source: ApiError,
    },

    /// The requested quantity is above the available stock.
    #[error("Requested {requested} of product {product_id}, only {available} in stock")]
    StockExceeded {
        product_id: ProductId,
        requested: u64,
        available: u32,
    },

    /// The product is not in the cart.
    #[error("Cannot {operation}: product {product_id} is not in the cart")]
    EntryNotFound {
        product_id: ProductId,
        operation: CartOperation,
    },

    /// A stock or catalog lookup failed.
    #[error("Lookup failed: {0}")]
    Fetch(#[from] ApiError),
}

impl CartError {
    /// Message shown to the shopper through the notification channel.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::ExistenceCheckFailed { .. } => "Erro na adição do produto".to_string(),
            Self::StockExceeded { .. } => "Quantidade solicitada fora de estoque".to_string(),
            Self::EntryNotFound { operation, .. } => match operation {
                CartOperation::Remove => "Erro na remoção do produto".to_string(),
                CartOperation::UpdateAmount => {
                    "Erro na alteração de quantidade do produto".to_string()
                }
            },
            Self::Fetch(err) => err.to_string(),
        }
    }

    /// Product the failed operation targeted, when known.
    #[must_use]
    pub const fn product_id(&self) -> Option<ProductId> {
        match self {
            Self::ExistenceCheckFailed { product_id, .. }
            | Self::StockExceeded { product_id, .. }
            | Self::EntryNotFound { product_id, .. } => Some(*product_id),
            Self::Fetch(_) => None,
        }
    }
}

/// Result type alias for `CartError`.
pub type Result<T> = std::result::Result<T, CartError>;
