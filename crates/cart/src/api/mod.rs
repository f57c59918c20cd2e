//! Remote product catalog and stock clients.
//!
//! # Architecture
//!
//! - [`ProductCatalog`] and [`StockSource`] are the seams the cart store is
//!   generic over; tests plug in-memory fakes into them
//! - [`ApiClient`] implements both against the REST API
//!   (`GET /products/{id}`, `GET /stock/{id}`)
//! - Nothing is cached: stock is authoritative only at query time
//!
//! # Example
//!
//! ```rust,ignore
//! use rocketshoes_cart::api::{ApiClient, StockSource};
//!
//! let client = ApiClient::new(&config.api)?;
//! let stock = client.get_stock(ProductId::new(1)).await?;
//! ```

mod client;

use std::future::Future;

use rocketshoes_core::{Product, ProductId, Stock};
use thiserror::Error;

pub use client::ApiClient;

/// Errors that can occur when talking to the products/stock API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Source of product metadata.
pub trait ProductCatalog {
    /// Fetch a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for unknown products, or another
    /// `ApiError` when the catalog cannot be reached.
    fn get_product(
        &self,
        product_id: ProductId,
    ) -> impl Future<Output = Result<Product, ApiError>> + Send;
}

/// Source of current stock levels.
pub trait StockSource {
    /// Fetch the available quantity of a product.
    ///
    /// # Errors
    ///
    /// Returns an `ApiError` when the stock lookup fails.
    fn get_stock(
        &self,
        product_id: ProductId,
    ) -> impl Future<Output = Result<Stock, ApiError>> + Send;
}
