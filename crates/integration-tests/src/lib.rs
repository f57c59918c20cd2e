//! Integration tests for the RocketShoes cart.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p rocketshoes-integration-tests
//! ```
//!
//! Tests drive the real [`ApiClient`](rocketshoes_cart::ApiClient) against
//! [`FakeApi`], an in-process axum server bound to an ephemeral port that
//! serves `GET /products/{id}` and `GET /stock/{id}` from a mutable inventory.

#![allow(clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use rocketshoes_cart::ApiConfig;
use rocketshoes_core::{Product, ProductId, Stock};
use rust_decimal::Decimal;
use url::Url;

#[derive(Default)]
struct Inventory {
    products: HashMap<ProductId, Product>,
    stock: HashMap<ProductId, u32>,
    stock_down: bool,
}

type SharedInventory = Arc<Mutex<Inventory>>;

/// In-process stand-in for the products/stock API.
pub struct FakeApi {
    addr: SocketAddr,
    prefix: String,
    inventory: SharedInventory,
}

impl FakeApi {
    /// Start a server with routes at the root.
    pub async fn start() -> Self {
        Self::start_under("").await
    }

    /// Start a server with routes nested under `prefix` (e.g. `/api`).
    pub async fn start_under(prefix: &str) -> Self {
        let inventory = SharedInventory::default();
        let routes = Router::new()
            .route("/products/{id}", get(get_product))
            .route("/stock/{id}", get(get_stock))
            .with_state(Arc::clone(&inventory));
        let app = if prefix.is_empty() {
            routes
        } else {
            Router::new().nest(prefix, routes)
        };

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake API");
        let addr = listener.local_addr().expect("Fake API has no address");
        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Fake API server error");
        });

        Self {
            addr,
            prefix: prefix.to_string(),
            inventory,
        }
    }

    /// Base URL clients should use.
    #[must_use]
    pub fn base_url(&self) -> Url {
        Url::parse(&format!("http://{}{}", self.addr, self.prefix)).expect("Valid fake API URL")
    }

    /// Client configuration pointing at this server.
    #[must_use]
    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            base_url: self.base_url(),
            timeout: Some(std::time::Duration::from_secs(5)),
        }
    }

    /// Put a product in the catalog with the given stock.
    pub fn stock_product(&self, product: Product, amount: u32) {
        let mut inventory = self.lock();
        inventory.stock.insert(product.id, amount);
        inventory.products.insert(product.id, product);
    }

    /// Change the available stock of a product.
    pub fn set_stock(&self, id: i32, amount: u32) {
        self.lock().stock.insert(ProductId::new(id), amount);
    }

    /// Drop a product from the catalog (its stock entry stays).
    pub fn delist(&self, id: i32) {
        self.lock().products.remove(&ProductId::new(id));
    }

    /// Make every stock request fail with 500.
    pub fn take_stock_down(&self) {
        self.lock().stock_down = true;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inventory> {
        self.inventory.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A catalog product with a price in reais.
#[must_use]
pub fn sneaker(id: i32, title: &str, price_cents: i64) -> Product {
    Product {
        id: ProductId::new(id),
        name: title.to_string(),
        price: Decimal::new(price_cents, 2),
        image_url: format!("https://rocketseat-cdn.s3-sa-east-1.amazonaws.com/modulo-redux/tenis{id}.jpg"),
    }
}

async fn get_product(
    State(inventory): State<SharedInventory>,
    Path(id): Path<ProductId>,
) -> Response {
    let inventory = inventory.lock().unwrap_or_else(PoisonError::into_inner);
    inventory.products.get(&id).map_or_else(
        || StatusCode::NOT_FOUND.into_response(),
        |product| Json(product.clone()).into_response(),
    )
}

async fn get_stock(
    State(inventory): State<SharedInventory>,
    Path(id): Path<ProductId>,
) -> Response {
    let inventory = inventory.lock().unwrap_or_else(PoisonError::into_inner);
    if inventory.stock_down {
        return (StatusCode::INTERNAL_SERVER_ERROR, "stock database offline").into_response();
    }
    inventory.stock.get(&id).map_or_else(
        || StatusCode::NOT_FOUND.into_response(),
        |amount| Json(Stock { id, amount: *amount }).into_response(),
    )
}
