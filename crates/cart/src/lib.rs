//! RocketShoes cart library.
//!
//! A shopping cart that validates every change against live stock and keeps a
//! durable copy of itself in sync after each successful change.
//!
//! # Modules
//!
//! - [`store`] - The cart store and its three operations
//! - [`api`] - Catalog and stock client traits plus the REST client
//! - [`storage`] - Persistent key-value storage for the serialized cart
//! - [`notify`] - Shopper-facing notification channel
//! - [`summary`] - Totals and formatted prices for display
//! - [`config`] - Environment configuration
//! - [`error`] - Cart operation errors
//!
//! # Example
//!
//! ```rust,ignore
//! use rocketshoes_cart::{ApiClient, CartConfig, CartStore, FileStorage};
//!
//! let config = CartConfig::from_env()?;
//! let client = ApiClient::new(&config.api)?;
//! let mut store = CartStore::new(client.clone(), client, FileStorage::new(&config.storage_dir));
//!
//! store.add_product(ProductId::new(1)).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod notify;
pub mod storage;
pub mod store;
pub mod summary;

pub use api::{ApiClient, ApiError, ProductCatalog, StockSource};
pub use config::{ApiConfig, CartConfig, ConfigError};
pub use error::{CartError, CartOperation};
pub use notify::{Notifier, RecordingNotifier, TracingNotifier};
pub use storage::{CART_STORAGE_KEY, CartStorage, FileStorage, MemoryStorage, StorageError};
pub use store::{CartStore, UpdateProductAmount};
pub use summary::{CartLine, CartSummary};
