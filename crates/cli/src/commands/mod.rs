//! CLI command implementations.

pub mod cart;

use rocketshoes_cart::{ApiClient, ApiError, CartConfig, CartError, CartStore, FileStorage, TracingNotifier};
use thiserror::Error;

/// Cart store backed by the REST API and file storage.
pub type Store = CartStore<ApiClient, ApiClient, FileStorage, TracingNotifier>;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The API client could not be created.
    #[error("API client error: {0}")]
    Api(#[from] ApiError),

    /// A cart operation was rejected.
    #[error("{}", .0.user_message())]
    Cart(#[from] CartError),
}

/// Open the cart store described by `config`.
///
/// # Errors
///
/// Returns `CommandError::Api` if the HTTP client cannot be built.
pub fn open_store(config: &CartConfig) -> Result<Store, CommandError> {
    let client = ApiClient::new(&config.api)?;
    let storage = FileStorage::new(&config.storage_dir);

    tracing::debug!(
        api = %client.base_url(),
        storage = %storage.path_for(&config.storage_key).display(),
        "Opening cart"
    );

    Ok(CartStore::with_notifier(
        client.clone(),
        client,
        storage,
        TracingNotifier,
        config.storage_key.clone(),
    ))
}
