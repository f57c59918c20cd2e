//! The cart store.
//!
//! [`CartStore`] owns the authoritative, ordered list of cart entries. Every
//! mutation is validated first (catalog, stock, entry lookup) and only then
//! committed: the new list replaces the old one, is written through to
//! [`CartStorage`], and is published to subscribers. A failed operation leaves
//! all three untouched.
//!
//! Storage is read exactly once, in the constructor.

use std::collections::{HashMap, HashSet};

use rocketshoes_core::{CartItem, ProductId};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

use crate::api::{ProductCatalog, StockSource};
use crate::error::{CartError, CartOperation, Result};
use crate::notify::{Notifier, TracingNotifier};
use crate::storage::{CART_STORAGE_KEY, CartStorage, deserialize_cart, serialize_cart};
use crate::summary::CartSummary;

/// Arguments for [`CartStore::update_product_amount`].
///
/// `amount` is the absolute quantity wanted, not a delta. Non-positive
/// values are ignored by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductAmount {
    pub product_id: ProductId,
    pub amount: i64,
}

/// Shopping cart validated against remote stock and persisted write-through.
pub struct CartStore<C, S, P, N = TracingNotifier> {
    catalog: C,
    stock: S,
    storage: P,
    notifier: N,
    storage_key: String,
    cart: Vec<CartItem>,
    updates: watch::Sender<Vec<CartItem>>,
}

impl<C, S, P> CartStore<C, S, P, TracingNotifier>
where
    C: ProductCatalog,
    S: StockSource,
    P: CartStorage,
{
    /// Create a store under the default storage key, logging notifications.
    #[must_use]
    pub fn new(catalog: C, stock: S, storage: P) -> Self {
        Self::with_notifier(catalog, stock, storage, TracingNotifier, CART_STORAGE_KEY)
    }
}

impl<C, S, P, N> CartStore<C, S, P, N>
where
    C: ProductCatalog,
    S: StockSource,
    P: CartStorage,
    N: Notifier,
{
    /// Create a store that loads from and writes to `storage_key`.
    ///
    /// An absent, unreadable or malformed blob yields an empty cart.
    #[must_use]
    pub fn with_notifier(
        catalog: C,
        stock: S,
        storage: P,
        notifier: N,
        storage_key: impl Into<String>,
    ) -> Self {
        let storage_key = storage_key.into();
        let cart = load_cart(&storage, &storage_key);
        let (updates, _) = watch::channel(cart.clone());

        Self {
            catalog,
            stock,
            storage,
            notifier,
            storage_key,
            cart,
            updates,
        }
    }

    /// Current cart entries in insertion order.
    #[must_use]
    pub fn cart(&self) -> &[CartItem] {
        &self.cart
    }

    /// The entry for `product_id`, if it is in the cart.
    #[must_use]
    pub fn get(&self, product_id: ProductId) -> Option<&CartItem> {
        self.cart.iter().find(|item| item.id() == product_id)
    }

    /// Quantity in the cart for every product, keyed by ID.
    #[must_use]
    pub fn amounts(&self) -> HashMap<ProductId, u32> {
        self.cart
            .iter()
            .map(|item| (item.id(), item.amount))
            .collect()
    }

    /// Totals and per-line prices for display.
    #[must_use]
    pub fn summary(&self) -> CartSummary {
        CartSummary::from(self.cart.as_slice())
    }

    /// Subscribe to cart changes. The receiver sees the cart after every
    /// committed mutation.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Vec<CartItem>> {
        self.updates.subscribe()
    }

    /// Add one unit of a product, creating the entry at amount 1 if needed.
    ///
    /// The catalog is probed before anything else; an existing entry is only
    /// incremented while it is below the available stock.
    ///
    /// # Errors
    ///
    /// - `CartError::ExistenceCheckFailed` if the catalog probe fails
    /// - `CartError::StockExceeded` if no more units are available
    /// - `CartError::Fetch` if the stock lookup or product fetch fails
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_product(&mut self, product_id: ProductId) -> Result<()> {
        let result = self.try_add_product(product_id).await;
        self.report(result)
    }

    /// Remove a product's entry from the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::EntryNotFound` if the product is not in the cart.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub fn remove_product(&mut self, product_id: ProductId) -> Result<()> {
        let result = self.try_remove_product(product_id);
        self.report(result)
    }

    /// Set a product's quantity to an absolute amount.
    ///
    /// Amounts of zero or less are ignored without error.
    ///
    /// # Errors
    ///
    /// - `CartError::EntryNotFound` if the product is not in the cart
    /// - `CartError::StockExceeded` if `amount` is above the available stock
    /// - `CartError::Fetch` if the stock lookup fails
    #[instrument(skip(self, update), fields(product_id = %update.product_id, amount = update.amount))]
    pub async fn update_product_amount(&mut self, update: UpdateProductAmount) -> Result<()> {
        let result = self.try_update_product_amount(update).await;
        self.report(result)
    }

    async fn try_add_product(&mut self, product_id: ProductId) -> Result<()> {
        // Existence probe; its response is not reused below.
        if let Err(source) = self.catalog.get_product(product_id).await {
            return Err(CartError::ExistenceCheckFailed { product_id, source });
        }

        let stock = self.stock.get_stock(product_id).await?;
        debug!(available = stock.amount, "Fetched stock");

        let mut next = self.cart.clone();
        if let Some(item) = next.iter_mut().find(|item| item.id() == product_id) {
            if item.amount >= stock.amount {
                return Err(CartError::StockExceeded {
                    product_id,
                    requested: u64::from(item.amount) + 1,
                    available: stock.amount,
                });
            }
            item.amount += 1;
        } else {
            if stock.amount == 0 {
                return Err(CartError::StockExceeded {
                    product_id,
                    requested: 1,
                    available: 0,
                });
            }
            let mut product = self.catalog.get_product(product_id).await?;
            // Entries are keyed by the requested ID.
            product.id = product_id;
            next.push(CartItem::new(product));
        }

        self.commit(next);
        Ok(())
    }

    fn try_remove_product(&mut self, product_id: ProductId) -> Result<()> {
        if self.get(product_id).is_none() {
            return Err(CartError::EntryNotFound {
                product_id,
                operation: CartOperation::Remove,
            });
        }

        let next = self
            .cart
            .iter()
            .filter(|item| item.id() != product_id)
            .cloned()
            .collect();

        self.commit(next);
        Ok(())
    }

    async fn try_update_product_amount(&mut self, update: UpdateProductAmount) -> Result<()> {
        let UpdateProductAmount { product_id, amount } = update;
        if amount <= 0 {
            debug!("Ignoring non-positive amount");
            return Ok(());
        }

        if self.get(product_id).is_none() {
            return Err(CartError::EntryNotFound {
                product_id,
                operation: CartOperation::UpdateAmount,
            });
        }

        let stock = self.stock.get_stock(product_id).await?;
        debug!(available = stock.amount, "Fetched stock");

        let new_amount = u32::try_from(amount)
            .ok()
            .filter(|requested| *requested <= stock.amount)
            .ok_or(CartError::StockExceeded {
                product_id,
                requested: amount.unsigned_abs(),
                available: stock.amount,
            })?;

        let next = self
            .cart
            .iter()
            .map(|item| {
                if item.id() == product_id {
                    CartItem {
                        amount: new_amount,
                        ..item.clone()
                    }
                } else {
                    item.clone()
                }
            })
            .collect();

        self.commit(next);
        Ok(())
    }

    /// Replace the in-memory cart, write it through and notify subscribers.
    fn commit(&mut self, next: Vec<CartItem>) {
        self.cart = next;
        self.persist();
        self.updates.send_replace(self.cart.clone());
        info!(entries = self.cart.len(), "Cart updated");
    }

    /// Write the current cart to storage. Failures are logged, not returned.
    fn persist(&self) {
        let result = serialize_cart(&self.cart)
            .and_then(|blob| self.storage.write(&self.storage_key, &blob));
        if let Err(e) = result {
            error!(error = %e, key = %self.storage_key, "Failed to persist cart");
        }
    }

    /// Push a failed operation to the notifier and hand the result back.
    fn report(&self, result: Result<()>) -> Result<()> {
        if let Err(err) = &result {
            debug!(error = %err, "Cart operation rejected");
            self.notifier.notify_error(&err.user_message());
        }
        result
    }
}

/// Read the persisted cart, falling back to an empty one.
///
/// Entries with a zero amount, a subtotal outside the `Decimal` range and
/// repeated IDs (after the first) are dropped.
fn load_cart<P: CartStorage>(storage: &P, key: &str) -> Vec<CartItem> {
    let blob = match storage.read(key) {
        Ok(Some(blob)) => blob,
        Ok(None) => return Vec::new(),
        Err(e) => {
            warn!(error = %e, key, "Failed to read persisted cart, starting empty");
            return Vec::new();
        }
    };

    let items = match deserialize_cart(&blob) {
        Ok(items) => items,
        Err(e) => {
            warn!(error = %e, key, "Discarding malformed persisted cart");
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    let cart: Vec<CartItem> = items
        .into_iter()
        .filter(|item| {
            item.amount > 0 && item.checked_subtotal().is_some() && seen.insert(item.id())
        })
        .collect();
    debug!(entries = cart.len(), "Loaded persisted cart");
    cart
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use rocketshoes_core::{Product, Stock};
    use rust_decimal::Decimal;

    use super::*;
    use crate::api::ApiError;
    use crate::notify::RecordingNotifier;
    use crate::storage::MemoryStorage;

    // =========================================================================
    // Fakes
    // =========================================================================

    #[derive(Clone, Default)]
    struct FakeCatalog {
        products: Arc<Mutex<HashMap<ProductId, Product>>>,
        /// Products removed from the catalog right after their first lookup.
        vanishing: Arc<Mutex<HashSet<ProductId>>>,
        lookups: Arc<AtomicUsize>,
    }

    impl FakeCatalog {
        fn with(products: &[Product]) -> Self {
            let catalog = Self::default();
            catalog
                .products
                .lock()
                .unwrap()
                .extend(products.iter().map(|p| (p.id, p.clone())));
            catalog
        }

        fn vanish_after_first_lookup(&self, id: ProductId) {
            self.vanishing.lock().unwrap().insert(id);
        }

        fn lookups(&self) -> usize {
            self.lookups.load(Ordering::SeqCst)
        }
    }

    impl ProductCatalog for FakeCatalog {
        async fn get_product(&self, product_id: ProductId) -> std::result::Result<Product, ApiError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            let mut products = self.products.lock().unwrap();
            let found = products
                .get(&product_id)
                .cloned()
                .ok_or_else(|| ApiError::NotFound(format!("products/{product_id}")))?;
            if self.vanishing.lock().unwrap().remove(&product_id) {
                products.remove(&product_id);
            }
            Ok(found)
        }
    }

    #[derive(Clone, Default)]
    struct FakeStock {
        levels: Arc<Mutex<HashMap<ProductId, u32>>>,
        unreachable: Arc<Mutex<bool>>,
    }

    impl FakeStock {
        fn with(levels: &[(i32, u32)]) -> Self {
            let stock = Self::default();
            stock.levels.lock().unwrap().extend(
                levels
                    .iter()
                    .map(|(id, amount)| (ProductId::new(*id), *amount)),
            );
            stock
        }

        fn set(&self, id: i32, amount: u32) {
            self.levels.lock().unwrap().insert(ProductId::new(id), amount);
        }

        fn go_offline(&self) {
            *self.unreachable.lock().unwrap() = true;
        }
    }

    impl StockSource for FakeStock {
        async fn get_stock(&self, product_id: ProductId) -> std::result::Result<Stock, ApiError> {
            if *self.unreachable.lock().unwrap() {
                return Err(ApiError::Api {
                    status: 503,
                    message: "stock service unavailable".to_string(),
                });
            }
            self.levels
                .lock()
                .unwrap()
                .get(&product_id)
                .map(|amount| Stock {
                    id: product_id,
                    amount: *amount,
                })
                .ok_or_else(|| ApiError::NotFound(format!("stock/{product_id}")))
        }
    }

    type TestStore = CartStore<FakeCatalog, FakeStock, MemoryStorage, RecordingNotifier>;

    struct Harness {
        store: TestStore,
        catalog: FakeCatalog,
        stock: FakeStock,
        storage: MemoryStorage,
        notifier: RecordingNotifier,
    }

    impl Harness {
        fn new(products: &[Product], levels: &[(i32, u32)]) -> Self {
            Self::with_storage(products, levels, MemoryStorage::new())
        }

        fn with_storage(products: &[Product], levels: &[(i32, u32)], storage: MemoryStorage) -> Self {
            let catalog = FakeCatalog::with(products);
            let stock = FakeStock::with(levels);
            let notifier = RecordingNotifier::new();
            let store = CartStore::with_notifier(
                catalog.clone(),
                stock.clone(),
                storage.clone(),
                notifier.clone(),
                CART_STORAGE_KEY,
            );
            Self {
                store,
                catalog,
                stock,
                storage,
                notifier,
            }
        }

        fn persisted(&self) -> Option<Vec<CartItem>> {
            self.storage
                .read(CART_STORAGE_KEY)
                .unwrap()
                .map(|blob| deserialize_cart(&blob).unwrap())
        }

        fn amount_of(&self, id: i32) -> Option<u32> {
            self.store.get(ProductId::new(id)).map(|item| item.amount)
        }
    }

    fn product(id: i32) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Tênis {id}"),
            price: Decimal::new(13990, 2),
            image_url: format!("https://example.com/{id}.jpg"),
        }
    }

    fn item(id: i32, amount: u32) -> CartItem {
        CartItem {
            product: product(id),
            amount,
        }
    }

    fn stored_cart(items: &[CartItem]) -> MemoryStorage {
        MemoryStorage::with_blob(CART_STORAGE_KEY, &serialize_cart(items).unwrap())
    }

    fn update(id: i32, amount: i64) -> UpdateProductAmount {
        UpdateProductAmount {
            product_id: ProductId::new(id),
            amount,
        }
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    #[test]
    fn test_starts_empty_without_persisted_cart() {
        let h = Harness::new(&[], &[]);
        assert!(h.store.cart().is_empty());
        assert!(h.persisted().is_none());
    }

    #[test]
    fn test_loads_persisted_cart_in_order() {
        let items = vec![item(3, 1), item(1, 2)];
        let h = Harness::with_storage(&[], &[], stored_cart(&items));
        assert_eq!(h.store.cart(), items.as_slice());
    }

    #[test]
    fn test_malformed_persisted_cart_yields_empty_cart() {
        let storage = MemoryStorage::with_blob(CART_STORAGE_KEY, "{not json");
        let h = Harness::with_storage(&[], &[], storage);
        assert!(h.store.cart().is_empty());
        assert!(h.notifier.messages().is_empty());
    }

    #[test]
    fn test_load_drops_zero_amounts_and_duplicates() {
        let storage = stored_cart(&[item(1, 2), item(2, 0), item(1, 5), item(3, 1)]);
        let h = Harness::with_storage(&[], &[], storage);
        assert_eq!(h.store.cart(), &[item(1, 2), item(3, 1)]);
    }

    #[test]
    fn test_load_drops_entries_whose_subtotal_overflows() {
        let blob = r#"[{"id":1,"title":"x","price":4e28,"image":"i","amount":2},{"id":2,"title":"y","price":139.9,"image":"j","amount":1}]"#;
        let h = Harness::with_storage(&[], &[], MemoryStorage::with_blob(CART_STORAGE_KEY, blob));

        assert_eq!(h.amount_of(1), None);
        assert_eq!(h.amount_of(2), Some(1));
        assert_eq!(h.store.summary().formatted_total, "R$ 139,90");
    }

    #[test]
    fn test_loads_blob_in_catalog_shape() {
        let blob = r#"[{"id":7,"title":"Tênis VR Caminhada","price":139.9,"image":"https://example.com/7.jpg","amount":3}]"#;
        let h = Harness::with_storage(&[], &[], MemoryStorage::with_blob(CART_STORAGE_KEY, blob));
        assert_eq!(h.amount_of(7), Some(3));
        assert_eq!(h.store.cart()[0].product.name, "Tênis VR Caminhada");
    }

    // =========================================================================
    // add_product
    // =========================================================================

    #[tokio::test]
    async fn test_add_new_product_creates_single_entry() {
        let mut h = Harness::new(&[product(42)], &[(42, 5)]);

        h.store.add_product(ProductId::new(42)).await.unwrap();

        assert_eq!(h.store.cart(), &[item(42, 1)]);
        assert_eq!(h.persisted().unwrap(), h.store.cart());
    }

    #[tokio::test]
    async fn test_add_up_to_stock_then_reject() {
        let mut h = Harness::new(&[product(42)], &[(42, 5)]);

        for _ in 0..5 {
            h.store.add_product(ProductId::new(42)).await.unwrap();
        }
        assert_eq!(h.store.cart(), &[item(42, 5)]);

        let err = h.store.add_product(ProductId::new(42)).await.unwrap_err();
        assert!(matches!(
            err,
            CartError::StockExceeded {
                requested: 6,
                available: 5,
                ..
            }
        ));
        assert_eq!(h.store.cart(), &[item(42, 5)]);
        assert_eq!(h.persisted().unwrap(), h.store.cart());
        assert_eq!(
            h.notifier.messages(),
            vec!["Quantidade solicitada fora de estoque".to_string()]
        );
    }

    #[tokio::test]
    async fn test_add_never_exceeds_stock() {
        for capacity in 1..=4 {
            let mut h = Harness::new(&[product(9)], &[(9, capacity)]);
            for _ in 0..capacity + 3 {
                let _ = h.store.add_product(ProductId::new(9)).await;
                assert!(h.amount_of(9).unwrap() <= capacity);
            }
            assert_eq!(h.amount_of(9), Some(capacity));
            assert_eq!(h.notifier.messages().len(), 3);
        }
    }

    #[tokio::test]
    async fn test_add_rejects_when_stock_dropped_below_amount() {
        let mut h = Harness::with_storage(&[product(1)], &[(1, 2)], stored_cart(&[item(1, 4)]));

        let err = h.store.add_product(ProductId::new(1)).await.unwrap_err();

        assert!(matches!(err, CartError::StockExceeded { .. }));
        assert_eq!(h.amount_of(1), Some(4));
    }

    #[tokio::test]
    async fn test_add_out_of_stock_new_product_rejected() {
        let mut h = Harness::new(&[product(5)], &[(5, 0)]);

        let err = h.store.add_product(ProductId::new(5)).await.unwrap_err();

        assert!(matches!(err, CartError::StockExceeded { available: 0, .. }));
        assert!(h.store.cart().is_empty());
        assert!(h.persisted().is_none());
    }

    #[tokio::test]
    async fn test_add_unknown_product_fails_existence_check() {
        let mut h = Harness::new(&[], &[(13, 10)]);

        let err = h.store.add_product(ProductId::new(13)).await.unwrap_err();

        assert!(matches!(err, CartError::ExistenceCheckFailed { .. }));
        assert!(h.store.cart().is_empty());
        assert!(h.persisted().is_none());
        assert_eq!(
            h.notifier.messages(),
            vec!["Erro na adição do produto".to_string()]
        );
    }

    #[tokio::test]
    async fn test_add_probes_catalog_then_fetches_again_for_new_entry() {
        let mut h = Harness::new(&[product(2)], &[(2, 3)]);

        h.store.add_product(ProductId::new(2)).await.unwrap();
        assert_eq!(h.catalog.lookups(), 2);

        // Existing entries only need the probe.
        h.store.add_product(ProductId::new(2)).await.unwrap();
        assert_eq!(h.catalog.lookups(), 3);
    }

    #[tokio::test]
    async fn test_add_product_vanishing_after_probe_reports_fetch_failure() {
        let mut h = Harness::new(&[product(8)], &[(8, 3)]);
        h.catalog.vanish_after_first_lookup(ProductId::new(8));

        let err = h.store.add_product(ProductId::new(8)).await.unwrap_err();

        assert!(matches!(err, CartError::Fetch(ApiError::NotFound(_))));
        assert!(h.store.cart().is_empty());
        assert_eq!(h.notifier.messages(), vec!["Not found: products/8".to_string()]);
    }

    #[tokio::test]
    async fn test_add_stock_failure_leaves_cart_untouched() {
        let mut h = Harness::with_storage(&[product(1)], &[(1, 9)], stored_cart(&[item(1, 1)]));
        h.stock.go_offline();

        let err = h.store.add_product(ProductId::new(1)).await.unwrap_err();

        assert!(matches!(err, CartError::Fetch(ApiError::Api { status: 503, .. })));
        assert_eq!(h.amount_of(1), Some(1));
        assert_eq!(
            h.notifier.messages(),
            vec!["API error: 503 - stock service unavailable".to_string()]
        );
    }

    #[tokio::test]
    async fn test_add_appends_in_first_addition_order() {
        let mut h = Harness::new(&[product(1), product(2), product(3)], &[(1, 5), (2, 5), (3, 5)]);

        for id in [2, 1, 3, 1, 2] {
            h.store.add_product(ProductId::new(id)).await.unwrap();
        }

        let order: Vec<i32> = h.store.cart().iter().map(|i| i.id().as_i32()).collect();
        assert_eq!(order, vec![2, 1, 3]);
        assert_eq!(h.store.cart(), &[item(2, 2), item(1, 2), item(3, 1)]);
        assert_eq!(h.persisted().unwrap(), h.store.cart());
    }

    // =========================================================================
    // remove_product
    // =========================================================================

    #[test]
    fn test_remove_existing_entry() {
        let mut h = Harness::with_storage(&[], &[], stored_cart(&[item(7, 3)]));

        h.store.remove_product(ProductId::new(7)).unwrap();

        assert!(h.store.cart().is_empty());
        assert_eq!(h.persisted().unwrap(), Vec::<CartItem>::new());
    }

    #[test]
    fn test_remove_keeps_other_entries_in_order() {
        let mut h = Harness::with_storage(&[], &[], stored_cart(&[item(1, 1), item(2, 2), item(3, 3)]));

        h.store.remove_product(ProductId::new(2)).unwrap();

        assert_eq!(h.store.cart(), &[item(1, 1), item(3, 3)]);
        assert_eq!(h.persisted().unwrap(), h.store.cart());
    }

    #[test]
    fn test_remove_absent_entry_reports_not_found() {
        let items = [item(1, 1)];
        let mut h = Harness::with_storage(&[], &[], stored_cart(&items));

        let err = h.store.remove_product(ProductId::new(99)).unwrap_err();

        assert!(matches!(
            err,
            CartError::EntryNotFound {
                operation: CartOperation::Remove,
                ..
            }
        ));
        assert_eq!(h.store.cart(), &items);
        assert_eq!(
            h.notifier.messages(),
            vec!["Erro na remoção do produto".to_string()]
        );
    }

    // =========================================================================
    // update_product_amount
    // =========================================================================

    #[tokio::test]
    async fn test_update_sets_absolute_amount() {
        let mut h = Harness::with_storage(&[], &[(7, 10)], stored_cart(&[item(7, 3), item(8, 1)]));

        h.store.update_product_amount(update(7, 6)).await.unwrap();

        assert_eq!(h.store.cart(), &[item(7, 6), item(8, 1)]);
        assert_eq!(h.persisted().unwrap(), h.store.cart());
    }

    #[tokio::test]
    async fn test_update_to_exact_stock_allowed() {
        let mut h = Harness::with_storage(&[], &[(7, 4)], stored_cart(&[item(7, 1)]));

        h.store.update_product_amount(update(7, 4)).await.unwrap();

        assert_eq!(h.amount_of(7), Some(4));
    }

    #[tokio::test]
    async fn test_update_non_positive_amount_is_noop() {
        let storage = stored_cart(&[item(7, 3)]);
        let before = storage.read(CART_STORAGE_KEY).unwrap();
        let mut h = Harness::with_storage(&[], &[(7, 10)], storage);

        for amount in [0, -1, i64::MIN] {
            h.store.update_product_amount(update(7, amount)).await.unwrap();
        }
        // Even for products that are not in the cart.
        h.store.update_product_amount(update(99, 0)).await.unwrap();

        assert_eq!(h.store.cart(), &[item(7, 3)]);
        assert_eq!(h.storage.read(CART_STORAGE_KEY).unwrap(), before);
        assert!(h.notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn test_update_above_stock_rejected() {
        let mut h = Harness::with_storage(&[], &[(7, 5)], stored_cart(&[item(7, 3)]));

        let err = h.store.update_product_amount(update(7, 6)).await.unwrap_err();

        assert!(matches!(
            err,
            CartError::StockExceeded {
                requested: 6,
                available: 5,
                ..
            }
        ));
        assert_eq!(h.amount_of(7), Some(3));
        assert_eq!(
            h.notifier.messages(),
            vec!["Quantidade solicitada fora de estoque".to_string()]
        );
    }

    #[tokio::test]
    async fn test_update_amount_beyond_u32_rejected_as_stock_exceeded() {
        let mut h = Harness::with_storage(&[], &[(7, u32::MAX)], stored_cart(&[item(7, 3)]));

        let err = h
            .store
            .update_product_amount(update(7, i64::from(u32::MAX) + 1))
            .await
            .unwrap_err();

        assert!(matches!(err, CartError::StockExceeded { .. }));
        assert_eq!(h.amount_of(7), Some(3));
    }

    #[tokio::test]
    async fn test_update_absent_entry_reports_not_found_without_stock_lookup() {
        let mut h = Harness::new(&[], &[]);
        h.stock.go_offline();

        let err = h.store.update_product_amount(update(4, 2)).await.unwrap_err();

        assert!(matches!(
            err,
            CartError::EntryNotFound {
                operation: CartOperation::UpdateAmount,
                ..
            }
        ));
        assert_eq!(
            h.notifier.messages(),
            vec!["Erro na alteração de quantidade do produto".to_string()]
        );
    }

    #[tokio::test]
    async fn test_update_reads_fresh_stock_each_time() {
        let mut h = Harness::with_storage(&[], &[(7, 10)], stored_cart(&[item(7, 1)]));

        h.store.update_product_amount(update(7, 8)).await.unwrap();
        h.stock.set(7, 2);
        let err = h.store.update_product_amount(update(7, 3)).await.unwrap_err();

        assert!(matches!(err, CartError::StockExceeded { available: 2, .. }));
        assert_eq!(h.amount_of(7), Some(8));
    }

    // =========================================================================
    // Consumer interface
    // =========================================================================

    #[tokio::test]
    async fn test_subscribers_see_commits_only() {
        let mut h = Harness::new(&[product(1)], &[(1, 1)]);
        let mut rx = h.store.subscribe();
        assert!(rx.borrow_and_update().is_empty());

        h.store.add_product(ProductId::new(1)).await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().as_slice(), &[item(1, 1)]);

        let _ = h.store.add_product(ProductId::new(1)).await;
        let _ = h.store.remove_product(ProductId::new(2));
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_amounts_and_summary() {
        let mut h = Harness::new(&[product(1), product(2)], &[(1, 5), (2, 5)]);
        h.store.add_product(ProductId::new(1)).await.unwrap();
        h.store.add_product(ProductId::new(2)).await.unwrap();
        h.store.update_product_amount(update(2, 3)).await.unwrap();

        let amounts = h.store.amounts();
        assert_eq!(amounts.get(&ProductId::new(1)), Some(&1));
        assert_eq!(amounts.get(&ProductId::new(2)), Some(&3));

        let summary = h.store.summary();
        assert_eq!(summary.total, Decimal::new(55960, 2));
        assert_eq!(summary.product_count, 2);
    }

    #[test]
    fn test_update_payload_uses_camel_case() {
        let payload: UpdateProductAmount =
            serde_json::from_str(r#"{"productId":7,"amount":0}"#).unwrap();
        assert_eq!(payload, update(7, 0));
    }

    #[tokio::test]
    async fn test_persisted_cart_survives_restart() {
        let mut h = Harness::new(&[product(1), product(2)], &[(1, 5), (2, 5)]);
        h.store.add_product(ProductId::new(1)).await.unwrap();
        h.store.add_product(ProductId::new(2)).await.unwrap();
        h.store.update_product_amount(update(1, 4)).await.unwrap();

        let reopened = Harness::with_storage(&[], &[], h.storage.clone());
        assert_eq!(reopened.store.cart(), h.store.cart());
    }
}
