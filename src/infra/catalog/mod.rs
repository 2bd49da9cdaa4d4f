//! In-memory catalog store.
//!
//! Sole owner of the product collection. Every operation first awaits a
//! simulated latency and then touches the collection inside one lock
//! acquisition, so mutations never interleave.

mod pipeline;
pub mod seed;

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use time::OffsetDateTime;
use tracing::{debug, info, instrument, warn};

use crate::application::error::CatalogError;
use crate::application::pagination::PageRequest;
use crate::application::repos::{ProductPage, ProductQueryFilter, ProductsRepo, ProductsWriteRepo};
use crate::application::session::SessionGate;
use crate::cache::lock::{rw_read, rw_write};
use crate::domain::entities::ProductRecord;
use crate::domain::products::{NewProduct, ProductPatch, validate_new_product, validate_patch};
use crate::domain::text::MatchMode;

const SOURCE: &str = "infra::catalog";

/// Simulated round-trip latency per operation, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyProfile {
    pub list_ms: u64,
    pub get_ms: u64,
    pub create_ms: u64,
    pub update_ms: u64,
    pub delete_ms: u64,
    pub categories_ms: u64,
    pub search_ms: u64,
    pub by_category_ms: u64,
}

impl Default for LatencyProfile {
    fn default() -> Self {
        Self {
            list_ms: 600,
            get_ms: 400,
            create_ms: 800,
            update_ms: 600,
            delete_ms: 500,
            categories_ms: 300,
            search_ms: 400,
            by_category_ms: 500,
        }
    }
}

impl LatencyProfile {
    pub fn instant() -> Self {
        Self {
            list_ms: 0,
            get_ms: 0,
            create_ms: 0,
            update_ms: 0,
            delete_ms: 0,
            categories_ms: 0,
            search_ms: 0,
            by_category_ms: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CatalogConfig {
    pub latency: LatencyProfile,
    pub match_mode: MatchMode,
}

impl From<&crate::config::Settings> for CatalogConfig {
    fn from(settings: &crate::config::Settings) -> Self {
        Self {
            latency: settings.catalog.latency,
            match_mode: if settings.search.accent_insensitive {
                MatchMode::AccentInsensitive
            } else {
                MatchMode::CaseInsensitive
            },
        }
    }
}

pub struct CatalogStore {
    config: CatalogConfig,
    products: RwLock<Vec<ProductRecord>>,
    categories: Vec<String>,
    next_id: AtomicU64,
    pending_failures: AtomicU32,
    session: Arc<dyn SessionGate>,
}

impl CatalogStore {
    pub fn new(
        config: CatalogConfig,
        session: Arc<dyn SessionGate>,
        categories: Vec<String>,
        products: Vec<ProductRecord>,
    ) -> Self {
        let next_id = products
            .iter()
            .filter_map(|p| p.id.parse::<u64>().ok())
            .max()
            .unwrap_or(0)
            + 1;

        Self {
            config,
            products: RwLock::new(products),
            categories,
            next_id: AtomicU64::new(next_id),
            pending_failures: AtomicU32::new(0),
            session,
        }
    }

    /// Store preloaded with the demo catalog.
    pub fn seeded(config: CatalogConfig, session: Arc<dyn SessionGate>) -> Self {
        Self::new(config, session, seed::categories(), seed::products())
    }

    pub fn len(&self) -> usize {
        rw_read(&self.products, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make the next `count` read operations fail with a transient error.
    pub fn fail_next_reads(&self, count: u32) {
        self.pending_failures.store(count, Ordering::SeqCst);
    }

    async fn simulate_latency(&self, millis: u64) {
        if millis > 0 {
            tokio::time::sleep(Duration::from_millis(millis)).await;
        }
    }

    fn injected_failure(&self, op: &'static str) -> Result<(), CatalogError> {
        let consumed = self
            .pending_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if consumed.is_ok() {
            warn!(op, "Injected transient catalog failure");
            return Err(CatalogError::transient(format!("{op} failed")));
        }
        Ok(())
    }

    fn require_session(&self) -> Result<String, CatalogError> {
        if !self.session.is_session_active() {
            return Err(CatalogError::Unauthorized);
        }
        self.session
            .current_user_id()
            .ok_or(CatalogError::Unauthorized)
    }

    fn allocate_id(&self) -> String {
        self.next_id.fetch_add(1, Ordering::SeqCst).to_string()
    }
}

#[async_trait]
impl ProductsRepo for CatalogStore {
    #[instrument(skip(self))]
    async fn list_products(
        &self,
        filter: &ProductQueryFilter,
        page: &PageRequest,
    ) -> Result<ProductPage, CatalogError> {
        self.simulate_latency(self.config.latency.list_ms).await;
        self.injected_failure("list_products")?;

        let products = rw_read(&self.products, SOURCE, "list_products");
        let result = pipeline::list(&products, filter, page, self.config.match_mode);
        debug!(
            total = result.total,
            page = result.page,
            returned = result.items.len(),
            "Listed products"
        );
        Ok(result)
    }

    async fn find_by_id(&self, id: &str) -> Result<ProductRecord, CatalogError> {
        self.simulate_latency(self.config.latency.get_ms).await;
        self.injected_failure("find_by_id")?;

        rw_read(&self.products, SOURCE, "find_by_id")
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| CatalogError::not_found(id))
    }

    async fn list_categories(&self) -> Result<Vec<String>, CatalogError> {
        self.simulate_latency(self.config.latency.categories_ms).await;
        self.injected_failure("list_categories")?;
        Ok(self.categories.clone())
    }

    async fn search_products(&self, query: &str) -> Result<Vec<ProductRecord>, CatalogError> {
        self.simulate_latency(self.config.latency.search_ms).await;
        self.injected_failure("search_products")?;

        let products = rw_read(&self.products, SOURCE, "search_products");
        Ok(pipeline::search(&products, query, self.config.match_mode))
    }

    async fn list_by_category(&self, category: &str) -> Result<Vec<ProductRecord>, CatalogError> {
        self.simulate_latency(self.config.latency.by_category_ms).await;
        self.injected_failure("list_by_category")?;

        let products = rw_read(&self.products, SOURCE, "list_by_category");
        Ok(pipeline::by_category(&products, category))
    }
}

#[async_trait]
impl ProductsWriteRepo for CatalogStore {
    #[instrument(skip(self, product), fields(name = %product.name))]
    async fn create_product(&self, product: NewProduct) -> Result<ProductRecord, CatalogError> {
        self.simulate_latency(self.config.latency.create_ms).await;
        let owner = self.require_session()?;
        validate_new_product(&product)?;

        let now = OffsetDateTime::now_utc();
        let record = ProductRecord {
            id: self.allocate_id(),
            name: product.name,
            description: product.description,
            price: product.price,
            category: product.category,
            stock: product.stock,
            image_url: product.image_url,
            is_active: true,
            created_at: now,
            updated_at: now,
            created_by: owner,
        };

        rw_write(&self.products, SOURCE, "create_product").push(record.clone());
        debug!(product_id = %record.id, "Product stored");
        Ok(record)
    }

    #[instrument(skip(self, patch))]
    async fn update_product(
        &self,
        id: &str,
        patch: ProductPatch,
    ) -> Result<ProductRecord, CatalogError> {
        self.simulate_latency(self.config.latency.update_ms).await;
        self.require_session()?;
        validate_patch(&patch)?;

        let mut products = rw_write(&self.products, SOURCE, "update_product");
        let existing = products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| CatalogError::not_found(id))?;

        apply_patch(existing, patch);
        existing.updated_at = OffsetDateTime::now_utc().max(existing.created_at);

        debug!(product_id = %existing.id, "Product patched");
        Ok(existing.clone())
    }

    #[instrument(skip(self))]
    async fn delete_product(&self, id: &str) -> Result<(), CatalogError> {
        self.simulate_latency(self.config.latency.delete_ms).await;
        self.require_session()?;

        let mut products = rw_write(&self.products, SOURCE, "delete_product");
        let index = products
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| CatalogError::not_found(id))?;
        products.remove(index);

        debug!(product_id = id, "Product removed");
        Ok(())
    }
}

fn apply_patch(record: &mut ProductRecord, patch: ProductPatch) {
    let ProductPatch {
        name,
        description,
        price,
        category,
        stock,
        image_url,
        is_active,
    } = patch;

    if let Some(name) = name {
        record.name = name;
    }
    if let Some(description) = description {
        record.description = description;
    }
    if let Some(price) = price {
        record.price = price;
    }
    if let Some(category) = category {
        record.category = category;
    }
    if let Some(stock) = stock {
        record.stock = stock;
    }
    if let Some(image_url) = image_url {
        record.image_url = Some(image_url);
    }
    if let Some(is_active) = is_active {
        record.is_active = is_active;
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::application::session::StaticSession;

    fn store_with(session: Arc<StaticSession>) -> CatalogStore {
        let config = CatalogConfig {
            latency: LatencyProfile::instant(),
            ..Default::default()
        };
        CatalogStore::seeded(config, session)
    }

    fn speaker() -> NewProduct {
        NewProduct {
            name: "Parlante JBL Flip 6".to_string(),
            description: "Parlante portátil resistente al agua".to_string(),
            price: Decimal::new(49_999, 2),
            category: "Audio".to_string(),
            stock: 30,
            image_url: None,
        }
    }

    #[tokio::test]
    async fn create_requires_session() {
        let store = store_with(Arc::new(StaticSession::anonymous()));

        let err = store
            .create_product(speaker())
            .await
            .expect_err("anonymous create");
        assert_eq!(err, CatalogError::Unauthorized);
        assert_eq!(store.len(), 5);
    }

    #[tokio::test]
    async fn create_stamps_identity_and_timestamps() {
        let store = store_with(Arc::new(StaticSession::signed_in("2")));

        let created = store.create_product(speaker()).await.expect("created");
        assert_eq!(created.id, "6");
        assert!(created.is_active);
        assert_eq!(created.created_at, created.updated_at);
        assert_eq!(created.created_by, "2");

        let fetched = store.find_by_id(&created.id).await.expect("fetched");
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn ids_stay_unique_after_delete() {
        let store = store_with(Arc::new(StaticSession::signed_in("1")));

        store.delete_product("5").await.expect("deleted");
        let created = store.create_product(speaker()).await.expect("created");
        assert_eq!(created.id, "6");
    }

    #[tokio::test]
    async fn update_preserves_identity_fields() {
        let store = store_with(Arc::new(StaticSession::signed_in("2")));
        let before = store.find_by_id("3").await.expect("seeded");

        let patch = ProductPatch {
            stock: Some(0),
            name: Some("Sony WH-1000XM5".to_string()),
            ..Default::default()
        };
        let updated = store.update_product("3", patch).await.expect("updated");

        assert_eq!(updated.id, before.id);
        assert_eq!(updated.created_at, before.created_at);
        assert_eq!(updated.created_by, "1");
        assert_eq!(updated.stock, 0);
        assert_eq!(updated.name, "Sony WH-1000XM5");
        assert_eq!(updated.description, before.description);
        assert!(updated.updated_at >= updated.created_at);
    }

    #[tokio::test]
    async fn update_rejects_invalid_patch_without_mutating() {
        let store = store_with(Arc::new(StaticSession::signed_in("1")));
        let patch = ProductPatch {
            price: Some(Decimal::ZERO),
            stock: Some(-3),
            ..Default::default()
        };

        let err = store.update_product("1", patch).await.expect_err("invalid");
        match err {
            CatalogError::Validation(errors) => assert_eq!(errors.fields(), vec!["price", "stock"]),
            other => panic!("unexpected error: {other:?}"),
        }
        let unchanged = store.find_by_id("1").await.expect("seeded");
        assert_eq!(unchanged.stock, 25);
    }

    #[tokio::test]
    async fn missing_ids_are_not_found() {
        let store = store_with(Arc::new(StaticSession::signed_in("1")));

        assert_eq!(
            store.find_by_id("99").await.expect_err("missing"),
            CatalogError::not_found("99")
        );
        assert_eq!(
            store
                .update_product("99", ProductPatch::default())
                .await
                .expect_err("missing"),
            CatalogError::not_found("99")
        );
        assert_eq!(
            store.delete_product("99").await.expect_err("missing"),
            CatalogError::not_found("99")
        );
    }

    #[tokio::test]
    async fn accent_folded_search_ignores_punctuation_only_queries() {
        let config = CatalogConfig {
            latency: LatencyProfile::instant(),
            match_mode: MatchMode::AccentInsensitive,
        };
        let store = CatalogStore::seeded(config, Arc::new(StaticSession::anonymous()));

        assert!(store.search_products("+++").await.expect("search").is_empty());
        let hits = store.search_products("electronicos").await.expect("search");
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn categories_come_from_the_vocabulary() {
        let store = store_with(Arc::new(StaticSession::anonymous()));
        let categories = store.list_categories().await.expect("categories");
        assert_eq!(categories.len(), 7);
        assert!(categories.iter().any(|c| c == "Gaming"));
    }

    #[tokio::test]
    async fn injected_failures_are_consumed_in_order() {
        let store = store_with(Arc::new(StaticSession::anonymous()));
        store.fail_next_reads(1);

        let err = store.find_by_id("1").await.expect_err("injected");
        assert!(err.is_retryable());
        assert!(store.find_by_id("1").await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn reads_wait_for_simulated_latency() {
        let store = CatalogStore::seeded(
            CatalogConfig::default(),
            Arc::new(StaticSession::anonymous()),
        );
        let started = tokio::time::Instant::now();
        store.list_categories().await.expect("categories");
        assert!(started.elapsed() >= Duration::from_millis(300));
    }
}
