//! Timing-sensitive cache behavior: coalescing, staleness, fallback and
//! placeholders. Runs on paused time so windows can be crossed instantly.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::advance;

use vitrina::application::error::CatalogError;
use vitrina::application::pagination::PageRequest;
use vitrina::application::products::ProductQueryService;
use vitrina::application::repos::{ProductPage, ProductQueryFilter, ProductsRepo};
use vitrina::application::session::StaticSession;
use vitrina::cache::{CacheConfig, EntryState, QueryCache, QueryKey, make_key};
use vitrina::context::AppContext;
use vitrina::domain::entities::ProductRecord;
use vitrina::infra::catalog::{CatalogConfig, CatalogStore};

struct CountingRepo {
    inner: Arc<CatalogStore>,
    lists: AtomicUsize,
}

#[async_trait]
impl ProductsRepo for CountingRepo {
    async fn list_products(
        &self,
        filter: &ProductQueryFilter,
        page: &PageRequest,
    ) -> Result<ProductPage, CatalogError> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        self.inner.list_products(filter, page).await
    }

    async fn find_by_id(&self, id: &str) -> Result<ProductRecord, CatalogError> {
        self.inner.find_by_id(id).await
    }

    async fn list_categories(&self) -> Result<Vec<String>, CatalogError> {
        self.inner.list_categories().await
    }

    async fn search_products(&self, query: &str) -> Result<Vec<ProductRecord>, CatalogError> {
        self.inner.search_products(query).await
    }

    async fn list_by_category(&self, category: &str) -> Result<Vec<ProductRecord>, CatalogError> {
        self.inner.list_by_category(category).await
    }
}

fn context() -> AppContext {
    AppContext::with_configs(
        CatalogConfig::default(),
        CacheConfig::default(),
        Arc::new(StaticSession::signed_in("1")),
    )
}

#[tokio::test(start_paused = true)]
async fn concurrent_reads_share_one_store_call() {
    let store = Arc::new(CatalogStore::seeded(
        CatalogConfig::default(),
        Arc::new(StaticSession::anonymous()),
    ));
    let repo = Arc::new(CountingRepo {
        inner: store,
        lists: AtomicUsize::new(0),
    });
    let config = CacheConfig::default();
    let service = ProductQueryService::new(
        repo.clone(),
        Arc::new(QueryCache::new(&config)),
        config.min_search_len,
    );

    let filter = ProductQueryFilter::category("Electrónicos");
    let request = PageRequest::default();
    let (a, b, c) = tokio::join!(
        service.list(&filter, &request),
        service.list(&filter, &request),
        service.list(&filter, &request),
    );

    assert_eq!(repo.lists.load(Ordering::SeqCst), 1);
    let a = a.expect("list");
    assert_eq!(a, b.expect("list"));
    assert_eq!(a, c.expect("list"));
    assert_eq!(a.total, 2);
}

#[tokio::test(start_paused = true)]
async fn staleness_is_checked_on_read() {
    let ctx = context();
    let filter = ProductQueryFilter::default();
    let request = PageRequest::default();
    let key = QueryKey::list(&filter, &request);

    ctx.products.list(&filter, &request).await.expect("list");
    assert_eq!(ctx.products.state(&key), EntryState::Fresh);

    advance(Duration::from_secs(4 * 60)).await;
    assert_eq!(ctx.products.state(&key), EntryState::Fresh);

    advance(Duration::from_secs(2 * 60)).await;
    assert_eq!(ctx.products.state(&key), EntryState::Stale);

    ctx.products.list(&filter, &request).await.expect("list");
    assert_eq!(ctx.products.state(&key), EntryState::Fresh);
}

#[tokio::test(start_paused = true)]
async fn failed_refresh_keeps_last_good_page() {
    let ctx = context();
    let filter = ProductQueryFilter::default();
    let request = PageRequest::default();

    let good = ctx.products.list(&filter, &request).await.expect("list");
    advance(Duration::from_secs(6 * 60)).await;
    ctx.store.fail_next_reads(1);

    let degraded = ctx.products.list_with_fallback(&filter, &request).await;
    assert_eq!(degraded.state, EntryState::Error);
    assert_eq!(degraded.data.as_ref(), Some(&good));
    assert!(degraded.error.as_ref().is_some_and(CatalogError::is_retryable));
    assert!(degraded.is_stale());

    // No silent retry inside the window.
    let hard = ctx.products.list(&filter, &request).await;
    assert!(matches!(hard, Err(CatalogError::Transient(_))));

    let retried = ctx.products.refetch_list(&filter, &request).await;
    assert_eq!(retried.state, EntryState::Fresh);
    assert_eq!(retried.error, None);
    assert_eq!(retried.data, Some(good));
}

#[tokio::test(start_paused = true)]
async fn first_load_failure_has_no_fallback() {
    let ctx = context();
    ctx.store.fail_next_reads(1);

    let result = ctx.products.get_with_fallback("2").await;
    assert_eq!(result.data, None);
    assert!(result.error.is_some());

    let retried = ctx.products.refetch_detail("2").await;
    assert_eq!(retried.data.map(|p| p.id), Some("2".to_string()));
}

#[tokio::test(start_paused = true)]
async fn paging_keeps_previous_page_as_placeholder() {
    let ctx = context();
    let filter = ProductQueryFilter::default();
    let mut observer = ctx.products.list_observer(&filter, &PageRequest::page(1, 2));

    let first = observer.resolve().await;
    let first_page = first.data.expect("page 1");
    assert_eq!(first_page.page, 1);

    observer.set_key(make_key(&filter, &PageRequest::page(2, 2)));
    let moving = observer.snapshot();
    assert_eq!(moving.state, EntryState::InFlight);
    assert!(moving.is_placeholder);
    assert_eq!(moving.data.as_ref(), Some(&first_page));

    let second = observer.resolve().await;
    assert!(!second.is_placeholder);
    let second_page = second.data.expect("page 2");
    assert_eq!(second_page.page, 2);
    assert_eq!(second_page.total, first_page.total);
    assert_ne!(second_page.items, first_page.items);
}

#[tokio::test(start_paused = true)]
async fn snapshot_serves_stale_data_while_refreshing() {
    let ctx = context();
    let filter = ProductQueryFilter::category("Audio");
    let mut observer = ctx.products.list_observer(&filter, &PageRequest::default());

    let loaded = observer.resolve().await.data.expect("loaded");
    advance(Duration::from_secs(6 * 60)).await;

    let refreshing = observer.snapshot();
    assert_eq!(refreshing.state, EntryState::InFlight);
    assert_eq!(refreshing.data, Some(loaded));
    assert!(!refreshing.is_placeholder);

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(observer.snapshot().state, EntryState::Fresh);
}
