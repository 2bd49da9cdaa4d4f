//! Cached read access to the product catalog.
//!
//! Every read goes through the [`QueryCache`]: concurrent readers of a key
//! share one store call and fresh results are served without touching the
//! store at all.

use std::sync::Arc;

use futures::FutureExt;
use tracing::debug;

use crate::application::error::CatalogError;
use crate::application::pagination::PageRequest;
use crate::application::repos::{ProductPage, ProductQueryFilter, ProductsRepo};
use crate::cache::{
    EntryState, Fetch, KeyLoader, ListKey, QueryCache, QueryKey, QueryObserver, QueryResult,
    make_key, search_key,
};
use crate::domain::entities::ProductRecord;

/// Listing observer that keeps the previous page visible while the next loads.
pub type ListObserver = QueryObserver<ListKey, ProductPage>;

#[derive(Clone)]
pub struct ProductQueryService {
    repo: Arc<dyn ProductsRepo>,
    cache: Arc<QueryCache>,
    min_search_len: usize,
}

impl ProductQueryService {
    pub fn new(repo: Arc<dyn ProductsRepo>, cache: Arc<QueryCache>, min_search_len: usize) -> Self {
        Self {
            repo,
            cache,
            min_search_len,
        }
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    pub fn state(&self, key: &QueryKey) -> EntryState {
        self.cache.state(key)
    }

    pub async fn list(
        &self,
        filter: &ProductQueryFilter,
        page: &PageRequest,
    ) -> Result<ProductPage, CatalogError> {
        let key = make_key(filter, page);
        let repo = Arc::clone(&self.repo);
        self.cache
            .lists()
            .fetch(&key, || load_list(repo, &key))
            .await
    }

    /// Listing read that keeps showing the last good page on failure.
    pub async fn list_with_fallback(
        &self,
        filter: &ProductQueryFilter,
        page: &PageRequest,
    ) -> QueryResult<ProductPage> {
        let key = make_key(filter, page);
        let repo = Arc::clone(&self.repo);
        self.cache
            .lists()
            .fetch_with_fallback(&key, || load_list(repo, &key))
            .await
    }

    /// Explicit retry of a listing, bypassing freshness and cached errors.
    pub async fn refetch_list(
        &self,
        filter: &ProductQueryFilter,
        page: &PageRequest,
    ) -> QueryResult<ProductPage> {
        let key = make_key(filter, page);
        let repo = Arc::clone(&self.repo);
        self.cache
            .lists()
            .refetch(&key, || load_list(repo, &key))
            .await
    }

    /// Observer starting at `filter`/`page`; move it with
    /// [`QueryObserver::set_key`] and [`make_key`].
    pub fn list_observer(&self, filter: &ProductQueryFilter, page: &PageRequest) -> ListObserver {
        let repo = Arc::clone(&self.repo);
        let loader: KeyLoader<ListKey, ProductPage> =
            Arc::new(move |key: &ListKey| load_list(Arc::clone(&repo), key));
        QueryObserver::new(self.cache.lists().clone(), loader, make_key(filter, page))
    }

    pub async fn get(&self, id: &str) -> Result<ProductRecord, CatalogError> {
        let repo = Arc::clone(&self.repo);
        self.cache
            .details()
            .fetch(&id.to_string(), || load_detail(repo, id))
            .await
    }

    pub async fn get_with_fallback(&self, id: &str) -> QueryResult<ProductRecord> {
        let repo = Arc::clone(&self.repo);
        self.cache
            .details()
            .fetch_with_fallback(&id.to_string(), || load_detail(repo, id))
            .await
    }

    pub async fn refetch_detail(&self, id: &str) -> QueryResult<ProductRecord> {
        let repo = Arc::clone(&self.repo);
        self.cache
            .details()
            .refetch(&id.to_string(), || load_detail(repo, id))
            .await
    }

    /// Warm the detail entry for `id`, e.g. when a pointer hovers a row.
    pub async fn prefetch(&self, id: &str) {
        let repo = Arc::clone(&self.repo);
        self.cache
            .details()
            .prefetch(&id.to_string(), || load_detail(repo, id))
            .await;
    }

    pub async fn categories(&self) -> Result<Vec<String>, CatalogError> {
        let repo = Arc::clone(&self.repo);
        self.cache
            .categories()
            .fetch(&(), || async move { repo.list_categories().await }.boxed())
            .await
    }

    /// Free-text search. Queries shorter than the configured minimum resolve
    /// to no results without a store call.
    pub async fn search(&self, query: &str) -> Result<Vec<ProductRecord>, CatalogError> {
        let key = search_key(query);
        if key.chars().count() < self.min_search_len {
            debug!(query, min = self.min_search_len, "Search below minimum length");
            return Ok(Vec::new());
        }

        let repo = Arc::clone(&self.repo);
        let needle = key.clone();
        self.cache
            .searches()
            .fetch(&key, || async move { repo.search_products(&needle).await }.boxed())
            .await
    }

    /// Active products in `category`; a blank category yields nothing.
    pub async fn by_category(&self, category: &str) -> Result<Vec<ProductRecord>, CatalogError> {
        let category = category.trim().to_string();
        if category.is_empty() {
            return Ok(Vec::new());
        }

        let repo = Arc::clone(&self.repo);
        let wanted = category.clone();
        self.cache
            .by_category()
            .fetch(&category, || {
                async move { repo.list_by_category(&wanted).await }.boxed()
            })
            .await
    }
}

fn load_list(repo: Arc<dyn ProductsRepo>, key: &ListKey) -> Fetch<ProductPage> {
    let filter = key.filter();
    let page = key.page_request();
    async move { repo.list_products(&filter, &page).await }.boxed()
}

fn load_detail(repo: Arc<dyn ProductsRepo>, id: &str) -> Fetch<ProductRecord> {
    let id = id.to_string();
    async move { repo.find_by_id(&id).await }.boxed()
}
