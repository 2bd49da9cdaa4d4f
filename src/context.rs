//! Wiring of store, cache and services into one application context.

use std::sync::Arc;

use crate::application::admin::AdminProductService;
use crate::application::products::ProductQueryService;
use crate::application::session::SessionGate;
use crate::cache::{CacheConfig, CacheConsumer, CacheTrigger, EventQueue, QueryCache};
use crate::config::Settings;
use crate::infra::catalog::{CatalogConfig, CatalogStore};

/// Everything a caller needs to read and write the catalog.
#[derive(Clone)]
pub struct AppContext {
    pub store: Arc<CatalogStore>,
    pub cache: Arc<QueryCache>,
    pub cache_trigger: Option<Arc<CacheTrigger>>,
    pub products: ProductQueryService,
    pub admin: AdminProductService,
}

impl AppContext {
    pub fn build(settings: &Settings, session: Arc<dyn SessionGate>) -> Self {
        Self::with_configs(CatalogConfig::from(settings), settings.cache.clone(), session)
    }

    /// Seeded store behind a fresh cache.
    pub fn with_configs(
        catalog: CatalogConfig,
        cache_config: CacheConfig,
        session: Arc<dyn SessionGate>,
    ) -> Self {
        let store = Arc::new(CatalogStore::seeded(catalog, session));
        let cache = Arc::new(QueryCache::new(&cache_config));

        let cache_trigger = cache_config.enabled.then(|| {
            let queue = Arc::new(EventQueue::new());
            let consumer = Arc::new(CacheConsumer::new(
                cache_config.clone(),
                Arc::clone(&cache),
                Arc::clone(&queue),
            ));
            Arc::new(CacheTrigger::new(cache_config.clone(), queue, consumer))
        });

        let products = ProductQueryService::new(
            store.clone(),
            Arc::clone(&cache),
            cache_config.min_search_len,
        );
        let admin =
            AdminProductService::new(store.clone()).with_cache_trigger_opt(cache_trigger.clone());

        Self {
            store,
            cache,
            cache_trigger,
            products,
            admin,
        }
    }
}
