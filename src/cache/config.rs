//! Cache configuration.
//!
//! Freshness windows and capacities per query family, loaded from the
//! `[cache]` section of `vitrina.toml`.

use std::num::NonZeroUsize;
use std::time::Duration;

use serde::Deserialize;

use super::keys::QueryFamily;

const DEFAULT_LIST_STALE_SECS: u64 = 5 * 60;
const DEFAULT_DETAIL_STALE_SECS: u64 = 10 * 60;
const DEFAULT_CATEGORIES_STALE_SECS: u64 = 30 * 60;
const DEFAULT_SEARCH_STALE_SECS: u64 = 5 * 60;
const DEFAULT_BY_CATEGORY_STALE_SECS: u64 = 10 * 60;
const DEFAULT_LIST_LIMIT: usize = 200;
const DEFAULT_DETAIL_LIMIT: usize = 500;
const DEFAULT_SEARCH_LIMIT: usize = 100;
const DEFAULT_MIN_SEARCH_LEN: usize = 3;
const DEFAULT_CONSUME_BATCH_LIMIT: usize = 100;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// When off, every read goes to the store and writes publish no events.
    pub enabled: bool,
    pub list_stale_secs: u64,
    pub detail_stale_secs: u64,
    pub categories_stale_secs: u64,
    pub search_stale_secs: u64,
    pub by_category_stale_secs: u64,
    /// Maximum cached listing pages.
    pub list_limit: usize,
    /// Maximum cached product details.
    pub detail_limit: usize,
    /// Maximum cached search and by-category results, each.
    pub search_limit: usize,
    /// Shorter search queries resolve to an empty result without fetching.
    pub min_search_len: usize,
    /// Maximum events applied per consumption batch.
    pub consume_batch_limit: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            list_stale_secs: DEFAULT_LIST_STALE_SECS,
            detail_stale_secs: DEFAULT_DETAIL_STALE_SECS,
            categories_stale_secs: DEFAULT_CATEGORIES_STALE_SECS,
            search_stale_secs: DEFAULT_SEARCH_STALE_SECS,
            by_category_stale_secs: DEFAULT_BY_CATEGORY_STALE_SECS,
            list_limit: DEFAULT_LIST_LIMIT,
            detail_limit: DEFAULT_DETAIL_LIMIT,
            search_limit: DEFAULT_SEARCH_LIMIT,
            min_search_len: DEFAULT_MIN_SEARCH_LEN,
            consume_batch_limit: DEFAULT_CONSUME_BATCH_LIMIT,
        }
    }
}

impl CacheConfig {
    /// How long a successful result of `family` is served without refetching.
    pub fn stale_after(&self, family: QueryFamily) -> Duration {
        let secs = match family {
            QueryFamily::ProductList => self.list_stale_secs,
            QueryFamily::ProductDetail => self.detail_stale_secs,
            QueryFamily::Categories => self.categories_stale_secs,
            QueryFamily::Search => self.search_stale_secs,
            QueryFamily::ByCategory => self.by_category_stale_secs,
        };
        Duration::from_secs(secs)
    }

    /// Entry capacity for `family`, clamped to at least one.
    pub fn capacity(&self, family: QueryFamily) -> NonZeroUsize {
        let limit = match family {
            QueryFamily::ProductList => self.list_limit,
            QueryFamily::ProductDetail => self.detail_limit,
            QueryFamily::Categories => 1,
            QueryFamily::Search | QueryFamily::ByCategory => self.search_limit,
        };
        NonZeroUsize::new(limit).unwrap_or(NonZeroUsize::MIN)
    }

    /// Windows collapsed to zero so every read refetches; used when disabled.
    pub fn effective(&self) -> Self {
        if self.enabled {
            return self.clone();
        }
        Self {
            list_stale_secs: 0,
            detail_stale_secs: 0,
            categories_stale_secs: 0,
            search_stale_secs: 0,
            by_category_stale_secs: 0,
            ..self.clone()
        }
    }
}
