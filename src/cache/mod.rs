//! Vitrina query cache.
//!
//! Sits between readers and the catalog store:
//!
//! - **Keys** (`keys`): canonical addresses for every query family
//! - **Tables** (`table`, `store`): per-family entries with freshness
//!   windows, fetch coalescing and last-good fallback
//! - **Observers** (`observer`): key-following views with placeholders
//! - **Write pipeline** (`events`, `planner`, `consumer`, `trigger`):
//!   turns successful writes into invalidations and detail updates
//!
//! ## Configuration
//!
//! Windows and capacities come from the `[cache]` section of `vitrina.toml`:
//!
//! ```toml
//! [cache]
//! enabled = true
//! list_stale_secs = 300
//! detail_stale_secs = 600
//! min_search_len = 3
//! # ... see config.rs for all options
//! ```

mod config;
mod consumer;
mod events;
mod keys;
pub(crate) mod lock;
mod observer;
mod planner;
mod store;
mod table;
mod trigger;

pub use config::CacheConfig;
pub use consumer::CacheConsumer;
pub use events::{CacheEvent, Epoch, EventKind, EventQueue};
pub use keys::{ListKey, QueryFamily, QueryKey, make_key, search_key};
pub use observer::{KeyLoader, QueryObserver};
pub use planner::ConsumptionPlan;
pub use store::{CategoriesTable, DetailTable, KeyScope, ListTable, ProductsTable, QueryCache};
pub use table::{EntryState, Fetch, QueryResult, QueryTable};
pub use trigger::CacheTrigger;

pub(crate) use consumer::METRIC_CACHE_CONSUME_MS;
pub(crate) use table::{
    METRIC_CACHE_COALESCED, METRIC_CACHE_FETCH_ERROR, METRIC_CACHE_HIT, METRIC_CACHE_INVALIDATED,
    METRIC_CACHE_MISS,
};
