//! Cache consumer for executing consumption plans.
//!
//! Drains write events from the queue and applies them to the query cache.

use std::sync::Arc;
use std::time::Instant;

use metrics::histogram;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::config::CacheConfig;
use super::events::EventQueue;
use super::planner::ConsumptionPlan;
use super::store::{KeyScope, QueryCache};

pub(crate) const METRIC_CACHE_CONSUME_MS: &str = "vitrina_cache_consume_ms";

/// Applies queued write events to the [`QueryCache`].
///
/// Per batch:
/// 1. Mark the families derived from product records stale
/// 2. Overwrite detail entries with the records the store returned
/// 3. Drop detail entries of deleted products
pub struct CacheConsumer {
    config: CacheConfig,
    cache: Arc<QueryCache>,
    queue: Arc<EventQueue>,
}

impl CacheConsumer {
    pub fn new(config: CacheConfig, cache: Arc<QueryCache>, queue: Arc<EventQueue>) -> Self {
        Self {
            config,
            cache,
            queue,
        }
    }

    /// Apply every pending event. Returns whether anything was consumed.
    #[instrument(skip(self))]
    pub fn consume(&self) -> bool {
        let mut consumed = false;
        while self.consume_batch() {
            consumed = true;
        }
        consumed
    }

    fn consume_batch(&self) -> bool {
        let started_at = Instant::now();
        let events = self.queue.drain(self.config.consume_batch_limit.max(1));
        if events.is_empty() {
            return false;
        }

        let event_count = events.len();
        let event_ids: Vec<Uuid> = events.iter().map(|e| e.id).collect();
        let plan = ConsumptionPlan::from_events(events);

        info!(
            event_count,
            event_ids = ?event_ids,
            plan = %plan,
            "Cache consumption starting"
        );

        let mut invalidated = 0;
        for family in &plan.invalidate_families {
            invalidated += self.cache.invalidate(&KeyScope::Family(*family));
        }

        for (id, product) in plan.write_details {
            debug!(product_id = %id, "Detail entry overwritten");
            self.cache.details().set(id, product);
        }

        for id in &plan.remove_details {
            let removed = self.cache.details().remove(id);
            debug!(product_id = %id, removed, "Detail entry removed");
        }

        info!(event_count, invalidated, "Cache consumption complete");
        histogram!(METRIC_CACHE_CONSUME_MS).record(started_at.elapsed().as_secs_f64() * 1000.0);

        true
    }
}
