//! Cache trigger service.
//!
//! Entry point for write paths: publishes the event for a successful write
//! and applies it before returning, so the writer's next read already sees
//! the new state.

use std::sync::Arc;

use tracing::debug;

use crate::domain::entities::ProductRecord;

use super::config::CacheConfig;
use super::consumer::CacheConsumer;
use super::events::{EventKind, EventQueue};

pub struct CacheTrigger {
    config: CacheConfig,
    queue: Arc<EventQueue>,
    consumer: Arc<CacheConsumer>,
}

impl CacheTrigger {
    pub fn new(config: CacheConfig, queue: Arc<EventQueue>, consumer: Arc<CacheConsumer>) -> Self {
        Self {
            config,
            queue,
            consumer,
        }
    }

    /// Publish `kind`, consuming the queue right away when `consume_now`.
    /// Deferred events are applied by the next consumption.
    pub fn trigger(&self, kind: EventKind, consume_now: bool) {
        if !self.config.enabled {
            debug!(event_kind = kind.name(), "Cache trigger skipped: cache disabled");
            return;
        }

        self.queue.publish(kind);

        if consume_now {
            self.consumer.consume();
        }
    }

    pub fn product_created(&self, product: &ProductRecord) {
        self.trigger(
            EventKind::ProductCreated {
                product: product.clone(),
            },
            true,
        );
    }

    pub fn product_updated(&self, product: &ProductRecord) {
        self.trigger(
            EventKind::ProductUpdated {
                product: product.clone(),
            },
            true,
        );
    }

    pub fn product_deleted(&self, product_id: &str) {
        self.trigger(
            EventKind::ProductDeleted {
                product_id: product_id.to_string(),
            },
            true,
        );
    }

    pub fn queue(&self) -> &Arc<EventQueue> {
        &self.queue
    }

    pub fn consumer(&self) -> &Arc<CacheConsumer> {
        &self.consumer
    }
}

#[cfg(test)]
mod tests {
    use crate::cache::keys::QueryKey;
    use crate::cache::store::QueryCache;
    use crate::cache::table::EntryState;
    use crate::infra::catalog::seed;

    use super::*;

    fn trigger(config: CacheConfig) -> (Arc<QueryCache>, CacheTrigger) {
        let cache = Arc::new(QueryCache::new(&config));
        let queue = Arc::new(EventQueue::new());
        let consumer = Arc::new(CacheConsumer::new(
            config.clone(),
            Arc::clone(&cache),
            Arc::clone(&queue),
        ));
        (cache, CacheTrigger::new(config, queue, consumer))
    }

    #[tokio::test(start_paused = true)]
    async fn created_product_is_seeded_immediately() {
        let (cache, trigger) = trigger(CacheConfig::default());
        let product = seed::products().remove(2);

        trigger.product_created(&product);

        assert!(trigger.queue().is_empty());
        assert_eq!(cache.state(&QueryKey::detail("3")), EntryState::Fresh);
    }

    #[test]
    fn deferred_events_wait_for_consumer() {
        let (cache, trigger) = trigger(CacheConfig::default());
        trigger.trigger(
            EventKind::ProductDeleted {
                product_id: "1".into(),
            },
            false,
        );

        assert_eq!(trigger.queue().len(), 1);
        assert!(trigger.consumer().consume());
        assert!(cache.details().is_empty());
    }

    #[test]
    fn disabled_cache_publishes_nothing() {
        let (_cache, trigger) = trigger(CacheConfig {
            enabled: false,
            ..CacheConfig::default()
        });

        trigger.product_deleted("1");

        assert!(trigger.queue().is_empty());
    }
}
