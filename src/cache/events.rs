//! Catalog write events.
//!
//! Successful writes publish an event; the consumer turns queued events into
//! cache actions.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use crate::domain::entities::ProductRecord;

use super::lock::mutex_lock;

const SOURCE: &str = "cache::events";

/// Publication order within this process. A later epoch supersedes an
/// earlier one for the same product.
pub type Epoch = u64;

#[derive(Debug, Clone)]
pub struct CacheEvent {
    /// Idempotency key; duplicates are dropped by the planner.
    pub id: Uuid,
    pub epoch: Epoch,
    pub kind: EventKind,
    pub published_at: OffsetDateTime,
}

impl CacheEvent {
    pub fn new(kind: EventKind, epoch: Epoch) -> Self {
        Self {
            id: Uuid::new_v4(),
            epoch,
            kind,
            published_at: OffsetDateTime::now_utc(),
        }
    }
}

/// A catalog write that already succeeded against the store.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    ProductCreated { product: ProductRecord },
    ProductUpdated { product: ProductRecord },
    ProductDeleted { product_id: String },
}

impl EventKind {
    pub fn product_id(&self) -> &str {
        match self {
            EventKind::ProductCreated { product } | EventKind::ProductUpdated { product } => {
                &product.id
            }
            EventKind::ProductDeleted { product_id } => product_id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EventKind::ProductCreated { .. } => "product_created",
            EventKind::ProductUpdated { .. } => "product_updated",
            EventKind::ProductDeleted { .. } => "product_deleted",
        }
    }
}

/// FIFO of events waiting for the consumer.
pub struct EventQueue {
    queue: Mutex<VecDeque<CacheEvent>>,
    epochs: AtomicU64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            epochs: AtomicU64::new(0),
        }
    }

    pub fn next_epoch(&self) -> Epoch {
        self.epochs.fetch_add(1, Ordering::SeqCst)
    }

    pub fn publish(&self, kind: EventKind) -> Epoch {
        let event = CacheEvent::new(kind, self.next_epoch());
        debug!(
            event_id = %event.id,
            event_epoch = event.epoch,
            event_kind = event.kind.name(),
            product_id = event.kind.product_id(),
            "Cache event enqueued"
        );
        let epoch = event.epoch;
        mutex_lock(&self.queue, SOURCE, "publish").push_back(event);
        epoch
    }

    /// Remove up to `limit` events, oldest first.
    pub fn drain(&self, limit: usize) -> Vec<CacheEvent> {
        let mut queue = mutex_lock(&self.queue, SOURCE, "drain");
        let count = limit.min(queue.len());
        queue.drain(..count).collect()
    }

    pub fn len(&self) -> usize {
        mutex_lock(&self.queue, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        mutex_lock(&self.queue, SOURCE, "clear").clear();
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}
