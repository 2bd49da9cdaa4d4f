//! Consumption plan generation.
//!
//! Merges a batch of write events into the cache actions they require.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use crate::domain::entities::ProductRecord;

use super::events::{CacheEvent, Epoch, EventKind};
use super::keys::QueryFamily;

/// What to do to the cache after a batch of writes.
///
/// Per product only the event with the highest epoch counts, so a create
/// followed by a delete in the same batch leaves no detail entry behind.
#[derive(Debug, Default)]
pub struct ConsumptionPlan {
    /// Families to mark stale as a whole.
    pub invalidate_families: BTreeSet<QueryFamily>,
    /// Detail entries to overwrite with the record the store returned.
    pub write_details: HashMap<String, ProductRecord>,
    /// Detail entries to drop.
    pub remove_details: HashSet<String>,
}

impl fmt::Display for ConsumptionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ConsumptionPlan {{ invalidate: {}, write_details: {}, remove_details: {} }}",
            self.invalidate_families.len(),
            self.write_details.len(),
            self.remove_details.len(),
        )
    }
}

impl ConsumptionPlan {
    pub fn from_events(events: Vec<CacheEvent>) -> Self {
        let mut plan = Self::default();
        let mut seen_ids = HashSet::new();
        let mut latest: HashMap<String, (Epoch, EventKind)> = HashMap::new();

        for event in events.into_iter().filter(|e| seen_ids.insert(e.id)) {
            latest
                .entry(event.kind.product_id().to_string())
                .and_modify(|(epoch, kind)| {
                    if event.epoch > *epoch {
                        *epoch = event.epoch;
                        *kind = event.kind.clone();
                    }
                })
                .or_insert((event.epoch, event.kind));
        }

        if !latest.is_empty() {
            plan.invalidate_families.extend(QueryFamily::PRODUCT_DERIVED);
        }

        for (id, (_, kind)) in latest {
            match kind {
                EventKind::ProductCreated { product } | EventKind::ProductUpdated { product } => {
                    plan.write_details.insert(id, product);
                }
                EventKind::ProductDeleted { .. } => {
                    plan.remove_details.insert(id);
                }
            }
        }

        plan
    }

    pub fn is_empty(&self) -> bool {
        self.invalidate_families.is_empty()
            && self.write_details.is_empty()
            && self.remove_details.is_empty()
    }
}
