//! Per-family query table.
//!
//! Each key owns one entry that moves through
//! `empty -> in-flight -> success -> stale -> error`. Concurrent readers of a
//! key share a single fetch through [`Shared`]; a fetch that was in flight
//! when its entry got invalidated, overwritten or removed is detached and its
//! result is never committed.

use std::fmt::Debug;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use lru::LruCache;
use metrics::counter;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::application::error::CatalogError;

use super::keys::QueryFamily;
use super::lock::mutex_lock;

const SOURCE: &str = "cache::table";

pub(crate) const METRIC_CACHE_HIT: &str = "vitrina_cache_hit_total";
pub(crate) const METRIC_CACHE_MISS: &str = "vitrina_cache_miss_total";
pub(crate) const METRIC_CACHE_COALESCED: &str = "vitrina_cache_coalesced_total";
pub(crate) const METRIC_CACHE_INVALIDATED: &str = "vitrina_cache_invalidated_total";
pub(crate) const METRIC_CACHE_FETCH_ERROR: &str = "vitrina_cache_fetch_error_total";

/// A boxed load of one query result from the store.
pub type Fetch<V> = BoxFuture<'static, Result<V, CatalogError>>;
type SharedFetch<V> = Shared<Fetch<V>>;

/// What a reader observes for a key at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryState {
    /// Nothing cached and nothing loading.
    Empty,
    /// A fetch is running; any previous value is still readable.
    InFlight,
    /// Successful value within its freshness window.
    Fresh,
    /// Successful value past its window, or invalidated.
    Stale,
    /// The last fetch failed; any previous value is kept as fallback.
    Error,
}

/// Outcome of a non-failing read.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult<V> {
    pub data: Option<V>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "error_message")]
    pub error: Option<CatalogError>,
    pub state: EntryState,
    /// `data` belongs to a previously observed key.
    pub is_placeholder: bool,
}

fn error_message<S: serde::Serializer>(
    error: &Option<CatalogError>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match error {
        Some(error) => serializer.serialize_str(&error.to_string()),
        None => serializer.serialize_none(),
    }
}

impl<V> QueryResult<V> {
    fn new(data: Option<V>, error: Option<CatalogError>, state: EntryState) -> Self {
        Self {
            data,
            error,
            state,
            is_placeholder: false,
        }
    }

    /// No data to show yet, only a pending fetch.
    pub fn is_loading(&self) -> bool {
        self.data.is_none() && self.state == EntryState::InFlight
    }

    /// Data is shown although it is not the fresh answer for the key.
    pub fn is_stale(&self) -> bool {
        self.data.is_some() && self.state != EntryState::Fresh
    }
}

struct Entry<V> {
    value: Option<V>,
    fetched_at: Option<Instant>,
    error: Option<CatalogError>,
    failed_at: Option<Instant>,
    invalidated: bool,
    in_flight: Option<(u64, SharedFetch<V>)>,
}

impl<V: Clone> Entry<V> {
    fn empty() -> Self {
        Self {
            value: None,
            fetched_at: None,
            error: None,
            failed_at: None,
            invalidated: false,
            in_flight: None,
        }
    }

    fn within(at: Option<Instant>, now: Instant, window: Duration) -> bool {
        at.is_some_and(|at| now.saturating_duration_since(at) < window)
    }

    /// Whether a plain read must start a new fetch.
    fn needs_fetch(&self, now: Instant, window: Duration) -> bool {
        if self.in_flight.is_some() {
            return false;
        }
        if self.invalidated {
            return true;
        }
        if self.error.is_some() {
            return !Self::within(self.failed_at, now, window);
        }
        self.value.is_none() || !Self::within(self.fetched_at, now, window)
    }

    fn state(&self, now: Instant, window: Duration) -> EntryState {
        if self.in_flight.is_some() {
            EntryState::InFlight
        } else if self.error.is_some() {
            EntryState::Error
        } else if self.value.is_none() {
            EntryState::Empty
        } else if !self.invalidated && Self::within(self.fetched_at, now, window) {
            EntryState::Fresh
        } else {
            EntryState::Stale
        }
    }

    fn result(&self, now: Instant, window: Duration) -> QueryResult<V> {
        QueryResult::new(
            self.value.clone(),
            self.error.clone(),
            self.state(now, window),
        )
    }

    fn detach(&mut self) -> bool {
        self.in_flight.take().is_some()
    }
}

struct Slots<K: Hash + Eq, V> {
    entries: LruCache<K, Entry<V>>,
    next_ticket: u64,
}

enum Lookup<V> {
    Ready(V),
    Failed {
        error: CatalogError,
        fallback: Option<V>,
    },
    Pending {
        fetch: SharedFetch<V>,
        fallback: Option<V>,
    },
}

/// Cached results of one query family.
pub struct QueryTable<K: Hash + Eq, V> {
    family: QueryFamily,
    window: Duration,
    slots: Arc<Mutex<Slots<K, V>>>,
}

impl<K: Hash + Eq, V> Clone for QueryTable<K, V> {
    fn clone(&self) -> Self {
        Self {
            family: self.family,
            window: self.window,
            slots: Arc::clone(&self.slots),
        }
    }
}

impl<K, V> QueryTable<K, V>
where
    K: Hash + Eq + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(family: QueryFamily, window: Duration, capacity: NonZeroUsize) -> Self {
        Self {
            family,
            window,
            slots: Arc::new(Mutex::new(Slots {
                entries: LruCache::new(capacity),
                next_ticket: 0,
            })),
        }
    }

    pub fn family(&self) -> QueryFamily {
        self.family
    }

    /// Read through the cache. Failures are returned to the caller.
    pub async fn fetch<L>(&self, key: &K, loader: L) -> Result<V, CatalogError>
    where
        L: FnOnce() -> Fetch<V>,
    {
        match self.lookup(key, loader, false) {
            Lookup::Ready(value) => Ok(value),
            Lookup::Failed { error, .. } => Err(error),
            Lookup::Pending { fetch, .. } => fetch.await,
        }
    }

    /// Read through the cache, keeping the last good value next to a failure.
    pub async fn fetch_with_fallback<L>(&self, key: &K, loader: L) -> QueryResult<V>
    where
        L: FnOnce() -> Fetch<V>,
    {
        let lookup = self.lookup(key, loader, false);
        self.settle(key, lookup).await
    }

    /// Explicit retry: starts a fetch even when the entry is fresh or failed,
    /// unless one is already running.
    pub async fn refetch<L>(&self, key: &K, loader: L) -> QueryResult<V>
    where
        L: FnOnce() -> Fetch<V>,
    {
        let lookup = self.lookup(key, loader, true);
        self.settle(key, lookup).await
    }

    /// Warm `key` without handing the value back. Failures are recorded on
    /// the entry only.
    pub async fn prefetch<L>(&self, key: &K, loader: L)
    where
        L: FnOnce() -> Fetch<V>,
    {
        if let Lookup::Pending { fetch, .. } = self.lookup(key, loader, false)
            && let Err(error) = fetch.await
        {
            debug!(family = %self.family, ?key, %error, "Prefetch failed");
        }
    }

    /// Current view of `key` without waiting. Starts a background refresh
    /// when the entry needs one.
    pub fn snapshot<L>(&self, key: &K, loader: L) -> QueryResult<V>
    where
        L: FnOnce() -> Fetch<V>,
    {
        let now = Instant::now();
        let mut slots = mutex_lock(&self.slots, SOURCE, "snapshot");
        let Slots {
            entries,
            next_ticket,
        } = &mut *slots;
        let entry = entries.get_or_insert_mut(key.clone(), Entry::empty);
        if entry.needs_fetch(now, self.window) {
            counter!(METRIC_CACHE_MISS, "family" => self.family.as_str()).increment(1);
            let _driven = self.start(entry, next_ticket, key.clone(), loader);
        }
        entry.result(now, self.window)
    }

    /// Overwrite `key` with a fresh value, detaching any running fetch.
    pub fn set(&self, key: K, value: V) {
        let mut slots = mutex_lock(&self.slots, SOURCE, "set");
        let entry = slots.entries.get_or_insert_mut(key, Entry::empty);
        entry.detach();
        entry.value = Some(value);
        entry.fetched_at = Some(Instant::now());
        entry.error = None;
        entry.failed_at = None;
        entry.invalidated = false;
    }

    pub fn remove(&self, key: &K) -> bool {
        mutex_lock(&self.slots, SOURCE, "remove")
            .entries
            .pop(key)
            .is_some()
    }

    /// Mark `key` stale, keeping its value. Returns whether it was cached.
    pub fn invalidate(&self, key: &K) -> bool {
        let mut slots = mutex_lock(&self.slots, SOURCE, "invalidate");
        let Some(entry) = slots.entries.peek_mut(key) else {
            return false;
        };
        entry.invalidated = true;
        if entry.detach() {
            debug!(family = %self.family, ?key, "Detached in-flight fetch");
        }
        counter!(METRIC_CACHE_INVALIDATED, "family" => self.family.as_str()).increment(1);
        true
    }

    /// Mark every entry of the family stale. Returns how many were cached.
    pub fn invalidate_all(&self) -> usize {
        let mut slots = mutex_lock(&self.slots, SOURCE, "invalidate_all");
        let mut count = 0;
        for (_, entry) in slots.entries.iter_mut() {
            entry.invalidated = true;
            entry.detach();
            count += 1;
        }
        counter!(METRIC_CACHE_INVALIDATED, "family" => self.family.as_str())
            .increment(count as u64);
        count
    }

    pub fn clear(&self) {
        mutex_lock(&self.slots, SOURCE, "clear").entries.clear();
    }

    pub fn state(&self, key: &K) -> EntryState {
        mutex_lock(&self.slots, SOURCE, "state")
            .entries
            .peek(key)
            .map_or(EntryState::Empty, |entry| {
                entry.state(Instant::now(), self.window)
            })
    }

    /// Last successful value regardless of freshness.
    pub fn peek(&self, key: &K) -> Option<V> {
        mutex_lock(&self.slots, SOURCE, "peek")
            .entries
            .peek(key)
            .and_then(|entry| entry.value.clone())
    }

    pub fn len(&self) -> usize {
        mutex_lock(&self.slots, SOURCE, "len").entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup<L>(&self, key: &K, loader: L, force: bool) -> Lookup<V>
    where
        L: FnOnce() -> Fetch<V>,
    {
        let now = Instant::now();
        let family = self.family.as_str();
        let mut slots = mutex_lock(&self.slots, SOURCE, "lookup");
        let Slots {
            entries,
            next_ticket,
        } = &mut *slots;
        let entry = entries.get_or_insert_mut(key.clone(), Entry::empty);

        if let Some((_, fetch)) = &entry.in_flight {
            counter!(METRIC_CACHE_COALESCED, "family" => family).increment(1);
            return Lookup::Pending {
                fetch: fetch.clone(),
                fallback: entry.value.clone(),
            };
        }

        if !force && !entry.needs_fetch(now, self.window) {
            if let Some(error) = &entry.error {
                return Lookup::Failed {
                    error: error.clone(),
                    fallback: entry.value.clone(),
                };
            }
            if let Some(value) = &entry.value {
                counter!(METRIC_CACHE_HIT, "family" => family).increment(1);
                return Lookup::Ready(value.clone());
            }
        }

        counter!(METRIC_CACHE_MISS, "family" => family).increment(1);
        let fetch = self.start(entry, next_ticket, key.clone(), loader);
        Lookup::Pending {
            fetch,
            fallback: entry.value.clone(),
        }
    }

    fn start<L>(
        &self,
        entry: &mut Entry<V>,
        next_ticket: &mut u64,
        key: K,
        loader: L,
    ) -> SharedFetch<V>
    where
        L: FnOnce() -> Fetch<V>,
    {
        *next_ticket += 1;
        let ticket = *next_ticket;
        let slots = Arc::downgrade(&self.slots);
        let family = self.family;
        let load = loader();

        let fetch = async move {
            let result = load.await;
            commit(&slots, &key, ticket, &result, family);
            result
        }
        .boxed()
        .shared();

        entry.in_flight = Some((ticket, fetch.clone()));
        spawn_driver(fetch.clone());
        fetch
    }

    async fn settle(&self, key: &K, lookup: Lookup<V>) -> QueryResult<V> {
        let (fetch, fallback) = match lookup {
            Lookup::Ready(value) => {
                return QueryResult::new(Some(value), None, EntryState::Fresh);
            }
            Lookup::Failed { error, fallback } => {
                return QueryResult::new(fallback, Some(error), EntryState::Error);
            }
            Lookup::Pending { fetch, fallback } => (fetch, fallback),
        };
        match fetch.await {
            Ok(value) => QueryResult::new(Some(value), None, EntryState::Fresh),
            Err(error) => {
                let data = self.peek(key).or(fallback);
                QueryResult::new(data, Some(error), EntryState::Error)
            }
        }
    }
}

/// Store a finished fetch, unless its entry moved on while it ran.
fn commit<K, V>(
    slots: &Weak<Mutex<Slots<K, V>>>,
    key: &K,
    ticket: u64,
    result: &Result<V, CatalogError>,
    family: QueryFamily,
) where
    K: Hash + Eq + Debug,
    V: Clone,
{
    let Some(slots) = slots.upgrade() else {
        return;
    };
    let mut slots = mutex_lock(&slots, SOURCE, "commit");
    let Some(entry) = slots.entries.peek_mut(key) else {
        debug!(%family, ?key, "Discarded fetch for evicted entry");
        return;
    };
    if entry.in_flight.as_ref().map(|(current, _)| *current) != Some(ticket) {
        debug!(%family, ?key, ticket, "Discarded superseded fetch");
        return;
    }

    entry.in_flight = None;
    entry.invalidated = false;
    let now = Instant::now();
    match result {
        Ok(value) => {
            entry.value = Some(value.clone());
            entry.fetched_at = Some(now);
            entry.error = None;
            entry.failed_at = None;
        }
        Err(error) => {
            counter!(METRIC_CACHE_FETCH_ERROR, "family" => family.as_str()).increment(1);
            warn!(
                %family,
                ?key,
                %error,
                kept_fallback = entry.value.is_some(),
                "Query fetch failed"
            );
            entry.error = Some(error.clone());
            entry.failed_at = Some(now);
        }
    }
}

/// Drive a fetch to completion even if every reader stops waiting for it.
/// Without a runtime, the next awaiting reader drives it instead.
fn spawn_driver<V>(fetch: SharedFetch<V>)
where
    V: Clone + Send + Sync + 'static,
{
    if let Ok(handle) = tokio::runtime::Handle::try_current() {
        handle.spawn(fetch.map(|_| ()));
    }
}
