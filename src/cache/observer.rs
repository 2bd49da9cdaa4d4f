//! Observers that follow one key at a time.
//!
//! When an observer moves to a key that has nothing cached yet, it keeps
//! exposing the value it showed last, flagged as a placeholder, until the new
//! key's fetch resolves. Paging through a listing therefore never flashes an
//! empty page.

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use super::table::{EntryState, Fetch, QueryResult, QueryTable};

/// Builds the store load for a key.
pub type KeyLoader<K, V> = Arc<dyn Fn(&K) -> Fetch<V> + Send + Sync>;

pub struct QueryObserver<K: Hash + Eq, V> {
    table: QueryTable<K, V>,
    loader: KeyLoader<K, V>,
    key: K,
    shown: Option<V>,
}

impl<K, V> QueryObserver<K, V>
where
    K: Hash + Eq + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(table: QueryTable<K, V>, loader: KeyLoader<K, V>, key: K) -> Self {
        Self {
            table,
            loader,
            key,
            shown: None,
        }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    /// Follow `key` from now on. The last shown value stays available as a
    /// placeholder.
    pub fn set_key(&mut self, key: K) {
        self.key = key;
    }

    /// Current view without waiting; starts a background fetch when needed.
    pub fn snapshot(&mut self) -> QueryResult<V> {
        let result = self
            .table
            .snapshot(&self.key, || (self.loader)(&self.key));
        self.present(result)
    }

    /// Wait for the current key to resolve.
    pub async fn resolve(&mut self) -> QueryResult<V> {
        let result = self
            .table
            .fetch_with_fallback(&self.key, || (self.loader)(&self.key))
            .await;
        self.present(result)
    }

    /// Explicit retry of the current key.
    pub async fn refetch(&mut self) -> QueryResult<V> {
        let result = self
            .table
            .refetch(&self.key, || (self.loader)(&self.key))
            .await;
        self.present(result)
    }

    fn present(&mut self, mut result: QueryResult<V>) -> QueryResult<V> {
        if result.data.is_some() {
            self.shown.clone_from(&result.data);
            return result;
        }
        if matches!(result.state, EntryState::Empty | EntryState::InFlight)
            && let Some(previous) = &self.shown
        {
            result.data = Some(previous.clone());
            result.is_placeholder = true;
        }
        result
    }
}
