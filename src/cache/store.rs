//! Query cache storage.
//!
//! One [`QueryTable`] per family, each with its own freshness window and LRU
//! capacity taken from [`CacheConfig`].

use std::fmt::Debug;
use std::hash::Hash;

use crate::application::repos::ProductPage;
use crate::domain::entities::ProductRecord;

use super::config::CacheConfig;
use super::keys::{ListKey, QueryFamily, QueryKey};
use super::table::{EntryState, QueryTable};

pub type ListTable = QueryTable<ListKey, ProductPage>;
pub type DetailTable = QueryTable<String, ProductRecord>;
pub type CategoriesTable = QueryTable<(), Vec<String>>;
pub type ProductsTable = QueryTable<String, Vec<ProductRecord>>;

/// Addresses a set of cached queries for invalidation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyScope {
    All,
    Family(QueryFamily),
    Key(QueryKey),
}

pub struct QueryCache {
    lists: ListTable,
    details: DetailTable,
    categories: CategoriesTable,
    searches: ProductsTable,
    by_category: ProductsTable,
}

impl QueryCache {
    pub fn new(config: &CacheConfig) -> Self {
        let config = config.effective();
        Self {
            lists: table(&config, QueryFamily::ProductList),
            details: table(&config, QueryFamily::ProductDetail),
            categories: table(&config, QueryFamily::Categories),
            searches: table(&config, QueryFamily::Search),
            by_category: table(&config, QueryFamily::ByCategory),
        }
    }

    pub fn lists(&self) -> &ListTable {
        &self.lists
    }

    pub fn details(&self) -> &DetailTable {
        &self.details
    }

    pub fn categories(&self) -> &CategoriesTable {
        &self.categories
    }

    pub fn searches(&self) -> &ProductsTable {
        &self.searches
    }

    pub fn by_category(&self) -> &ProductsTable {
        &self.by_category
    }

    /// Mark every query in `scope` stale. Returns the number of entries hit.
    pub fn invalidate(&self, scope: &KeyScope) -> usize {
        match scope {
            KeyScope::All => QueryFamily::ALL
                .into_iter()
                .map(|family| self.invalidate_family(family))
                .sum(),
            KeyScope::Family(family) => self.invalidate_family(*family),
            KeyScope::Key(key) => usize::from(match key {
                QueryKey::ProductList(key) => self.lists.invalidate(key),
                QueryKey::ProductDetail(id) => self.details.invalidate(id),
                QueryKey::Categories => self.categories.invalidate(&()),
                QueryKey::Search(query) => self.searches.invalidate(query),
                QueryKey::ByCategory(category) => self.by_category.invalidate(category),
            }),
        }
    }

    fn invalidate_family(&self, family: QueryFamily) -> usize {
        match family {
            QueryFamily::ProductList => self.lists.invalidate_all(),
            QueryFamily::ProductDetail => self.details.invalidate_all(),
            QueryFamily::Categories => self.categories.invalidate_all(),
            QueryFamily::Search => self.searches.invalidate_all(),
            QueryFamily::ByCategory => self.by_category.invalidate_all(),
        }
    }

    pub fn state(&self, key: &QueryKey) -> EntryState {
        match key {
            QueryKey::ProductList(key) => self.lists.state(key),
            QueryKey::ProductDetail(id) => self.details.state(id),
            QueryKey::Categories => self.categories.state(&()),
            QueryKey::Search(query) => self.searches.state(query),
            QueryKey::ByCategory(category) => self.by_category.state(category),
        }
    }

    pub fn clear(&self) {
        self.lists.clear();
        self.details.clear();
        self.categories.clear();
        self.searches.clear();
        self.by_category.clear();
    }
}

fn table<K, V>(config: &CacheConfig, family: QueryFamily) -> QueryTable<K, V>
where
    K: Hash + Eq + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    QueryTable::new(family, config.stale_after(family), config.capacity(family))
}
