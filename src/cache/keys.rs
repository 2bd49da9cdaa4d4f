//! Query key registry.
//!
//! Every cached read is addressed by a [`QueryKey`]. Listing keys are built
//! from canonicalized filters and a resolved page so that two requests for
//! the same result always land on the same entry, regardless of how their
//! filters were spelled.

use std::fmt;

use rust_decimal::Decimal;
use serde_json::{Map, Value};

use crate::application::pagination::{PageRequest, ResolvedPage};
use crate::application::repos::ProductQueryFilter;
use crate::domain::types::{SortField, SortOrder};

/// Groups of keys that share a freshness window and invalidation rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QueryFamily {
    ProductList,
    ProductDetail,
    Categories,
    Search,
    ByCategory,
}

impl QueryFamily {
    pub const ALL: [QueryFamily; 5] = [
        QueryFamily::ProductList,
        QueryFamily::ProductDetail,
        QueryFamily::Categories,
        QueryFamily::Search,
        QueryFamily::ByCategory,
    ];

    /// Families whose results are derived from product records and go stale
    /// on any write.
    pub const PRODUCT_DERIVED: [QueryFamily; 3] = [
        QueryFamily::ProductList,
        QueryFamily::Search,
        QueryFamily::ByCategory,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            QueryFamily::ProductList => "products/list",
            QueryFamily::ProductDetail => "products/detail",
            QueryFamily::Categories => "products/categories",
            QueryFamily::Search => "products/search",
            QueryFamily::ByCategory => "products/by-category",
        }
    }
}

impl fmt::Display for QueryFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical key of one listing page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListKey {
    search: Option<String>,
    category: Option<String>,
    min_price: Option<Decimal>,
    max_price: Option<Decimal>,
    is_active: Option<bool>,
    page: u32,
    limit: u32,
    sort_by: SortField,
    sort_order: SortOrder,
}

/// Build the listing key for `filter` and `page`.
pub fn make_key(filter: &ProductQueryFilter, page: &PageRequest) -> ListKey {
    let ResolvedPage {
        page,
        limit,
        sort_by,
        sort_order,
    } = page.resolve();

    ListKey {
        search: canonical_text(filter.search.as_deref()),
        category: filter
            .category
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string),
        min_price: filter.min_price.map(|value| value.normalize()),
        max_price: filter.max_price.map(|value| value.normalize()),
        is_active: filter.is_active,
        page,
        limit,
        sort_by,
        sort_order,
    }
}

/// Search text is matched case-insensitively, so its key is lowercased.
fn canonical_text(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_lowercase)
}

/// Canonical form of a free-text search key.
pub fn search_key(query: &str) -> String {
    canonical_text(Some(query)).unwrap_or_default()
}

impl ListKey {
    /// The filter this key stands for, in canonical form.
    pub fn filter(&self) -> ProductQueryFilter {
        ProductQueryFilter {
            search: self.search.clone(),
            category: self.category.clone(),
            min_price: self.min_price,
            max_price: self.max_price,
            is_active: self.is_active,
        }
    }

    /// The fully resolved page request this key stands for.
    pub fn page_request(&self) -> PageRequest {
        PageRequest {
            page: Some(self.page),
            limit: Some(self.limit),
            sort_by: Some(self.sort_by),
            sort_order: Some(self.sort_order),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    fn fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        if let Some(search) = &self.search {
            fields.insert("search".into(), Value::from(search.as_str()));
        }
        if let Some(category) = &self.category {
            fields.insert("category".into(), Value::from(category.as_str()));
        }
        if let Some(min) = self.min_price {
            fields.insert("minPrice".into(), Value::from(min.to_string()));
        }
        if let Some(max) = self.max_price {
            fields.insert("maxPrice".into(), Value::from(max.to_string()));
        }
        if let Some(active) = self.is_active {
            fields.insert("isActive".into(), Value::from(active));
        }
        fields.insert("page".into(), Value::from(self.page));
        fields.insert("limit".into(), Value::from(self.limit));
        fields.insert("sortBy".into(), Value::from(self.sort_by.as_str()));
        fields.insert("sortOrder".into(), Value::from(self.sort_order.as_str()));
        fields
    }
}

/// Address of any cached query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    ProductList(ListKey),
    ProductDetail(String),
    Categories,
    Search(String),
    ByCategory(String),
}

impl QueryKey {
    pub fn list(filter: &ProductQueryFilter, page: &PageRequest) -> Self {
        QueryKey::ProductList(make_key(filter, page))
    }

    pub fn detail(id: impl Into<String>) -> Self {
        QueryKey::ProductDetail(id.into())
    }

    pub fn search(query: &str) -> Self {
        QueryKey::Search(search_key(query))
    }

    pub fn by_category(category: &str) -> Self {
        QueryKey::ByCategory(category.trim().to_string())
    }

    pub fn family(&self) -> QueryFamily {
        match self {
            QueryKey::ProductList(_) => QueryFamily::ProductList,
            QueryKey::ProductDetail(_) => QueryFamily::ProductDetail,
            QueryKey::Categories => QueryFamily::Categories,
            QueryKey::Search(_) => QueryFamily::Search,
            QueryKey::ByCategory(_) => QueryFamily::ByCategory,
        }
    }

    /// Stable rendering for logs: family prefix followed by sorted fields.
    pub fn fingerprint(&self) -> String {
        let fields = match self {
            QueryKey::ProductList(key) => key.fields(),
            QueryKey::ProductDetail(id) => single("id", id),
            QueryKey::Categories => Map::new(),
            QueryKey::Search(query) => single("query", query),
            QueryKey::ByCategory(category) => single("category", category),
        };
        format!("{}{}", self.family(), Value::Object(fields))
    }
}

fn single(name: &str, value: &str) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert(name.to_string(), Value::from(value));
    fields
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fingerprint())
    }
}
