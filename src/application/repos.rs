//! Repository traits describing the catalog store.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::application::error::CatalogError;
use crate::application::pagination::{Page, PageRequest};
use crate::domain::entities::ProductRecord;
use crate::domain::products::{NewProduct, ProductPatch};

pub type ProductPage = Page<ProductRecord>;

/// Conjunctive listing filter. Absent fields impose no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductQueryFilter {
    pub search: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub is_active: Option<bool>,
}

impl ProductQueryFilter {
    pub fn category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            ..Self::default()
        }
    }

    pub fn search(search: impl Into<String>) -> Self {
        Self {
            search: Some(search.into()),
            ..Self::default()
        }
    }
}

#[async_trait]
pub trait ProductsRepo: Send + Sync {
    async fn list_products(
        &self,
        filter: &ProductQueryFilter,
        page: &PageRequest,
    ) -> Result<ProductPage, CatalogError>;

    async fn find_by_id(&self, id: &str) -> Result<ProductRecord, CatalogError>;

    async fn list_categories(&self) -> Result<Vec<String>, CatalogError>;

    /// Substring search over name, description and category, unpaginated.
    async fn search_products(&self, query: &str) -> Result<Vec<ProductRecord>, CatalogError>;

    /// Active products of one category, unpaginated.
    async fn list_by_category(&self, category: &str) -> Result<Vec<ProductRecord>, CatalogError>;
}

#[async_trait]
pub trait ProductsWriteRepo: Send + Sync {
    async fn create_product(&self, product: NewProduct) -> Result<ProductRecord, CatalogError>;

    async fn update_product(
        &self,
        id: &str,
        patch: ProductPatch,
    ) -> Result<ProductRecord, CatalogError>;

    async fn delete_product(&self, id: &str) -> Result<(), CatalogError>;
}
