//! Product writes for signed-in operators.
//!
//! Writes go to the store first; the cache only hears about a write after the
//! store accepted it, so failed writes leave every cached query untouched.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::application::error::CatalogError;
use crate::application::repos::ProductsWriteRepo;
use crate::cache::CacheTrigger;
use crate::domain::entities::ProductRecord;
use crate::domain::products::{NewProduct, ProductPatch};

#[derive(Clone)]
pub struct AdminProductService {
    writer: Arc<dyn ProductsWriteRepo>,
    cache_trigger: Option<Arc<CacheTrigger>>,
}

impl AdminProductService {
    pub fn new(writer: Arc<dyn ProductsWriteRepo>) -> Self {
        Self {
            writer,
            cache_trigger: None,
        }
    }

    /// Set the cache trigger for this service.
    pub fn with_cache_trigger(mut self, trigger: Arc<CacheTrigger>) -> Self {
        self.cache_trigger = Some(trigger);
        self
    }

    /// Set the cache trigger for this service (optional).
    pub fn with_cache_trigger_opt(mut self, trigger: Option<Arc<CacheTrigger>>) -> Self {
        self.cache_trigger = trigger;
        self
    }

    #[instrument(skip(self, product), fields(name = %product.name))]
    pub async fn create_product(&self, product: NewProduct) -> Result<ProductRecord, CatalogError> {
        let created = self
            .writer
            .create_product(product)
            .await
            .inspect_err(|error| warn!(%error, "Product create rejected"))?;

        info!(product_id = %created.id, "Product created");
        if let Some(trigger) = &self.cache_trigger {
            trigger.product_created(&created);
        }
        Ok(created)
    }

    #[instrument(skip(self, patch))]
    pub async fn update_product(
        &self,
        id: &str,
        patch: ProductPatch,
    ) -> Result<ProductRecord, CatalogError> {
        let updated = self
            .writer
            .update_product(id, patch)
            .await
            .inspect_err(|error| warn!(%error, "Product update rejected"))?;

        info!(product_id = %updated.id, "Product updated");
        if let Some(trigger) = &self.cache_trigger {
            trigger.product_updated(&updated);
        }
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: &str) -> Result<(), CatalogError> {
        self.writer
            .delete_product(id)
            .await
            .inspect_err(|error| warn!(%error, "Product delete rejected"))?;

        info!(product_id = id, "Product deleted");
        if let Some(trigger) = &self.cache_trigger {
            trigger.product_deleted(id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::application::session::StaticSession;
    use crate::cache::{CacheConfig, CacheConsumer, EntryState, EventQueue, QueryCache, QueryKey};
    use crate::infra::catalog::{CatalogConfig, CatalogStore, seed};

    use super::*;

    fn admin(session: StaticSession) -> (Arc<QueryCache>, AdminProductService) {
        let store = Arc::new(CatalogStore::seeded(CatalogConfig::default(), Arc::new(session)));
        let config = CacheConfig::default();
        let cache = Arc::new(QueryCache::new(&config));
        let queue = Arc::new(EventQueue::new());
        let consumer = Arc::new(CacheConsumer::new(
            config.clone(),
            Arc::clone(&cache),
            Arc::clone(&queue),
        ));
        let trigger = Arc::new(CacheTrigger::new(config, queue, consumer));
        (cache, AdminProductService::new(store).with_cache_trigger(trigger))
    }

    fn keyboard() -> NewProduct {
        NewProduct {
            name: "Teclado mecánico".into(),
            description: "Switches táctiles".into(),
            price: Decimal::new(45_000, 2),
            category: "Accesorios".into(),
            stock: 30,
            image_url: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn successful_create_seeds_detail() {
        let (cache, admin) = admin(StaticSession::signed_in("1"));

        let created = admin.create_product(keyboard()).await.expect("create");

        assert_eq!(created.id, "6");
        assert_eq!(cache.state(&QueryKey::detail("6")), EntryState::Fresh);
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_write_leaves_cache_untouched() {
        let (cache, admin) = admin(StaticSession::anonymous());
        cache.details().set("1".into(), seed::products().remove(0));

        let result = admin
            .update_product(
                "1",
                ProductPatch {
                    stock: Some(0),
                    ..ProductPatch::default()
                },
            )
            .await;

        assert_eq!(result, Err(CatalogError::Unauthorized));
        assert_eq!(cache.state(&QueryKey::detail("1")), EntryState::Fresh);
        assert_eq!(cache.details().peek(&"1".to_string()).map(|p| p.stock), Some(25));
    }
}
