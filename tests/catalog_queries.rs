//! Listing semantics of the seeded catalog, read through the cache.

use std::sync::Arc;

use rust_decimal::Decimal;

use vitrina::application::pagination::PageRequest;
use vitrina::application::repos::ProductQueryFilter;
use vitrina::application::session::StaticSession;
use vitrina::cache::CacheConfig;
use vitrina::context::AppContext;
use vitrina::domain::types::{SortField, SortOrder};
use vitrina::infra::catalog::CatalogConfig;

fn context() -> AppContext {
    AppContext::with_configs(
        CatalogConfig::default(),
        CacheConfig::default(),
        Arc::new(StaticSession::anonymous()),
    )
}

fn ids(page: &vitrina::application::repos::ProductPage) -> Vec<&str> {
    page.items.iter().map(|p| p.id.as_str()).collect()
}

#[tokio::test(start_paused = true)]
async fn total_does_not_depend_on_page() {
    let ctx = context();
    let filter = ProductQueryFilter::default();

    let first = ctx
        .products
        .list(&filter, &PageRequest::page(1, 2))
        .await
        .expect("page 1");
    let last = ctx
        .products
        .list(&filter, &PageRequest::page(3, 2))
        .await
        .expect("page 3");
    let beyond = ctx
        .products
        .list(&filter, &PageRequest::page(9, 2))
        .await
        .expect("page 9");

    assert_eq!(first.total, 5);
    assert_eq!(last.total, 5);
    assert_eq!(beyond.total, 5);
    assert_eq!(first.total_pages, 3);
    assert_eq!(first.items.len(), 2);
    assert_eq!(last.items.len(), 1);
    assert!(beyond.items.is_empty());
}

#[tokio::test(start_paused = true)]
async fn category_and_price_filters_combine() {
    let ctx = context();
    let filter = ProductQueryFilter {
        category: Some("Electrónicos".to_string()),
        min_price: Some(Decimal::new(3000, 0)),
        ..ProductQueryFilter::default()
    };

    let page = ctx
        .products
        .list(&filter, &PageRequest::default())
        .await
        .expect("list");

    assert_eq!(ids(&page), ["4"]);
    assert_eq!(page.total, 1);
    assert_eq!(page.total_pages, 1);
}

#[tokio::test(start_paused = true)]
async fn default_order_is_newest_first() {
    let ctx = context();
    let page = ctx
        .products
        .list(&ProductQueryFilter::default(), &PageRequest::default())
        .await
        .expect("list");
    assert_eq!(ids(&page), ["5", "4", "3", "2", "1"]);
}

#[tokio::test(start_paused = true)]
async fn equal_sort_values_fall_back_to_id() {
    let ctx = context();
    let request = PageRequest::default().sorted(SortField::Category, SortOrder::Asc);

    let page = ctx
        .products
        .list(&ProductQueryFilter::default(), &request)
        .await
        .expect("list");

    // Audio, Computadoras, Electrónicos x2, Tablets
    assert_eq!(ids(&page), ["3", "2", "1", "4", "5"]);
}

#[tokio::test(start_paused = true)]
async fn search_matches_description_case_insensitively() {
    let ctx = context();
    let page = ctx
        .products
        .list(&ProductQueryFilter::search("CANCELACIÓN"), &PageRequest::default())
        .await
        .expect("list");
    assert_eq!(ids(&page), ["3"]);
}

#[tokio::test(start_paused = true)]
async fn repeated_reads_are_identical() {
    let ctx = context();
    let filter = ProductQueryFilter::category("Electrónicos");
    let request = PageRequest::default().sorted(SortField::Price, SortOrder::Desc);

    let first = ctx.products.list(&filter, &request).await.expect("list");
    ctx.cache.clear();
    let second = ctx.products.list(&filter, &request).await.expect("list");

    assert_eq!(first, second);
    assert_eq!(ids(&first), ["4", "1"]);
}

#[tokio::test(start_paused = true)]
async fn by_category_and_categories() {
    let ctx = context();

    let audio = ctx.products.by_category("Audio").await.expect("by category");
    assert_eq!(audio.len(), 1);
    assert_eq!(audio[0].id, "3");

    let categories = ctx.products.categories().await.expect("categories");
    assert_eq!(categories.len(), 7);
    assert!(categories.iter().any(|c| c == "Hogar"));
}
