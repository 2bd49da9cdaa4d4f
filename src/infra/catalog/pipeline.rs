//! Filter, sort and paginate over a snapshot of the collection.
//!
//! Stage order is fixed: search, category, price range, active flag, sort,
//! slice. Sorting always breaks ties by ascending `id` so the output never
//! depends on collection order.

use std::cmp::Ordering;

use crate::application::pagination::PageRequest;
use crate::application::repos::{ProductPage, ProductQueryFilter};
use crate::domain::entities::ProductRecord;
use crate::domain::text::{MatchMode, SearchNeedle};
use crate::domain::types::{SortField, SortOrder};

pub(crate) fn list(
    products: &[ProductRecord],
    filter: &ProductQueryFilter,
    page: &PageRequest,
    mode: MatchMode,
) -> ProductPage {
    let resolved = page.resolve();
    let needle = present(filter.search.as_deref()).map(|s| SearchNeedle::new(s, mode));
    let category = present(filter.category.as_deref());

    let mut rows: Vec<ProductRecord> = products
        .iter()
        .filter(|p| {
            needle
                .as_ref()
                .is_none_or(|n| n.matches_any([p.name.as_str(), p.description.as_str()]))
        })
        .filter(|p| category.is_none_or(|c| p.category == c))
        .filter(|p| filter.min_price.is_none_or(|min| p.price >= min))
        .filter(|p| filter.max_price.is_none_or(|max| p.price <= max))
        .filter(|p| filter.is_active.is_none_or(|active| p.is_active == active))
        .cloned()
        .collect();

    sort(&mut rows, resolved.sort_by, resolved.sort_order);
    ProductPage::from_sorted(rows, &resolved)
}

pub(crate) fn search(
    products: &[ProductRecord],
    query: &str,
    mode: MatchMode,
) -> Vec<ProductRecord> {
    let needle = SearchNeedle::new(query, mode);
    products
        .iter()
        .filter(|p| {
            needle.matches_any([
                p.name.as_str(),
                p.description.as_str(),
                p.category.as_str(),
            ])
        })
        .cloned()
        .collect()
}

pub(crate) fn by_category(products: &[ProductRecord], category: &str) -> Vec<ProductRecord> {
    products
        .iter()
        .filter(|p| p.is_active && p.category == category)
        .cloned()
        .collect()
}

pub(crate) fn sort(rows: &mut [ProductRecord], field: SortField, order: SortOrder) {
    rows.sort_by(|a, b| order.apply(compare(a, b, field)).then_with(|| a.id.cmp(&b.id)));
}

fn compare(a: &ProductRecord, b: &ProductRecord, field: SortField) -> Ordering {
    match field {
        SortField::Id => a.id.cmp(&b.id),
        SortField::Name => a.name.cmp(&b.name),
        SortField::Description => a.description.cmp(&b.description),
        SortField::Category => a.category.cmp(&b.category),
        SortField::Price => a.price.cmp(&b.price),
        SortField::Stock => a.stock.cmp(&b.stock),
        SortField::IsActive => a.is_active.cmp(&b.is_active),
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
    }
}

/// Blank strings count as absent, matching how list forms submit "all".
fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
