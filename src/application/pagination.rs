//! Offset pagination for product listings.

use serde::{Deserialize, Serialize};

use crate::domain::types::{SortField, SortOrder};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;

/// Pagination and ordering requested by a caller. Every field is optional;
/// absent or zero values resolve to the defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageRequest {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort_by: Option<SortField>,
    pub sort_order: Option<SortOrder>,
}

impl PageRequest {
    pub fn page(page: u32, limit: u32) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn sorted(mut self, sort_by: SortField, sort_order: SortOrder) -> Self {
        self.sort_by = Some(sort_by);
        self.sort_order = Some(sort_order);
        self
    }

    /// Resolve defaults so logically identical requests compare equal.
    pub fn resolve(&self) -> ResolvedPage {
        ResolvedPage {
            page: self.page.filter(|p| *p > 0).unwrap_or(DEFAULT_PAGE),
            limit: self.limit.filter(|l| *l > 0).unwrap_or(DEFAULT_LIMIT),
            sort_by: self.sort_by.unwrap_or_default(),
            sort_order: self.sort_order.unwrap_or_default(),
        }
    }
}

/// A [`PageRequest`] with every default applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResolvedPage {
    pub page: u32,
    pub limit: u32,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
}

impl ResolvedPage {
    /// Half-open index range of this page within a result set of `total` rows.
    pub fn bounds(&self, total: usize) -> (usize, usize) {
        let limit = self.limit as usize;
        let start = (self.page as usize - 1).saturating_mul(limit).min(total);
        let end = start.saturating_add(limit).min(total);
        (start, end)
    }
}

/// One page of a listing plus the counts needed to render a pager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u64,
}

impl<T> Page<T> {
    /// Slice an already filtered and sorted result set.
    pub fn from_sorted(mut rows: Vec<T>, request: &ResolvedPage) -> Self {
        let total = rows.len();
        let (start, end) = request.bounds(total);
        let items: Vec<T> = rows.drain(start..end).collect();
        Self {
            items,
            total: total as u64,
            page: request.page,
            limit: request.limit,
            total_pages: total_pages(total as u64, request.limit),
        }
    }
}

pub fn total_pages(total: u64, limit: u32) -> u64 {
    if limit == 0 {
        return 0;
    }
    total.div_ceil(u64::from(limit))
}
