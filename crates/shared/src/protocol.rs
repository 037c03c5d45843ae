use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::domain::UnknownVariant;

pub const DEFAULT_PAGE_SIZE: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Asc),
            "desc" | "descending" => Ok(SortOrder::Desc),
            _ => Err(UnknownVariant {
                kind: "sort order",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sort {
    pub key: String,
    pub order: SortOrder,
}

impl Sort {
    pub fn new(key: impl Into<String>, order: SortOrder) -> Self {
        Self {
            key: key.into(),
            order,
        }
    }
}

/// Snapshot of everything that drives a single list fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct Query<F> {
    pub page: u32,
    pub limit: u32,
    pub filters: F,
    pub sort: Option<Sort>,
}

impl<F: Default> Query<F> {
    /// Page and limit are raised to 1 when given as 0.
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.max(1),
            filters: F::default(),
            sort: None,
        }
    }
}

impl<F: Default> Default for Query<F> {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

impl<F> Query<F> {
    pub fn with_filters(mut self, filters: F) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

/// List response body as sent by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

/// One page of a remote collection.
///
/// `total_pages` is always `ceil(total / limit)` and `page` always lies in
/// `1..=max(total_pages, 1)`. Decoding goes through [`PageResponse`] so a
/// deserialized page holds the same guarantees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "PageResponse<T>")]
pub struct Page<T> {
    items: Vec<T>,
    total: u64,
    page: u32,
    limit: u32,
    total_pages: u32,
}

fn total_pages(total: u64, limit: u32) -> u32 {
    let pages = total.div_ceil(u64::from(limit.max(1)));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, page: u32, limit: u32) -> Self {
        let limit = limit.max(1);
        let total_pages = total_pages(total, limit);
        Self {
            items,
            total,
            page: page.clamp(1, total_pages.max(1)),
            limit,
            total_pages,
        }
    }

    pub fn empty(limit: u32) -> Self {
        Self::new(Vec::new(), 0, 1, limit)
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    /// Replaces the first item matching `pred` with `updater(item)`.
    pub fn replace_where(
        &mut self,
        pred: impl Fn(&T) -> bool,
        updater: impl FnOnce(&T) -> T,
    ) -> bool {
        match self.items.iter_mut().find(|item| pred(item)) {
            Some(slot) => {
                *slot = updater(slot);
                true
            }
            None => false,
        }
    }

    /// Drops the first item matching `pred` and shrinks `total` by one.
    ///
    /// `page` is left as is; stepping back off an emptied page is the
    /// caller's decision.
    pub fn remove_where(&mut self, pred: impl Fn(&T) -> bool) -> bool {
        let Some(index) = self.items.iter().position(pred) else {
            return false;
        };
        self.items.remove(index);
        self.total = self.total.saturating_sub(1);
        self.total_pages = total_pages(self.total, self.limit);
        true
    }
}

impl<T> From<PageResponse<T>> for Page<T> {
    fn from(value: PageResponse<T>) -> Self {
        Page::new(value.items, value.total, value.page, value.limit)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
}

/// Body for `PATCH /{resource}/{id}` status changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusPatch {
    pub status: String,
}
