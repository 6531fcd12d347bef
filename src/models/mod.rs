//! # Domain models
//!
//! Entities are read straight from SQLite rows (`FromRow`); request DTOs
//! carry `validator` rules; response DTOs are what leaves the API.

mod book;
mod cart;
mod catalog;
mod dto;
mod order;
mod user;

pub use book::*;
pub use cart::*;
pub use catalog::*;
pub use dto::*;
pub use order::*;
pub use user::*;

use serde::{Deserialize, Serialize};

/// Largest page a client may ask for.
pub const MAX_PER_PAGE: u32 = 100;
pub const DEFAULT_PER_PAGE: u32 = 20;

/// Fresh opaque identifier for a new row.
#[must_use]
pub fn new_id() -> String {
    nanoid::nanoid!(21)
}

// =====================================
// Pagination
// =====================================
/// 1-based page request, read from `?page=&per_page=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_page")]
    pub page: u32,

    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    DEFAULT_PER_PAGE
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl Pagination {
    /// Raw values; see [`normalize`](Self::normalize).
    #[must_use]
    pub fn new(page: u32, per_page: u32) -> Self {
        Self { page, per_page }
    }

    /// Page 0 becomes 1 and `per_page` is clamped into `1..=MAX_PER_PAGE`.
    #[must_use]
    pub fn normalize(self) -> Self {
        Self {
            page: self.page.max(1),
            per_page: self.per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    /// SQL `OFFSET` of the normalized page.
    #[must_use]
    pub fn offset(&self) -> i64 {
        let p = self.normalize();
        i64::from(p.page - 1) * i64::from(p.per_page)
    }

    /// SQL `LIMIT` of the normalized page.
    #[must_use]
    pub fn limit(&self) -> i64 {
        i64::from(self.normalize().per_page)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResult<T> {
    pub data: Vec<T>,
    pub pagination: PaginationInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationInfo {
    pub current_page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PaginationInfo {
    /// Page metadata for `total_items` rows.
    ///
    /// ```rust
    /// use bookstore::models::{Pagination, PaginationInfo};
    ///
    /// let info = PaginationInfo::new(&Pagination::new(2, 10), 25);
    /// assert_eq!(info.total_pages, 3);
    /// assert!(info.has_next && info.has_prev);
    /// ```
    #[must_use]
    pub fn new(pagination: &Pagination, total_items: u64) -> Self {
        let p = pagination.normalize();
        let per_page = u64::from(p.per_page);
        let total_pages = u32::try_from(total_items.div_ceil(per_page)).unwrap_or(u32::MAX);

        Self {
            current_page: p.page,
            per_page: p.per_page,
            total_items,
            total_pages,
            has_next: p.page < total_pages,
            has_prev: p.page > 1,
        }
    }
}

impl<T> PaginatedResult<T> {
    pub fn new(data: Vec<T>, pagination: &Pagination, total_items: u64) -> Self {
        Self {
            data,
            pagination: PaginationInfo::new(pagination, total_items),
        }
    }

    /// Convert every row, keeping the page metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginatedResult<U> {
        PaginatedResult {
            data: self.data.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

// =====================================
// Sort Order
// =====================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// `ASC` or `DESC`.
    #[must_use]
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_offset_and_limit() {
        assert_eq!(Pagination::new(1, 20).offset(), 0);
        assert_eq!(Pagination::new(3, 10).offset(), 20);
        assert_eq!(Pagination::new(0, 10).offset(), 0);
        assert_eq!(Pagination::new(1, 500).limit(), 100);
        assert_eq!(Pagination::new(1, 0).limit(), 1);
    }

    #[test]
    fn test_pagination_info() {
        let info = PaginationInfo::new(&Pagination::new(2, 10), 35);
        assert_eq!(
            info,
            PaginationInfo {
                current_page: 2,
                per_page: 10,
                total_items: 35,
                total_pages: 4,
                has_next: true,
                has_prev: true,
            }
        );
    }

    #[test]
    fn test_empty_result_has_no_pages() {
        let info = PaginationInfo::new(&Pagination::default(), 0);
        assert_eq!(info.total_pages, 0);
        assert!(!info.has_next);
        assert!(!info.has_prev);
    }

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(new_id(), new_id());
        assert_eq!(new_id().len(), 21);
    }
}
