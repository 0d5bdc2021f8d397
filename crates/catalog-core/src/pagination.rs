//! # Pagination
//!
//! Page math for paginated listings. Pure functions only.
//!
//! ## How A Page Is Computed
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Request: page=3, limit=10        Store has 42 matching products       │
//! │                                                                         │
//! │  offset      = (3 - 1) * 10             = 20                           │
//! │  total_pages = ceil(42 / 10)            = 5                            │
//! │  records     = 10 * (3 - 1) + returned  = 20 + 10 = 30                 │
//! │                                                                         │
//! │  `records` is a running count: how far into the whole result set the   │
//! │  caller has read once this page is consumed.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Zero or negative `page` becomes [`DEFAULT_PAGE`]; zero or negative
//! `limit` becomes [`DEFAULT_PAGE_LIMIT`]. Nothing here can fail.

use serde::{Deserialize, Serialize};

use crate::{DEFAULT_PAGE, DEFAULT_PAGE_LIMIT};

/// What the caller asked for. Values are normalized lazily.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    pub const fn new(page: i64, limit: i64) -> Self {
        PageRequest { page, limit }
    }

    /// Page number after normalization (always >= 1).
    pub const fn normalized_page(&self) -> i64 {
        if self.page <= 0 {
            DEFAULT_PAGE
        } else {
            self.page
        }
    }

    /// Page size after normalization (always >= 1).
    pub const fn normalized_limit(&self) -> i64 {
        if self.limit <= 0 {
            DEFAULT_PAGE_LIMIT
        } else {
            self.limit
        }
    }

    /// Rows to skip before this page starts.
    pub const fn offset(&self) -> i64 {
        (self.normalized_page() - 1).saturating_mul(self.normalized_limit())
    }
}

/// Pagination metadata returned alongside a page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub offset: i64,
    pub total_records: i64,
    pub total_pages: i64,
    /// Running count: records before this page plus records on it.
    pub records: i64,
}

/// Computes pagination metadata.
///
/// ## Arguments
/// * `page` - Requested page (1-based, normalized if <= 0)
/// * `limit` - Requested page size (normalized if <= 0)
/// * `total_records` - Number of rows matching the filters
/// * `returned` - Number of rows actually returned for this page
///
/// ## Example
/// ```rust
/// use catalog_core::pagination::compute_pagination;
///
/// let p = compute_pagination(2, 10, 15, 5);
/// assert_eq!(p.offset, 10);
/// assert_eq!(p.total_pages, 2);
/// assert_eq!(p.records, 15);
/// ```
pub fn compute_pagination(page: i64, limit: i64, total_records: i64, returned: i64) -> Pagination {
    let request = PageRequest::new(page, limit);
    let page = request.normalized_page();
    let limit = request.normalized_limit();
    let total_records = total_records.max(0);
    let returned = returned.max(0);

    // Ceiling division without going through floats
    let total_pages = if total_records == 0 {
        0
    } else {
        (total_records - 1) / limit + 1
    };

    Pagination {
        page,
        limit,
        offset: request.offset(),
        total_records,
        total_pages,
        records: limit.saturating_mul(page - 1).saturating_add(returned),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_positive_limit_defaults_to_ten() {
        for limit in [0, -1, -50, i64::MIN] {
            let p = compute_pagination(1, limit, 100, 10);
            assert_eq!(p.limit, 10, "limit {limit}");
        }
    }

    #[test]
    fn test_non_positive_page_defaults_to_one() {
        for page in [0, -1, -7, i64::MIN] {
            let p = compute_pagination(page, 10, 100, 10);
            assert_eq!(p.page, 1, "page {page}");
            assert_eq!(p.offset, 0);
        }
    }

    #[test]
    fn test_offset_follows_normalized_page_and_limit() {
        assert_eq!(compute_pagination(1, 25, 0, 0).offset, 0);
        assert_eq!(compute_pagination(2, 25, 0, 0).offset, 25);
        assert_eq!(compute_pagination(4, 0, 0, 0).offset, 30);
        assert_eq!(PageRequest::new(-3, 5).offset(), 0);
    }

    #[test]
    fn test_total_pages_is_ceiling() {
        assert_eq!(compute_pagination(1, 10, 0, 0).total_pages, 0);
        assert_eq!(compute_pagination(1, 10, 1, 1).total_pages, 1);
        assert_eq!(compute_pagination(1, 10, 10, 10).total_pages, 1);
        assert_eq!(compute_pagination(1, 10, 11, 10).total_pages, 2);
        assert_eq!(compute_pagination(1, 3, 42, 3).total_pages, 14);
    }

    #[test]
    fn test_records_is_running_count() {
        let p = compute_pagination(3, 10, 42, 10);
        assert_eq!(p.records, 30);

        let last = compute_pagination(5, 10, 42, 2);
        assert_eq!(last.records, 42);
    }

    #[test]
    fn test_empty_result() {
        let p = compute_pagination(1, 10, 0, 0);
        assert_eq!(p.total_records, 0);
        assert_eq!(p.total_pages, 0);
        assert_eq!(p.records, 0);
    }

    #[test]
    fn test_is_idempotent() {
        assert_eq!(
            compute_pagination(-2, 0, 17, 7),
            compute_pagination(-2, 0, 17, 7)
        );
    }
}
