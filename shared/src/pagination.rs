//! Page numbering and paginated list envelopes.
//!
//! Page numbers are 1-based everywhere: `offset = (page - 1) * limit`.

use serde::{Deserialize, Serialize};

/// Upper bound for any `limit` a caller may request.
pub const MAX_LIMIT: u32 = 100;

/// Resolved pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub limit: u32,
}

impl Page {
    /// Resolve optional query parameters. Missing or zero page means page 1;
    /// missing limit means `default_limit`; limit is clamped to [1, MAX_LIMIT].
    pub fn resolve(page: Option<u32>, limit: Option<u32>, default_limit: u32) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(default_limit).clamp(1, MAX_LIMIT),
        }
    }

    /// Fixed page size (coupon list uses 10 regardless of caller input).
    pub fn fixed(page: Option<u32>, limit: u32) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit,
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.limit as i64
    }

    pub fn limit(&self) -> i64 {
        self.limit as i64
    }
}

/// Paginated list response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    /// Rows matching the filters (ignoring pagination)
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, total: u64, page: Page) -> Self {
        let total_pages = if page.limit > 0 {
            total.div_ceil(page.limit as u64) as u32
        } else {
            1
        };

        Self {
            data,
            total,
            page: page.page,
            limit: page.limit,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_defaults() {
        let page = Page::resolve(None, None, 10);
        assert_eq!(page, Page { page: 1, limit: 10 });
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn test_resolve_is_one_based() {
        let page = Page::resolve(Some(3), Some(20), 10);
        assert_eq!(page.offset(), 40);

        // page 0 is treated as the first page
        assert_eq!(Page::resolve(Some(0), Some(20), 10).offset(), 0);
    }

    #[test]
    fn test_limit_is_clamped() {
        assert_eq!(Page::resolve(None, Some(10_000), 10).limit, MAX_LIMIT);
        assert_eq!(Page::resolve(None, Some(0), 10).limit, 1);
    }

    #[test]
    fn test_paginated_response_total_pages() {
        let resp = PaginatedResponse::new(vec![1, 2, 3], 21, Page::fixed(Some(2), 10));
        assert_eq!(resp.total_pages, 3);
        assert_eq!(resp.page, 2);

        let empty: PaginatedResponse<i32> = PaginatedResponse::new(vec![], 0, Page::fixed(None, 10));
        assert_eq!(empty.total_pages, 0);
    }
}
