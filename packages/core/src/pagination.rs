// ABOUTME: Pagination types for the deal list
// ABOUTME: Request-side page/limit clamping and response-side page metadata

use serde::{Deserialize, Serialize};

/// Default page size for list requests
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Maximum page size the API accepts
pub const MAX_PAGE_SIZE: i64 = 100;

/// Minimum page number (1-indexed)
pub const MIN_PAGE: i64 = 1;

/// Requested page of the deal list
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageRequest {
    /// Page number (1-indexed, defaults to 1)
    #[serde(default = "default_page")]
    pub page: i64,

    /// Items per page (defaults to DEFAULT_PAGE_SIZE, clamped to MAX_PAGE_SIZE)
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    MIN_PAGE
}

fn default_limit() -> i64 {
    DEFAULT_PAGE_SIZE
}

impl PageRequest {
    pub fn new() -> Self {
        Self {
            page: MIN_PAGE,
            limit: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_and_limit(page: i64, limit: i64) -> Self {
        Self { page, limit }
    }

    /// Page number normalized to at least 1
    pub fn page(&self) -> i64 {
        self.page.max(MIN_PAGE)
    }

    /// Limit clamped between 1 and MAX_PAGE_SIZE
    pub fn limit(&self) -> i64 {
        self.limit.clamp(1, MAX_PAGE_SIZE)
    }

    /// The same request pointed at the next page
    pub fn next(&self) -> Self {
        Self {
            page: self.page() + 1,
            limit: self.limit,
        }
    }

    /// The same request reset to page 1, as after any filter change
    pub fn first_page(&self) -> Self {
        Self {
            page: MIN_PAGE,
            limit: self.limit,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new()
    }
}

/// Pagination metadata from a list response
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageInfo {
    /// Current page number (1-indexed)
    pub page: i64,

    /// Items per page
    #[serde(rename = "pageSize")]
    pub page_size: i64,

    /// Total number of items across all pages
    #[serde(rename = "totalItems")]
    pub total_items: i64,

    /// Total number of pages
    #[serde(rename = "totalPages")]
    pub total_pages: i64,

    /// Whether there is a next page
    #[serde(rename = "hasNextPage")]
    pub has_next_page: bool,

    /// Whether there is a previous page
    #[serde(rename = "hasPreviousPage")]
    pub has_previous_page: bool,
}

impl PageInfo {
    /// Build metadata from a request and a total count. Used by test fakes
    /// and as a local fallback when the server omits list metadata.
    pub fn for_request(request: &PageRequest, total_items: i64) -> Self {
        let page = request.page();
        let page_size = request.limit();
        let total_pages = if page_size > 0 {
            (total_items + page_size - 1) / page_size
        } else {
            0
        };

        Self {
            page,
            page_size,
            total_items,
            total_pages,
            has_next_page: page < total_pages,
            has_previous_page: page > MIN_PAGE,
        }
    }
}
