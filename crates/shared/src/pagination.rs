//! Page-number pagination.

use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 200;

/// Normalised page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    /// Clamps user-supplied values: page starts at 1, limit within 1..=MAX_PAGE_SIZE.
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

/// Page metadata returned alongside list data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_rows: i64,
    pub page_size: i64,
}

impl PageMeta {
    pub fn new(request: PageRequest, total_rows: i64) -> Self {
        let total_pages = if total_rows == 0 {
            0
        } else {
            (total_rows + request.limit - 1) / request.limit
        };
        Self {
            current_page: request.page,
            total_pages,
            total_rows,
            page_size: request.limit,
        }
    }
}
