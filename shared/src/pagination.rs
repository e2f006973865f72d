//! Pagination envelope for list endpoints

use serde::{Deserialize, Serialize};

/// One page of results plus the totals a client needs to render a pager
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    /// Total matching records across all pages
    pub total: u64,
    /// Current page (1-based)
    pub page: u32,
    /// Page size
    pub limit: u32,
    pub total_pages: u32,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, total: u64, page: u32, limit: u32) -> Self {
        let total_pages = if limit > 0 {
            total.div_ceil(limit as u64) as u32
        } else {
            1
        };

        Self {
            data,
            total,
            page,
            limit,
            total_pages,
        }
    }

    /// Row offset of the first item on `page` (1-based)
    pub fn offset(page: u32, limit: u32) -> u64 {
        (page.max(1) as u64 - 1) * limit as u64
    }
}
