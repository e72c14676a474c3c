//! Shared Types
//!
//! Common request/response types used by the list endpoints

use serde::{Deserialize, Serialize};

/// Hard cap on page size
pub const MAX_PAGE_SIZE: u32 = 100;

/// Pagination query parameters
#[derive(Debug, Clone, Deserialize)]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: u32,

    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    50
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
        }
    }
}

impl PaginationParams {
    /// Calculate offset for SQL queries
    pub fn offset(&self) -> i64 {
        i64::from(self.page.max(1) - 1) * self.limit()
    }

    /// Get limit for SQL queries
    pub fn limit(&self) -> i64 {
        i64::from(self.limit.clamp(1, MAX_PAGE_SIZE))
    }

    pub fn describe(&self, total: i64) -> Pagination {
        let limit = self.limit();
        Pagination {
            page: self.page.max(1),
            limit,
            total,
            pages: (total + limit - 1) / limit,
        }
    }
}

/// Pagination block returned with list responses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

/// A page of results
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}
