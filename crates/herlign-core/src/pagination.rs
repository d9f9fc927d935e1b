//! Page/limit handling shared by every list endpoint.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 20;
pub const MAX_LIMIT: u32 = 100;

/// Validated `page` / `limit` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageParams {
    /// Build from optional query values. Returns a message naming the bad
    /// parameter when `page < 1` or `limit` is outside `1..=100`.
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Result<Self, String> {
        let page = page.unwrap_or(DEFAULT_PAGE);
        let limit = limit.unwrap_or(DEFAULT_LIMIT);
        if page < 1 {
            return Err("page must be a positive integer".into());
        }
        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(format!("limit must be between 1 and {MAX_LIMIT}"));
        }
        Ok(Self { page, limit })
    }

    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.limit)
    }

    pub fn limit_i64(&self) -> i64 {
        i64::from(self.limit)
    }

    pub fn paginate(&self, total: i64) -> Pagination {
        Pagination::new(*self, total)
    }
}

/// `pagination` block of a list response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub total_pages: i64,
    pub has_next: bool,
}

impl Pagination {
    pub fn new(params: PageParams, total: i64) -> Self {
        let total = total.max(0);
        let limit = i64::from(params.limit.max(1));
        let total_pages = (total + limit - 1) / limit;
        Self {
            page: params.page,
            limit: params.limit,
            total,
            total_pages,
            has_next: i64::from(params.page) < total_pages,
        }
    }
}
