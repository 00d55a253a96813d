//! Pagination envelope for list endpoints.

use serde::Serialize;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
  pub current_page:   u32,
  pub limit_per_page: u32,
  pub total_items:    u64,
  pub previous_page:  Option<u32>,
  pub next_page:      Option<u32>,
}

impl Pagination {
  pub fn compute(page: u32, limit: u32, total_items: u64) -> Self {
    let page = page.max(1);
    let limit = limit.max(1);
    let total_pages = total_items.div_ceil(u64::from(limit));
    Self {
      current_page:   page,
      limit_per_page: limit,
      total_items,
      previous_page:  (page > 1).then(|| page - 1),
      next_page:      (u64::from(page) < total_pages).then(|| page + 1),
    }
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
  pub data:       Vec<T>,
  pub pagination: Pagination,
}
