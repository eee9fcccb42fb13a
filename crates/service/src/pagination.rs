//! Page/per-page query parameters shared by the list endpoints.

use common::types::Page;
use serde::Deserialize;

/// 1-based page request, clamped before it reaches the database.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Pagination {
    pub const MAX_PER_PAGE: u32 = 100;

    /// Zero-based page index and page size for `Paginator::fetch_page`.
    pub fn normalize(self) -> (u64, u64) {
        let page = self.page.max(1);
        let per_page = self.per_page.clamp(1, Self::MAX_PER_PAGE);
        ((page - 1) as u64, per_page as u64)
    }

    /// The clamped values echoed back in `Page` responses.
    pub fn effective(self) -> (u64, u64) {
        let (idx, per_page) = self.normalize();
        (idx + 1, per_page)
    }

    pub fn into_page<T>(self, items: Vec<T>, total: u64) -> Page<T> {
        let (page, per_page) = self.effective();
        Page { items, total, page, per_page }
    }
}

impl Default for Pagination {
    fn default() -> Self { Self { page: 1, per_page: 20 } }
}
