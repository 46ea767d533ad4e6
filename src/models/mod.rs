pub mod proposal;
pub mod signature;
pub mod template;
pub mod user;
pub mod workspace;

use serde::{Deserialize, Serialize};

pub const DEFAULT_PER_PAGE: i64 = 25;
pub const MAX_PER_PAGE: i64 = 100;

/// Page request from `?page=&per_page=` query params.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl PageParams {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> i64 {
        self.per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE)
    }

    /// Saturates instead of overflowing; a page past the end is just empty.
    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.per_page())
    }
}

/// Generic paginated response wrapper for list endpoints.
#[derive(Serialize, Debug, Clone)]
pub struct Page<T: Serialize> {
    pub items: Vec<T>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
}

impl<T: Serialize> Page<T> {
    pub fn new(items: Vec<T>, params: &PageParams, total: i64) -> Self {
        Page {
            items,
            page: params.page(),
            per_page: params.per_page(),
            total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(page: Option<i64>, per_page: Option<i64>) -> PageParams {
        PageParams { page, per_page }
    }

    #[test]
    fn page_and_per_page_are_clamped() {
        let p = params(Some(0), Some(1000));
        assert_eq!(p.page(), 1);
        assert_eq!(p.per_page(), MAX_PER_PAGE);
        assert_eq!(p.offset(), 0);

        let p = params(Some(-5), Some(0));
        assert_eq!(p.page(), 1);
        assert_eq!(p.per_page(), 1);

        assert_eq!(params(None, None).per_page(), DEFAULT_PER_PAGE);
        assert_eq!(params(Some(3), Some(10)).offset(), 20);
    }

    #[test]
    fn huge_page_saturates_offset() {
        assert_eq!(params(Some(i64::MAX), Some(100)).offset(), i64::MAX);
        assert_eq!(params(Some(i64::MAX), None).offset(), i64::MAX);
    }
}
