//! Page size and page index normalization for the store listings.

/// Largest page size accepted when no explicit bound is configured.
pub const MAX_PER_PAGE: u32 = 100;

/// Pagination parameters
#[derive(Clone, Copy, Debug)]
pub struct Pagination {
    /// 1-based page index
    pub page: u32,
    /// items per page
    pub per_page: u32,
}

impl Pagination {
    /// Clamp to `1..=max_per_page` and convert to a zero-based `(index, size)`.
    pub fn normalize(self, max_per_page: u32) -> (u64, u64) {
        let page = if self.page == 0 { 1 } else { self.page };
        let per_page = self.per_page.clamp(1, max_per_page.max(1));
        ((page - 1) as u64, per_page as u64)
    }
}

/// Page size bounds applied by the stores. A zero size means "default".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageLimits {
    pub default_per_page: u32,
    pub max_per_page: u32,
}

impl Default for PageLimits {
    fn default() -> Self { Self { default_per_page: 10, max_per_page: MAX_PER_PAGE } }
}

impl From<&configs::PaginationConfig> for PageLimits {
    fn from(cfg: &configs::PaginationConfig) -> Self {
        Self { default_per_page: cfg.default_per_page, max_per_page: cfg.max_per_page }
    }
}

impl PageLimits {
    fn requested(&self, per_page: u32) -> u32 {
        if per_page == 0 { self.default_per_page } else { per_page }
    }

    /// Normalized `limit` for limit/offset and cursor listings.
    pub fn limit(&self, limit: u32) -> usize {
        self.requested(limit).clamp(1, self.max_per_page.max(1)) as usize
    }

    /// Normalized `(page index, page size)` for numbered pages.
    pub fn page(&self, page: u32, per_page: u32) -> (u64, u64) {
        Pagination { page, per_page: self.requested(per_page) }.normalize(self.max_per_page)
    }
}

#[cfg(test)]
mod tests {
    use super::{PageLimits, Pagination, MAX_PER_PAGE};

    #[test]
    fn normalize_clamps_zero_to_first_page() {
        let (idx, per) = Pagination { page: 0, per_page: 0 }.normalize(MAX_PER_PAGE);
        assert_eq!(idx, 0);
        assert_eq!(per, 1);
    }

    #[test]
    fn normalize_clamps_upper_bound() {
        let (idx, per) = Pagination { page: 5, per_page: 1000 }.normalize(MAX_PER_PAGE);
        assert_eq!(idx, 4);
        assert_eq!(per, 100);
        assert_eq!(Pagination { page: 3, per_page: 50 }.normalize(25), (2, 25));
    }

    #[test]
    fn page_limits_substitute_the_default_for_zero() {
        let limits = PageLimits { default_per_page: 10, max_per_page: 25 };
        assert_eq!(limits.limit(0), 10);
        assert_eq!(limits.limit(40), 25);
        assert_eq!(limits.limit(3), 3);
        assert_eq!(limits.page(0, 0), (0, 10));
        assert_eq!(limits.page(2, 100), (1, 25));
    }

    #[test]
    fn default_limits_match_the_global_bound() {
        let d = PageLimits::default();
        assert_eq!(d.default_per_page, 10);
        assert_eq!(d.max_per_page, MAX_PER_PAGE);
    }
}
