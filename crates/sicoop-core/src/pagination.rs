//! Page requests and pages for server-side pagination.

use serde::{Deserialize, Serialize};

use crate::defaults;

/// A 1-based page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: defaults::FIRST_PAGE,
            page_size: defaults::USER_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Page numbers below 1 and page sizes of 0 are clamped to 1.
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
        }
    }

    /// Index of the first row of this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.max(1) - 1) * u64::from(self.page_size)
    }

    /// Inclusive index of the last row of this page (the `Range` header form).
    pub fn last_index(&self) -> u64 {
        self.offset() + u64::from(self.page_size) - 1
    }
}

/// One page of rows plus the total row count reported by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            page: request.page,
            page_size: request.page_size,
        }
    }

    pub fn total_pages(&self) -> u32 {
        total_pages(self.total, self.page_size)
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}

/// `ceil(total / page_size)`; an empty collection has zero pages.
pub fn total_pages(total: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    let pages = total.div_ceil(u64::from(page_size));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages_rounds_up() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(57, 10), 6);
    }

    #[test]
    fn test_total_pages_zero_page_size() {
        assert_eq!(total_pages(57, 0), 0);
    }

    #[test]
    fn test_page_request_window() {
        let first = PageRequest::default();
        assert_eq!(first.page_size, 10);
        assert_eq!(first.offset(), 0);
        assert_eq!(first.last_index(), 9);

        let third = PageRequest::new(3, 10);
        assert_eq!(third.offset(), 20);
        assert_eq!(third.last_index(), 29);
    }

    #[test]
    fn test_page_request_clamps() {
        let req = PageRequest::new(0, 0);
        assert_eq!(req.page, 1);
        assert_eq!(req.page_size, 1);
    }

    #[test]
    fn test_page_navigation_flags() {
        let page: Page<u8> = Page::new(vec![], 25, PageRequest::new(2, 10));
        assert_eq!(page.total_pages(), 3);
        assert!(page.has_next());
        assert!(page.has_previous());

        let last: Page<u8> = Page::new(vec![], 25, PageRequest::new(3, 10));
        assert!(!last.has_next());
    }
}
