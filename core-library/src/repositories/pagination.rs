//! Pagination helper types for repository queries

use serde::{Deserialize, Serialize};

/// Largest page a caller may request from a repository.
pub const MAX_PAGE_SIZE: u32 = 500;

/// Pagination request parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Current page number (0-indexed)
    pub page: u32,
    /// Number of items per page
    pub page_size: u32,
}

impl PageRequest {
    /// Create a new page request. `page_size` is clamped to `1..=MAX_PAGE_SIZE`.
    ///
    /// ```
    /// use core_library::repositories::PageRequest;
    ///
    /// let request = PageRequest::new(2, 20);
    /// assert_eq!(request.offset(), 40);
    /// assert_eq!(PageRequest::new(0, 0).page_size, 1);
    /// ```
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page,
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// SQL OFFSET value
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.page_size)
    }

    /// SQL LIMIT value
    pub fn limit(&self) -> u32 {
        self.page_size
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            page_size: 50,
        }
    }
}

/// Paginated response containing items and metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total number of items across all pages
    pub total: u64,
    pub page: u32,
    pub total_pages: u32,
    pub page_size: u32,
}

impl<T> Page<T> {
    /// ```
    /// use core_library::repositories::{Page, PageRequest};
    ///
    /// let page = Page::new(vec!["a", "b"], 25, PageRequest::new(0, 10));
    /// assert_eq!(page.total_pages, 3);
    /// assert!(page.has_next());
    /// ```
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        let size = u64::from(request.page_size.max(1));
        let total_pages = total.div_ceil(size).min(u64::from(u32::MAX)) as u32;

        Self {
            items,
            total,
            page: request.page,
            total_pages,
            page_size: request.page_size,
        }
    }

    pub fn has_next(&self) -> bool {
        self.page + 1 < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 0
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Map the items to a different type
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            total_pages: self.total_pages,
            page_size: self.page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_defaults_and_clamping() {
        let request = PageRequest::default();
        assert_eq!(request.page, 0);
        assert_eq!(request.page_size, 50);

        assert_eq!(PageRequest::new(0, 0).page_size, 1);
        assert_eq!(PageRequest::new(0, 10_000).page_size, MAX_PAGE_SIZE);
    }

    #[test]
    fn test_page_request_offset_does_not_overflow() {
        assert_eq!(PageRequest::new(3, 20).offset(), 60);
        let far = PageRequest::new(u32::MAX, MAX_PAGE_SIZE);
        assert_eq!(far.offset(), u64::from(u32::MAX) * u64::from(MAX_PAGE_SIZE));
    }

    #[test]
    fn test_page_navigation() {
        let first = Page::new(vec![1, 2], 5, PageRequest::new(0, 2));
        assert_eq!(first.total_pages, 3);
        assert!(first.has_next());
        assert!(!first.has_previous());

        let last = Page::new(vec![5], 5, PageRequest::new(2, 2));
        assert!(!last.has_next());
        assert!(last.has_previous());

        let empty: Page<i32> = Page::new(Vec::new(), 0, PageRequest::default());
        assert_eq!(empty.total_pages, 0);
        assert!(empty.is_empty());
        assert!(!empty.has_next());
    }

    #[test]
    fn test_page_map() {
        let page = Page::new(vec![1, 2, 3], 3, PageRequest::new(0, 10));
        let mapped = page.map(|n| n.to_string());
        assert_eq!(mapped.items, vec!["1", "2", "3"]);
        assert_eq!(mapped.total, 3);
    }
}
