use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 200;

/// Параметры постраничной выборки
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u64,
    pub page_size: u64,
}

impl PageRequest {
    /// Non-positive values fall back to the defaults, the size is capped.
    pub fn new(page: Option<u64>, page_size: Option<u64>) -> Self {
        let page = page.filter(|p| *p > 0).unwrap_or(DEFAULT_PAGE);
        let page_size = page_size
            .filter(|s| *s > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .min(MAX_PAGE_SIZE);
        Self { page, page_size }
    }

    /// Zero-based page index as expected by sea-orm paginators
    pub fn index(&self) -> u64 {
        self.page.saturating_sub(1)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Страница результатов
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
}

impl<T> Paged<T> {
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            page: request.page,
            page_size: request.page_size,
        }
    }

    pub fn total_pages(&self) -> u64 {
        if self.page_size == 0 {
            0
        } else {
            self.total.div_ceil(self.page_size)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_defaults() {
        let req = PageRequest::new(None, None);
        assert_eq!(req, PageRequest { page: 1, page_size: 20 });
        let req = PageRequest::new(Some(0), Some(0));
        assert_eq!(req, PageRequest::default());
    }

    #[test]
    fn test_page_request_index_and_cap() {
        let req = PageRequest::new(Some(3), Some(1000));
        assert_eq!(req.page_size, MAX_PAGE_SIZE);
        assert_eq!(req.index(), 2);

        let req = PageRequest::new(Some(u64::MAX), Some(u64::MAX));
        assert_eq!(req.page_size, MAX_PAGE_SIZE);
        assert_eq!(req.index(), u64::MAX - 1);
    }

    #[test]
    fn test_total_pages() {
        let paged: Paged<u8> = Paged::new(vec![], 41, PageRequest::default());
        assert_eq!(paged.total_pages(), 3);
    }
}
