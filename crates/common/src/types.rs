use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Milliseconds since the Unix epoch.
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// 1-based page request as sent by the admin panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 1, limit: 50 }
    }
}

impl PageRequest {
    /// Largest page size accepted from clients.
    pub const MAX_LIMIT: u32 = 200;

    #[must_use]
    pub fn new(page: u32, limit: u32) -> Self {
        Self { page, limit }.normalized()
    }

    /// Clamp zero/oversized values into a usable range.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            page: self.page.max(1),
            limit: self.limit.clamp(1, Self::MAX_LIMIT),
        }
    }

    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.limit)
    }
}

/// One page of results plus totals.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, request: PageRequest) -> Self {
        let limit = i64::from(request.limit.max(1));
        Self {
            items,
            total,
            page: request.page,
            total_pages: (total + limit - 1) / limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case(PageRequest { page: 0, limit: 0 }, 1, 1)]
    #[case(PageRequest { page: 3, limit: 500 }, 3, PageRequest::MAX_LIMIT)]
    #[case(PageRequest { page: 2, limit: 20 }, 2, 20)]
    fn normalizes_requests(#[case] raw: PageRequest, #[case] page: u32, #[case] limit: u32) {
        let n = raw.normalized();
        assert_eq!(n.page, page);
        assert_eq!(n.limit, limit);
    }

    #[test]
    fn offset_skips_previous_pages() {
        assert_eq!(PageRequest::new(1, 50).offset(), 0);
        assert_eq!(PageRequest::new(3, 20).offset(), 40);
    }

    #[test]
    fn total_pages_rounds_up() {
        let page: Page<u8> = Page::new(vec![], 101, PageRequest::new(1, 50));
        assert_eq!(page.total_pages, 3);
        let empty: Page<u8> = Page::new(vec![], 0, PageRequest::new(1, 50));
        assert_eq!(empty.total_pages, 0);
    }

    #[test]
    fn page_serializes_camel_case() {
        let page = Page::new(vec![1u8], 1, PageRequest::default());
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["totalPages"], 1);
    }
}
