//! Pages and their response metadata.

use serde::Serialize;

/// One page of results.
///
/// Cursor pages fill `next_cursor`/`previous_cursor`; offset pages fill
/// `current_page`. Totals are present whenever a count was taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Rows in the requested order.
    pub items: Vec<T>,
    /// Requested page size.
    pub page_size: usize,
    /// Token for the following page.
    pub next_cursor: Option<String>,
    /// Token for the preceding page.
    pub previous_cursor: Option<String>,
    /// Rows in the whole (scoped) data set.
    pub total_items: Option<u64>,
    /// `ceil(total_items / page_size)`.
    pub total_pages: Option<u64>,
    /// 1-based page number for offset pages.
    pub current_page: Option<u64>,
}

impl<T> Page<T> {
    /// A page with no rows and no cursors.
    #[must_use]
    pub const fn empty(page_size: usize) -> Self {
        Self {
            items: Vec::new(),
            page_size,
            next_cursor: None,
            previous_cursor: None,
            total_items: None,
            total_pages: None,
            current_page: None,
        }
    }

    /// Record a total row count and derive the page count.
    #[must_use]
    pub fn with_total(mut self, total: u64) -> Self {
        self.total_items = Some(total);
        self.total_pages = Some(total_pages(total, self.page_size));
        self
    }

    /// Whether a following page exists.
    #[must_use]
    pub fn has_next(&self) -> bool {
        if self.next_cursor.is_some() {
            return true;
        }
        matches!(
            (self.current_page, self.total_pages),
            (Some(current), Some(total)) if current < total
        )
    }

    /// Whether a preceding page exists.
    #[must_use]
    pub fn has_previous(&self) -> bool {
        self.previous_cursor.is_some() || self.current_page.is_some_and(|p| p > 1)
    }

    /// Number of rows on this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether this page holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Transform the rows, keeping cursors and totals.
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page_size: self.page_size,
            next_cursor: self.next_cursor,
            previous_cursor: self.previous_cursor,
            total_items: self.total_items,
            total_pages: self.total_pages,
            current_page: self.current_page,
        }
    }

    /// Response metadata for this page.
    #[must_use]
    pub fn metadata(&self) -> PageMetadata {
        PageMetadata {
            current_page: self.current_page,
            page_size: self.page_size,
            total_items: self.total_items,
            total_pages: self.total_pages,
            has_next_page: self.has_next(),
            has_previous_page: self.has_previous(),
            before: self.previous_cursor.clone(),
            after: self.next_cursor.clone(),
        }
    }
}

/// Pagination metadata as returned to API clients.
///
/// ```
/// use keyseek::Page;
///
/// let mut page = Page::<u32>::empty(20).with_total(45);
/// page.next_cursor = Some("abc".into());
/// let json = serde_json::to_value(page.metadata()).unwrap();
/// assert_eq!(
///     json,
///     serde_json::json!({
///         "pageSize": 20,
///         "totalItems": 45,
///         "totalPages": 3,
///         "hasNextPage": true,
///         "hasPreviousPage": false,
///         "after": "abc"
///     })
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    /// 1-based page number (offset pages).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_page: Option<u64>,
    /// Requested page size.
    pub page_size: usize,
    /// Rows in the data set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_items: Option<u64>,
    /// Pages in the data set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u64>,
    /// Whether a following page exists.
    pub has_next_page: bool,
    /// Whether a preceding page exists.
    pub has_previous_page: bool,
    /// Cursor for the preceding page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<String>,
    /// Cursor for the following page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
}

/// `ceil(total / page_size)`; zero when `page_size` is zero.
#[must_use]
pub fn total_pages(total: u64, page_size: usize) -> u64 {
    let size = u64::try_from(page_size).unwrap_or(u64::MAX);
    if size == 0 { 0 } else { total.div_ceil(size) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(5, 0), 0);
    }

    #[test]
    fn test_offset_flags() {
        let mut page = Page::<u8>::empty(10).with_total(25);
        page.current_page = Some(1);
        assert!(page.has_next());
        assert!(!page.has_previous());

        page.current_page = Some(3);
        assert!(!page.has_next());
        assert!(page.has_previous());
    }

    #[test]
    fn test_cursor_flags() {
        let mut page = Page::<u8>::empty(10);
        assert!(!page.has_next());
        page.previous_cursor = Some("p".into());
        assert!(page.has_previous());
        assert!(!page.has_next());
    }

    #[test]
    fn test_map_keeps_metadata() {
        let mut page = Page::empty(2).with_total(4);
        page.items = vec![1, 2];
        page.next_cursor = Some("n".into());
        let mapped = page.map(|n: i32| n.to_string());
        assert_eq!(mapped.items, ["1", "2"]);
        assert_eq!(mapped.next_cursor.as_deref(), Some("n"));
        assert_eq!(mapped.total_pages, Some(2));
    }

    #[test]
    fn test_metadata_offset_shape() {
        let mut page = Page::<u8>::empty(5).with_total(12);
        page.current_page = Some(2);
        let json = serde_json::to_value(page.metadata()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "currentPage": 2,
                "pageSize": 5,
                "totalItems": 12,
                "totalPages": 3,
                "hasNextPage": true,
                "hasPreviousPage": true
            })
        );
    }
}
