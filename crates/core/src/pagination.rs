//! Page-number pagination for post listings.

use serde::Serialize;

/// Splits an ordered collection into fixed-size pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    per_page: u64,
}

/// The slice of a collection selected by a page number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// 1-based page number after clamping.
    pub number: u64,
    /// Total number of pages (at least 1).
    pub num_pages: u64,
    /// Total number of items in the collection.
    pub count: u64,
    /// Items to skip.
    pub offset: u64,
    /// Items to take.
    pub limit: u64,
}

impl Paginator {
    /// Create a paginator. A zero page size is treated as 1.
    #[must_use]
    pub const fn new(per_page: u64) -> Self {
        Self {
            per_page: if per_page == 0 { 1 } else { per_page },
        }
    }

    /// Items per page.
    #[must_use]
    pub const fn per_page(&self) -> u64 {
        self.per_page
    }

    /// Number of pages needed for `total` items.
    ///
    /// An empty collection still has one (empty) page.
    #[must_use]
    pub const fn num_pages(&self, total: u64) -> u64 {
        if total == 0 {
            1
        } else {
            total.div_ceil(self.per_page)
        }
    }

    /// Resolve the raw `page` query value into a window over `total` items.
    ///
    /// Missing or non-integer values select the first page; integers out of
    /// range are clamped to the first or last page.
    #[must_use]
    pub fn window(&self, total: u64, requested: Option<&str>) -> PageWindow {
        let num_pages = self.num_pages(total);
        let number = requested.map_or(1, |raw| Self::parse_number(raw.trim(), num_pages));

        PageWindow {
            number,
            num_pages,
            count: total,
            offset: (number - 1) * self.per_page,
            limit: self.per_page,
        }
    }

    /// Integers too large for `i64` still count as out of range, not invalid.
    fn parse_number(raw: &str, num_pages: u64) -> u64 {
        match raw.parse::<i64>() {
            Ok(n) if n < 1 => 1,
            Ok(n) => (n as u64).min(num_pages),
            Err(_) => {
                let digits = raw.strip_prefix(['+', '-']).unwrap_or(raw);
                let is_integer = !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit());
                if is_integer && !raw.starts_with('-') {
                    num_pages
                } else {
                    1
                }
            }
        }
    }

    /// Attach the fetched items to a window.
    #[must_use]
    pub fn page<T>(&self, window: PageWindow, items: Vec<T>) -> Page<T> {
        Page::new(items, window, self.per_page)
    }
}

/// One page of results plus the metadata templates need for navigation.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// 1-based page number.
    pub number: u64,
    /// Total number of pages.
    pub num_pages: u64,
    /// Total number of items across all pages.
    pub count: u64,
    /// Page size.
    pub per_page: u64,
    /// Whether a later page exists.
    pub has_next: bool,
    /// Whether an earlier page exists.
    pub has_previous: bool,
    /// Number of the next page, if any.
    pub next_page_number: Option<u64>,
    /// Number of the previous page, if any.
    pub previous_page_number: Option<u64>,
    /// 1-based index of the first item on this page, 0 when empty.
    pub start_index: u64,
    /// 1-based index of the last item on this page, 0 when empty.
    pub end_index: u64,
}

impl<T> Page<T> {
    fn new(items: Vec<T>, window: PageWindow, per_page: u64) -> Self {
        let has_next = window.number < window.num_pages;
        let has_previous = window.number > 1;
        let (start_index, end_index) = if items.is_empty() {
            (0, 0)
        } else {
            (window.offset + 1, window.offset + items.len() as u64)
        };

        Self {
            number: window.number,
            num_pages: window.num_pages,
            count: window.count,
            per_page,
            has_next,
            has_previous,
            next_page_number: has_next.then_some(window.number + 1),
            previous_page_number: has_previous.then(|| window.number - 1),
            start_index,
            end_index,
            items,
        }
    }

    /// Transform the items, keeping the page metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            num_pages: self.num_pages,
            count: self.count,
            per_page: self.per_page,
            has_next: self.has_next,
            has_previous: self.has_previous,
            next_page_number: self.next_page_number,
            previous_page_number: self.previous_page_number,
            start_index: self.start_index,
            end_index: self.end_index,
        }
    }
}
