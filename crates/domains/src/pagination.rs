//! # Pagination
//!
//! Splits an ordered result into fixed-size pages. The requested page comes
//! straight from the query string, so anything unparsable means page 1 and
//! out-of-range numbers clamp to the first or last page.

use std::num::IntErrorKind;

use serde::Serialize;

/// Page size shared by every listing.
pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    per_page: usize,
}

impl Paginator {
    /// A zero page size is treated as 1.
    pub fn new(per_page: usize) -> Self {
        Self {
            per_page: per_page.max(1),
        }
    }

    pub fn per_page(&self) -> usize {
        self.per_page
    }

    /// Resolves the requested page against `total` items.
    pub fn window(&self, total: usize, requested: Option<&str>) -> PageWindow {
        // An empty result still has one (empty) page.
        let num_pages = total.div_ceil(self.per_page).max(1);

        let number = match requested.map(str::trim).map(str::parse::<i64>) {
            Some(Ok(n)) if n < 1 => 1,
            Some(Ok(n)) => usize::try_from(n).unwrap_or(usize::MAX).min(num_pages),
            // Too many digits is still a number, just past the end.
            Some(Err(err)) if *err.kind() == IntErrorKind::PosOverflow => num_pages,
            _ => 1,
        };

        PageWindow {
            number,
            num_pages,
            total,
            limit: self.per_page,
            offset: (number - 1) * self.per_page,
        }
    }

    /// Paginates a collection already held in memory.
    pub fn page<T>(&self, items: Vec<T>, requested: Option<&str>) -> Page<T> {
        let window = self.window(items.len(), requested);
        let items = items
            .into_iter()
            .skip(window.offset)
            .take(window.limit)
            .collect();
        window.into_page(items)
    }
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

/// The slice of a result a page covers; repositories turn it into
/// `LIMIT`/`OFFSET`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: usize,
    pub num_pages: usize,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

impl PageWindow {
    pub fn into_page<T>(self, items: Vec<T>) -> Page<T> {
        Page {
            items,
            number: self.number,
            num_pages: self.num_pages,
            total: self.total,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based
    pub number: usize,
    pub num_pages: usize,
    pub total: usize,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn next_number(&self) -> Option<usize> {
        self.has_next().then_some(self.number + 1)
    }

    pub fn previous_number(&self) -> Option<usize> {
        self.has_previous().then(|| self.number - 1)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            num_pages: self.num_pages,
            total: self.total,
        }
    }
}
