//! Fixed-size, 1-based pagination over a filtered result set.

use serde::Serialize;

use crate::error::{Error, Result};

/// Number of pages needed for `count` results. Zero results yield zero
/// pages (the empty state), never a division by zero.
pub fn total_pages(count: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    count.div_ceil(page_size)
}

/// Slice of `items` shown on 1-based `page`. Out-of-range pages are empty.
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    if page == 0 || page_size == 0 {
        return &[];
    }
    let start = (page - 1).saturating_mul(page_size);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

/// Reject pages outside `[1, max(total_pages, 1)]`.
///
/// Page 1 stays valid for an empty result set so the empty state has a page
/// number to display.
pub fn check_page(page: usize, total_pages: usize) -> Result<()> {
    if page == 0 || page > total_pages.max(1) {
        return Err(Error::PageOutOfRange {
            requested: page,
            total_pages,
        });
    }
    Ok(())
}

/// One rendered page of catalog results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageView<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_results: usize,
}

impl<T: Clone> PageView<T> {
    /// Build the view for `page` over the full `results`.
    pub fn build(results: &[T], page: usize, page_size: usize) -> Self {
        Self {
            items: paginate(results, page, page_size).to_vec(),
            page,
            page_size,
            total_pages: total_pages(results.len(), page_size),
            total_results: results.len(),
        }
    }
}

impl<T> PageView<T> {
    pub fn is_empty(&self) -> bool {
        self.total_results == 0
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}
