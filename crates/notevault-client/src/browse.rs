//! Browse state: query, category, and current page over the catalog.

use notevault_core::{check_page, total_pages, Category, Note, PageView, Result};
use tracing::debug;

use crate::catalog::CatalogCache;

/// What the user is looking at. The visible page is computed from this and
/// the cache snapshot on every read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowseState {
    query: String,
    category: Category,
    page: usize,
    page_size: usize,
}

impl BrowseState {
    /// Page 1 of `ALL`, no query. A `page_size` of 0 is raised to 1.
    pub fn new(page_size: usize) -> Self {
        Self {
            query: String::new(),
            category: Category::All,
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn category(&self) -> &Category {
        &self.category
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Change the search text; a different query goes back to page 1.
    pub fn set_query(&mut self, query: impl Into<String>) {
        let query = query.into();
        if query != self.query {
            self.query = query;
            self.page = 1;
        }
    }

    /// Change the category; a different category goes back to page 1.
    pub fn set_category(&mut self, category: Category) {
        if category != self.category {
            self.category = category;
            self.page = 1;
        }
    }

    pub fn total_pages(&self, cache: &CatalogCache) -> usize {
        total_pages(cache.result_count(&self.query, &self.category), self.page_size)
    }

    /// Jump to `page`. Pages outside `[1, max(total_pages, 1)]` are rejected
    /// and the current page is kept.
    pub fn go_to_page(&mut self, cache: &CatalogCache, page: usize) -> Result<()> {
        let total = self.total_pages(cache);
        if let Err(e) = check_page(page, total) {
            debug!(
                subsystem = "catalog",
                component = "browse",
                requested = page,
                total_pages = total,
                current = self.page,
                "Page navigation rejected"
            );
            return Err(e);
        }
        self.page = page;
        Ok(())
    }

    pub fn next_page(&mut self, cache: &CatalogCache) -> Result<()> {
        self.sync(cache);
        self.go_to_page(cache, self.page.saturating_add(1))
    }

    pub fn previous_page(&mut self, cache: &CatalogCache) -> Result<()> {
        self.sync(cache);
        self.go_to_page(cache, self.page.saturating_sub(1))
    }

    /// Pull the current page back into `[1, max(total_pages, 1)]` after the
    /// result set shrank underneath it. Returns the page now current.
    pub fn sync(&mut self, cache: &CatalogCache) -> usize {
        let last = self.total_pages(cache).max(1);
        if self.page > last {
            debug!(
                subsystem = "catalog",
                component = "browse",
                current = self.page,
                total_pages = last,
                "Page clamped to last page"
            );
            self.page = last;
        }
        self.page
    }

    /// The visible page, after [`sync`](Self::sync).
    pub fn view(&mut self, cache: &CatalogCache) -> PageView<Note> {
        self.sync(cache);
        cache.view(&self.query, &self.category, self.page, self.page_size)
    }
}

impl Default for BrowseState {
    fn default() -> Self {
        Self::new(notevault_core::defaults::PAGE_SIZE)
    }
}
