use serde::{Deserialize, Serialize};

pub const MAX_PAGE_SIZE: usize = 500;

/// Page request parsed from the query string.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

impl PageParams {
    /// Resolves `(page, limit)`, falling back to `default_limit`.
    pub fn resolve(&self, default_limit: usize) -> (usize, usize) {
        let page = self.page.filter(|page| *page > 0).unwrap_or(1);
        let limit = self
            .limit
            .filter(|limit| *limit > 0)
            .unwrap_or(default_limit)
            .min(MAX_PAGE_SIZE);
        (page, limit)
    }
}

/// Envelope returned by every paginated list endpoint.
#[derive(Debug, Serialize, PartialEq)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub total_pages: usize,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, total: usize, page: usize, limit: usize) -> Self {
        let page = if page == 0 { 1 } else { page };
        let total_pages = if limit == 0 { 0 } else { total.div_ceil(limit) };

        Self {
            data,
            total,
            page,
            limit,
            total_pages,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            data: self.data.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
            total_pages: self.total_pages,
        }
    }
}
