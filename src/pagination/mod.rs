use serde::{Deserialize, Serialize};

use crate::config::settings::PaginationSettings;

/// Raw `page` / `page_size` query parameters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

/// Largest offset SQLite accepts
const MAX_OFFSET: usize = i64::MAX as usize;

/// Validated, 1-based page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub page_size: usize,
}

impl PageRequest {
    pub fn from_params(params: &PageParams, settings: &PaginationSettings) -> Self {
        let page_size = params
            .page_size
            .unwrap_or(settings.default_page_size)
            .clamp(1, settings.max_page_size);
        let last_page = MAX_OFFSET / page_size + 1;
        let page = params.page.unwrap_or(1).clamp(1, last_page);
        Self { page, page_size }
    }

    pub fn offset(&self) -> usize {
        self.page
            .saturating_sub(1)
            .saturating_mul(self.page_size)
            .min(MAX_OFFSET)
    }

    pub fn limit(&self) -> usize {
        self.page_size
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: usize, request: PageRequest) -> Self {
        let total_pages = total.div_ceil(request.page_size);
        Self {
            items,
            total,
            page: request.page,
            page_size: request.page_size,
            total_pages,
            has_next: request.page < total_pages,
            has_previous: request.page > 1,
        }
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
            total_pages: self.total_pages,
            has_next: self.has_next,
            has_previous: self.has_previous,
        }
    }
}
