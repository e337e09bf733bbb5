use serde::{Deserialize, Serialize};

/// One page of a collection, as returned by list endpoints. Pages are 1-based.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    #[serde(default)]
    pub total_pages: u32,
}

impl<T> PaginatedResponse<T> {
    pub fn empty(page_size: u32) -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page: 1,
            page_size,
            total_pages: 0,
        }
    }

    /// Fill in `total_pages` when the backend left it out.
    pub fn normalized(mut self) -> Self {
        if self.total_pages == 0 && self.total > 0 {
            self.total_pages = pages_for(self.total, self.page_size);
        }
        self
    }

    pub fn has_more(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginatedResponse<U> {
        PaginatedResponse {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
            total_pages: self.total_pages,
        }
    }
}

impl<T: Clone> PaginatedResponse<T> {
    /// Cut page `page` out of a fully materialized collection.
    pub fn slice(all: &[T], page: u32, page_size: u32) -> Self {
        let page_size = page_size.max(1);
        let page = page.max(1);
        let start = (page as usize - 1).saturating_mul(page_size as usize);
        let items = all
            .iter()
            .skip(start)
            .take(page_size as usize)
            .cloned()
            .collect();
        Self {
            items,
            total: all.len() as u64,
            page,
            page_size,
            total_pages: pages_for(all.len() as u64, page_size),
        }
    }
}

fn pages_for(total: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(u64::from(page_size)) as u32
}
