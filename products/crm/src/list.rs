//! Paginated, filterable list state shared by every table page.

use std::collections::BTreeMap;

use entity::Resource;
use platform_api::ListParams;
use tracing::{debug, info_span, warn, Instrument};
use uuid::Uuid;

use crate::{
    pagination::{PageItem, Pager},
    source::ListSource,
};

#[derive(Clone, Debug)]
pub struct ListPage<R> {
    items: Vec<R>,
    pager: Pager,
    search: String,
    sort: Option<String>,
    filters: BTreeMap<String, String>,
    loading: bool,
    error: Option<String>,
    initialized: bool,
}

impl<R: Resource> ListPage<R> {
    pub fn new(page_size: u32) -> Self {
        Self {
            items: Vec::new(),
            pager: Pager::new(page_size),
            search: String::new(),
            sort: None,
            filters: BTreeMap::new(),
            loading: false,
            error: None,
            initialized: false,
        }
    }

    pub fn starting_at(mut self, page: u32) -> Self {
        self.pager = self.pager.starting_at(page);
        self
    }

    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search = term.into().trim().to_string();
        self
    }

    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        if !value.trim().is_empty() {
            self.filters.insert(key.into(), value);
        }
        self
    }

    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn items(&self) -> &[R] {
        &self.items
    }

    pub fn find(&self, id: Uuid) -> Option<&R> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn pager(&self) -> &Pager {
        &self.pager
    }

    pub fn window(&self, siblings: u32) -> Vec<PageItem> {
        self.pager.window(siblings)
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn filters(&self) -> &BTreeMap<String, String> {
        &self.filters
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Banner text from the last failed load, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// True once a load has succeeded and returned no rows.
    pub fn is_empty(&self) -> bool {
        self.initialized && self.error.is_none() && self.items.is_empty()
    }

    pub fn params(&self) -> ListParams {
        let mut params = ListParams::new(self.pager.page(), self.pager.page_size())
            .with_search(self.search.clone());
        if let Some(sort) = &self.sort {
            params = params.with_sort(sort.clone());
        }
        for (key, value) in &self.filters {
            params = params.with_filter(key.clone(), value.clone());
        }
        params
    }

    /// First load. Subsequent calls do nothing and return `false`.
    pub async fn init<S: ListSource<R>>(&mut self, source: &S) -> bool {
        if self.initialized {
            return false;
        }
        self.initialized = true;
        self.load(source).await;
        true
    }

    /// Fetch the current page. On failure the previous rows stay visible and
    /// the error banner is set.
    pub async fn load<S: ListSource<R>>(&mut self, source: &S) {
        self.initialized = true;
        self.loading = true;
        self.error = None;
        let mut retried = false;
        loop {
            let span = info_span!("crm.list", resource = R::PATH, page = self.pager.page());
            let result = source
                .fetch_page(&self.params())
                .instrument(span.clone())
                .await;
            match result {
                Ok(page) => {
                    self.pager.set_total(page.total);
                    let past_end =
                        page.items.is_empty() && page.total > 0 && self.pager.page() > 1;
                    self.items = page.items;
                    if past_end && !retried {
                        // Rows were removed since the last load; land on the new last page.
                        retried = true;
                        let last = self.pager.go_to(self.pager.total_pages());
                        debug!(parent: &span, last, "requested page is past the end");
                        continue;
                    }
                }
                Err(err) => {
                    warn!(parent: &span, error = %err, "list load failed");
                    self.error = Some(format!(
                        "Failed to load {}s: {}",
                        R::LABEL.to_lowercase(),
                        err
                    ));
                }
            }
            break;
        }
        self.loading = false;
    }

    pub async fn go_to<S: ListSource<R>>(&mut self, source: &S, page: u32) {
        self.pager.go_to(page);
        self.load(source).await;
    }

    pub async fn next<S: ListSource<R>>(&mut self, source: &S) {
        if self.pager.has_next() {
            self.pager.next();
            self.load(source).await;
        }
    }

    pub async fn prev<S: ListSource<R>>(&mut self, source: &S) {
        if self.pager.has_prev() {
            self.pager.prev();
            self.load(source).await;
        }
    }

    /// Changing the search term always restarts from page 1.
    pub async fn set_search<S: ListSource<R>>(&mut self, source: &S, term: impl Into<String>) {
        let term = term.into().trim().to_string();
        if term == self.search && self.initialized {
            return;
        }
        self.search = term;
        self.pager.reset();
        self.load(source).await;
    }

    /// Set or clear (`None` or empty) one filter, then reload from page 1.
    pub async fn set_filter<S: ListSource<R>>(
        &mut self,
        source: &S,
        key: impl Into<String>,
        value: Option<String>,
    ) {
        let key = key.into();
        match value.filter(|v| !v.trim().is_empty()) {
            Some(value) => {
                self.filters.insert(key, value);
            }
            None => {
                self.filters.remove(&key);
            }
        }
        self.pager.reset();
        self.load(source).await;
    }

    pub async fn set_sort<S: ListSource<R>>(&mut self, source: &S, sort: Option<String>) {
        self.sort = sort;
        self.pager.reset();
        self.load(source).await;
    }

    pub async fn set_page_size<S: ListSource<R>>(&mut self, source: &S, page_size: u32) {
        self.pager.set_page_size(page_size);
        self.load(source).await;
    }
}

/// Load a dropdown option list. Failures are logged and yield no options.
pub async fn load_options<R: Resource, S: ListSource<R>>(source: &S) -> Vec<R> {
    match source.fetch_all().await {
        Ok(options) => options,
        Err(err) => {
            warn!(resource = R::PATH, error = %err, "option list unavailable");
            Vec::new()
        }
    }
}
