use std::{collections::BTreeMap, marker::PhantomData};

use chrono::{DateTime, Utc};
use entity::{PaginatedResponse, Resource, calendar_event, carepack, email};
use reqwest::Method;
use uuid::Uuid;

use crate::{ApiClient, ApiResult};

pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Query for a paginated list endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListParams {
    pub page: u32,
    pub page_size: u32,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub filters: BTreeMap<String, String>,
}

impl Default for ListParams {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

impl ListParams {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
            search: None,
            sort: None,
            filters: BTreeMap::new(),
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        let search = search.into();
        self.search = Some(search).filter(|s| !s.trim().is_empty());
        self
    }

    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("page".to_string(), self.page.to_string()),
            ("page_size".to_string(), self.page_size.to_string()),
        ];
        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            pairs.push(("search".to_string(), search.to_string()));
        }
        if let Some(sort) = &self.sort {
            pairs.push(("sort".to_string(), sort.clone()));
        }
        for (key, value) in &self.filters {
            if value.is_empty() {
                continue;
            }
            pairs.push((key.clone(), value.clone()));
        }
        pairs
    }
}

/// CRUD endpoints for one collection.
pub struct ResourceApi<R> {
    client: ApiClient,
    _record: PhantomData<fn() -> R>,
}

impl<R> Clone for ResourceApi<R> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            _record: PhantomData,
        }
    }
}

impl<R: Resource> ResourceApi<R> {
    pub(crate) fn new(client: ApiClient) -> Self {
        Self {
            client,
            _record: PhantomData,
        }
    }

    pub async fn list(&self, params: &ListParams) -> ApiResult<PaginatedResponse<R>> {
        let url = self.client.url(&[R::PATH])?;
        let builder = self
            .client
            .request(Method::GET, url)
            .query(&params.query_pairs());
        let page: PaginatedResponse<R> = self.client.send_json(builder).await?;
        Ok(page.normalized())
    }

    /// Unpaginated plain-array listing, used for dropdown options.
    pub async fn all(&self) -> ApiResult<Vec<R>> {
        let url = self.client.url(&[R::PATH, "all"])?;
        self.client
            .send_json(self.client.request(Method::GET, url))
            .await
    }

    pub async fn get(&self, id: Uuid) -> ApiResult<R> {
        let url = self.client.url(&[R::PATH, &id.to_string()])?;
        self.client
            .send_json(self.client.request(Method::GET, url))
            .await
    }

    pub async fn create(&self, draft: &R::Draft) -> ApiResult<R> {
        let url = self.client.url(&[R::PATH])?;
        let builder = self.client.request(Method::POST, url).json(draft);
        self.client.send_json(builder).await
    }

    pub async fn update(&self, id: Uuid, draft: &R::Draft) -> ApiResult<R> {
        let url = self.client.url(&[R::PATH, &id.to_string()])?;
        let builder = self.client.request(Method::PUT, url).json(draft);
        self.client.send_json(builder).await
    }

    pub async fn delete(&self, id: Uuid) -> ApiResult<()> {
        let url = self.client.url(&[R::PATH, &id.to_string()])?;
        self.client
            .send_empty(self.client.request(Method::DELETE, url))
            .await
    }
}

impl ResourceApi<carepack::Model> {
    /// Carepacks whose end date falls within the next `days` days.
    pub async fn expiring(&self, days: u32) -> ApiResult<Vec<carepack::Model>> {
        let url = self.client.url(&[carepack::Model::PATH, "expiring"])?;
        let builder = self
            .client
            .request(Method::GET, url)
            .query(&[("days", days.to_string())]);
        self.client.send_json(builder).await
    }
}

impl ResourceApi<email::Model> {
    pub async fn send(&self, id: Uuid) -> ApiResult<email::Model> {
        let url = self
            .client
            .url(&[email::Model::PATH, &id.to_string(), "send"])?;
        self.client
            .send_json(self.client.request(Method::POST, url))
            .await
    }
}

impl ResourceApi<calendar_event::Model> {
    /// Events overlapping `[from, to)`.
    pub async fn between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> ApiResult<Vec<calendar_event::Model>> {
        let url = self.client.url(&[calendar_event::Model::PATH])?;
        let builder = self
            .client
            .request(Method::GET, url)
            .query(&[("from", from.to_rfc3339()), ("to", to.to_rfc3339())]);
        self.client.send_json(builder).await
    }
}
