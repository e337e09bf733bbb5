//! Seams between page state and the backend.
//!
//! The REST client implements these; tests substitute in-memory fakes.

use std::future::Future;

use entity::{KanbanRecord, PaginatedResponse, Resource};
use platform_api::{ApiResult, KanbanApi, ListParams, ResourceApi};
use uuid::Uuid;

pub trait ListSource<R: Resource>: Sync {
    fn fetch_page(
        &self,
        params: &ListParams,
    ) -> impl Future<Output = ApiResult<PaginatedResponse<R>>> + Send;

    /// Unpaginated listing for option lists.
    fn fetch_all(&self) -> impl Future<Output = ApiResult<Vec<R>>> + Send;
}

pub trait RecordSink<R: Resource>: Sync {
    fn create(&self, draft: &R::Draft) -> impl Future<Output = ApiResult<R>> + Send;

    fn update(&self, id: Uuid, draft: &R::Draft) -> impl Future<Output = ApiResult<R>> + Send;

    fn delete(&self, id: Uuid) -> impl Future<Output = ApiResult<()>> + Send;
}

pub trait KanbanSource<R: KanbanRecord>: Sync {
    fn fetch_column(
        &self,
        status: R::Status,
        page: u32,
        page_size: u32,
    ) -> impl Future<Output = ApiResult<PaginatedResponse<R>>> + Send;

    fn move_card(
        &self,
        id: Uuid,
        status: R::Status,
        position: u32,
    ) -> impl Future<Output = ApiResult<R>> + Send;
}

impl<R: Resource> ListSource<R> for ResourceApi<R> {
    async fn fetch_page(&self, params: &ListParams) -> ApiResult<PaginatedResponse<R>> {
        self.list(params).await
    }

    async fn fetch_all(&self) -> ApiResult<Vec<R>> {
        self.all().await
    }
}

impl<R: Resource> RecordSink<R> for ResourceApi<R> {
    async fn create(&self, draft: &R::Draft) -> ApiResult<R> {
        ResourceApi::create(self, draft).await
    }

    async fn update(&self, id: Uuid, draft: &R::Draft) -> ApiResult<R> {
        ResourceApi::update(self, id, draft).await
    }

    async fn delete(&self, id: Uuid) -> ApiResult<()> {
        ResourceApi::delete(self, id).await
    }
}

impl<R: KanbanRecord> KanbanSource<R> for KanbanApi<R> {
    async fn fetch_column(
        &self,
        status: R::Status,
        page: u32,
        page_size: u32,
    ) -> ApiResult<PaginatedResponse<R>> {
        self.column(status, page, page_size).await
    }

    async fn move_card(&self, id: Uuid, status: R::Status, position: u32) -> ApiResult<R> {
        KanbanApi::move_card(self, id, status, position).await
    }
}
