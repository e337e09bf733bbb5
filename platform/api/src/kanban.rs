use std::marker::PhantomData;

use entity::{Choice, KanbanRecord, PaginatedResponse};
use reqwest::Method;
use serde::Serialize;
use uuid::Uuid;

use crate::{ApiClient, ApiResult};

/// Per-column paging and card moves for a kanban-capable collection.
pub struct KanbanApi<R> {
    client: ApiClient,
    _record: PhantomData<fn() -> R>,
}

impl<R> Clone for KanbanApi<R> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            _record: PhantomData,
        }
    }
}

#[derive(Serialize)]
struct MoveRequest<'a> {
    status: &'a str,
    position: u32,
}

impl<R: KanbanRecord> KanbanApi<R> {
    pub(crate) fn new(client: ApiClient) -> Self {
        Self {
            client,
            _record: PhantomData,
        }
    }

    pub async fn column(
        &self,
        status: R::Status,
        page: u32,
        page_size: u32,
    ) -> ApiResult<PaginatedResponse<R>> {
        let url = self.client.url(&[R::PATH, "kanban"])?;
        let builder = self.client.request(Method::GET, url).query(&[
            ("status", status.as_str().to_string()),
            ("page", page.max(1).to_string()),
            ("page_size", page_size.max(1).to_string()),
        ]);
        let page: PaginatedResponse<R> = self.client.send_json(builder).await?;
        Ok(page.normalized())
    }

    /// Persist a card's new column and 0-based position within it.
    pub async fn move_card(&self, id: Uuid, status: R::Status, position: u32) -> ApiResult<R> {
        let url = self.client.url(&[R::PATH, &id.to_string(), "move"])?;
        let body = MoveRequest {
            status: status.as_str(),
            position,
        };
        let builder = self.client.request(Method::PATCH, url).json(&body);
        self.client.send_json(builder).await
    }
}
