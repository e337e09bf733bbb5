//! In-memory backend used by unit tests.

use std::sync::Mutex;

use chrono::{TimeZone, Utc};
use entity::{KanbanRecord, PaginatedResponse, Resource, account, deal};
use platform_api::{ApiError, ApiResult, ListParams};
use uuid::Uuid;

use crate::source::{KanbanSource, ListSource, RecordSink};

pub(crate) struct FakeStore<R> {
    records: Mutex<Vec<R>>,
    fail_next: Mutex<Option<ApiError>>,
    list_calls: Mutex<usize>,
    last_params: Mutex<Option<ListParams>>,
    drafts: Mutex<Vec<String>>,
    deleted: Mutex<Vec<Uuid>>,
}

impl<R: Resource> FakeStore<R> {
    pub(crate) fn new(records: Vec<R>) -> Self {
        Self {
            records: Mutex::new(records),
            fail_next: Mutex::new(None),
            list_calls: Mutex::new(0),
            last_params: Mutex::new(None),
            drafts: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn fail_next(&self, err: ApiError) {
        *self.fail_next.lock().unwrap() = Some(err);
    }

    pub(crate) fn list_calls(&self) -> usize {
        *self.list_calls.lock().unwrap()
    }

    pub(crate) fn last_params(&self) -> Option<ListParams> {
        self.last_params.lock().unwrap().clone()
    }

    /// Titles of every draft written through create or update.
    pub(crate) fn drafts(&self) -> Vec<String> {
        self.drafts.lock().unwrap().clone()
    }

    pub(crate) fn deleted(&self) -> Vec<Uuid> {
        self.deleted.lock().unwrap().clone()
    }

    pub(crate) fn records(&self) -> Vec<R> {
        self.records.lock().unwrap().clone()
    }

    pub(crate) fn remove_where(&self, pred: impl Fn(&R) -> bool) {
        self.records.lock().unwrap().retain(|r| !pred(r));
    }

    fn take_failure(&self) -> ApiResult<()> {
        match self.fail_next.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn record_draft(&self, draft: &R::Draft) {
        self.drafts.lock().unwrap().push(format!("{draft:?}"));
    }
}

impl<R: Resource> ListSource<R> for FakeStore<R> {
    async fn fetch_page(&self, params: &ListParams) -> ApiResult<PaginatedResponse<R>> {
        *self.list_calls.lock().unwrap() += 1;
        *self.last_params.lock().unwrap() = Some(params.clone());
        self.take_failure()?;
        let needle = params.search.clone().unwrap_or_default().to_lowercase();
        let matching: Vec<R> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.title().to_lowercase().contains(&needle))
            .cloned()
            .collect();
        Ok(PaginatedResponse::slice(&matching, params.page, params.page_size))
    }

    async fn fetch_all(&self) -> ApiResult<Vec<R>> {
        self.take_failure()?;
        Ok(self.records())
    }
}

impl<R: Resource> RecordSink<R> for FakeStore<R> {
    async fn create(&self, draft: &R::Draft) -> ApiResult<R> {
        self.take_failure()?;
        self.record_draft(draft);
        self.records()
            .first()
            .cloned()
            .ok_or_else(|| ApiError::InvalidInput("fake store has no template record".into()))
    }

    async fn update(&self, id: Uuid, draft: &R::Draft) -> ApiResult<R> {
        self.take_failure()?;
        self.record_draft(draft);
        self.records()
            .into_iter()
            .find(|r| r.id() == id)
            .ok_or(ApiError::NotFound)
    }

    async fn delete(&self, id: Uuid) -> ApiResult<()> {
        self.take_failure()?;
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|r| r.id() != id);
        if records.len() == before {
            return Err(ApiError::NotFound);
        }
        self.deleted.lock().unwrap().push(id);
        Ok(())
    }
}

impl<R: KanbanRecord> KanbanSource<R> for FakeStore<R> {
    async fn fetch_column(
        &self,
        status: R::Status,
        page: u32,
        page_size: u32,
    ) -> ApiResult<PaginatedResponse<R>> {
        self.take_failure()?;
        let column: Vec<R> = self
            .records()
            .into_iter()
            .filter(|r| r.status() == status)
            .collect();
        Ok(PaginatedResponse::slice(&column, page, page_size))
    }

    async fn move_card(&self, id: Uuid, status: R::Status, position: u32) -> ApiResult<R> {
        self.take_failure()?;
        let mut records = self.records.lock().unwrap();
        let index = records
            .iter()
            .position(|r| r.id() == id)
            .ok_or(ApiError::NotFound)?;
        let mut card = records.remove(index);
        card.set_status(status);
        // Insert before the `position`-th card of the target column.
        let target = records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.status() == status)
            .map(|(i, _)| i)
            .nth(position as usize)
            .unwrap_or(records.len());
        records.insert(target, card.clone());
        Ok(card)
    }
}

pub(crate) fn ts() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
}

pub(crate) fn account(name: &str) -> account::Model {
    account::Model {
        id: Uuid::new_v4(),
        name: name.to_string(),
        industry: None,
        website: None,
        phone: None,
        email: None,
        status: account::Status::Active,
        annual_revenue_cents: None,
        currency: None,
        owner_id: None,
        created_at: ts(),
        updated_at: ts(),
    }
}

pub(crate) fn deal(title: &str, stage: deal::Stage, amount_cents: i64) -> deal::Model {
    deal::Model {
        id: Uuid::new_v4(),
        title: title.to_string(),
        account_id: None,
        amount_cents: Some(amount_cents),
        currency: Some("EUR".into()),
        stage,
        close_date: None,
        owner_id: None,
        created_at: ts(),
        updated_at: ts(),
    }
}
