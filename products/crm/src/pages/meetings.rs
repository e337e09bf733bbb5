use chrono::{DateTime, Utc};
use entity::{Choice, account, calendar_event};
use platform_api::ApiClient;
use uuid::Uuid;

use super::CrudPage;
use crate::list::load_options;

/// Table of calendar events with create, edit and delete.
pub struct MeetingsPage {
    pub crud: CrudPage<calendar_event::Model>,
    accounts: Vec<account::Model>,
}

impl MeetingsPage {
    pub fn new(page_size: u32) -> Self {
        Self {
            crud: CrudPage::new(page_size),
            accounts: Vec::new(),
        }
    }

    pub async fn open(&mut self, client: &ApiClient) -> bool {
        if !self
            .crud
            .list
            .init(&client.resource::<calendar_event::Model>())
            .await
        {
            return false;
        }
        self.accounts = load_options(&client.resource::<account::Model>()).await;
        true
    }

    pub fn accounts(&self) -> &[account::Model] {
        &self.accounts
    }

    pub async fn filter_kind(&mut self, client: &ApiClient, kind: Option<calendar_event::Kind>) {
        self.crud
            .list
            .set_filter(
                &client.resource::<calendar_event::Model>(),
                "kind",
                kind.map(|k| k.as_str().to_string()),
            )
            .await;
    }

    /// Loaded events that have not started yet, earliest first.
    pub fn upcoming(&self, now: DateTime<Utc>) -> Vec<&calendar_event::Model> {
        let mut events: Vec<_> = self
            .crud
            .list
            .items()
            .iter()
            .filter(|e| e.starts_at >= now)
            .collect();
        events.sort_by_key(|e| e.starts_at);
        events
    }

    pub async fn save(
        &mut self,
        client: &ApiClient,
        draft: calendar_event::Draft,
    ) -> Option<calendar_event::Model> {
        self.crud
            .save(&client.resource::<calendar_event::Model>(), draft)
            .await
    }

    pub async fn confirm_delete(&mut self, client: &ApiClient, id: Uuid) -> bool {
        self.crud
            .confirm_delete(&client.resource::<calendar_event::Model>(), id)
            .await
    }
}
