use chrono::NaiveDate;
use entity::{Choice, account, carepack, product};
use platform_api::ApiClient;
use tracing::warn;
use uuid::Uuid;

use super::CrudPage;
use crate::{
    list::load_options,
    stats::{CarepackStats, EXPIRY_WINDOW_DAYS, carepack_stats},
};

pub struct CarepackPage {
    pub crud: CrudPage<carepack::Model>,
    expiring: Vec<carepack::Model>,
    expiring_error: Option<String>,
    window_days: u32,
    accounts: Vec<account::Model>,
    products: Vec<product::Model>,
}

impl CarepackPage {
    pub fn new(page_size: u32) -> Self {
        Self {
            crud: CrudPage::new(page_size),
            expiring: Vec::new(),
            expiring_error: None,
            window_days: EXPIRY_WINDOW_DAYS as u32,
            accounts: Vec::new(),
            products: Vec::new(),
        }
    }

    pub async fn open(&mut self, client: &ApiClient) -> bool {
        if !self.crud.list.init(&client.resource::<carepack::Model>()).await {
            return false;
        }
        self.load_expiring(client).await;
        self.accounts = load_options(&client.resource::<account::Model>()).await;
        self.products = load_options(&client.resource::<product::Model>()).await;
        true
    }

    /// Carepacks ending within the window, soonest first.
    pub fn expiring(&self) -> &[carepack::Model] {
        &self.expiring
    }

    pub fn expiring_error(&self) -> Option<&str> {
        self.expiring_error.as_deref()
    }

    pub fn window_days(&self) -> u32 {
        self.window_days
    }

    pub async fn set_window(&mut self, client: &ApiClient, days: u32) {
        self.window_days = days.max(1);
        self.load_expiring(client).await;
    }

    async fn load_expiring(&mut self, client: &ApiClient) {
        match client
            .resource::<carepack::Model>()
            .expiring(self.window_days)
            .await
        {
            Ok(mut packs) => {
                packs.sort_by_key(|p| p.end_date);
                self.expiring = packs;
                self.expiring_error = None;
            }
            Err(err) => {
                warn!(error = %err, "expiring carepacks unavailable");
                self.expiring_error = Some(format!("Failed to load expiring carepacks: {err}"));
            }
        }
    }

    pub async fn filter_status(&mut self, client: &ApiClient, status: Option<carepack::Status>) {
        self.crud
            .list
            .set_filter(
                &client.resource::<carepack::Model>(),
                "status",
                status.map(|s| s.as_str().to_string()),
            )
            .await;
    }

    pub fn accounts(&self) -> &[account::Model] {
        &self.accounts
    }

    pub fn products(&self) -> &[product::Model] {
        &self.products
    }

    pub fn stats(&self, today: NaiveDate) -> CarepackStats {
        carepack_stats(self.crud.list.items(), today, i64::from(self.window_days))
    }

    pub async fn save(&mut self, client: &ApiClient, draft: carepack::Draft) -> Option<carepack::Model> {
        let saved = self
            .crud
            .save(&client.resource::<carepack::Model>(), draft)
            .await?;
        self.load_expiring(client).await;
        Some(saved)
    }

    pub async fn confirm_delete(&mut self, client: &ApiClient, id: Uuid) -> bool {
        let deleted = self
            .crud
            .confirm_delete(&client.resource::<carepack::Model>(), id)
            .await;
        if deleted {
            self.expiring.retain(|p| p.id != id);
        }
        deleted
    }
}
