use entity::{Choice, account, user};
use platform_api::ApiClient;
use uuid::Uuid;

use super::CrudPage;
use crate::{list::load_options, stats::{AccountStats, account_stats}};

pub struct AccountsPage {
    pub crud: CrudPage<account::Model>,
    owners: Vec<user::Model>,
}

impl AccountsPage {
    pub fn new(page_size: u32) -> Self {
        Self {
            crud: CrudPage::new(page_size),
            owners: Vec::new(),
        }
    }

    /// First visit: load the table and the owner dropdown.
    pub async fn open(&mut self, client: &ApiClient) -> bool {
        if !self.crud.list.init(&client.resource::<account::Model>()).await {
            return false;
        }
        self.owners = load_options(&client.resource::<user::Model>()).await;
        true
    }

    pub async fn refresh(&mut self, client: &ApiClient) {
        self.crud.list.load(&client.resource::<account::Model>()).await;
    }

    pub async fn search(&mut self, client: &ApiClient, term: &str) {
        self.crud
            .list
            .set_search(&client.resource::<account::Model>(), term)
            .await;
    }

    pub async fn filter_status(&mut self, client: &ApiClient, status: Option<account::Status>) {
        self.crud
            .list
            .set_filter(
                &client.resource::<account::Model>(),
                "status",
                status.map(|s| s.as_str().to_string()),
            )
            .await;
    }

    pub async fn go_to(&mut self, client: &ApiClient, page: u32) {
        self.crud
            .list
            .go_to(&client.resource::<account::Model>(), page)
            .await;
    }

    pub fn owners(&self) -> &[user::Model] {
        &self.owners
    }

    pub fn owner_name(&self, account: &account::Model) -> Option<&str> {
        let owner = self.owners.iter().find(|u| Some(u.id) == account.owner_id)?;
        Some(owner.display_name.as_deref().unwrap_or(&owner.email))
    }

    pub fn stats(&self) -> AccountStats {
        account_stats(self.crud.list.items())
    }

    pub async fn save(&mut self, client: &ApiClient, draft: account::Draft) -> Option<account::Model> {
        self.crud
            .save(&client.resource::<account::Model>(), draft)
            .await
    }

    pub async fn confirm_delete(&mut self, client: &ApiClient, id: Uuid) -> bool {
        self.crud
            .confirm_delete(&client.resource::<account::Model>(), id)
            .await
    }
}
