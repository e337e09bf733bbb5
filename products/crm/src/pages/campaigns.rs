use entity::{Choice, campaign};
use platform_api::ApiClient;
use uuid::Uuid;

use super::CrudPage;
use crate::stats::{CampaignStats, campaign_stats};

pub struct CampaignsView {
    pub crud: CrudPage<campaign::Model>,
}

impl CampaignsView {
    pub fn new(page_size: u32) -> Self {
        Self {
            crud: CrudPage::new(page_size),
        }
    }

    pub async fn open(&mut self, client: &ApiClient) -> bool {
        self.crud.list.init(&client.resource::<campaign::Model>()).await
    }

    pub async fn filter_status(&mut self, client: &ApiClient, status: Option<campaign::Status>) {
        self.crud
            .list
            .set_filter(
                &client.resource::<campaign::Model>(),
                "status",
                status.map(|s| s.as_str().to_string()),
            )
            .await;
    }

    pub fn stats(&self) -> CampaignStats {
        campaign_stats(self.crud.list.items())
    }

    pub async fn save(&mut self, client: &ApiClient, draft: campaign::Draft) -> Option<campaign::Model> {
        self.crud
            .save(&client.resource::<campaign::Model>(), draft)
            .await
    }

    pub async fn confirm_delete(&mut self, client: &ApiClient, id: Uuid) -> bool {
        self.crud
            .confirm_delete(&client.resource::<campaign::Model>(), id)
            .await
    }
}
