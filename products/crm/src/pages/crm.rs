//! Sales pipeline screen: a lead board and a deal board behind two tabs.

use entity::{KanbanRecord, account, deal, lead};
use platform_api::ApiClient;
use tracing::warn;
use uuid::Uuid;

use crate::{
    form::{SubmitError, Validate, submit},
    kanban::KanbanBoard,
    list::load_options,
    stats::{DealStats, LeadStats, deal_stats, lead_stats},
    toast::Toasts,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CrmTab {
    #[default]
    Leads,
    Deals,
}

pub struct CrmPage {
    tab: CrmTab,
    pub leads: KanbanBoard<lead::Model>,
    pub deals: KanbanBoard<deal::Model>,
    accounts: Vec<account::Model>,
    pub toasts: Toasts,
    leads_loaded: bool,
    deals_loaded: bool,
}

impl CrmPage {
    pub fn new(page_size: u32) -> Self {
        Self {
            tab: CrmTab::default(),
            leads: KanbanBoard::new(page_size),
            deals: KanbanBoard::new(page_size),
            accounts: Vec::new(),
            toasts: Toasts::default(),
            leads_loaded: false,
            deals_loaded: false,
        }
    }

    pub fn tab(&self) -> CrmTab {
        self.tab
    }

    pub fn accounts(&self) -> &[account::Model] {
        &self.accounts
    }

    pub async fn open(&mut self, client: &ApiClient) {
        self.accounts = load_options(&client.resource::<account::Model>()).await;
        self.ensure_loaded(client).await;
    }

    /// Boards load the first time their tab is shown.
    pub async fn switch_tab(&mut self, client: &ApiClient, tab: CrmTab) {
        self.tab = tab;
        self.ensure_loaded(client).await;
    }

    async fn ensure_loaded(&mut self, client: &ApiClient) {
        match self.tab {
            CrmTab::Leads if !self.leads_loaded => {
                self.leads.load(&client.kanban::<lead::Model>()).await;
                // A failed load is retried on the next visit.
                self.leads_loaded = self.leads.error().is_none();
            }
            CrmTab::Deals if !self.deals_loaded => {
                self.deals.load(&client.kanban::<deal::Model>()).await;
                self.deals_loaded = self.deals.error().is_none();
            }
            _ => {}
        }
    }

    pub async fn refresh(&mut self, client: &ApiClient) {
        match self.tab {
            CrmTab::Leads => self.leads.load(&client.kanban::<lead::Model>()).await,
            CrmTab::Deals => self.deals.load(&client.kanban::<deal::Model>()).await,
        }
    }

    pub async fn move_lead(
        &mut self,
        client: &ApiClient,
        id: Uuid,
        to: lead::Status,
        position: usize,
    ) -> bool {
        let result = self
            .leads
            .move_card(&client.kanban::<lead::Model>(), id, to, position)
            .await;
        if let Err(err) = result {
            self.toasts.error(format!("Failed to move lead: {err}"));
            return false;
        }
        true
    }

    pub async fn move_deal(
        &mut self,
        client: &ApiClient,
        id: Uuid,
        to: deal::Stage,
        position: usize,
    ) -> bool {
        let result = self
            .deals
            .move_card(&client.kanban::<deal::Model>(), id, to, position)
            .await;
        if let Err(err) = result {
            self.toasts.error(format!("Failed to move deal: {err}"));
            return false;
        }
        true
    }

    pub async fn create_lead(&mut self, client: &ApiClient, draft: lead::Draft) -> Result<lead::Model, SubmitError> {
        let saved = self.create(&client.resource::<lead::Model>(), draft).await?;
        self.leads.load(&client.kanban::<lead::Model>()).await;
        Ok(saved)
    }

    pub async fn create_deal(&mut self, client: &ApiClient, draft: deal::Draft) -> Result<deal::Model, SubmitError> {
        let saved = self.create(&client.resource::<deal::Model>(), draft).await?;
        self.deals.load(&client.kanban::<deal::Model>()).await;
        Ok(saved)
    }

    async fn create<R>(&mut self, api: &platform_api::ResourceApi<R>, draft: R::Draft) -> Result<R, SubmitError>
    where
        R: KanbanRecord,
        R::Draft: Validate,
    {
        match submit(api, draft, None).await {
            Ok(saved) => {
                self.toasts.success(format!("{} created", R::LABEL));
                Ok(saved)
            }
            Err(err) => {
                if let SubmitError::Api(api_err) = &err {
                    warn!(resource = R::PATH, error = %api_err, "create failed");
                    self.toasts.error(format!("Failed to create {}: {}", R::LABEL.to_lowercase(), api_err));
                }
                Err(err)
            }
        }
    }

    /// Leads currently on the board, across all columns.
    pub fn lead_stats(&self) -> LeadStats {
        let loaded: Vec<lead::Model> = self
            .leads
            .columns()
            .iter()
            .flat_map(|c| c.items().iter().cloned())
            .collect();
        lead_stats(&loaded)
    }

    pub fn deal_stats(&self) -> DealStats {
        let loaded: Vec<deal::Model> = self
            .deals
            .columns()
            .iter()
            .flat_map(|c| c.items().iter().cloned())
            .collect();
        deal_stats(&loaded)
    }

    pub fn account_name(&self, id: Option<Uuid>) -> Option<&str> {
        let id = id?;
        self.accounts
            .iter()
            .find(|a| a.id == id)
            .map(|a| a.name.as_str())
    }
}
