use std::collections::BTreeMap;

use entity::{Choice, email, email_template};
use platform_api::ApiClient;
use tracing::{info, warn};
use uuid::Uuid;

use super::CrudPage;
use crate::{
    list::load_options,
    template::{TemplateError, compose},
};

pub struct EmailsPage {
    pub crud: CrudPage<email::Model>,
    pub templates: CrudPage<email_template::Model>,
    template_options: Vec<email_template::Model>,
    sending: Option<Uuid>,
}

impl EmailsPage {
    pub fn new(page_size: u32) -> Self {
        Self {
            crud: CrudPage::new(page_size),
            templates: CrudPage::new(page_size),
            template_options: Vec::new(),
            sending: None,
        }
    }

    pub async fn open(&mut self, client: &ApiClient) -> bool {
        if !self.crud.list.init(&client.resource::<email::Model>()).await {
            return false;
        }
        self.template_options = load_options(&client.resource::<email_template::Model>()).await;
        true
    }

    /// The template management tab.
    pub async fn open_templates(&mut self, client: &ApiClient) {
        self.templates
            .list
            .init(&client.resource::<email_template::Model>())
            .await;
    }

    pub fn template_options(&self) -> &[email_template::Model] {
        &self.template_options
    }

    pub fn is_sending(&self, id: Uuid) -> bool {
        self.sending == Some(id)
    }

    pub async fn filter_status(&mut self, client: &ApiClient, status: Option<email::Status>) {
        self.crud
            .list
            .set_filter(
                &client.resource::<email::Model>(),
                "status",
                status.map(|s| s.as_str().to_string()),
            )
            .await;
    }

    /// Build a draft from a loaded template option.
    pub fn compose(
        &self,
        template_id: Uuid,
        to: &str,
        vars: &BTreeMap<String, String>,
    ) -> Option<Result<email::Draft, TemplateError>> {
        let template = self.template_options.iter().find(|t| t.id == template_id)?;
        Some(compose(template, to, vars))
    }

    pub async fn save(&mut self, client: &ApiClient, draft: email::Draft) -> Option<email::Model> {
        self.crud.save(&client.resource::<email::Model>(), draft).await
    }

    pub async fn save_template(
        &mut self,
        client: &ApiClient,
        draft: email_template::Draft,
    ) -> Option<email_template::Model> {
        let api = client.resource::<email_template::Model>();
        let saved = self.templates.save(&api, draft).await?;
        self.template_options = load_options(&api).await;
        Some(saved)
    }

    /// Send a stored draft. Sent emails cannot be sent again.
    pub async fn send(&mut self, client: &ApiClient, id: Uuid) -> bool {
        if self.sending.is_some() {
            return false;
        }
        if self
            .crud
            .list
            .find(id)
            .is_some_and(|e| e.status == email::Status::Sent)
        {
            self.crud.toasts.error("Email was already sent");
            return false;
        }
        self.sending = Some(id);
        let result = client.resource::<email::Model>().send(id).await;
        self.sending = None;
        match result {
            Ok(sent) => {
                info!(%id, status = sent.status.as_str(), "email sent");
                self.crud.toasts.success(format!("Email sent to {}", sent.to));
                self.crud.list.load(&client.resource::<email::Model>()).await;
                true
            }
            Err(err) => {
                warn!(%id, error = %err, "send failed");
                self.crud.toasts.error(format!("Failed to send email: {err}"));
                false
            }
        }
    }

    pub async fn confirm_delete(&mut self, client: &ApiClient, id: Uuid) -> bool {
        self.crud
            .confirm_delete(&client.resource::<email::Model>(), id)
            .await
    }
}
