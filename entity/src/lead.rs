use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{KanbanRecord, Resource};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    pub status: Status,
    #[serde(default)]
    pub value_cents: Option<i64>,
    #[serde(default)]
    pub owner_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default)]
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_cents: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<Uuid>,
}

impl From<&Model> for Draft {
    fn from(model: &Model) -> Self {
        Self {
            name: model.name.clone(),
            company: model.company.clone(),
            email: model.email.clone(),
            phone: model.phone.clone(),
            source: model.source.clone(),
            status: model.status,
            value_cents: model.value_cents,
            owner_id: model.owner_id,
        }
    }
}

choice! {
    /// Lead funnel position; also the kanban column key.
    pub enum Status {
        New => "new",
        Contacted => "contacted",
        Qualified => "qualified",
        Proposal => "proposal",
        Won => "won",
        Lost => "lost",
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::New
    }
}

impl Resource for Model {
    type Draft = Draft;
    const PATH: &'static str = "leads";
    const LABEL: &'static str = "Lead";

    fn id(&self) -> Uuid {
        self.id
    }

    fn title(&self) -> String {
        match &self.company {
            Some(company) => format!("{} ({})", self.name, company),
            None => self.name.clone(),
        }
    }
}

impl KanbanRecord for Model {
    type Status = Status;

    fn status(&self) -> Status {
        self.status
    }

    fn set_status(&mut self, status: Status) {
        self.status = status;
    }

    fn amount_cents(&self) -> Option<i64> {
        self.value_cents
    }
}
