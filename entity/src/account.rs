use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Resource;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub status: Status,
    #[serde(default)]
    pub annual_revenue_cents: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub owner_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annual_revenue_cents: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<Uuid>,
}

impl From<&Model> for Draft {
    fn from(model: &Model) -> Self {
        Self {
            name: model.name.clone(),
            industry: model.industry.clone(),
            website: model.website.clone(),
            phone: model.phone.clone(),
            email: model.email.clone(),
            status: model.status,
            annual_revenue_cents: model.annual_revenue_cents,
            currency: model.currency.clone(),
            owner_id: model.owner_id,
        }
    }
}

choice! {
    pub enum Status {
        Prospect => "prospect",
        Active => "active",
        Inactive => "inactive",
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::Prospect
    }
}

impl Resource for Model {
    type Draft = Draft;
    const PATH: &'static str = "accounts";
    const LABEL: &'static str = "Account";

    fn id(&self) -> Uuid {
        self.id
    }

    fn title(&self) -> String {
        self.name.clone()
    }
}
