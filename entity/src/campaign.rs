use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Resource;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub id: Uuid,
    pub name: String,
    pub status: Status,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub budget_cents: Option<i64>,
    #[serde(default)]
    pub starts_on: Option<NaiveDate>,
    #[serde(default)]
    pub ends_on: Option<NaiveDate>,
    #[serde(default)]
    pub sent_count: u64,
    #[serde(default)]
    pub open_count: u64,
    #[serde(default)]
    pub click_count: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub name: String,
    #[serde(default)]
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_cents: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starts_on: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ends_on: Option<NaiveDate>,
}

impl From<&Model> for Draft {
    fn from(model: &Model) -> Self {
        Self {
            name: model.name.clone(),
            status: model.status,
            channel: model.channel.clone(),
            budget_cents: model.budget_cents,
            starts_on: model.starts_on,
            ends_on: model.ends_on,
        }
    }
}

choice! {
    pub enum Status {
        Draft => "draft",
        Scheduled => "scheduled",
        Running => "running",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::Draft
    }
}

impl Resource for Model {
    type Draft = Draft;
    const PATH: &'static str = "campaigns";
    const LABEL: &'static str = "Campaign";

    fn id(&self) -> Uuid {
        self.id
    }

    fn title(&self) -> String {
        self.name.clone()
    }
}
