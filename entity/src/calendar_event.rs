use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Resource;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub kind: Kind,
    #[serde(default)]
    pub attendees: Vec<String>,
    #[serde(default)]
    pub account_id: Option<Uuid>,
    #[serde(default)]
    pub deal_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    #[serde(default)]
    pub kind: Kind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attendees: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deal_id: Option<Uuid>,
}

impl From<&Model> for Draft {
    fn from(model: &Model) -> Self {
        Self {
            title: model.title.clone(),
            description: model.description.clone(),
            location: model.location.clone(),
            starts_at: model.starts_at,
            ends_at: model.ends_at,
            kind: model.kind,
            attendees: model.attendees.clone(),
            account_id: model.account_id,
            deal_id: model.deal_id,
        }
    }
}

choice! {
    pub enum Kind {
        Meeting => "meeting",
        Call => "call",
        Reminder => "reminder",
        Other => "other",
    }
}

impl Default for Kind {
    fn default() -> Self {
        Self::Meeting
    }
}

impl Resource for Model {
    type Draft = Draft;
    const PATH: &'static str = "calendar-events";
    const LABEL: &'static str = "Event";

    fn id(&self) -> Uuid {
        self.id
    }

    fn title(&self) -> String {
        self.title.clone()
    }
}
