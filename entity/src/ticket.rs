use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Resource, task::Priority};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub id: Uuid,
    pub subject: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: Status,
    pub priority: Priority,
    #[serde(default)]
    pub account_id: Option<Uuid>,
    #[serde(default)]
    pub carepack_id: Option<Uuid>,
    #[serde(default)]
    pub assigned_user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carepack_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_user_id: Option<Uuid>,
}

choice! {
    pub enum Status {
        Open => "open",
        Pending => "pending",
        Resolved => "resolved",
        Closed => "closed",
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::Open
    }
}

impl Resource for Model {
    type Draft = Draft;
    const PATH: &'static str = "tickets";
    const LABEL: &'static str = "Ticket";

    fn id(&self) -> Uuid {
        self.id
    }

    fn title(&self) -> String {
        self.subject.clone()
    }
}
