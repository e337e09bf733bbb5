use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{KanbanRecord, Resource};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub status: Status,
    pub priority: Priority,
    #[serde(default)]
    pub due_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub assigned_user_id: Option<Uuid>,
    #[serde(default)]
    pub account_id: Option<Uuid>,
    #[serde(default)]
    pub deal_id: Option<Uuid>,
    #[serde(default)]
    pub lead_id: Option<Uuid>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status.is_open() && self.due_at.is_some_and(|due| due < now)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_user_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deal_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_id: Option<Uuid>,
}

impl From<&Model> for Draft {
    fn from(model: &Model) -> Self {
        Self {
            title: model.title.clone(),
            notes: model.notes.clone(),
            status: model.status,
            priority: model.priority,
            due_at: model.due_at,
            assigned_user_id: model.assigned_user_id,
            account_id: model.account_id,
            deal_id: model.deal_id,
            lead_id: model.lead_id,
        }
    }
}

choice! {
    pub enum Status {
        Open => "open",
        InProgress => "in_progress",
        Done => "done",
        Cancelled => "cancelled",
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::Open
    }
}

impl Status {
    pub fn is_open(self) -> bool {
        matches!(self, Status::Open | Status::InProgress)
    }
}

choice! {
    pub enum Priority {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::Medium
    }
}

impl Resource for Model {
    type Draft = Draft;
    const PATH: &'static str = "tasks";
    const LABEL: &'static str = "Task";

    fn id(&self) -> Uuid {
        self.id
    }

    fn title(&self) -> String {
        self.title.clone()
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
}
