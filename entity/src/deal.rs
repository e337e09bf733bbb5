use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{KanbanRecord, Resource};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub account_id: Option<Uuid>,
    #[serde(default)]
    pub amount_cents: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    pub stage: Stage,
    #[serde(default)]
    pub close_date: Option<NaiveDate>,
    #[serde(default)]
    pub owner_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_cents: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default)]
    pub stage: Stage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<Uuid>,
}

impl From<&Model> for Draft {
    fn from(model: &Model) -> Self {
        Self {
            title: model.title.clone(),
            account_id: model.account_id,
            amount_cents: model.amount_cents,
            currency: model.currency.clone(),
            stage: model.stage,
            close_date: model.close_date,
            owner_id: model.owner_id,
        }
    }
}

choice! {
    pub enum Stage {
        New => "new",
        Qualify => "qualify",
        Proposal => "proposal",
        Negotiate => "negotiate",
        Won => "won",
        Lost => "lost",
    }
}

impl Default for Stage {
    fn default() -> Self {
        Self::New
    }
}

impl Stage {
    /// Default win probability in percent, used for weighted pipeline value.
    pub fn probability(self) -> u8 {
        match self {
            Stage::New => 10,
            Stage::Qualify => 25,
            Stage::Proposal => 50,
            Stage::Negotiate => 75,
            Stage::Won => 100,
            Stage::Lost => 0,
        }
    }

    pub fn is_closed(self) -> bool {
        matches!(self, Stage::Won | Stage::Lost)
    }
}

impl Resource for Model {
    type Draft = Draft;
    const PATH: &'static str = "deals";
    const LABEL: &'static str = "Deal";

    fn id(&self) -> Uuid {
        self.id
    }

    fn title(&self) -> String {
        self.title.clone()
    }
}

impl KanbanRecord for Model {
    type Status = Stage;

    fn status(&self) -> Stage {
        self.stage
    }

    fn set_status(&mut self, status: Stage) {
        self.stage = status;
    }

    fn amount_cents(&self) -> Option<i64> {
        self.amount_cents
    }
}
