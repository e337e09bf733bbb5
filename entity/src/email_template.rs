use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Resource;

/// Subject and body with `{{placeholder}}` variables.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub id: Uuid,
    pub name: String,
    pub subject: String,
    #[serde(default)]
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub name: String,
    pub subject: String,
    #[serde(default)]
    pub body: String,
}

impl From<&Model> for Draft {
    fn from(model: &Model) -> Self {
        Self {
            name: model.name.clone(),
            subject: model.subject.clone(),
            body: model.body.clone(),
        }
    }
}

impl Resource for Model {
    type Draft = Draft;
    const PATH: &'static str = "email-templates";
    const LABEL: &'static str = "Email template";

    fn id(&self) -> Uuid {
        self.id
    }

    fn title(&self) -> String {
        self.name.clone()
    }
}
