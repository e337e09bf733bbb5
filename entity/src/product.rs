use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Resource;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub sku: Option<String>,
    pub price_cents: i64,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    pub price_cents: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl Default for Draft {
    fn default() -> Self {
        Self {
            name: String::new(),
            sku: None,
            price_cents: 0,
            currency: None,
            active: true,
        }
    }
}

fn default_active() -> bool {
    true
}

impl Resource for Model {
    type Draft = Draft;
    const PATH: &'static str = "products";
    const LABEL: &'static str = "Product";

    fn id(&self) -> Uuid {
        self.id
    }

    fn title(&self) -> String {
        match &self.sku {
            Some(sku) => format!("{} ({})", self.name, sku),
            None => self.name.clone(),
        }
    }
}
