use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Resource;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub id: Uuid,
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    pub role: Role,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl Default for Draft {
    fn default() -> Self {
        Self {
            email: String::new(),
            display_name: None,
            role: Role::default(),
            is_active: true,
        }
    }
}

fn default_active() -> bool {
    true
}

choice! {
    pub enum Role {
        Owner => "owner",
        Admin => "admin",
        Sales => "sales",
        Viewer => "viewer",
    }
}

impl Default for Role {
    fn default() -> Self {
        Self::Sales
    }
}

impl Resource for Model {
    type Draft = Draft;
    const PATH: &'static str = "users";
    const LABEL: &'static str = "User";

    fn id(&self) -> Uuid {
        self.id
    }

    fn title(&self) -> String {
        self.display_name
            .clone()
            .unwrap_or_else(|| self.email.clone())
    }
}
