use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Resource;

/// A service/support contract attached to an account, usually for one product
/// serial number.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub account_id: Option<Uuid>,
    #[serde(default)]
    pub product_id: Option<Uuid>,
    #[serde(default)]
    pub serial_number: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: Status,
    #[serde(default)]
    pub price_cents: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    /// Days from `today` until the end date; negative once expired.
    pub fn days_until_expiry(&self, today: NaiveDate) -> i64 {
        (self.end_date - today).num_days()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_cents: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

impl From<&Model> for Draft {
    fn from(model: &Model) -> Self {
        Self {
            name: model.name.clone(),
            account_id: model.account_id,
            product_id: model.product_id,
            serial_number: model.serial_number.clone(),
            start_date: model.start_date,
            end_date: model.end_date,
            status: model.status,
            price_cents: model.price_cents,
            currency: model.currency.clone(),
        }
    }
}

choice! {
    pub enum Status {
        Pending => "pending",
        Active => "active",
        Expired => "expired",
        Cancelled => "cancelled",
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::Pending
    }
}

impl Resource for Model {
    type Draft = Draft;
    const PATH: &'static str = "carepacks";
    const LABEL: &'static str = "Carepack";

    fn id(&self) -> Uuid {
        self.id
    }

    fn title(&self) -> String {
        match &self.serial_number {
            Some(serial) => format!("{} [{}]", self.name, serial),
            None => self.name.clone(),
        }
    }
}
