//! CRM records mirrored from the backend schema.
//!
//! Records carry no invariants of their own; the backend owns lifecycle and
//! business rules. Each module exposes a `Model` (what the API returns) and a
//! `Draft` (what create and update send).

use std::{fmt::Debug, hash::Hash};

use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use uuid::Uuid;

/// Declares a closed, string-keyed enum with serde, `Display` and `FromStr`.
macro_rules! choice {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($variant:ident => $value:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $(#[serde(rename = $value)] $variant,)+
        }

        impl $crate::Choice for $name {
            const ALL: &'static [Self] = &[$(Self::$variant),+];

            fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $value,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str($crate::Choice::as_str(*self))
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::UnknownChoice;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                <Self as $crate::Choice>::parse(value).ok_or_else(|| $crate::UnknownChoice {
                    kind: stringify!($name),
                    value: value.to_string(),
                })
            }
        }
    };
}

pub mod account;
pub mod calendar_event;
pub mod campaign;
pub mod carepack;
pub mod contact;
pub mod deal;
pub mod email;
pub mod email_template;
pub mod lead;
mod pagination;
pub mod partner;
pub mod product;
pub mod task;
pub mod ticket;
pub mod user;

pub use pagination::PaginatedResponse;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown {kind} value `{value}`")]
pub struct UnknownChoice {
    pub kind: &'static str,
    pub value: String,
}

/// A closed set of string keys (statuses, stages, priorities).
pub trait Choice: Copy + Eq + Hash + Debug + Send + Sync + 'static {
    const ALL: &'static [Self];

    fn as_str(self) -> &'static str;

    fn parse(value: &str) -> Option<Self> {
        let needle = value.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|choice| choice.as_str().eq_ignore_ascii_case(needle))
    }
}

/// A record type addressable under a REST collection.
pub trait Resource: Serialize + DeserializeOwned + Clone + Debug + Send + Sync + 'static {
    type Draft: Serialize + DeserializeOwned + Clone + Debug + Send + Sync + 'static;

    /// Collection path segment, e.g. `accounts`.
    const PATH: &'static str;
    /// Human label used in banners and toasts.
    const LABEL: &'static str;

    fn id(&self) -> Uuid;

    /// Short display title for tables and cards.
    fn title(&self) -> String;
}

/// A record that can be grouped into kanban columns by a status field.
pub trait KanbanRecord: Resource {
    type Status: Choice + Serialize + DeserializeOwned;

    fn status(&self) -> Self::Status;

    fn set_status(&mut self, status: Self::Status);

    /// Monetary value summed into column totals, when the record has one.
    fn amount_cents(&self) -> Option<i64> {
        None
    }
}
