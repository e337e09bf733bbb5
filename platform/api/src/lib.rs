//! REST access to the CRM backend.
//!
//! Every call returns [`ApiResult`]; callers surface the error's display
//! string as an inline banner and decide whether a failure is fatal.

mod bulk;
mod client;
mod kanban;
mod resource;

use serde::Deserialize;
use thiserror::Error;

pub use bulk::{BulkImportApi, ImportReport, RowError};
pub use client::{ApiClient, ClientConfig, DEFAULT_TIMEOUT};
pub use kanban::KanbanApi;
pub use resource::{DEFAULT_PAGE_SIZE, ListParams, ResourceApi};

/// Shared client result type.
pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("resource not found")]
    NotFound,
    #[error("bad request: {0}")]
    InvalidInput(String),
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error("invalid base url: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthorized => "UNAUTHORIZED",
            ApiError::NotFound => "NOT_FOUND",
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::Server { .. } => "SERVER",
            ApiError::Transport(_) => "TRANSPORT",
            ApiError::Decode(_) => "DECODE",
            ApiError::InvalidUrl(_) => "INVALID_URL",
        }
    }

    /// Map a non-success status and its body to an error.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = error_message(body);
        match status {
            401 | 403 => ApiError::Unauthorized,
            404 => ApiError::NotFound,
            400 | 409 | 422 => ApiError::InvalidInput(message),
            _ => ApiError::Server { status, message },
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            ApiError::Decode(value.to_string())
        } else {
            ApiError::Transport(value.to_string())
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

fn error_message(body: &str) -> String {
    let trimmed = body.trim();
    let Ok(parsed) = serde_json::from_str::<ErrorBody>(trimmed) else {
        return if trimmed.is_empty() {
            "no details".to_string()
        } else {
            trimmed.to_string()
        };
    };
    if let Some(detail) = parsed.detail {
        return detail_text(&detail);
    }
    parsed
        .message
        .or(parsed.error)
        .unwrap_or_else(|| "no details".to_string())
}

// `detail` is either a string or a list of `{ loc, msg }` validation entries.
fn detail_text(detail: &serde_json::Value) -> String {
    match detail {
        serde_json::Value::String(text) => text.clone(),
        serde_json::Value::Array(entries) => entries
            .iter()
            .map(|entry| {
                let msg = entry
                    .get("msg")
                    .and_then(|m| m.as_str())
                    .unwrap_or("invalid value");
                match entry.get("loc").and_then(|l| l.as_array()).and_then(|l| l.last()) {
                    Some(field) => format!("{}: {}", field.as_str().unwrap_or_default(), msg),
                    None => msg.to_string(),
                }
            })
            .collect::<Vec<_>>()
            .join("; "),
        other => other.to_string(),
    }
}
