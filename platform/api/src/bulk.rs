use reqwest::{Method, header::CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{ApiClient, ApiResult};

/// Outcome of a CSV upload. Row numbers are 1-based and exclude the header.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub total_rows: u32,
    pub imported: u32,
    pub failed: u32,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub errors: Vec<RowError>,
}

impl ImportReport {
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.errors.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    pub row: u32,
    #[serde(default)]
    pub field: Option<String>,
    pub message: String,
}

#[derive(Clone, Debug)]
pub struct BulkImportApi {
    client: ApiClient,
}

impl BulkImportApi {
    pub(crate) fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Upload CSV text for `entity` (a collection path such as `accounts`).
    pub async fn import(&self, entity: &str, csv: String, dry_run: bool) -> ApiResult<ImportReport> {
        let url = self.client.url(&["bulk-import", entity])?;
        let builder = self
            .client
            .request(Method::POST, url)
            .query(&[("dry_run", dry_run.to_string())])
            .header(CONTENT_TYPE, "text/csv")
            .body(csv);
        let report: ImportReport = self.client.send_json(builder).await?;
        info!(
            entity,
            total = report.total_rows,
            imported = report.imported,
            failed = report.failed,
            dry_run,
            "bulk import finished"
        );
        Ok(report)
    }

    pub async fn export(&self, entity: &str) -> ApiResult<String> {
        let url = self.client.url(&["bulk-export", entity])?;
        self.client
            .send_text(self.client.request(Method::GET, url))
            .await
    }
}
