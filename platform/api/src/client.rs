use std::time::Duration;

use entity::{KanbanRecord, Resource};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::{ApiError, ApiResult, BulkImportApi, KanbanApi, ResourceApi};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub base_url: Url,
    pub token: Option<String>,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> ApiResult<Self> {
        let base_url =
            Url::parse(base_url.trim()).map_err(|err| ApiError::InvalidUrl(err.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(format!(
                "{base_url} cannot carry path segments"
            )));
        }
        Ok(Self {
            base_url,
            token: None,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Cheap to clone; all clones share one connection pool.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        Ok(Self {
            http,
            base_url: config.base_url,
            token: config.token,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn resource<R: Resource>(&self) -> ResourceApi<R> {
        ResourceApi::new(self.clone())
    }

    pub fn kanban<R: KanbanRecord>(&self) -> KanbanApi<R> {
        KanbanApi::new(self.clone())
    }

    pub fn bulk(&self) -> BulkImportApi {
        BulkImportApi::new(self.clone())
    }

    /// Append path segments to the base URL, keeping any base path prefix.
    pub(crate) fn url(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub(crate) fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!(%method, %url, "crm api request");
        let builder = self.http.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    pub(crate) async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ApiResult<T> {
        let response = checked(builder.send().await?).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|err| ApiError::Decode(err.to_string()))
    }

    pub(crate) async fn send_empty(&self, builder: RequestBuilder) -> ApiResult<()> {
        checked(builder.send().await?).await?;
        Ok(())
    }

    pub(crate) async fn send_text(&self, builder: RequestBuilder) -> ApiResult<String> {
        let response = checked(builder.send().await?).await?;
        Ok(response.text().await?)
    }
}

async fn checked(response: Response) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    debug!(status = status.as_u16(), "crm api returned error status");
    Err(ApiError::from_status(status.as_u16(), &body))
}
