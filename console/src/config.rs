use std::time::Duration;

use anyhow::{Context, Result};
use platform_api::{ApiClient, ClientConfig, DEFAULT_PAGE_SIZE, DEFAULT_TIMEOUT};

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub api_url: String,
    pub token: Option<String>,
    pub page_size: u32,
    pub timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            page_size: DEFAULT_PAGE_SIZE,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl AppConfig {
    /// Read `CRM_*` variables. Call after `.env` has been loaded.
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let api_url = lookup("CRM_API_URL")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.api_url);
        let token = lookup("CRM_API_TOKEN").filter(|v| !v.trim().is_empty());
        let page_size = match lookup("CRM_PAGE_SIZE") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .context("CRM_PAGE_SIZE must be a positive integer")?,
            None => defaults.page_size,
        };
        let timeout = match lookup("CRM_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(
                raw.trim()
                    .parse::<u64>()
                    .context("CRM_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            None => defaults.timeout,
        };
        Ok(Self {
            api_url,
            token,
            page_size: clamp_page_size(page_size),
            timeout,
        })
    }

    /// Flags given on the command line take precedence over the environment.
    pub fn with_overrides(
        mut self,
        api_url: Option<String>,
        token: Option<String>,
        page_size: Option<u32>,
    ) -> Self {
        if let Some(url) = api_url {
            self.api_url = url;
        }
        if token.is_some() {
            self.token = token;
        }
        if let Some(size) = page_size {
            self.page_size = clamp_page_size(size);
        }
        self
    }

    pub fn client(&self) -> Result<ApiClient> {
        let config = ClientConfig::new(&self.api_url)
            .with_context(|| format!("invalid api url {}", self.api_url))?
            .with_token(self.token.clone())
            .with_timeout(self.timeout);
        ApiClient::new(config).context("failed to build http client")
    }
}

pub fn clamp_page_size(size: u32) -> u32 {
    size.clamp(1, MAX_PAGE_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn env_values_are_parsed_and_clamped() {
        let config = AppConfig::from_lookup(lookup(&[
            ("CRM_API_URL", " https://crm.example.com/api "),
            ("CRM_API_TOKEN", "  "),
            ("CRM_PAGE_SIZE", "500"),
            ("CRM_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();
        assert_eq!(config.api_url, "https://crm.example.com/api");
        assert_eq!(config.token, None);
        assert_eq!(config.page_size, MAX_PAGE_SIZE);
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn bad_numbers_are_reported() {
        let err = AppConfig::from_lookup(lookup(&[("CRM_PAGE_SIZE", "lots")])).unwrap_err();
        assert!(err.to_string().contains("CRM_PAGE_SIZE"));
    }

    #[test]
    fn flags_override_env() {
        let config = AppConfig::default().with_overrides(
            Some("http://127.0.0.1:9000".into()),
            Some("secret".into()),
            Some(0),
        );
        assert_eq!(config.api_url, "http://127.0.0.1:9000");
        assert_eq!(config.token.as_deref(), Some("secret"));
        assert_eq!(config.page_size, 1);
    }
}
