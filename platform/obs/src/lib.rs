//! Tracing installation for the console binary.
//!
//! Logs go to stderr so that tables and CSV written to stdout stay
//! machine-readable.

use anyhow::{Result, anyhow};
use once_cell::sync::OnceCell;
use opentelemetry::trace::TracerProvider;
use opentelemetry_otlp::{Protocol, SpanExporter, WithExportConfig};
use opentelemetry_sdk::{Resource, trace::SdkTracerProvider};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static PROVIDER: OnceCell<Option<SdkTracerProvider>> = OnceCell::new();

const DEFAULT_FILTER: &str = "warn,crm_console=info,products_crm=info,platform_api=info";

#[derive(Clone, Debug)]
pub struct ObsConfig {
    pub service_name: String,
    pub env_filter: Option<String>,
    pub otlp_endpoint: Option<String>,
    /// Raise the default filter to `debug` for our crates.
    pub verbose: bool,
}

impl Default for ObsConfig {
    fn default() -> Self {
        Self {
            service_name: "crm-console".to_string(),
            env_filter: None,
            otlp_endpoint: None,
            verbose: false,
        }
    }
}

impl ObsConfig {
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn filter(&self) -> String {
        if let Some(filter) = self.env_filter.clone() {
            return filter;
        }
        if let Ok(filter) = std::env::var("RUST_LOG") {
            return filter;
        }
        if self.verbose {
            DEFAULT_FILTER.replace("=info", "=debug")
        } else {
            DEFAULT_FILTER.to_string()
        }
    }
}

/// Install the global subscriber. Repeated calls are no-ops.
pub fn init_tracing(config: ObsConfig) -> Result<()> {
    PROVIDER
        .get_or_try_init(|| install(&config))
        .map(|_| ())
}

/// Flush pending spans before the process exits.
pub fn shutdown_tracing() {
    if let Some(Some(provider)) = PROVIDER.get() {
        if let Err(err) = provider.shutdown() {
            eprintln!("failed to flush traces: {err}");
        }
    }
}

fn install(config: &ObsConfig) -> Result<Option<SdkTracerProvider>> {
    let env_filter = EnvFilter::try_new(config.filter())?;
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);
    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer);

    let endpoint = config
        .otlp_endpoint
        .clone()
        .or_else(|| std::env::var("OTLP_ENDPOINT").ok())
        .filter(|e| !e.trim().is_empty());

    let Some(endpoint) = endpoint else {
        registry
            .try_init()
            .map_err(|err| anyhow!("tracing already initialized: {err}"))?;
        return Ok(None);
    };

    let exporter = SpanExporter::builder()
        .with_http()
        .with_protocol(Protocol::HttpBinary)
        .with_endpoint(endpoint)
        .build()?;
    let resource = Resource::builder()
        .with_service_name(config.service_name.clone())
        .build();
    let provider = SdkTracerProvider::builder()
        .with_resource(resource)
        .with_batch_exporter(exporter)
        .build();
    let tracer = provider.tracer(config.service_name.clone());
    registry
        .with(tracing_opentelemetry::layer().with_tracer(tracer))
        .try_init()
        .map_err(|err| anyhow!("tracing already initialized: {err}"))?;
    Ok(Some(provider))
}
