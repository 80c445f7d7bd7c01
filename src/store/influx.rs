//! InfluxDB 2.x store client.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Url};

use super::{FluxTable, TelemetryStore, WindowQuery, annotated_csv};
use crate::config::StoreConfig;
use crate::error::{GatewayError, StoreError};

/// HTTP client for InfluxDB's Flux query endpoint.
///
/// Holds one pooled [`reqwest::Client`]; clones share the pool.
#[derive(Clone)]
pub struct InfluxStore {
    client: Client,
    query_url: Url,
    auth_header: String,
}

impl std::fmt::Debug for InfluxStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InfluxStore")
            .field("query_url", &self.query_url.as_str())
            .finish_non_exhaustive()
    }
}

impl InfluxStore {
    /// Creates a client for `{url}/api/v2/query?org={org}`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Config`] if the URL is invalid or the HTTP
    /// client cannot be built.
    pub fn new(config: &StoreConfig) -> Result<Self, GatewayError> {
        let query_url = query_url(&config.url, &config.org)?;
        let client = Client::builder()
            .pool_max_idle_per_host(config.pool_max_idle)
            .build()
            .map_err(|e| GatewayError::Config(format!("store http client: {e}")))?;

        Ok(Self {
            client,
            query_url,
            auth_header: format!("Token {}", config.token),
        })
    }

    /// Returns the fully resolved query endpoint.
    #[must_use]
    pub fn query_url(&self) -> &Url {
        &self.query_url
    }
}

#[async_trait]
impl TelemetryStore for InfluxStore {
    async fn query(&self, query: &WindowQuery) -> Result<Vec<FluxTable>, StoreError> {
        let flux = query.to_flux();
        tracing::trace!(%flux, "sending flux query");

        let response = self
            .client
            .post(self.query_url.clone())
            .header(AUTHORIZATION, &self.auth_header)
            .header(CONTENT_TYPE, "application/vnd.flux")
            .header(ACCEPT, "application/csv")
            .body(flux)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(StoreError::Status {
                status: status.as_u16(),
                body: error_message(&body),
            });
        }

        annotated_csv::parse(&body)
    }
}

fn query_url(base: &str, org: &str) -> Result<Url, GatewayError> {
    let mut base = Url::parse(base).map_err(|e| GatewayError::Config(format!("INFLUX_URL: {e}")))?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    let mut url = base
        .join("api/v2/query")
        .map_err(|e| GatewayError::Config(format!("INFLUX_URL: {e}")))?;
    url.query_pairs_mut().append_pair("org", org);
    Ok(url)
}

/// Extracts `message` from an InfluxDB JSON error body, falling back to
/// the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}
