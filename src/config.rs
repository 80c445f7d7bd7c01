//! Gateway configuration loaded from environment variables.
//!
//! All settings come from environment variables (or a `.env` file via
//! `dotenvy`). Only `INFLUX_TOKEN` is required; everything else defaults to
//! the values the sensor stack ships with.

use std::fmt;
use std::net::SocketAddr;

use crate::domain::FieldAllowList;
use crate::error::GatewayError;

/// Connection settings for the InfluxDB store.
#[derive(Clone)]
pub struct StoreConfig {
    /// Base URL of the InfluxDB HTTP API (e.g. `http://influxdb:8086`).
    pub url: String,

    /// API token sent as `Authorization: Token ...`.
    pub token: String,

    /// Organization owning the bucket.
    pub org: String,

    /// Bucket holding sensor data.
    pub bucket: String,

    /// Measurement written by the ingestion pipeline.
    pub measurement: String,

    /// Maximum idle pooled HTTP connections kept open to the store.
    pub pool_max_idle: usize,
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("url", &self.url)
            .field("token", &"<redacted>")
            .field("org", &self.org)
            .field("bucket", &self.bucket)
            .field("measurement", &self.measurement)
            .field("pool_max_idle", &self.pool_max_idle)
            .finish()
    }
}

/// Top-level gateway configuration.
///
/// Loaded once at startup via [`GatewayConfig::from_env`] and never
/// mutated afterwards.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Socket address to bind the server to (e.g. `0.0.0.0:8765`).
    pub listen_addr: SocketAddr,

    /// Telemetry store settings.
    pub store: StoreConfig,

    /// Sensor fields the gateway aggregates.
    pub fields: FieldAllowList,

    /// Upper bound on a single store query in seconds (0 = unbounded).
    pub query_timeout_secs: u64,
}

impl GatewayConfig {
    /// Loads configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Config`] if `INFLUX_TOKEN` is missing,
    /// `LISTEN_ADDR` cannot be parsed, or `SENSOR_FIELDS` is empty.
    pub fn from_env() -> Result<Self, GatewayError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// See [`GatewayConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, GatewayError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen_addr: SocketAddr = lookup("LISTEN_ADDR")
            .unwrap_or_else(|| "0.0.0.0:8765".to_string())
            .parse()
            .map_err(|e| GatewayError::Config(format!("LISTEN_ADDR: {e}")))?;

        let token = lookup("INFLUX_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| GatewayError::Config("INFLUX_TOKEN is not set".to_string()))?;

        let store = StoreConfig {
            url: lookup("INFLUX_URL").unwrap_or_else(|| "http://influxdb:8086".to_string()),
            token,
            org: lookup("INFLUX_ORG").unwrap_or_else(|| "myorg".to_string()),
            bucket: lookup("INFLUX_BUCKET").unwrap_or_else(|| "sensors".to_string()),
            measurement: lookup("INFLUX_MEASUREMENT")
                .unwrap_or_else(|| "mqtt_consumer".to_string()),
            pool_max_idle: parse_or(&lookup, "STORE_POOL_MAX_IDLE", 16),
        };

        let fields = match lookup("SENSOR_FIELDS") {
            Some(list) => FieldAllowList::from_csv(&list)?,
            None => FieldAllowList::default(),
        };

        let query_timeout_secs = parse_or(&lookup, "STORE_QUERY_TIMEOUT_SECS", 30);

        Ok(Self {
            listen_addr,
            store,
            fields,
            query_timeout_secs,
        })
    }
}

/// Parses a variable as `T`, returning `default` on missing or invalid
/// values.
fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
