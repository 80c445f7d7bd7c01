//! telemetry-gateway server entry point.
//!
//! Starts the Axum server with the WebSocket query endpoint and the system
//! HTTP routes.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use telemetry_gateway::app_state::AppState;
use telemetry_gateway::config::GatewayConfig;
use telemetry_gateway::server::{build_app, shutdown_signal};
use telemetry_gateway::service::QueryTranslator;
use telemetry_gateway::store::InfluxStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing (LOG_FORMAT=json for structured output)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    // Load configuration
    let config = GatewayConfig::from_env()?;
    tracing::info!(
        addr = %config.listen_addr,
        store = %config.store.url,
        bucket = %config.store.bucket,
        fields = config.fields.len(),
        "starting telemetry-gateway"
    );

    // Build store and service layer
    let store = Arc::new(InfluxStore::new(&config.store)?);
    let translator = Arc::new(QueryTranslator::from_config(store, &config));

    // Build router
    let app = build_app(AppState { translator });

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
