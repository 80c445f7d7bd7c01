//! System endpoints: health check and field catalog.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::app_state::AppState;

/// Health check response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Always `"healthy"` while the process serves requests.
    pub status: String,
    /// Server time (RFC 3339).
    pub timestamp: String,
    /// Crate version.
    pub version: String,
}

/// Allow-listed sensor fields.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FieldsResponse {
    /// Field names in configuration order.
    pub fields: Vec<String>,
}

/// `GET /health` — Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, and current timestamp.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// `GET /config/fields` — List the sensor fields returned over WebSocket.
#[utoipa::path(
    get,
    path = "/config/fields",
    tag = "System",
    summary = "List sensor fields",
    description = "Returns the allow-list of sensor fields the gateway aggregates.",
    responses(
        (status = 200, description = "Field allow-list", body = FieldsResponse),
    )
)]
pub async fn fields_handler(State(state): State<AppState>) -> impl IntoResponse {
    let fields = state.translator.fields().as_slice().to_vec();
    (StatusCode::OK, Json(FieldsResponse { fields }))
}

/// System routes mounted at the root level.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/config/fields", get(fields_handler))
}
