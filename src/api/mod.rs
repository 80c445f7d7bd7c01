//! HTTP API layer: system endpoints and the OpenAPI document.
//!
//! The query protocol itself is WebSocket-only (see [`crate::ws`]); the
//! HTTP routes exist for probes and discovery.

pub mod handlers;

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI description of the HTTP endpoints.
#[derive(Debug, OpenApi)]
#[openapi(
    info(title = "telemetry-gateway"),
    paths(handlers::system::health_handler, handlers::system::fields_handler),
    tags((name = "System", description = "Health and discovery endpoints"))
)]
pub struct ApiDoc;

/// Builds the HTTP router with system routes and `/api-docs/openapi.json`.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .merge(handlers::system::routes())
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
}
