//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::service::QueryTranslator;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Translator shared by every WebSocket connection.
    pub translator: Arc<QueryTranslator>,
}
