//! Gateway error types.
//!
//! [`GatewayError`] is the central error type for the gateway. The WebSocket
//! protocol carries no error frames, so errors never reach the client; each
//! variant instead carries a numeric code that is attached to log lines.
//!
//! [`StoreError`] covers failures of the telemetry store client and is
//! wrapped by [`GatewayError::Store`] when it crosses into the translator.

/// Failure raised by a [`crate::store::TelemetryStore`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Transport-level failure talking to the store (connect, TLS, body read).
    #[error("store request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered with a non-success HTTP status.
    #[error("store returned {status}: {body}")]
    Status {
        /// HTTP status code returned by the store.
        status: u16,
        /// Response body, usually a JSON error document.
        body: String,
    },

    /// The store accepted the request but reported a query failure in-band.
    #[error("store rejected query: {0}")]
    Query(String),

    /// The store response could not be parsed as annotated CSV.
    #[error("malformed store response: {0}")]
    Csv(String),

    /// The query uses a feature this store implementation cannot evaluate.
    #[error("unsupported query: {0}")]
    Unsupported(String),
}

/// Server-side error enum.
///
/// # Error Code Ranges
///
/// | Range     | Category      |
/// |-----------|---------------|
/// | 1000–1999 | Client input  |
/// | 3000–3999 | Store         |
/// | 5000–5999 | Startup       |
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The client message is not a well-formed request object.
    #[error("malformed request: {0}")]
    Decode(#[from] serde_json::Error),

    /// The request decoded but its parameters are not valid query literals.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The telemetry store failed to answer the query.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The store did not answer within the configured bound.
    #[error("store query timed out after {millis} ms")]
    Timeout {
        /// Configured timeout in milliseconds.
        millis: u64,
    },

    /// Invalid or missing startup configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl GatewayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::Decode(_) => 1000,
            Self::InvalidRequest(_) => 1001,
            Self::Store(StoreError::Http(_)) => 3001,
            Self::Store(StoreError::Status { .. }) => 3002,
            Self::Store(StoreError::Query(_)) => 3003,
            Self::Store(StoreError::Csv(_)) => 3004,
            Self::Store(StoreError::Unsupported(_)) => 3005,
            Self::Timeout { .. } => 3006,
            Self::Config(_) => 5000,
        }
    }

    /// Returns `true` if the error was caused by the client's message
    /// rather than by the store.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::Decode(_) | Self::InvalidRequest(_))
    }
}
