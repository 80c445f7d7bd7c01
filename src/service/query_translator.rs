//! Query translator: request → windowed store query → flat records.

use std::sync::Arc;
use std::time::Duration;

use crate::config::GatewayConfig;
use crate::domain::{FieldAllowList, FluxDuration, QueryRequest, Record};
use crate::error::GatewayError;
use crate::store::{RangeBound, TelemetryStore, WindowQuery};

/// Translates client requests into store queries and reshapes the result.
///
/// Stateless apart from read-only configuration; one instance is shared by
/// every connection. Every call follows the same path: resolve window →
/// build query → run against the store → flatten tables.
#[derive(Debug, Clone)]
pub struct QueryTranslator {
    store: Arc<dyn TelemetryStore>,
    bucket: String,
    measurement: String,
    fields: FieldAllowList,
    timeout: Option<Duration>,
}

impl QueryTranslator {
    /// Creates a translator with no store timeout.
    #[must_use]
    pub fn new(
        store: Arc<dyn TelemetryStore>,
        bucket: impl Into<String>,
        measurement: impl Into<String>,
        fields: FieldAllowList,
    ) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            measurement: measurement.into(),
            fields,
            timeout: None,
        }
    }

    /// Creates a translator from the startup configuration.
    #[must_use]
    pub fn from_config(store: Arc<dyn TelemetryStore>, config: &GatewayConfig) -> Self {
        let translator = Self::new(
            store,
            config.store.bucket.clone(),
            config.store.measurement.clone(),
            config.fields.clone(),
        );
        match config.query_timeout_secs {
            0 => translator,
            secs => translator.with_timeout(Duration::from_secs(secs)),
        }
    }

    /// Bounds every store call by `timeout`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns the field allow-list.
    #[must_use]
    pub fn fields(&self) -> &FieldAllowList {
        &self.fields
    }

    /// Maps a request to `range()` bounds.
    ///
    /// Custom windows use their literal timestamps. Relative windows start
    /// at the requested offset and leave the stop implicit (store-side now).
    #[must_use]
    pub fn resolve_window(request: &QueryRequest) -> (RangeBound, Option<RangeBound>) {
        match request {
            QueryRequest::Custom { start, end, .. } => (
                RangeBound::Absolute(*start),
                Some(RangeBound::Absolute(*end)),
            ),
            QueryRequest::Relative { range, .. } => (RangeBound::Relative(range.clone()), None),
        }
    }

    /// Builds the mean-per-window query over the allow-listed fields.
    #[must_use]
    pub fn build_query(
        &self,
        start: RangeBound,
        stop: Option<RangeBound>,
        step: &FluxDuration,
    ) -> WindowQuery {
        WindowQuery {
            bucket: self.bucket.clone(),
            measurement: self.measurement.clone(),
            start,
            stop,
            every: step.clone(),
            fields: self.fields.as_slice().to_vec(),
        }
    }

    /// Runs `query` and flattens the result tables in store order.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Store`] if the store fails and
    /// [`GatewayError::Timeout`] if it does not answer in time.
    pub async fn execute(&self, query: &WindowQuery) -> Result<Vec<Record>, GatewayError> {
        let tables = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.store.query(query))
                .await
                .map_err(|_| GatewayError::Timeout {
                    millis: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                })??,
            None => self.store.query(query).await?,
        };

        let records = tables
            .into_iter()
            .flat_map(|table| table.records)
            .filter(|r| {
                let allowed = self.fields.contains(&r.field);
                if !allowed {
                    tracing::debug!(field = %r.field, "dropping row outside allow-list");
                }
                allowed
            })
            .map(|r| Record {
                time: r.time,
                field: r.field,
                value: r.value,
            })
            .collect();
        Ok(records)
    }

    /// Resolves, builds and executes the query for one request.
    ///
    /// # Errors
    ///
    /// See [`QueryTranslator::execute`].
    pub async fn translate(&self, request: &QueryRequest) -> Result<Vec<Record>, GatewayError> {
        let (start, stop) = Self::resolve_window(request);
        let query = self.build_query(start, stop, request.step());
        self.execute(&query).await
    }
}
