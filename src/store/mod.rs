//! Telemetry store clients.
//!
//! The store is an external collaborator: the gateway only ever reads from
//! it. [`TelemetryStore`] is the seam between the query translator and a
//! concrete backend. [`InfluxStore`] talks to InfluxDB 2.x over HTTP;
//! [`MemoryStore`] evaluates the same windowed aggregation over samples held
//! in memory.

pub mod annotated_csv;
pub mod influx;
pub mod memory;
pub mod query;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use influx::InfluxStore;
pub use memory::MemoryStore;
pub use query::{RangeBound, WindowQuery};

use crate::error::StoreError;

/// One row of a store result table.
#[derive(Debug, Clone, PartialEq)]
pub struct FluxRecord {
    /// Window timestamp.
    pub time: DateTime<Utc>,
    /// Field name.
    pub field: String,
    /// Measurement the row was read from.
    pub measurement: String,
    /// Aggregated value.
    pub value: f64,
}

/// A result table: rows sharing one group key, in store order.
#[derive(Debug, Clone, PartialEq)]
pub struct FluxTable {
    /// Table index as reported by the store.
    pub id: u64,
    /// Rows, ascending by time.
    pub records: Vec<FluxRecord>,
}

/// Read access to a time-series store.
///
/// Implementations are shared by every connection and must tolerate
/// concurrent calls.
#[async_trait]
pub trait TelemetryStore: Send + Sync + std::fmt::Debug {
    /// Runs a windowed aggregation query and returns its result tables.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on transport failure, a rejected query, or
    /// an unreadable response.
    async fn query(&self, query: &WindowQuery) -> Result<Vec<FluxTable>, StoreError>;
}
