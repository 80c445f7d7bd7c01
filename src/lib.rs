//! # telemetry-gateway
//!
//! WebSocket query gateway for sensor telemetry stored in InfluxDB.
//!
//! Clients hold a WebSocket open and send query descriptors (a relative
//! range or explicit start/end bounds, plus an aggregation step). Each
//! request is translated into a Flux `aggregateWindow` mean query over a
//! fixed allow-list of sensor fields, and the result is streamed back as a
//! flat list of `{time, field, value}` records.
//!
//! ## Architecture
//!
//! ```text
//! Clients (WebSocket)          Probes (HTTP)
//!     │                            │
//!     ├── WS Handler (ws/)         ├── System routes (api/)
//!     │
//!     ├── QueryTranslator (service/)
//!     │
//!     ├── TelemetryStore (store/)
//!     │
//!     └── InfluxDB (/api/v2/query)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod server;
pub mod service;
pub mod store;
pub mod ws;
