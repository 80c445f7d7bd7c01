//! Flat aggregated data points returned to clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One aggregated reading: the mean of `field` over the window ending at
/// `time`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Window timestamp (RFC 3339, UTC).
    pub time: DateTime<Utc>,
    /// Sensor field name, always a member of the allow-list.
    pub field: String,
    /// Aggregated value.
    pub value: f64,
}
