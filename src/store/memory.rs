//! In-memory telemetry store.
//!
//! Evaluates a [`WindowQuery`] over raw samples with the same semantics as
//! Flux's `range |> filter |> aggregateWindow(fn: mean, createEmpty: false)`:
//!
//! - the range is half-open, `[start, stop)`;
//! - windows are aligned to the Unix epoch in multiples of `every`;
//! - each output row is stamped with its window's stop, clamped to the
//!   range stop;
//! - windows without samples produce no row;
//! - one table per field, fields in ascending order, rows ascending by time.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use super::{FluxRecord, FluxTable, RangeBound, TelemetryStore, WindowQuery};
use crate::error::StoreError;

/// A raw reading as written by the ingestion pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Measurement name.
    pub measurement: String,
    /// Field name.
    pub field: String,
    /// Sample timestamp.
    pub time: DateTime<Utc>,
    /// Sample value.
    pub value: f64,
}

/// Store backed by a fixed list of samples.
///
/// The clock is frozen at construction when built with [`MemoryStore::at`];
/// otherwise relative ranges resolve against the wall clock.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    samples: Vec<Sample>,
    now: Option<DateTime<Utc>>,
}

impl MemoryStore {
    /// Creates an empty store using the wall clock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store whose "now" is fixed at `now`.
    #[must_use]
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            samples: Vec::new(),
            now: Some(now),
        }
    }

    /// Adds one sample.
    #[must_use]
    pub fn with_sample(
        mut self,
        measurement: &str,
        field: &str,
        time: DateTime<Utc>,
        value: f64,
    ) -> Self {
        self.samples.push(Sample {
            measurement: measurement.to_string(),
            field: field.to_string(),
            time,
            value,
        });
        self
    }

    /// Returns the number of stored samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns `true` if no samples are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    fn now(&self) -> DateTime<Utc> {
        self.now.unwrap_or_else(Utc::now)
    }

    fn resolve(&self, bound: &RangeBound) -> Result<i64, StoreError> {
        let time = match bound {
            RangeBound::Absolute(t) => *t,
            RangeBound::Relative(d) => {
                let delta = d.to_time_delta().ok_or_else(|| {
                    StoreError::Unsupported(format!("calendar or oversized duration {d}"))
                })?;
                self.now()
                    .checked_add_signed(delta)
                    .ok_or_else(|| StoreError::Unsupported(format!("range {d} out of bounds")))?
            }
        };
        time.timestamp_nanos_opt()
            .ok_or_else(|| StoreError::Unsupported(format!("time {time} out of bounds")))
    }
}

impl Extend<Sample> for MemoryStore {
    fn extend<T: IntoIterator<Item = Sample>>(&mut self, iter: T) {
        self.samples.extend(iter);
    }
}

#[async_trait]
impl TelemetryStore for MemoryStore {
    async fn query(&self, query: &WindowQuery) -> Result<Vec<FluxTable>, StoreError> {
        let start = self.resolve(&query.start)?;
        let stop = match &query.stop {
            Some(bound) => self.resolve(bound)?,
            None => self.resolve(&RangeBound::Absolute(self.now()))?,
        };
        let every = query
            .every
            .to_time_delta()
            .and_then(|d| d.num_nanoseconds())
            .filter(|ns| *ns > 0)
            .ok_or_else(|| StoreError::Unsupported(format!("window width {}", query.every)))?;

        // field -> window index -> (sum, count)
        let mut windows: BTreeMap<&str, BTreeMap<i64, (f64, u64)>> = BTreeMap::new();
        for sample in &self.samples {
            if sample.measurement != query.measurement
                || !query.fields.iter().any(|f| *f == sample.field)
            {
                continue;
            }
            let Some(t) = sample.time.timestamp_nanos_opt() else {
                continue;
            };
            if t < start || t >= stop {
                continue;
            }
            let slot = windows
                .entry(sample.field.as_str())
                .or_default()
                .entry(t.div_euclid(every))
                .or_insert((0.0, 0));
            slot.0 += sample.value;
            slot.1 += 1;
        }

        let mut tables = Vec::with_capacity(windows.len());
        for (id, (field, buckets)) in (0u64..).zip(windows) {
            let records = buckets
                .into_iter()
                .map(|(index, (sum, count))| {
                    let window_stop = index.saturating_add(1).saturating_mul(every).min(stop);
                    FluxRecord {
                        time: Utc.timestamp_nanos(window_stop),
                        field: field.to_string(),
                        measurement: query.measurement.clone(),
                        value: sum / count as f64,
                    }
                })
                .collect();
            tables.push(FluxTable { id, records });
        }
        Ok(tables)
    }
}
