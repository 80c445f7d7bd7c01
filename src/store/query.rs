//! Windowed aggregation query and its Flux rendering.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::domain::FluxDuration;

/// One end of a `range()` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeBound {
    /// Offset from the store's notion of now, e.g. `-1h`.
    Relative(FluxDuration),
    /// Absolute instant, rendered as `time(v: "...")`.
    Absolute(DateTime<Utc>),
}

impl fmt::Display for RangeBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Relative(d) => write!(f, "{d}"),
            Self::Absolute(t) => write!(
                f,
                "time(v: \"{}\")",
                t.to_rfc3339_opts(SecondsFormat::AutoSi, true)
            ),
        }
    }
}

/// Mean-per-window aggregation over the allow-listed fields of one
/// measurement.
///
/// Empty windows are never emitted (`createEmpty: false`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowQuery {
    /// Bucket to read from.
    pub bucket: String,
    /// Measurement written by the ingestion pipeline.
    pub measurement: String,
    /// Inclusive start of the range.
    pub start: RangeBound,
    /// Exclusive end of the range; `None` means now.
    pub stop: Option<RangeBound>,
    /// Window width.
    pub every: FluxDuration,
    /// Fields to keep.
    pub fields: Vec<String>,
}

impl WindowQuery {
    /// Renders the query as a Flux script.
    #[must_use]
    pub fn to_flux(&self) -> String {
        let range = match &self.stop {
            Some(stop) => format!("start: {}, stop: {stop}", self.start),
            None => format!("start: {}", self.start),
        };
        let fields = self
            .fields
            .iter()
            .map(|f| flux_string(f))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "from(bucket: {bucket})\n  \
             |> range({range})\n  \
             |> filter(fn: (r) => r[\"_measurement\"] == {measurement})\n  \
             |> filter(fn: (r) => contains(value: r[\"_field\"], set: [{fields}]))\n  \
             |> aggregateWindow(every: {every}, fn: mean, createEmpty: false)\n  \
             |> yield(name: \"mean\")\n",
            bucket = flux_string(&self.bucket),
            measurement = flux_string(&self.measurement),
            every = self.every,
        )
    }
}

/// Quotes `s` as a Flux string literal, escaping interpolation too.
fn flux_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '$' if chars.peek() == Some(&'{') => out.push_str("\\$"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
