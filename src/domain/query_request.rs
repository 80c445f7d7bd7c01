//! Client query descriptors.
//!
//! A client message is either a relative window (`range` back from now) or
//! an explicit `custom` window with start and end timestamps, each with an
//! aggregation `step`. The wire form has only optional keys; [`QueryRequest`]
//! is the validated, tagged form the translator works with.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde::de::Error as _;
use serde_json::{Map, Value};

use super::FluxDuration;
use crate::error::GatewayError;

/// Window width used when the client omits `step`.
pub const DEFAULT_STEP: &str = "30s";

/// Relative range used when the client sends neither `range` nor `custom`.
pub const DEFAULT_RANGE: &str = "-1h";

/// Explicit window bounds as sent by the client.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomRangeDto {
    /// Inclusive window start (RFC 3339).
    #[serde(default)]
    pub start: Option<String>,
    /// Exclusive window end (RFC 3339).
    #[serde(default)]
    pub end: Option<String>,
}

/// Client message exactly as received: every key is optional.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequestDto {
    /// Relative range such as `"-1h"`.
    #[serde(default)]
    pub range: Option<String>,
    /// Aggregation window width such as `"30s"`.
    #[serde(default)]
    pub step: Option<String>,
    /// Explicit bounds; wins over `range` when present.
    #[serde(default)]
    pub custom: Option<CustomRangeDto>,
}

/// A validated query request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryRequest {
    /// Window ending now and starting `range` ago.
    Relative {
        /// Negative offset from now.
        range: FluxDuration,
        /// Aggregation window width.
        step: FluxDuration,
    },
    /// Window with explicit bounds.
    Custom {
        /// Inclusive start.
        start: DateTime<Utc>,
        /// Exclusive end.
        end: DateTime<Utc>,
        /// Aggregation window width.
        step: FluxDuration,
    },
}

impl QueryRequest {
    /// Decodes and validates a raw client message.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Decode`] if the message is not a JSON object
    /// of the expected shape, and [`GatewayError::InvalidRequest`] if a
    /// duration or timestamp is not a valid literal.
    pub fn decode(raw: &[u8]) -> Result<Self, GatewayError> {
        // Derived struct impls also accept sequences; only objects are requests.
        let object: Map<String, Value> = serde_json::from_slice(raw)?;
        if object
            .get("custom")
            .is_some_and(|c| !c.is_object() && !c.is_null())
        {
            return Err(GatewayError::Decode(serde_json::Error::custom(
                "custom must be an object",
            )));
        }
        let dto: QueryRequestDto = serde_json::from_value(Value::Object(object))?;
        Self::try_from(dto)
    }

    /// Returns the aggregation window width.
    #[must_use]
    pub const fn step(&self) -> &FluxDuration {
        match self {
            Self::Relative { step, .. } | Self::Custom { step, .. } => step,
        }
    }
}

impl TryFrom<QueryRequestDto> for QueryRequest {
    type Error = GatewayError;

    fn try_from(dto: QueryRequestDto) -> Result<Self, Self::Error> {
        let step: FluxDuration = dto.step.as_deref().unwrap_or(DEFAULT_STEP).parse()?;
        if step.is_negative() || step.is_zero() {
            return Err(GatewayError::InvalidRequest(format!(
                "step must be a positive duration, got {step}"
            )));
        }

        if let Some(custom) = dto.custom {
            let start = parse_timestamp("custom.start", custom.start.as_deref())?;
            let end = parse_timestamp("custom.end", custom.end.as_deref())?;
            if start >= end {
                return Err(GatewayError::InvalidRequest(format!(
                    "custom.start ({start}) must be before custom.end ({end})"
                )));
            }
            return Ok(Self::Custom { start, end, step });
        }

        let range: FluxDuration = dto.range.as_deref().unwrap_or(DEFAULT_RANGE).parse()?;
        if !range.is_negative() || range.is_zero() {
            return Err(GatewayError::InvalidRequest(format!(
                "range must be a negative duration, got {range}"
            )));
        }
        Ok(Self::Relative { range, step })
    }
}

fn parse_timestamp(key: &str, value: Option<&str>) -> Result<DateTime<Utc>, GatewayError> {
    let value = value.ok_or_else(|| GatewayError::InvalidRequest(format!("missing {key}")))?;
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| GatewayError::InvalidRequest(format!("invalid {key} {value:?}: {e}")))
}
