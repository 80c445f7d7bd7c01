//! Validated Flux duration literals.
//!
//! Client-supplied `range` and `step` values end up inside a Flux query, so
//! they are parsed into a [`FluxDuration`] first and re-rendered from the
//! parsed form. Anything that is not a plain duration literal is rejected
//! before it can reach the store.

use std::fmt;
use std::str::FromStr;

use chrono::TimeDelta;

use crate::error::GatewayError;

/// Unit suffix of one duration magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationUnit {
    /// `ns`
    Nanosecond,
    /// `us` or `µs`
    Microsecond,
    /// `ms`
    Millisecond,
    /// `s`
    Second,
    /// `m`
    Minute,
    /// `h`
    Hour,
    /// `d`
    Day,
    /// `w`
    Week,
    /// `mo` (calendar month)
    Month,
    /// `y` (calendar year)
    Year,
}

impl DurationUnit {
    fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "ns" => Self::Nanosecond,
            "us" | "µs" => Self::Microsecond,
            "ms" => Self::Millisecond,
            "s" => Self::Second,
            "m" => Self::Minute,
            "h" => Self::Hour,
            "d" => Self::Day,
            "w" => Self::Week,
            "mo" => Self::Month,
            "y" => Self::Year,
            _ => return None,
        })
    }

    /// Returns the canonical Flux suffix.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Nanosecond => "ns",
            Self::Microsecond => "us",
            Self::Millisecond => "ms",
            Self::Second => "s",
            Self::Minute => "m",
            Self::Hour => "h",
            Self::Day => "d",
            Self::Week => "w",
            Self::Month => "mo",
            Self::Year => "y",
        }
    }

    /// Returns `true` for units whose length depends on the calendar.
    #[must_use]
    pub const fn is_calendar(self) -> bool {
        matches!(self, Self::Month | Self::Year)
    }

    fn to_delta(self, magnitude: i64) -> Option<TimeDelta> {
        match self {
            Self::Nanosecond => Some(TimeDelta::nanoseconds(magnitude)),
            Self::Microsecond => Some(TimeDelta::microseconds(magnitude)),
            Self::Millisecond => TimeDelta::try_milliseconds(magnitude),
            Self::Second => TimeDelta::try_seconds(magnitude),
            Self::Minute => TimeDelta::try_minutes(magnitude),
            Self::Hour => TimeDelta::try_hours(magnitude),
            Self::Day => TimeDelta::try_days(magnitude),
            Self::Week => TimeDelta::try_weeks(magnitude),
            Self::Month | Self::Year => None,
        }
    }
}

/// A parsed Flux duration literal such as `30s`, `-1h` or `1h30m`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FluxDuration {
    negative: bool,
    parts: Vec<(u64, DurationUnit)>,
}

impl FluxDuration {
    /// Returns `true` if the literal carries a leading `-`.
    #[must_use]
    pub const fn is_negative(&self) -> bool {
        self.negative
    }

    /// Returns `true` if every magnitude is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.parts.iter().all(|(n, _)| *n == 0)
    }

    /// Returns `true` if any component uses a calendar unit (`mo`, `y`).
    #[must_use]
    pub fn has_calendar_units(&self) -> bool {
        self.parts.iter().any(|(_, unit)| unit.is_calendar())
    }

    /// Converts to a fixed-length [`TimeDelta`].
    ///
    /// Returns `None` for calendar units or on overflow.
    #[must_use]
    pub fn to_time_delta(&self) -> Option<TimeDelta> {
        let mut total = TimeDelta::zero();
        for (magnitude, unit) in &self.parts {
            let magnitude = i64::try_from(*magnitude).ok()?;
            total = total.checked_add(&unit.to_delta(magnitude)?)?;
        }
        if self.negative { Some(-total) } else { Some(total) }
    }
}

impl FromStr for FluxDuration {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || GatewayError::InvalidRequest(format!("invalid duration literal: {s:?}"));

        let (negative, mut rest) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        if rest.is_empty() {
            return Err(invalid());
        }

        let mut parts = Vec::new();
        while !rest.is_empty() {
            let digits_end = rest
                .find(|c: char| !c.is_ascii_digit())
                .ok_or_else(invalid)?;
            let (digits, tail) = rest.split_at(digits_end);
            if digits.is_empty() {
                return Err(invalid());
            }
            let magnitude: u64 = digits.parse().map_err(|_| invalid())?;

            let unit_end = tail.find(|c: char| c.is_ascii_digit()).unwrap_or(tail.len());
            let (unit, tail) = tail.split_at(unit_end);
            let unit = DurationUnit::parse(unit).ok_or_else(invalid)?;

            parts.push((magnitude, unit));
            rest = tail;
        }

        Ok(Self { negative, parts })
    }
}

impl fmt::Display for FluxDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            f.write_str("-")?;
        }
        for (magnitude, unit) in &self.parts {
            write!(f, "{magnitude}{}", unit.as_str())?;
        }
        Ok(())
    }
}
