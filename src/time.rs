//! Simulator time tokens and their canonical nanosecond form.
//!
//! ns-3 prints times as `+1.5s` in log lines and `+1500000000.0ns` in result
//! files. Both are read into a [`Timestamp`]; the canonical text form is
//! `+<nanoseconds, 6 decimals>ns`.

use std::fmt;
use thiserror::Error;

const NANOS_PER_SEC: f64 = 1_000_000_000.0;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampError {
    #[error("empty time token")]
    Empty,

    #[error("time token {token:?} is not a decimal number")]
    Invalid { token: String },

    #[error("time token {token:?} is negative")]
    Negative { token: String },

    #[error("time token {token:?} is not finite")]
    NonFinite { token: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    Seconds,
    Nanos,
}

/// Nanoseconds since the implicit start of a simulation.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Timestamp(f64);

impl Timestamp {
    pub fn from_nanos(ns: f64) -> Self {
        Self(ns)
    }

    pub fn from_secs(secs: f64) -> Self {
        Self(secs * NANOS_PER_SEC)
    }

    /// Read a raw simulator time (`+1.5s`, `1.5`). A trailing `ns` marks the
    /// value as already being in nanoseconds.
    pub fn parse_raw(token: &str) -> Result<Self, TimestampError> {
        parse_with_default(token, Unit::Seconds)
    }

    /// Read a result-file token (`+1500000000.000000ns`). Bare numbers are
    /// nanoseconds; a trailing `s` alone means seconds.
    pub fn parse_ns(token: &str) -> Result<Self, TimestampError> {
        parse_with_default(token, Unit::Nanos)
    }

    pub fn as_nanos(self) -> f64 {
        self.0
    }

    pub fn as_secs(self) -> f64 {
        self.0 / NANOS_PER_SEC
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "+{:.6}ns", self.0)
    }
}

/// Convert a raw simulator time into the canonical `+<ns>ns` string.
pub fn normalize(raw: &str) -> Result<String, TimestampError> {
    Ok(Timestamp::parse_raw(raw)?.to_string())
}

fn parse_with_default(token: &str, default_unit: Unit) -> Result<Timestamp, TimestampError> {
    let trimmed = token.trim();
    let unsigned = trimmed.trim_start_matches('+');
    if unsigned.is_empty() {
        return Err(TimestampError::Empty);
    }

    let (digits, unit) = if let Some(d) = unsigned.strip_suffix("ns") {
        (d, Unit::Nanos)
    } else if let Some(d) = unsigned.strip_suffix('s') {
        (d, Unit::Seconds)
    } else {
        (unsigned, default_unit)
    };

    let value: f64 = digits.trim().parse().map_err(|_| TimestampError::Invalid {
        token: trimmed.to_string(),
    })?;
    if !value.is_finite() {
        return Err(TimestampError::NonFinite {
            token: trimmed.to_string(),
        });
    }
    if value < 0.0 {
        return Err(TimestampError::Negative {
            token: trimmed.to_string(),
        });
    }

    // "-0" parses to negative zero; keep the printed sign stable.
    let value = if value == 0.0 { 0.0 } else { value };
    Ok(match unit {
        Unit::Seconds => Timestamp::from_secs(value),
        Unit::Nanos => Timestamp::from_nanos(value),
    })
}
