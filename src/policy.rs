//! Sunset policy evaluation.
//!
//! Turns a "deprecated flag flipped" fact into a finding kind, based on the
//! stability level and sunset extensions of the property's revision.

use crate::config::PolicyConfig;
use crate::diff::Metadata;
use crate::error::SunsetParseError;
use chrono::{DateTime, NaiveDate};
use serde_json::Value;

/// Result of evaluating a newly deprecated property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Report with this outcome.
    Report(Outcome),
    /// No finding; the reason is kept for observers and metrics.
    Suppress(SuppressReason),
}

/// Outcome carried into a finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Deprecated(NaiveDate),
    SunsetMissing,
    SunsetUnparseable(SunsetParseError),
}

/// Why a newly deprecated property produced no finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    /// No stability-level extension.
    MissingStability,
    /// Stability level not present in the configuration.
    UnknownStability,
    /// No sunset, and the level's grace period is zero.
    NoGracePeriod,
}

impl SuppressReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingStability => "missing_stability",
            Self::UnknownStability => "unknown_stability",
            Self::NoGracePeriod => "no_grace_period",
        }
    }
}

/// Evaluate a property whose `deprecated` flag just turned on.
///
/// Only presence and syntax of the sunset are checked; the date is never
/// compared with today or with the grace period.
pub fn evaluate_deprecation(metadata: &Metadata, config: &PolicyConfig) -> Verdict {
    let stability = match metadata.get(&config.extensions.stability_level) {
        None => return Verdict::Suppress(SuppressReason::MissingStability),
        Some(value) => value,
    };
    let grace_days = match stability.as_str().and_then(|s| config.grace_period_days(s)) {
        Some(days) => days,
        None => return Verdict::Suppress(SuppressReason::UnknownStability),
    };

    match metadata.get(&config.extensions.sunset) {
        None if grace_days > 0 => Verdict::Report(Outcome::SunsetMissing),
        None => Verdict::Suppress(SuppressReason::NoGracePeriod),
        Some(sunset) => match parse_sunset(sunset) {
            Ok(date) => Verdict::Report(Outcome::Deprecated(date)),
            Err(e) => Verdict::Report(Outcome::SunsetUnparseable(e)),
        },
    }
}

/// Parse a sunset extension value.
///
/// Accepts a calendar date (`2026-12-31`) or an RFC 3339 timestamp, whose UTC
/// date is used.
pub fn parse_sunset(value: &Value) -> Result<NaiveDate, SunsetParseError> {
    let raw = value.as_str().ok_or_else(|| SunsetParseError::NotAString {
        actual: json_type_name(value).to_string(),
    })?;
    let raw = raw.trim();

    let date_err = match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => return Ok(date),
        Err(e) => e,
    };
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.naive_utc().date());
    }

    Err(SunsetParseError::InvalidDate {
        value: raw.to_string(),
        reason: date_err.to_string(),
    })
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
