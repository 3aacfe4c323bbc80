//! Error types for diff tree loading and sunset parsing.

use thiserror::Error;

/// Errors raised while turning a diff document into a [`DiffReport`](crate::diff::DiffReport).
#[derive(Debug, Error)]
pub enum DiffTreeError {
    #[error("invalid YAML diff document: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid JSON diff document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cannot read diff document: {0}")]
    Io(#[from] std::io::Error),

    #[error("unresolved $ref '{reference}' at {location}")]
    UnresolvedRef { reference: String, location: String },

    #[error("$ref at {location} must not be combined with other keys")]
    RefWithSiblings { location: String },
}

/// A sunset value that could not be read as a calendar date.
///
/// Carried as data inside `SunsetUnparseable` findings, never raised.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum SunsetParseError {
    #[error("sunset must be a string, got {actual}")]
    NotAString { actual: String },

    #[error("sunset '{value}' is not a date (YYYY-MM-DD) or RFC 3339 timestamp: {reason}")]
    InvalidDate { value: String, reason: String },
}
