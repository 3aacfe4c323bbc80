//! Deprecation findings, the output of an analysis.

use crate::scope::AnalysisScope;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of evaluating one deprecation transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    /// Newly deprecated with a valid sunset date.
    Deprecated,
    /// Newly deprecated without a sunset although the stability level requires one.
    SunsetMissing,
    /// Newly deprecated with a sunset that is not a date.
    SunsetUnparseable,
    /// The deprecated flag was removed.
    Reactivated,
}

impl FindingKind {
    pub const ALL: [FindingKind; 4] = [
        Self::Deprecated,
        Self::SunsetMissing,
        Self::SunsetUnparseable,
        Self::Reactivated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deprecated => "deprecated",
            Self::SunsetMissing => "sunset_missing",
            Self::SunsetUnparseable => "sunset_unparseable",
            Self::Reactivated => "reactivated",
        }
    }

    fn change_suffix(&self) -> &'static str {
        match self {
            Self::Deprecated => "property-deprecated",
            Self::SunsetMissing => "property-deprecated-sunset-missing",
            Self::SunsetUnparseable => "property-deprecated-sunset-parse",
            Self::Reactivated => "property-reactivated",
        }
    }
}

impl fmt::Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity assigned to a finding by configuration.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => f.write_str("info"),
            Self::Warning => f.write_str("warning"),
            Self::Error => f.write_str("error"),
        }
    }
}

/// One reported property.
///
/// `sunset_date` is set only for [`FindingKind::Deprecated`] and `parse_error`
/// only for [`FindingKind::SunsetUnparseable`]; the constructors keep it that way.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeprecationFinding {
    pub scope: AnalysisScope,
    /// Dot-joined path from the scope root, e.g. `address.street`.
    pub property_path: String,
    pub kind: FindingKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sunset_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parse_error: Option<String>,
}

impl DeprecationFinding {
    pub fn deprecated(scope: AnalysisScope, property_path: String, sunset: NaiveDate) -> Self {
        Self {
            scope,
            property_path,
            kind: FindingKind::Deprecated,
            sunset_date: Some(sunset),
            parse_error: None,
        }
    }

    pub fn sunset_missing(scope: AnalysisScope, property_path: String) -> Self {
        Self::bare(scope, property_path, FindingKind::SunsetMissing)
    }

    pub fn sunset_unparseable(
        scope: AnalysisScope,
        property_path: String,
        error: impl Into<String>,
    ) -> Self {
        Self {
            scope,
            property_path,
            kind: FindingKind::SunsetUnparseable,
            sunset_date: None,
            parse_error: Some(error.into()),
        }
    }

    pub fn reactivated(scope: AnalysisScope, property_path: String) -> Self {
        Self::bare(scope, property_path, FindingKind::Reactivated)
    }

    fn bare(scope: AnalysisScope, property_path: String, kind: FindingKind) -> Self {
        Self {
            scope,
            property_path,
            kind,
            sunset_date: None,
            parse_error: None,
        }
    }

    /// Stable identifier of the change, e.g. `request-property-deprecated-sunset-missing`.
    pub fn change_id(&self) -> String {
        match self.scope.kind_label() {
            "schema" => self.kind.change_suffix().to_string(),
            prefix => format!("{}-{}", prefix, self.kind.change_suffix()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_change_ids() {
        let schema = DeprecationFinding::deprecated(
            AnalysisScope::schema("Pet"),
            "age".into(),
            date("2026-12-31"),
        );
        assert_eq!(schema.change_id(), "property-deprecated");

        let request =
            DeprecationFinding::sunset_missing(AnalysisScope::request("POST", "/pets"), "email".into());
        assert_eq!(
            request.change_id(),
            "request-property-deprecated-sunset-missing"
        );

        let response = DeprecationFinding::sunset_unparseable(
            AnalysisScope::response("GET", "/pets", "200"),
            "name".into(),
            "bad",
        );
        assert_eq!(
            response.change_id(),
            "response-property-deprecated-sunset-parse"
        );

        let reactivated =
            DeprecationFinding::reactivated(AnalysisScope::schema("Pet"), "age".into());
        assert_eq!(reactivated.change_id(), "property-reactivated");
    }

    #[test]
    fn test_payload_only_on_matching_kind() {
        let f = DeprecationFinding::deprecated(
            AnalysisScope::schema("Pet"),
            "age".into(),
            date("2026-12-31"),
        );
        assert_eq!(f.sunset_date, Some(date("2026-12-31")));
        assert!(f.parse_error.is_none());

        let f = DeprecationFinding::sunset_unparseable(
            AnalysisScope::schema("Pet"),
            "age".into(),
            "oops",
        );
        assert!(f.sunset_date.is_none());
        assert_eq!(f.parse_error.as_deref(), Some("oops"));
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
        let parsed: Severity = serde_yaml::from_str("warning").unwrap();
        assert_eq!(parsed, Severity::Warning);
    }

    #[test]
    fn test_finding_serializes_without_empty_payloads() {
        let f = DeprecationFinding::sunset_missing(AnalysisScope::schema("Pet"), "age".into());
        let json = serde_json::to_value(&f).unwrap();
        assert_eq!(json["kind"], "sunset_missing");
        assert_eq!(json["scope"]["type"], "schema");
        assert!(json.get("sunset_date").is_none());
        assert!(json.get("parse_error").is_none());
    }
}
