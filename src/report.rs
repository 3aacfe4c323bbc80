//! Rendering of findings for people and machines.

use crate::config::SeverityLevels;
use crate::finding::{DeprecationFinding, FindingKind, Severity};
use crate::scope::{AnalysisScope, BodyKind};
use serde::Serialize;
use std::collections::BTreeMap;

/// Human-readable message for a finding.
pub fn finding_message(finding: &DeprecationFinding) -> String {
    let subject = match &finding.scope {
        AnalysisScope::Schema { name } => {
            format!("property '{}' of schema '{}'", finding.property_path, name)
        }
        AnalysisScope::Body { body, .. } => match body {
            BodyKind::Request => format!("request property '{}'", finding.property_path),
            BodyKind::Response { status } => format!(
                "response property '{}' (status {})",
                finding.property_path, status
            ),
        },
    };

    match finding.kind {
        FindingKind::Deprecated => match finding.sunset_date {
            Some(date) => format!("{} deprecated with sunset date '{}'", subject, date),
            None => format!("{} deprecated", subject),
        },
        FindingKind::SunsetMissing => {
            format!("{} deprecated without sunset date", subject)
        }
        FindingKind::SunsetUnparseable => format!(
            "{} deprecated with unparseable sunset: {}",
            subject,
            finding.parse_error.as_deref().unwrap_or("unknown error")
        ),
        FindingKind::Reactivated => format!("{} reactivated", subject),
    }
}

/// One line per finding: `severity [change-id] location: message`.
pub fn render_text(findings: &[DeprecationFinding], severity: &SeverityLevels) -> String {
    let mut out = String::new();
    for finding in findings {
        let location = match &finding.scope {
            AnalysisScope::Schema { .. } => "components".to_string(),
            AnalysisScope::Body { method, path, .. } => format!("{} {}", method, path),
        };
        out.push_str(&format!(
            "{} [{}] {}: {}\n",
            severity.for_kind(finding.kind),
            finding.change_id(),
            location,
            finding_message(finding)
        ));
    }
    out
}

#[derive(Debug, Serialize)]
struct JsonFinding<'a> {
    id: String,
    severity: Severity,
    message: String,
    #[serde(flatten)]
    finding: &'a DeprecationFinding,
}

#[derive(Debug, Default, Serialize)]
struct Summary {
    total: usize,
    info: usize,
    warning: usize,
    error: usize,
    /// Count per finding kind, zero for kinds not seen
    kinds: BTreeMap<&'static str, usize>,
}

/// JSON document `{ "findings": [...], "summary": {...} }`.
pub fn render_json(findings: &[DeprecationFinding], severity: &SeverityLevels) -> String {
    let mut summary = Summary {
        kinds: FindingKind::ALL.iter().map(|k| (k.as_str(), 0)).collect(),
        ..Summary::default()
    };
    let entries: Vec<JsonFinding<'_>> = findings
        .iter()
        .map(|finding| {
            let level = severity.for_kind(finding.kind);
            summary.total += 1;
            *summary.kinds.entry(finding.kind.as_str()).or_default() += 1;
            match level {
                Severity::Info => summary.info += 1,
                Severity::Warning => summary.warning += 1,
                Severity::Error => summary.error += 1,
            }
            JsonFinding {
                id: finding.change_id(),
                severity: level,
                message: finding_message(finding),
                finding,
            }
        })
        .collect();

    let report = serde_json::json!({
        "findings": entries,
        "summary": summary,
    });
    serde_json::to_string_pretty(&report).unwrap_or_default()
}

/// Highest severity among the findings.
pub fn max_severity(findings: &[DeprecationFinding], severity: &SeverityLevels) -> Option<Severity> {
    findings.iter().map(|f| severity.for_kind(f.kind)).max()
}
