//! Metrics for property deprecation analysis.
//!
//! Provides Prometheus counters for findings, analysed scopes and traversal guards.

use crate::finding::DeprecationFinding;
use crate::traversal::ScopeOutcome;
use prometheus::{HistogramVec, IntCounterVec, Opts, Registry};

/// Metrics collector for analysis runs.
#[derive(Clone)]
pub struct DeprecationMetrics {
    /// Registry for all metrics
    registry: Registry,

    /// Counter for findings by kind and scope kind
    pub findings_total: IntCounterVec,

    /// Counter for analysed scopes
    pub scopes_total: IntCounterVec,

    /// Counter for deprecated properties that produced no finding
    pub suppressed_total: IntCounterVec,

    /// Counter for cycle and depth guard hits
    pub guard_hits_total: IntCounterVec,

    /// Histogram of nodes visited per scope
    pub nodes_visited: HistogramVec,
}

impl DeprecationMetrics {
    /// Create a new metrics collector with the given prefix.
    pub fn new(prefix: &str) -> Self {
        let registry = Registry::new();

        let findings_total = IntCounterVec::new(
            Opts::new(
                format!("{}_findings_total", prefix),
                "Total number of property deprecation findings",
            ),
            &["kind", "scope_kind"],
        )
        .expect("Failed to create findings_total metric");

        let scopes_total = IntCounterVec::new(
            Opts::new(
                format!("{}_scopes_total", prefix),
                "Total number of analysed scopes",
            ),
            &["scope_kind"],
        )
        .expect("Failed to create scopes_total metric");

        let suppressed_total = IntCounterVec::new(
            Opts::new(
                format!("{}_suppressed_total", prefix),
                "Deprecated properties not reported because policy could not require a sunset",
            ),
            &["reason"],
        )
        .expect("Failed to create suppressed_total metric");

        let guard_hits_total = IntCounterVec::new(
            Opts::new(
                format!("{}_guard_hits_total", prefix),
                "Branches cut by the cycle or depth guard",
            ),
            &["guard"],
        )
        .expect("Failed to create guard_hits_total metric");

        let nodes_visited = HistogramVec::new(
            prometheus::HistogramOpts::new(
                format!("{}_nodes_visited", prefix),
                "Schema difference nodes visited per scope",
            )
            .buckets(vec![1.0, 2.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 1000.0]),
            &["scope_kind"],
        )
        .expect("Failed to create nodes_visited metric");

        registry
            .register(Box::new(findings_total.clone()))
            .expect("Failed to register findings_total");
        registry
            .register(Box::new(scopes_total.clone()))
            .expect("Failed to register scopes_total");
        registry
            .register(Box::new(suppressed_total.clone()))
            .expect("Failed to register suppressed_total");
        registry
            .register(Box::new(guard_hits_total.clone()))
            .expect("Failed to register guard_hits_total");
        registry
            .register(Box::new(nodes_visited.clone()))
            .expect("Failed to register nodes_visited");

        Self {
            registry,
            findings_total,
            scopes_total,
            suppressed_total,
            guard_hits_total,
            nodes_visited,
        }
    }

    /// Record a finding.
    pub fn record_finding(&self, finding: &DeprecationFinding) {
        self.findings_total
            .with_label_values(&[finding.kind.as_str(), finding.scope.kind_label()])
            .inc();
    }

    /// Record everything a scope traversal produced.
    pub fn record_scope(&self, outcome: &ScopeOutcome) {
        let scope_kind = outcome.scope.kind_label();
        self.scopes_total.with_label_values(&[scope_kind]).inc();
        self.nodes_visited
            .with_label_values(&[scope_kind])
            .observe(outcome.stats.nodes_visited as f64);

        for finding in &outcome.findings {
            self.record_finding(finding);
        }
        for reason in &outcome.stats.suppressed {
            self.suppressed_total
                .with_label_values(&[reason.as_str()])
                .inc();
        }
        if outcome.stats.cycles_cut > 0 {
            self.guard_hits_total
                .with_label_values(&["cycle"])
                .inc_by(outcome.stats.cycles_cut as u64);
        }
        if outcome.stats.depth_limit_hits > 0 {
            self.guard_hits_total
                .with_label_values(&["depth"])
                .inc_by(outcome.stats.depth_limit_hits as u64);
        }
    }

    /// Encode metrics in Prometheus text format.
    pub fn encode(&self) -> String {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::warn!(error = %e, "Failed to encode metrics");
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

impl Default for DeprecationMetrics {
    fn default() -> Self {
        Self::new("openapi_property_deprecation")
    }
}
