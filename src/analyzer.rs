//! Property deprecation analyzer.
//!
//! Splits a diff into analysis scopes (every modified request body, every
//! modified response and every modified component schema), walks each one
//! and concatenates the findings. Scopes share no state, so they run on the
//! rayon pool when `traversal.parallel` is set.

use crate::config::{PathFilter, PolicyConfig};
use crate::diff::{DiffReport, NodeId};
use crate::finding::{DeprecationFinding, Severity};
use crate::metrics::DeprecationMetrics;
use crate::observer::{TracingObserver, TraversalObserver};
use crate::scope::AnalysisScope;
use crate::traversal::{traverse_scope, ScopeOutcome};
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{debug, info};

/// One scope and the schema roots it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeJob {
    pub scope: AnalysisScope,
    pub roots: Vec<NodeId>,
}

/// Property deprecation analyzer
///
/// Holds the policy, metrics and observer shared by every analysis run.
pub struct DeprecationAnalyzer {
    config: PolicyConfig,
    filter: PathFilter,
    metrics: Arc<DeprecationMetrics>,
    observer: Arc<dyn TraversalObserver>,
}

impl DeprecationAnalyzer {
    /// Create an analyzer, validating the configuration.
    pub fn new(config: PolicyConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let filter = config.filters.compile()?;
        let metrics = Arc::new(DeprecationMetrics::new(&config.metrics.prefix));

        info!(
            stability_levels = config.stability_levels.len(),
            max_depth = config.traversal.max_depth,
            "Property deprecation analyzer initialized"
        );

        Ok(Self {
            config,
            filter,
            metrics,
            observer: Arc::new(TracingObserver),
        })
    }

    /// Create from a YAML configuration string.
    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        Self::new(PolicyConfig::from_yaml(yaml)?)
    }

    /// Replace the default `tracing` observer.
    pub fn with_observer(mut self, observer: Arc<dyn TraversalObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    /// Get the metrics collector.
    pub fn metrics(&self) -> &DeprecationMetrics {
        &self.metrics
    }

    /// Severity configured for a finding.
    pub fn severity(&self, finding: &DeprecationFinding) -> Severity {
        self.config.severity.for_kind(finding.kind)
    }

    /// List the scopes of a diff that have at least one schema difference.
    ///
    /// A request body is one scope across all its media types; each response
    /// status is its own scope.
    pub fn collect_scopes(&self, diff: &DiffReport) -> Vec<ScopeJob> {
        let mut jobs = Vec::new();

        for (path, path_diff) in &diff.paths {
            if !self.filter.allows(path) {
                debug!(path = %path, "Path excluded by filters");
                continue;
            }
            for (method, operation) in &path_diff.operations {
                if let Some(body) = &operation.request_body {
                    let roots = body.schema_roots();
                    if !roots.is_empty() {
                        let scope = AnalysisScope::request(method, path.as_str())
                            .with_operation_id(operation.operation_id.clone());
                        jobs.push(ScopeJob { scope, roots });
                    }
                }
                for (status, content) in &operation.responses {
                    let roots = content.schema_roots();
                    if !roots.is_empty() {
                        let scope = AnalysisScope::response(method, path.as_str(), status.as_str())
                            .with_operation_id(operation.operation_id.clone());
                        jobs.push(ScopeJob { scope, roots });
                    }
                }
            }
        }

        if self.config.filters.include_components {
            for (name, &root) in &diff.components {
                jobs.push(ScopeJob {
                    scope: AnalysisScope::schema(name.as_str()),
                    roots: vec![root],
                });
            }
        }

        jobs
    }

    /// Analyse a diff and return every finding.
    ///
    /// Findings are deduplicated within a scope only; the same property seen
    /// in two scopes is reported twice. Order across scopes carries no meaning.
    pub fn analyze(&self, diff: &DiffReport) -> Vec<DeprecationFinding> {
        let jobs = self.collect_scopes(diff);
        debug!(scopes = jobs.len(), "Collected analysis scopes");

        let outcomes: Vec<ScopeOutcome> = if self.config.traversal.parallel {
            jobs.par_iter().map(|job| self.run_job(diff, job)).collect()
        } else {
            jobs.iter().map(|job| self.run_job(diff, job)).collect()
        };

        let mut findings = Vec::new();
        for outcome in outcomes {
            self.metrics.record_scope(&outcome);
            findings.extend(outcome.findings);
        }

        info!(
            scopes = jobs.len(),
            findings = findings.len(),
            "Property deprecation analysis complete"
        );
        findings
    }

    fn run_job(&self, diff: &DiffReport, job: &ScopeJob) -> ScopeOutcome {
        traverse_scope(
            &diff.graph,
            &job.scope,
            &job.roots,
            &self.config,
            self.observer.as_ref(),
        )
    }
}
