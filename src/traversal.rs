//! Depth-first walk of one scope's schema differences.
//!
//! Object properties extend the property path; `allOf`/`oneOf`/`anyOf`
//! branches describe the same entity and keep the path unchanged, so a
//! property reached through two branches collides in the scope's dedup set.

use crate::config::PolicyConfig;
use crate::dedup::{DedupKey, DedupSet};
use crate::diff::{CompositionKind, Metadata, NodeId, SchemaGraph};
use crate::finding::DeprecationFinding;
use crate::observer::{TraversalEvent, TraversalObserver};
use crate::policy::{evaluate_deprecation, Outcome, SuppressReason, Verdict};
use crate::scope::AnalysisScope;
use std::collections::HashSet;

/// Counters collected during one scope traversal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraversalStats {
    pub nodes_visited: usize,
    pub duplicates_discarded: usize,
    pub cycles_cut: usize,
    pub depth_limit_hits: usize,
    pub suppressed: Vec<SuppressReason>,
}

/// Findings and counters of one scope.
#[derive(Debug, Clone)]
pub struct ScopeOutcome {
    pub scope: AnalysisScope,
    pub findings: Vec<DeprecationFinding>,
    pub stats: TraversalStats,
}

/// Walk every root of `scope` and collect its findings.
///
/// Roots are the schema differences of the scope, one per media type for
/// operation bodies. Dedup and cycle state are shared by all roots and
/// dropped when the call returns.
///
/// A node already on the current walk stack is never entered again, so a
/// recursive schema is walked once along each path. The deprecation flag of
/// such a node is still checked from its parent. `traversal.max_depth`
/// bounds acyclic nesting.
pub fn traverse_scope(
    graph: &SchemaGraph,
    scope: &AnalysisScope,
    roots: &[NodeId],
    config: &PolicyConfig,
    observer: &dyn TraversalObserver,
) -> ScopeOutcome {
    let mut walker = Walker {
        graph,
        scope,
        config,
        observer,
        dedup: DedupSet::new(),
        ancestors: Vec::new(),
        visited: HashSet::new(),
        findings: Vec::new(),
        stats: TraversalStats::default(),
    };

    for &root in roots {
        walker.walk(root, "", 0);
    }

    ScopeOutcome {
        scope: scope.clone(),
        findings: walker.findings,
        stats: walker.stats,
    }
}

struct Walker<'a> {
    graph: &'a SchemaGraph,
    scope: &'a AnalysisScope,
    config: &'a PolicyConfig,
    observer: &'a dyn TraversalObserver,
    dedup: DedupSet,
    /// Nodes on the current walk stack
    ancestors: Vec<NodeId>,
    /// (node, path) pairs already walked in this scope
    visited: HashSet<(NodeId, String)>,
    findings: Vec<DeprecationFinding>,
    stats: TraversalStats,
}

impl<'a> Walker<'a> {
    fn walk(&mut self, id: NodeId, prefix: &str, depth: usize) {
        if depth > self.config.traversal.max_depth {
            self.stats.depth_limit_hits += 1;
            self.observer.on_event(&TraversalEvent::DepthLimitReached {
                scope: self.scope,
                node: id,
                path: prefix,
                max_depth: self.config.traversal.max_depth,
            });
            return;
        }
        if self.ancestors.contains(&id) || !self.visited.insert((id, prefix.to_string())) {
            self.stats.cycles_cut += 1;
            self.observer.on_event(&TraversalEvent::CycleCut {
                scope: self.scope,
                node: id,
                path: prefix,
            });
            return;
        }
        self.stats.nodes_visited += 1;
        self.ancestors.push(id);

        let graph = self.graph;
        let node = graph.node(id);

        for (name, &child_id) in &node.properties {
            let path = join_path(prefix, name);
            let child = graph.node(child_id);

            if let Some(transition) = child.deprecated {
                if transition.is_newly_deprecated() {
                    self.check_deprecated(&path, &child.metadata);
                } else if transition.is_reactivated() {
                    self.emit(DeprecationFinding::reactivated(self.scope.clone(), path.clone()));
                }
            }

            self.walk(child_id, &path, depth + 1);
        }

        for kind in CompositionKind::ALL {
            for &branch in node.branches(kind) {
                self.walk(branch, prefix, depth + 1);
            }
        }

        self.ancestors.pop();
    }

    fn check_deprecated(&mut self, path: &str, metadata: &Metadata) {
        let outcome = match evaluate_deprecation(metadata, self.config) {
            Verdict::Report(outcome) => outcome,
            Verdict::Suppress(reason) => {
                self.stats.suppressed.push(reason);
                self.observer.on_event(&TraversalEvent::Suppressed {
                    scope: self.scope,
                    path,
                    reason,
                });
                return;
            }
        };

        let scope = self.scope.clone();
        let path = path.to_string();
        let finding = match outcome {
            Outcome::Deprecated(date) => DeprecationFinding::deprecated(scope, path, date),
            Outcome::SunsetMissing => DeprecationFinding::sunset_missing(scope, path),
            Outcome::SunsetUnparseable(err) => {
                DeprecationFinding::sunset_unparseable(scope, path, err.to_string())
            }
        };
        self.emit(finding);
    }

    fn emit(&mut self, finding: DeprecationFinding) {
        let key = DedupKey::new(self.scope.clone(), finding.property_path.clone());
        if !self.dedup.admit(key) {
            self.stats.duplicates_discarded += 1;
            self.observer.on_event(&TraversalEvent::DuplicateDiscarded {
                scope: self.scope,
                path: &finding.property_path,
                kind: finding.kind,
            });
            return;
        }

        self.observer.on_event(&TraversalEvent::FindingEmitted {
            scope: self.scope,
            path: &finding.property_path,
            kind: finding.kind,
        });
        self.findings.push(finding);
    }
}

/// Append a property name to a dot path.
///
/// `.` and `\` inside a name are backslash-escaped so that a property named
/// `a.b` and a property `b` nested under `a` keep distinct paths.
fn join_path(prefix: &str, name: &str) -> String {
    let segment = if name.contains(&['.', '\\'][..]) {
        name.replace('\\', "\\\\").replace('.', "\\.")
    } else {
        name.to_string()
    };
    if prefix.is_empty() {
        segment
    } else {
        format!("{}.{}", prefix, segment)
    }
}
