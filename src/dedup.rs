//! Scope-local deduplication of findings.

use crate::scope::AnalysisScope;
use std::collections::HashSet;

/// Identity of a logical property within one scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    pub scope: AnalysisScope,
    pub property_path: String,
}

impl DedupKey {
    pub fn new(scope: AnalysisScope, property_path: impl Into<String>) -> Self {
        Self {
            scope,
            property_path: property_path.into(),
        }
    }
}

/// First-wins record of the findings admitted during one scope traversal.
///
/// A property gets at most one finding per traversal, whichever kind is
/// admitted first.
#[derive(Debug, Default)]
pub struct DedupSet {
    admitted: HashSet<DedupKey>,
}

impl DedupSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `key`. Returns false if the key already has a finding.
    pub fn admit(&mut self, key: DedupKey) -> bool {
        self.admitted.insert(key)
    }
}
