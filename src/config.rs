//! Configuration for property deprecation analysis.
//!
//! Defines stability-level grace periods, extension keys, severities,
//! traversal limits, path filters and metrics options.

use crate::finding::{FindingKind, Severity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Main policy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyConfig {
    /// Grace period in days per stability level. A level with 0 days needs no sunset.
    #[serde(default = "default_stability_levels")]
    pub stability_levels: BTreeMap<String, u32>,

    /// Extension keys read from schema metadata
    #[serde(default)]
    pub extensions: ExtensionKeys,

    /// Severity per finding kind
    #[serde(default)]
    pub severity: SeverityLevels,

    /// Traversal limits
    #[serde(default)]
    pub traversal: TraversalSettings,

    /// Path filters
    #[serde(default)]
    pub filters: FilterConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            stability_levels: default_stability_levels(),
            extensions: ExtensionKeys::default(),
            severity: SeverityLevels::default(),
            traversal: TraversalSettings::default(),
            filters: FilterConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl PolicyConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse and validate a YAML configuration string.
    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.stability_levels.keys().any(|level| level.trim().is_empty()) {
            anyhow::bail!("Stability level names cannot be empty");
        }
        if self.extensions.stability_level.is_empty() || self.extensions.sunset.is_empty() {
            anyhow::bail!("Extension keys cannot be empty");
        }
        if self.traversal.max_depth == 0 {
            anyhow::bail!("traversal.max_depth must be at least 1");
        }
        if self.metrics.prefix.is_empty() {
            anyhow::bail!("metrics.prefix cannot be empty");
        }
        self.filters.compile()?;
        Ok(())
    }

    /// Grace period for a stability level, or `None` if the level is not configured.
    pub fn grace_period_days(&self, stability_level: &str) -> Option<u32> {
        self.stability_levels.get(stability_level).copied()
    }
}

fn default_stability_levels() -> BTreeMap<String, u32> {
    BTreeMap::from([
        ("draft".to_string(), 0),
        ("alpha".to_string(), 0),
        ("beta".to_string(), 31),
        ("stable".to_string(), 180),
    ])
}

/// Names of the vendor extensions that carry policy metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtensionKeys {
    #[serde(default = "default_stability_key")]
    pub stability_level: String,

    #[serde(default = "default_sunset_key")]
    pub sunset: String,
}

impl Default for ExtensionKeys {
    fn default() -> Self {
        Self {
            stability_level: default_stability_key(),
            sunset: default_sunset_key(),
        }
    }
}

fn default_stability_key() -> String {
    "x-stability-level".to_string()
}

fn default_sunset_key() -> String {
    "x-sunset".to_string()
}

/// Severity assigned to each finding kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeverityLevels {
    #[serde(default = "default_info")]
    pub deprecated: Severity,

    #[serde(default = "default_error")]
    pub sunset_missing: Severity,

    #[serde(default = "default_error")]
    pub sunset_unparseable: Severity,

    #[serde(default = "default_info")]
    pub reactivated: Severity,
}

impl SeverityLevels {
    pub fn for_kind(&self, kind: FindingKind) -> Severity {
        match kind {
            FindingKind::Deprecated => self.deprecated,
            FindingKind::SunsetMissing => self.sunset_missing,
            FindingKind::SunsetUnparseable => self.sunset_unparseable,
            FindingKind::Reactivated => self.reactivated,
        }
    }
}

impl Default for SeverityLevels {
    fn default() -> Self {
        Self {
            deprecated: Severity::Info,
            sunset_missing: Severity::Error,
            sunset_unparseable: Severity::Error,
            reactivated: Severity::Info,
        }
    }
}

fn default_info() -> Severity {
    Severity::Info
}

fn default_error() -> Severity {
    Severity::Error
}

/// Limits applied while walking schema differences.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TraversalSettings {
    /// Maximum recursion depth per scope
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Walk scopes on the rayon thread pool
    #[serde(default = "default_true")]
    pub parallel: bool,
}

impl Default for TraversalSettings {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            parallel: true,
        }
    }
}

fn default_max_depth() -> usize {
    64
}

fn default_true() -> bool {
    true
}

/// Restricts which parts of the diff are analysed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterConfig {
    /// Only analyse paths matching this regex
    #[serde(default)]
    pub match_path: Option<String>,

    /// Skip paths matching any of these glob patterns
    #[serde(default)]
    pub exclude_paths: Vec<String>,

    /// Analyse modified component schemas
    #[serde(default = "default_true")]
    pub include_components: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            match_path: None,
            exclude_paths: Vec::new(),
            include_components: true,
        }
    }
}

impl FilterConfig {
    /// Compile the patterns into a matcher.
    pub fn compile(&self) -> anyhow::Result<PathFilter> {
        let match_path = self
            .match_path
            .as_deref()
            .map(regex::Regex::new)
            .transpose()
            .map_err(|e| anyhow::anyhow!("Invalid filters.match_path: {}", e))?;

        let mut builder = globset::GlobSetBuilder::new();
        for pattern in &self.exclude_paths {
            let glob = globset::Glob::new(pattern)
                .map_err(|e| anyhow::anyhow!("Invalid exclude pattern '{}': {}", pattern, e))?;
            builder.add(glob);
        }

        Ok(PathFilter {
            match_path,
            exclude: builder.build()?,
        })
    }
}

/// Compiled form of [`FilterConfig`] path rules.
#[derive(Debug, Clone)]
pub struct PathFilter {
    match_path: Option<regex::Regex>,
    exclude: globset::GlobSet,
}

impl PathFilter {
    /// Check if a path key should be analysed.
    pub fn allows(&self, path: &str) -> bool {
        if let Some(re) = &self.match_path {
            if !re.is_match(path) {
                return false;
            }
        }
        !self.exclude.is_match(path)
    }
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Prefix for metric names
    #[serde(default = "default_metrics_prefix")]
    pub prefix: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            prefix: default_metrics_prefix(),
        }
    }
}

fn default_metrics_prefix() -> String {
    "openapi_property_deprecation".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_basic_config() {
        let yaml = r#"
stability_levels:
  stable: 30
  beta: 7
  alpha: 0
severity:
  sunset_missing: warning
traversal:
  max_depth: 16
"#;
        let config = PolicyConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.grace_period_days("stable"), Some(30));
        assert_eq!(config.grace_period_days("alpha"), Some(0));
        assert_eq!(config.grace_period_days("draft"), None);
        assert_eq!(config.severity.sunset_missing, Severity::Warning);
        assert_eq!(config.severity.sunset_unparseable, Severity::Error);
        assert_eq!(config.traversal.max_depth, 16);
        assert!(config.traversal.parallel);
        assert_eq!(config.extensions.sunset, "x-sunset");
    }

    #[test]
    fn test_default_grace_periods() {
        let config = PolicyConfig::default();
        assert_eq!(config.grace_period_days("draft"), Some(0));
        assert_eq!(config.grace_period_days("alpha"), Some(0));
        assert_eq!(config.grace_period_days("beta"), Some(31));
        assert_eq!(config.grace_period_days("stable"), Some(180));
        assert_eq!(config.grace_period_days("Stable"), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let yaml = "stability_levels: {}\nsunset_days: 10\n";
        assert!(PolicyConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_validation_failures() {
        let mut config = PolicyConfig::default();
        config.traversal.max_depth = 0;
        assert!(config.validate().is_err());

        let mut config = PolicyConfig::default();
        config.filters.match_path = Some("([".to_string());
        assert!(config.validate().is_err());

        let mut config = PolicyConfig::default();
        config.filters.exclude_paths = vec!["/a/[".to_string()];
        assert!(config.validate().is_err());

        let mut config = PolicyConfig::default();
        config.stability_levels.insert(" ".to_string(), 3);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_path_filter() {
        let filters = FilterConfig {
            match_path: Some("^/api".to_string()),
            exclude_paths: vec!["/api/internal/**".to_string()],
            include_components: true,
        };
        let filter = filters.compile().unwrap();

        assert!(filter.allows("/api/pets"));
        assert!(!filter.allows("/api/internal/debug"));
        assert!(!filter.allows("/health"));
    }

    #[test]
    fn test_severity_for_kind() {
        let levels = SeverityLevels::default();
        assert_eq!(levels.for_kind(FindingKind::Deprecated), Severity::Info);
        assert_eq!(levels.for_kind(FindingKind::SunsetMissing), Severity::Error);
        assert_eq!(levels.for_kind(FindingKind::SunsetUnparseable), Severity::Error);
        assert_eq!(levels.for_kind(FindingKind::Reactivated), Severity::Info);
    }

    #[test]
    fn test_shipped_default_config_matches_defaults() {
        let shipped = PolicyConfig::from_yaml(include_str!("../demos/default-config.yaml")).unwrap();
        let defaults = PolicyConfig::default();
        assert_eq!(shipped.stability_levels, defaults.stability_levels);
        assert_eq!(shipped.traversal.max_depth, defaults.traversal.max_depth);
        assert_eq!(shipped.metrics.prefix, defaults.metrics.prefix);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "stability_levels:\n  stable: 90").unwrap();

        let config = PolicyConfig::from_file(file.path()).unwrap();
        assert_eq!(config.grace_period_days("stable"), Some(90));
        assert_eq!(config.grace_period_days("beta"), None);
    }
}
