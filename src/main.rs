//! OpenAPI Property Deprecation - CLI Entry Point

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use openapi_property_deprecation::{load_diff, report, DeprecationAnalyzer, PolicyConfig, Severity};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(
    name = "openapi-property-deprecation",
    about = "Check property deprecations in an OpenAPI diff against sunset policy",
    version
)]
struct Args {
    /// Diff document (YAML or JSON)
    #[arg(required_unless_present = "print_config")]
    diff: Option<PathBuf>,

    /// Path to policy configuration file
    #[arg(short, long, default_value = "deprecation-policy.yaml")]
    config: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'L', long, default_value = "warn")]
    log_level: Level,

    /// Print default configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Validate configuration and diff document, then exit
    #[arg(long)]
    validate: bool,

    /// Print Prometheus metrics to stderr after the run
    #[arg(long)]
    metrics: bool,

    /// Exit with status 1 if any finding has at least this severity
    #[arg(long, value_enum)]
    fail_on: Option<Severity>,
}

/// Load the policy file, falling back to defaults unless validating.
fn load_config(path: &Path, validate: bool) -> Result<PolicyConfig> {
    if path.exists() {
        info!(path = ?path, "Loading configuration");
        PolicyConfig::from_file(path).with_context(|| format!("Invalid configuration: {:?}", path))
    } else if validate {
        anyhow::bail!("Configuration file not found: {:?}", path);
    } else {
        info!("Using default configuration");
        Ok(PolicyConfig::default())
    }
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Print default config if requested
    if args.print_config {
        let default_config = include_str!("../demos/default-config.yaml");
        println!("{}", default_config);
        return Ok(ExitCode::SUCCESS);
    }

    let config = load_config(&args.config, args.validate)?;

    let diff_path = args
        .diff
        .as_ref()
        .context("A diff document is required")?;
    info!(path = ?diff_path, "Loading diff document");
    let diff = load_diff(diff_path)
        .with_context(|| format!("Cannot load diff document {:?}", diff_path))?;

    // Validate and exit if requested
    if args.validate {
        config.validate()?;
        println!("Configuration and diff document are valid");
        return Ok(ExitCode::SUCCESS);
    }

    let analyzer = DeprecationAnalyzer::new(config)?;
    let findings = analyzer.analyze(&diff);

    let severity = &analyzer.config().severity;
    match args.format {
        OutputFormat::Text => print!("{}", report::render_text(&findings, severity)),
        OutputFormat::Json => println!("{}", report::render_json(&findings, severity)),
    }

    if args.metrics {
        eprint!("{}", analyzer.metrics().encode());
    }

    let failed = match (args.fail_on, report::max_severity(&findings, severity)) {
        (Some(threshold), Some(worst)) => worst >= threshold,
        _ => false,
    };
    if failed {
        return Ok(ExitCode::from(1));
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_config_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("absent.yaml"), false).unwrap();
        assert_eq!(config.grace_period_days("stable"), Some(180));
    }

    #[test]
    fn test_missing_config_rejected_when_validating() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(&dir.path().join("absent.yaml"), true).unwrap_err();
        assert!(err.to_string().contains("Configuration file not found"));
    }

    #[test]
    fn test_existing_config_loaded_when_validating() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "stability_levels:\n  stable: 90").unwrap();

        let config = load_config(file.path(), true).unwrap();
        assert_eq!(config.grace_period_days("stable"), Some(90));
    }
}
