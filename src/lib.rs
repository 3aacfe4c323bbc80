//! OpenAPI Property Deprecation
//!
//! Finds properties whose `deprecated` flag was newly set between two
//! revisions of an API description and checks that each one announces a
//! sunset, as required by its stability level.
//!
//! # Features
//!
//! - **Nested and composed schemas**: walks object properties and
//!   `allOf`/`oneOf`/`anyOf` branches, tolerating shared and cyclic nodes
//! - **Per-scope deduplication**: one finding per property per component
//!   schema, request body or response
//! - **Sunset policy**: grace periods per stability level, sunset presence and
//!   date validity checks
//! - **Reactivation**: reports properties whose deprecation was withdrawn
//!
//! # Example Configuration
//!
//! ```yaml
//! stability_levels:
//!   beta: 31
//!   stable: 180
//! severity:
//!   sunset_missing: error
//! ```

pub mod analyzer;
pub mod config;
pub mod dedup;
pub mod diff;
pub mod document;
pub mod error;
pub mod finding;
pub mod metrics;
pub mod observer;
pub mod policy;
pub mod report;
pub mod scope;
pub mod traversal;

pub use analyzer::DeprecationAnalyzer;
pub use config::PolicyConfig;
pub use diff::{DiffReport, NodeId, SchemaDiffNode, SchemaGraph};
pub use document::{load_diff, DiffDocument};
pub use finding::{DeprecationFinding, FindingKind, Severity};
pub use scope::AnalysisScope;
