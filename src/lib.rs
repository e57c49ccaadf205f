//! hullcheck - standards-compliance checking core for containerized service
//! repositories.
//!
//! Inspects each service's Dockerfile, Poetry manifest, directory layout and
//! compose configuration against one fixed house convention set, and reports
//! structured findings. The core does no I/O: the caller loads raw text and
//! deserialized config, the checkers produce [`ValidationResult`]s, and
//! rendering plus exit-code mapping stay with the caller.
//!
//! # Example
//!
//! ```
//! use hullcheck::{check_service, DirectoryListing, RuleCatalog, ServiceArtifacts};
//! use std::collections::BTreeMap;
//!
//! let catalog = RuleCatalog::default();
//! let listing = DirectoryListing::new(["Dockerfile"], ["src"]);
//! let sources = BTreeMap::new();
//!
//! let result = check_service(
//!     &ServiceArtifacts {
//!         name: "worker-api",
//!         dockerfile: Some("FROM python:3.11-slim\n"),
//!         manifest: None,
//!         listing: &listing,
//!         sources: &sources,
//!     },
//!     &catalog,
//! );
//!
//! assert!(!result.passed);
//! for finding in &result.findings {
//!     println!("{:?} [{}] {}", finding.severity, finding.scope, finding.message);
//! }
//! ```

pub mod aggregate;
pub mod analyzers;
pub mod catalog;
pub mod checkers;
pub mod compose;
pub mod dockerfile;
pub mod error;
pub mod types;

pub use aggregate::aggregate;
pub use analyzers::{ApiAnalyzer, ApiSurface, SourceAnalyzer};
pub use catalog::{ArtifactKind, RuleCatalog, RuleKind, RuleSpec};
pub use checkers::{
    check_compose, check_dockerfile, check_manifest, check_packages, check_secrets,
    check_service, check_structure, ServiceArtifacts,
};
pub use compose::{ComposeFile, ComposeService};
pub use error::{HullcheckError, Result};
pub use types::{
    DirectoryListing, Finding, ImportRecord, Instruction, PackageInitInfo, RouteDoc,
    SettingsField, SourceReport, Severity, ValidationResult,
};
