//! Checkers: pure functions mapping one parsed artifact plus the rule
//! catalog to a finding sequence.
//!
//! # Structure
//! - `dockerfile`: instruction-sequence rules
//! - `compose`: compose-file rules (per service and project-wide)
//! - `manifest`: Poetry manifest rules
//! - `structure`: directory layout rules
//! - `package`: Python package / import hygiene rules
//! - `secrets`: hardcoded secret scan

pub mod compose;
pub mod dockerfile;
pub mod manifest;
pub mod package;
pub mod secrets;
pub mod structure;

pub use compose::check_compose;
pub use dockerfile::check_dockerfile;
pub use manifest::check_manifest;
pub use package::check_packages;
pub use secrets::check_secrets;
pub use structure::check_structure;

use crate::aggregate::aggregate;
use crate::catalog::RuleCatalog;
use crate::types::{DirectoryListing, Finding, ValidationResult};
use std::collections::BTreeMap;

/// Everything the collaborator loaded for one service. The core does no I/O:
/// raw text and parsed values come in, findings come out.
#[derive(Debug, Clone, Copy)]
pub struct ServiceArtifacts<'a> {
    /// Service name (the directory name under the containers root).
    pub name: &'a str,
    /// Raw Dockerfile text, if the file exists.
    pub dockerfile: Option<&'a str>,
    /// Deserialized pyproject.toml, if the file exists.
    pub manifest: Option<&'a toml::Value>,
    /// Relative paths under the service root.
    pub listing: &'a DirectoryListing,
    /// Relative path to file text for every text file worth scanning;
    /// Python sources under src/ and tests/ drive the package checks.
    pub sources: &'a BTreeMap<String, String>,
}

/// Runs every per-service checker and aggregates into one result.
///
/// Checkers are independent: one failing check never suppresses another, and
/// the finding order is the per-checker order (structure, manifest,
/// Dockerfile, packages, secrets).
pub fn check_service(artifacts: &ServiceArtifacts<'_>, catalog: &RuleCatalog) -> ValidationResult {
    let name = artifacts.name;
    let mut lists = Vec::new();

    lists.push(check_structure(name, artifacts.listing, catalog));
    lists.push(check_manifest(name, artifacts.manifest, artifacts.listing, catalog));

    if let Some(text) = artifacts.dockerfile {
        match crate::dockerfile::parse(text) {
            Ok(instructions) => lists.push(check_dockerfile(name, &instructions, catalog)),
            Err(error) => {
                lists.push(vec![Finding::error(name, format!("Dockerfile parse error: {error}"))])
            }
        }
    }

    lists.push(check_packages(name, artifacts.sources, catalog));

    let mut secret_findings = Vec::new();
    if let Some(text) = artifacts.dockerfile {
        secret_findings.extend(check_secrets("Dockerfile", text, catalog));
    }
    for (path, text) in artifacts.sources {
        secret_findings.extend(check_secrets(path, text, catalog));
    }
    lists.push(secret_findings);

    aggregate(name, lists)
}
