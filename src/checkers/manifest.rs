//! Poetry manifest checker.
//!
//! Consumes the already-deserialized `pyproject.toml` value plus the service
//! directory listing (for legacy dependency files) and verifies the required
//! nested sections, fields and Python version constraint.

use crate::catalog::RuleCatalog;
use crate::types::{DirectoryListing, Finding};

pub fn check_manifest(
    scope: &str,
    manifest: Option<&toml::Value>,
    listing: &DirectoryListing,
    catalog: &RuleCatalog,
) -> Vec<Finding> {
    let mut findings = Vec::new();

    for legacy in &catalog.legacy_dependency_files {
        if listing.has_file(legacy) {
            findings.push(Finding::error(
                scope,
                format!("{legacy} found - should use pyproject.toml with Poetry instead"),
            ));
        }
    }

    let Some(manifest) = manifest else {
        findings.push(Finding::error(
            scope,
            "Missing pyproject.toml (required for Poetry dependency management)",
        ));
        return findings;
    };

    for section in &catalog.required_manifest_sections {
        if nested(manifest, section).is_none() {
            findings.push(Finding::error(
                scope,
                format!("Missing required section in pyproject.toml: {section}"),
            ));
        }
    }

    if let Some(poetry) = nested(manifest, "tool.poetry") {
        for field in &catalog.required_manifest_fields {
            if poetry.get(field).is_none() {
                findings.push(Finding::error(
                    scope,
                    format!("Missing required field '{field}' in [tool.poetry]"),
                ));
            }
        }
    }

    let constraint = nested(manifest, "tool.poetry.dependencies.python").and_then(|v| v.as_str());
    match constraint {
        Some(version) if version.starts_with(catalog.python_constraint_prefix) => {}
        Some(_) | None => {
            findings.push(Finding::error(
                scope,
                format!("Python version must be {}.x", catalog.python_constraint_prefix),
            ));
        }
    }

    findings
}

/// Walks a dotted key path through nested tables.
fn nested<'a>(value: &'a toml::Value, path: &str) -> Option<&'a toml::Value> {
    path.split('.').try_fold(value, |current, key| current.get(key))
}
