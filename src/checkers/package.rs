//! Python package checker.
//!
//! For every package directory under `src`/`tests`: require an `__init__.py`,
//! apply the `__all__`-when-re-exporting rule to init modules, and apply the
//! import-hygiene rules (no relative imports, no deprecated prefixes) to
//! every other Python file. Syntax errors become findings scoped to the
//! offending file, never aborting the pass.

use crate::analyzers::SourceAnalyzer;
use crate::catalog::RuleCatalog;
use crate::types::{Finding, ImportRecord, PackageInitInfo};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Checks all Python sources of one service, supplied as a map of relative
/// path (under the service root) to file text.
pub fn check_packages(
    scope: &str,
    sources: &BTreeMap<String, String>,
    catalog: &RuleCatalog,
) -> Vec<Finding> {
    let analyzer = SourceAnalyzer::new();
    let mut findings = Vec::new();

    let checked: Vec<(&str, &str)> = sources
        .iter()
        .filter(|(path, _)| is_checked_path(path, catalog))
        .map(|(path, text)| (path.as_str(), text.as_str()))
        .collect();

    // Every directory holding a Python file is a package and needs an init
    // module.
    let mut package_dirs: BTreeSet<&str> = BTreeSet::new();
    for (path, _) in &checked {
        if let Some((dir, _)) = path.rsplit_once('/') {
            package_dirs.insert(dir);
        }
    }
    for dir in &package_dirs {
        let init = format!("{dir}/__init__.py");
        if !sources.contains_key(&init) {
            findings.push(Finding::error(
                scope,
                format!("Missing __init__.py in Python package directory: {dir}"),
            ));
        }
    }

    for (path, text) in &checked {
        let is_init = path.ends_with("__init__.py");
        let report = analyzer.analyze(path, text);

        if let Some(error) = &report.parse_error {
            findings.push(Finding::error(*path, format!("Syntax error in {path}: {error}")));
            continue;
        }

        if is_init {
            let info = PackageInitInfo {
                path: path.to_string(),
                has_all_declaration: report.has_all_declaration,
                has_import_from_statements: report.has_import_from_statements,
                parse_error: None,
            };
            if info.has_import_from_statements && !info.has_all_declaration {
                findings.push(Finding::error(
                    *path,
                    format!("Missing __all__ definition in {path} when it contains imports"),
                ));
            }
        } else {
            for record in &report.imports {
                check_import(path, record, catalog, &mut findings);
            }
        }
    }

    debug!(scope, files = checked.len(), count = findings.len(), "package check complete");
    findings
}

fn check_import(
    path: &str,
    record: &ImportRecord,
    catalog: &RuleCatalog,
    findings: &mut Vec<Finding>,
) {
    if record.is_relative() {
        let dots = ".".repeat(record.level as usize);
        let module = record.module.as_deref().unwrap_or("");
        findings.push(Finding::error(
            path,
            format!(
                "Relative import found in {path}:{}: from {dots}{module} import ...",
                record.line
            ),
        ));
        return;
    }
    if let Some(module) = &record.module {
        for prefix in &catalog.deprecated_import_prefixes {
            if module.starts_with(prefix) {
                findings.push(Finding::error(
                    path,
                    format!(
                        "Deprecated import format in {path}:{}: from {module} import ... \
                         (import the service package directly)",
                        record.line
                    ),
                ));
            }
        }
    }
}

/// Only sources under src/ and tests/ are checked, and excluded directory
/// components (caches, virtualenvs, hidden dirs) prune the walk.
fn is_checked_path(path: &str, catalog: &RuleCatalog) -> bool {
    if !path.ends_with(".py") {
        return false;
    }
    let mut components = path.split('/');
    let root = components.next().unwrap_or("");
    if root != "src" && root != "tests" {
        return false;
    }
    !path.split('/').any(|component| catalog.is_excluded_dir(component))
}
