//! Directory layout checker.
//!
//! Works over the collaborator-supplied [`DirectoryListing`]; never touches
//! the filesystem itself.

use crate::catalog::RuleCatalog;
use crate::types::{DirectoryListing, Finding};

pub fn check_structure(
    scope: &str,
    listing: &DirectoryListing,
    catalog: &RuleCatalog,
) -> Vec<Finding> {
    let mut findings = Vec::new();

    for dir in &catalog.required_dirs {
        if !listing.has_dir(dir) {
            findings.push(Finding::error(scope, format!("Missing required directory: {dir}")));
        }
    }

    for file in &catalog.required_files {
        if *file == "Dockerfile" && catalog.is_utility_service(scope) {
            continue;
        }
        if !listing.has_file(file) {
            findings.push(Finding::error(scope, format!("Missing required file: {file}")));
        }
    }

    // The source tree must contain a subpackage named after the service.
    let package_dir = format!("src/{scope}");
    if listing.has_dir("src") && !listing.has_dir(&package_dir) {
        findings.push(Finding::error(
            scope,
            format!("Missing source package directory: {package_dir}"),
        ));
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conformant_listing(service: &str) -> DirectoryListing {
        DirectoryListing::new(
            ["Dockerfile", "pyproject.toml", "README.md", "tests/conftest.py"],
            [
                "src".to_string(),
                format!("src/{service}"),
                "tests".to_string(),
                "tests/unit".to_string(),
                "tests/integration".to_string(),
            ],
        )
    }

    #[test]
    fn conformant_layout_passes() {
        let catalog = RuleCatalog::default();
        let findings = check_structure("worker", &conformant_listing("worker"), &catalog);
        assert!(findings.is_empty(), "unexpected findings: {findings:?}");
    }

    #[test]
    fn every_missing_artifact_is_named() {
        let catalog = RuleCatalog::default();
        let findings = check_structure("worker", &DirectoryListing::default(), &catalog);
        let messages: Vec<&str> = findings.iter().map(|f| f.message.as_str()).collect();
        assert!(messages.contains(&"Missing required directory: tests/integration"));
        assert!(messages.contains(&"Missing required file: tests/conftest.py"));
        assert!(messages.contains(&"Missing required file: Dockerfile"));
    }

    #[test]
    fn utility_services_skip_the_dockerfile_requirement() {
        let catalog = RuleCatalog::default();
        let listing = DirectoryListing::new(
            ["pyproject.toml", "README.md", "tests/conftest.py"],
            ["src", "src/tools", "tests", "tests/unit", "tests/integration"],
        );
        let findings = check_structure("tools", &listing, &catalog);
        assert!(!findings.iter().any(|f| f.message.contains("Dockerfile")));
    }

    #[test]
    fn service_named_subpackage_is_required() {
        let catalog = RuleCatalog::default();
        let listing = DirectoryListing::new(
            ["Dockerfile", "pyproject.toml", "README.md", "tests/conftest.py"],
            ["src", "src/other", "tests", "tests/unit", "tests/integration"],
        );
        let findings = check_structure("worker", &listing, &catalog);
        assert!(findings
            .iter()
            .any(|f| f.is_error() && f.message.contains("src/worker")));
    }
}
