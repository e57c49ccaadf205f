//! Dockerfile checker.
//!
//! Every rule is a predicate over the canonical instruction sequence
//! produced by [`crate::dockerfile::parse`]; no rule re-scans raw text.

use crate::catalog::{ArtifactKind, RuleCatalog, RuleKind};
use crate::types::{Finding, Instruction, Severity};
use rustc_hash::FxHashSet;
use tracing::debug;

/// Checks one parsed Dockerfile against the catalog. The FROM-position and
/// base-image checks always run first, so a base-image mismatch is the first
/// finding reported.
pub fn check_dockerfile(
    scope: &str,
    instructions: &[Instruction],
    catalog: &RuleCatalog,
) -> Vec<Finding> {
    let mut findings = Vec::new();

    check_base_image(scope, instructions, catalog, &mut findings);
    check_instruction_presence(scope, instructions, catalog, &mut findings);
    check_env_keys(scope, instructions, catalog, &mut findings);
    check_poetry(scope, instructions, catalog, &mut findings);
    check_healthcheck(scope, instructions, catalog, &mut findings);
    check_labels(scope, instructions, catalog, &mut findings);
    check_pattern_rules(scope, instructions, catalog, &mut findings);

    debug!(scope, count = findings.len(), "dockerfile check complete");
    findings
}

fn check_base_image(
    scope: &str,
    instructions: &[Instruction],
    catalog: &RuleCatalog,
    findings: &mut Vec<Finding>,
) {
    let Some(first) = instructions.first() else {
        findings.push(Finding::error(scope, "Dockerfile must start with FROM instruction"));
        return;
    };
    if first.keyword != "FROM" {
        findings.push(Finding::error(scope, "Dockerfile must start with FROM instruction"));
        return;
    }
    let base_image = &first.argument;
    if !catalog.base_image_prefixes.iter().any(|p| base_image.starts_with(p)) {
        findings.push(Finding::error(
            scope,
            format!(
                "Base image must match one of [{}], found {base_image:?}",
                catalog.base_image_prefixes.join(", ")
            ),
        ));
    }
}

fn check_instruction_presence(
    scope: &str,
    instructions: &[Instruction],
    catalog: &RuleCatalog,
    findings: &mut Vec<Finding>,
) {
    let present: FxHashSet<&str> = instructions.iter().map(|i| i.keyword.as_str()).collect();

    for keyword in catalog.required_instructions {
        if !present.contains(keyword) {
            findings.push(Finding::error(
                scope,
                format!("Missing required instruction: {keyword}"),
            ));
        }
    }
    for keyword in catalog.recommended_instructions {
        if !present.contains(keyword) {
            findings.push(Finding::warning(
                scope,
                format!("Recommended instruction not found: {keyword}"),
            ));
        }
    }
}

fn check_env_keys(
    scope: &str,
    instructions: &[Instruction],
    catalog: &RuleCatalog,
    findings: &mut Vec<Finding>,
) {
    let mut declared: FxHashSet<&str> = FxHashSet::default();
    for instruction in instructions {
        if instruction.keyword != "ENV" {
            continue;
        }
        // Both ENV KEY=VALUE and ENV KEY VALUE forms; the key is the first
        // `=`- or whitespace-delimited token.
        let key = match instruction.argument.split_once('=') {
            Some((key, _)) => key.trim(),
            None => instruction.argument.split_whitespace().next().unwrap_or(""),
        };
        if !key.is_empty() {
            declared.insert(key);
        }
    }

    for key in &catalog.required_env_keys {
        if !declared.contains(key) {
            findings.push(Finding::error(
                scope,
                format!("Missing required environment variable: {key}"),
            ));
        }
    }
}

fn check_poetry(
    scope: &str,
    instructions: &[Instruction],
    catalog: &RuleCatalog,
    findings: &mut Vec<Finding>,
) {
    let runs: Vec<&str> = instructions
        .iter()
        .filter(|i| i.keyword == "RUN")
        .map(|i| i.argument.as_str())
        .collect();

    let bootstrap_found = runs
        .iter()
        .any(|arg| catalog.poetry_bootstrap_markers.iter().any(|m| arg.contains(m)));
    if !bootstrap_found {
        findings.push(Finding::error(scope, "Poetry installation command not found"));
    }

    if !runs.iter().any(|arg| arg.contains(catalog.poetry_install_marker)) {
        findings.push(Finding::error(scope, "Must install dependencies using poetry install"));
    }

    let copy_found = instructions.iter().any(|i| {
        i.keyword == "COPY" && catalog.manifest_files.iter().all(|f| i.argument.contains(f))
    });
    if !copy_found {
        findings.push(Finding::error(
            scope,
            format!(
                "Must copy {} and {} files",
                catalog.manifest_files[0], catalog.manifest_files[1]
            ),
        ));
    }
}

fn check_healthcheck(
    scope: &str,
    instructions: &[Instruction],
    catalog: &RuleCatalog,
    findings: &mut Vec<Finding>,
) {
    let Some(healthcheck) = instructions.iter().find(|i| i.keyword == "HEALTHCHECK") else {
        findings.push(Finding::error(scope, "Healthcheck configuration not found"));
        return;
    };
    let missing: Vec<&str> = catalog
        .healthcheck_flags
        .iter()
        .copied()
        .filter(|flag| !healthcheck.argument.contains(flag))
        .collect();
    if !missing.is_empty() {
        findings.push(Finding::error(
            scope,
            format!("Healthcheck must specify interval, timeout, and retries (missing {})", missing.join(", ")),
        ));
    }
}

fn check_labels(
    scope: &str,
    instructions: &[Instruction],
    catalog: &RuleCatalog,
    findings: &mut Vec<Finding>,
) {
    let mut declared: FxHashSet<&str> = FxHashSet::default();
    for instruction in instructions {
        if instruction.keyword != "LABEL" {
            continue;
        }
        // Labels may be split across instructions or packed into one as
        // multiple key=value tokens.
        for token in instruction.argument.split_whitespace() {
            if let Some((key, _)) = token.split_once('=') {
                declared.insert(key.trim());
            }
        }
    }

    for label in &catalog.required_labels {
        if !declared.contains(label) {
            findings.push(Finding::error(scope, format!("Missing required label: {label}")));
        }
    }
}

/// Prohibited patterns and security recommendations from the catalog's
/// pattern-rule table. Recommendations that are already structurally
/// satisfied produce nothing.
fn check_pattern_rules(
    scope: &str,
    instructions: &[Instruction],
    catalog: &RuleCatalog,
    findings: &mut Vec<Finding>,
) {
    let lines: Vec<String> = instructions.iter().map(Instruction::logical_line).collect();

    for rule in catalog.rules_for(ArtifactKind::Dockerfile) {
        match rule.kind {
            RuleKind::ProhibitedPattern => {
                if lines.iter().any(|line| rule.matches_line(line)) {
                    findings.push(Finding {
                        severity: rule.severity,
                        scope: scope.to_string(),
                        message: format!("Found prohibited pattern: {}", rule.description),
                    });
                }
            }
            RuleKind::RequiredPattern => {
                if !lines.iter().any(|line| rule.matches_line(line)) {
                    findings.push(Finding {
                        severity: rule.severity,
                        scope: scope.to_string(),
                        message: format!("Security recommendation: {}", rule.description),
                    });
                }
            }
            RuleKind::RequiredPresent => {}
        }
    }

    // Sanity: pattern rules in the catalog never demote an error silently.
    debug_assert!(catalog
        .rules_for(ArtifactKind::Dockerfile)
        .all(|r| r.kind != RuleKind::RequiredPattern || r.severity == Severity::Warning));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dockerfile::parse;

    const CONFORMANT: &str = r#"
FROM python:3.11-slim AS builder
LABEL maintainer="platform@example.com" version="1.0.0" description="worker service"

ENV PYTHONUNBUFFERED=1
ENV PYTHONDONTWRITEBYTECODE=1
ENV POETRY_VERSION=1.7.1
ENV POETRY_HOME=/opt/poetry
ENV POETRY_VIRTUALENVS_IN_PROJECT=true
ENV POETRY_NO_INTERACTION=1
ENV PYSETUP_PATH=/opt/pysetup
ENV VENV_PATH=/opt/pysetup/.venv

WORKDIR /app
RUN curl -sSL https://install.python-poetry.org | python3 -
COPY pyproject.toml poetry.lock ./
RUN poetry install --no-root
RUN apt-get update \
    && apt-get install --no-install-recommends -y curl \
    && rm -rf /var/lib/apt/lists/*
COPY src ./src
USER appuser
EXPOSE 8000
HEALTHCHECK --interval=5s --timeout=3s --retries=3 CMD curl -f http://localhost:8000/health
ENTRYPOINT ["poetry", "run"]
CMD ["python", "-m", "worker"]
"#;

    fn run(content: &str) -> Vec<Finding> {
        let catalog = RuleCatalog::default();
        let instructions = parse(content).unwrap();
        check_dockerfile("worker", &instructions, &catalog)
    }

    #[test]
    fn conformant_dockerfile_has_no_errors() {
        let findings = run(CONFORMANT);
        let errors: Vec<_> = findings.iter().filter(|f| f.is_error()).collect();
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
    }

    #[test]
    fn wrong_base_image_is_first_finding() {
        let findings = run("FROM node:18\nRUN npm ci\n");
        assert!(!findings.is_empty());
        assert!(findings[0].is_error());
        assert!(findings[0].message.contains("Base image"));
    }

    #[test]
    fn missing_from_reported_before_anything_else() {
        let findings = run("RUN echo hi\n");
        assert_eq!(findings[0].message, "Dockerfile must start with FROM instruction");
    }

    #[test]
    fn both_env_forms_are_recognized() {
        let with_equals = "ENV POETRY_VERSION=1.7.1\n";
        let with_space = "ENV POETRY_VERSION 1.7.1\n";
        for form in [with_equals, with_space] {
            let content = format!("FROM python:3.11\n{form}");
            let findings = run(&content);
            assert!(
                !findings.iter().any(|f| f.message.contains("POETRY_VERSION")),
                "POETRY_VERSION not recognized in {form:?}"
            );
        }
    }

    #[test]
    fn missing_required_env_reported_per_key() {
        let findings = run("FROM python:3.11-slim\n");
        let env_findings: Vec<_> = findings
            .iter()
            .filter(|f| f.message.starts_with("Missing required environment variable"))
            .collect();
        assert_eq!(env_findings.len(), 8);
    }

    #[test]
    fn healthcheck_without_flags_is_flagged() {
        let content = "FROM python:3.11\nHEALTHCHECK CMD curl -f http://localhost/health\n";
        let findings = run(content);
        assert!(findings
            .iter()
            .any(|f| f.is_error() && f.message.contains("interval, timeout, and retries")));
    }

    #[test]
    fn labels_may_span_multiple_instructions() {
        let content = "FROM python:3.11\nLABEL maintainer=a@b.c\nLABEL version=1.0 description=svc\n";
        let findings = run(content);
        assert!(!findings.iter().any(|f| f.message.starts_with("Missing required label")));
    }

    #[test]
    fn prohibited_pip_without_no_cache_dir() {
        let content = "FROM python:3.11\nRUN pip install requests\n";
        let findings = run(content);
        assert!(findings
            .iter()
            .any(|f| f.is_error() && f.message.contains("--no-cache-dir")));
    }

    #[test]
    fn copy_from_containers_root_is_prohibited() {
        let content = "FROM python:3.11\nCOPY containers/worker/src /app/src\n";
        let findings = run(content);
        assert!(findings
            .iter()
            .any(|f| f.is_error() && f.message.contains("relative to the service root")));
    }

    #[test]
    fn missing_workdir_and_cmd_are_errors() {
        let findings = run("FROM python:3.11-slim\n");
        assert!(findings
            .iter()
            .any(|f| f.is_error() && f.message == "Missing required instruction: WORKDIR"));
        assert!(findings
            .iter()
            .any(|f| f.is_error() && f.message == "Missing required instruction: CMD"));
        let recommended: Vec<_> = findings
            .iter()
            .filter(|f| !f.is_error() && f.message.starts_with("Recommended instruction"))
            .collect();
        assert_eq!(recommended.len(), 2);
        assert!(recommended.iter().any(|f| f.message.ends_with("EXPOSE")));
        assert!(recommended.iter().any(|f| f.message.ends_with("ENTRYPOINT")));
    }

    #[test]
    fn security_recommendations_are_warnings_and_skippable() {
        // No multi-stage, no USER, no apt cleanup, no EXPOSE, no ENTRYPOINT:
        // five warnings.
        let minimal = run("FROM python:3.11\n");
        let warnings: Vec<_> = minimal.iter().filter(|f| !f.is_error()).collect();
        assert_eq!(warnings.len(), 5);

        // The conformant file structurally satisfies all three.
        let conformant = run(CONFORMANT);
        assert_eq!(conformant.iter().filter(|f| !f.is_error()).count(), 0);
    }

    #[test]
    fn checker_is_idempotent() {
        let catalog = RuleCatalog::default();
        let instructions = parse(CONFORMANT).unwrap();
        let first = check_dockerfile("worker", &instructions, &catalog);
        let second = check_dockerfile("worker", &instructions, &catalog);
        assert_eq!(first, second);
    }
}
