//! Compose checker.
//!
//! Per-service conventions (build context, environment, volumes,
//! healthcheck, dependency form) plus the project-wide network and shared
//! Poetry configuration rules. Requirements derived from the Python-service
//! name heuristic are warnings: the classification can false-positive and
//! must never fail a run on its own.

use crate::catalog::RuleCatalog;
use crate::compose::{BuildSpec, ComposeFile, ComposeService, DependsOn};
use crate::types::Finding;
use tracing::debug;

const COMPOSE_SCOPE: &str = "docker-compose";

/// Checks a whole compose file. Findings are scoped to the service they
/// concern, or to the compose file itself for project-wide rules.
pub fn check_compose(compose: &ComposeFile, catalog: &RuleCatalog) -> Vec<Finding> {
    let mut findings = Vec::new();

    check_networks(compose, catalog, &mut findings);

    for (name, service) in &compose.services {
        check_service_entry(name, service, catalog, &mut findings);
    }

    let any_python = compose.services.keys().any(|name| catalog.is_python_service(name));
    if any_python && compose.poetry_extension.is_none() {
        findings.push(Finding::warning(
            COMPOSE_SCOPE,
            format!(
                "Missing {} extension block for shared Poetry configuration",
                catalog.poetry_extension_key
            ),
        ));
    }

    debug!(services = compose.services.len(), count = findings.len(), "compose check complete");
    findings
}

fn check_networks(compose: &ComposeFile, catalog: &RuleCatalog, findings: &mut Vec<Finding>) {
    let Some(networks) = &compose.networks else {
        findings.push(Finding::error(COMPOSE_SCOPE, "Missing top-level networks configuration"));
        return;
    };
    if !networks.contains_key(catalog.required_network) {
        findings.push(Finding::error(
            COMPOSE_SCOPE,
            format!("Missing required network: {}", catalog.required_network),
        ));
    }
}

fn check_service_entry(
    name: &str,
    service: &ComposeService,
    catalog: &RuleCatalog,
    findings: &mut Vec<Finding>,
) {
    let is_python = catalog.is_python_service(name);

    for key in catalog.required_service_keys {
        let present = match key {
            "build" => service.build.is_some(),
            "environment" => service.environment.is_some(),
            "volumes" => service.volumes.is_some(),
            "healthcheck" => service.healthcheck.is_some(),
            _ => true,
        };
        if !present {
            findings.push(Finding::error(name, format!("Missing required key: {key}")));
        }
    }

    if let Some(build) = &service.build {
        check_build(name, build, catalog, findings);
    }

    if let Some(environment) = &service.environment {
        if !environment.has_key(catalog.required_service_env_key) {
            findings.push(Finding::error(
                name,
                format!(
                    "Missing required environment variable: {}",
                    catalog.required_service_env_key
                ),
            ));
        }
    }
    let has_pythonpath = service
        .environment
        .as_ref()
        .is_some_and(|env| env.has_key("PYTHONPATH"));
    if is_python && !has_pythonpath {
        findings.push(Finding::warning(
            name,
            "Python service should define PYTHONPATH environment variable",
        ));
    }

    if service.volumes.is_some() {
        let strings = service.volume_strings();
        if !strings.iter().any(|v| v.contains(catalog.source_mount_point)) {
            findings.push(Finding::error(
                name,
                format!("Service must mount source code to {}", catalog.source_mount_point),
            ));
        }
        let manifest_mounted = strings
            .iter()
            .any(|v| catalog.manifest_files.iter().any(|f| v.contains(f)));
        if is_python && !manifest_mounted {
            findings.push(Finding::warning(
                name,
                "Python service should mount pyproject.toml/poetry.lock for development",
            ));
        }
    }

    if let Some(healthcheck) = &service.healthcheck {
        for key in healthcheck.missing_keys(&catalog.required_healthcheck_keys) {
            findings.push(Finding::error(name, format!("Healthcheck is missing: {key}")));
        }
    }

    if is_python {
        let has_poetry_args = service.build.as_ref().and_then(BuildSpec::args).is_some_and(|args| {
            args.keys().any(|arg| arg.to_lowercase().contains("poetry"))
        });
        if !has_poetry_args {
            findings.push(Finding::warning(
                name,
                "Python service should include Poetry-related build args",
            ));
        }
    }

    match &service.depends_on {
        Some(DependsOn::List(_)) => {
            findings.push(Finding::error(
                name,
                "depends_on should use the condition map form with healthcheck conditions",
            ));
        }
        Some(DependsOn::Map(deps)) => {
            for (dep, entry) in deps {
                if entry.condition.is_none() {
                    findings.push(Finding::error(
                        name,
                        format!("Dependency on '{dep}' should specify a condition"),
                    ));
                }
            }
        }
        None => {}
    }
}

fn check_build(
    name: &str,
    build: &BuildSpec,
    catalog: &RuleCatalog,
    findings: &mut Vec<Finding>,
) {
    let Some(context) = build.context() else {
        findings.push(Finding::error(name, "Build is missing context"));
        return;
    };

    if name == catalog.dev_service_name {
        if !catalog.dev_service_contexts.contains(&context) {
            findings.push(Finding::error(
                name,
                format!(
                    "Dev container build context should be one of [{}]",
                    catalog.dev_service_contexts.join(", ")
                ),
            ));
        }
        if let Some(dockerfile) = build.dockerfile() {
            if !catalog.dev_service_dockerfiles.contains(&dockerfile) {
                findings.push(Finding::error(
                    name,
                    format!(
                        "Dev container dockerfile should be one of [{}]",
                        catalog.dev_service_dockerfiles.join(", ")
                    ),
                ));
            }
        }
        return;
    }

    let service_context = format!("{}/{name}", catalog.containers_root);
    if context != service_context && context != "." {
        findings.push(Finding::error(
            name,
            format!("Build context should be '{service_context}' or '.'"),
        ));
    }
    match build.dockerfile() {
        Some(dockerfile) => {
            if context == service_context && dockerfile != "Dockerfile" {
                findings.push(Finding::error(
                    name,
                    "When using the service context, dockerfile should be 'Dockerfile'",
                ));
            }
            let root_prefix = format!("containers/{name}/");
            if context == "." && !dockerfile.starts_with(&root_prefix) {
                findings.push(Finding::error(
                    name,
                    format!(
                        "When using the root context, dockerfile should start with '{root_prefix}'"
                    ),
                ));
            }
        }
        None => {
            findings.push(Finding::error(name, "Build is missing dockerfile path"));
        }
    }
}
