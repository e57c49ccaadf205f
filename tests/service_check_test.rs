//! End-to-end service checks over in-memory artifacts: a fully conformant
//! service passes, and a non-conformant one surfaces findings from every
//! checker in a single pass.

use hullcheck::{
    aggregate, check_compose, check_service, ComposeFile, DirectoryListing, RuleCatalog,
    ServiceArtifacts, Severity,
};
use std::collections::BTreeMap;

const DOCKERFILE: &str = r#"FROM python:3.11-slim AS builder
LABEL maintainer=platform-team version=1.0.0 description=worker-service

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
USER worker
EXPOSE 8080
HEALTHCHECK --interval=5s --timeout=3s --retries=3 CMD curl -f http://localhost/health
ENTRYPOINT ["poetry", "run"]
CMD ["python", "-m", "worker"]
"#;

const MANIFEST: &str = r#"
[tool.poetry]
name = "worker-api"
version = "0.1.0"
description = "Background worker"

[tool.poetry.dependencies]
python = "^3.11"

[tool.poetry.group.dev.dependencies]
pytest = "^8.0"

[build-system]
requires = ["poetry-core"]

[tool.pytest.ini_options]
testpaths = ["tests"]

[tool.black]
line-length = 88

[tool.isort]
profile = "black"

[tool.mypy]
strict = true

[tool.coverage.run]
source = ["src"]

[tool.coverage.report]
fail_under = 80
"#;

const COMPOSE: &str = r#"
x-poetry:
  POETRY_VERSION: "1.7.1"

services:
  worker-api:
    build:
      context: ./containers/worker-api
      dockerfile: Dockerfile
      args:
        POETRY_VERSION: "1.7.1"
    environment:
      ENV: dev
      PYTHONPATH: /app/src
    volumes:
      - ./containers/worker-api/src:/app/src
      - ./containers/worker-api/pyproject.toml:/app/pyproject.toml
    healthcheck:
      test: ["CMD", "curl", "-f", "http://localhost/health"]
      interval: 5s
      timeout: 3s
      retries: 3

networks:
  platform-net: {}
"#;

fn conformant_listing() -> DirectoryListing {
    DirectoryListing::new(
        ["Dockerfile", "pyproject.toml", "README.md", "tests/conftest.py"],
        ["src", "src/worker-api", "tests", "tests/unit", "tests/integration"],
    )
}

fn conformant_sources() -> BTreeMap<String, String> {
    let mut sources = BTreeMap::new();
    sources.insert(
        "src/worker-api/__init__.py".to_string(),
        "from worker_api.core import run\n\n__all__ = [\"run\"]\n".to_string(),
    );
    sources.insert(
        "src/worker-api/core.py".to_string(),
        "import logging\n\n\ndef run():\n    logging.info(\"running\")\n".to_string(),
    );
    sources.insert("tests/__init__.py".to_string(), String::new());
    sources.insert("tests/conftest.py".to_string(), "import pytest\n".to_string());
    sources
}

#[test]
fn conformant_service_passes() {
    let catalog = RuleCatalog::default();
    let manifest: toml::Value = toml::from_str(MANIFEST).unwrap();
    let listing = conformant_listing();
    let sources = conformant_sources();

    let result = check_service(
        &ServiceArtifacts {
            name: "worker-api",
            dockerfile: Some(DOCKERFILE),
            manifest: Some(&manifest),
            listing: &listing,
            sources: &sources,
        },
        &catalog,
    );

    assert!(result.passed, "expected pass, findings: {:?}", result.findings);
    assert_eq!(result.error_count(), 0);
}

#[test]
fn non_conformant_service_surfaces_findings_from_every_checker() {
    let catalog = RuleCatalog::default();
    let listing = DirectoryListing::new(
        ["Dockerfile", "requirements.txt"],
        ["src", "src/worker-api", "tests"],
    );
    let mut sources = BTreeMap::new();
    sources.insert(
        "src/worker-api/util.py".to_string(),
        "from . import helper\nfrom containers.foundation.db import engine\n".to_string(),
    );

    let result = check_service(
        &ServiceArtifacts {
            name: "worker-api",
            dockerfile: Some("FROM node:18\nRUN npm install -g yarn\n"),
            manifest: None,
            listing: &listing,
            sources: &sources,
        },
        &catalog,
    );

    assert!(!result.passed);
    let messages: Vec<&str> = result.findings.iter().map(|f| f.message.as_str()).collect();

    // Structure checker.
    assert!(messages.iter().any(|m| m.contains("Missing required file: README.md")));
    // Manifest checker: legacy file plus missing manifest.
    assert!(messages.iter().any(|m| m.contains("requirements.txt found")));
    assert!(messages.iter().any(|m| m.contains("Missing pyproject.toml")));
    // Dockerfile checker.
    assert!(messages.iter().any(|m| m.contains("Base image")));
    assert!(messages.iter().any(|m| m.contains("Global npm installs")));
    // Package checker: missing __init__, relative and deprecated imports.
    assert!(messages.iter().any(|m| m.contains("Missing __init__.py")));
    assert!(messages.iter().any(|m| m.contains("Relative import")));
    assert!(messages.iter().any(|m| m.contains("Deprecated import format")));
}

#[test]
fn checks_are_idempotent_over_immutable_artifacts() {
    let catalog = RuleCatalog::default();
    let manifest: toml::Value = toml::from_str(MANIFEST).unwrap();
    let listing = conformant_listing();
    let sources = conformant_sources();
    let artifacts = ServiceArtifacts {
        name: "worker-api",
        dockerfile: Some(DOCKERFILE),
        manifest: Some(&manifest),
        listing: &listing,
        sources: &sources,
    };

    let first = check_service(&artifacts, &catalog);
    let second = check_service(&artifacts, &catalog);
    assert_eq!(first.findings, second.findings);
    assert_eq!(first.passed, second.passed);
}

#[test]
fn conformant_compose_passes_and_results_serialize() {
    let catalog = RuleCatalog::default();
    let compose: ComposeFile = serde_yaml::from_str(COMPOSE).unwrap();
    let findings = check_compose(&compose, &catalog);
    let result = aggregate("docker-compose", [findings]);
    assert!(result.passed, "findings: {:?}", result.findings);

    let json = serde_json::to_string(&result).unwrap();
    assert!(json.contains("\"target\":\"docker-compose\""));
}

#[test]
fn compose_python_service_without_pythonpath_warns_but_run_passes() {
    let catalog = RuleCatalog::default();
    let compose: ComposeFile = serde_yaml::from_str(
        "services:\n  worker-api:\n    build:\n      context: ./containers/worker-api\n      dockerfile: Dockerfile\n      args:\n        POETRY_VERSION: \"1.7.1\"\n    environment:\n      ENV: dev\n    volumes:\n      - ./containers/worker-api/pyproject.toml:/app/pyproject.toml\n      - ./containers/worker-api/src:/app/src\n    healthcheck:\n      test: [\"CMD\", \"true\"]\n      interval: 5s\n      timeout: 3s\n      retries: 3\nnetworks:\n  platform-net: {}\nx-poetry:\n  POETRY_VERSION: \"1.7.1\"\n",
    )
    .unwrap();

    let findings = check_compose(&compose, &catalog);
    let pythonpath: Vec<_> =
        findings.iter().filter(|f| f.message.contains("PYTHONPATH")).collect();
    assert_eq!(pythonpath.len(), 1);
    assert_eq!(pythonpath[0].severity, Severity::Warning);
    assert!(aggregate("docker-compose", [findings]).passed);
}
