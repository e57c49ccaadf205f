//! The rule catalog: one immutable table of every required, recommended and
//! prohibited convention, built once at startup and passed by reference into
//! every checker call.

use crate::types::Severity;
use regex::Regex;

/// Which artifact kind a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Dockerfile,
    ComposeService,
    Manifest,
    Directory,
}

/// How a rule's pattern is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    /// Some line must match `pattern` (and not `exempt`).
    RequiredPattern,
    /// No line may match `pattern` unless it also matches `exempt`.
    ProhibitedPattern,
    /// Presence-only rule; no pattern involved.
    RequiredPresent,
}

/// One pattern-driven rule.
///
/// The `exempt` pattern stands in for the regex look-aheads the original
/// convention set was written with: a prohibited pattern fires only when
/// `pattern` matches and `exempt` does not, and a required pattern is only
/// satisfied by a line matching `pattern` but not `exempt`.
#[derive(Debug, Clone)]
pub struct RuleSpec {
    pub id: &'static str,
    pub applies_to: ArtifactKind,
    pub kind: RuleKind,
    pub severity: Severity,
    pub pattern: Option<Regex>,
    pub exempt: Option<Regex>,
    pub description: &'static str,
}

impl RuleSpec {
    /// True if `line` triggers this rule when interpreted as prohibited, or
    /// satisfies it when interpreted as required.
    pub fn matches_line(&self, line: &str) -> bool {
        let Some(pattern) = &self.pattern else { return false };
        if !pattern.is_match(line) {
            return false;
        }
        match &self.exempt {
            Some(exempt) => !exempt.is_match(line),
            None => true,
        }
    }
}

/// One secret-scanner pattern with its configurable safe-value list.
#[derive(Debug, Clone)]
pub struct SecretRule {
    pub id: &'static str,
    pub pattern: Regex,
    /// Values never reported (common development defaults).
    pub safe_values: Vec<String>,
}

/// The complete, read-only convention set.
///
/// Constructed once (all regexes compiled here) and never mutated; sharing a
/// reference across threads is safe.
#[derive(Debug)]
pub struct RuleCatalog {
    /// Allowed base-image prefixes for the first FROM instruction.
    pub base_image_prefixes: Vec<&'static str>,
    /// ENV keys every Dockerfile must declare somewhere.
    pub required_env_keys: Vec<&'static str>,
    /// Substrings identifying the Poetry bootstrap RUN line.
    pub poetry_bootstrap_markers: Vec<&'static str>,
    /// Substring identifying the dependency install RUN line.
    pub poetry_install_marker: &'static str,
    /// Manifest file names a COPY instruction must reference together.
    pub manifest_files: [&'static str; 2],
    /// Flags a HEALTHCHECK argument must carry.
    pub healthcheck_flags: [&'static str; 3],
    /// LABEL keys that must be covered across LABEL instructions.
    pub required_labels: Vec<&'static str>,
    /// Instructions every Dockerfile must contain, beyond what the FROM,
    /// Poetry and manifest-COPY checks already require.
    pub required_instructions: [&'static str; 2],
    /// Instructions recommended for a complete image definition.
    pub recommended_instructions: [&'static str; 2],
    /// Pattern rules (prohibitions and security recommendations).
    rules: Vec<RuleSpec>,

    /// Top-level keys every compose service must declare.
    pub required_service_keys: [&'static str; 4],
    /// Keys every compose healthcheck block must declare.
    pub required_healthcheck_keys: [&'static str; 4],
    /// Network name that must exist at the compose top level.
    pub required_network: &'static str,
    /// Environment key required whenever a service declares environment.
    pub required_service_env_key: &'static str,
    /// Container path the service source must be mounted at.
    pub source_mount_point: &'static str,
    /// Name keywords classifying a service as a Python service. Heuristic,
    /// substring-matched against the lowercased service name.
    pub python_service_keywords: Vec<&'static str>,
    /// The development-environment service exempted from the standard
    /// build-context convention, and the contexts it may use.
    pub dev_service_name: &'static str,
    pub dev_service_contexts: Vec<&'static str>,
    pub dev_service_dockerfiles: Vec<&'static str>,
    /// Directory all service build contexts live under.
    pub containers_root: &'static str,
    /// Top-level extension key carrying shared Poetry configuration.
    pub poetry_extension_key: &'static str,

    /// Dotted sections a manifest must contain.
    pub required_manifest_sections: Vec<&'static str>,
    /// Fields required under `tool.poetry`.
    pub required_manifest_fields: Vec<&'static str>,
    /// Required prefix of the Python version constraint.
    pub python_constraint_prefix: &'static str,
    /// Dependency files that must not exist alongside the manifest.
    pub legacy_dependency_files: Vec<&'static str>,

    /// Files every service root must contain.
    pub required_files: Vec<&'static str>,
    /// Directories every service root must contain.
    pub required_dirs: Vec<&'static str>,
    /// Service names exempt from the Dockerfile requirement.
    pub utility_services: Vec<&'static str>,
    /// Directory names skipped during package walks.
    pub excluded_dirs: Vec<&'static str>,

    /// Absolute import prefixes that are deprecated.
    pub deprecated_import_prefixes: Vec<&'static str>,

    /// Secret-scanner patterns with safe defaults. Data, not logic: callers
    /// may rebuild the catalog with a different table.
    pub secret_rules: Vec<SecretRule>,
    /// Line prefixes treated as comments by the secret scanner.
    pub comment_prefixes: Vec<&'static str>,
}

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static rule pattern")
}

impl Default for RuleCatalog {
    fn default() -> Self {
        Self {
            base_image_prefixes: vec!["python:3.11"],
            required_env_keys: vec![
                "PYTHONUNBUFFERED",
                "PYTHONDONTWRITEBYTECODE",
                "POETRY_VERSION",
                "POETRY_HOME",
                "POETRY_VIRTUALENVS_IN_PROJECT",
                "POETRY_NO_INTERACTION",
                "PYSETUP_PATH",
                "VENV_PATH",
            ],
            poetry_bootstrap_markers: vec![
                "curl -sSL https://install.python-poetry.org",
                "pip install poetry",
            ],
            poetry_install_marker: "poetry install",
            manifest_files: ["pyproject.toml", "poetry.lock"],
            healthcheck_flags: ["--interval", "--timeout", "--retries"],
            required_labels: vec!["maintainer", "version", "description"],
            required_instructions: ["WORKDIR", "CMD"],
            recommended_instructions: ["EXPOSE", "ENTRYPOINT"],
            rules: vec![
                RuleSpec {
                    id: "docker/prohibit/npm-global",
                    applies_to: ArtifactKind::Dockerfile,
                    kind: RuleKind::ProhibitedPattern,
                    severity: Severity::Error,
                    pattern: Some(re(r"(?i)npm install -g")),
                    exempt: None,
                    description: "Global npm installs are prohibited",
                },
                RuleSpec {
                    id: "docker/prohibit/apt-recommends",
                    applies_to: ArtifactKind::Dockerfile,
                    kind: RuleKind::ProhibitedPattern,
                    severity: Severity::Error,
                    pattern: Some(re(r"(?i)apt-get (install|update)")),
                    exempt: Some(re(r"--no-install-recommends")),
                    description: "apt-get must use --no-install-recommends",
                },
                RuleSpec {
                    id: "docker/prohibit/pip-cache",
                    applies_to: ArtifactKind::Dockerfile,
                    kind: RuleKind::ProhibitedPattern,
                    severity: Severity::Error,
                    pattern: Some(re(r"(?i)\bpip install\b")),
                    exempt: Some(re(r"--no-cache-dir")),
                    description: "pip install must use --no-cache-dir",
                },
                RuleSpec {
                    id: "docker/prohibit/copy-absolute",
                    applies_to: ArtifactKind::Dockerfile,
                    kind: RuleKind::ProhibitedPattern,
                    severity: Severity::Error,
                    pattern: Some(re(r"(?i)^COPY\s+\S*containers/")),
                    exempt: None,
                    description: "COPY must use paths relative to the service root",
                },
                RuleSpec {
                    id: "docker/recommend/multi-stage",
                    applies_to: ArtifactKind::Dockerfile,
                    kind: RuleKind::RequiredPattern,
                    severity: Severity::Warning,
                    pattern: Some(re(r"(?i)^FROM\s+\S+\s+as\s+\S+")),
                    exempt: None,
                    description: "Multi-stage builds recommended for smaller images",
                },
                RuleSpec {
                    id: "docker/recommend/non-root-user",
                    applies_to: ArtifactKind::Dockerfile,
                    kind: RuleKind::RequiredPattern,
                    severity: Severity::Warning,
                    pattern: Some(re(r"(?i)^USER\s+\S+")),
                    exempt: Some(re(r"(?i)^USER\s+root\b")),
                    description: "Using non-root user recommended for security",
                },
                RuleSpec {
                    id: "docker/recommend/apt-cleanup",
                    applies_to: ArtifactKind::Dockerfile,
                    kind: RuleKind::RequiredPattern,
                    severity: Severity::Warning,
                    pattern: Some(re(r"rm -rf /var/lib/apt/lists/\*")),
                    exempt: None,
                    description: "Clean up apt cache to reduce image size",
                },
            ],

            required_service_keys: ["build", "environment", "volumes", "healthcheck"],
            required_healthcheck_keys: ["test", "interval", "timeout", "retries"],
            required_network: "platform-net",
            required_service_env_key: "ENV",
            source_mount_point: "/app",
            python_service_keywords: vec![
                "python", "django", "flask", "fastapi", "celery", "worker", "api", "service",
                "app", "backend", "foundation", "agent", "model", "processor", "analyzer",
            ],
            dev_service_name: "dev",
            dev_service_contexts: vec!["./containers/dev-environment", ".", "../.."],
            dev_service_dockerfiles: vec!["Dockerfile", "containers/dev-environment/Dockerfile"],
            containers_root: "./containers",
            poetry_extension_key: "x-poetry",

            required_manifest_sections: vec![
                "tool.poetry",
                "tool.poetry.dependencies",
                "tool.poetry.group.dev.dependencies",
                "build-system",
                "tool.pytest.ini_options",
                "tool.black",
                "tool.isort",
                "tool.mypy",
                "tool.coverage.run",
                "tool.coverage.report",
            ],
            required_manifest_fields: vec!["name", "version", "description"],
            python_constraint_prefix: "^3.11",
            legacy_dependency_files: vec!["requirements.txt", "setup.py"],

            required_files: vec!["Dockerfile", "pyproject.toml", "README.md", "tests/conftest.py"],
            required_dirs: vec!["src", "tests", "tests/unit", "tests/integration"],
            utility_services: vec!["common", "tools", "monitoring", "resource_monitor"],
            excluded_dirs: vec![
                "__pycache__",
                ".pytest_cache",
                ".mypy_cache",
                ".venv",
                ".tox",
                ".eggs",
                "node_modules",
                "build",
                "dist",
                "coverage",
            ],

            deprecated_import_prefixes: vec!["containers."],

            secret_rules: vec![
                SecretRule {
                    id: "port",
                    pattern: re(r"(?:^|\s|=)(\d{2,5})(?:\s|$|:)"),
                    safe_values: vec!["80".into(), "443".into(), "3000".into(), "8080".into()],
                },
                SecretRule {
                    id: "password",
                    pattern: re(r#"(?i)(?:password|passwd|pwd)\s*[=:]\s*["']?([^"'\s]+)["']?"#),
                    safe_values: vec!["postgres".into()],
                },
                SecretRule {
                    id: "username",
                    pattern: re(r#"(?i)(?:username|user|uname)\s*[=:]\s*["']?([^"'\s]+)["']?"#),
                    safe_values: vec!["postgres".into(), "root".into(), "admin".into()],
                },
                SecretRule {
                    id: "api_key",
                    pattern: re(r#"(?i)(?:api[_-]?key|token|secret)\s*[=:]\s*["']?([^"'\s]+)["']?"#),
                    safe_values: Vec::new(),
                },
                SecretRule {
                    id: "url",
                    pattern: re(r#"(?i)(?:url|host|endpoint)\s*[=:]\s*["']?(https?://[^"'\s]+)["']?"#),
                    safe_values: vec![
                        "localhost".into(),
                        "127.0.0.1".into(),
                        "0.0.0.0".into(),
                    ],
                },
                SecretRule {
                    id: "email",
                    pattern: re(r"[\w.-]+@[\w.-]+\.\w+"),
                    safe_values: Vec::new(),
                },
                SecretRule {
                    id: "ip_address",
                    pattern: re(r"\b\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}\b"),
                    safe_values: vec!["127.0.0.1".into(), "0.0.0.0".into()],
                },
            ],
            comment_prefixes: vec!["#", "//", "/*", "*", "--"],
        }
    }
}

impl RuleCatalog {
    /// Pattern rules applying to the given artifact kind, in declaration order.
    pub fn rules_for(&self, kind: ArtifactKind) -> impl Iterator<Item = &RuleSpec> {
        self.rules.iter().filter(move |r| r.applies_to == kind)
    }

    /// True if the service name matches the Python-service heuristic.
    ///
    /// This is an enumerable keyword heuristic, not an exact contract: a
    /// name like `worker-api` matches, `gateway` does not.
    pub fn is_python_service(&self, service_name: &str) -> bool {
        let lowered = service_name.to_lowercase();
        self.python_service_keywords.iter().any(|kw| lowered.contains(kw))
    }

    /// True if the service is a utility container exempt from the
    /// Dockerfile requirement.
    pub fn is_utility_service(&self, service_name: &str) -> bool {
        self.utility_services.contains(&service_name)
    }

    /// True if the directory name (or any path component) is excluded from
    /// package walks.
    pub fn is_excluded_dir(&self, component: &str) -> bool {
        component.starts_with('.') || self.excluded_dirs.contains(&component)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn python_service_heuristic_matches_keywords() {
        let catalog = RuleCatalog::default();
        assert!(catalog.is_python_service("worker-api"));
        assert!(catalog.is_python_service("Model-Trainer"));
        assert!(!catalog.is_python_service("gateway"));
        assert!(!catalog.is_python_service("redis"));
    }

    #[test]
    fn exempt_pattern_suppresses_prohibition() {
        let catalog = RuleCatalog::default();
        let apt = catalog
            .rules_for(ArtifactKind::Dockerfile)
            .find(|r| r.id == "docker/prohibit/apt-recommends")
            .unwrap();
        assert!(apt.matches_line("RUN apt-get install curl"));
        assert!(!apt.matches_line("RUN apt-get install --no-install-recommends curl"));
    }

    #[test]
    fn non_root_user_rule_rejects_root() {
        let catalog = RuleCatalog::default();
        let user = catalog
            .rules_for(ArtifactKind::Dockerfile)
            .find(|r| r.id == "docker/recommend/non-root-user")
            .unwrap();
        assert!(user.matches_line("USER appuser"));
        assert!(!user.matches_line("USER root"));
    }

    #[test]
    fn excluded_dirs_include_hidden() {
        let catalog = RuleCatalog::default();
        assert!(catalog.is_excluded_dir("__pycache__"));
        assert!(catalog.is_excluded_dir(".git"));
        assert!(!catalog.is_excluded_dir("src"));
    }
}
