use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Severity of a reported deviation.
///
/// Only `Error` findings fail a run; `Warning` findings surface but never
/// flip `passed` to false.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// One reported deviation from the house convention.
///
/// Findings are immutable values: once constructed they carry no ownership
/// beyond the list that holds them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Finding {
    pub severity: Severity,
    /// Artifact identifier the finding is scoped to (service name or file path).
    pub scope: String,
    pub message: String,
}

impl Finding {
    pub fn error<S1: Into<String>, S2: Into<String>>(scope: S1, message: S2) -> Self {
        Self { severity: Severity::Error, scope: scope.into(), message: message.into() }
    }

    pub fn warning<S1: Into<String>, S2: Into<String>>(scope: S1, message: S2) -> Self {
        Self { severity: Severity::Warning, scope: scope.into(), message: message.into() }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Aggregated outcome for one checked target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub target: String,
    pub findings: Vec<Finding>,
    /// True iff no ERROR-severity finding is present.
    pub passed: bool,
}

impl ValidationResult {
    pub fn error_count(&self) -> usize {
        self.findings.iter().filter(|f| f.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.findings.len() - self.error_count()
    }
}

/// One Dockerfile directive: uppercase keyword plus the raw remainder of the
/// logical line, continuation fragments joined with single spaces.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Instruction {
    pub keyword: String,
    pub argument: String,
}

impl Instruction {
    /// Reconstructs the logical line, the form pattern rules match against.
    pub fn logical_line(&self) -> String {
        if self.argument.is_empty() {
            self.keyword.clone()
        } else {
            format!("{} {}", self.keyword, self.argument)
        }
    }
}

/// One `from ... import ...` statement extracted from Python source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImportRecord {
    /// Dotted module path; `None` for a bare `from . import x`.
    pub module: Option<String>,
    /// Relative-import level: 0 = absolute, each leading dot adds one.
    pub level: u32,
    pub names: Vec<String>,
    pub source_file: String,
    /// 1-based source line.
    pub line: usize,
}

impl ImportRecord {
    pub fn is_relative(&self) -> bool {
        self.level > 0
    }
}

/// Facts about one `__init__.py` module relevant to the re-export rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageInitInfo {
    pub path: String,
    pub has_all_declaration: bool,
    pub has_import_from_statements: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_error: Option<String>,
}

/// Output of analyzing one Python source file.
///
/// A parse failure is captured in `parse_error` rather than propagated, so
/// one malformed file never aborts a whole run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceReport {
    pub imports: Vec<ImportRecord>,
    pub has_all_declaration: bool,
    pub has_import_from_statements: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_error: Option<String>,
}

/// One statically-extracted HTTP route definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RouteDoc {
    /// Uppercase HTTP method (GET, POST, ...).
    pub method: String,
    pub path: String,
    /// Name of the decorated handler function.
    pub handler: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docstring: Option<String>,
}

/// One annotated field of a settings class.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SettingsField {
    pub name: String,
    pub annotation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

/// Relative paths under one service root, supplied by the collaborator's
/// filesystem walk. Paths use `/` separators and no leading `./`.
#[derive(Debug, Clone, Default)]
pub struct DirectoryListing {
    files: BTreeSet<String>,
    dirs: BTreeSet<String>,
}

impl DirectoryListing {
    pub fn new<F, D>(files: F, dirs: D) -> Self
    where
        F: IntoIterator,
        F::Item: Into<String>,
        D: IntoIterator,
        D::Item: Into<String>,
    {
        Self {
            files: files.into_iter().map(Into::into).collect(),
            dirs: dirs.into_iter().map(Into::into).collect(),
        }
    }

    pub fn has_file(&self, path: &str) -> bool {
        self.files.contains(path)
    }

    pub fn has_dir(&self, path: &str) -> bool {
        self.dirs.contains(path)
    }

    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(String::as_str)
    }

    pub fn dirs(&self) -> impl Iterator<Item = &str> {
        self.dirs.iter().map(String::as_str)
    }
}
