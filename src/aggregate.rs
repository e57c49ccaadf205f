//! Finding aggregation.

use crate::types::{Finding, ValidationResult};

/// Merges the finding lists for one target into a [`ValidationResult`].
///
/// Per-checker order is preserved and nothing is deduplicated: identical
/// findings from two checkers both surface. `passed` is true iff no
/// ERROR-severity finding is present; warnings never fail a run.
pub fn aggregate<T, I>(target: T, finding_lists: I) -> ValidationResult
where
    T: Into<String>,
    I: IntoIterator<Item = Vec<Finding>>,
{
    let findings: Vec<Finding> = finding_lists.into_iter().flatten().collect();
    let passed = !findings.iter().any(Finding::is_error);
    ValidationResult { target: target.into(), findings, passed }
}
