//! Hardcoded secret/configuration scanner.
//!
//! Line-oriented pattern scan over raw file text. The pattern table and its
//! safe-value lists live in the catalog as data; comment lines are skipped.
//! Findings are warnings: the safe defaults are deliberately loose and the
//! caller decides what to do with the report.

use crate::catalog::RuleCatalog;
use crate::types::Finding;

pub fn check_secrets(path: &str, content: &str, catalog: &RuleCatalog) -> Vec<Finding> {
    let mut findings = Vec::new();

    for (idx, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || catalog.comment_prefixes.iter().any(|p| line.starts_with(p)) {
            continue;
        }

        for rule in &catalog.secret_rules {
            for caps in rule.pattern.captures_iter(line) {
                let value = caps
                    .get(1)
                    .or_else(|| caps.get(0))
                    .map(|m| m.as_str())
                    .unwrap_or("");
                if rule.safe_values.iter().any(|safe| safe == value) {
                    continue;
                }
                findings.push(Finding::warning(
                    path,
                    format!("Possible hardcoded {} in {path}:{}: {line}", rule.id, idx + 1),
                ));
            }
        }
    }

    findings
}
