//! Python source analyzer using tree-sitter.
//!
//! Walks the syntax tree once, collecting `from ... import ...` statements
//! and `__all__` assignments, without ever executing the analyzed code. A
//! file that fails to parse is reported, not propagated.

use crate::types::{ImportRecord, SourceReport};
use std::cell::RefCell;
use tree_sitter::{Node, Parser};

pub struct SourceAnalyzer {
    parser: RefCell<Parser>,
}

impl Default for SourceAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceAnalyzer {
    /// Creates a new analyzer with the tree-sitter Python grammar.
    pub fn new() -> Self {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .expect("python grammar");
        Self { parser: RefCell::new(parser) }
    }

    /// Analyzes one source file's text.
    pub fn analyze(&self, source_file: &str, content: &str) -> SourceReport {
        let mut report = SourceReport::default();

        let tree = match self.parser.borrow_mut().parse(content, None) {
            Some(tree) => tree,
            None => {
                report.parse_error = Some("parser produced no tree".to_string());
                return report;
            }
        };

        let root = tree.root_node();
        if root.has_error() {
            report.parse_error = Some(match first_error_line(root) {
                Some(line) => format!("syntax error near line {line}"),
                None => "syntax error".to_string(),
            });
        }

        collect(root, content.as_bytes(), source_file, &mut report);
        report
    }
}

fn collect(node: Node, source: &[u8], source_file: &str, report: &mut SourceReport) {
    match node.kind() {
        "import_from_statement" => {
            report.has_import_from_statements = true;
            if let Some(record) = import_record(node, source, source_file) {
                report.imports.push(record);
            }
        }
        "assignment" => {
            if let Some(left) = node.child_by_field_name("left") {
                if left.kind() == "identifier" && node_text(left, source) == "__all__" {
                    report.has_all_declaration = true;
                }
            }
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect(child, source, source_file, report);
    }
}

fn import_record(node: Node, source: &[u8], source_file: &str) -> Option<ImportRecord> {
    let module_node = node.child_by_field_name("module_name")?;

    let (module, level) = match module_node.kind() {
        "dotted_name" => (Some(node_text(module_node, source).to_string()), 0),
        "relative_import" => {
            let mut level = 0u32;
            let mut module = None;
            let mut cursor = module_node.walk();
            for child in module_node.children(&mut cursor) {
                match child.kind() {
                    "import_prefix" => {
                        level = node_text(child, source).chars().filter(|c| *c == '.').count() as u32;
                    }
                    "dotted_name" => module = Some(node_text(child, source).to_string()),
                    _ => {}
                }
            }
            (module, level)
        }
        _ => (None, 0),
    };

    let mut names = Vec::new();
    let mut cursor = node.walk();
    for name_node in node.children_by_field_name("name", &mut cursor) {
        let text = match name_node.kind() {
            "aliased_import" => name_node
                .child_by_field_name("name")
                .map(|n| node_text(n, source).to_string()),
            _ => Some(node_text(name_node, source).to_string()),
        };
        if let Some(text) = text {
            names.push(text);
        }
    }
    if names.is_empty() {
        let mut cursor = node.walk();
        if node.children(&mut cursor).any(|c| c.kind() == "wildcard_import") {
            names.push("*".to_string());
        }
    }

    Some(ImportRecord {
        module,
        level,
        names,
        source_file: source_file.to_string(),
        line: node.start_position().row + 1,
    })
}

fn node_text<'a>(node: Node, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

fn first_error_line(node: Node) -> Option<usize> {
    if node.is_error() {
        return Some(node.start_position().row + 1);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(line) = first_error_line(child) {
            return Some(line);
        }
    }
    None
}
