//! Static API-surface extraction.
//!
//! Pulls decorated route definitions and annotated settings-class fields out
//! of Python source by syntax-tree inspection, so documentation collaborators
//! never have to import and execute target-repository modules.

use crate::types::{RouteDoc, SettingsField};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::sync::LazyLock;
use tree_sitter::{Node, Parser};

/// Matches `@app.get("/path")`-style route decorators.
static ROUTE_DECORATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^@\w+\.(get|post|put|delete|patch|head|options)\(\s*["']([^"']+)["']"#)
        .expect("route decorator pattern")
});

/// Everything extracted from one source file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiSurface {
    pub routes: Vec<RouteDoc>,
    pub settings: Vec<SettingsField>,
}

pub struct ApiAnalyzer {
    parser: RefCell<Parser>,
}

impl Default for ApiAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiAnalyzer {
    pub fn new() -> Self {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .expect("python grammar");
        Self { parser: RefCell::new(parser) }
    }

    /// Extracts routes and settings fields. Unparsable source yields an
    /// empty surface.
    pub fn analyze(&self, content: &str) -> ApiSurface {
        let mut surface = ApiSurface::default();
        let Some(tree) = self.parser.borrow_mut().parse(content, None) else {
            return surface;
        };
        walk(tree.root_node(), content.as_bytes(), &mut surface);
        surface
    }
}

fn walk(node: Node, source: &[u8], surface: &mut ApiSurface) {
    match node.kind() {
        "decorated_definition" => collect_route(node, source, surface),
        "class_definition" => collect_settings(node, source, surface),
        _ => {}
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk(child, source, surface);
    }
}

fn collect_route(node: Node, source: &[u8], surface: &mut ApiSurface) {
    let Some(definition) = node.child_by_field_name("definition") else { return };
    if definition.kind() != "function_definition" {
        return;
    }
    let handler = definition
        .child_by_field_name("name")
        .map(|n| text(n, source).to_string())
        .unwrap_or_default();

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() != "decorator" {
            continue;
        }
        if let Some(caps) = ROUTE_DECORATOR.captures(text(child, source)) {
            surface.routes.push(RouteDoc {
                method: caps[1].to_ascii_uppercase(),
                path: caps[2].to_string(),
                handler: handler.clone(),
                docstring: docstring(definition, source),
            });
        }
    }
}

fn collect_settings(node: Node, source: &[u8], surface: &mut ApiSurface) {
    let Some(name) = node.child_by_field_name("name") else { return };
    if !text(name, source).ends_with("Settings") {
        return;
    }
    let Some(body) = node.child_by_field_name("body") else { return };

    let mut cursor = body.walk();
    for statement in body.named_children(&mut cursor) {
        if statement.kind() != "expression_statement" {
            continue;
        }
        let Some(assignment) = statement.named_child(0).filter(|n| n.kind() == "assignment")
        else {
            continue;
        };
        let Some(annotation) = assignment.child_by_field_name("type") else { continue };
        let Some(left) = assignment.child_by_field_name("left") else { continue };
        if left.kind() != "identifier" {
            continue;
        }
        surface.settings.push(SettingsField {
            name: text(left, source).to_string(),
            annotation: text(annotation, source).to_string(),
            default: assignment
                .child_by_field_name("right")
                .map(|n| text(n, source).to_string()),
        });
    }
}

/// First statement of the body, when it is a bare string literal.
fn docstring(definition: Node, source: &[u8]) -> Option<String> {
    let body = definition.child_by_field_name("body")?;
    let first = body.named_child(0)?;
    if first.kind() != "expression_statement" {
        return None;
    }
    let string = first.named_child(0).filter(|n| n.kind() == "string")?;
    let raw = text(string, source);
    let trimmed = raw.trim_matches(|c| c == '"' || c == '\'').trim();
    Some(trimmed.to_string())
}

fn text<'a>(node: Node, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}
