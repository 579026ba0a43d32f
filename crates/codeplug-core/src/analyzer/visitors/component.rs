//! React component style for `.tsx`/`.jsx` files.

use tree_sitter::Node;

use super::Visitor;
use crate::analyzer::parser::ParsedFile;
use crate::analyzer::syntax::{descendants, is_jsx_node, unwrap_parens};
use crate::models::{Dimension, Finding};

pub const FUNCTIONAL_COMPONENTS: &str = "Functional components";
pub const CLASS_COMPONENTS: &str = "Class components";
pub const HOOKS_COMPOSITION: &str = "Hooks composition pattern";

/// Whether a statement block directly returns a JSX element.
fn block_returns_jsx(block: Node<'_>) -> bool {
    let mut cursor = block.walk();
    let found = block.named_children(&mut cursor).any(|stmt| {
        stmt.kind() == "return_statement"
            && stmt
                .named_child(0)
                .map(|arg| is_jsx_node(unwrap_parens(arg)))
                .unwrap_or(false)
    });
    found
}

fn returns_jsx(func: Node<'_>) -> bool {
    let Some(body) = func.child_by_field_name("body") else {
        return false;
    };
    if body.kind() == "statement_block" {
        return block_returns_jsx(body);
    }
    is_jsx_node(unwrap_parens(body))
}

fn extends_component(file: &ParsedFile, class: Node<'_>) -> bool {
    let mut cursor = class.walk();
    let heritage = class
        .named_children(&mut cursor)
        .find(|c| c.kind() == "class_heritage");
    let Some(heritage) = heritage else {
        return false;
    };
    let text = file.text(heritage);
    let base = text
        .trim_start_matches("extends")
        .trim()
        .split(|c: char| c == '<' || c == '{' || c.is_whitespace())
        .next()
        .unwrap_or("");
    base == "Component"
        || base == "PureComponent"
        || base.ends_with(".Component")
        || base.ends_with(".PureComponent")
}

fn is_hook_call(file: &ParsedFile, call: Node<'_>) -> bool {
    let Some(callee) = call.child_by_field_name("function") else {
        return false;
    };
    if callee.kind() != "identifier" {
        return false;
    }
    let name = file.text(callee);
    name.len() > 3
        && name.starts_with("use")
        && name[3..].chars().next().is_some_and(|c| c.is_ascii_uppercase())
}

pub struct ComponentVisitor;

impl Visitor for ComponentVisitor {
    fn name(&self) -> &'static str {
        "component"
    }

    fn visit(&self, file: &ParsedFile) -> Vec<Finding> {
        if !file.is_jsx() {
            return Vec::new();
        }

        let mut functional = false;
        let mut class_based = false;
        let mut hooks = false;

        for node in descendants(file.root()) {
            match node.kind() {
                "function_declaration" | "function_expression" | "function" | "arrow_function" => {
                    functional |= returns_jsx(node);
                }
                "class_declaration" | "class" => {
                    class_based |= extends_component(file, node);
                }
                "call_expression" => {
                    hooks |= is_hook_call(file, node);
                }
                _ => {}
            }
        }

        let mut findings = Vec::new();
        for (present, label) in [
            (functional, FUNCTIONAL_COMPONENTS),
            (class_based, CLASS_COMPONENTS),
            (hooks, HOOKS_COMPOSITION),
        ] {
            if present {
                findings.push(Finding::sample(Dimension::Component, label, true, &file.path));
            }
        }
        findings
    }
}
