//! Syntax-tree helpers shared by the visitors and the semantic pass.

use tree_sitter::Node;

use crate::analyzer::parser::ParsedFile;
use crate::models::ExportKind;

/// Pre-order traversal of `node` and all of its descendants.
///
/// Uses an explicit stack, so deeply nested trees cannot overflow the call stack.
pub fn descendants<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut out = Vec::new();
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
        out.push(current);
        let mut cursor = current.walk();
        let children: Vec<Node<'t>> = current.named_children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    out
}

/// Whether `node` has an anonymous child token with the given text (e.g. `async`, `default`).
pub fn has_token(node: Node<'_>, token: &str) -> bool {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .any(|child| !child.is_named() && child.kind() == token);
    found
}

/// Strip any number of wrapping parentheses.
pub fn unwrap_parens(mut node: Node<'_>) -> Node<'_> {
    while node.kind() == "parenthesized_expression" {
        match node.named_child(0) {
            Some(inner) => node = inner,
            None => break,
        }
    }
    node
}

pub fn is_jsx_node(node: Node<'_>) -> bool {
    matches!(
        node.kind(),
        "jsx_element" | "jsx_self_closing_element" | "jsx_fragment"
    )
}

pub fn is_function_like(node: Node<'_>) -> bool {
    matches!(
        node.kind(),
        "function_declaration"
            | "generator_function_declaration"
            | "function_expression"
            | "function"
            | "arrow_function"
            | "method_definition"
    )
}

/// Decorator names attached to a class, including those written before `export`.
pub fn decorator_names<'f>(file: &'f ParsedFile, class_node: Node<'_>) -> Vec<&'f str> {
    let mut holders = vec![class_node];
    if let Some(parent) = class_node.parent() {
        if parent.kind() == "export_statement" {
            holders.push(parent);
        }
    }
    let mut names = Vec::new();
    for holder in holders {
        let mut cursor = holder.walk();
        for child in holder.named_children(&mut cursor) {
            if child.kind() != "decorator" {
                continue;
            }
            let Some(expr) = child.named_child(0) else {
                continue;
            };
            let ident = if expr.kind() == "call_expression" {
                expr.child_by_field_name("function")
            } else {
                Some(expr)
            };
            if let Some(ident) = ident {
                names.push(
                    ident
                        .utf8_text(file.source.as_bytes())
                        .unwrap_or("")
                        .rsplit('.')
                        .next()
                        .unwrap_or(""),
                );
            }
        }
    }
    names
}

/// A top-level declared symbol.
#[derive(Clone, Debug, PartialEq)]
pub struct TopLevelSymbol {
    pub name: String,
    pub kind: ExportKind,
    pub exported: bool,
    pub is_default: bool,
}

fn declaration_kind(node: Node<'_>) -> Option<ExportKind> {
    match node.kind() {
        "function_declaration" | "generator_function_declaration" => Some(ExportKind::Function),
        "class_declaration" | "abstract_class_declaration" | "class" => Some(ExportKind::Class),
        "interface_declaration" => Some(ExportKind::Interface),
        "type_alias_declaration" => Some(ExportKind::Type),
        "enum_declaration" => Some(ExportKind::Enum),
        _ => None,
    }
}

fn value_kind(value: Option<Node<'_>>) -> ExportKind {
    match value.map(unwrap_parens).map(|v| v.kind()) {
        Some("arrow_function" | "function_expression" | "function") => ExportKind::Function,
        Some("class") => ExportKind::Class,
        _ => ExportKind::Variable,
    }
}

fn push_declaration(
    file: &ParsedFile,
    decl: Node<'_>,
    exported: bool,
    is_default: bool,
    out: &mut Vec<TopLevelSymbol>,
) {
    if let Some(kind) = declaration_kind(decl) {
        if let Some(name) = decl.child_by_field_name("name") {
            out.push(TopLevelSymbol {
                name: file.text(name).to_string(),
                kind,
                exported,
                is_default,
            });
        }
        return;
    }
    if matches!(decl.kind(), "lexical_declaration" | "variable_declaration") {
        let mut cursor = decl.walk();
        for declarator in decl.named_children(&mut cursor) {
            if declarator.kind() != "variable_declarator" {
                continue;
            }
            let Some(name) = declarator.child_by_field_name("name") else {
                continue;
            };
            if name.kind() != "identifier" {
                continue;
            }
            out.push(TopLevelSymbol {
                name: file.text(name).to_string(),
                kind: value_kind(declarator.child_by_field_name("value")),
                exported,
                is_default,
            });
        }
    }
}

/// Every top-level declaration of the file, exported or not, in source order.
pub fn top_level_symbols(file: &ParsedFile) -> Vec<TopLevelSymbol> {
    let root = file.root();
    let mut out = Vec::new();
    let mut cursor = root.walk();
    for stmt in root.named_children(&mut cursor) {
        if stmt.kind() != "export_statement" {
            push_declaration(file, stmt, false, false, &mut out);
            continue;
        }
        let is_default = has_token(stmt, "default");
        if let Some(decl) = stmt.child_by_field_name("declaration") {
            push_declaration(file, decl, true, is_default, &mut out);
        } else if let Some(value) = stmt.child_by_field_name("value") {
            let value = unwrap_parens(value);
            if value.kind() == "identifier" {
                let name = file.text(value).to_string();
                let kind = out
                    .iter()
                    .find(|s| s.name == name)
                    .map(|s| s.kind)
                    .unwrap_or(ExportKind::Variable);
                out.push(TopLevelSymbol {
                    name,
                    kind,
                    exported: true,
                    is_default: true,
                });
            } else if let Some(kind) = declaration_kind(value) {
                if let Some(name) = value.child_by_field_name("name") {
                    out.push(TopLevelSymbol {
                        name: file.text(name).to_string(),
                        kind,
                        exported: true,
                        is_default: true,
                    });
                }
            }
        }
    }
    out
}

/// The file's primary export: the default export when present, else the first named export.
pub fn primary_export(file: &ParsedFile) -> Option<(String, ExportKind)> {
    let symbols = top_level_symbols(file);
    symbols
        .iter()
        .find(|s| s.is_default)
        .or_else(|| symbols.iter().find(|s| s.exported))
        .map(|s| (s.name.clone(), s.kind))
}
