//! File-name and identifier case conventions.

use std::sync::LazyLock;

use regex::Regex;

use super::Visitor;
use crate::analyzer::parser::ParsedFile;
use crate::analyzer::syntax::{has_token, primary_export};
use crate::models::{Dimension, ExportKind, Finding};

pub const REACT_COMPONENT_FILES: &str = "React components use PascalCase file names";
pub const HOOK_FILES: &str = "Hooks use \"use\" prefix with camelCase";
pub const CLASS_FILES: &str = "Class/service files use PascalCase";
pub const UTILITY_FILES: &str = "Utility files use camelCase";
pub const CONSTANTS: &str = "Constants use SCREAMING_SNAKE_CASE";
pub const CLASS_MATCHES_FILE: &str = "Exported class name matches file name";

pub(crate) static PASCAL_CASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][a-zA-Z0-9]*$").unwrap());
pub(crate) static CAMEL_CASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-zA-Z0-9]*$").unwrap());
static SCREAMING_SNAKE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][A-Z0-9_]*$").unwrap());
static HOOK_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^use[A-Z]").unwrap());

/// Lower-cased name with `_`/`-` removed, used to pair a stem with its export.
fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

/// `formatDate.test`, `vite.config`: stems carrying a role suffix are not
/// judged by file-name case.
pub(crate) fn is_compound_stem(stem: &str) -> bool {
    stem.contains('.')
}

pub struct NamingVisitor;

impl NamingVisitor {
    fn file_finding(
        &self,
        file: &ParsedFile,
        label: &str,
        conforming: bool,
        style: &Regex,
        export: Option<&(String, ExportKind)>,
    ) -> Finding {
        let mut finding = Finding::sample(Dimension::Naming, label, conforming, &file.path);
        if let Some((name, kind)) = export {
            finding.export_kind = Some(*kind);
            if !conforming && style.is_match(name) && normalize(name) == normalize(file.stem()) {
                finding.export_name = Some(name.clone());
            }
        }
        finding
    }

    fn visit_file_name(&self, file: &ParsedFile, findings: &mut Vec<Finding>) {
        let stem = file.stem();
        if is_compound_stem(stem) {
            return;
        }
        let export = primary_export(file);

        if file.is_jsx() {
            findings.push(self.file_finding(
                file,
                REACT_COMPONENT_FILES,
                PASCAL_CASE.is_match(stem),
                &PASCAL_CASE,
                export.as_ref(),
            ));
            return;
        }
        if !matches!(file.extension(), ".ts" | ".js" | ".mjs" | ".cjs") {
            return;
        }

        let is_class = matches!(export, Some((_, ExportKind::Class)));
        if HOOK_PREFIX.is_match(stem) {
            findings.push(self.file_finding(
                file,
                HOOK_FILES,
                CAMEL_CASE.is_match(stem),
                &CAMEL_CASE,
                export.as_ref(),
            ));
        } else if PASCAL_CASE.is_match(stem) {
            findings.push(self.file_finding(file, CLASS_FILES, true, &PASCAL_CASE, export.as_ref()));
            if let Some((name, ExportKind::Class)) = &export {
                let mut finding =
                    Finding::sample(Dimension::Naming, CLASS_MATCHES_FILE, name == stem, &file.path);
                finding.export_kind = Some(ExportKind::Class);
                if name != stem {
                    finding.expected = Some(stem.to_string());
                    finding.found = Some(name.clone());
                }
                findings.push(finding);
            }
        } else if CAMEL_CASE.is_match(stem) {
            findings.push(self.file_finding(file, UTILITY_FILES, true, &CAMEL_CASE, export.as_ref()));
        } else if is_class {
            findings.push(self.file_finding(file, CLASS_FILES, false, &PASCAL_CASE, export.as_ref()));
        } else {
            findings.push(self.file_finding(file, UTILITY_FILES, false, &CAMEL_CASE, export.as_ref()));
        }
    }

    /// Top-level `const` declarations initialised with a string or number literal.
    fn visit_constants(&self, file: &ParsedFile, findings: &mut Vec<Finding>) {
        let root = file.root();
        let mut screaming = 0u32;
        let mut total = 0u32;

        let mut cursor = root.walk();
        for stmt in root.named_children(&mut cursor) {
            let decl = if stmt.kind() == "export_statement" {
                match stmt.child_by_field_name("declaration") {
                    Some(d) => d,
                    None => continue,
                }
            } else {
                stmt
            };
            if decl.kind() != "lexical_declaration" || !has_token(decl, "const") {
                continue;
            }
            let mut inner = decl.walk();
            for declarator in decl.named_children(&mut inner) {
                if declarator.kind() != "variable_declarator" {
                    continue;
                }
                let (Some(name), Some(value)) = (
                    declarator.child_by_field_name("name"),
                    declarator.child_by_field_name("value"),
                ) else {
                    continue;
                };
                if name.kind() != "identifier" || !matches!(value.kind(), "string" | "number") {
                    continue;
                }
                total += 1;
                if SCREAMING_SNAKE.is_match(file.text(name)) {
                    screaming += 1;
                }
            }
        }

        if total > 0 {
            findings.push(Finding::tally(
                Dimension::Naming,
                CONSTANTS,
                screaming,
                total,
                &file.path,
            ));
        }
    }
}

impl Visitor for NamingVisitor {
    fn name(&self) -> &'static str {
        "naming"
    }

    fn visit(&self, file: &ParsedFile) -> Vec<Finding> {
        let mut findings = Vec::new();
        self.visit_file_name(file, &mut findings);
        self.visit_constants(file, &mut findings);
        findings
    }
}
