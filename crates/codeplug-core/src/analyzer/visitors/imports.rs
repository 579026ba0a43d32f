//! Import style: named vs default, and barrel (index) imports.

use std::sync::LazyLock;

use regex::Regex;

use super::Visitor;
use crate::analyzer::parser::ParsedFile;
use crate::models::{Dimension, Finding};

pub const NAMED_IMPORTS: &str = "Prefer named imports over default imports";
pub const DEFAULT_IMPORTS: &str = "Default imports prevalent";
pub const BARREL_IMPORTS: &str = "Barrel imports (index re-exports)";

static SIBLING_MODULE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\.\.?/[^/]+$").unwrap());

fn is_barrel_source(source: &str) -> bool {
    if !(source.ends_with("/index") || SIBLING_MODULE.is_match(source)) {
        return false;
    }
    let base = source.rsplit('/').next().unwrap_or(source);
    base == "index" || !base.contains('.')
}

pub struct ImportVisitor;

impl Visitor for ImportVisitor {
    fn name(&self) -> &'static str {
        "imports"
    }

    fn visit(&self, file: &ParsedFile) -> Vec<Finding> {
        let root = file.root();
        let mut total = 0u32;
        let mut named = 0u32;
        let mut default = 0u32;
        let mut barrel = 0u32;

        let mut cursor = root.walk();
        for stmt in root.named_children(&mut cursor) {
            if stmt.kind() != "import_statement" {
                continue;
            }
            total += 1;

            let mut inner = stmt.walk();
            if let Some(clause) = stmt
                .named_children(&mut inner)
                .find(|c| c.kind() == "import_clause")
            {
                let mut clause_cursor = clause.walk();
                for part in clause.named_children(&mut clause_cursor) {
                    match part.kind() {
                        "identifier" => default += 1,
                        "named_imports" => named += 1,
                        _ => {}
                    }
                }
            }

            if let Some(source) = stmt.child_by_field_name("source") {
                let raw = file.text(source).trim_matches(|c| c == '"' || c == '\'' || c == '`');
                if is_barrel_source(raw) {
                    barrel += 1;
                }
            }
        }

        let mut findings = Vec::new();
        if total == 0 {
            return findings;
        }
        if named > default {
            findings.push(Finding::tally(Dimension::Imports, NAMED_IMPORTS, named, total, &file.path));
        } else if default > 0 {
            findings.push(Finding::tally(Dimension::Imports, DEFAULT_IMPORTS, default, total, &file.path));
        }
        if barrel > 0 {
            findings.push(Finding::tally(Dimension::Imports, BARREL_IMPORTS, barrel, total, &file.path));
        }
        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::parser::parse_source;

    fn visit(src: &str) -> Vec<Finding> {
        ImportVisitor.visit(&parse_source("src/page.tsx", src.into()).unwrap())
    }

    #[test]
    fn test_barrel_source_detection() {
        assert!(is_barrel_source("./components"));
        assert!(is_barrel_source("../lib/index"));
        assert!(!is_barrel_source("./styles.css"));
        assert!(!is_barrel_source("react"));
        assert!(!is_barrel_source("../../deep/module"));
    }

    #[test]
    fn test_named_imports_prevail() {
        let src = r#"
import React from 'react';
import { useState, useEffect } from 'react';
import { Button } from './components';
import './styles.css';
"#;
        let findings = visit(src);
        let named = findings.iter().find(|f| f.pattern == NAMED_IMPORTS).unwrap();
        assert_eq!((named.count, named.total), (2, 4));
        let barrel = findings.iter().find(|f| f.pattern == BARREL_IMPORTS).unwrap();
        assert_eq!(barrel.count, 1);
    }

    #[test]
    fn test_default_imports_prevalent() {
        let findings = visit("import a from 'a';\nimport b from 'b';\n");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].pattern, DEFAULT_IMPORTS);
        assert_eq!((findings[0].count, findings[0].total), (2, 2));
    }

    #[test]
    fn test_no_imports() {
        assert!(visit("export const a = 1;").is_empty());
    }
}
