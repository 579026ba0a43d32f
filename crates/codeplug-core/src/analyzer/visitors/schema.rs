//! Decorator-driven naming of schema entities (TypeORM `@Entity`).

use super::naming::PASCAL_CASE;
use super::Visitor;
use crate::analyzer::parser::ParsedFile;
use crate::analyzer::syntax::{decorator_names, descendants};
use crate::models::{Dimension, Finding};

pub const ENTITY_NAMES: &str = "TypeORM entity names use PascalCase";

pub struct SchemaVisitor;

impl Visitor for SchemaVisitor {
    fn name(&self) -> &'static str {
        "schema"
    }

    fn visit(&self, file: &ParsedFile) -> Vec<Finding> {
        if !matches!(file.extension(), ".ts" | ".tsx") {
            return Vec::new();
        }

        let mut pascal = 0u32;
        let mut total = 0u32;
        for node in descendants(file.root()) {
            if !matches!(node.kind(), "class_declaration" | "abstract_class_declaration") {
                continue;
            }
            if !decorator_names(file, node).contains(&"Entity") {
                continue;
            }
            let Some(name) = node.child_by_field_name("name") else {
                continue;
            };
            total += 1;
            if PASCAL_CASE.is_match(file.text(name)) {
                pascal += 1;
            }
        }

        if total == 0 {
            return Vec::new();
        }
        vec![Finding::tally(
            Dimension::Naming,
            ENTITY_NAMES,
            pascal,
            total,
            &file.path,
        )]
    }
}
