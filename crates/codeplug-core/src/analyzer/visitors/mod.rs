//! Per-file pattern visitors.
//!
//! Each visitor owns the heuristics of one dimension and turns a parsed file
//! into zero or more [`Finding`]s. Visitors are pure: no I/O, no shared
//! state. A visitor that does not understand a file returns an empty list.

pub mod component;
pub mod error_handling;
pub mod imports;
pub mod naming;
pub mod schema;
pub mod testing;

use crate::analyzer::parser::ParsedFile;
use crate::models::Finding;

pub use component::ComponentVisitor;
pub use error_handling::ErrorHandlingVisitor;
pub use imports::ImportVisitor;
pub use naming::NamingVisitor;
pub use schema::SchemaVisitor;
pub use testing::TestVisitor;

pub trait Visitor: Send + Sync {
    fn name(&self) -> &'static str;
    fn visit(&self, file: &ParsedFile) -> Vec<Finding>;
}

/// Flat list of visitors run uniformly over every file.
pub struct VisitorRegistry {
    visitors: Vec<Box<dyn Visitor>>,
}

impl VisitorRegistry {
    pub fn new() -> Self {
        Self {
            visitors: Vec::new(),
        }
    }

    /// Registry holding every built-in visitor.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(NamingVisitor));
        registry.register(Box::new(ComponentVisitor));
        registry.register(Box::new(TestVisitor));
        registry.register(Box::new(ErrorHandlingVisitor));
        registry.register(Box::new(ImportVisitor));
        registry.register(Box::new(SchemaVisitor));
        registry
    }

    pub fn register(&mut self, visitor: Box<dyn Visitor>) {
        self.visitors.push(visitor);
    }

    pub fn len(&self) -> usize {
        self.visitors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visitors.is_empty()
    }

    /// Run every visitor on `file`. A visitor that panics loses its findings
    /// for this file only.
    pub fn run_all(&self, file: &ParsedFile) -> Vec<Finding> {
        let mut findings = Vec::new();
        for visitor in &self.visitors {
            let result =
                std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| visitor.visit(file)));
            match result {
                Ok(found) => findings.extend(found),
                Err(_) => {
                    tracing::error!(
                        visitor = visitor.name(),
                        path = %file.path,
                        "visitor panicked; findings discarded"
                    );
                }
            }
        }
        findings
    }
}

impl Default for VisitorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::parser::parse_source;
    use crate::models::Dimension;

    struct PanickingVisitor;

    impl Visitor for PanickingVisitor {
        fn name(&self) -> &'static str {
            "panicking"
        }

        fn visit(&self, _file: &ParsedFile) -> Vec<Finding> {
            panic!("boom");
        }
    }

    struct FixedVisitor;

    impl Visitor for FixedVisitor {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn visit(&self, file: &ParsedFile) -> Vec<Finding> {
            vec![Finding::sample(Dimension::Git, "fixed", true, &file.path)]
        }
    }

    #[test]
    fn test_default_registry_has_six_visitors() {
        assert_eq!(VisitorRegistry::with_defaults().len(), 6);
    }

    #[test]
    fn test_panicking_visitor_is_isolated() {
        let mut registry = VisitorRegistry::new();
        registry.register(Box::new(PanickingVisitor));
        registry.register(Box::new(FixedVisitor));
        let file = parse_source("a.ts", "const a = 1;".into()).unwrap();
        let findings = registry.run_all(&file);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].pattern, "fixed");
    }
}
