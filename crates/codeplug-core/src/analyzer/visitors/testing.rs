//! Test file placement and naming. Path-only; the tree is not consulted.

use super::Visitor;
use crate::analyzer::parser::ParsedFile;
use crate::models::{Dimension, Finding};

pub const COLOCATED_TESTS: &str = "Co-located __tests__/ directories";
pub const SEPARATE_TESTS: &str = "Separate tests/ directory";
pub const TEST_SUFFIX: &str = "Test files use .test.{ext} naming";
pub const SPEC_SUFFIX: &str = "Test files use .spec.{ext} naming";

pub struct TestVisitor;

impl Visitor for TestVisitor {
    fn name(&self) -> &'static str {
        "testing"
    }

    fn visit(&self, file: &ParsedFile) -> Vec<Finding> {
        let path = file.path.as_str();
        let stem = file.stem();
        let has_test_suffix = stem.ends_with(".test");
        let has_spec_suffix = stem.ends_with(".spec");
        let in_tests_dir = path.starts_with("__tests__/") || path.contains("/__tests__/");

        if !(has_test_suffix || has_spec_suffix || in_tests_dir) {
            return Vec::new();
        }

        let mut findings = Vec::new();
        if in_tests_dir {
            findings.push(Finding::sample(Dimension::Testing, COLOCATED_TESTS, true, path));
        } else if path.starts_with("tests/") || path.starts_with("test/") {
            findings.push(Finding::sample(Dimension::Testing, SEPARATE_TESTS, true, path));
        }

        if has_test_suffix {
            findings.push(Finding::sample(Dimension::Testing, TEST_SUFFIX, true, path));
        } else if has_spec_suffix {
            findings.push(Finding::sample(Dimension::Testing, SPEC_SUFFIX, true, path));
        }
        findings
    }
}
