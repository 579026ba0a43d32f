//! Try/catch coverage of awaiting async functions.

use tree_sitter::Node;

use super::Visitor;
use crate::analyzer::parser::ParsedFile;
use crate::analyzer::syntax::{descendants, has_token, is_function_like};
use crate::models::{Dimension, Finding};

pub const TRY_CATCH: &str = "Try/catch error handling";
pub const ASYNC_AWAIT: &str = "Async/await pattern";

/// Whether `node` sits inside the protected block of a `try` statement,
/// looking no further out than `boundary`.
fn inside_try_block(node: Node<'_>, boundary: Node<'_>) -> bool {
    let mut current = node;
    while let Some(parent) = current.parent() {
        if parent.id() == boundary.id() {
            return false;
        }
        if parent.kind() == "try_statement"
            && parent
                .child_by_field_name("body")
                .is_some_and(|body| body.id() == current.id())
        {
            return true;
        }
        current = parent;
    }
    false
}

/// The `await` expressions owned by `function`, excluding nested functions.
fn own_awaits<'t>(function: Node<'t>) -> Vec<Node<'t>> {
    let mut awaits = Vec::new();
    let mut stack = vec![function];
    while let Some(current) = stack.pop() {
        let mut cursor = current.walk();
        for child in current.named_children(&mut cursor) {
            if is_function_like(child) {
                continue;
            }
            if child.kind() == "await_expression" {
                awaits.push(child);
            }
            stack.push(child);
        }
    }
    awaits
}

pub struct ErrorHandlingVisitor;

impl Visitor for ErrorHandlingVisitor {
    fn name(&self) -> &'static str {
        "error-handling"
    }

    fn visit(&self, file: &ParsedFile) -> Vec<Finding> {
        let mut async_fns = 0u32;
        let mut awaiting = 0u32;
        let mut guarded = 0u32;
        for node in descendants(file.root()) {
            if !is_function_like(node) || !has_token(node, "async") {
                continue;
            }
            async_fns += 1;
            let awaits = own_awaits(node);
            if awaits.is_empty() {
                continue;
            }
            awaiting += 1;
            if awaits.iter().all(|a| inside_try_block(*a, node)) {
                guarded += 1;
            }
        }

        let mut findings = Vec::new();
        if awaiting > 0 {
            findings.push(Finding::tally(
                Dimension::ErrorHandling,
                TRY_CATCH,
                guarded,
                awaiting,
                &file.path,
            ));
        }
        if async_fns > 0 {
            findings.push(Finding::tally(
                Dimension::Api,
                ASYNC_AWAIT,
                async_fns,
                async_fns,
                &file.path,
            ));
        }
        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::parser::parse_source;

    fn visit(src: &str) -> Vec<Finding> {
        ErrorHandlingVisitor.visit(&parse_source("src/api.ts", src.into()).unwrap())
    }

    #[test]
    fn test_try_catch_against_async_functions() {
        let src = r#"
export async function load() {
  try { await fetch('/a'); } catch (e) { throw e; }
}
export const save = async () => { await fetch('/b'); };
class Repo { async find() { return 1; } }
"#;
        let findings = visit(src);
        let try_catch = findings.iter().find(|f| f.pattern == TRY_CATCH).unwrap();
        assert_eq!((try_catch.count, try_catch.total), (1, 2));
        let async_await = findings.iter().find(|f| f.pattern == ASYNC_AWAIT).unwrap();
        assert_eq!(async_await.dimension, Dimension::Api);
        assert_eq!((async_await.count, async_await.total), (3, 3));
    }

    #[test]
    fn test_async_without_await_is_not_sampled() {
        let findings = visit("export async function ping() { return 1; }\n");
        assert!(findings.iter().all(|f| f.pattern != TRY_CATCH));
        let async_await = findings.iter().find(|f| f.pattern == ASYNC_AWAIT).unwrap();
        assert_eq!((async_await.count, async_await.total), (1, 1));
    }

    #[test]
    fn test_await_in_catch_or_nested_function_is_unguarded() {
        let src = r#"
async function retry() {
  try { await first(); } catch (e) { await second(); }
}
async function outer() {
  try { const f = async () => { await inner(); }; f(); await done(); } catch (e) {}
}
"#;
        let findings = visit(src);
        let try_catch = findings.iter().find(|f| f.pattern == TRY_CATCH).unwrap();
        // retry: await in catch; outer: guarded; the inner arrow: unguarded.
        assert_eq!((try_catch.count, try_catch.total), (1, 3));
    }

    #[test]
    fn test_sync_file_has_no_findings() {
        assert!(visit("export function add(a: number, b: number) { return a + b; }").is_empty());
    }
}
