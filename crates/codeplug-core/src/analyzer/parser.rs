//! Tree-sitter parsing wrapper used by the visitor pipeline.
//!
//! `.ts`/`.mts`/`.cts` sources go through the TypeScript grammar; every other
//! recognised extension goes through the TSX grammar, which accepts plain
//! JavaScript and JSX as well.

use std::path::Path;

use tracing::debug;

/// A parsed source unit. Owned by the pass that parsed it.
pub struct ParsedFile {
    /// Project-relative, forward-slash path.
    pub path: String,
    pub source: String,
    pub tree: tree_sitter::Tree,
}

impl ParsedFile {
    pub fn root(&self) -> tree_sitter::Node<'_> {
        self.tree.root_node()
    }

    /// Source text of `node`.
    pub fn text(&self, node: tree_sitter::Node<'_>) -> &str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    pub fn stem(&self) -> &str {
        crate::models::file_stem(&self.path)
    }

    pub fn extension(&self) -> &str {
        crate::models::file_extension(&self.path)
    }

    pub fn is_jsx(&self) -> bool {
        matches!(self.extension(), ".tsx" | ".jsx")
    }
}

fn grammar_for(path: &str) -> tree_sitter::Language {
    match crate::models::file_extension(path) {
        ".ts" | ".mts" | ".cts" => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        _ => tree_sitter_typescript::LANGUAGE_TSX.into(),
    }
}

/// Parse already-loaded source. Tree-sitter recovers from syntax errors, so
/// `None` only means the parser itself could not run.
pub fn parse_source(rel_path: &str, source: String) -> Option<ParsedFile> {
    let mut parser = tree_sitter::Parser::new();
    if let Err(e) = parser.set_language(&grammar_for(rel_path)) {
        debug!(path = %rel_path, error = %e, "grammar rejected");
        return None;
    }
    let tree = parser.parse(source.as_bytes(), None)?;
    Some(ParsedFile {
        path: rel_path.to_string(),
        source,
        tree,
    })
}

/// Read and parse `root/rel_path`. Unreadable or unparseable files yield `None`.
pub fn parse_file(root: &Path, rel_path: &str) -> Option<ParsedFile> {
    let source = match std::fs::read_to_string(root.join(rel_path)) {
        Ok(s) => s,
        Err(e) => {
            debug!(path = %rel_path, error = %e, "unreadable file skipped");
            return None;
        }
    };
    parse_source(rel_path, source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_typescript() {
        let file = parse_source("src/a.ts", "export const a: number = 1;\n".into()).unwrap();
        assert_eq!(file.root().kind(), "program");
        assert!(!file.root().has_error());
        assert_eq!(file.stem(), "a");
    }

    #[test]
    fn test_parse_tsx_accepts_jsx() {
        let src = "export default function App() { return <div>hi</div>; }\n";
        let file = parse_source("src/App.tsx", src.into()).unwrap();
        assert!(!file.root().has_error());
        assert!(file.is_jsx());
    }

    #[test]
    fn test_parse_recovers_from_syntax_errors() {
        let file = parse_source("src/broken.ts", "function ( {".into()).unwrap();
        assert!(file.root().has_error());
    }

    #[test]
    fn test_parse_file_missing() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(parse_file(tmp.path(), "nope.ts").is_none());
    }
}
