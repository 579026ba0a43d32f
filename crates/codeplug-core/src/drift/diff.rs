//! Unified diff parsing into per-file hunks.

use std::sync::LazyLock;

use regex::Regex;

static FILE_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^diff --git a/(.+?) b/(.+)$").unwrap());

/// Added and removed lines of one file, markers stripped.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileHunk {
    pub file: String,
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl FileHunk {
    pub fn added_text(&self) -> String {
        self.added.join("\n")
    }
}

pub fn parse_unified_diff(diff: &str) -> Vec<FileHunk> {
    let mut hunks = Vec::new();
    let mut current: Option<FileHunk> = None;

    for line in diff.lines() {
        if let Some(caps) = FILE_HEADER.captures(line) {
            if let Some(done) = current.take() {
                hunks.push(done);
            }
            current = Some(FileHunk {
                file: caps[2].to_string(),
                ..Default::default()
            });
            continue;
        }
        let Some(hunk) = current.as_mut() else {
            continue;
        };
        if line.starts_with("+++") || line.starts_with("---") {
            continue;
        }
        if let Some(rest) = line.strip_prefix('+') {
            hunk.added.push(rest.to_string());
        } else if let Some(rest) = line.strip_prefix('-') {
            hunk.removed.push(rest.to_string());
        }
    }

    if let Some(done) = current {
        hunks.push(done);
    }
    hunks
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIFF: &str = "\
diff --git a/src/a.ts b/src/a.ts
index 1..2 100644
--- a/src/a.ts
+++ b/src/a.ts
@@ -1,2 +1,2 @@
 const keep = 1;
-const oldName = 2;
+const new_name = 2;
diff --git a/src/old.ts b/src/renamed.ts
similarity index 90%
+export default function x() {}
";

    #[test]
    fn test_parse_two_files() {
        let hunks = parse_unified_diff(DIFF);
        assert_eq!(hunks.len(), 2);
        assert_eq!(hunks[0].file, "src/a.ts");
        assert_eq!(hunks[0].added, vec!["const new_name = 2;"]);
        assert_eq!(hunks[0].removed, vec!["const oldName = 2;"]);
        assert_eq!(hunks[1].file, "src/renamed.ts");
        assert_eq!(hunks[1].added.len(), 1);
    }

    #[test]
    fn test_empty_and_headerless() {
        assert!(parse_unified_diff("").is_empty());
        assert!(parse_unified_diff("+orphan line\n").is_empty());
    }
}
