//! `violations.json`: the latest audit's violations.

use std::path::{Path, PathBuf};

use tracing::info;

use super::{codeplug_dir, read_json, schema_error, write_json};
use crate::errors::CodeplugResult;
use crate::models::Violation;

pub const VIOLATIONS_FILE: &str = "violations.json";

pub struct ViolationStore {
    path: PathBuf,
}

impl ViolationStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn for_project(project_root: &Path) -> Self {
        Self::new(codeplug_dir(project_root).join(VIOLATIONS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> CodeplugResult<Vec<Violation>> {
        let violations: Vec<Violation> = read_json(&self.path)?.unwrap_or_default();
        for (i, v) in violations.iter().enumerate() {
            if v.id.is_empty() || v.convention_id.is_empty() || v.file.is_empty() {
                return Err(schema_error(
                    &self.path,
                    format!("violations[{i}]: id, conventionId and file are required"),
                ));
            }
        }
        Ok(violations)
    }

    /// Replace the stored list.
    pub fn save(&self, violations: &[Violation]) -> CodeplugResult<()> {
        write_json(&self.path, violations)?;
        info!(path = %self.path.display(), count = violations.len(), "violations saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CodeplugError;
    use crate::models::Severity;

    fn violation(id: &str) -> Violation {
        Violation {
            id: id.into(),
            convention_id: "naming-utility-files-use-camelcase".into(),
            severity: Severity::Medium,
            file: "src/auth_helper.ts".into(),
            line: None,
            message: "auth_helper.ts does not follow: Utility files use camelCase".into(),
            expected: "authHelper.ts".into(),
            found: "auth_helper.ts".into(),
            auto_fixable: true,
        }
    }

    #[test]
    fn test_save_replaces() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ViolationStore::for_project(tmp.path());
        assert!(store.load().unwrap().is_empty());

        store.save(&[violation("a"), violation("b")]).unwrap();
        store.save(&[violation("c")]).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "c");

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"autoFixable\": true"));
        assert!(raw.contains("\"conventionId\""));
    }

    #[test]
    fn test_unknown_severity_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ViolationStore::for_project(tmp.path());
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(
            store.path(),
            r#"[{"id":"a","conventionId":"c","severity":"blocker","file":"a.ts","message":"m","expected":"e","found":"f","autoFixable":false}]"#,
        )
        .unwrap();
        assert!(matches!(store.load(), Err(CodeplugError::Schema { .. })));
    }
}
