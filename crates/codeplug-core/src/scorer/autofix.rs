//! Filename renames for auto-fixable violations. No file content is edited.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::errors::{CodeplugError, CodeplugResult};
use crate::models::Violation;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FixOutcome {
    pub violation_id: String,
    pub file: String,
    /// New relative path when the rename happened.
    pub renamed_to: Option<String>,
    pub error: Option<String>,
}

impl FixOutcome {
    pub fn applied(&self) -> bool {
        self.renamed_to.is_some()
    }
}

pub struct AutoFixer {
    root: PathBuf,
}

impl AutoFixer {
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self {
            root: project_root.as_ref().to_path_buf(),
        }
    }

    /// Rename `violation.file` to its sibling `violation.expected`.
    /// Returns the new relative path.
    pub fn fix(&self, violation: &Violation) -> CodeplugResult<String> {
        if !violation.auto_fixable {
            return Err(CodeplugError::Fix(format!(
                "violation {} is not auto-fixable",
                violation.id
            )));
        }
        let target_name = violation.expected.as_str();
        if target_name.is_empty() || target_name.contains('/') || target_name.contains('\\') {
            return Err(CodeplugError::Fix(format!(
                "expected value {target_name:?} is not a file name"
            )));
        }

        let source = self.root.join(&violation.file);
        if !source.is_file() {
            return Err(CodeplugError::Fix(format!("{} does not exist", violation.file)));
        }
        let new_rel = match violation.file.rsplit_once('/') {
            Some((dir, _)) => format!("{dir}/{target_name}"),
            None => target_name.to_string(),
        };
        let target = self.root.join(&new_rel);
        if target.exists() {
            return Err(CodeplugError::Fix(format!("{new_rel} already exists")));
        }

        std::fs::rename(&source, &target)?;
        info!(from = %violation.file, to = %new_rel, "file renamed");
        Ok(new_rel)
    }

    pub fn fix_by_id(&self, violations: &[Violation], id: &str) -> CodeplugResult<FixOutcome> {
        let violation = violations
            .iter()
            .find(|v| v.id == id)
            .ok_or_else(|| CodeplugError::Fix(format!("no violation with id {id}")))?;
        Ok(self.outcome(violation))
    }

    /// Attempt every auto-fixable violation; others are left out of the result.
    pub fn fix_all(&self, violations: &[Violation]) -> Vec<FixOutcome> {
        violations
            .iter()
            .filter(|v| v.auto_fixable)
            .map(|v| self.outcome(v))
            .collect()
    }

    fn outcome(&self, violation: &Violation) -> FixOutcome {
        match self.fix(violation) {
            Ok(new_rel) => FixOutcome {
                violation_id: violation.id.clone(),
                file: violation.file.clone(),
                renamed_to: Some(new_rel),
                error: None,
            },
            Err(e) => {
                warn!(file = %violation.file, error = %e, "fix not applied");
                FixOutcome {
                    violation_id: violation.id.clone(),
                    file: violation.file.clone(),
                    renamed_to: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;
    use std::fs;

    fn violation(id: &str, file: &str, expected: &str, fixable: bool) -> Violation {
        Violation {
            id: id.into(),
            convention_id: "naming-utility-files-use-camelcase".into(),
            severity: Severity::Medium,
            file: file.into(),
            line: None,
            message: "m".into(),
            expected: expected.into(),
            found: file.rsplit('/').next().unwrap().into(),
            auto_fixable: fixable,
        }
    }

    fn project() -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("src")).unwrap();
        fs::write(tmp.path().join("src/auth_helper.ts"), "export {};\n").unwrap();
        fs::write(tmp.path().join("src/date_util.ts"), "export {};\n").unwrap();
        fs::write(tmp.path().join("src/dateUtil.ts"), "export {};\n").unwrap();
        tmp
    }

    #[test]
    fn test_fix_renames_sibling() {
        let tmp = project();
        let fixer = AutoFixer::new(tmp.path());
        let v = violation("1", "src/auth_helper.ts", "authHelper.ts", true);
        assert_eq!(fixer.fix(&v).unwrap(), "src/authHelper.ts");
        assert!(tmp.path().join("src/authHelper.ts").is_file());
        assert!(!tmp.path().join("src/auth_helper.ts").exists());

        assert!(matches!(fixer.fix(&v), Err(CodeplugError::Fix(_))));
    }

    #[test]
    fn test_fix_refusals() {
        let tmp = project();
        let fixer = AutoFixer::new(tmp.path());
        let not_fixable = violation("1", "src/auth_helper.ts", "authHelper.ts", false);
        assert!(fixer.fix(&not_fixable).is_err());
        let collision = violation("2", "src/date_util.ts", "dateUtil.ts", true);
        assert!(fixer.fix(&collision).is_err());
        let moved = violation("3", "src/auth_helper.ts", "lib/authHelper.ts", true);
        assert!(fixer.fix(&moved).is_err());
        assert!(tmp.path().join("src/auth_helper.ts").is_file());
    }

    #[test]
    fn test_fix_all_and_by_id() {
        let tmp = project();
        let fixer = AutoFixer::new(tmp.path());
        let violations = vec![
            violation("a", "src/auth_helper.ts", "authHelper.ts", true),
            violation("b", "src/date_util.ts", "dateUtil.ts", true),
            violation("c", "src/other.ts", "Other", false),
        ];
        let outcomes = fixer.fix_all(&violations);
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].applied());
        assert!(!outcomes[1].applied());
        assert!(outcomes[1].error.as_deref().unwrap().contains("already exists"));

        assert!(fixer.fix_by_id(&violations, "zzz").is_err());
        let again = fixer.fix_by_id(&violations, "a").unwrap();
        assert!(!again.applied());
    }
}
