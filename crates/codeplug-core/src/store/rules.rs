//! `rules.json`: user-authored regex rules.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{codeplug_dir, read_json, schema_error, write_json};
use crate::errors::CodeplugResult;
use crate::models::CustomRule;

pub const RULES_FILE: &str = "rules.json";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RulesFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub rules: Vec<CustomRule>,
}

pub struct RuleStore {
    path: PathBuf,
}

impl RuleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn for_project(project_root: &Path) -> Self {
        Self::new(codeplug_dir(project_root).join(RULES_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Absent file means no rules.
    pub fn load(&self) -> CodeplugResult<Vec<CustomRule>> {
        let file: RulesFile = read_json(&self.path)?.unwrap_or_default();
        for (i, rule) in file.rules.iter().enumerate() {
            if rule.id.trim().is_empty() {
                return Err(schema_error(&self.path, format!("rules[{i}]: empty id")));
            }
            if rule.pattern.is_empty() {
                return Err(schema_error(
                    &self.path,
                    format!("rules[{i}] ({}): empty pattern", rule.id),
                ));
            }
        }
        Ok(file.rules)
    }

    pub fn save(&self, rules: &[CustomRule]) -> CodeplugResult<()> {
        let file = RulesFile {
            version: Some("1.0".into()),
            rules: rules.to_vec(),
        };
        write_json(&self.path, &file)
    }
}
