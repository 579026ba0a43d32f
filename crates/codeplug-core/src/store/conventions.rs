//! `conventions.json`: the confirmed and pending convention list.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{codeplug_dir, read_json, schema_error, write_json};
use crate::errors::CodeplugResult;
use crate::models::Convention;

pub const CONVENTIONS_FILE: &str = "conventions.json";
pub const FORMAT_VERSION: &str = "1.0";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConventionsFile {
    pub version: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub conventions: Vec<Convention>,
}

pub struct ConventionStore {
    path: PathBuf,
}

impl ConventionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn for_project(project_root: &Path) -> Self {
        Self::new(codeplug_dir(project_root).join(CONVENTIONS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The whole document, validated. `None` when absent.
    pub fn load_file(&self) -> CodeplugResult<Option<ConventionsFile>> {
        let Some(file) = read_json::<ConventionsFile>(&self.path)? else {
            return Ok(None);
        };
        self.validate(&file)?;
        Ok(Some(file))
    }

    pub fn load(&self) -> CodeplugResult<Vec<Convention>> {
        Ok(self.load_file()?.map(|f| f.conventions).unwrap_or_default())
    }

    pub fn load_confirmed(&self) -> CodeplugResult<Vec<Convention>> {
        Ok(self.load()?.into_iter().filter(|c| c.confirmed).collect())
    }

    /// Replace the stored list. `created` survives from an existing document.
    pub fn save(&self, conventions: &[Convention]) -> CodeplugResult<()> {
        let now = Utc::now();
        let created = match self.load_file() {
            Ok(existing) => existing.map(|f| f.created).unwrap_or(now),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "existing conventions unreadable, created reset");
                now
            }
        };
        let file = ConventionsFile {
            version: FORMAT_VERSION.to_string(),
            created,
            updated: now,
            conventions: conventions.to_vec(),
        };
        write_json(&self.path, &file)?;
        info!(path = %self.path.display(), count = conventions.len(), "conventions saved");
        Ok(())
    }

    /// Store newly confirmed conventions. With `force` the prior list is
    /// discarded; otherwise entries are replaced by id and new ones appended.
    pub fn record(&self, confirmed: &[Convention], force: bool) -> CodeplugResult<Vec<Convention>> {
        let mut merged = if force { Vec::new() } else { self.load()? };
        for convention in confirmed {
            match merged.iter_mut().find(|c| c.id == convention.id) {
                Some(slot) => *slot = convention.clone(),
                None => merged.push(convention.clone()),
            }
        }
        self.save(&merged)?;
        Ok(merged)
    }

    fn validate(&self, file: &ConventionsFile) -> CodeplugResult<()> {
        for (i, c) in file.conventions.iter().enumerate() {
            if c.id.trim().is_empty() {
                return Err(schema_error(&self.path, format!("conventions[{i}]: empty id")));
            }
            if c.rule.trim().is_empty() {
                return Err(schema_error(&self.path, format!("conventions[{i}]: empty rule")));
            }
            if c.confidence > 100 {
                return Err(schema_error(
                    &self.path,
                    format!("conventions[{i}]: confidence {} out of range", c.confidence),
                ));
            }
        }
        Ok(())
    }
}
