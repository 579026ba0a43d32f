//! Project-local persisted state under `.codeplug/`.
//!
//! Conventions, violations and custom rules are JSON documents read and
//! written whole; the score series lives in SQLite.

pub mod conventions;
pub mod rules;
pub mod schema;
pub mod scores;
pub mod violations;

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::CODEPLUG_DIR;
use crate::errors::{CodeplugError, CodeplugResult};

pub use conventions::ConventionStore;
pub use rules::RuleStore;
pub use scores::ScoreStore;
pub use violations::ViolationStore;

pub fn codeplug_dir(project_root: &Path) -> PathBuf {
    project_root.join(CODEPLUG_DIR)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Decode a JSON document. `Ok(None)` when the file does not exist; decode
/// failures are schema errors naming the file.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> CodeplugResult<Option<T>> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    serde_json::from_str(&text)
        .map(Some)
        .map_err(|e| CodeplugError::schema(display_name(path), e.to_string()))
}

pub(crate) fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> CodeplugResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut text = serde_json::to_string_pretty(value)?;
    text.push('\n');
    std::fs::write(path, text)?;
    Ok(())
}

pub(crate) fn schema_error(path: &Path, message: impl Into<String>) -> CodeplugError {
    CodeplugError::schema(display_name(path), message)
}
