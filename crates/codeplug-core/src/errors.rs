//! Error types for the codeplug core library.

/// Top-level error enum for the codeplug core library.
#[derive(Debug, thiserror::Error)]
pub enum CodeplugError {
    #[error("Schema error in {file}: {message}")]
    Schema { file: String, message: String },

    #[error("Source control error: {0}")]
    SourceControl(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Fix error: {0}")]
    Fix(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),
}

impl CodeplugError {
    pub fn schema(file: impl Into<String>, message: impl Into<String>) -> Self {
        CodeplugError::Schema {
            file: file.into(),
            message: message.into(),
        }
    }
}

pub type CodeplugResult<T> = Result<T, CodeplugError>;
