//! Source-control collaborator interface.

pub mod git;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::CodeplugResult;

pub use git::GitRepository;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommitInfo {
    pub hash: String,
    pub date: DateTime<Utc>,
    pub message: String,
    pub author: String,
}

impl CommitInfo {
    pub fn short_hash(&self) -> &str {
        &self.hash[..self.hash.len().min(7)]
    }

    /// First line of the commit message.
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }
}

/// What the core needs from version control. Diffs are unified-diff text.
pub trait SourceControl {
    fn is_repository(&self) -> bool;

    /// Most recent first.
    fn recent_commits(&self, limit: usize) -> CodeplugResult<Vec<CommitInfo>>;

    fn diff_for_commit(&self, hash: &str) -> CodeplugResult<String>;

    fn staged_diff(&self) -> CodeplugResult<String>;

    /// Relative paths touched by commits at or after `since`.
    fn files_changed_since(&self, since: DateTime<Utc>) -> CodeplugResult<Vec<String>>;
}
