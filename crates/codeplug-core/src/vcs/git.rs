//! git2-backed [`SourceControl`] implementation.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use git2::{Commit, Diff, DiffFormat, Repository, Sort};

use super::{CommitInfo, SourceControl};
use crate::errors::{CodeplugError, CodeplugResult};

/// A repository discovered from a working directory. The repository is
/// reopened per call so the handle stays `Send`.
pub struct GitRepository {
    path: PathBuf,
}

impl GitRepository {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn open(&self) -> CodeplugResult<Repository> {
        Repository::discover(&self.path).map_err(|e| {
            CodeplugError::SourceControl(format!(
                "not a git repository ({}): {}",
                self.path.display(),
                e.message()
            ))
        })
    }

    /// The project directory relative to the repository work tree, as a
    /// `/`-terminated prefix. Empty when the project is the work tree root.
    fn project_prefix(&self, repo: &Repository) -> CodeplugResult<String> {
        let Some(workdir) = repo.workdir() else {
            return Ok(String::new());
        };
        let workdir = workdir.canonicalize()?;
        let project = self.path.canonicalize()?;
        let relative = project.strip_prefix(&workdir).unwrap_or(Path::new(""));
        let mut prefix = relative.to_string_lossy().replace('\\', "/");
        if !prefix.is_empty() {
            prefix.push('/');
        }
        Ok(prefix)
    }

    fn commit_time(commit: &Commit<'_>) -> DateTime<Utc> {
        DateTime::from_timestamp(commit.time().seconds(), 0).unwrap_or_default()
    }

    /// Diff of a commit against its first parent (or the empty tree).
    fn commit_diff<'r>(repo: &'r Repository, commit: &Commit<'_>) -> CodeplugResult<Diff<'r>> {
        let tree = commit.tree()?;
        let parent_tree = match commit.parent(0) {
            Ok(parent) => Some(parent.tree()?),
            Err(_) => None,
        };
        Ok(repo.diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)?)
    }
}

/// Render a diff as unified-diff text.
fn diff_to_text(diff: &Diff<'_>) -> CodeplugResult<String> {
    let mut out = String::new();
    diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
        if matches!(line.origin(), '+' | '-' | ' ') {
            out.push(line.origin());
        }
        out.push_str(&String::from_utf8_lossy(line.content()));
        true
    })?;
    Ok(out)
}

impl SourceControl for GitRepository {
    fn is_repository(&self) -> bool {
        Repository::discover(&self.path).is_ok()
    }

    fn recent_commits(&self, limit: usize) -> CodeplugResult<Vec<CommitInfo>> {
        let repo = self.open()?;
        let mut revwalk = repo.revwalk()?;
        revwalk.push_head()?;
        revwalk.set_sorting(Sort::TIME)?;

        let mut commits = Vec::with_capacity(limit);
        for oid in revwalk.take(limit) {
            let commit = repo.find_commit(oid?)?;
            commits.push(CommitInfo {
                hash: commit.id().to_string(),
                date: Self::commit_time(&commit),
                message: commit.message().unwrap_or("").trim_end().to_string(),
                author: commit.author().name().unwrap_or("unknown").to_string(),
            });
        }
        Ok(commits)
    }

    fn diff_for_commit(&self, hash: &str) -> CodeplugResult<String> {
        let repo = self.open()?;
        let commit = repo.revparse_single(hash)?.peel_to_commit()?;
        let diff = Self::commit_diff(&repo, &commit)?;
        diff_to_text(&diff)
    }

    fn staged_diff(&self) -> CodeplugResult<String> {
        let repo = self.open()?;
        let head_tree = match repo.head() {
            Ok(head) => Some(head.peel_to_tree()?),
            Err(_) => None,
        };
        let diff = repo.diff_tree_to_index(head_tree.as_ref(), None, None)?;
        diff_to_text(&diff)
    }

    fn files_changed_since(&self, since: DateTime<Utc>) -> CodeplugResult<Vec<String>> {
        let repo = self.open()?;
        let prefix = self.project_prefix(&repo)?;
        let mut revwalk = repo.revwalk()?;
        revwalk.push_head()?;
        revwalk.set_sorting(Sort::TIME)?;

        let mut files = BTreeSet::new();
        for oid in revwalk {
            let commit = repo.find_commit(oid?)?;
            if Self::commit_time(&commit) < since {
                break;
            }
            let diff = Self::commit_diff(&repo, &commit)?;
            for delta in diff.deltas() {
                for file in [delta.old_file(), delta.new_file()] {
                    let Some(path) = file.path() else {
                        continue;
                    };
                    let path = path.to_string_lossy().replace('\\', "/");
                    if let Some(rel) = path.strip_prefix(prefix.as_str()) {
                        files.insert(rel.to_string());
                    }
                }
            }
        }
        Ok(files.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn commit_file(repo: &Repository, root: &Path, rel: &str, content: &str, message: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new(rel)).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let sig = git2::Signature::now("Dev", "dev@example.com").unwrap();
        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&Commit<'_>> = parent.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap();
    }

    #[test]
    fn test_not_a_repository() {
        let tmp = tempfile::tempdir().unwrap();
        let git = GitRepository::new(tmp.path());
        assert!(!git.is_repository());
        assert!(matches!(
            git.recent_commits(5),
            Err(CodeplugError::SourceControl(_))
        ));
    }

    #[test]
    fn test_commits_and_diffs() {
        let tmp = tempfile::tempdir().unwrap();
        let repo = Repository::init(tmp.path()).unwrap();
        commit_file(&repo, tmp.path(), "a.ts", "const a = 1;\n", "first");
        commit_file(&repo, tmp.path(), "b.ts", "const user_name = 'x';\n", "second");

        let git = GitRepository::new(tmp.path());
        assert!(git.is_repository());
        let commits = git.recent_commits(5).unwrap();
        assert_eq!(commits.len(), 2);

        let second = commits.iter().find(|c| c.message == "second").unwrap();
        let diff = git.diff_for_commit(&second.hash).unwrap();
        assert!(diff.contains("diff --git a/b.ts b/b.ts"));
        assert!(diff.contains("+const user_name = 'x';"));
        assert!(!diff.contains("a.ts b/a.ts"));

        let since = DateTime::<Utc>::MIN_UTC;
        let changed = git.files_changed_since(since).unwrap();
        assert_eq!(changed, vec!["a.ts", "b.ts"]);
    }

    #[test]
    fn test_changed_files_relative_to_nested_project() {
        let tmp = tempfile::tempdir().unwrap();
        let repo = Repository::init(tmp.path()).unwrap();
        commit_file(&repo, tmp.path(), "README.md", "# repo\n", "docs");
        commit_file(&repo, tmp.path(), "web/src/app.ts", "const a = 1;\n", "app");

        let git = GitRepository::new(tmp.path().join("web"));
        let changed = git.files_changed_since(DateTime::<Utc>::MIN_UTC).unwrap();
        assert_eq!(changed, vec!["src/app.ts"]);
    }

    #[test]
    fn test_staged_diff() {
        let tmp = tempfile::tempdir().unwrap();
        let repo = Repository::init(tmp.path()).unwrap();
        commit_file(&repo, tmp.path(), "a.ts", "const a = 1;\n", "first");
        fs::write(tmp.path().join("c.ts"), "export default function x() {}\n").unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new("c.ts")).unwrap();
        index.write().unwrap();

        let diff = GitRepository::new(tmp.path()).staged_diff().unwrap();
        assert!(diff.contains("diff --git a/c.ts b/c.ts"));
        assert!(diff.contains("+export default function x() {}"));
    }
}
