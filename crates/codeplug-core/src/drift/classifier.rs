//! Drift classification of diffs against confirmed conventions.

use std::fmt::Write as _;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::DriftConfig;
use crate::drift::diff::parse_unified_diff;
use crate::drift::gate::ConfidenceGate;
use crate::drift::matchers::{default_matchers, MatcherMap};
use crate::models::{Classification, Convention, DriftResult};
use crate::vcs::{CommitInfo, SourceControl};

/// Results for one inspected commit.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitDrift {
    pub commit: CommitInfo,
    pub results: Vec<DriftResult>,
}

/// Outcome of a recent-commit scan.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriftReport {
    pub commits: Vec<CommitDrift>,
    /// Set when the scan could not run; `commits` is then empty.
    pub aborted: Option<String>,
}

impl DriftReport {
    fn aborted(reason: impl Into<String>) -> Self {
        Self {
            commits: Vec::new(),
            aborted: Some(reason.into()),
        }
    }

    /// All results, drifting first then ambiguous.
    pub fn grouped(&self) -> Vec<&DriftResult> {
        let all = self.commits.iter().flat_map(|c| c.results.iter());
        let mut drifting: Vec<&DriftResult> = all
            .clone()
            .filter(|r| r.classification == Classification::Drifting)
            .collect();
        drifting.extend(all.filter(|r| r.classification == Classification::Ambiguous));
        drifting
    }

    pub fn is_clean(&self) -> bool {
        self.commits.iter().all(|c| c.results.is_empty())
    }

    pub fn render(&self) -> String {
        if let Some(reason) = &self.aborted {
            return format!("Drift check skipped: {reason}\n");
        }
        if self.is_clean() {
            return format!(
                "No drift detected across {} commit(s).\n",
                self.commits.len()
            );
        }

        let mut out = String::new();
        for (label, class) in [
            ("Drifting", Classification::Drifting),
            ("Ambiguous", Classification::Ambiguous),
        ] {
            let rows: Vec<(&CommitInfo, &DriftResult)> = self
                .commits
                .iter()
                .flat_map(|c| c.results.iter().map(move |r| (&c.commit, r)))
                .filter(|(_, r)| r.classification == class)
                .collect();
            if rows.is_empty() {
                continue;
            }
            let _ = writeln!(out, "{label} ({}):", rows.len());
            for (commit, r) in rows {
                let review = if r.needs_review { " [review]" } else { "" };
                let _ = writeln!(
                    out,
                    "  {} {} [{}] {} ({:.0}%){review}",
                    commit.short_hash(),
                    r.file,
                    r.dimension,
                    r.rule,
                    r.confidence * 100.0
                );
                let _ = writeln!(out, "      {}", r.detail);
            }
        }
        out
    }
}

pub struct DriftClassifier {
    matchers: MatcherMap,
    gate: ConfidenceGate,
    recent_commits: usize,
}

impl DriftClassifier {
    pub fn new(config: &DriftConfig) -> Self {
        Self {
            matchers: default_matchers(),
            gate: ConfidenceGate::new(config.effective_confidence_threshold()),
            recent_commits: config.effective_recent_commits(),
        }
    }

    pub fn with_matchers(mut self, matchers: MatcherMap) -> Self {
        self.matchers = matchers;
        self
    }

    /// Classify every file of `diff` against each confirmed convention that
    /// has a matcher for its dimension.
    pub fn classify_diff(&self, diff: &str, conventions: &[Convention]) -> Vec<DriftResult> {
        if diff.trim().is_empty() {
            return Vec::new();
        }
        let confirmed: Vec<&Convention> = conventions.iter().filter(|c| c.confirmed).collect();
        if confirmed.is_empty() {
            return Vec::new();
        }

        let mut results = Vec::new();
        for hunk in parse_unified_diff(diff) {
            for convention in &confirmed {
                let Some(matcher) = self.matchers.get(&convention.dimension) else {
                    continue;
                };
                let Some(outcome) = matcher.check(&hunk, convention) else {
                    continue;
                };
                let gated = self.gate.gate(outcome.classification, outcome.confidence);
                results.push(DriftResult {
                    file: hunk.file.clone(),
                    convention_id: convention.id.clone(),
                    dimension: convention.dimension,
                    rule: convention.rule.clone(),
                    classification: gated.classification,
                    confidence: gated.confidence,
                    detail: outcome.detail,
                    needs_review: gated.needs_review,
                });
            }
        }
        results
    }

    /// Classify the last N commits independently. Any history or diff
    /// failure aborts the whole scan.
    pub fn check_recent_commits(
        &self,
        vcs: &dyn SourceControl,
        conventions: &[Convention],
    ) -> DriftReport {
        if !vcs.is_repository() {
            warn!("drift check skipped: not a repository");
            return DriftReport::aborted("not a git repository");
        }
        let commits = match vcs.recent_commits(self.recent_commits) {
            Ok(commits) => commits,
            Err(e) => {
                warn!(error = %e, "drift check aborted: history unavailable");
                return DriftReport::aborted(e.to_string());
            }
        };

        let mut report = DriftReport::default();
        for commit in commits {
            let diff = match vcs.diff_for_commit(&commit.hash) {
                Ok(diff) => diff,
                Err(e) => {
                    warn!(commit = %commit.short_hash(), error = %e, "drift check aborted: diff unavailable");
                    return DriftReport::aborted(e.to_string());
                }
            };
            let results = self.classify_diff(&diff, conventions);
            report.commits.push(CommitDrift { commit, results });
        }

        let grouped = report.grouped();
        info!(
            commits = report.commits.len(),
            drifting = grouped
                .iter()
                .filter(|r| r.classification == Classification::Drifting)
                .count(),
            results = grouped.len(),
            "drift check finished"
        );
        report
    }

    /// Classify the staged changes.
    pub fn check_staged(
        &self,
        vcs: &dyn SourceControl,
        conventions: &[Convention],
    ) -> Vec<DriftResult> {
        match vcs.staged_diff() {
            Ok(diff) => self.classify_diff(&diff, conventions),
            Err(e) => {
                warn!(error = %e, "staged drift check skipped");
                Vec::new()
            }
        }
    }
}

impl Default for DriftClassifier {
    fn default() -> Self {
        Self::new(&DriftConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{CodeplugError, CodeplugResult};
    use crate::models::{convention_id, Dimension, Severity};
    use chrono::{DateTime, Utc};

    fn camel_convention(confirmed: bool) -> Convention {
        let rule = "Use camelCase for variables and functions";
        Convention {
            id: convention_id(Dimension::Naming, rule),
            dimension: Dimension::Naming,
            rule: rule.into(),
            confidence: 90,
            confirmed,
            examples: vec![],
            severity: Severity::Medium,
        }
    }

    const SNAKE_DIFF: &str = "\
diff --git a/src/user.ts b/src/user.ts
--- a/src/user.ts
+++ b/src/user.ts
@@ -0,0 +1 @@
+const user_name = \"alice\";
";

    struct FakeVcs {
        repo: bool,
        fail_diff: bool,
    }

    impl SourceControl for FakeVcs {
        fn is_repository(&self) -> bool {
            self.repo
        }

        fn recent_commits(&self, limit: usize) -> CodeplugResult<Vec<CommitInfo>> {
            let all = ["aaaaaaa1", "bbbbbbb2"].map(|h| CommitInfo {
                hash: h.into(),
                date: DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap(),
                message: "change".into(),
                author: "dev".into(),
            });
            Ok(all.into_iter().take(limit).collect())
        }

        fn diff_for_commit(&self, hash: &str) -> CodeplugResult<String> {
            if self.fail_diff && hash.starts_with('b') {
                return Err(CodeplugError::SourceControl("bad object".into()));
            }
            Ok(SNAKE_DIFF.to_string())
        }

        fn staged_diff(&self) -> CodeplugResult<String> {
            Err(CodeplugError::SourceControl("no index".into()))
        }

        fn files_changed_since(&self, _since: DateTime<Utc>) -> CodeplugResult<Vec<String>> {
            Ok(vec![])
        }
    }

    #[test]
    fn test_classify_snake_case_against_camel() {
        let results = DriftClassifier::default().classify_diff(SNAKE_DIFF, &[camel_convention(true)]);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].dimension, Dimension::Naming);
        assert_eq!(results[0].classification, Classification::Drifting);
        assert!(!results[0].needs_review);
    }

    #[test]
    fn test_empty_inputs_yield_nothing() {
        let classifier = DriftClassifier::default();
        assert!(classifier.classify_diff("", &[camel_convention(true)]).is_empty());
        assert!(classifier.classify_diff(SNAKE_DIFF, &[]).is_empty());
        assert!(classifier
            .classify_diff(SNAKE_DIFF, &[camel_convention(false)])
            .is_empty());
    }

    #[test]
    fn test_recent_commits_not_repository() {
        let vcs = FakeVcs { repo: false, fail_diff: false };
        let report = DriftClassifier::default().check_recent_commits(&vcs, &[camel_convention(true)]);
        assert!(report.aborted.is_some());
        assert!(report.commits.is_empty());
        assert!(report.render().starts_with("Drift check skipped"));
    }

    #[test]
    fn test_recent_commits_diff_failure_aborts() {
        let vcs = FakeVcs { repo: true, fail_diff: true };
        let report = DriftClassifier::default().check_recent_commits(&vcs, &[camel_convention(true)]);
        assert!(report.aborted.is_some());
        assert!(report.commits.is_empty());
    }

    #[test]
    fn test_recent_commits_grouped() {
        let vcs = FakeVcs { repo: true, fail_diff: false };
        let report = DriftClassifier::default().check_recent_commits(&vcs, &[camel_convention(true)]);
        assert!(report.aborted.is_none());
        assert_eq!(report.commits.len(), 2);
        assert_eq!(report.grouped().len(), 2);
        let text = report.render();
        assert!(text.starts_with("Drifting (2):"));
        assert!(text.contains("aaaaaaa src/user.ts"));
    }

    #[test]
    fn test_check_staged_failure_is_empty() {
        let vcs = FakeVcs { repo: true, fail_diff: false };
        assert!(DriftClassifier::default()
            .check_staged(&vcs, &[camel_convention(true)])
            .is_empty());
    }
}
