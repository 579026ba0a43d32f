//! Severity-weighted compliance scoring.

use std::fmt::Write as _;
use std::path::Path;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::config::{ScoringConfig, SeverityWeights};
use crate::errors::CodeplugResult;
use crate::models::{project_hash, ComplianceScore, ScoreRecord, Severity, SeverityBreakdown, Violation};
use crate::scorer::trend::TrendTracker;
use crate::store::ScoreStore;

pub struct ComplianceScorer {
    weights: SeverityWeights,
    threshold: u32,
    trend_window: usize,
}

impl ComplianceScorer {
    pub fn new(config: &ScoringConfig) -> Self {
        Self {
            weights: config.effective_weights(),
            threshold: config.effective_threshold(),
            trend_window: config.effective_trend_window(),
        }
    }

    /// 100 minus the weight of every violation, floored at 0.
    pub fn calculate(&self, violations: &[Violation]) -> ComplianceScore {
        let mut breakdown = SeverityBreakdown::default();
        let mut deduction = 0u32;
        for v in violations {
            breakdown.increment(v.severity);
            deduction = deduction.saturating_add(self.weights.weight(v.severity));
        }
        ComplianceScore {
            total: 100u32.saturating_sub(deduction),
            breakdown,
            violation_count: violations.len(),
            threshold: self.threshold,
            trend: None,
        }
    }

    /// Score, append to the project's score store and attach the trend.
    pub fn score_and_persist(
        &self,
        violations: &[Violation],
        project_root: &Path,
    ) -> CodeplugResult<ComplianceScore> {
        let store = ScoreStore::for_project(project_root)?;
        self.score_into(&store, violations, project_root)
    }

    pub fn score_into(
        &self,
        store: &ScoreStore,
        violations: &[Violation],
        project_root: &Path,
    ) -> CodeplugResult<ComplianceScore> {
        let mut score = self.calculate(violations);
        let record = ScoreRecord {
            id: Uuid::new_v4().to_string(),
            project_hash: project_hash(project_root),
            score: score.total,
            breakdown: score.breakdown,
            created_at: Utc::now(),
        };
        store.insert(&record)?;

        let history = store.history(&record.project_hash, self.trend_window)?;
        let trend = TrendTracker::compute_trend(&history);
        score.trend = Some(trend);
        info!(
            project = %record.project_hash,
            score = score.total,
            violations = score.violation_count,
            trend = trend.as_str(),
            "compliance score recorded"
        );
        Ok(score)
    }

    /// Text report grouped by severity, most severe first.
    pub fn render_report(&self, score: &ComplianceScore, violations: &[Violation]) -> String {
        let mut out = String::new();
        let verdict = if score.passed() { "PASS" } else { "FAIL" };
        let _ = writeln!(
            out,
            "Compliance score: {}/100 ({verdict}, threshold {})",
            score.total, score.threshold
        );
        if let Some(trend) = score.trend {
            let _ = writeln!(out, "Trend: {}", trend.as_str());
        }
        let b = &score.breakdown;
        let _ = writeln!(
            out,
            "Violations: {} (critical {}, high {}, medium {}, low {})",
            score.violation_count, b.critical, b.high, b.medium, b.low
        );

        for severity in Severity::ALL {
            let group: Vec<&Violation> = violations.iter().filter(|v| v.severity == severity).collect();
            if group.is_empty() {
                continue;
            }
            let _ = writeln!(out, "\n{} ({})", severity.as_str().to_uppercase(), group.len());
            for v in group {
                let location = match v.line {
                    Some(line) => format!("{}:{line}", v.file),
                    None => v.file.clone(),
                };
                let fix = if v.auto_fixable { " [fixable]" } else { "" };
                let _ = writeln!(out, "  {location} {}{fix}", v.message);
                let _ = writeln!(out, "      expected: {}  found: {}", v.expected, v.found);
            }
        }
        out
    }
}

impl Default for ComplianceScorer {
    fn default() -> Self {
        Self::new(&ScoringConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Trend;

    fn violation(severity: Severity) -> Violation {
        Violation {
            id: Uuid::new_v4().to_string(),
            convention_id: "c".into(),
            severity,
            file: "src/a.ts".into(),
            line: None,
            message: "m".into(),
            expected: "e".into(),
            found: "f".into(),
            auto_fixable: false,
        }
    }

    #[test]
    fn test_critical_plus_high() {
        let score = ComplianceScorer::default()
            .calculate(&[violation(Severity::Critical), violation(Severity::High)]);
        assert_eq!(score.total, 77);
        assert_eq!(
            score.breakdown,
            SeverityBreakdown {
                critical: 1,
                high: 1,
                medium: 0,
                low: 0
            }
        );
        assert!(score.passed());
    }

    #[test]
    fn test_floor_at_zero() {
        let many: Vec<Violation> = (0..10).map(|_| violation(Severity::Critical)).collect();
        let score = ComplianceScorer::default().calculate(&many);
        assert_eq!(score.total, 0);
        assert!(!score.passed());
        assert_eq!(ComplianceScorer::default().calculate(&[]).total, 100);
    }

    #[test]
    fn test_custom_weights() {
        let config = ScoringConfig {
            weights: Some(SeverityWeights {
                low: 5,
                ..Default::default()
            }),
            threshold: Some(99),
            ..Default::default()
        };
        let score = ComplianceScorer::new(&config).calculate(&[violation(Severity::Low)]);
        assert_eq!(score.total, 95);
        assert!(!score.passed());
    }

    #[test]
    fn test_score_and_persist_trend() {
        let tmp = tempfile::tempdir().unwrap();
        let scorer = ComplianceScorer::default();
        let first = scorer.score_and_persist(&[], tmp.path()).unwrap();
        assert_eq!(first.trend, Some(Trend::Stable));

        let store = ScoreStore::for_project(tmp.path()).unwrap();
        let high: Vec<Violation> = (0..3).map(|_| violation(Severity::High)).collect();
        let second = scorer.score_into(&store, &high, tmp.path()).unwrap();
        assert_eq!(second.total, 76);
        assert_eq!(second.trend, Some(Trend::Declining));
        assert_eq!(store.history(&project_hash(tmp.path()), 8).unwrap().len(), 2);
    }

    #[test]
    fn test_render_report_groups() {
        let scorer = ComplianceScorer::default();
        let mut low = violation(Severity::Low);
        low.line = Some(4);
        let violations = vec![low, violation(Severity::Critical)];
        let score = scorer.calculate(&violations);
        let report = scorer.render_report(&score, &violations);
        assert!(report.starts_with("Compliance score: 84/100 (PASS, threshold 70)"));
        let critical = report.find("CRITICAL (1)").unwrap();
        let low = report.find("LOW (1)").unwrap();
        assert!(critical < low);
        assert!(report.contains("src/a.ts:4 m"));
    }
}
