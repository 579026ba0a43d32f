//! Shared typed models used across analysis, auditing, drift and scoring.

use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum number of example paths kept per pattern or convention.
pub const MAX_EXAMPLES: usize = 5;

/// Maximum slug length used when deriving convention ids.
const MAX_SLUG_LEN: usize = 40;

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

/// Derive a short project identifier (first 12 hex chars of SHA-256) from the project path.
pub fn project_hash(project_root: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(project_root.to_string_lossy().as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..12].to_string()
}

/// Deterministic id of a convention: `<dimension>-<slug(rule)>`.
pub fn convention_id(dimension: Dimension, rule: &str) -> String {
    let mut slug = String::with_capacity(rule.len());
    let mut pending_dash = false;
    for ch in rule.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch);
        } else {
            pending_dash = true;
        }
    }
    slug.truncate(MAX_SLUG_LEN);
    format!("{}-{}", dimension.as_str(), slug)
}

/// Final path component of a forward-slash relative path.
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// File name with its last extension removed (`a.test.ts` -> `a.test`).
pub fn file_stem(path: &str) -> &str {
    let name = file_name(path);
    match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    }
}

/// Last extension of the file name including the dot, or `""`.
pub fn file_extension(path: &str) -> &str {
    let name = file_name(path);
    match name.rfind('.') {
        Some(idx) if idx > 0 => &name[idx..],
        _ => "",
    }
}

// ---------------------------------------------------------------------------
// Dimension / Severity
// ---------------------------------------------------------------------------

/// A named axis of convention.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Dimension {
    Naming,
    Structure,
    Component,
    Testing,
    ErrorHandling,
    Imports,
    Git,
    State,
    Api,
}

impl Dimension {
    pub const ALL: [Dimension; 9] = [
        Dimension::Naming,
        Dimension::Structure,
        Dimension::Component,
        Dimension::Testing,
        Dimension::ErrorHandling,
        Dimension::Imports,
        Dimension::Git,
        Dimension::State,
        Dimension::Api,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Naming => "naming",
            Dimension::Structure => "structure",
            Dimension::Component => "component",
            Dimension::Testing => "testing",
            Dimension::ErrorHandling => "error-handling",
            Dimension::Imports => "imports",
            Dimension::Git => "git",
            Dimension::State => "state",
            Dimension::Api => "api",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Violation severity, each with a fixed score-deduction weight.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    /// Most severe first.
    pub const ALL: [Severity; 4] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Findings and patterns
// ---------------------------------------------------------------------------

/// Kind of a file's primary export.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    Class,
    Function,
    Variable,
    Interface,
    Type,
    Enum,
}

/// One visitor's observation on one file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub dimension: Dimension,
    pub pattern: String,
    /// Conforming instances.
    pub count: u32,
    /// Observed instances.
    pub total: u32,
    pub example: Option<String>,
    /// Identifier the convention expects (class-name mismatch).
    pub expected: Option<String>,
    /// Identifier actually found (class-name mismatch).
    pub found: Option<String>,
    /// Name of the primary export when it can serve as a rename target.
    pub export_name: Option<String>,
    pub export_kind: Option<ExportKind>,
}

impl Finding {
    /// A multi-instance tally. `count` is clamped to `total`.
    pub fn tally(
        dimension: Dimension,
        pattern: impl Into<String>,
        count: u32,
        total: u32,
        example: &str,
    ) -> Self {
        Self {
            dimension,
            pattern: pattern.into(),
            count: count.min(total),
            total,
            example: Some(example.to_string()),
            expected: None,
            found: None,
            export_name: None,
            export_kind: None,
        }
    }

    /// A single conforming or non-conforming sample.
    pub fn sample(
        dimension: Dimension,
        pattern: impl Into<String>,
        conforming: bool,
        example: &str,
    ) -> Self {
        Self::tally(dimension, pattern, u32::from(conforming), 1, example)
    }

    pub fn is_conforming(&self) -> bool {
        self.count >= self.total
    }

    pub fn is_single_sample(&self) -> bool {
        self.total == 1
    }
}

/// A confidence-scored pattern aggregated across the project.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedPattern {
    pub dimension: Dimension,
    pub pattern: String,
    pub frequency: u32,
    pub total: u32,
    pub confidence: u32,
    pub examples: Vec<String>,
}

/// Round(100 * count / total); 0 when total is 0.
pub fn confidence_percent(count: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    ((f64::from(count) / f64::from(total)) * 100.0).round() as u32
}

// ---------------------------------------------------------------------------
// Conventions and rules
// ---------------------------------------------------------------------------

/// A detected pattern offered for confirmation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConventionCandidate {
    pub id: String,
    pub dimension: Dimension,
    pub rule: String,
    pub confidence: u32,
    pub examples: Vec<String>,
    pub severity: Severity,
}

/// A persisted convention.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Convention {
    pub id: String,
    pub dimension: Dimension,
    pub rule: String,
    pub confidence: u32,
    pub confirmed: bool,
    pub examples: Vec<String>,
    pub severity: Severity,
}

impl Convention {
    pub fn from_candidate(candidate: ConventionCandidate, confirmed: bool) -> Self {
        Self {
            id: candidate.id,
            dimension: candidate.dimension,
            rule: candidate.rule,
            confidence: candidate.confidence,
            confirmed,
            examples: candidate.examples,
            severity: candidate.severity,
        }
    }
}

/// What a custom rule's regex is tested against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleScope {
    Filename,
    Path,
    Content,
}

/// A user-authored regex rule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomRule {
    pub id: String,
    pub pattern: String,
    pub scope: RuleScope,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
}

// ---------------------------------------------------------------------------
// Violations and drift
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub id: String,
    pub convention_id: String,
    pub severity: Severity,
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    pub message: String,
    pub expected: String,
    pub found: String,
    pub auto_fixable: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Following,
    Ambiguous,
    Drifting,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Following => "following",
            Classification::Ambiguous => "ambiguous",
            Classification::Drifting => "drifting",
        }
    }
}

/// Classification of one diff hunk against one convention.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriftResult {
    pub file: String,
    pub convention_id: String,
    pub dimension: Dimension,
    pub rule: String,
    pub classification: Classification,
    pub confidence: f64,
    pub detail: String,
    pub needs_review: bool,
}

// ---------------------------------------------------------------------------
// Scores
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Stable,
    Declining,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Improving => "improving",
            Trend::Stable => "stable",
            Trend::Declining => "declining",
        }
    }
}

/// Violation counts per severity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityBreakdown {
    pub critical: u32,
    pub high: u32,
    pub medium: u32,
    pub low: u32,
}

impl SeverityBreakdown {
    pub fn get(&self, severity: Severity) -> u32 {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
        }
    }

    pub fn increment(&mut self, severity: Severity) {
        match severity {
            Severity::Critical => self.critical += 1,
            Severity::High => self.high += 1,
            Severity::Medium => self.medium += 1,
            Severity::Low => self.low += 1,
        }
    }
}

/// One persisted point of the compliance time series.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRecord {
    pub id: String,
    pub project_hash: String,
    pub score: u32,
    pub breakdown: SeverityBreakdown,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceScore {
    pub total: u32,
    pub breakdown: SeverityBreakdown,
    pub violation_count: usize,
    pub threshold: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend: Option<Trend>,
}

impl ComplianceScore {
    pub fn passed(&self) -> bool {
        self.total >= self.threshold
    }
}

// ---------------------------------------------------------------------------
// Analysis output
// ---------------------------------------------------------------------------

/// Directory tree built from discovered source paths.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderNode {
    pub name: String,
    pub path: String,
    pub children: Vec<FolderNode>,
    pub file_count: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub file_count: usize,
    pub duration_ms: u64,
    pub patterns: Vec<DetectedPattern>,
    pub folder_structure: FolderNode,
    pub file_paths: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convention_id_slug() {
        assert_eq!(
            convention_id(Dimension::Naming, "React components use PascalCase file names"),
            "naming-react-components-use-pascalcase-file-nam"
        );
        assert_eq!(
            convention_id(Dimension::Structure, "src/ root directory convention"),
            "structure-src-root-directory-convention"
        );
        assert_eq!(
            convention_id(Dimension::Naming, "Hooks use \"use\" prefix with camelCase"),
            "naming-hooks-use-use-prefix-with-camelcase"
        );
    }

    #[test]
    fn test_convention_id_deterministic() {
        let a = convention_id(Dimension::ErrorHandling, "Try/catch error handling");
        let b = convention_id(Dimension::ErrorHandling, "Try/catch error handling");
        assert_eq!(a, b);
        assert_eq!(a, "error-handling-try-catch-error-handling");
    }

    #[test]
    fn test_project_hash_length() {
        let hash = project_hash(Path::new("/tmp/project"));
        assert_eq!(hash.len(), 12);
        assert_eq!(hash, project_hash(Path::new("/tmp/project")));
        assert_ne!(hash, project_hash(Path::new("/tmp/other")));
    }

    #[test]
    fn test_file_stem_and_extension() {
        assert_eq!(file_stem("src/utils/auth_helper.ts"), "auth_helper");
        assert_eq!(file_stem("src/a.test.ts"), "a.test");
        assert_eq!(file_extension("src/a.test.ts"), ".ts");
        assert_eq!(file_extension("Makefile"), "");
        assert_eq!(file_stem(".eslintrc"), ".eslintrc");
        assert_eq!(file_name("a/b/c.tsx"), "c.tsx");
    }

    #[test]
    fn test_confidence_percent_rounds() {
        assert_eq!(confidence_percent(2, 3), 67);
        assert_eq!(confidence_percent(1, 2), 50);
        assert_eq!(confidence_percent(0, 0), 0);
        assert_eq!(confidence_percent(5, 5), 100);
    }

    #[test]
    fn test_finding_tally_clamps_count() {
        let f = Finding::tally(Dimension::Imports, "x", 5, 3, "a.ts");
        assert_eq!(f.count, 3);
        assert!(f.is_conforming());
    }

    #[test]
    fn test_dimension_wire_format() {
        let json = serde_json::to_string(&Dimension::ErrorHandling).unwrap();
        assert_eq!(json, "\"error-handling\"");
        let back: Dimension = serde_json::from_str("\"api\"").unwrap();
        assert_eq!(back, Dimension::Api);
        assert!(serde_json::from_str::<Dimension>("\"unknown\"").is_err());
    }

    #[test]
    fn test_violation_camel_case_keys() {
        let v = Violation {
            id: "v1".into(),
            convention_id: "naming-x".into(),
            severity: Severity::Medium,
            file: "a.ts".into(),
            line: None,
            message: "m".into(),
            expected: "b.ts".into(),
            found: "a.ts".into(),
            auto_fixable: true,
        };
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["conventionId"], "naming-x");
        assert_eq!(json["autoFixable"], true);
        assert!(json.get("line").is_none());
    }
}
