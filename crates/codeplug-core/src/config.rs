//! Configuration sections consumed by the core.
//!
//! Every section deserializes with `#[serde(default)]` and keeps optional
//! fields; `effective_*` accessors resolve the built-in defaults. Loading and
//! merging configuration files is left to the caller.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{CodeplugError, CodeplugResult};
use crate::models::{Dimension, Severity};

/// Environment variable overriding the model cache directory.
pub const MODEL_CACHE_ENV: &str = "CODEPLUG_MODEL_CACHE";

/// Project-local directory holding persisted state.
pub const CODEPLUG_DIR: &str = ".codeplug";

const DEFAULT_BATCH_SIZE: usize = 50;
const DEFAULT_MIN_PATTERN_CONFIDENCE: u32 = 50;
const DEFAULT_CONFIDENCE_THRESHOLD: u32 = 60;
const DEFAULT_SEMANTIC_FIT_THRESHOLD: f64 = 0.6;
const DEFAULT_GATE_THRESHOLD: f64 = 0.7;
const DEFAULT_RECENT_COMMITS: usize = 5;
const DEFAULT_SCORE_THRESHOLD: u32 = 70;
const DEFAULT_TREND_WINDOW: usize = 8;

const DEFAULT_IGNORE: &[&str] = &[
    "node_modules",
    "dist",
    "build",
    "coverage",
    ".codeplug",
    "*.d.ts",
];

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CodeplugConfig {
    pub analysis: AnalysisConfig,
    pub structure: StructureConfig,
    pub convention: ConventionConfig,
    pub drift: DriftConfig,
    pub scoring: ScoringConfig,
    pub models: ModelsConfig,
}

impl CodeplugConfig {
    /// Parse a JSON configuration document.
    pub fn from_json(text: &str) -> CodeplugResult<Self> {
        let config: CodeplugConfig = serde_json::from_str(text)
            .map_err(|e| CodeplugError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> CodeplugResult<()> {
        if self.analysis.batch_size == Some(0) {
            return Err(CodeplugError::Config("analysis.batchSize must be positive".into()));
        }
        if let Some(t) = self.convention.semantic_fit_threshold {
            if !(0.0..=1.0).contains(&t) {
                return Err(CodeplugError::Config(format!(
                    "convention.semanticFitThreshold out of range: {t}"
                )));
            }
        }
        if let Some(t) = self.drift.confidence_threshold {
            if !(0.0..=1.0).contains(&t) {
                return Err(CodeplugError::Config(format!(
                    "drift.confidenceThreshold out of range: {t}"
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalysisConfig {
    /// Include globs; empty means every recognised source file.
    pub include: Vec<String>,
    /// Extra ignore globs on top of the built-in set and `.gitignore`.
    pub ignore: Vec<String>,
    /// Files parsed per batch. Default: 50.
    pub batch_size: Option<usize>,
    /// Parser threads. 0 = rayon default.
    pub threads: Option<usize>,
}

impl AnalysisConfig {
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.unwrap_or(DEFAULT_BATCH_SIZE).max(1)
    }

    pub fn effective_threads(&self) -> usize {
        self.threads.unwrap_or(0)
    }

    pub fn effective_ignore(&self) -> Vec<String> {
        DEFAULT_IGNORE
            .iter()
            .map(|s| s.to_string())
            .chain(self.ignore.iter().cloned())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Structure
// ---------------------------------------------------------------------------

/// Directory names that signal each architecture style.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ArchitectureConfig {
    pub feature_based: Vec<String>,
    pub mvc: Vec<String>,
    pub layered: Vec<String>,
}

impl Default for ArchitectureConfig {
    fn default() -> Self {
        let owned = |xs: &[&str]| xs.iter().map(|s| s.to_string()).collect();
        Self {
            feature_based: owned(&["features", "modules"]),
            mvc: owned(&["models", "views", "controllers"]),
            layered: owned(&["api", "services", "repositories", "domain", "infrastructure"]),
        }
    }
}

/// Files whose stem matches `file_pattern` must live under `dir`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementRule {
    pub file_pattern: String,
    pub dir: String,
    pub pattern_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StructureConfig {
    pub architecture: Option<ArchitectureConfig>,
    pub directory_placement: Option<Vec<PlacementRule>>,
}

impl StructureConfig {
    pub fn effective_architecture(&self) -> ArchitectureConfig {
        self.architecture.clone().unwrap_or_default()
    }

    pub fn effective_directory_placement(&self) -> Vec<PlacementRule> {
        self.directory_placement.clone().unwrap_or_else(|| {
            vec![
                PlacementRule {
                    file_pattern: "^use[A-Z]".into(),
                    dir: "hooks".into(),
                    pattern_name: "Hooks live in hooks/ directory".into(),
                },
                PlacementRule {
                    file_pattern: "[Ss]ervice$".into(),
                    dir: "services".into(),
                    pattern_name: "Services live in services/ directory".into(),
                },
            ]
        })
    }
}

// ---------------------------------------------------------------------------
// Convention detection
// ---------------------------------------------------------------------------

/// Which model signal the semantic-fit check uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SemanticMethod {
    #[default]
    ZeroShot,
    Embedding,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConventionConfig {
    /// Minimum candidate confidence. Default: 60.
    pub confidence_threshold: Option<u32>,
    /// Minimum aggregated pattern confidence. Default: 50.
    pub min_pattern_confidence: Option<u32>,
    pub severity_map: Option<BTreeMap<Dimension, Severity>>,
    pub enable_semantic_coherence: Option<bool>,
    /// Minimum `related` score for an export to fit its file. Default: 0.6.
    pub semantic_fit_threshold: Option<f64>,
    pub semantic_method: Option<SemanticMethod>,
}

impl ConventionConfig {
    pub fn effective_confidence_threshold(&self) -> u32 {
        self.confidence_threshold.unwrap_or(DEFAULT_CONFIDENCE_THRESHOLD)
    }

    pub fn effective_min_pattern_confidence(&self) -> u32 {
        self.min_pattern_confidence
            .unwrap_or(DEFAULT_MIN_PATTERN_CONFIDENCE)
    }

    pub fn effective_semantic_coherence(&self) -> bool {
        self.enable_semantic_coherence.unwrap_or(false)
    }

    pub fn effective_semantic_fit_threshold(&self) -> f64 {
        self.semantic_fit_threshold
            .unwrap_or(DEFAULT_SEMANTIC_FIT_THRESHOLD)
    }

    pub fn effective_semantic_method(&self) -> SemanticMethod {
        self.semantic_method.unwrap_or_default()
    }

    /// Severity for a dimension: configured map, then built-in map.
    pub fn severity_for(&self, dimension: Dimension) -> Severity {
        if let Some(sev) = self.severity_map.as_ref().and_then(|m| m.get(&dimension)) {
            return *sev;
        }
        default_severity(dimension)
    }
}

fn default_severity(dimension: Dimension) -> Severity {
    match dimension {
        Dimension::Structure | Dimension::ErrorHandling => Severity::High,
        Dimension::Testing | Dimension::Imports | Dimension::Git => Severity::Low,
        Dimension::Naming | Dimension::Component | Dimension::State | Dimension::Api => {
            Severity::Medium
        }
    }
}

// ---------------------------------------------------------------------------
// Drift
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DriftConfig {
    /// Results below this confidence are flagged for review. Default: 0.7.
    pub confidence_threshold: Option<f64>,
    /// Commits inspected by the recent-commit scan. Default: 5.
    pub recent_commits: Option<usize>,
}

impl DriftConfig {
    pub fn effective_confidence_threshold(&self) -> f64 {
        self.confidence_threshold.unwrap_or(DEFAULT_GATE_THRESHOLD)
    }

    pub fn effective_recent_commits(&self) -> usize {
        self.recent_commits.unwrap_or(DEFAULT_RECENT_COMMITS)
    }
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Score deduction per violation of each severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityWeights {
    pub critical: u32,
    pub high: u32,
    pub medium: u32,
    pub low: u32,
}

impl Default for SeverityWeights {
    fn default() -> Self {
        Self {
            critical: 15,
            high: 8,
            medium: 3,
            low: 1,
        }
    }
}

impl SeverityWeights {
    pub fn weight(&self, severity: Severity) -> u32 {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScoringConfig {
    pub weights: Option<SeverityWeights>,
    /// Passing score. Default: 70.
    pub threshold: Option<u32>,
    /// Records considered by trend computation. Default: 8.
    pub trend_window: Option<usize>,
}

impl ScoringConfig {
    pub fn effective_weights(&self) -> SeverityWeights {
        self.weights.unwrap_or_default()
    }

    pub fn effective_threshold(&self) -> u32 {
        self.threshold.unwrap_or(DEFAULT_SCORE_THRESHOLD)
    }

    pub fn effective_trend_window(&self) -> usize {
        self.trend_window.unwrap_or(DEFAULT_TREND_WINDOW)
    }
}

// ---------------------------------------------------------------------------
// Models
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    #[default]
    Default,
    Lite,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ModelsConfig {
    pub tier: Option<ModelTier>,
    pub cache_dir: Option<PathBuf>,
}

impl ModelsConfig {
    pub fn effective_tier(&self) -> ModelTier {
        self.tier.unwrap_or_default()
    }

    /// `CODEPLUG_MODEL_CACHE` wins over the configured directory. Relative
    /// paths resolve against the project root.
    pub fn effective_cache_dir(&self, project_root: &Path) -> PathBuf {
        let from_env = std::env::var(MODEL_CACHE_ENV)
            .ok()
            .map(|val| val.trim().to_string())
            .filter(|val| !val.is_empty())
            .map(PathBuf::from);
        let dir = from_env
            .or_else(|| self.cache_dir.clone())
            .unwrap_or_else(|| PathBuf::from(CODEPLUG_DIR).join("models"));
        if dir.is_absolute() {
            dir
        } else {
            project_root.join(dir)
        }
    }
}
