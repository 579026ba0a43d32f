//! Promotion of detected patterns into convention candidates.

use std::collections::HashSet;

use crate::analyzer::folders::{dir_exists, dirs_from_paths};
use crate::config::{ConventionConfig, StructureConfig};
use crate::models::{
    convention_id, AnalysisResult, Convention, ConventionCandidate, Dimension, Severity,
    MAX_EXAMPLES,
};

/// Rule text of the semantic-fit placeholder convention.
pub const SEMANTIC_FIT_RULE: &str = "Export semantically fits file context";

pub struct ConventionDetector {
    convention: ConventionConfig,
    structure: StructureConfig,
}

impl ConventionDetector {
    pub fn new(convention: ConventionConfig, structure: StructureConfig) -> Self {
        Self {
            convention,
            structure,
        }
    }

    pub fn detect(&self, analysis: &AnalysisResult) -> Vec<ConventionCandidate> {
        let threshold = self.convention.effective_confidence_threshold();
        let mut candidates: Vec<ConventionCandidate> = analysis
            .patterns
            .iter()
            .filter(|p| p.confidence >= threshold)
            .map(|p| ConventionCandidate {
                id: convention_id(p.dimension, &p.pattern),
                dimension: p.dimension,
                rule: p.pattern.clone(),
                confidence: p.confidence,
                examples: p.examples.iter().take(MAX_EXAMPLES).cloned().collect(),
                severity: self.convention.severity_for(p.dimension),
            })
            .collect();

        let mut existing: HashSet<(Dimension, String)> = candidates
            .iter()
            .map(|c| (c.dimension, c.rule.clone()))
            .collect();

        self.bootstrap_directory_placement(analysis, &mut existing, &mut candidates);
        self.bootstrap_semantic(&mut existing, &mut candidates);

        candidates.sort_by(|a, b| b.confidence.cmp(&a.confidence));
        candidates
    }

    fn bootstrap_directory_placement(
        &self,
        analysis: &AnalysisResult,
        existing: &mut HashSet<(Dimension, String)>,
        candidates: &mut Vec<ConventionCandidate>,
    ) {
        let dirs = dirs_from_paths(&analysis.file_paths);
        let severity = self
            .convention
            .severity_map
            .as_ref()
            .and_then(|m| m.get(&Dimension::Structure).copied())
            .unwrap_or(Severity::High);

        for rule in self.structure.effective_directory_placement() {
            if !dir_exists(&dirs, &rule.dir) {
                continue;
            }
            let key = (Dimension::Structure, rule.pattern_name.clone());
            if existing.contains(&key) {
                continue;
            }
            candidates.push(ConventionCandidate {
                id: convention_id(Dimension::Structure, &rule.pattern_name),
                dimension: Dimension::Structure,
                rule: rule.pattern_name,
                confidence: 100,
                examples: Vec::new(),
                severity,
            });
            existing.insert(key);
        }
    }

    fn bootstrap_semantic(
        &self,
        existing: &mut HashSet<(Dimension, String)>,
        candidates: &mut Vec<ConventionCandidate>,
    ) {
        if !self.convention.effective_semantic_coherence() {
            return;
        }
        let key = (Dimension::Naming, SEMANTIC_FIT_RULE.to_string());
        if !existing.insert(key) {
            return;
        }
        candidates.push(ConventionCandidate {
            id: convention_id(Dimension::Naming, SEMANTIC_FIT_RULE),
            dimension: Dimension::Naming,
            rule: SEMANTIC_FIT_RULE.to_string(),
            confidence: 100,
            examples: Vec::new(),
            severity: self.convention.severity_for(Dimension::Naming),
        });
    }
}

/// Accept every candidate as a confirmed convention.
pub fn confirm_all(candidates: Vec<ConventionCandidate>) -> Vec<Convention> {
    candidates
        .into_iter()
        .map(|c| Convention::from_candidate(c, true))
        .collect()
}
