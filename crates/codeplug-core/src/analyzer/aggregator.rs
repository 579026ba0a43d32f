//! Confidence-weighted aggregation of visitor findings across a project.

use indexmap::IndexMap;
use regex::Regex;
use tracing::{debug, warn};

use crate::analyzer::folders::{collect_all_dirs, dir_exists};
use crate::analyzer::parser::ParsedFile;
use crate::analyzer::visitors::VisitorRegistry;
use crate::config::{ConventionConfig, PlacementRule, StructureConfig};
use crate::models::{
    confidence_percent, file_stem, DetectedPattern, Dimension, Finding, FolderNode, MAX_EXAMPLES,
};

pub const FEATURE_BASED: &str = "Feature-based folder structure";
pub const MVC: &str = "MVC folder structure";
pub const LAYERED: &str = "Layered architecture folder structure";
pub const SRC_ROOT: &str = "src/ root directory convention";

#[derive(Debug, Clone, Default)]
struct Accumulator {
    count: u32,
    total: u32,
    examples: Vec<String>,
}

/// A directory-placement rule with its regex compiled.
#[derive(Debug, Clone)]
pub struct CompiledPlacement {
    pub regex: Regex,
    pub dir: String,
    pub pattern_name: String,
}

impl CompiledPlacement {
    /// `None` when the stem is outside the rule; else whether the file lives under `dir`.
    pub fn check(&self, path: &str) -> Option<bool> {
        if !self.regex.is_match(file_stem(path)) {
            return None;
        }
        let segments: Vec<&str> = path.split('/').collect();
        let dirs = &segments[..segments.len().saturating_sub(1)];
        Some(dirs.contains(&self.dir.as_str()))
    }
}

/// Compile placement rules, skipping (and logging) those with an invalid regex.
pub fn compile_placement_rules(rules: &[PlacementRule]) -> Vec<CompiledPlacement> {
    rules
        .iter()
        .filter_map(|rule| match Regex::new(&rule.file_pattern) {
            Ok(regex) => Some(CompiledPlacement {
                regex,
                dir: rule.dir.clone(),
                pattern_name: rule.pattern_name.clone(),
            }),
            Err(e) => {
                warn!(rule = %rule.pattern_name, error = %e, "invalid placement regex skipped");
                None
            }
        })
        .collect()
}

/// Merges per-file findings into project-wide patterns.
pub struct PatternAggregator {
    accumulators: IndexMap<(Dimension, String), Accumulator>,
    registry: VisitorRegistry,
    structure: StructureConfig,
    min_pattern_confidence: u32,
}

impl PatternAggregator {
    pub fn new(structure: StructureConfig, convention: &ConventionConfig) -> Self {
        Self {
            accumulators: IndexMap::new(),
            registry: VisitorRegistry::with_defaults(),
            structure,
            min_pattern_confidence: convention.effective_min_pattern_confidence(),
        }
    }

    pub fn with_registry(mut self, registry: VisitorRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Run every visitor over every file of the batch.
    pub fn ingest(&mut self, batch: &[ParsedFile]) {
        for file in batch {
            let findings = self.registry.run_all(file);
            self.ingest_findings(findings);
        }
        debug!(files = batch.len(), keys = self.accumulators.len(), "batch ingested");
    }

    pub fn ingest_findings(&mut self, findings: impl IntoIterator<Item = Finding>) {
        for finding in findings {
            let acc = self
                .accumulators
                .entry((finding.dimension, finding.pattern))
                .or_default();
            acc.count += finding.count;
            acc.total += finding.total;
            if let Some(example) = finding.example {
                if acc.examples.len() < MAX_EXAMPLES {
                    acc.examples.push(example);
                }
            }
        }
    }

    /// Whole-project structural patterns. Run once after every batch.
    pub fn ingest_structure(&mut self, tree: &FolderNode, file_paths: &[String]) {
        let all_dirs = collect_all_dirs(tree);
        if !file_paths.is_empty() {
            self.ingest_directory_placement(file_paths, &all_dirs);
        }

        let top_dirs: Vec<String> = tree.children.iter().map(|c| c.name.clone()).collect();
        let present = |names: &[String]| names.iter().filter(|n| top_dirs.contains(n)).count();

        let arch = self.structure.effective_architecture();
        if present(&arch.feature_based) >= 1 {
            self.add_structure_pattern(FEATURE_BASED, top_dirs.clone());
        } else if present(&arch.mvc) >= 2 {
            self.add_structure_pattern(MVC, top_dirs.clone());
        } else if present(&arch.layered) >= 2 {
            self.add_structure_pattern(LAYERED, top_dirs.clone());
        }

        if top_dirs.iter().any(|d| d == "src") {
            self.add_structure_pattern(SRC_ROOT, vec!["src/".to_string()]);
        }
    }

    fn ingest_directory_placement(
        &mut self,
        file_paths: &[String],
        all_dirs: &std::collections::BTreeSet<String>,
    ) {
        let rules: Vec<PlacementRule> = self
            .structure
            .effective_directory_placement()
            .into_iter()
            .filter(|r| dir_exists(all_dirs, &r.dir))
            .collect();

        for rule in compile_placement_rules(&rules) {
            let mut acc = Accumulator::default();
            for path in file_paths {
                let Some(conforming) = rule.check(path) else {
                    continue;
                };
                acc.total += 1;
                if conforming {
                    acc.count += 1;
                }
                if acc.examples.len() < MAX_EXAMPLES {
                    acc.examples.push(path.clone());
                }
            }
            if acc.total > 0 {
                self.accumulators
                    .insert((Dimension::Structure, rule.pattern_name), acc);
            }
        }
    }

    fn add_structure_pattern(&mut self, pattern: &str, examples: Vec<String>) {
        self.accumulators.insert(
            (Dimension::Structure, pattern.to_string()),
            Accumulator {
                count: 1,
                total: 1,
                examples: examples.into_iter().take(MAX_EXAMPLES).collect(),
            },
        );
    }

    /// Patterns at or above the minimum confidence, most confident first.
    pub fn patterns(&self) -> Vec<DetectedPattern> {
        let mut out: Vec<DetectedPattern> = self
            .accumulators
            .iter()
            .filter(|(_, acc)| acc.total > 0)
            .filter_map(|((dimension, pattern), acc)| {
                let confidence = confidence_percent(acc.count, acc.total);
                (confidence >= self.min_pattern_confidence).then(|| DetectedPattern {
                    dimension: *dimension,
                    pattern: pattern.clone(),
                    frequency: acc.count,
                    total: acc.total,
                    confidence,
                    examples: acc.examples.clone(),
                })
            })
            .collect();
        out.sort_by(|a, b| b.confidence.cmp(&a.confidence));
        out
    }
}
