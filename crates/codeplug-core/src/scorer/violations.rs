//! Audit of a project against confirmed conventions and custom rules.
//!
//! Files are processed one at a time: re-parsed, run through the full
//! visitor registry, and every non-conforming finding that maps to a
//! confirmed convention becomes a [`Violation`]. Custom regex rules,
//! directory placement and the optional semantic-fit pass run alongside.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::analyzer::aggregator::{compile_placement_rules, CompiledPlacement};
use crate::analyzer::detector::SEMANTIC_FIT_RULE;
use crate::analyzer::filesystem::discover_source_files;
use crate::analyzer::parser::{parse_file, ParsedFile};
use crate::analyzer::syntax::top_level_symbols;
use crate::analyzer::visitors::naming::{is_compound_stem, CONSTANTS};
use crate::analyzer::visitors::VisitorRegistry;
use crate::config::CodeplugConfig;
use crate::errors::CodeplugResult;
use crate::models::{
    file_extension, file_name, file_stem, Convention, CustomRule, Dimension, Finding, RuleScope,
    Severity, Violation,
};
use crate::semantic::coherence::{file_context, CoherenceScorer};
use crate::semantic::model::{ModelLoader, ModelSession};
use crate::vcs::SourceControl;

const MIN_SEMANTIC_FILES: usize = 3;

static WORD_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Za-z0-9]+").unwrap());

/// Split an identifier into words on separators and lower-to-upper boundaries.
fn split_words(stem: &str) -> Vec<String> {
    let mut words = Vec::new();
    for chunk in WORD_BREAK.split(stem).filter(|c| !c.is_empty()) {
        let mut current = String::new();
        let mut prev_lower = false;
        for ch in chunk.chars() {
            if ch.is_ascii_uppercase() && prev_lower && !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = ch.is_ascii_lowercase() || ch.is_ascii_digit();
            current.push(ch);
        }
        if !current.is_empty() {
            words.push(current);
        }
    }
    words
}

fn capitalize(word: &str) -> String {
    let lower = word.to_ascii_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

pub fn to_pascal_case(stem: &str) -> String {
    split_words(stem).iter().map(|w| capitalize(w)).collect()
}

pub fn to_camel_case(stem: &str) -> String {
    let words = split_words(stem);
    let mut out = String::new();
    for (i, word) in words.iter().enumerate() {
        if i == 0 {
            out.push_str(&word.to_ascii_lowercase());
        } else {
            out.push_str(&capitalize(word));
        }
    }
    out
}

/// Stem rewritten in the case style the rule names, if it names one.
fn convert_stem(stem: &str, rule: &str) -> Option<String> {
    let lower = rule.to_lowercase();
    let converted = if lower.contains("pascalcase") {
        to_pascal_case(stem)
    } else if lower.contains("camelcase") {
        to_camel_case(stem)
    } else {
        return None;
    };
    (!converted.is_empty() && converted != stem).then_some(converted)
}

fn line_of_offset(content: &str, offset: usize) -> u32 {
    content[..offset].bytes().filter(|b| *b == b'\n').count() as u32 + 1
}

// ---------------------------------------------------------------------------
// Custom rules
// ---------------------------------------------------------------------------

/// A custom rule with its pattern compiled.
pub struct CompiledRule<'r> {
    pub rule: &'r CustomRule,
    regex: Regex,
}

/// Compile every rule once per audit; invalid patterns are logged and dropped.
pub fn compile_custom_rules(rules: &[CustomRule]) -> Vec<CompiledRule<'_>> {
    rules
        .iter()
        .filter_map(|rule| match Regex::new(&rule.pattern) {
            Ok(regex) => Some(CompiledRule { rule, regex }),
            Err(e) => {
                debug!(rule = %rule.id, error = %e, "invalid custom rule regex skipped");
                None
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum SemanticPassStatus {
    NotRun,
    Completed { checked: usize },
    Skipped { reason: String },
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditOutcome {
    pub violations: Vec<Violation>,
    pub semantic: SemanticPassStatus,
    pub files_scanned: usize,
}

/// Optional inputs of an audit.
#[derive(Default)]
pub struct AuditOptions<'a> {
    /// Restrict the audit to files changed at or after this instant.
    pub since: Option<DateTime<Utc>>,
    pub custom_rules: &'a [CustomRule],
    pub vcs: Option<&'a dyn SourceControl>,
    pub models: Option<&'a dyn ModelLoader>,
}

// ---------------------------------------------------------------------------
// Detector
// ---------------------------------------------------------------------------

pub struct ViolationDetector {
    config: CodeplugConfig,
    registry: VisitorRegistry,
    placements: Vec<CompiledPlacement>,
}

impl ViolationDetector {
    pub fn new(config: &CodeplugConfig) -> Self {
        Self {
            config: config.clone(),
            registry: VisitorRegistry::with_defaults(),
            placements: compile_placement_rules(&config.structure.effective_directory_placement()),
        }
    }

    pub fn audit(
        &self,
        root: &Path,
        conventions: &[Convention],
        options: &AuditOptions<'_>,
    ) -> AuditOutcome {
        let targets = self.target_files(root, options);
        info!(root = %root.display(), files = targets.len(), "audit started");

        let confirmed: Vec<&Convention> = conventions.iter().filter(|c| c.confirmed).collect();
        let custom_rules = compile_custom_rules(options.custom_rules);
        let mut violations = Vec::new();
        for rel in &targets {
            violations.extend(self.check_custom_rules(root, rel, &custom_rules));
            let Some(file) = parse_file(root, rel) else {
                continue;
            };
            violations.extend(self.check_file(&file, &confirmed));
        }

        let semantic = self.semantic_pass(root, &targets, &confirmed, options.models, &mut violations);
        info!(
            files = targets.len(),
            violations = violations.len(),
            semantic = ?semantic,
            "audit finished"
        );
        AuditOutcome {
            violations,
            semantic,
            files_scanned: targets.len(),
        }
    }

    fn target_files(&self, root: &Path, options: &AuditOptions<'_>) -> Vec<String> {
        let all = discover_source_files(root, &self.config.analysis);
        let Some(since) = options.since else {
            return all;
        };
        let Some(vcs) = options.vcs else {
            warn!("changed-files audit requested without source control; no files selected");
            return Vec::new();
        };
        match vcs.files_changed_since(since) {
            Ok(changed) => {
                let changed: BTreeSet<String> = changed.into_iter().collect();
                all.into_iter().filter(|f| changed.contains(f)).collect()
            }
            Err(e) => {
                warn!(error = %e, "changed files unavailable; no files selected");
                Vec::new()
            }
        }
    }

    /// Custom regex rules for one file. Unreadable files are skipped.
    pub fn check_custom_rules(&self, root: &Path, rel: &str, rules: &[CompiledRule<'_>]) -> Vec<Violation> {
        let mut out = Vec::new();
        let mut content: Option<Option<String>> = None;

        for CompiledRule { rule, regex } in rules {
            let (found, line) = match rule.scope {
                RuleScope::Filename => {
                    let name = file_name(rel);
                    (regex.find(name).map(|m| m.as_str().to_string()), None)
                }
                RuleScope::Path => (regex.find(rel).map(|m| m.as_str().to_string()), None),
                RuleScope::Content => {
                    let text = content.get_or_insert_with(|| {
                        std::fs::read_to_string(root.join(rel))
                            .map_err(|e| debug!(path = %rel, error = %e, "unreadable file skipped"))
                            .ok()
                    });
                    let Some(text) = text.as_deref() else {
                        continue;
                    };
                    match regex.find(text) {
                        Some(m) => (
                            Some(m.as_str().to_string()),
                            Some(line_of_offset(text, m.start())),
                        ),
                        None => (None, None),
                    }
                }
            };
            let Some(found) = found else {
                continue;
            };
            out.push(Violation {
                id: Uuid::new_v4().to_string(),
                convention_id: format!("custom:{}", rule.id),
                severity: rule.severity.unwrap_or(Severity::Medium),
                file: rel.to_string(),
                line,
                message: rule.message.clone(),
                expected: format!("no match for /{}/", rule.pattern),
                found,
                auto_fixable: false,
            });
        }
        out
    }

    /// Convention violations of one parsed file.
    pub fn check_file(&self, file: &ParsedFile, confirmed: &[&Convention]) -> Vec<Violation> {
        let by_key: HashMap<(Dimension, &str), &Convention> = confirmed
            .iter()
            .map(|c| ((c.dimension, c.rule.as_str()), *c))
            .collect();

        let mut out: Vec<Violation> = self
            .registry
            .run_all(file)
            .into_iter()
            .filter(|f| !f.is_conforming())
            .filter_map(|f| {
                let convention = by_key.get(&(f.dimension, f.pattern.as_str()))?;
                Some(finding_violation(file, &f, convention))
            })
            .collect();

        out.extend(self.check_placement(&file.path, confirmed));
        out
    }

    fn check_placement(&self, path: &str, confirmed: &[&Convention]) -> Vec<Violation> {
        let mut out = Vec::new();
        for convention in confirmed.iter().filter(|c| c.dimension == Dimension::Structure) {
            for rule in self.placements.iter().filter(|p| p.pattern_name == convention.rule) {
                if rule.check(path) != Some(false) {
                    continue;
                }
                let name = file_name(path);
                out.push(Violation {
                    id: Uuid::new_v4().to_string(),
                    convention_id: convention.id.clone(),
                    severity: convention.severity,
                    file: path.to_string(),
                    line: None,
                    message: format!("{name} belongs in {}/: {}", rule.dir, convention.rule),
                    expected: format!("{}/{}", rule.dir, name),
                    found: path.to_string(),
                    auto_fixable: false,
                });
            }
        }
        out
    }

    fn semantic_pass(
        &self,
        root: &Path,
        targets: &[String],
        confirmed: &[&Convention],
        models: Option<&dyn ModelLoader>,
        violations: &mut Vec<Violation>,
    ) -> SemanticPassStatus {
        let Some(convention) = confirmed
            .iter()
            .find(|c| c.dimension == Dimension::Naming && c.rule == SEMANTIC_FIT_RULE)
        else {
            return SemanticPassStatus::NotRun;
        };
        if targets.len() < MIN_SEMANTIC_FILES || !self.config.convention.effective_semantic_coherence() {
            return SemanticPassStatus::NotRun;
        }
        let Some(loader) = models else {
            return SemanticPassStatus::Skipped {
                reason: "no model backend configured".into(),
            };
        };

        let mut session = ModelSession::new(loader, &self.config.models, root);
        match self.semantic_violations(root, targets, convention, &mut session) {
            Ok((found, checked)) => {
                violations.extend(found);
                SemanticPassStatus::Completed { checked }
            }
            Err(e) => {
                warn!(error = %e, "semantic pass skipped");
                SemanticPassStatus::Skipped {
                    reason: e.to_string(),
                }
            }
        }
    }

    fn semantic_violations(
        &self,
        root: &Path,
        targets: &[String],
        convention: &Convention,
        session: &mut ModelSession<'_>,
    ) -> CodeplugResult<(Vec<Violation>, usize)> {
        let threshold = self.config.convention.effective_semantic_fit_threshold();
        let mut scorer = CoherenceScorer::new(session, self.config.convention.effective_semantic_method());
        let mut out = Vec::new();
        let mut checked = 0usize;

        for rel in targets {
            if !matches!(file_extension(rel), ".ts" | ".tsx") {
                continue;
            }
            let Some(file) = parse_file(root, rel) else {
                continue;
            };
            let context = file_context(file.stem(), &file.source);
            let mut seen = BTreeSet::new();
            for symbol in top_level_symbols(&file) {
                if !seen.insert(symbol.name.clone()) {
                    continue;
                }
                let score = scorer.score(&symbol.name, &context)?;
                checked += 1;
                if score >= threshold {
                    continue;
                }
                out.push(Violation {
                    id: Uuid::new_v4().to_string(),
                    convention_id: convention.id.clone(),
                    severity: convention.severity,
                    file: rel.clone(),
                    line: None,
                    message: format!(
                        "`{}` does not fit the context of {} (score {:.2})",
                        symbol.name,
                        file_name(rel),
                        score
                    ),
                    expected: format!("exports related to {}", file.stem()),
                    found: symbol.name,
                    auto_fixable: false,
                });
            }
        }
        Ok((out, checked))
    }
}

/// Single-sample naming findings judge the file name; constants are tallies.
fn is_file_name_finding(finding: &Finding) -> bool {
    finding.dimension == Dimension::Naming && finding.is_single_sample() && finding.pattern != CONSTANTS
}

fn finding_violation(file: &ParsedFile, finding: &Finding, convention: &Convention) -> Violation {
    let name = file_name(&file.path);
    let mut expected = convention.rule.clone();
    let mut found = name.to_string();
    let mut auto_fixable = false;

    if let (Some(exp), Some(fnd)) = (&finding.expected, &finding.found) {
        expected = exp.clone();
        found = fnd.clone();
    } else if is_file_name_finding(finding) && !is_compound_stem(file.stem()) {
        if let Some(export) = &finding.export_name {
            expected = format!("{export}{}", file.extension());
            auto_fixable = true;
        } else if let Some(converted) = convert_stem(file_stem(&file.path), &convention.rule) {
            expected = format!("{converted}{}", file.extension());
            auto_fixable = true;
        }
    } else {
        found = format!("{}/{} conforming", finding.count, finding.total);
    }

    Violation {
        id: Uuid::new_v4().to_string(),
        convention_id: convention.id.clone(),
        severity: convention.severity,
        file: file.path.clone(),
        line: None,
        message: format!("{} does not follow: {}", name, convention.rule),
        expected,
        found,
        auto_fixable,
    }
}
