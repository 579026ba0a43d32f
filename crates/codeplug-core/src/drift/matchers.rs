//! Dimension-specific drift heuristics.
//!
//! Matchers are registered per [`Dimension`]; a dimension without a matcher
//! is never classified.

use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

use regex::Regex;

use crate::drift::diff::FileHunk;
use crate::models::{Classification, Convention, Dimension};

/// Raw matcher verdict before gating.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchOutcome {
    pub classification: Classification,
    pub confidence: f64,
    pub detail: String,
}

pub trait DriftMatcher: Send + Sync {
    fn check(&self, hunk: &FileHunk, convention: &Convention) -> Option<MatchOutcome>;
}

pub type MatcherMap = HashMap<Dimension, Box<dyn DriftMatcher>>;

/// Matchers for naming, structure, imports and error-handling.
pub fn default_matchers() -> MatcherMap {
    let mut map: MatcherMap = HashMap::new();
    map.insert(Dimension::Naming, Box::new(NamingMatcher));
    map.insert(Dimension::Structure, Box::new(StructureMatcher));
    map.insert(Dimension::Imports, Box::new(ImportsMatcher));
    map.insert(Dimension::ErrorHandling, Box::new(ErrorHandlingMatcher));
    map
}

// ---------------------------------------------------------------------------
// Naming
// ---------------------------------------------------------------------------

static DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:function|const|let|var|class|interface|type|enum)\s+([A-Za-z_$][A-Za-z0-9_$]*)")
        .unwrap()
});

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaseStyle {
    ScreamingSnake,
    Pascal,
    Camel,
    Snake,
    Kebab,
}

static SCREAMING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Z][A-Z0-9_]*$").unwrap());
static PASCAL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Z][a-zA-Z0-9]*$").unwrap());
static CAMEL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z][a-zA-Z0-9]*$").unwrap());
static SNAKE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").unwrap());
static KEBAB_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9-]*$").unwrap());

impl CaseStyle {
    /// The first style named by the rule text, checked from most to least specific.
    pub fn named_in(rule: &str) -> Option<CaseStyle> {
        let lower = rule.to_lowercase();
        if lower.contains("screaming") {
            Some(CaseStyle::ScreamingSnake)
        } else if lower.contains("pascalcase") || lower.contains("pascal case") {
            Some(CaseStyle::Pascal)
        } else if lower.contains("camelcase") || lower.contains("camel case") {
            Some(CaseStyle::Camel)
        } else if lower.contains("snake_case") || lower.contains("snake case") {
            Some(CaseStyle::Snake)
        } else if lower.contains("kebab") {
            Some(CaseStyle::Kebab)
        } else {
            None
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CaseStyle::ScreamingSnake => "SCREAMING_SNAKE_CASE",
            CaseStyle::Pascal => "PascalCase",
            CaseStyle::Camel => "camelCase",
            CaseStyle::Snake => "snake_case",
            CaseStyle::Kebab => "kebab-case",
        }
    }

    pub fn matches(&self, ident: &str) -> bool {
        let re: &Regex = match self {
            CaseStyle::ScreamingSnake => &SCREAMING_RE,
            CaseStyle::Pascal => &PASCAL_RE,
            CaseStyle::Camel => &CAMEL_RE,
            CaseStyle::Snake => &SNAKE_RE,
            CaseStyle::Kebab => &KEBAB_RE,
        };
        re.is_match(ident)
    }
}

/// Distinct declared identifiers in the added lines, first-seen order.
pub fn declared_identifiers(lines: &[String]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    for line in lines {
        for caps in DECLARATION.captures_iter(line) {
            let ident = caps[1].to_string();
            if seen.insert(ident.clone()) {
                out.push(ident);
            }
        }
    }
    out
}

pub struct NamingMatcher;

impl DriftMatcher for NamingMatcher {
    fn check(&self, hunk: &FileHunk, convention: &Convention) -> Option<MatchOutcome> {
        let style = CaseStyle::named_in(&convention.rule)?;
        let identifiers = declared_identifiers(&hunk.added);
        if identifiers.is_empty() {
            return None;
        }
        let violating: Vec<&String> = identifiers.iter().filter(|i| !style.matches(i)).collect();
        if violating.is_empty() {
            return None;
        }

        let ratio = violating.len() as f64 / identifiers.len() as f64;
        let classification = if ratio > 0.5 {
            Classification::Drifting
        } else {
            Classification::Ambiguous
        };
        let names: Vec<&str> = violating.iter().map(|s| s.as_str()).collect();
        Some(MatchOutcome {
            classification,
            confidence: ratio,
            detail: format!(
                "{} of {} declared identifiers are not {}: {}",
                violating.len(),
                identifiers.len(),
                style.label(),
                names.join(", ")
            ),
        })
    }
}

// ---------------------------------------------------------------------------
// Structure
// ---------------------------------------------------------------------------

static DEFAULT_EXPORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*export\s+default\b").unwrap());
static NAMED_EXPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*export\s+(?:async\s+)?(?:const|let|var|function|class|interface|type|enum)\b|^\s*export\s*\{")
        .unwrap()
});

fn dir_segments(path: &str) -> Vec<&str> {
    let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    parts[..parts.len().saturating_sub(1)].to_vec()
}

pub struct StructureMatcher;

impl StructureMatcher {
    fn export_style(&self, hunk: &FileHunk, rule: &str) -> Option<MatchOutcome> {
        let lower = rule.to_lowercase();
        let has_default = hunk.added.iter().any(|l| DEFAULT_EXPORT.is_match(l));
        let has_named = hunk.added.iter().any(|l| NAMED_EXPORT.is_match(l));

        if lower.contains("named export") {
            has_default.then(|| MatchOutcome {
                classification: Classification::Drifting,
                confidence: 0.8,
                detail: "default export added where named exports are expected".into(),
            })
        } else if lower.contains("default export") {
            (has_named && !has_default).then(|| MatchOutcome {
                classification: Classification::Drifting,
                confidence: 0.8,
                detail: "named exports added without the expected default export".into(),
            })
        } else {
            None
        }
    }

    fn placement(&self, hunk: &FileHunk, convention: &Convention) -> Option<MatchOutcome> {
        let lower = convention.rule.to_lowercase();
        if !(lower.contains("directory") || lower.contains("folder")) {
            return None;
        }
        let expected: BTreeSet<&str> = convention
            .examples
            .iter()
            .flat_map(|ex| dir_segments(ex))
            .collect();
        if expected.is_empty() {
            return None;
        }
        let segments = dir_segments(&hunk.file);
        if segments.iter().any(|s| expected.contains(s)) {
            return None;
        }
        Some(MatchOutcome {
            classification: Classification::Ambiguous,
            confidence: 0.5,
            detail: format!(
                "{} is outside the directories this convention was observed in",
                hunk.file
            ),
        })
    }
}

impl DriftMatcher for StructureMatcher {
    fn check(&self, hunk: &FileHunk, convention: &Convention) -> Option<MatchOutcome> {
        self.export_style(hunk, &convention.rule)
            .or_else(|| self.placement(hunk, convention))
    }
}

// ---------------------------------------------------------------------------
// Imports
// ---------------------------------------------------------------------------

static TYPE_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\btype\b").unwrap());
static IMPORT_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*import\s").unwrap());
static TYPE_ONLY_IMPORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*import\s+type\b|[{,]\s*type\s+[A-Za-z_$]").unwrap());
static DEEP_RELATIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:\bfrom\s*|\bimport\s*\(?\s*|\brequire\s*\(\s*)['"](?:\.\./){2,}"#).unwrap()
});

pub struct ImportsMatcher;

impl DriftMatcher for ImportsMatcher {
    fn check(&self, hunk: &FileHunk, convention: &Convention) -> Option<MatchOutcome> {
        let lower = convention.rule.to_lowercase();

        if lower.contains("import type") || lower.contains("type-only") || lower.contains("type only") {
            let mentions_type = hunk.added.iter().any(|l| TYPE_WORD.is_match(l));
            let imports = hunk.added.iter().any(|l| IMPORT_LINE.is_match(l));
            let type_only = hunk.added.iter().any(|l| TYPE_ONLY_IMPORT.is_match(l));
            if mentions_type && imports && !type_only {
                return Some(MatchOutcome {
                    classification: Classification::Ambiguous,
                    confidence: 0.5,
                    detail: "type references added without type-only imports".into(),
                });
            }
        }

        if lower.contains("barrel") || lower.contains("index") {
            let deep: Vec<&String> = hunk.added.iter().filter(|l| DEEP_RELATIVE.is_match(l)).collect();
            if let Some(first) = deep.first() {
                return Some(MatchOutcome {
                    classification: Classification::Ambiguous,
                    confidence: 0.6,
                    detail: format!(
                        "{} deep relative import(s) bypass barrel files, e.g. `{}`",
                        deep.len(),
                        first.trim()
                    ),
                });
            }
        }
        None
    }
}

// ---------------------------------------------------------------------------
// Error handling
// ---------------------------------------------------------------------------

static ASYNC_FN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\basync\s+function\b|\basync\s*\(|\basync\s+[A-Za-z_$][A-Za-z0-9_$]*\s*(?:=>|\()")
        .unwrap()
});
static AWAIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bawait\b").unwrap());
static TRY_BLOCK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\btry\s*\{").unwrap());

pub struct ErrorHandlingMatcher;

impl DriftMatcher for ErrorHandlingMatcher {
    fn check(&self, hunk: &FileHunk, _convention: &Convention) -> Option<MatchOutcome> {
        let added = hunk.added_text();
        if ASYNC_FN.is_match(&added) && AWAIT.is_match(&added) && !TRY_BLOCK.is_match(&added) {
            return Some(MatchOutcome {
                classification: Classification::Ambiguous,
                confidence: 0.6,
                detail: "async function awaits without a try/catch block".into(),
            });
        }
        None
    }
}
