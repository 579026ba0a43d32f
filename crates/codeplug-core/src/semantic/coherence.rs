//! Export-to-file semantic fit scoring.

use crate::config::SemanticMethod;
use crate::errors::CodeplugResult;
use crate::semantic::model::{ModelRole, ModelSession};

pub const RELATED: &str = "related";
pub const UNRELATED: &str = "unrelated";

const SNIPPET_CHARS: usize = 512;
const CONTEXT_CHARS: usize = 256;

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// `<stem>: <first 512 chars of source>`.
pub fn file_context(stem: &str, source: &str) -> String {
    let snippet = truncate_chars(source, SNIPPET_CHARS);
    if snippet.trim().is_empty() {
        stem.to_string()
    } else {
        format!("{stem}: {snippet}")
    }
}

pub fn zero_shot_text(export_name: &str, context: &str) -> String {
    format!(
        "Export: {export_name}. File context: {}",
        truncate_chars(context, CONTEXT_CHARS)
    )
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let (mut dot, mut na, mut nb) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    let denom = na.sqrt() * nb.sqrt();
    if denom == 0.0 {
        0.0
    } else {
        dot / denom
    }
}

/// Scores how well an export name fits its file, in `[0, 1]`.
pub struct CoherenceScorer<'s, 'a> {
    session: &'s mut ModelSession<'a>,
    method: SemanticMethod,
}

impl<'s, 'a> CoherenceScorer<'s, 'a> {
    pub fn new(session: &'s mut ModelSession<'a>, method: SemanticMethod) -> Self {
        Self { session, method }
    }

    pub fn score(&mut self, export_name: &str, context: &str) -> CodeplugResult<f64> {
        match self.method {
            SemanticMethod::ZeroShot => self.zero_shot(export_name, context),
            SemanticMethod::Embedding => self.similarity(export_name, context),
        }
    }

    /// Score of the `related` label; 0.5 when the model omits it.
    fn zero_shot(&mut self, export_name: &str, context: &str) -> CodeplugResult<f64> {
        let model = self.session.acquire(ModelRole::ZeroShot)?;
        let scores = model.zero_shot(&zero_shot_text(export_name, context), &[RELATED, UNRELATED])?;
        Ok(scores
            .iter()
            .find(|(label, _)| label == RELATED)
            .map(|(_, s)| *s)
            .unwrap_or(0.5))
    }

    fn similarity(&mut self, export_name: &str, context: &str) -> CodeplugResult<f64> {
        let model = self.session.acquire(ModelRole::SentenceSimilarity)?;
        let a = model.embed(&format!("Main export: {export_name}"))?;
        let b = model.embed(truncate_chars(context, SNIPPET_CHARS))?;
        Ok(cosine_similarity(&a, &b).clamp(0.0, 1.0))
    }
}
