//! Model backend interface and the single-active-model session.
//!
//! The core never links an inference runtime. Callers supply a
//! [`ModelLoader`]; [`ModelSession`] guarantees at most one model is resident
//! and disposes it when the session goes out of scope.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::config::{ModelTier, ModelsConfig};
use crate::errors::{CodeplugError, CodeplugResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelRole {
    ZeroShot,
    SentenceSimilarity,
}

impl ModelRole {
    pub const ALL: [ModelRole; 2] = [ModelRole::ZeroShot, ModelRole::SentenceSimilarity];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelRole::ZeroShot => "zero-shot",
            ModelRole::SentenceSimilarity => "sentence-similarity",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dtype {
    Q4,
    Q8,
    Fp32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSpec {
    pub role: ModelRole,
    pub model_id: &'static str,
    pub dtype: Dtype,
    pub size_estimate_mb: u32,
    pub description: &'static str,
}

const ZERO_SHOT_DEFAULT: ModelSpec = ModelSpec {
    role: ModelRole::ZeroShot,
    model_id: "Xenova/distilbert-base-uncased-mnli",
    dtype: Dtype::Q8,
    size_estimate_mb: 67,
    description: "DistilBERT-MNLI for zero-shot classification",
};

const ZERO_SHOT_LITE: ModelSpec = ModelSpec {
    role: ModelRole::ZeroShot,
    model_id: "Xenova/mobilebert-uncased-mnli",
    dtype: Dtype::Q8,
    size_estimate_mb: 25,
    description: "MobileBERT-MNLI for lightweight zero-shot classification",
};

const SIMILARITY_DEFAULT: ModelSpec = ModelSpec {
    role: ModelRole::SentenceSimilarity,
    model_id: "Xenova/all-MiniLM-L6-v2",
    dtype: Dtype::Q8,
    size_estimate_mb: 23,
    description: "MiniLM-L6 sentence embeddings",
};

const SIMILARITY_LITE: ModelSpec = ModelSpec {
    role: ModelRole::SentenceSimilarity,
    model_id: "Xenova/paraphrase-MiniLM-L3-v2",
    dtype: Dtype::Q8,
    size_estimate_mb: 17,
    description: "MiniLM-L3 sentence embeddings",
};

pub fn model_spec(role: ModelRole, tier: ModelTier) -> ModelSpec {
    match (role, tier) {
        (ModelRole::ZeroShot, ModelTier::Default) => ZERO_SHOT_DEFAULT,
        (ModelRole::ZeroShot, ModelTier::Lite) => ZERO_SHOT_LITE,
        (ModelRole::SentenceSimilarity, ModelTier::Default) => SIMILARITY_DEFAULT,
        (ModelRole::SentenceSimilarity, ModelTier::Lite) => SIMILARITY_LITE,
    }
}

pub fn all_model_specs(tier: ModelTier) -> Vec<ModelSpec> {
    ModelRole::ALL.iter().map(|r| model_spec(*r, tier)).collect()
}

pub fn total_disk_estimate_mb(tier: ModelTier) -> u32 {
    all_model_specs(tier).iter().map(|s| s.size_estimate_mb).sum()
}

/// A resident model.
pub trait LoadedModel {
    /// Scores per label, in any order.
    fn zero_shot(&mut self, text: &str, labels: &[&str]) -> CodeplugResult<Vec<(String, f64)>>;

    fn embed(&mut self, _text: &str) -> CodeplugResult<Vec<f32>> {
        Err(CodeplugError::Model("embeddings not supported by this model".into()))
    }

    fn dispose(&mut self) {}
}

pub trait ModelLoader {
    fn load(&self, spec: &ModelSpec, cache_dir: &Path) -> CodeplugResult<Box<dyn LoadedModel>>;
}

/// Owned handle over the one resident model.
pub struct ModelSession<'a> {
    loader: &'a dyn ModelLoader,
    tier: ModelTier,
    cache_dir: PathBuf,
    active: Option<(ModelRole, Box<dyn LoadedModel>)>,
}

impl<'a> ModelSession<'a> {
    pub fn new(loader: &'a dyn ModelLoader, config: &ModelsConfig, project_root: &Path) -> Self {
        Self {
            loader,
            tier: config.effective_tier(),
            cache_dir: config.effective_cache_dir(project_root),
            active: None,
        }
    }

    pub fn spec(&self, role: ModelRole) -> ModelSpec {
        model_spec(role, self.tier)
    }

    pub fn loaded_role(&self) -> Option<ModelRole> {
        self.active.as_ref().map(|(role, _)| *role)
    }

    /// Return the model for `role`, disposing any other resident model first.
    pub fn acquire(&mut self, role: ModelRole) -> CodeplugResult<&mut dyn LoadedModel> {
        if self.loaded_role() != Some(role) {
            self.dispose();
            let spec = self.spec(role);
            std::fs::create_dir_all(&self.cache_dir)?;
            info!(
                role = role.as_str(),
                model = spec.model_id,
                size_mb = spec.size_estimate_mb,
                "loading model"
            );
            let model = self.loader.load(&spec, &self.cache_dir)?;
            self.active = Some((role, model));
        }
        match self.active.as_mut() {
            Some((_, model)) => Ok(model.as_mut()),
            None => Err(CodeplugError::Model("model not loaded".into())),
        }
    }

    pub fn dispose(&mut self) {
        if let Some((role, mut model)) = self.active.take() {
            debug!(role = role.as_str(), "disposing model");
            model.dispose();
        }
    }
}

impl Drop for ModelSession<'_> {
    fn drop(&mut self) {
        self.dispose();
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedLoader;
    use super::*;

    fn config(dir: &Path) -> ModelsConfig {
        ModelsConfig {
            tier: Some(ModelTier::Lite),
            cache_dir: Some(dir.join("models")),
        }
    }

    #[test]
    fn test_registry_covers_every_role_and_tier() {
        for tier in [ModelTier::Default, ModelTier::Lite] {
            let specs = all_model_specs(tier);
            assert_eq!(specs.len(), ModelRole::ALL.len());
            assert!(total_disk_estimate_mb(tier) > 0);
        }
        assert_ne!(
            model_spec(ModelRole::ZeroShot, ModelTier::Default).model_id,
            model_spec(ModelRole::ZeroShot, ModelTier::Lite).model_id
        );
    }

    #[test]
    fn test_session_keeps_one_model_resident() {
        let tmp = tempfile::tempdir().unwrap();
        let loader = ScriptedLoader::new(&[]);
        let journal = loader.journal.clone();
        {
            let mut session = ModelSession::new(&loader, &config(tmp.path()), tmp.path());
            session.acquire(ModelRole::ZeroShot).unwrap();
            session.acquire(ModelRole::ZeroShot).unwrap();
            assert_eq!(journal.borrow().loads.len(), 1);

            session.acquire(ModelRole::SentenceSimilarity).unwrap();
            assert_eq!(journal.borrow().disposals, vec![ModelRole::ZeroShot]);
            assert_eq!(session.loaded_role(), Some(ModelRole::SentenceSimilarity));
        }
        assert_eq!(
            journal.borrow().disposals,
            vec![ModelRole::ZeroShot, ModelRole::SentenceSimilarity]
        );
        assert!(tmp.path().join("models").is_dir());
    }
}
