//! Optional model-backed checks.

pub mod coherence;
pub mod model;

pub use coherence::CoherenceScorer;
pub use model::{LoadedModel, ModelLoader, ModelRole, ModelSession, ModelSpec};
