//! Confidence gate applied to every matcher result.

use crate::models::Classification;

/// Gate output. Classification and confidence pass through unchanged.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GatedResult {
    pub classification: Classification,
    pub confidence: f64,
    pub needs_review: bool,
}

#[derive(Clone, Copy, Debug)]
pub struct ConfidenceGate {
    threshold: f64,
}

impl ConfidenceGate {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn gate(&self, classification: Classification, confidence: f64) -> GatedResult {
        GatedResult {
            classification,
            confidence,
            needs_review: confidence < self.threshold,
        }
    }
}

impl Default for ConfidenceGate {
    fn default() -> Self {
        Self::new(0.7)
    }
}
