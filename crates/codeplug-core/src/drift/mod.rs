//! Heuristic drift detection over source-control diffs.

pub mod classifier;
pub mod diff;
pub mod gate;
pub mod matchers;

pub use classifier::{CommitDrift, DriftClassifier, DriftReport};
pub use diff::{parse_unified_diff, FileHunk};
pub use gate::ConfidenceGate;
