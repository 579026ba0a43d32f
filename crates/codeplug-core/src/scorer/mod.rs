//! Auditing, scoring and fixing against confirmed conventions.

pub mod autofix;
pub mod compliance;
pub mod trend;
pub mod violations;

pub use autofix::{AutoFixer, FixOutcome};
pub use compliance::ComplianceScorer;
pub use trend::TrendTracker;
pub use violations::{
    compile_custom_rules, AuditOptions, AuditOutcome, CompiledRule, SemanticPassStatus,
    ViolationDetector,
};
