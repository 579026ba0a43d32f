//! codeplug core library: infers a codebase's own conventions, audits files
//! against them, classifies drift in new commits, and tracks a compliance
//! score over time.
//!
//! Pipeline, leaf to root:
//!
//! - [`analyzer`]: file discovery, tree-sitter parsing, per-file visitors,
//!   project-wide aggregation and convention detection.
//! - [`scorer`]: violation auditing, compliance scoring, trend tracking and
//!   filename auto-fixes.
//! - [`drift`]: heuristic classification of unified diffs.
//! - [`store`]: `.codeplug/` persisted state.
//! - [`vcs`] and [`semantic`]: collaborator interfaces for source control and
//!   model inference.

pub mod analyzer;
pub mod config;
pub mod drift;
pub mod errors;
pub mod models;
pub mod scorer;
pub mod semantic;
pub mod store;
pub mod telemetry;
pub mod vcs;

pub use config::CodeplugConfig;
pub use errors::{CodeplugError, CodeplugResult};
