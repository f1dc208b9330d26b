//! Validation Engine
//!
//! Sequence activation/block validation, the activation auto-fixer, and the
//! general per-diagram report built on top of them.

pub mod engine;
pub mod fix;
pub mod report;

pub use engine::{Issue, IssueKind, ValidationResult, validate_sequence};
pub use fix::fix_sequence_activations;
pub use report::{Diagnostic, DiagramReport, Severity, check_diagram};
