//! Mermaid Agent
//!
//! Generates, describes and transforms Mermaid diagrams through an
//! OpenAI-compatible model, with offline structural checks.
//!
//! This library provides:
//! - Sequence diagram parsing and activation validation
//! - Deterministic activation repair
//! - Intent routing and the diagram agent pipeline
//! - Syntax references for prompt context
//! - Configuration management

pub mod agent;
pub mod cli;
pub mod config;
pub mod extract;
pub mod intent;
pub mod llm;
pub mod parser;
pub mod syntax;
pub mod validation;

pub use agent::{AgentError, AgentOptions, DiagramAgent, DiagramOutcome, DiagramRequest};
pub use config::Config;
pub use intent::{Intent, IntentClassifier};
pub use parser::{ParsedLine, parse_line};
pub use syntax::{DiagramType, SyntaxRegistry, SyntaxStore};
pub use validation::{
    DiagramReport, ValidationResult, check_diagram, fix_sequence_activations, validate_sequence,
};
