//! Syntax References
//!
//! Per-diagram-type syntax documentation used to build model prompts. The
//! agent only sees the `SyntaxLookup` trait; the registry and store are the
//! in-memory and file-backed implementations.

pub mod registry;
pub mod schema;
pub mod store;

pub use registry::SyntaxRegistry;
pub use schema::{DiagramType, SyntaxReference, SyntaxSection, UnknownDiagramType};
pub use store::{LoadedReference, ReferencePriority, SyntaxStore};

/// Lookup of syntax references by diagram type name
#[async_trait::async_trait]
pub trait SyntaxLookup: Send + Sync {
    /// Reference for a diagram type, `None` when nothing is known about it
    async fn lookup(&self, diagram_type: &str) -> Option<SyntaxReference>;
}
