//! Syntax Registry
//!
//! Plain in-memory map of syntax references, seeded from the references
//! embedded in the binary.

use std::collections::HashMap;

use super::SyntaxLookup;
use super::schema::{SyntaxFile, SyntaxReference, SyntaxSection, reference_key};

/// Built-in references as (file name, TOML content)
pub fn builtin_sources() -> [(&'static str, &'static str); 5] {
    [
        (
            "sequenceDiagram.toml",
            include_str!("../../resources/syntax/sequenceDiagram.toml"),
        ),
        (
            "flowchart.toml",
            include_str!("../../resources/syntax/flowchart.toml"),
        ),
        (
            "classDiagram.toml",
            include_str!("../../resources/syntax/classDiagram.toml"),
        ),
        (
            "stateDiagram.toml",
            include_str!("../../resources/syntax/stateDiagram.toml"),
        ),
        (
            "erDiagram.toml",
            include_str!("../../resources/syntax/erDiagram.toml"),
        ),
    ]
}

/// Parse every embedded reference, falling back to a minimal one on failure
pub fn builtin_references() -> Vec<SyntaxReference> {
    builtin_sources()
        .into_iter()
        .map(
            |(file_name, content)| match toml::from_str::<SyntaxFile>(content) {
                Ok(file) => SyntaxReference::from(file),
                Err(e) => {
                    let diagram_type = file_name.trim_end_matches(".toml");
                    log::warn!(
                        "Failed to parse embedded {} reference: {}. Using minimal fallback.",
                        diagram_type,
                        e
                    );
                    minimal_reference(diagram_type)
                }
            },
        )
        .collect()
}

fn minimal_reference(diagram_type: &str) -> SyntaxReference {
    SyntaxReference {
        diagram_type: reference_key(diagram_type),
        version: Some("minimal-fallback".to_string()),
        summary: Some(format!("Basic {diagram_type} syntax")),
        sections: vec![SyntaxSection {
            title: "Declaration".to_string(),
            body: format!("Start the diagram with `{diagram_type}`."),
        }],
    }
}

/// In-memory syntax reference registry
#[derive(Debug, Clone, Default)]
pub struct SyntaxRegistry {
    references: HashMap<String, SyntaxReference>,
}

impl SyntaxRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the embedded references
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.add_embedded_references();
        registry
    }

    pub fn add_embedded_references(&mut self) {
        for reference in builtin_references() {
            self.add_reference(reference);
        }
    }

    /// Add a reference, replacing any with the same diagram type
    pub fn add_reference(&mut self, reference: SyntaxReference) {
        self.references
            .insert(reference.diagram_type.clone(), reference);
    }

    pub fn get(&self, diagram_type: &str) -> Option<&SyntaxReference> {
        self.references.get(&reference_key(diagram_type))
    }

    /// Diagram type names, sorted
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.references.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }
}

#[async_trait::async_trait]
impl SyntaxLookup for SyntaxRegistry {
    async fn lookup(&self, diagram_type: &str) -> Option<SyntaxReference> {
        self.get(diagram_type).cloned()
    }
}
