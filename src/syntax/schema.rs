//! Syntax Reference Schema
//!
//! Diagram types and the TOML shape of syntax reference files.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Mermaid diagram kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DiagramType {
    Sequence,
    Flowchart,
    Class,
    State,
    EntityRelationship,
    Gantt,
    Pie,
    UserJourney,
    Quadrant,
    Requirement,
    GitGraph,
    C4Context,
    C4Container,
    C4Component,
    Mindmap,
    Timeline,
    ZenUml,
    Sankey,
    XyChart,
    Block,
    Packet,
    Kanban,
    Architecture,
    Radar,
    Treemap,
}

impl DiagramType {
    pub const ALL: [DiagramType; 25] = [
        DiagramType::Sequence,
        DiagramType::Flowchart,
        DiagramType::Class,
        DiagramType::State,
        DiagramType::EntityRelationship,
        DiagramType::Gantt,
        DiagramType::Pie,
        DiagramType::UserJourney,
        DiagramType::Quadrant,
        DiagramType::Requirement,
        DiagramType::GitGraph,
        DiagramType::C4Context,
        DiagramType::C4Container,
        DiagramType::C4Component,
        DiagramType::Mindmap,
        DiagramType::Timeline,
        DiagramType::ZenUml,
        DiagramType::Sankey,
        DiagramType::XyChart,
        DiagramType::Block,
        DiagramType::Packet,
        DiagramType::Kanban,
        DiagramType::Architecture,
        DiagramType::Radar,
        DiagramType::Treemap,
    ];

    /// Canonical name, also the key of its syntax reference
    pub fn name(self) -> &'static str {
        match self {
            DiagramType::Sequence => "sequenceDiagram",
            DiagramType::Flowchart => "flowchart",
            DiagramType::Class => "classDiagram",
            DiagramType::State => "stateDiagram",
            DiagramType::EntityRelationship => "erDiagram",
            DiagramType::Gantt => "gantt",
            DiagramType::Pie => "pie",
            DiagramType::UserJourney => "journey",
            DiagramType::Quadrant => "quadrantChart",
            DiagramType::Requirement => "requirementDiagram",
            DiagramType::GitGraph => "gitGraph",
            DiagramType::C4Context => "C4Context",
            DiagramType::C4Container => "C4Container",
            DiagramType::C4Component => "C4Component",
            DiagramType::Mindmap => "mindmap",
            DiagramType::Timeline => "timeline",
            DiagramType::ZenUml => "zenuml",
            DiagramType::Sankey => "sankey",
            DiagramType::XyChart => "xychart",
            DiagramType::Block => "block",
            DiagramType::Packet => "packet",
            DiagramType::Kanban => "kanban",
            DiagramType::Architecture => "architecture",
            DiagramType::Radar => "radar",
            DiagramType::Treemap => "treemap",
        }
    }

    /// Keywords that open a diagram of this type
    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            DiagramType::Flowchart => &["flowchart", "graph"],
            DiagramType::State => &["stateDiagram-v2", "stateDiagram"],
            DiagramType::Sankey => &["sankey-beta", "sankey"],
            DiagramType::XyChart => &["xychart-beta", "xychart"],
            DiagramType::Block => &["block-beta", "block"],
            DiagramType::Packet => &["packet-beta", "packet"],
            DiagramType::Architecture => &["architecture-beta"],
            DiagramType::Radar => &["radar-beta"],
            DiagramType::Treemap => &["treemap-beta"],
            DiagramType::Sequence => &["sequenceDiagram"],
            DiagramType::Class => &["classDiagram-v2", "classDiagram"],
            DiagramType::EntityRelationship => &["erDiagram"],
            DiagramType::Gantt => &["gantt"],
            DiagramType::Pie => &["pie"],
            DiagramType::UserJourney => &["journey"],
            DiagramType::Quadrant => &["quadrantChart"],
            DiagramType::Requirement => &["requirementDiagram"],
            DiagramType::GitGraph => &["gitGraph"],
            DiagramType::C4Context => &["C4Context"],
            DiagramType::C4Container => &["C4Container"],
            DiagramType::C4Component => &["C4Component"],
            DiagramType::Mindmap => &["mindmap"],
            DiagramType::Timeline => &["timeline"],
            DiagramType::ZenUml => &["zenuml"],
            DiagramType::Kanban => &["kanban"],
        }
    }

    /// Diagram type declared by a line like `graph TD` or `sequenceDiagram`
    ///
    /// Declarations are case-sensitive, as Mermaid reads them.
    pub fn from_declaration(line: &str) -> Option<Self> {
        let first = line.split_whitespace().next()?;
        Self::ALL
            .into_iter()
            .find(|ty| ty.keywords().contains(&first))
    }
}

impl fmt::Display for DiagramType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error for names that match no diagram type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown diagram type '{0}'")]
pub struct UnknownDiagramType(pub String);

impl FromStr for DiagramType {
    type Err = UnknownDiagramType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        let by_keyword = Self::ALL.into_iter().find(|ty| {
            ty.name().eq_ignore_ascii_case(wanted)
                || ty.keywords().iter().any(|k| k.eq_ignore_ascii_case(wanted))
        });
        if let Some(ty) = by_keyword {
            return Ok(ty);
        }

        // Longer spellings people use on the command line
        match wanted.to_ascii_lowercase().as_str() {
            "sequence" => Ok(DiagramType::Sequence),
            "class" => Ok(DiagramType::Class),
            "state" => Ok(DiagramType::State),
            "er" | "entityrelationshipdiagram" => Ok(DiagramType::EntityRelationship),
            "userjourney" => Ok(DiagramType::UserJourney),
            "c4" => Ok(DiagramType::C4Context),
            "requirement" => Ok(DiagramType::Requirement),
            _ => Err(UnknownDiagramType(wanted.to_string())),
        }
    }
}

impl TryFrom<String> for DiagramType {
    type Error = UnknownDiagramType;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DiagramType> for String {
    fn from(value: DiagramType) -> Self {
        value.name().to_string()
    }
}

/// Root syntax reference file structure (matches TOML)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyntaxFile {
    pub reference: ReferenceMeta,
    #[serde(default)]
    pub sections: Vec<SyntaxSection>,
}

/// Reference metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferenceMeta {
    pub diagram_type: String,
    pub version: Option<String>,
    pub summary: Option<String>,
}

/// One titled part of a reference (participants, arrows, ...)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyntaxSection {
    pub title: String,
    pub body: String,
}

/// Runtime syntax reference, keyed by canonical diagram type name
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxReference {
    pub diagram_type: String,
    pub version: Option<String>,
    pub summary: Option<String>,
    pub sections: Vec<SyntaxSection>,
}

impl From<SyntaxFile> for SyntaxReference {
    fn from(file: SyntaxFile) -> Self {
        Self {
            diagram_type: reference_key(&file.reference.diagram_type),
            version: file.reference.version,
            summary: file.reference.summary,
            sections: file.sections,
        }
    }
}

impl From<&SyntaxReference> for SyntaxFile {
    fn from(reference: &SyntaxReference) -> Self {
        Self {
            reference: ReferenceMeta {
                diagram_type: reference.diagram_type.clone(),
                version: reference.version.clone(),
                summary: reference.summary.clone(),
            },
            sections: reference.sections.clone(),
        }
    }
}

impl SyntaxReference {
    /// Plain-text rendering used as prompt context
    pub fn render(&self) -> String {
        let mut text = format!("{} syntax", self.diagram_type);
        if let Some(summary) = &self.summary {
            text.push_str("\n\n");
            text.push_str(summary.trim());
        }
        for section in &self.sections {
            text.push_str("\n\n## ");
            text.push_str(section.title.trim());
            text.push('\n');
            text.push_str(section.body.trim_end());
        }
        text
    }
}

/// Normalize a diagram type name to its lookup key
///
/// Known types map to their canonical name; anything else is kept as given.
pub fn reference_key(name: &str) -> String {
    name.parse::<DiagramType>()
        .map(|ty| ty.name().to_string())
        .unwrap_or_else(|_| name.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declaration_detection() {
        assert_eq!(
            DiagramType::from_declaration("graph TD"),
            Some(DiagramType::Flowchart)
        );
        assert_eq!(
            DiagramType::from_declaration("stateDiagram-v2"),
            Some(DiagramType::State)
        );
        assert_eq!(
            DiagramType::from_declaration("sequenceDiagram"),
            Some(DiagramType::Sequence)
        );
        assert_eq!(DiagramType::from_declaration("Sequence of events"), None);
        assert_eq!(DiagramType::from_declaration(""), None);
    }

    #[test]
    fn test_from_str_is_lenient() {
        assert_eq!("SEQUENCEDIAGRAM".parse::<DiagramType>(), Ok(DiagramType::Sequence));
        assert_eq!("sequence".parse::<DiagramType>(), Ok(DiagramType::Sequence));
        assert_eq!("graph".parse::<DiagramType>(), Ok(DiagramType::Flowchart));
        assert_eq!("c4".parse::<DiagramType>(), Ok(DiagramType::C4Context));
        assert_eq!(
            "nonsense".parse::<DiagramType>(),
            Err(UnknownDiagramType("nonsense".to_string()))
        );
    }

    #[test]
    fn test_names_round_trip_through_from_str() {
        for ty in DiagramType::ALL {
            assert_eq!(ty.name().parse::<DiagramType>(), Ok(ty));
        }
    }

    #[test]
    fn test_reference_from_file() {
        let file: SyntaxFile = toml::from_str(
            r#"
[reference]
diagram_type = "sequence"
version = "1"
summary = "Messages between participants"

[[sections]]
title = "Arrows"
body = "->> solid arrow"
"#,
        )
        .unwrap();

        let reference = SyntaxReference::from(file);
        assert_eq!(reference.diagram_type, "sequenceDiagram");
        assert_eq!(
            reference.render(),
            "sequenceDiagram syntax\n\nMessages between participants\n\n## Arrows\n->> solid arrow"
        );
    }

    #[test]
    fn test_unknown_reference_key_is_kept() {
        assert_eq!(reference_key("customDiagram"), "customDiagram");
        assert_eq!(reference_key("er"), "erDiagram");
    }
}
