//! Sequence Diagram Line Types
//!
//! Minimal representation of one line of a Mermaid sequence diagram.
//! No validation state lives here - pure classification.

use serde::{Deserialize, Serialize};

use crate::parser::lexer::{self, ActivationMarker};

/// A classified line of a sequence diagram
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedLine {
    /// The `sequenceDiagram` declaration
    Header,
    /// A code fence line (```` ```mermaid ```` or ```` ``` ````)
    Fence,
    /// `participant X`, `participant X as Label` or `actor X`
    Participant(Participant),
    /// `activate X`
    Activate(String),
    /// `deactivate X`
    Deactivate(String),
    /// A message between two participants
    Message(Message),
    /// `loop`, `alt`, `opt`, ... opening a block
    BlockOpen { kind: BlockKind, label: String },
    /// `else`, `and` or `option` inside a block
    BlockSection { section: SectionKind, label: String },
    /// `end`
    BlockEnd,
    /// `Note over A: ...`
    Note(String),
    /// `%%` comment
    Comment(String),
    /// An empty or whitespace-only line
    Empty,
    /// Anything else (autonumber, title, unknown syntax)
    Other(String),
}

/// A participant declaration
#[derive(Debug, Clone, PartialEq)]
pub struct Participant {
    pub name: String,
    pub alias: Option<String>,
}

/// A message like `Alice->>+Bob: Hello`
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub source: String,
    pub arrow: String,
    pub marker: Option<ActivationMarker>,
    pub target: String,
    pub text: Option<String>,
}

/// Block constructs closed by `end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Loop,
    Alt,
    Opt,
    Par,
    Critical,
    Break,
    Rect,
    Box,
}

impl BlockKind {
    pub const ALL: [BlockKind; 8] = [
        BlockKind::Loop,
        BlockKind::Alt,
        BlockKind::Opt,
        BlockKind::Par,
        BlockKind::Critical,
        BlockKind::Break,
        BlockKind::Rect,
        BlockKind::Box,
    ];

    pub fn keyword(self) -> &'static str {
        match self {
            BlockKind::Loop => "loop",
            BlockKind::Alt => "alt",
            BlockKind::Opt => "opt",
            BlockKind::Par => "par",
            BlockKind::Critical => "critical",
            BlockKind::Break => "break",
            BlockKind::Rect => "rect",
            BlockKind::Box => "box",
        }
    }
}

/// Section separators inside a block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Else,
    And,
    Option,
}

impl SectionKind {
    pub fn keyword(self) -> &'static str {
        match self {
            SectionKind::Else => "else",
            SectionKind::And => "and",
            SectionKind::Option => "option",
        }
    }

    /// The block this section separator belongs to
    pub fn parent(self) -> BlockKind {
        match self {
            SectionKind::Else => BlockKind::Alt,
            SectionKind::And => BlockKind::Par,
            SectionKind::Option => BlockKind::Critical,
        }
    }
}

const SECTIONS: [SectionKind; 3] = [SectionKind::Else, SectionKind::And, SectionKind::Option];

/// Classify a trimmed line
pub fn classify_line(line: &str) -> ParsedLine {
    if line.is_empty() {
        return ParsedLine::Empty;
    }

    if let Some(comment) = line.strip_prefix("%%") {
        return ParsedLine::Comment(comment.trim().to_string());
    }

    if line.starts_with("```") {
        return ParsedLine::Fence;
    }

    if line == "sequenceDiagram" {
        return ParsedLine::Header;
    }

    if line.eq_ignore_ascii_case("end") {
        return ParsedLine::BlockEnd;
    }

    // `create participant X` declares just like `participant X`
    let declaration = strip_keyword(line, "create").unwrap_or(line);
    for keyword in ["participant", "actor"] {
        if let Some(rest) = strip_keyword(declaration, keyword) {
            if let Some(participant) = parse_participant(rest) {
                return ParsedLine::Participant(participant);
            }
        }
    }

    if let Some(rest) = strip_keyword(line, "activate") {
        if let Some(name) = single_name(rest) {
            return ParsedLine::Activate(name.to_string());
        }
    }

    if let Some(rest) = strip_keyword(line, "deactivate") {
        if let Some(name) = single_name(rest) {
            return ParsedLine::Deactivate(name.to_string());
        }
    }

    if let Some(rest) = strip_keyword(line, "note") {
        return ParsedLine::Note(rest.to_string());
    }

    for kind in BlockKind::ALL {
        if let Some(label) = strip_keyword(line, kind.keyword()) {
            return ParsedLine::BlockOpen {
                kind,
                label: label.to_string(),
            };
        }
    }

    for section in SECTIONS {
        if let Some(label) = strip_keyword(line, section.keyword()) {
            return ParsedLine::BlockSection {
                section,
                label: label.to_string(),
            };
        }
    }

    if let Some(tokens) = lexer::tokenize_message(line) {
        return ParsedLine::Message(Message {
            source: tokens.source.to_string(),
            arrow: tokens.arrow.to_string(),
            marker: tokens.marker,
            target: tokens.target.to_string(),
            text: tokens.text.map(str::to_string),
        });
    }

    ParsedLine::Other(line.to_string())
}

/// Strip a leading keyword followed by whitespace or end of line
fn strip_keyword<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let head = line.get(..keyword.len())?;
    if !head.eq_ignore_ascii_case(keyword) {
        return None;
    }

    let rest = &line[keyword.len()..];
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

fn parse_participant(rest: &str) -> Option<Participant> {
    // `participant A@{ "type": "database" }` carries metadata after '@'
    let rest = rest.split_once("@{").map_or(rest, |(name, _)| name).trim();
    if rest.is_empty() {
        return None;
    }

    let (name, alias) = match rest.split_once(" as ") {
        Some((name, alias)) => (name.trim(), Some(alias.trim().to_string())),
        None => (rest, None),
    };

    single_name(name).map(|name| Participant {
        name: name.to_string(),
        alias: alias.filter(|a| !a.is_empty()),
    })
}

fn single_name(text: &str) -> Option<&str> {
    let text = text.trim();
    if text.is_empty() || text.contains(char::is_whitespace) {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_keyword_requires_boundary() {
        assert_eq!(strip_keyword("loop every minute", "loop"), Some("every minute"));
        assert_eq!(strip_keyword("loop", "loop"), Some(""));
        assert_eq!(strip_keyword("looping->>B: x", "loop"), None);
        assert_eq!(strip_keyword("lo", "loop"), None);
    }

    #[test]
    fn test_participant_with_alias() {
        let parsed = classify_line("participant A as Alice");
        assert_eq!(
            parsed,
            ParsedLine::Participant(Participant {
                name: "A".to_string(),
                alias: Some("Alice".to_string()),
            })
        );
    }

    #[test]
    fn test_actor_and_create_participant() {
        assert!(matches!(
            classify_line("actor User"),
            ParsedLine::Participant(Participant { ref name, alias: None }) if name == "User"
        ));
        assert!(matches!(
            classify_line("create participant Worker"),
            ParsedLine::Participant(Participant { ref name, .. }) if name == "Worker"
        ));
    }

    #[test]
    fn test_section_parent_blocks() {
        assert_eq!(SectionKind::Else.parent(), BlockKind::Alt);
        assert_eq!(SectionKind::And.parent(), BlockKind::Par);
        assert_eq!(SectionKind::Option.parent(), BlockKind::Critical);
    }

    #[test]
    fn test_endpoint_message_is_not_block_end() {
        assert!(matches!(
            classify_line("endpoint->>B: call"),
            ParsedLine::Message(_)
        ));
    }

    #[test]
    fn test_rect_with_color() {
        assert!(matches!(
            classify_line("rect rgb(191, 223, 255)"),
            ParsedLine::BlockOpen {
                kind: BlockKind::Rect,
                ..
            }
        ));
    }
}
