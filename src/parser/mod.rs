//! Sequence Diagram Parser
//!
//! Line-oriented, permissive parsing of Mermaid sequence diagrams.
//! Lines that match no known syntax are kept as `Other` and never fail.

pub mod ast;
pub mod lexer;

pub use ast::{BlockKind, Message, ParsedLine, Participant, SectionKind};
pub use lexer::{ActivationMarker, MessageTokens, tokenize_message};

/// Parse a single line of a sequence diagram
///
/// Surrounding whitespace is ignored; indentation carries no meaning.
pub fn parse_line(line: &str) -> ParsedLine {
    ast::classify_line(line.trim())
}

/// Parse every line of a diagram, keeping 0-based line indices
pub fn parse_document(text: &str) -> impl Iterator<Item = (usize, ParsedLine)> + '_ {
    text.lines().enumerate().map(|(idx, line)| (idx, parse_line(line)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_activation_directives() {
        assert_eq!(parse_line("  activate Server"), ParsedLine::Activate("Server".to_string()));
        assert_eq!(
            parse_line("deactivate Server  "),
            ParsedLine::Deactivate("Server".to_string())
        );
    }

    #[test]
    fn test_parse_message_with_marker() {
        let result = parse_line("    Client->>+Server: Request");

        if let ParsedLine::Message(msg) = result {
            assert_eq!(msg.source, "Client");
            assert_eq!(msg.target, "Server");
            assert_eq!(msg.marker, Some(ActivationMarker::Activate));
            assert_eq!(msg.text.as_deref(), Some("Request"));
        } else {
            panic!("Expected message");
        }
    }

    #[test]
    fn test_parse_blocks() {
        assert!(matches!(
            parse_line("alt is valid"),
            ParsedLine::BlockOpen {
                kind: BlockKind::Alt,
                ..
            }
        ));
        assert!(matches!(
            parse_line("else otherwise"),
            ParsedLine::BlockSection {
                section: SectionKind::Else,
                ..
            }
        ));
        assert_eq!(parse_line("end"), ParsedLine::BlockEnd);
    }

    #[test]
    fn test_parse_inert_lines() {
        assert_eq!(parse_line("   "), ParsedLine::Empty);
        assert_eq!(parse_line("sequenceDiagram"), ParsedLine::Header);
        assert_eq!(parse_line("```mermaid"), ParsedLine::Fence);
        assert!(matches!(parse_line("%% a comment"), ParsedLine::Comment(_)));
        assert!(matches!(parse_line("Note over A,B: hi"), ParsedLine::Note(_)));
        assert!(matches!(parse_line("autonumber"), ParsedLine::Other(_)));
    }

    #[test]
    fn test_parse_document_indices() {
        let lines: Vec<_> = parse_document("sequenceDiagram\n  A->>B: hi").collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], (0, ParsedLine::Header));
        assert!(matches!(lines[1], (1, ParsedLine::Message(_))));
    }
}
