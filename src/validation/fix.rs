//! Activation Auto-Fix
//!
//! Rewrites a sequence diagram so that every participant's activations are
//! balanced. Unmatched deactivations are removed; dangling activations are
//! closed by appending `deactivate` lines. Block constructs are left alone.

use crate::parser::{self, ParsedLine};
use crate::validation::engine::{ActivationScan, DeactivationSite, IssueKind, scan_activations};

/// Balance activations in a sequence diagram
///
/// Re-validating the returned text yields no activation issues. Text without
/// activation issues is returned unchanged.
pub fn fix_sequence_activations(text: &str) -> String {
    let scan = scan_activations(text);
    if scan.orphans.is_empty() && scan.dangling.is_empty() {
        return text.to_string();
    }
    apply_fixes(text, &scan)
}

/// Apply the repairs for an existing scan of `text`
pub(crate) fn apply_fixes(text: &str, scan: &ActivationScan) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let mut output: Vec<String> = Vec::with_capacity(lines.len() + scan.dangling.len());

    for (idx, line) in lines.iter().enumerate() {
        match scan.orphans.get(&idx) {
            Some(DeactivationSite::Directive) => {
                log::debug!("Dropping unmatched deactivation on line {}", idx + 1);
            }
            Some(DeactivationSite::MessageMarker) => {
                output.push(strip_marker(line));
            }
            None => output.push((*line).to_string()),
        }
    }

    let closers = closing_lines(scan);
    if !closers.is_empty() {
        let fenced = enclosing_fence(&lines, scan);
        let indent = match fenced {
            Some((open, close)) => body_indent(&lines[open + 1..close]),
            None => body_indent(&lines),
        };
        let insert_at = fenced
            .map(|(_, close)| close - dropped_before(scan, close))
            .unwrap_or(output.len());
        let synthesized = closers
            .into_iter()
            .map(|name| format!("{indent}deactivate {name}"));
        output.splice(insert_at..insert_at, synthesized);
    }

    let eol = if text.contains("\r\n") { "\r\n" } else { "\n" };
    let mut fixed = output.join(eol);
    if text.ends_with('\n') && !fixed.is_empty() {
        fixed.push_str(eol);
    }
    fixed
}

/// One `deactivate` per open activation, registration order
fn closing_lines(scan: &ActivationScan) -> Vec<&str> {
    scan.dangling
        .iter()
        .flat_map(|(name, depth)| std::iter::repeat_n(name.as_str(), *depth))
        .collect()
}

/// Remove the `-` marker from a message line, keeping the message
fn strip_marker(line: &str) -> String {
    match parser::tokenize_message(line).and_then(|tokens| tokens.marker_at) {
        Some(at) => format!("{}{}", &line[..at], &line[at + 1..]),
        None => line.to_string(),
    }
}

/// Opening and closing fence lines around the latest dangling activation
///
/// Fences pair up in order: an opening ```` ```lang ```` line, then the next
/// bare ```` ``` ````. Activations outside every fenced block get no fence.
fn enclosing_fence(lines: &[&str], scan: &ActivationScan) -> Option<(usize, usize)> {
    let activation = scan
        .issues
        .iter()
        .filter(|issue| issue.kind == IssueKind::DanglingActivation)
        .map(|issue| issue.line)
        .max()?;

    let mut open: Option<usize> = None;
    for (idx, line) in lines.iter().enumerate() {
        let trimmed = line.trim();
        match open {
            None if trimmed.starts_with("```") => open = Some(idx),
            Some(start) if trimmed == "```" => {
                if (start..idx).contains(&activation) {
                    return Some((start, idx));
                }
                open = None;
            }
            _ => {}
        }
    }
    None
}

/// Dropped deactivation lines above `line`
fn dropped_before(scan: &ActivationScan, line: usize) -> usize {
    scan.orphans
        .iter()
        .filter(|(idx, site)| **idx < line && **site == DeactivationSite::Directive)
        .count()
}

/// Indentation of the first diagram body line
fn body_indent(lines: &[&str]) -> String {
    lines
        .iter()
        .find(|line| {
            !matches!(
                parser::parse_line(line),
                ParsedLine::Empty | ParsedLine::Header | ParsedLine::Fence
            )
        })
        .map(|line| {
            line.chars()
                .take_while(|c| c.is_whitespace())
                .collect::<String>()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::engine::validate_sequence;

    #[test]
    fn test_balanced_text_is_unchanged() {
        let text = "sequenceDiagram\n  A->>+B: go\n  B-->>-A: done\n";
        assert_eq!(fix_sequence_activations(text), text);
    }

    #[test]
    fn test_strip_marker_keeps_message() {
        assert_eq!(strip_marker("  B-->>-A: done"), "  B-->>A: done");
        assert_eq!(strip_marker("not a message"), "not a message");
    }

    #[test]
    fn test_orphan_message_marker_is_neutralized() {
        let fixed = fix_sequence_activations("A->>B: call\nB-->>-A: reply");
        assert_eq!(fixed, "A->>B: call\nB-->>A: reply");
    }

    #[test]
    fn test_closers_follow_body_indentation() {
        let fixed = fix_sequence_activations("sequenceDiagram\n    A->>+B: call");
        assert_eq!(fixed, "sequenceDiagram\n    A->>+B: call\n    deactivate B");
    }

    #[test]
    fn test_closers_go_before_closing_fence() {
        let text = "```mermaid\nsequenceDiagram\nactivate A\n```";
        let fixed = fix_sequence_activations(text);

        assert_eq!(fixed, "```mermaid\nsequenceDiagram\nactivate A\ndeactivate A\n```");
        assert!(validate_sequence(&fixed).valid);
    }

    #[test]
    fn test_closers_stay_inside_fence_followed_by_prose() {
        let text = "Here you go:\n```mermaid\nsequenceDiagram\n  activate A\n```\nHope it helps";
        let fixed = fix_sequence_activations(text);

        assert_eq!(
            fixed,
            "Here you go:\n```mermaid\nsequenceDiagram\n  activate A\n  deactivate A\n```\nHope it helps"
        );
        let diagram = crate::extract::extract_fenced(&fixed).unwrap();
        assert!(validate_sequence(&diagram).valid);
    }

    #[test]
    fn test_closer_position_accounts_for_dropped_lines() {
        let text = "```mermaid\nsequenceDiagram\ndeactivate B\nactivate A\n```\nnotes";
        let fixed = fix_sequence_activations(text);
        assert_eq!(
            fixed,
            "```mermaid\nsequenceDiagram\nactivate A\ndeactivate A\n```\nnotes"
        );
    }

    #[test]
    fn test_crlf_line_endings_are_kept() {
        let fixed = fix_sequence_activations("activate A\r\nA->>B: x\r\n");
        assert_eq!(fixed, "activate A\r\nA->>B: x\r\ndeactivate A\r\n");
    }

    #[test]
    fn test_closers_in_registration_order() {
        let fixed = fix_sequence_activations("activate B\nactivate A\nactivate B");
        assert_eq!(
            fixed,
            "activate B\nactivate A\nactivate B\ndeactivate B\ndeactivate B\ndeactivate A"
        );
    }

    #[test]
    fn test_blocks_are_not_repaired() {
        let fixed = fix_sequence_activations("loop forever\nactivate A");
        let result = validate_sequence(&fixed);

        assert!(!result.has_activation_issues());
        assert_eq!(result.block_issues().count(), 1);
    }
}
