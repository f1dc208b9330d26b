//! Diagram Report
//!
//! General checks that apply to any Mermaid diagram: a declaration must be
//! present, brackets must balance, and each diagram type gets a few cheap
//! heuristics. Sequence diagrams additionally run the activation validator.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::parser::lexer::ARROWS;
use crate::syntax::DiagramType;
use crate::validation::engine::{ValidationResult, validate_sequence};

/// Severity of a diagnostic message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A diagnostic message for a diagram
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// 0-based line index, `None` for whole-diagram findings
    pub line: Option<usize>,
    pub message: String,
    pub severity: Severity,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "Line {}: {}", line + 1, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Result of checking a whole diagram
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DiagramReport {
    pub diagnostics: Vec<Diagnostic>,
    /// Activation/block analysis, for sequence diagrams
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<ValidationResult>,
}

impl DiagramReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, line: Option<usize>, message: String) {
        self.diagnostics.push(Diagnostic {
            line,
            message,
            severity: Severity::Error,
        });
    }

    pub fn add_warning(&mut self, line: Option<usize>, message: String) {
        self.diagnostics.push(Diagnostic {
            line,
            message,
            severity: Severity::Warning,
        });
    }

    pub fn is_valid(&self) -> bool {
        !self
            .diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }
}

static NODE_DEFINITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\w+\[.*?\]|\w+\(.*?\)|\w+\{.*?\}").expect("node pattern compiles")
});

static ER_RELATIONSHIP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[|}][|o]--[|o][|{]|[|}][|o]\.\.[|o][|{]").expect("relationship pattern compiles")
});

/// Check a diagram of the given type (or of whatever type it declares)
pub fn check_diagram(code: &str, diagram_type: Option<DiagramType>) -> DiagramReport {
    let mut report = DiagramReport::new();

    if code.trim().is_empty() {
        report.add_error(None, "No Mermaid code generated".to_string());
        return report;
    }

    let declared = crate::extract::detect_diagram_type(code);
    if declared.is_none() {
        report.add_error(None, "Missing diagram type declaration".to_string());
    }

    check_brackets(code, &mut report);

    match diagram_type.or(declared) {
        Some(DiagramType::Sequence) => check_sequence(code, &mut report),
        Some(DiagramType::Flowchart) => {
            if !code.contains("-->") && !code.contains("---") {
                report.add_error(None, "No valid flowchart connections found".to_string());
            }
            if !NODE_DEFINITION.is_match(code) {
                report.add_warning(
                    None,
                    "No explicitly defined nodes found (may be using implicit nodes)".to_string(),
                );
            }
        }
        Some(DiagramType::Class) => {
            if !code.contains("class ") && !code.contains("<<") {
                report.add_warning(None, "No explicit class definitions found".to_string());
            }
        }
        Some(DiagramType::State) => {
            if !code.contains("-->") {
                report.add_error(None, "No state transitions found".to_string());
            }
        }
        Some(DiagramType::EntityRelationship) => {
            if !ER_RELATIONSHIP.is_match(code) {
                report.add_warning(None, "No entity relationships found".to_string());
            }
        }
        _ => {}
    }

    let content_lines = code
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("%%"))
        .count();
    if content_lines < 3 {
        report.add_warning(None, "Diagram seems too short, may be incomplete".to_string());
    }

    report
}

fn check_sequence(code: &str, report: &mut DiagramReport) {
    let result = validate_sequence(code);
    for issue in &result.issues {
        report.add_error(Some(issue.line), issue_message(&issue.to_string()));
    }

    if !ARROWS.iter().any(|arrow| code.contains(arrow)) {
        report.add_error(None, "No valid sequence diagram arrows found".to_string());
    }

    report.sequence = Some(result);
}

/// Issue text without its "Line N: " prefix, the diagnostic carries the line
fn issue_message(text: &str) -> String {
    text.split_once(": ")
        .map_or(text, |(_, message)| message)
        .to_string()
}

/// Per-line bracket balance, skipping message lines whose text is free-form
fn check_brackets(code: &str, report: &mut DiagramReport) {
    for (line_idx, line) in code.lines().enumerate() {
        if ARROWS.iter().any(|arrow| line.contains(arrow)) {
            continue;
        }

        let mut stack = Vec::new();
        for ch in line.chars() {
            match ch {
                '[' | '(' | '{' => stack.push(ch),
                ']' | ')' | '}' => {
                    let expected = match stack.pop() {
                        Some('[') => ']',
                        Some('(') => ')',
                        Some(_) => '}',
                        None => {
                            report.add_error(
                                Some(line_idx),
                                format!("Unexpected closing bracket '{ch}'"),
                            );
                            stack.clear();
                            break;
                        }
                    };
                    if expected != ch {
                        report.add_error(Some(line_idx), "Mismatched brackets".to_string());
                        stack.clear();
                        break;
                    }
                }
                _ => {}
            }
        }

        if !stack.is_empty() {
            report.add_error(Some(line_idx), "Unclosed brackets".to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_validity() {
        let mut report = DiagramReport::new();
        assert!(report.is_valid());

        report.add_warning(None, "Test warning".to_string());
        assert!(report.is_valid()); // Warnings don't make it invalid

        report.add_error(Some(1), "Test error".to_string());
        assert!(!report.is_valid());
    }

    #[test]
    fn test_empty_code_is_an_error() {
        let report = check_diagram("   ", None);
        assert!(!report.is_valid());
        assert_eq!(report.diagnostics[0].message, "No Mermaid code generated");
    }

    #[test]
    fn test_missing_declaration() {
        let report = check_diagram("A --> B\nB --> C\nC --> D", None);
        assert!(
            report
                .errors()
                .any(|d| d.message == "Missing diagram type declaration")
        );
    }

    #[test]
    fn test_bracket_errors() {
        let report = check_diagram("flowchart TD\n  A[Start --> B\n  C(End))", None);
        let lines: Vec<_> = report.errors().filter_map(|d| d.line).collect();
        // Line 1 carries an arrow and is skipped
        assert_eq!(lines, vec![2]);
    }

    #[test]
    fn test_sequence_issues_become_errors() {
        let code = "sequenceDiagram\n  A->>+B: call\n  B->>A: no return";
        let report = check_diagram(code, Some(DiagramType::Sequence));

        assert!(!report.is_valid());
        let sequence = report.sequence.as_ref().expect("sequence analysis");
        assert!(sequence.has_activation_issues());
        assert_eq!(
            report.errors().next().map(ToString::to_string).as_deref(),
            Some("Line 2: participant 'B' has 1 unmatched activation(s)")
        );
    }

    #[test]
    fn test_valid_flowchart() {
        let report = check_diagram("flowchart TD\n  A[Start] --> B[Process]\n  B --> C[End]", None);
        assert!(report.is_valid());
        assert!(report.warnings().next().is_none());
    }

    #[test]
    fn test_short_diagram_warning() {
        let report = check_diagram("sequenceDiagram\nA->>B: hi", None);
        assert!(report.is_valid());
        assert!(report.warnings().any(|d| d.message.contains("too short")));
    }

    #[test]
    fn test_state_diagram_needs_transitions() {
        let report = check_diagram("stateDiagram-v2\n  Idle\n  Busy", None);
        assert!(report.errors().any(|d| d.message == "No state transitions found"));
    }
}
