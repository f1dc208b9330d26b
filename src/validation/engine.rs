//! Sequence Validation Engine
//!
//! Tracks per-participant activation depth and block nesting over the lines
//! of a sequence diagram. Every finding is reported as data; malformed input
//! never produces an error.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::parser::{self, ActivationMarker, BlockKind, ParsedLine};

/// Kind of a structural issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// A deactivation while the participant's depth is already 0
    DeactivateWithoutActivate,
    /// Activations still open at the end of the diagram
    DanglingActivation,
    /// A block without `end`, a stray `end`, or a misplaced section keyword
    UnbalancedBlock,
}

impl IssueKind {
    /// Whether the auto-fixer repairs this kind
    pub fn is_activation(self) -> bool {
        matches!(
            self,
            IssueKind::DeactivateWithoutActivate | IssueKind::DanglingActivation
        )
    }
}

/// A structural issue found while scanning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// 0-based line index
    pub line: usize,
    pub participant: Option<String>,
    pub kind: IssueKind,
    /// Unmatched activation count, for dangling activations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<usize>,
    /// Block involved, for unbalanced blocks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block: Option<BlockKind>,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let line = self.line + 1;
        let participant = self.participant.as_deref().unwrap_or("?");
        match self.kind {
            IssueKind::DeactivateWithoutActivate => write!(
                f,
                "Line {line}: deactivate of '{participant}' without matching activate"
            ),
            IssueKind::DanglingActivation => write!(
                f,
                "Line {line}: participant '{participant}' has {} unmatched activation(s)",
                self.depth.unwrap_or(1)
            ),
            IssueKind::UnbalancedBlock => match self.block {
                Some(block) => write!(f, "Line {line}: unbalanced '{}' block", block.keyword()),
                None => write!(f, "Line {line}: 'end' without an open block"),
            },
        }
    }
}

/// Result of validating a sequence diagram
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    /// Issues in ascending line order
    pub issues: Vec<Issue>,
    /// Participants in registration order
    pub participants: Vec<String>,
    /// Present when activation issues were found and the fixer could repair them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corrected_text: Option<String>,
}

impl ValidationResult {
    pub fn activation_issues(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|issue| issue.kind.is_activation())
    }

    pub fn has_activation_issues(&self) -> bool {
        self.activation_issues().next().is_some()
    }

    pub fn block_issues(&self) -> impl Iterator<Item = &Issue> {
        self.issues
            .iter()
            .filter(|issue| issue.kind == IssueKind::UnbalancedBlock)
    }
}

/// How an unmatched deactivation was expressed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeactivationSite {
    /// A `deactivate X` line
    Directive,
    /// A `-` marker on a message arrow
    MessageMarker,
}

/// Everything a single pass over the diagram learns
#[derive(Debug, Default)]
pub(crate) struct ActivationScan {
    pub participants: Vec<String>,
    pub issues: Vec<Issue>,
    /// Unmatched deactivations by line
    pub orphans: HashMap<usize, DeactivationSite>,
    /// Open activation count per participant, registration order
    pub dangling: Vec<(String, usize)>,
}

/// Per-invocation activation state
#[derive(Debug, Default)]
struct ActivationTracker {
    order: Vec<String>,
    index: HashMap<String, usize>,
    aliases: HashMap<String, String>,
    /// Line indices of open activations per participant (depth = len)
    open: Vec<Vec<usize>>,
}

impl ActivationTracker {
    /// A declared name is a participant of its own, even if an earlier
    /// declaration used it as an alias
    fn declare(&mut self, name: &str, alias: Option<&str>) {
        self.insert(name);
        if let Some(alias) = alias {
            self.aliases
                .entry(alias.to_string())
                .or_insert_with(|| name.to_string());
        }
    }

    fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        if self.index.contains_key(name) {
            return name;
        }
        self.aliases.get(name).map_or(name, String::as_str)
    }

    fn register(&mut self, name: &str) -> usize {
        let name = self.resolve(name).to_string();
        self.insert(&name)
    }

    fn insert(&mut self, name: &str) -> usize {
        if let Some(&idx) = self.index.get(name) {
            return idx;
        }
        let idx = self.order.len();
        self.order.push(name.to_string());
        self.index.insert(name.to_string(), idx);
        self.open.push(Vec::new());
        idx
    }

    fn activate(&mut self, name: &str, line: usize) {
        let idx = self.register(name);
        self.open[idx].push(line);
    }

    /// Returns `false` when there was nothing to deactivate
    fn deactivate(&mut self, name: &str) -> bool {
        let idx = self.register(name);
        self.open[idx].pop().is_some()
    }

    fn canonical(&self, name: &str) -> String {
        self.resolve(name).to_string()
    }
}

/// Validate a sequence diagram
///
/// Pure function of the input: activation balance, then block balance.
/// When activation issues are present the corrected text is attached.
pub fn validate_sequence(text: &str) -> ValidationResult {
    let scan = scan_activations(text);
    let valid = scan.issues.is_empty();

    let corrected_text = if scan.issues.iter().any(|i| i.kind.is_activation()) {
        Some(super::fix::apply_fixes(text, &scan))
    } else {
        None
    };

    ValidationResult {
        valid,
        issues: scan.issues,
        participants: scan.participants,
        corrected_text,
    }
}

/// Single pass over the diagram collecting activation and block state
pub(crate) fn scan_activations(text: &str) -> ActivationScan {
    let mut tracker = ActivationTracker::default();
    let mut blocks: Vec<(BlockKind, usize)> = Vec::new();
    let mut issues = Vec::new();
    let mut orphans = HashMap::new();

    for (line_idx, parsed) in parser::parse_document(text) {
        match parsed {
            ParsedLine::Participant(p) => {
                tracker.declare(&p.name, p.alias.as_deref());
            }
            ParsedLine::Activate(name) => {
                tracker.activate(&name, line_idx);
            }
            ParsedLine::Deactivate(name) => {
                if !tracker.deactivate(&name) {
                    issues.push(orphan_issue(line_idx, tracker.canonical(&name)));
                    orphans.insert(line_idx, DeactivationSite::Directive);
                }
            }
            ParsedLine::Message(msg) => {
                tracker.register(&msg.source);
                tracker.register(&msg.target);
                match msg.marker {
                    Some(ActivationMarker::Activate) => {
                        tracker.activate(&msg.target, line_idx);
                    }
                    Some(ActivationMarker::Deactivate) => {
                        if !tracker.deactivate(&msg.source) {
                            issues.push(orphan_issue(line_idx, tracker.canonical(&msg.source)));
                            orphans.insert(line_idx, DeactivationSite::MessageMarker);
                        }
                    }
                    None => {}
                }
            }
            ParsedLine::BlockOpen { kind, .. } => {
                blocks.push((kind, line_idx));
            }
            ParsedLine::BlockSection { section, .. } => {
                let parent = section.parent();
                let inside_parent = blocks.last().is_some_and(|(kind, _)| *kind == parent);
                if !inside_parent {
                    issues.push(block_issue(line_idx, Some(parent)));
                }
            }
            ParsedLine::BlockEnd => {
                if blocks.pop().is_none() {
                    issues.push(block_issue(line_idx, None));
                }
            }
            ParsedLine::Header
            | ParsedLine::Fence
            | ParsedLine::Note(_)
            | ParsedLine::Comment(_)
            | ParsedLine::Empty
            | ParsedLine::Other(_) => {}
        }
    }

    for (kind, opened_at) in blocks {
        issues.push(block_issue(opened_at, Some(kind)));
    }

    let mut dangling = Vec::new();
    for (idx, name) in tracker.order.iter().enumerate() {
        let open = &tracker.open[idx];
        if let Some(&oldest) = open.first() {
            issues.push(Issue {
                line: oldest,
                participant: Some(name.clone()),
                kind: IssueKind::DanglingActivation,
                depth: Some(open.len()),
                block: None,
            });
            dangling.push((name.clone(), open.len()));
        }
    }

    // Stable: issues on the same line keep discovery order
    issues.sort_by_key(|issue| issue.line);

    if !issues.is_empty() {
        log::debug!("Sequence scan found {} issue(s)", issues.len());
    }

    ActivationScan {
        participants: tracker.order,
        issues,
        orphans,
        dangling,
    }
}

fn orphan_issue(line: usize, participant: String) -> Issue {
    Issue {
        line,
        participant: Some(participant),
        kind: IssueKind::DeactivateWithoutActivate,
        depth: None,
        block: None,
    }
}

fn block_issue(line: usize, block: Option<BlockKind>) -> Issue {
    Issue {
        line,
        participant: None,
        kind: IssueKind::UnbalancedBlock,
        depth: None,
        block,
    }
}
