//! Diagram Extraction
//!
//! Pulls Mermaid code out of free text: user prompts with instructions
//! around a diagram, or model output wrapped in fences and prose.

use std::sync::LazyLock;

use regex::Regex;

use crate::syntax::DiagramType;

static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[ \t]*([A-Za-z0-9_-]*)[^\n]*\n(.*?)```").expect("fence pattern compiles")
});

static LABELLED_PROSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][a-z]+:\s").expect("prose pattern compiles"));

/// Body of the first Mermaid code fence in `text`
///
/// A fence tagged `mermaid` always matches; an untagged fence matches when
/// its body opens with a diagram declaration.
pub fn extract_fenced(text: &str) -> Option<String> {
    FENCED_BLOCK.captures_iter(text).find_map(|caps| {
        let tag = caps.get(1).map_or("", |m| m.as_str());
        let body = caps.get(2).map_or("", |m| m.as_str()).trim();
        if body.is_empty() {
            return None;
        }

        let accepted = tag.eq_ignore_ascii_case("mermaid")
            || (tag.is_empty() && detect_diagram_type(body).is_some());
        accepted.then(|| body.to_string())
    })
}

/// Mermaid code from `text`, fenced or raw
///
/// Raw code starts at the first declaration line and runs until a blank
/// line followed by prose, or a `Word: ` instruction line.
pub fn extract_diagram(text: &str) -> Option<String> {
    if let Some(fenced) = extract_fenced(text) {
        return Some(fenced);
    }

    let lines: Vec<&str> = text.lines().collect();
    let start = lines
        .iter()
        .position(|line| DiagramType::from_declaration(line.trim()).is_some())?;

    let mut end = lines.len();
    for idx in start + 1..lines.len() {
        let line = lines[idx];
        if LABELLED_PROSE.is_match(line) {
            end = idx;
            break;
        }
        if line.trim().is_empty() {
            let next = lines[idx + 1..].iter().find(|l| !l.trim().is_empty());
            if next.is_some_and(|l| looks_like_prose(l)) {
                end = idx;
                break;
            }
        }
    }

    let code = lines[start..end].join("\n").trim().to_string();
    (!code.is_empty()).then_some(code)
}

/// Capitalized sentence without diagram punctuation
fn looks_like_prose(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.chars().next().is_some_and(char::is_uppercase)
        && !trimmed.contains(':')
        && !trimmed.contains("--")
        && !trimmed.contains("->")
        && !trimmed.contains(['[', '(', '{'])
}

/// Diagram type declared by the first meaningful line of `code`
///
/// Skips blank lines, `%%` comments, fences, and a `---` front matter block.
pub fn detect_diagram_type(code: &str) -> Option<DiagramType> {
    let mut in_front_matter = false;
    for line in code.lines().map(str::trim) {
        if line == "---" {
            in_front_matter = !in_front_matter;
            continue;
        }
        if in_front_matter || line.is_empty() || line.starts_with("%%") || line.starts_with("```")
        {
            continue;
        }
        return DiagramType::from_declaration(line);
    }
    None
}

/// Remove a fence wrapped around model output
pub fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    let mut lines: Vec<&str> = trimmed.lines().collect();

    if lines.first().is_some_and(|l| l.trim_start().starts_with("```")) {
        lines.remove(0);
    }
    if lines.last().is_some_and(|l| l.trim() == "```") {
        lines.pop();
    }

    lines.join("\n").trim().to_string()
}
