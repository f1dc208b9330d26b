//! Prompt construction for the three agent actions.

use std::fmt::Write as _;

use crate::validation::DiagramReport;

/// Code and findings of a rejected generation attempt
#[derive(Debug, Clone, Copy)]
pub struct PreviousAttempt<'a> {
    pub code: &'a str,
    pub report: &'a DiagramReport,
}

/// Fallback context when no syntax reference is known
pub fn basic_syntax(diagram_type: &str) -> String {
    format!("Basic {diagram_type} syntax")
}

pub fn generate_prompt(
    request: &str,
    diagram_type: &str,
    syntax_context: &str,
    description: Option<&str>,
    previous: Option<PreviousAttempt<'_>>,
) -> String {
    let mut prompt = format!(
        "You are a Mermaid diagram expert. Generate a valid Mermaid diagram based on the user's request.\n\n\
         Syntax Reference for {diagram_type}:\n{syntax_context}\n\n\
         User Request: {request}\n"
    );
    if let Some(description) = description.filter(|d| !d.trim().is_empty()) {
        let _ = writeln!(prompt, "Description: {}", description.trim());
    }

    if let Some(previous) = previous {
        let errors: Vec<String> = previous.report.errors().map(ToString::to_string).collect();
        let warnings: Vec<String> = previous
            .report
            .warnings()
            .map(ToString::to_string)
            .collect();

        let _ = write!(
            prompt,
            "\nPrevious (INVALID) code that failed validation:\n```\n{}\n```\n",
            previous.code
        );
        if !errors.is_empty() {
            prompt.push_str("\nPREVIOUS ATTEMPT HAD ERRORS - PLEASE FIX THEM:\n");
            push_numbered(&mut prompt, &errors);
            prompt.push_str("\nMake sure to address ALL of these issues in your new diagram.\n");
        }
        if !warnings.is_empty() {
            prompt.push_str("\nWARNINGS FROM PREVIOUS ATTEMPT:\n");
            push_numbered(&mut prompt, &warnings);
        }
    }

    prompt.push_str(
        "\nGenerate ONLY the Mermaid diagram code. Start with the diagram type declaration.\n\
         Do not include markdown code blocks, explanations, or any other text.\n\
         Just the raw Mermaid syntax.",
    );
    prompt
}

pub fn describe_prompt(code: &str, diagram_type: Option<&str>, syntax_context: Option<&str>) -> String {
    let mut prompt = String::from(
        "You are a Mermaid diagram expert. Analyze and describe the following Mermaid diagram in natural language.\n\n",
    );
    if let Some(diagram_type) = diagram_type {
        let _ = writeln!(prompt, "Diagram Type: {diagram_type}");
    }
    if let Some(context) = syntax_context {
        let _ = writeln!(prompt, "Syntax Context:\n{context}\n");
    }
    let _ = write!(
        prompt,
        "\nMermaid Code:\n```\n{code}\n```\n\n\
         Provide a comprehensive description that includes:\n\
         1. What type of diagram this is\n\
         2. The main components/participants/nodes\n\
         3. The relationships and flows shown\n\
         4. The purpose or use case this diagram represents\n\
         5. Any notable patterns or design decisions\n\n\
         Be clear, concise, and educational in your explanation."
    );
    prompt
}

/// First transformation call: understand the source diagram
pub fn analysis_prompt(source_type: &str, code: &str) -> String {
    format!(
        "Analyze this {source_type} diagram and extract its key information:\n\n\
         Source Diagram:\n{code}\n\n\
         Provide a structured analysis:\n\
         1. Main entities/participants/components\n\
         2. Key relationships and interactions\n\
         3. Flow and sequence of events\n\
         4. Business logic or process depicted\n\
         5. Data or state changes\n\n\
         Focus on the MEANING and PURPOSE, not the syntax."
    )
}

/// Second transformation call: emit the target diagram
pub fn transform_prompt(
    source_type: &str,
    target_type: &str,
    understanding: &str,
    target_context: &str,
    code: &str,
) -> String {
    format!(
        "You are a Mermaid diagram expert. Transform the following diagram to a {target_type} diagram.\n\n\
         SOURCE DIAGRAM TYPE: {source_type}\n\
         TARGET DIAGRAM TYPE: {target_type}\n\n\
         Understanding of source diagram:\n{understanding}\n\n\
         Target Diagram Syntax Reference:\n{target_context}\n\n\
         Original Source Code (for final check):\n\n{code}\n\n\
         TRANSFORMATION GUIDELINES:\n\
         - Preserve the core meaning and relationships from the source\n\
         - Adapt the representation to fit the target diagram type's semantics\n\
         - For sequence to C4: extract systems/containers and their relationships\n\
         - For flowchart to state: convert decision points and actions to states\n\
         - For class to ER: convert classes to entities and associations to relationships\n\
         - Ensure the target diagram is valid and follows proper syntax\n\n\
         Generate ONLY the transformed Mermaid {target_type} code.\n\
         Do not include markdown code blocks, explanations, or any other text.\n\
         Just the raw Mermaid syntax for the {target_type} diagram."
    )
}

fn push_numbered(prompt: &mut String, items: &[String]) {
    for (i, item) in items.iter().enumerate() {
        let _ = writeln!(prompt, "{}. {}", i + 1, item);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_generation_has_no_error_section() {
        let prompt = generate_prompt("login flow", "flowchart", "ctx", None, None);
        assert!(prompt.contains("Syntax Reference for flowchart:\nctx"));
        assert!(prompt.contains("User Request: login flow"));
        assert!(!prompt.contains("PREVIOUS"));
        assert!(!prompt.contains("Description:"));
    }

    #[test]
    fn test_regeneration_lists_previous_findings() {
        let mut report = DiagramReport::new();
        report.add_error(Some(2), "Unclosed brackets".to_string());
        report.add_warning(None, "Diagram seems too short, may be incomplete".to_string());

        let prompt = generate_prompt(
            "login flow",
            "flowchart",
            "ctx",
            Some("with retries"),
            Some(PreviousAttempt {
                code: "flowchart TD\nA[",
                report: &report,
            }),
        );

        assert!(prompt.contains("Description: with retries"));
        assert!(prompt.contains("```\nflowchart TD\nA[\n```"));
        assert!(prompt.contains("1. Line 3: Unclosed brackets"));
        assert!(prompt.contains("WARNINGS FROM PREVIOUS ATTEMPT:\n1. Diagram seems too short"));
    }

    #[test]
    fn test_describe_prompt_optional_parts() {
        let bare = describe_prompt("pie\n\"a\": 1", None, None);
        assert!(!bare.contains("Diagram Type:"));
        assert!(bare.contains("```\npie\n\"a\": 1\n```"));

        let full = describe_prompt("pie", Some("pie"), Some("Basic pie syntax"));
        assert!(full.contains("Diagram Type: pie"));
        assert!(full.contains("Syntax Context:\nBasic pie syntax"));
    }

    #[test]
    fn test_transform_prompt_carries_both_types() {
        let prompt = transform_prompt("sequenceDiagram", "C4Context", "a login", "ctx", "sequenceDiagram");
        assert!(prompt.contains("SOURCE DIAGRAM TYPE: sequenceDiagram"));
        assert!(prompt.contains("TARGET DIAGRAM TYPE: C4Context"));
        assert!(prompt.contains("Understanding of source diagram:\na login"));
    }
}
