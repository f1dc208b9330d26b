//! Subcommand implementations.

use std::fmt::Write as _;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use tokio::io::AsyncReadExt;

use crate::agent::{DiagramAgent, DiagramOutcome, DiagramRequest};
use crate::config::{Config, ReferencesCommand, RunArgs, ValidateArgs};
use crate::extract::{detect_diagram_type, extract_fenced};
use crate::llm::{LlmClient, LlmConfig};
use crate::syntax::{DiagramType, SyntaxStore};
use crate::validation::{DiagramReport, Severity, check_diagram, fix_sequence_activations};

/// `validate`: offline checks and activation repair
pub async fn validate(args: &ValidateArgs) -> Result<ExitCode> {
    let text = read_input(args.file.as_deref()).await?;
    let code = extract_fenced(&text).unwrap_or(text);

    let diagram_type = args.diagram_type.or_else(|| detect_diagram_type(&code));
    let mut report = check_diagram(&code, diagram_type);

    if args.fix {
        let fixed = if diagram_type == Some(DiagramType::Sequence) {
            fix_sequence_activations(&code)
        } else {
            log::warn!("Only sequence diagrams are repaired, leaving input unchanged");
            code.clone()
        };
        if fixed != code {
            log::info!("Balanced sequence activations");
            report = check_diagram(&fixed, diagram_type);
        }
        write_output(args.output.as_deref(), &fixed).await?;
    }

    // Keep stdout clean for the fixed diagram
    let to_stderr = args.fix && args.output.is_none();
    let rendered = if args.json {
        serde_json::to_string_pretty(&report).context("Failed to serialize report")?
    } else {
        render_report(&report)
    };
    if to_stderr {
        eprintln!("{rendered}");
    } else {
        println!("{rendered}");
    }

    Ok(exit_code(report.is_valid()))
}

/// `run`: one request through the agent
pub async fn run(config: &Config, args: &RunArgs) -> Result<ExitCode> {
    let prompt = match args.prompt.as_deref() {
        Some(prompt) if prompt != "-" => prompt.to_string(),
        _ => read_input(None).await?,
    };
    if prompt.trim().is_empty() {
        bail!("Empty request");
    }

    let llm_config = LlmConfig::from_env(
        args.llm_settings(),
        config.project.llm.clone(),
        !args.no_api_key,
    )?;
    let client = LlmClient::new(llm_config)?;

    let mut store = SyntaxStore::new(config);
    store.initialize().await;
    if args.watch {
        store.watch().await?;
    }

    let agent = DiagramAgent::new(client, store)
        .with_intent_config(&config.project.intent)
        .with_options(config.agent_options(args));

    let mut request = DiagramRequest::new(prompt);
    request.diagram_type = args.diagram_type;
    request.description = args.description.clone();
    request.action = args.action;

    let outcome = agent.run(&request).await?;

    if let (Some(path), Some(diagram)) = (&args.output, &outcome.diagram) {
        write_output(Some(path), diagram).await?;
        log::info!("Wrote diagram to {}", path.display());
    }

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&outcome).context("Failed to serialize outcome")?
        );
    } else {
        println!("{}", render_outcome(&outcome, args.output.is_none()));
    }

    let valid = outcome.report.as_ref().is_none_or(DiagramReport::is_valid)
        && outcome.sequence.as_ref().is_none_or(|s| s.valid);
    Ok(exit_code(valid))
}

/// `references`: list, show or export syntax references
pub async fn references(config: &Config, command: &ReferencesCommand) -> Result<ExitCode> {
    match command {
        ReferencesCommand::List => {
            let store = SyntaxStore::new(config);
            store.initialize().await;
            for loaded in store.list().await {
                let source = loaded
                    .source_path
                    .as_ref()
                    .map_or_else(|| "embedded".to_string(), |p| p.display().to_string());
                println!(
                    "{:<20} {:<10} {}",
                    loaded.reference.diagram_type,
                    loaded.priority.label(),
                    source
                );
            }
        }
        ReferencesCommand::Show { diagram_type } => {
            let store = SyntaxStore::new(config);
            store.initialize().await;
            match store.get(diagram_type).await {
                Some(loaded) => println!("{}", loaded.reference.render()),
                None => bail!("No syntax reference for '{}'", diagram_type),
            }
        }
        ReferencesCommand::Export { dir } => {
            let dir = match dir {
                Some(dir) => dir.clone(),
                None => config.user_syntax_dir()?,
            };
            let written = SyntaxStore::export_builtin(&dir).await?;
            if written.is_empty() {
                println!("All built-in references already exist in {}", dir.display());
            }
            for path in written {
                println!("Wrote {}", path.display());
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

async fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) if path != Path::new("-") => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display())),
        _ => {
            let mut text = String::new();
            tokio::io::stdin()
                .read_to_string(&mut text)
                .await
                .context("Failed to read stdin")?;
            Ok(text)
        }
    }
}

async fn write_output(path: Option<&Path>, text: &str) -> Result<()> {
    match path {
        Some(path) => {
            let mut content = text.to_string();
            if !content.ends_with('\n') {
                content.push('\n');
            }
            tokio::fs::write(path, content)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))
        }
        None => {
            println!("{}", text.trim_end_matches('\n'));
            Ok(())
        }
    }
}

fn exit_code(valid: bool) -> ExitCode {
    if valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

/// Human-readable report, one diagnostic per line
pub fn render_report(report: &DiagramReport) -> String {
    if report.diagnostics.is_empty() {
        return "valid".to_string();
    }

    let mut text = String::new();
    for diagnostic in &report.diagnostics {
        let label = match diagnostic.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        let _ = writeln!(text, "{label}: {diagnostic}");
    }
    let errors = report.errors().count();
    let warnings = report.warnings().count();
    let _ = write!(text, "{errors} error(s), {warnings} warning(s)");
    text
}

fn render_outcome(outcome: &DiagramOutcome, include_diagram: bool) -> String {
    let mut text = format!("action: {}", outcome.action);
    if let Some(diagram_type) = outcome.diagram_type {
        let _ = write!(text, "\ntype: {diagram_type}");
    }
    if outcome.iterations > 0 {
        let _ = write!(text, "\niterations: {}", outcome.iterations);
    }
    if let Some(description) = &outcome.description {
        let _ = write!(text, "\n\n{description}");
    }
    if include_diagram {
        if let Some(diagram) = &outcome.diagram {
            let _ = write!(text, "\n\n```mermaid\n{diagram}\n```");
        }
    }
    if let Some(report) = &outcome.report {
        let _ = write!(text, "\n\n{}", render_report(report));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::Intent;

    #[test]
    fn test_render_valid_report() {
        assert_eq!(render_report(&DiagramReport::new()), "valid");
    }

    #[test]
    fn test_render_report_lines() {
        let report = check_diagram("sequenceDiagram\ndeactivate A", None);
        let text = render_report(&report);

        assert!(text.starts_with(
            "error: Line 2: deactivate of 'A' without matching activate\n"
        ));
        assert!(text.ends_with("error(s), 1 warning(s)"));
    }

    #[test]
    fn test_render_outcome() {
        let outcome = DiagramOutcome {
            action: Intent::Transform,
            diagram_type: Some(DiagramType::State),
            diagram: Some("stateDiagram-v2\n  [*] --> Idle".to_string()),
            description: Some("Transformed from flowchart to stateDiagram".to_string()),
            report: Some(DiagramReport::new()),
            sequence: None,
            iterations: 1,
        };

        let text = render_outcome(&outcome, true);
        assert!(text.starts_with("action: transform\ntype: stateDiagram\niterations: 1"));
        assert!(text.contains("```mermaid\nstateDiagram-v2\n  [*] --> Idle\n```"));
        assert!(text.ends_with("valid"));
        assert!(!render_outcome(&outcome, false).contains("```mermaid"));
    }
}
