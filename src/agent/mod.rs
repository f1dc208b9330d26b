//! Diagram Agent
//!
//! Sequential pipeline: classify the request, run one of generate, describe
//! or transform against the model, then check the resulting diagram and
//! repair sequence activations.

pub mod prompts;

use serde::{Deserialize, Serialize};

use crate::extract::{detect_diagram_type, extract_diagram, extract_fenced, strip_code_fences};
use crate::intent::{Intent, IntentClassifier, IntentConfig};
use crate::llm::{Completion, LlmError};
use crate::syntax::{DiagramType, SyntaxLookup};
use crate::validation::{DiagramReport, ValidationResult, check_diagram};
use prompts::PreviousAttempt;

/// Pipeline failures; structural findings are never errors
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// The model call failed; passed through untouched.
    #[error(transparent)]
    Completion(#[from] LlmError),

    #[error("no source diagram provided")]
    MissingSource,

    #[error("no target diagram type specified")]
    MissingTargetType,

    #[error("could not detect source diagram type in the extracted code")]
    UnknownSourceType,
}

/// Agent tuning, `[agent]` in the project file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentOptions {
    /// Upper bound on generation attempts, at least one is always made
    pub max_iterations: usize,
    /// Apply the activation fixer to sequence diagrams
    pub auto_fix: bool,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            max_iterations: 3,
            auto_fix: true,
        }
    }
}

/// One request to the agent
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiagramRequest {
    pub prompt: String,
    /// Type to generate, or the target of a transformation
    pub diagram_type: Option<DiagramType>,
    /// Extra detail for generation
    pub description: Option<String>,
    /// Skips intent classification when set
    pub action: Option<Intent>,
}

impl DiagramRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_type(mut self, diagram_type: DiagramType) -> Self {
        self.diagram_type = Some(diagram_type);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_action(mut self, action: Intent) -> Self {
        self.action = Some(action);
        self
    }
}

/// What the pipeline produced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagramOutcome {
    pub action: Intent,
    pub diagram_type: Option<DiagramType>,
    /// Generated or transformed code; the source diagram for descriptions
    pub diagram: Option<String>,
    pub description: Option<String>,
    pub report: Option<DiagramReport>,
    /// Activation analysis of `diagram`, for sequence diagrams
    pub sequence: Option<ValidationResult>,
    /// Model generations made for the diagram
    pub iterations: usize,
}

pub struct DiagramAgent<C, S> {
    completion: C,
    syntax: S,
    classifier: IntentClassifier,
    options: AgentOptions,
}

impl<C: Completion, S: SyntaxLookup> DiagramAgent<C, S> {
    pub fn new(completion: C, syntax: S) -> Self {
        Self {
            completion,
            syntax,
            classifier: IntentClassifier::default(),
            options: AgentOptions::default(),
        }
    }

    pub fn with_intent_config(mut self, config: &IntentConfig) -> Self {
        self.classifier = IntentClassifier::new(config);
        self
    }

    pub fn with_options(mut self, options: AgentOptions) -> Self {
        self.options = options;
        self
    }

    pub fn completion(&self) -> &C {
        &self.completion
    }

    /// Route and run one request
    pub async fn run(&self, request: &DiagramRequest) -> Result<DiagramOutcome, AgentError> {
        let action = match request.action {
            Some(action) => {
                log::debug!("Action pre-set: {}", action);
                action
            }
            None => self
                .classifier
                .classify(&request.prompt, request.diagram_type),
        };
        log::info!("Running {} request", action);

        match action {
            Intent::Generate => self.generate(request).await,
            Intent::Describe => self.describe(request).await,
            Intent::Transform => self.transform(request).await,
        }
    }

    /// Generate a diagram, regenerating while the result is invalid
    pub async fn generate(&self, request: &DiagramRequest) -> Result<DiagramOutcome, AgentError> {
        let diagram_type = request.diagram_type.unwrap_or(DiagramType::Flowchart);
        let context = self.syntax_context(diagram_type).await;
        let max_iterations = self.options.max_iterations.max(1);

        let mut previous: Option<(String, DiagramReport)> = None;
        let mut iterations = 0;
        loop {
            let prompt = prompts::generate_prompt(
                &request.prompt,
                diagram_type.name(),
                &context,
                request.description.as_deref(),
                previous
                    .as_ref()
                    .map(|(code, report)| PreviousAttempt { code, report }),
            );
            let raw = self
                .completion
                .complete(&prompt, diagram_type.name())
                .await?;
            iterations += 1;

            let (code, report) = self.check_and_fix(clean_model_output(&raw), diagram_type);
            if report.is_valid() || iterations >= max_iterations {
                if !report.is_valid() {
                    log::warn!(
                        "Giving up after {} attempt(s) with {} error(s)",
                        iterations,
                        report.errors().count()
                    );
                }
                return Ok(outcome(Intent::Generate, diagram_type, code, None, report, iterations));
            }

            log::info!(
                "Attempt {} has {} error(s), regenerating",
                iterations,
                report.errors().count()
            );
            previous = Some((code, report));
        }
    }

    /// Describe the diagram embedded in the request
    pub async fn describe(&self, request: &DiagramRequest) -> Result<DiagramOutcome, AgentError> {
        let code = extract_diagram(&request.prompt)
            .unwrap_or_else(|| request.prompt.trim().to_string());
        if code.is_empty() {
            return Err(AgentError::MissingSource);
        }

        let diagram_type = detect_diagram_type(&code).or(request.diagram_type);
        let context = match diagram_type {
            Some(ty) => self.syntax.lookup(ty.name()).await.map(|r| r.render()),
            None => None,
        };
        let type_name = diagram_type.map(DiagramType::name);

        let prompt = prompts::describe_prompt(&code, type_name, context.as_deref());
        let description = self
            .completion
            .complete(&prompt, type_name.unwrap_or_default())
            .await?;

        let mut report = check_diagram(&code, diagram_type);
        let sequence = report.sequence.take();
        Ok(DiagramOutcome {
            action: Intent::Describe,
            diagram_type,
            diagram: Some(code),
            description: Some(description.trim().to_string()),
            report: Some(report),
            sequence,
            iterations: 0,
        })
    }

    /// Convert the embedded diagram into the requested type
    pub async fn transform(&self, request: &DiagramRequest) -> Result<DiagramOutcome, AgentError> {
        let source_code = extract_diagram(&request.prompt).ok_or(AgentError::MissingSource)?;
        let target = request.diagram_type.ok_or(AgentError::MissingTargetType)?;
        let source = detect_diagram_type(&source_code).ok_or(AgentError::UnknownSourceType)?;
        log::info!("Transforming {} to {}", source, target);

        let target_context = self.syntax_context(target).await;

        let analysis = self
            .completion
            .complete(
                &prompts::analysis_prompt(source.name(), &source_code),
                source.name(),
            )
            .await?;

        let prompt = prompts::transform_prompt(
            source.name(),
            target.name(),
            analysis.trim(),
            &target_context,
            &source_code,
        );
        let raw = self.completion.complete(&prompt, target.name()).await?;

        let (code, report) = self.check_and_fix(clean_model_output(&raw), target);
        let description = format!("Transformed from {source} to {target}");
        Ok(outcome(
            Intent::Transform,
            target,
            code,
            Some(description),
            report,
            1,
        ))
    }

    /// Check `code` as `diagram_type`, applying the activation fixer when enabled
    pub fn check_and_fix(&self, code: String, diagram_type: DiagramType) -> (String, DiagramReport) {
        let report = check_diagram(&code, Some(diagram_type));
        if !self.options.auto_fix {
            return (code, report);
        }

        match report
            .sequence
            .as_ref()
            .and_then(|sequence| sequence.corrected_text.clone())
        {
            Some(corrected) => {
                log::info!("Applied sequence activation fixes");
                let report = check_diagram(&corrected, Some(diagram_type));
                (corrected, report)
            }
            None => (code, report),
        }
    }

    async fn syntax_context(&self, diagram_type: DiagramType) -> String {
        match self.syntax.lookup(diagram_type.name()).await {
            Some(reference) => reference.render(),
            None => {
                log::debug!("No syntax reference for {}", diagram_type);
                prompts::basic_syntax(diagram_type.name())
            }
        }
    }
}

/// Diagram code from model output that may carry fences or prose
fn clean_model_output(raw: &str) -> String {
    extract_fenced(raw)
        .or_else(|| extract_diagram(raw))
        .unwrap_or_else(|| strip_code_fences(raw))
}

fn outcome(
    action: Intent,
    diagram_type: DiagramType,
    diagram: String,
    description: Option<String>,
    mut report: DiagramReport,
    iterations: usize,
) -> DiagramOutcome {
    let sequence = report.sequence.take();
    DiagramOutcome {
        action,
        diagram_type: Some(diagram_type),
        diagram: Some(diagram),
        description,
        report: Some(report),
        sequence,
        iterations,
    }
}
