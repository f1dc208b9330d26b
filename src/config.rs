//! Configuration management for the Mermaid agent.
//!
//! Handles:
//! - Command-line argument parsing
//! - The `.mermaid-agent.toml` project file
//! - Syntax reference directory configuration

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;

use crate::agent::AgentOptions;
use crate::intent::{Intent, IntentConfig};
use crate::llm::LlmSettings;
use crate::syntax::{DiagramType, SyntaxStore};

/// Project file looked up in the working directory
pub const PROJECT_CONFIG_FILE: &str = ".mermaid-agent.toml";

/// Command-line arguments for the Mermaid agent
#[derive(Debug, Parser)]
#[command(name = "mermaid-agent")]
#[command(about = "Generate, describe, transform and validate Mermaid diagrams")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Project configuration file
    #[arg(
        long,
        global = true,
        help = "Project config file (default: ./.mermaid-agent.toml)"
    )]
    pub config: Option<PathBuf>,

    /// Extra syntax reference directory, highest priority
    #[arg(
        long,
        global = true,
        help = "Directory containing syntax reference TOML files"
    )]
    pub syntax_dir: Option<PathBuf>,

    /// Log level
    #[arg(
        long,
        global = true,
        default_value = "info",
        help = "Log level (trace, debug, info, warn, error)"
    )]
    pub log_level: String,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check a diagram offline, optionally repairing sequence activations
    Validate(ValidateArgs),
    /// Send one request through the agent pipeline
    Run(RunArgs),
    /// Inspect or export syntax references
    References {
        #[command(subcommand)]
        command: ReferencesCommand,
    },
}

#[derive(Debug, clap::Args)]
pub struct ValidateArgs {
    /// Diagram file; stdin when omitted or `-`
    pub file: Option<PathBuf>,

    #[arg(long = "type", short = 't', help = "Diagram type, detected when omitted")]
    pub diagram_type: Option<DiagramType>,

    #[arg(long, help = "Write the activation-balanced diagram")]
    pub fix: bool,

    #[arg(long, help = "Print the report as JSON")]
    pub json: bool,

    #[arg(short, long, help = "Where to write the fixed diagram (default: stdout)")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, clap::Args)]
pub struct RunArgs {
    /// Request text; stdin when omitted or `-`
    pub prompt: Option<String>,

    #[arg(long = "type", short = 't', help = "Diagram type to generate or transform into")]
    pub diagram_type: Option<DiagramType>,

    #[arg(long, help = "Extra description for generation")]
    pub description: Option<String>,

    #[arg(long, help = "Skip intent detection (generate, describe, transform)")]
    pub action: Option<Intent>,

    #[arg(short, long, help = "Write the resulting diagram to a file")]
    pub output: Option<PathBuf>,

    #[arg(long, help = "Maximum generation attempts")]
    pub max_iterations: Option<usize>,

    #[arg(long, help = "Do not repair sequence activations")]
    pub no_auto_fix: bool,

    #[arg(long, help = "Model name")]
    pub model: Option<String>,

    #[arg(long, help = "OpenAI-compatible API base URL")]
    pub base_url: Option<String>,

    #[arg(long, help = "Environment variable holding the API key")]
    pub api_key_env: Option<String>,

    #[arg(long, help = "Send no API key (local servers)")]
    pub no_api_key: bool,

    #[arg(long, help = "Watch syntax reference directories while running")]
    pub watch: bool,

    #[arg(long, help = "Print the outcome as JSON")]
    pub json: bool,
}

impl RunArgs {
    /// Command-line layer of the model settings
    pub fn llm_settings(&self) -> LlmSettings {
        LlmSettings {
            model: self.model.clone(),
            base_url: self.base_url.clone(),
            api_key_env: self.api_key_env.clone(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum ReferencesCommand {
    /// List loaded references with their source
    List,
    /// Print one reference as prompt text
    Show {
        /// Diagram type name, e.g. `sequenceDiagram` or `er`
        diagram_type: String,
    },
    /// Write the built-in references as TOML files, keeping existing ones
    Export {
        /// Target directory (default: the user-global syntax directory)
        dir: Option<PathBuf>,
    },
}

/// `[syntax]` section of the project file
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyntaxSettings {
    /// Extra reference directories, relative to the project file
    pub dirs: Vec<PathBuf>,
}

/// Contents of `.mermaid-agent.toml`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    pub intent: IntentConfig,
    pub agent: AgentOptions,
    pub llm: LlmSettings,
    pub syntax: SyntaxSettings,
}

impl ProjectConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse project config")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read project config: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse project config: {}", path.display()))
    }
}

/// Combined configuration from all sources
#[derive(Debug, Clone)]
pub struct Config {
    /// Syntax reference directories, ascending priority
    pub syntax_dirs: Vec<PathBuf>,
    pub project: ProjectConfig,
    pub project_config_path: Option<PathBuf>,
    pub log_level: String,
}

impl Config {
    /// Create configuration from explicit arguments, relative to the working directory
    pub fn from_args(args: &Args) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to resolve current directory")?;
        Self::from_args_in(args, &cwd)
    }

    /// Create configuration from explicit arguments, relative to `cwd` (useful for testing)
    pub fn from_args_in(args: &Args, cwd: &Path) -> Result<Self> {
        let project_config_path = match &args.config {
            Some(path) => Some(cwd.join(path)),
            None => Some(cwd.join(PROJECT_CONFIG_FILE)).filter(|path| path.is_file()),
        };

        let project = match &project_config_path {
            Some(path) => {
                log::debug!("Using project config {}", path.display());
                ProjectConfig::load(path)?
            }
            None => ProjectConfig::default(),
        };

        let mut syntax_dirs = Vec::new();

        // User global directory: ~/.config/mermaid-agent/syntax/
        if let Some(config_dir) = dirs::config_dir() {
            syntax_dirs.push(config_dir.join("mermaid-agent").join("syntax"));
        }

        // Workspace directory: ./.mermaid-agent/syntax/
        syntax_dirs.push(cwd.join(".mermaid-agent").join("syntax"));

        let project_root = project_config_path
            .as_deref()
            .and_then(Path::parent)
            .unwrap_or(cwd);
        syntax_dirs.extend(project.syntax.dirs.iter().map(|dir| project_root.join(dir)));

        if let Some(custom_dir) = &args.syntax_dir {
            syntax_dirs.push(cwd.join(custom_dir));
        }

        Ok(Config {
            syntax_dirs,
            project,
            project_config_path,
            log_level: args.log_level.clone(),
        })
    }

    pub fn has_project_config(&self) -> bool {
        self.project_config_path.is_some()
    }

    /// Project agent options with command-line overrides applied
    pub fn agent_options(&self, run: &RunArgs) -> AgentOptions {
        let mut options = self.project.agent;
        if let Some(max_iterations) = run.max_iterations {
            options.max_iterations = max_iterations;
        }
        if run.no_auto_fix {
            options.auto_fix = false;
        }
        options
    }

    /// Default export target for built-in references
    pub fn user_syntax_dir(&self) -> Result<PathBuf> {
        match dirs::config_dir() {
            Some(config_dir) => Ok(config_dir.join("mermaid-agent").join("syntax")),
            None => SyntaxStore::default_reference_dirs()?
                .pop()
                .context("No syntax directory available"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_project_config() {
        let project = ProjectConfig::from_toml_str(
            r#"
[intent]
transform_keywords = ["convert"]

[agent]
max_iterations = 5

[llm]
model = "local-model"
base_url = "http://localhost:1234/v1"

[syntax]
dirs = ["docs/syntax"]
"#,
        )
        .unwrap();

        assert_eq!(project.intent.transform_keywords, vec!["convert"]);
        // Unset lists keep their defaults
        assert!(project.intent.describe_keywords.contains(&"explain".to_string()));
        assert_eq!(project.agent.max_iterations, 5);
        assert!(project.agent.auto_fix);
        assert_eq!(project.llm.model.as_deref(), Some("local-model"));
        assert_eq!(project.syntax.dirs, vec![PathBuf::from("docs/syntax")]);
    }

    #[test]
    fn test_unknown_section_is_rejected() {
        assert!(ProjectConfig::from_toml_str("[plugins]\nname = \"x\"").is_err());
    }

    #[test]
    fn test_project_dirs_resolve_against_project_file() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(PROJECT_CONFIG_FILE),
            "[syntax]\ndirs = [\"refs\"]\n",
        )
        .unwrap();

        let args = Args::try_parse_from(["mermaid-agent", "--syntax-dir", "extra", "references", "list"])
            .unwrap();
        let config = Config::from_args_in(&args, temp.path()).unwrap();

        assert!(config.has_project_config());
        let tail: Vec<_> = config.syntax_dirs.iter().rev().take(3).collect();
        assert_eq!(tail[0], &temp.path().join("extra"));
        assert_eq!(tail[1], &temp.path().join("refs"));
        assert_eq!(tail[2], &temp.path().join(".mermaid-agent").join("syntax"));
    }

    #[test]
    fn test_missing_explicit_config_fails() {
        let temp = TempDir::new().unwrap();
        let args = Args::try_parse_from(["mermaid-agent", "--config", "nope.toml", "references", "list"])
            .unwrap();
        assert!(Config::from_args_in(&args, temp.path()).is_err());
    }
}
