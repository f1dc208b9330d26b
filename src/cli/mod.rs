//! Command-line front end
//!
//! Parses arguments, sets up logging and dispatches to one command.

pub mod commands;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use crate::config::{Args, Command, Config};

/// Entry point of the `mermaid-agent` binary
pub async fn run() -> Result<ExitCode> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let config = Config::from_args(&args)?;
    if let Some(path) = &config.project_config_path {
        log::info!("Loaded project config from {}", path.display());
    }

    match &args.command {
        Command::Validate(validate) => commands::validate(validate).await,
        Command::Run(run) => commands::run(&config, run).await,
        Command::References { command } => commands::references(&config, command).await,
    }
}

/// Logs go to stderr; `RUST_LOG` wins over `--log-level`
fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    let _ = env_logger::Builder::from_env(env)
        .target(env_logger::Target::Stderr)
        .try_init();
}
