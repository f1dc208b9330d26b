//! Model endpoint configuration.
//!
//! Layered lowest to highest: built-in defaults, the project file's `[llm]`
//! section, environment variables, command-line flags.

use serde::Deserialize;

use super::types::LlmError;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

pub const ENV_BASE_URL: &str = "MERMAID_AGENT_BASE_URL";
pub const ENV_MODEL: &str = "MERMAID_AGENT_MODEL";
pub const ENV_API_KEY_ENV: &str = "MERMAID_AGENT_API_KEY_ENV";
pub const ENV_TEMPERATURE: &str = "MERMAID_AGENT_TEMPERATURE";
pub const ENV_MAX_TOKENS: &str = "MERMAID_AGENT_MAX_TOKENS";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "MERMAID_AGENT_REQUEST_TIMEOUT_SECS";
pub const ENV_CONNECT_TIMEOUT_SECS: &str = "MERMAID_AGENT_CONNECT_TIMEOUT_SECS";

/// Partial settings from one configuration layer
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub model: Option<String>,
    pub base_url: Option<String>,
    /// Name of the environment variable holding the API key
    pub api_key_env: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub request_timeout_secs: Option<u64>,
    pub connect_timeout_secs: Option<u64>,
}

impl LlmSettings {
    /// Read the `MERMAID_AGENT_*` variables through `lookup`
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, LlmError> {
        Ok(Self {
            model: lookup(ENV_MODEL),
            base_url: lookup(ENV_BASE_URL),
            api_key_env: lookup(ENV_API_KEY_ENV),
            temperature: parse_var(&lookup, ENV_TEMPERATURE)?,
            max_tokens: parse_var(&lookup, ENV_MAX_TOKENS)?,
            request_timeout_secs: parse_var(&lookup, ENV_REQUEST_TIMEOUT_SECS)?,
            connect_timeout_secs: parse_var(&lookup, ENV_CONNECT_TIMEOUT_SECS)?,
        })
    }

    /// Fill unset values from a lower-priority layer
    pub fn or(self, lower: LlmSettings) -> Self {
        Self {
            model: self.model.or(lower.model),
            base_url: self.base_url.or(lower.base_url),
            api_key_env: self.api_key_env.or(lower.api_key_env),
            temperature: self.temperature.or(lower.temperature),
            max_tokens: self.max_tokens.or(lower.max_tokens),
            request_timeout_secs: self.request_timeout_secs.or(lower.request_timeout_secs),
            connect_timeout_secs: self.connect_timeout_secs.or(lower.connect_timeout_secs),
        }
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, LlmError> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| LlmError::ConfigParse(format!("invalid {key}: '{raw}'"))),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LlmTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

/// Fully resolved endpoint configuration
#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    /// `None` for local servers that take no key
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub timeouts: LlmTimeouts,
}

impl LlmConfig {
    /// Resolve against the process environment
    pub fn from_env(
        cli: LlmSettings,
        file: LlmSettings,
        require_key: bool,
    ) -> Result<Self, LlmError> {
        Self::resolve(cli, file, |key| std::env::var(key).ok(), require_key)
    }

    /// Resolve with an explicit variable lookup
    ///
    /// Command-line values win, then the environment, then the project file.
    pub fn resolve(
        cli: LlmSettings,
        file: LlmSettings,
        lookup: impl Fn(&str) -> Option<String>,
        require_key: bool,
    ) -> Result<Self, LlmError> {
        let settings = cli.or(LlmSettings::from_vars(&lookup)?).or(file);

        let api_key = if require_key {
            let var = settings
                .api_key_env
                .clone()
                .unwrap_or_else(|| DEFAULT_API_KEY_ENV.to_string());
            let key = lookup(&var).filter(|k| !k.trim().is_empty());
            Some(key.ok_or(LlmError::MissingApiKey { var })?)
        } else {
            None
        };

        let temperature = settings.temperature.unwrap_or(0.0);
        if !(0.0..=2.0).contains(&temperature) {
            return Err(LlmError::ConfigParse(format!(
                "temperature {temperature} is outside 0.0..=2.0"
            )));
        }

        Ok(Self {
            api_key,
            model: settings.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: settings
                .base_url
                .as_deref()
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            temperature,
            max_tokens: settings.max_tokens,
            timeouts: LlmTimeouts {
                request_secs: settings
                    .request_timeout_secs
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
                connect_secs: settings
                    .connect_timeout_secs
                    .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
            },
        })
    }
}
