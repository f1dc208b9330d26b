//! Language Model Collaborator
//!
//! The agent only depends on the `Completion` trait: a prompt and a
//! diagram-type hint go in, text comes out. `LlmClient` is the concrete
//! OpenAI-compatible implementation.

pub mod config;
pub mod openai;
pub mod types;

pub use config::{LlmConfig, LlmSettings, LlmTimeouts};
pub use types::{ChatMessage, LlmError, Role};

/// Opaque text completion capability
#[async_trait::async_trait]
pub trait Completion: Send + Sync {
    async fn complete(&self, prompt: &str, diagram_type_hint: &str) -> Result<String, LlmError>;
}

/// HTTP model client configured by [`LlmConfig`]
pub struct LlmClient {
    inner: openai::OpenAiClient,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        log::debug!("Using model {} at {}", config.model, config.base_url);
        Ok(Self {
            inner: openai::OpenAiClient::new(config)?,
        })
    }

    pub fn model(&self) -> &str {
        self.inner.model()
    }
}

fn system_message(diagram_type_hint: &str) -> String {
    if diagram_type_hint.trim().is_empty() {
        "You are a Mermaid diagram expert.".to_string()
    } else {
        format!("You are a Mermaid diagram expert working on a {diagram_type_hint} diagram.")
    }
}

#[async_trait::async_trait]
impl Completion for LlmClient {
    async fn complete(&self, prompt: &str, diagram_type_hint: &str) -> Result<String, LlmError> {
        let messages = [
            ChatMessage::system(system_message(diagram_type_hint)),
            ChatMessage::user(prompt),
        ];
        self.inner.chat(&messages).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_message_mentions_hint() {
        assert!(system_message("sequenceDiagram").contains("sequenceDiagram diagram"));
        assert_eq!(system_message(""), "You are a Mermaid diagram expert.");
    }

    #[test]
    fn test_client_builds_without_key() {
        let config = LlmConfig::resolve(
            LlmSettings {
                base_url: Some("http://localhost:1234/v1".to_string()),
                ..Default::default()
            },
            LlmSettings::default(),
            |_: &str| None,
            false,
        )
        .unwrap();

        let client = LlmClient::new(config).unwrap();
        assert_eq!(client.model(), config::DEFAULT_MODEL);
    }
}
