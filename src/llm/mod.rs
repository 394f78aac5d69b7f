//! Chat-completion clients for the hosted and local model providers.
//!
//! Every model-backed step (summaries, classification, key-information extraction, entity
//! recognition, and question answering) goes through [`LlmClient`]. Both adapters issue HTTP
//! requests directly with `reqwest`.

mod ollama;
mod openai;
#[cfg(test)]
pub(crate) mod testing;

use crate::config::{LlmProvider, get_config};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

pub use ollama::OllamaChatClient;
pub use openai::OpenAiChatClient;

/// Errors surfaced while requesting completions.
#[derive(Debug, Error)]
pub enum LlmClientError {
    /// Provider was unreachable or misconfigured.
    #[error("Model provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// Provider returned an error response.
    #[error("Failed to generate completion: {0}")]
    GenerationFailed(String),
    /// Provider response could not be parsed.
    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
}

/// Shape the model is asked to answer in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseFormat {
    /// Free-form text.
    #[default]
    Text,
    /// A single JSON object.
    JsonObject,
}

/// One chat-completion request.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Optional system message preceding the prompt.
    pub system: Option<String>,
    /// User prompt.
    pub prompt: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum number of tokens to generate.
    pub max_tokens: u32,
    /// Requested response format.
    pub response_format: ResponseFormat,
}

impl CompletionRequest {
    /// Build a text request with the given sampling settings.
    pub fn new(prompt: impl Into<String>, temperature: f32, max_tokens: u32) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            temperature,
            max_tokens,
            response_format: ResponseFormat::Text,
        }
    }

    /// Attach a system message.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Ask for a JSON object reply.
    pub fn json(mut self) -> Self {
        self.response_format = ResponseFormat::JsonObject;
        self
    }
}

/// Interface implemented by chat-completion providers.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Return the assistant message for the request.
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmClientError>;
}

/// Build a chat client based on configuration.
pub fn get_llm_client() -> Result<Arc<dyn LlmClient>, LlmClientError> {
    let config = get_config();
    match config.llm_provider {
        LlmProvider::OpenAI => {
            let api_key = config.openai_api_key.clone().ok_or_else(|| {
                LlmClientError::ProviderUnavailable("OPENAI_API_KEY is not set".into())
            })?;
            Ok(Arc::new(OpenAiChatClient::new(
                config.openai_base_url.clone(),
                api_key,
                config.chat_model.clone(),
            )?))
        }
        LlmProvider::Ollama => Ok(Arc::new(OllamaChatClient::new(
            config.ollama_url.clone(),
            config.chat_model.clone(),
        )?)),
    }
}

/// Parse a model reply that should contain a JSON value.
///
/// Accepts bare JSON as well as JSON wrapped in a Markdown code fence or surrounded by prose.
pub fn parse_json_reply(reply: &str) -> Option<Value> {
    let trimmed = reply.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Some(value);
    }

    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim);
    if let Some(inner) = unfenced
        && let Ok(value) = serde_json::from_str(inner)
    {
        return Some(value);
    }

    let start = trimmed.find(['{', '['])?;
    let end = trimmed.rfind(['}', ']'])?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&trimmed[start..=end]).ok()
}
