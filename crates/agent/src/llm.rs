//! Text-generation collaborator.
//!
//! One trait, three providers selected once at construction from
//! configuration. The pipeline only ever sees `LlmClient`; provider branching
//! never leaks into business logic.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use mira_core::config::{LlmConfig, LlmProvider};

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("llm transport failure: {0}")]
    Transport(String),
    #[error("llm returned an unexpected payload: {0}")]
    MalformedResponse(String),
    #[error("llm configuration error: {0}")]
    Configuration(String),
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// One generation call. No retries at this layer; single-attempt semantics
    /// are deliberate and the caller decides how to degrade.
    async fn generate(
        &self,
        system_instruction: &str,
        user_prompt: &str,
        temperature: f32,
    ) -> Result<String, LlmError>;
}

pub fn build_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|error| LlmError::Configuration(error.to_string()))?;

    match config.provider {
        LlmProvider::OpenAi => {
            let api_key = require_api_key(config)?;
            Ok(Arc::new(OpenAiChatClient {
                http,
                base_url: config
                    .base_url
                    .clone()
                    .unwrap_or_else(|| "https://api.openai.com".to_string()),
                api_key,
                model: config.model.clone(),
            }))
        }
        LlmProvider::Anthropic => {
            let api_key = require_api_key(config)?;
            Ok(Arc::new(AnthropicMessagesClient {
                http,
                base_url: config
                    .base_url
                    .clone()
                    .unwrap_or_else(|| "https://api.anthropic.com".to_string()),
                api_key,
                model: config.model.clone(),
            }))
        }
        LlmProvider::Ollama => {
            let base_url = config
                .base_url
                .clone()
                .ok_or_else(|| {
                    LlmError::Configuration("ollama provider requires llm.base_url".to_string())
                })?;
            Ok(Arc::new(OllamaClient { http, base_url, model: config.model.clone() }))
        }
    }
}

fn require_api_key(config: &LlmConfig) -> Result<SecretString, LlmError> {
    config.api_key.clone().ok_or_else(|| {
        LlmError::Configuration(format!(
            "{:?} provider requires llm.api_key",
            config.provider
        ))
    })
}

// ---------------------------------------------------------------------------
// OpenAI chat completions
// ---------------------------------------------------------------------------

pub struct OpenAiChatClient {
    http: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    model: String,
}

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Deserialize)]
struct OpenAiMessage {
    content: String,
}

#[async_trait]
impl LlmClient for OpenAiChatClient {
    async fn generate(
        &self,
        system_instruction: &str,
        user_prompt: &str,
        temperature: f32,
    ) -> Result<String, LlmError> {
        let url = format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'));
        let request = OpenAiRequest {
            model: &self.model,
            temperature,
            messages: vec![
                ChatMessage { role: "system", content: system_instruction },
                ChatMessage { role: "user", content: user_prompt },
            ],
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|error| LlmError::Transport(error.to_string()))?
            .error_for_status()
            .map_err(|error| LlmError::Transport(error.to_string()))?;

        let payload: OpenAiResponse = response
            .json()
            .await
            .map_err(|error| LlmError::MalformedResponse(error.to_string()))?;

        payload
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| LlmError::MalformedResponse("empty choices array".to_string()))
    }
}

// ---------------------------------------------------------------------------
// Anthropic messages
// ---------------------------------------------------------------------------

pub struct AnthropicMessagesClient {
    http: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    model: String,
}

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
}

#[derive(Deserialize)]
struct AnthropicContent {
    #[serde(default)]
    text: String,
}

#[async_trait]
impl LlmClient for AnthropicMessagesClient {
    async fn generate(
        &self,
        system_instruction: &str,
        user_prompt: &str,
        temperature: f32,
    ) -> Result<String, LlmError> {
        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));
        let request = AnthropicRequest {
            model: &self.model,
            max_tokens: 1024,
            temperature,
            system: system_instruction,
            messages: vec![ChatMessage { role: "user", content: user_prompt }],
        };

        let response = self
            .http
            .post(&url)
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", "2023-06-01")
            .json(&request)
            .send()
            .await
            .map_err(|error| LlmError::Transport(error.to_string()))?
            .error_for_status()
            .map_err(|error| LlmError::Transport(error.to_string()))?;

        let payload: AnthropicResponse = response
            .json()
            .await
            .map_err(|error| LlmError::MalformedResponse(error.to_string()))?;

        payload
            .content
            .into_iter()
            .next()
            .map(|block| block.text)
            .ok_or_else(|| LlmError::MalformedResponse("empty content array".to_string()))
    }
}

// ---------------------------------------------------------------------------
// Ollama generate
// ---------------------------------------------------------------------------

pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    system: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct OllamaResponse {
    response: String,
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn generate(
        &self,
        system_instruction: &str,
        user_prompt: &str,
        temperature: f32,
    ) -> Result<String, LlmError> {
        let url = format!("{}/api/generate", self.base_url.trim_end_matches('/'));
        let request = OllamaRequest {
            model: &self.model,
            system: system_instruction,
            prompt: user_prompt,
            stream: false,
            options: OllamaOptions { temperature },
        };

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|error| LlmError::Transport(error.to_string()))?
            .error_for_status()
            .map_err(|error| LlmError::Transport(error.to_string()))?;

        let payload: OllamaResponse = response
            .json()
            .await
            .map_err(|error| LlmError::MalformedResponse(error.to_string()))?;

        Ok(payload.response)
    }
}
