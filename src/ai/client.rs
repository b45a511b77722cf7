//! Language model providers.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

use crate::config::{AiConfig, ProviderKind};

/// Errors from model calls.
#[derive(Error, Debug)]
pub enum AiError {
    #[error("API key not configured (env: {0})")]
    MissingApiKey(String),
    #[error("API request failed: {0}")]
    RequestFailed(String),
    #[error("Failed to parse response: {0}")]
    ParseError(String),
    #[error("Model request timed out")]
    Timeout,
}

/// A language model that turns a prompt into raw answer text.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Generate an answer for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String, AiError>;
}

fn build_http_client(config: &AiConfig) -> Result<Client, AiError> {
    Client::builder()
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()
        .map_err(|e| AiError::RequestFailed(format!("Failed to build HTTP client: {e}")))
}

fn map_send_error(e: &reqwest::Error) -> AiError {
    if e.is_timeout() {
        AiError::Timeout
    } else {
        AiError::RequestFailed(e.to_string())
    }
}

/// Concatenate the text parts of the first Gemini candidate.
fn gemini_text(response: &serde_json::Value) -> String {
    response["candidates"][0]["content"]["parts"]
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part["text"].as_str())
                .collect::<String>()
        })
        .unwrap_or_default()
}

/// Concatenate the text blocks of a Claude message.
fn claude_text(response: &serde_json::Value) -> String {
    response["content"]
        .as_array()
        .map(|blocks| {
            blocks
                .iter()
                .filter_map(|block| block["text"].as_str())
                .collect::<String>()
        })
        .unwrap_or_default()
}

/// Gemini API provider.
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl GeminiProvider {
    /// Create a new Gemini provider.
    #[must_use]
    pub fn new(
        client: Client,
        base_url: String,
        api_key: String,
        model: String,
        max_tokens: u32,
    ) -> Self {
        Self {
            client,
            base_url,
            api_key,
            model,
            max_tokens,
        }
    }
}

#[async_trait]
impl ModelProvider for GeminiProvider {
    async fn generate(&self, prompt: &str) -> Result<String, AiError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );

        let body = serde_json::json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }]
            }],
            "generationConfig": {
                "maxOutputTokens": self.max_tokens
            }
        });

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| map_send_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AiError::RequestFailed(format!("HTTP {status}: {text}")));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AiError::ParseError(e.to_string()))?;
        Ok(gemini_text(&json).trim().to_string())
    }
}

/// Claude API provider.
#[derive(Debug, Clone)]
pub struct ClaudeProvider {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl ClaudeProvider {
    /// Create a new Claude provider.
    #[must_use]
    pub fn new(
        client: Client,
        base_url: String,
        api_key: String,
        model: String,
        max_tokens: u32,
    ) -> Self {
        Self {
            client,
            base_url,
            api_key,
            model,
            max_tokens,
        }
    }
}

#[async_trait]
impl ModelProvider for ClaudeProvider {
    async fn generate(&self, prompt: &str) -> Result<String, AiError> {
        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));

        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "messages": [{
                "role": "user",
                "content": prompt
            }]
        });

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&body)
            .send()
            .await
            .map_err(|e| map_send_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AiError::RequestFailed(format!("HTTP {status}: {text}")));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AiError::ParseError(e.to_string()))?;
        Ok(claude_text(&json).trim().to_string())
    }
}

/// Provider enum for dispatch.
#[derive(Debug, Clone)]
pub enum Provider {
    Gemini(GeminiProvider),
    Claude(ClaudeProvider),
}

#[async_trait]
impl ModelProvider for Provider {
    async fn generate(&self, prompt: &str) -> Result<String, AiError> {
        match self {
            Self::Gemini(p) => p.generate(prompt).await,
            Self::Claude(p) => p.generate(prompt).await,
        }
    }
}

/// Configured model client.
#[derive(Debug, Clone)]
pub struct ModelClient {
    provider: Provider,
    config: AiConfig,
}

impl ModelClient {
    /// Create client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `AiError::MissingApiKey` if the configured API key environment
    /// variable is not set, or `AiError::RequestFailed` if the HTTP client
    /// cannot be built.
    pub fn from_config(config: AiConfig) -> Result<Self, AiError> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| AiError::MissingApiKey(config.api_key_env.clone()))?;
        let client = build_http_client(&config)?;

        let provider = match config.provider {
            ProviderKind::Gemini => Provider::Gemini(GeminiProvider::new(
                client,
                config.base_url.clone(),
                api_key,
                config.model.clone(),
                config.max_tokens,
            )),
            ProviderKind::Claude => Provider::Claude(ClaudeProvider::new(
                client,
                config.base_url.clone(),
                api_key,
                config.model.clone(),
                config.max_tokens,
            )),
        };

        Ok(Self { provider, config })
    }

    /// Get the configured model.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Get the provider kind.
    #[must_use]
    pub fn provider_kind(&self) -> &ProviderKind {
        &self.config.provider
    }
}

#[async_trait]
impl ModelProvider for ModelClient {
    async fn generate(&self, prompt: &str) -> Result<String, AiError> {
        tracing::debug!(model = %self.config.model, prompt_len = prompt.len(), "Calling model");
        self.provider.generate(prompt).await
    }
}
