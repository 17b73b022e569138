use crate::config::LlmConfig;
use crate::error::{AnalyticsError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Anything that can turn a message list into a completion.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage], temperature: f32) -> Result<String>;
}

/// OpenAI-compatible `/chat/completions` client.
pub struct LlmClient {
    api_key: String,
    base_url: String,
    model: String,
    http: reqwest::Client,
    max_retries: u32,
    retry_backoff: Duration,
}

enum Attempt {
    Retryable(String),
    Fatal(String),
}

impl LlmClient {
    pub fn new(api_key: String, base_url: String, model: String) -> Result<Self> {
        Self::build(api_key, base_url, model, Duration::from_secs(60), 2)
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        Self::build(
            config.require_api_key()?.to_string(),
            config.base_url.clone(),
            config.model.clone(),
            config.timeout,
            config.max_retries,
        )
    }

    fn build(
        api_key: String,
        base_url: String,
        model: String,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AnalyticsError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            http,
            max_retries,
            retry_backoff: Duration::from_millis(500),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn attempt(&self, body: &serde_json::Value) -> std::result::Result<String, Attempt> {
        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| Attempt::Retryable(format!("LLM API call failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = format!("LLM API returned {}: {}", status, text);
            return Err(if status.as_u16() == 429 || status.is_server_error() {
                Attempt::Retryable(message)
            } else {
                Attempt::Fatal(message)
            });
        }

        let response_json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Attempt::Fatal(format!("Failed to parse LLM response: {}", e)))?;

        extract_content(&response_json).map_err(|e| Attempt::Fatal(e.to_string()))
    }
}

#[async_trait]
impl CompletionService for LlmClient {
    async fn complete(&self, messages: &[ChatMessage], temperature: f32) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "temperature": temperature,
        });

        let mut attempt = 0u32;
        loop {
            debug!(attempt, model = %self.model, "Calling completion service");
            match self.attempt(&body).await {
                Ok(content) => return Ok(content),
                Err(Attempt::Retryable(message)) if attempt < self.max_retries => {
                    attempt += 1;
                    warn!("⚠️  {} (retry {}/{})", message, attempt, self.max_retries);
                    tokio::time::sleep(self.retry_backoff * attempt).await;
                }
                Err(Attempt::Retryable(message)) | Err(Attempt::Fatal(message)) => {
                    return Err(AnalyticsError::Completion(message));
                }
            }
        }
    }
}

/// Pulls `choices[0].message.content` out of a chat completion response.
pub fn extract_content(response: &serde_json::Value) -> Result<String> {
    response["choices"][0]["message"]["content"]
        .as_str()
        .map(|content| content.to_string())
        .ok_or_else(|| AnalyticsError::Completion("No content in LLM response".to_string()))
}
