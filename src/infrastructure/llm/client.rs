//! # Chat Client
//!
//! Provides the `ChatCompletion` trait and `OpenRouterClient`, the HTTP
//! implementation against an OpenAI-compatible `/chat/completions` endpoint.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::domain::config::Settings;
use crate::domain::error::{Error, Result};
use crate::infrastructure::llm::types::{AssistantReply, ChatRequest, ChatResponse};
use crate::strings::messages;

/// One request/response exchange with the chat endpoint.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Returns the first choice's assistant message.
    async fn complete(&self, api_key: &str, request: &ChatRequest<'_>) -> Result<AssistantReply>;
}

pub struct OpenRouterClient {
    http: Client,
    base_url: String,
}

impl OpenRouterClient {
    /// `timeout` bounds each HTTP call.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::transport("HTTP client setup", None, e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(&settings.endpoint, Duration::from_secs(settings.timeout_secs))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ChatCompletion for OpenRouterClient {
    async fn complete(&self, api_key: &str, request: &ChatRequest<'_>) -> Result<AssistantReply> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!(url = %url, model = request.model, messages = request.messages.len(), "chat request");

        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .header("X-Title", "taskgrid")
            .json(request)
            .send()
            .await
            .map_err(|e| Error::transport(messages::PRIMARY_REQUEST, None, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(Error::transport(messages::PRIMARY_REQUEST, Some(status.as_u16()), body));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::MalformedResponse(format!("Failed to parse response: {}", e)))?;

        if let Some(usage) = &parsed.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                "chat usage"
            );
        }

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| Error::MalformedResponse("No choices in response".to_string()))
    }
}
