//! Ollama API client (native /api/chat endpoint, non-streaming).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use konsilium_core::{ChatMessage, GenerationOptions, MessageRole};

use crate::providers::provider::{Provider, ProviderError};

/// Ollama chat client.
#[derive(Clone)]
pub struct OllamaClient {
    http_client: reqwest::Client,
    base_url: String,
    model: String,
}

/// Request body for the chat endpoint.
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

/// Sampling options in Ollama's vocabulary (`num_predict` caps output
/// tokens).
#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    top_p: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<OllamaMessage>,
}

impl OllamaClient {
    /// Create a new client. `base_url` is the Ollama server root, with or
    /// without a trailing slash.
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout_seconds: u64,
    ) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_seconds))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            http_client,
            base_url: base_url.into(),
            model: model.into(),
        }
    }

    fn normalized_base_url(&self) -> String {
        self.base_url.trim_end_matches('/').to_string()
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.normalized_base_url())
    }

    fn tags_url(&self) -> String {
        format!("{}/api/tags", self.normalized_base_url())
    }

    fn convert_messages(
        &self,
        system: Option<&str>,
        messages: &[ChatMessage],
    ) -> Vec<OllamaMessage> {
        let mut converted = Vec::with_capacity(messages.len() + 1);
        if let Some(system) = system {
            converted.push(OllamaMessage {
                role: "system".to_string(),
                content: system.to_string(),
            });
        }
        for message in messages {
            let role = match message.role {
                MessageRole::System => "system",
                MessageRole::User => "user",
                MessageRole::Assistant => "assistant",
            };
            converted.push(OllamaMessage {
                role: role.to_string(),
                content: message.content.clone(),
            });
        }
        converted
    }
}

#[async_trait]
impl Provider for OllamaClient {
    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        system: Option<&str>,
        messages: &[ChatMessage],
        options: &GenerationOptions,
    ) -> Result<String, ProviderError> {
        let request_body = ChatRequest {
            model: self.model.clone(),
            messages: self.convert_messages(system, messages),
            stream: false,
            options: OllamaOptions {
                temperature: options.temperature,
                top_p: options.top_p,
                num_predict: options.max_tokens,
            },
        };

        let response = self
            .http_client
            .post(self.chat_url())
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let response_text = response.text().await?;
        let chat_response: ChatResponse = serde_json::from_str(&response_text).map_err(|e| {
            let preview: String = response_text.chars().take(500).collect();
            ProviderError::InvalidFormat(format!(
                "Failed to parse Ollama response: {e}\nBody preview: {preview}"
            ))
        })?;

        match chat_response.message {
            Some(message) if !message.content.is_empty() => Ok(message.content),
            _ => Err(ProviderError::NoContent),
        }
    }

    async fn health(&self) -> Result<(), ProviderError> {
        let response = self.http_client.get(self.tags_url()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: "model list request failed".to_string(),
            });
        }
        Ok(())
    }
}
