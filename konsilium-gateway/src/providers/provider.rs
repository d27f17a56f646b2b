//! Provider trait for abstracting generation backends.

use async_trait::async_trait;

use konsilium_core::{ChatMessage, GenerationOptions};

/// Provider error types.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("no content in response")]
    NoContent,
    #[error("invalid response format: {0}")]
    InvalidFormat(String),
}

impl ProviderError {
    /// Connectivity failures (refused connections, timeouts) get reported to
    /// users differently from model-side errors.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_connect() || e.is_timeout())
    }
}

/// A generation backend: given a prompt, returns generated text. May fail or
/// time out; callers decide how to degrade.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider name.
    fn name(&self) -> &str;

    /// Current model.
    fn model(&self) -> &str;

    /// Run one generation request.
    async fn generate(
        &self,
        system: Option<&str>,
        messages: &[ChatMessage],
        options: &GenerationOptions,
    ) -> Result<String, ProviderError>;

    /// Cheap reachability probe for health reporting.
    async fn health(&self) -> Result<(), ProviderError>;
}
