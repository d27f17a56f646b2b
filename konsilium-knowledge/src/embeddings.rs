use serde::Deserialize;

use crate::errors::{KnowledgeError, KnowledgeResult};
use konsilium_core::KnowledgeSettings;

/// Client for the Ollama embedding endpoint.
#[derive(Debug, Clone)]
pub struct EmbeddingClient {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl EmbeddingClient {
    pub fn new(settings: &KnowledgeSettings) -> Self {
        Self {
            base_url: settings.embedding_url.trim_end_matches('/').to_string(),
            model: settings.embedding_model.clone(),
            client: reqwest::Client::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn embed(&self, input: &str) -> KnowledgeResult<Vec<f32>> {
        let mut vectors = self.embed_batch(&[input.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| KnowledgeError::Embedding("embedding response missing vectors".into()))
    }

    pub async fn embed_batch(&self, inputs: &[String]) -> KnowledgeResult<Vec<Vec<f32>>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/api/embed", self.base_url);
        let body = EmbedRequest {
            model: self.model.clone(),
            input: inputs.to_vec(),
        };

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(KnowledgeError::Embedding(format!(
                "embedding request failed: {status} {text}"
            )));
        }

        let payload: EmbedResponse = response.json().await?;
        let vectors = match (payload.embeddings, payload.embedding) {
            (Some(embeddings), _) => embeddings,
            (None, Some(embedding)) => vec![embedding],
            (None, None) => {
                return Err(KnowledgeError::Embedding(
                    "embedding response missing vectors".to_string(),
                ));
            }
        };

        if vectors.len() != inputs.len() {
            return Err(KnowledgeError::Embedding(format!(
                "embedding count mismatch: sent {}, got {}",
                inputs.len(),
                vectors.len()
            )));
        }
        // One provider configuration must always produce one dimensionality.
        if let Some(first) = vectors.first() {
            let expected = first.len();
            for vector in &vectors {
                if vector.len() != expected {
                    return Err(KnowledgeError::DimensionMismatch {
                        expected,
                        actual: vector.len(),
                    });
                }
            }
        }

        Ok(vectors)
    }
}

#[derive(Debug, Clone, serde::Serialize)]
struct EmbedRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct EmbedResponse {
    embeddings: Option<Vec<Vec<f32>>>,
    embedding: Option<Vec<f32>>,
}
