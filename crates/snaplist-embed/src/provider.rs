//! Embedding providers.
//!
//! A provider wraps a learned feature-extraction model. Providers are
//! optional: when none is configured, or a call fails, the generator falls
//! back to its deterministic pixel-grid embedding.

use crate::error::EmbedError;
use crate::Result;
use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Trait for embedding providers.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Get the embedding dimension.
    fn dimension(&self) -> usize;

    /// Generate an embedding for an encoded image (PNG/JPEG bytes).
    async fn embed_image(&self, image_bytes: &[u8]) -> Result<Vec<f32>>;
}

/// Remote embedding provider speaking a simple JSON protocol.
pub struct RemoteEmbeddings {
    client: Client,
    endpoint: String,
    model: String,
    dimension: usize,
    timeout: Duration,
}

impl RemoteEmbeddings {
    /// Create a new remote provider.
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>, dimension: usize) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            model: model.into(),
            dimension,
            timeout: Duration::from_millis(2000),
        }
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl EmbeddingProvider for RemoteEmbeddings {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_image(&self, image_bytes: &[u8]) -> Result<Vec<f32>> {
        #[derive(Serialize)]
        struct Request {
            model: String,
            image: String,
        }

        #[derive(Deserialize)]
        struct Response {
            embedding: Vec<f32>,
        }

        let request = Request {
            model: self.model.clone(),
            image: base64::engine::general_purpose::STANDARD.encode(image_bytes),
        };

        let response = self
            .client
            .post(format!("{}/v1/embeddings/image", self.endpoint))
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(EmbedError::Provider(format!("API error: {}", text)));
        }

        let response: Response = response.json().await?;
        if response.embedding.is_empty() {
            return Err(EmbedError::Provider("Empty embedding returned".to_string()));
        }
        Ok(response.embedding)
    }
}
