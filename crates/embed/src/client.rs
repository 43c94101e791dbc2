use async_trait::async_trait;
use catalogsearch_common::{AppConfig, CatalogSearchError, Result};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::provider::EmbeddingProvider;
use crate::types::{EmbedRequest, EmbedResponse, ProviderHealth};

/// Embedding service client (`POST /embed`, `GET /health`)
#[derive(Debug, Clone)]
pub struct HttpEmbeddingClient {
    base_url: String,
    client: Client,
    dimensions: usize,
    max_retries: u32,
}

impl HttpEmbeddingClient {
    /// Create new embedding client. Single attempt per call until
    /// [`with_retries`](Self::with_retries) is applied.
    pub fn new(base_url: impl Into<String>, dimensions: usize, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        info!("Embedding client initialized: {} (D={})", base_url, dimensions);
        Ok(Self {
            base_url,
            client,
            dimensions,
            max_retries: 1,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(
            config.embedding_service_url.clone(),
            config.embedding_dim,
            config.embedding_timeout(),
        )
    }

    /// Retry transient failures up to `max_retries` attempts in total
    pub fn with_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn embed_with_retry(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/embed", self.base_url);
        let request = EmbedRequest {
            text: text.to_string(),
        };

        debug!("Generating embedding - Text length: {}", text.len());

        let mut last_error = None;

        for attempt in 1..=self.max_retries {
            match self.try_embed(&url, &request).await {
                Ok(embedding) => return Ok(embedding),
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) => {
                    if attempt < self.max_retries {
                        let delay = Duration::from_secs(2u64.pow(attempt - 1));
                        warn!(
                            "Embedding request failed (attempt {}/{}): {}. Retrying in {:?}...",
                            attempt, self.max_retries, e, delay
                        );
                        tokio::time::sleep(delay).await;
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| CatalogSearchError::embedding("All retries failed")))
    }

    /// Single attempt to generate embedding
    async fn try_embed(&self, url: &str, request: &EmbedRequest) -> Result<Vec<f32>> {
        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CatalogSearchError::timeout(format!("embedding request: {}", e))
                } else {
                    CatalogSearchError::network(format!("Failed to send embedding request: {}", e))
                }
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(CatalogSearchError::embedding(format!(
                "Embedding service returned status {}",
                status.as_u16()
            )));
        }

        let result: EmbedResponse = response.json().await.map_err(|e| {
            CatalogSearchError::serialization(format!("Failed to parse embedding response: {}", e))
        })?;

        self.check_embedding(result)
    }

    fn check_embedding(&self, response: EmbedResponse) -> Result<Vec<f32>> {
        if response.embedding.is_empty() {
            return Err(CatalogSearchError::serialization("Empty embedding from service"));
        }

        if let Some(reported) = response.dimensions {
            if reported != response.embedding.len() {
                return Err(CatalogSearchError::serialization(format!(
                    "Embedding reports {} dimensions but carries {}",
                    reported,
                    response.embedding.len()
                )));
            }
        }

        if response.embedding.len() != self.dimensions {
            return Err(CatalogSearchError::DimensionMismatch {
                expected: self.dimensions,
                actual: response.embedding.len(),
            });
        }

        if response.embedding.iter().any(|v| !v.is_finite()) {
            return Err(CatalogSearchError::serialization("Embedding contains non-finite values"));
        }

        debug!(
            "Received embedding - Dimension: {}, Model: {}",
            response.embedding.len(),
            response.model.as_deref().unwrap_or("unknown")
        );
        Ok(response.embedding)
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_with_retry(text).await
    }

    async fn health(&self) -> Result<ProviderHealth> {
        let url = format!("{}/health", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CatalogSearchError::network(format!("Failed to reach embedding service: {}", e)))?;

        if !response.status().is_success() {
            return Err(CatalogSearchError::embedding(format!(
                "Embedding service health check returned {}",
                response.status().as_u16()
            )));
        }

        response.json::<ProviderHealth>().await.map_err(|e| {
            CatalogSearchError::serialization(format!("Failed to parse health response: {}", e))
        })
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
