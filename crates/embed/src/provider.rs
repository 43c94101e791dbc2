use async_trait::async_trait;
use catalogsearch_common::Result;

use crate::types::ProviderHealth;

/// Stateless `text -> vector[D]` capability
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text. The returned vector always has `dimensions()`
    /// components; anything else is reported as an error.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Probe the provider
    async fn health(&self) -> Result<ProviderHealth>;

    /// Expected vector length (D)
    fn dimensions(&self) -> usize;
}
