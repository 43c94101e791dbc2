use serde::{Deserialize, Serialize};

/// Embedding service request
#[derive(Debug, Clone, Serialize)]
pub struct EmbedRequest {
    /// Text to embed
    pub text: String,
}

/// Embedding service response
#[derive(Debug, Clone, Deserialize)]
pub struct EmbedResponse {
    /// Dense vector
    pub embedding: Vec<f32>,

    /// Length reported by the service
    #[serde(default)]
    pub dimensions: Option<usize>,

    /// Model that produced the vector
    #[serde(default)]
    pub model: Option<String>,
}

/// Embedding service health report
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderHealth {
    /// "healthy" when the service is ready
    pub status: String,

    /// Model the service is configured with
    #[serde(default)]
    pub model: Option<String>,
}

impl ProviderHealth {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}
