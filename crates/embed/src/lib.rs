//! Catalog search embedding provider
//!
//! HTTP client for the `POST /embed` embedding service and the
//! `EmbeddingProvider` seam the worker and search engine depend on.

mod client;
mod provider;
mod types;

pub use client::HttpEmbeddingClient;
pub use provider::EmbeddingProvider;
pub use types::{EmbedRequest, EmbedResponse, ProviderHealth};
