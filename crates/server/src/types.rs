use catalogsearch_vector::CatalogRecord;
use serde::{Deserialize, Serialize};

/// `POST /semantic_search` body
#[derive(Debug, Clone, Deserialize)]
pub struct SemanticSearchRequest {
    /// Free-text query; empty degrades to a catalog listing
    #[serde(default)]
    pub query: String,

    /// Page size; absent or non-positive means the default
    #[serde(default)]
    pub limit: Option<i32>,
}

/// `GET /search` query string
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,

    #[serde(default)]
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<CatalogRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
