use actix_web::{get, post, web, HttpResponse};
use catalogsearch_vector::LexicalSearch;
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;
use crate::types::{SearchQuery, SearchResponse, SemanticSearchRequest};

/// Semantic search; degrades to lexical results instead of failing
#[post("/semantic_search")]
pub async fn semantic_search(
    request: web::Json<SemanticSearchRequest>,
    state: web::Data<AppState>,
) -> actix_web::Result<HttpResponse> {
    let request = request.into_inner();
    let outcome = state
        .engine
        .search(&request.query, request.limit.map(i64::from))
        .await;

    debug!(
        tier = outcome.tier.unwrap_or("none"),
        results = outcome.records.len(),
        "semantic_search answered"
    );

    Ok(HttpResponse::Ok().json(SearchResponse {
        results: outcome.records,
    }))
}

/// Plain catalog keyword search
#[get("/search")]
pub async fn search(
    query: web::Query<SearchQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let limit = state.engine.limits().clamp(query.limit);
    let results = state.lexical.search(&query.q, limit).await?;

    Ok(HttpResponse::Ok().json(SearchResponse { results }))
}
