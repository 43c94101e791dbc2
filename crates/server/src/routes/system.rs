use actix_web::{get, web, HttpResponse};
use catalogsearch_embed::EmbeddingProvider;
use catalogsearch_vector::VectorStore;
use chrono::Utc;
use serde_json::json;
use tracing::warn;

use crate::state::AppState;

/// Liveness plus the state of both collaborators. Always 200; a degraded
/// collaborator means fallback results, not an outage.
#[get("/health")]
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    let provider = match state.provider.health().await {
        Ok(health) => json!({
            "status": health.status,
            "model": health.model,
        }),
        Err(e) => {
            warn!("Embedding service health check failed: {}", e);
            json!({ "status": "unreachable", "error": e.to_string() })
        }
    };

    let store = match state.store.get() {
        None => "disabled",
        Some(store) => match store.ping().await {
            Ok(()) => "enabled",
            Err(e) => {
                warn!("Vector store ping failed: {}", e);
                "unreachable"
            }
        },
    };

    HttpResponse::Ok().json(json!({
        "status": "ok",
        "store": store,
        "embedding_service": provider,
        "uptime_secs": Utc::now().signed_duration_since(state.started_at).num_seconds(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
