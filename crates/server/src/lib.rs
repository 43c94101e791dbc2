//! Catalog search HTTP server
//!
//! Actix-web 기반 시맨틱 검색 API

pub mod error;
pub mod routes;
pub mod state;
pub mod types;

use actix_cors::Cors;
use actix_web::{error::InternalError, web, App, HttpResponse, HttpServer};
use catalogsearch_common::{AppConfig, Result};
use catalogsearch_embed::EmbeddingProvider;
use tracing::{info, warn};
use tracing_actix_web::TracingLogger;

pub use state::AppState;

use crate::types::ErrorResponse;

/// Register every route
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(routes::search::semantic_search)
        .service(routes::search::search)
        .service(routes::system::health);
}

/// Undecodable JSON bodies are contract errors: 400, never a fallback
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let response = HttpResponse::BadRequest().json(ErrorResponse {
            error: format!("invalid argument: {}", err),
        });
        InternalError::from_response(err, response).into()
    })
}

/// Run the HTTP server until interrupted
pub async fn start_server(config: AppConfig) -> Result<()> {
    let state = web::Data::new(AppState::new(&config)?);

    match state.provider.health().await {
        Ok(health) if health.is_healthy() => {
            info!("Embedding service ready (model: {})", health.model.as_deref().unwrap_or("unknown"))
        }
        Ok(health) => warn!("Embedding service reports status '{}'", health.status),
        Err(e) => warn!("Embedding service unavailable, searches will fall back: {}", e),
    }

    let bind_address = config.server_bind_address();
    info!("Starting server on http://{}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .wrap(Cors::permissive())
            .app_data(state.clone())
            .app_data(json_config())
            .configure(configure)
    })
    .bind(&bind_address)?
    .run()
    .await?;

    info!("Server stopped");
    Ok(())
}
