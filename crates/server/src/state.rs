use catalogsearch_common::{AppConfig, Result};
use catalogsearch_embed::{EmbeddingProvider, HttpEmbeddingClient};
use catalogsearch_vector::{
    CatalogLexicalSearch, LexicalSearch, PgLexicalSearch, PgVectorStore, SearchLimits, SemanticSearchEngine,
    StoreHandle,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Shared application state
pub struct AppState {
    /// Semantic search with lexical fallback
    pub engine: SemanticSearchEngine,

    /// Catalog keyword search, also served directly
    pub lexical: Arc<dyn LexicalSearch>,

    pub provider: Arc<dyn EmbeddingProvider>,

    pub store: StoreHandle,

    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Build state from configuration. A missing database is not an error;
    /// semantic search then always falls back.
    pub fn new(config: &AppConfig) -> Result<Self> {
        let provider: Arc<dyn EmbeddingProvider> = Arc::new(HttpEmbeddingClient::from_config(config)?);

        let (store, pool) = if config.store_configured() {
            let pg = PgVectorStore::connect_lazy(config)?;
            let pool = pg.pool().clone();
            (StoreHandle::enabled(pg), Some(pool))
        } else {
            warn!("DATABASE_URL not set, semantic search runs in fallback mode");
            (StoreHandle::Disabled, None)
        };

        let lexical: Arc<dyn LexicalSearch> = match (&config.catalog_path, pool) {
            (Some(path), _) => Arc::new(CatalogLexicalSearch::load(path)?),
            (None, Some(pool)) => {
                info!("Lexical search served from the products table");
                Arc::new(PgLexicalSearch::new(pool))
            }
            (None, None) => {
                warn!("No catalog source configured, lexical search returns nothing");
                Arc::new(CatalogLexicalSearch::default())
            }
        };

        Ok(Self::from_parts(
            provider,
            store,
            lexical,
            SearchLimits::from_config(config),
            config.search_timeout(),
        ))
    }

    pub fn from_parts(
        provider: Arc<dyn EmbeddingProvider>,
        store: StoreHandle,
        lexical: Arc<dyn LexicalSearch>,
        limits: SearchLimits,
        deadline: Duration,
    ) -> Self {
        let engine = SemanticSearchEngine::new(provider.clone(), store.clone(), lexical.clone(), limits, deadline);
        Self {
            engine,
            lexical,
            provider,
            store,
            started_at: Utc::now(),
        }
    }
}
