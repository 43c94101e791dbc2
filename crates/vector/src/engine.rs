use async_trait::async_trait;
use catalogsearch_common::{AppConfig, CatalogSearchError, Result};
use catalogsearch_embed::EmbeddingProvider;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::fallback::{FallbackChain, LexicalTier, SearchTier};
use crate::lexical::LexicalSearch;
use crate::store::{StoreHandle, VectorStore};
use crate::types::CatalogRecord;

/// Page-size bounds for a search call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    pub default_limit: usize,
    pub max_limit: usize,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 50,
        }
    }
}

impl SearchLimits {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            default_limit: config.search_default_limit,
            max_limit: config.search_max_limit,
        }
    }

    /// Absent or non-positive → default page size; oversized → ceiling
    pub fn clamp(&self, requested: Option<i64>) -> usize {
        match requested {
            Some(n) if n > 0 => usize::try_from(n).unwrap_or(usize::MAX).min(self.max_limit),
            _ => self.default_limit,
        }
    }
}

/// Query embedding + weighted ranking over stored vectors
pub struct SemanticTier {
    provider: Arc<dyn EmbeddingProvider>,
    store: StoreHandle,
    deadline: Duration,
}

impl SemanticTier {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, store: StoreHandle, deadline: Duration) -> Self {
        Self {
            provider,
            store,
            deadline,
        }
    }

    async fn rank(&self, store: &Arc<dyn VectorStore>, query: &str, limit: usize) -> Result<Vec<CatalogRecord>> {
        let query_vector = self.provider.embed(query).await?;
        debug!("Generated query embedding with {} dimensions", query_vector.len());

        let rows = store.rank(&query_vector, limit).await?;
        let total = rows.len();

        let mut records = Vec::with_capacity(total);
        for ranked in rows {
            let id = ranked.row.id.clone();
            match ranked.row.decode() {
                Ok(record) => records.push(record),
                Err(e) => warn!(product_id = %id, "Skipping malformed ranked row: {}", e),
            }
        }

        if records.len() < total {
            info!("Decoded {} of {} ranked rows", records.len(), total);
        }
        Ok(records)
    }
}

#[async_trait]
impl SearchTier for SemanticTier {
    fn name(&self) -> &'static str {
        "semantic"
    }

    async fn attempt(&self, query: &str, limit: usize) -> Option<Vec<CatalogRecord>> {
        let Some(store) = self.store.get() else {
            debug!("Vector store disabled, skipping semantic tier");
            return None;
        };

        if query.trim().is_empty() {
            debug!("Empty query, skipping semantic tier");
            return None;
        }

        match tokio::time::timeout(self.deadline, self.rank(store, query, limit)).await {
            Ok(Ok(records)) => Some(records),
            Ok(Err(e)) => {
                warn!(query = %query, "Semantic search failed, falling back: {}", e);
                None
            }
            Err(_) => {
                warn!(query = %query, "Semantic search exceeded {:?}, falling back", self.deadline);
                None
            }
        }
    }
}

/// Ranked results and the tier that produced them
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub records: Vec<CatalogRecord>,
    pub tier: Option<&'static str>,
    pub limit: usize,
}

/// Semantic product search with lexical fallback
///
/// Every call walks the whole chain again; no tier is remembered as broken
/// between calls.
pub struct SemanticSearchEngine {
    chain: FallbackChain,
    limits: SearchLimits,
}

impl SemanticSearchEngine {
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        store: StoreHandle,
        lexical: Arc<dyn LexicalSearch>,
        limits: SearchLimits,
        deadline: Duration,
    ) -> Self {
        info!(
            "Semantic search engine ready (store {}, limits {}..={})",
            if store.is_enabled() { "enabled" } else { "disabled" },
            limits.default_limit,
            limits.max_limit
        );

        let chain = FallbackChain::new()
            .then(Arc::new(SemanticTier::new(provider, store, deadline)))
            .then(Arc::new(LexicalTier::new(lexical)));
        Self::with_chain(chain, limits)
    }

    pub fn with_chain(chain: FallbackChain, limits: SearchLimits) -> Self {
        Self { chain, limits }
    }

    pub fn limits(&self) -> SearchLimits {
        self.limits
    }

    /// Search; data-availability problems degrade to fallback results
    pub async fn search(&self, query: &str, limit: Option<i64>) -> SearchOutcome {
        let limit = self.limits.clamp(limit);
        debug!(query = %query, limit, "Search requested");

        let outcome = self.chain.run(query, limit).await;
        SearchOutcome {
            records: outcome.records,
            tier: outcome.tier,
            limit,
        }
    }

    /// Like [`search`](Self::search), but aborts in-flight provider and store
    /// calls as soon as `cancel` fires
    pub async fn search_with_cancel(
        &self,
        query: &str,
        limit: Option<i64>,
        cancel: &CancellationToken,
    ) -> Result<SearchOutcome> {
        if cancel.is_cancelled() {
            return Err(CatalogSearchError::Cancelled);
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!(query = %query, "Search cancelled by caller");
                Err(CatalogSearchError::Cancelled)
            }
            outcome = self.search(query, limit) => Ok(outcome),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexical::CatalogLexicalSearch;
    use crate::memory::MemoryVectorStore;
    use crate::types::{CatalogRow, EmbeddingField, EmbeddingJob, EmbeddingUpdate, RankedRow};
    use catalogsearch_embed::ProviderHealth;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const DIM: usize = 3;

    /// Provider answering from a lookup table
    struct TableProvider {
        vectors: HashMap<String, Vec<f32>>,
        calls: AtomicUsize,
        delay: Option<Duration>,
    }

    impl TableProvider {
        fn new(entries: &[(&str, [f32; DIM])]) -> Self {
            Self {
                vectors: entries.iter().map(|(k, v)| (k.to_string(), v.to_vec())).collect(),
                calls: AtomicUsize::new(0),
                delay: None,
            }
        }

        fn slow(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }
    }

    #[async_trait]
    impl EmbeddingProvider for TableProvider {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.vectors
                .get(text)
                .cloned()
                .ok_or_else(|| CatalogSearchError::network("connection refused"))
        }

        async fn health(&self) -> Result<ProviderHealth> {
            Ok(ProviderHealth {
                status: "healthy".to_string(),
                model: None,
            })
        }

        fn dimensions(&self) -> usize {
            DIM
        }
    }

    /// Store whose ranking query always errors
    struct FailingStore;

    #[async_trait]
    impl VectorStore for FailingStore {
        async fn write_embeddings(&self, _id: &str, _update: &EmbeddingUpdate) -> Result<u64> {
            Err(CatalogSearchError::store("down"))
        }

        async fn rank(&self, _query: &[f32], _limit: usize) -> Result<Vec<RankedRow>> {
            Err(CatalogSearchError::store("relation \"products\" does not exist"))
        }

        async fn pending_jobs(&self, _after: Option<&str>, _limit: usize) -> Result<Vec<EmbeddingJob>> {
            Ok(Vec::new())
        }

        async fn ping(&self) -> Result<()> {
            Err(CatalogSearchError::store("down"))
        }
    }

    /// Store returning a fixed set of rows, malformed ones included
    struct CannedStore(Vec<RankedRow>);

    #[async_trait]
    impl VectorStore for CannedStore {
        async fn write_embeddings(&self, _id: &str, _update: &EmbeddingUpdate) -> Result<u64> {
            Ok(0)
        }

        async fn rank(&self, _query: &[f32], limit: usize) -> Result<Vec<RankedRow>> {
            Ok(self.0.iter().take(limit).cloned().collect())
        }

        async fn pending_jobs(&self, _after: Option<&str>, _limit: usize) -> Result<Vec<EmbeddingJob>> {
            Ok(Vec::new())
        }

        async fn ping(&self) -> Result<()> {
            Ok(())
        }
    }

    fn product(id: &str, name: &str) -> CatalogRecord {
        CatalogRecord {
            id: id.to_string(),
            name: name.to_string(),
            description: format!("{} for every room", name.to_lowercase()),
            ..Default::default()
        }
    }

    fn catalog() -> Arc<CatalogLexicalSearch> {
        Arc::new(CatalogLexicalSearch::new(
            (0..60)
                .map(|i| product(&format!("p{:02}", i), if i % 2 == 0 { "Chair" } else { "Lamp" }))
                .collect(),
        ))
    }

    async fn embedded_store(entries: &[(&str, EmbeddingField, [f32; DIM])]) -> MemoryVectorStore {
        let store = MemoryVectorStore::new(DIM);
        for (id, field, vector) in entries {
            if store.embeddings(id).await.is_none() {
                store.upsert_record(product(id, id)).await;
            }
            let mut update = EmbeddingUpdate::new(DIM);
            update.set(*field, vector.to_vec()).unwrap();
            store.write_embeddings(id, &update).await.unwrap();
        }
        store
    }

    fn engine(provider: TableProvider, store: StoreHandle, lexical: Arc<dyn LexicalSearch>) -> SemanticSearchEngine {
        SemanticSearchEngine::new(
            Arc::new(provider),
            store,
            lexical,
            SearchLimits::default(),
            Duration::from_millis(200),
        )
    }

    #[test]
    fn test_limit_clamping() {
        let limits = SearchLimits::default();
        assert_eq!(limits.clamp(None), 10);
        assert_eq!(limits.clamp(Some(0)), 10);
        assert_eq!(limits.clamp(Some(-4)), 10);
        assert_eq!(limits.clamp(Some(7)), 7);
        assert_eq!(limits.clamp(Some(1000)), 50);
    }

    #[tokio::test]
    async fn test_closer_combined_vector_ranks_first() {
        let store = embedded_store(&[
            ("close", EmbeddingField::Combined, [1.0, 0.1, 0.0]),
            ("zeros", EmbeddingField::Combined, [0.2, 1.0, 0.0]),
            ("zeros", EmbeddingField::TargetTags, [0.0, 0.0, 0.0]),
            ("zeros", EmbeddingField::UseContext, [0.0, 0.0, 0.0]),
        ])
        .await;
        let engine = engine(
            TableProvider::new(&[("armchair", [1.0, 0.0, 0.0])]),
            StoreHandle::enabled(store),
            catalog(),
        );

        let outcome = engine.search("armchair", Some(5)).await;
        assert_eq!(outcome.tier, Some("semantic"));
        let ids: Vec<_> = outcome.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["close", "zeros"]);
    }

    #[tokio::test]
    async fn test_provider_down_matches_direct_lexical_search() {
        let store = embedded_store(&[("a", EmbeddingField::Combined, [1.0, 0.0, 0.0])]).await;
        let lexical = catalog();
        let engine = engine(TableProvider::new(&[]), StoreHandle::enabled(store), lexical.clone());

        let outcome = engine.search("chair", None).await;
        let direct = lexical.search("chair", 10).await.unwrap();
        assert_eq!(outcome.tier, Some("lexical"));
        assert_eq!(outcome.records, direct);
    }

    #[tokio::test]
    async fn test_disabled_store_always_falls_back() {
        let provider = TableProvider::new(&[("chair", [1.0, 0.0, 0.0])]);
        let engine = engine(provider, StoreHandle::Disabled, catalog());

        for query in ["chair", "lamp", ""] {
            let outcome = engine.search(query, Some(3)).await;
            assert_eq!(outcome.tier, Some("lexical"));
            assert!(outcome.records.len() <= 3);
        }
    }

    #[tokio::test]
    async fn test_empty_query_degrades_without_embedding() {
        let provider = Arc::new(TableProvider::new(&[]));
        let store = embedded_store(&[("a", EmbeddingField::Combined, [1.0, 0.0, 0.0])]).await;
        let engine = SemanticSearchEngine::new(
            provider.clone(),
            StoreHandle::enabled(store),
            catalog(),
            SearchLimits::default(),
            Duration::from_secs(1),
        );

        let outcome = engine.search("", Some(5)).await;
        assert!(outcome.records.len() <= 5);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_oversized_limit_is_capped() {
        let engine = engine(TableProvider::new(&[]), StoreHandle::Disabled, catalog());
        let outcome = engine.search("", Some(1000)).await;
        assert_eq!(outcome.limit, 50);
        assert_eq!(outcome.records.len(), 50);
    }

    #[tokio::test]
    async fn test_ranking_failure_falls_back() {
        let provider = TableProvider::new(&[("chair", [1.0, 0.0, 0.0])]);
        let engine = engine(provider, StoreHandle::enabled(FailingStore), catalog());
        let outcome = engine.search("chair", Some(4)).await;
        assert_eq!(outcome.tier, Some("lexical"));
        assert_eq!(outcome.records.len(), 4);
    }

    #[tokio::test]
    async fn test_slow_provider_falls_back_after_deadline() {
        let provider = TableProvider::new(&[("chair", [1.0, 0.0, 0.0])]).slow(Duration::from_secs(5));
        let store = embedded_store(&[("a", EmbeddingField::Combined, [1.0, 0.0, 0.0])]).await;
        let engine = engine(provider, StoreHandle::enabled(store), catalog());
        let outcome = engine.search("chair", Some(2)).await;
        assert_eq!(outcome.tier, Some("lexical"));
    }

    #[tokio::test]
    async fn test_malformed_rows_are_skipped() {
        let good = CatalogRow {
            id: "good".to_string(),
            categories: Some("{furniture}".to_string()),
            ..Default::default()
        };
        let bad = CatalogRow {
            id: "bad".to_string(),
            categories: Some("{furniture".to_string()),
            ..Default::default()
        };
        let store = CannedStore(vec![
            RankedRow { row: bad, score: 0.1 },
            RankedRow { row: good, score: 0.2 },
        ]);
        let provider = TableProvider::new(&[("chair", [1.0, 0.0, 0.0])]);
        let engine = engine(provider, StoreHandle::enabled(store), catalog());

        let outcome = engine.search("chair", Some(5)).await;
        assert_eq!(outcome.tier, Some("semantic"));
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].categories, vec!["furniture"]);
    }

    #[tokio::test]
    async fn test_cancellation_fails_fast() {
        let provider = TableProvider::new(&[("chair", [1.0, 0.0, 0.0])]).slow(Duration::from_secs(30));
        let store = embedded_store(&[("a", EmbeddingField::Combined, [1.0, 0.0, 0.0])]).await;
        let engine = SemanticSearchEngine::new(
            Arc::new(provider),
            StoreHandle::enabled(store),
            catalog(),
            SearchLimits::default(),
            Duration::from_secs(60),
        );

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let started = std::time::Instant::now();
        let result = engine.search_with_cancel("chair", Some(5), &cancel).await;
        assert!(matches!(result, Err(CatalogSearchError::Cancelled)));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_already_cancelled_token() {
        let engine = engine(TableProvider::new(&[]), StoreHandle::Disabled, catalog());
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(engine.search_with_cancel("chair", None, &cancel).await.is_err());
    }
}
