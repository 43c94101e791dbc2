use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::lexical::LexicalSearch;
use crate::types::CatalogRecord;

/// One way of answering a search
///
/// `None` means "this tier could not answer", never "no matches"; an empty
/// result set is `Some(vec![])`.
#[async_trait]
pub trait SearchTier: Send + Sync {
    fn name(&self) -> &'static str;

    async fn attempt(&self, query: &str, limit: usize) -> Option<Vec<CatalogRecord>>;
}

/// Result of running a [`FallbackChain`]
#[derive(Debug, Clone, PartialEq)]
pub struct ChainOutcome {
    /// Tier that answered, `None` if every tier declined
    pub tier: Option<&'static str>,
    pub records: Vec<CatalogRecord>,
}

/// Ordered list of tiers, tried until one answers
#[derive(Clone, Default)]
pub struct FallbackChain {
    tiers: Vec<Arc<dyn SearchTier>>,
}

impl FallbackChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, tier: Arc<dyn SearchTier>) -> Self {
        self.tiers.push(tier);
        self
    }

    /// Try every tier in order. Results are truncated to `limit` regardless
    /// of what a tier returns.
    pub async fn run(&self, query: &str, limit: usize) -> ChainOutcome {
        for (position, tier) in self.tiers.iter().enumerate() {
            match tier.attempt(query, limit).await {
                Some(mut records) => {
                    records.truncate(limit);
                    if position > 0 {
                        info!(tier = tier.name(), results = records.len(), "Answered by fallback tier");
                    } else {
                        debug!(tier = tier.name(), results = records.len(), "Answered by primary tier");
                    }
                    return ChainOutcome {
                        tier: Some(tier.name()),
                        records,
                    };
                }
                None => debug!(tier = tier.name(), "Tier declined, trying next"),
            }
        }

        warn!("Every search tier declined; returning no results");
        ChainOutcome {
            tier: None,
            records: Vec::new(),
        }
    }
}

/// Catalog keyword search as the last resort
pub struct LexicalTier {
    lexical: Arc<dyn LexicalSearch>,
}

impl LexicalTier {
    pub fn new(lexical: Arc<dyn LexicalSearch>) -> Self {
        Self { lexical }
    }
}

#[async_trait]
impl SearchTier for LexicalTier {
    fn name(&self) -> &'static str {
        "lexical"
    }

    async fn attempt(&self, query: &str, limit: usize) -> Option<Vec<CatalogRecord>> {
        match self.lexical.search(query, limit).await {
            Ok(records) => Some(records),
            Err(e) => {
                warn!("Lexical search failed: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexical::CatalogLexicalSearch;
    use catalogsearch_common::{CatalogSearchError, Result};

    struct Fixed(&'static str, Option<usize>);

    #[async_trait]
    impl SearchTier for Fixed {
        fn name(&self) -> &'static str {
            self.0
        }

        async fn attempt(&self, _query: &str, _limit: usize) -> Option<Vec<CatalogRecord>> {
            self.1.map(|n| {
                (0..n)
                    .map(|i| CatalogRecord {
                        id: format!("{}-{}", self.0, i),
                        ..Default::default()
                    })
                    .collect()
            })
        }
    }

    struct BrokenLexical;

    #[async_trait]
    impl LexicalSearch for BrokenLexical {
        async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<CatalogRecord>> {
            Err(CatalogSearchError::network("catalog unavailable"))
        }
    }

    #[tokio::test]
    async fn test_first_answering_tier_wins() {
        let chain = FallbackChain::new()
            .then(Arc::new(Fixed("semantic", None)))
            .then(Arc::new(Fixed("lexical", Some(2))));
        let outcome = chain.run("q", 10).await;
        assert_eq!(outcome.tier, Some("lexical"));
        assert_eq!(outcome.records.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_answer_still_counts() {
        let chain = FallbackChain::new()
            .then(Arc::new(Fixed("semantic", Some(0))))
            .then(Arc::new(Fixed("lexical", Some(2))));
        assert_eq!(chain.run("q", 10).await.tier, Some("semantic"));
    }

    #[tokio::test]
    async fn test_results_truncated_to_limit() {
        let chain = FallbackChain::new().then(Arc::new(Fixed("semantic", Some(20))));
        assert_eq!(chain.run("q", 3).await.records.len(), 3);
    }

    #[tokio::test]
    async fn test_all_tiers_decline() {
        let chain = FallbackChain::new().then(Arc::new(LexicalTier::new(Arc::new(BrokenLexical))));
        let outcome = chain.run("q", 5).await;
        assert_eq!(outcome.tier, None);
        assert!(outcome.records.is_empty());
    }

    #[tokio::test]
    async fn test_lexical_tier_answers() {
        let catalog = CatalogLexicalSearch::new(vec![CatalogRecord {
            id: "1".to_string(),
            name: "Chair".to_string(),
            ..Default::default()
        }]);
        let tier = LexicalTier::new(Arc::new(catalog));
        assert_eq!(tier.attempt("chair", 5).await.unwrap().len(), 1);
    }
}
