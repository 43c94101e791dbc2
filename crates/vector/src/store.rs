use async_trait::async_trait;
use catalogsearch_common::Result;
use std::fmt;
use std::sync::Arc;

use crate::types::{EmbeddingJob, EmbeddingUpdate, RankedRow};

/// Product table with per-field vectors
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Overwrite the columns named in `update` for one product.
    /// Returns the number of rows touched (0 when the product is gone).
    async fn write_embeddings(&self, product_id: &str, update: &EmbeddingUpdate) -> Result<u64>;

    /// Products with a `combined` vector, ordered by weighted distance to
    /// `query`, at most `limit` of them
    async fn rank(&self, query: &[f32], limit: usize) -> Result<Vec<RankedRow>>;

    /// Products still missing their `combined` vector, ordered by id and
    /// strictly after `after_id`
    async fn pending_jobs(&self, after_id: Option<&str>, limit: usize) -> Result<Vec<EmbeddingJob>>;

    /// Cheap liveness probe
    async fn ping(&self) -> Result<()>;
}

/// Store dependency as injected into the engine and worker
///
/// `Disabled` is the "no database configured" state; callers branch on it
/// instead of checking for a missing connection.
#[derive(Clone)]
pub enum StoreHandle {
    Disabled,
    Enabled(Arc<dyn VectorStore>),
}

impl StoreHandle {
    pub fn enabled(store: impl VectorStore + 'static) -> Self {
        Self::Enabled(Arc::new(store))
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Enabled(_))
    }

    pub fn get(&self) -> Option<&Arc<dyn VectorStore>> {
        match self {
            Self::Enabled(store) => Some(store),
            Self::Disabled => None,
        }
    }
}

impl fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => f.write_str("StoreHandle::Disabled"),
            Self::Enabled(_) => f.write_str("StoreHandle::Enabled"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryVectorStore;

    #[test]
    fn test_disabled_handle() {
        let handle = StoreHandle::Disabled;
        assert!(!handle.is_enabled());
        assert!(handle.get().is_none());
    }

    #[tokio::test]
    async fn test_enabled_handle() {
        let handle = StoreHandle::enabled(MemoryVectorStore::new(3));
        assert!(handle.is_enabled());
        handle.get().unwrap().ping().await.unwrap();
        assert_eq!(format!("{:?}", handle), "StoreHandle::Enabled");
    }
}
