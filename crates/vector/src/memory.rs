use async_trait::async_trait;
use catalogsearch_common::{CatalogSearchError, Result};
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::debug;

use crate::codec::encode_text_array;
use crate::scoring::{cosine_distance, ScoreWeights};
use crate::store::VectorStore;
use crate::types::{CatalogRecord, CatalogRow, EmbeddingField, EmbeddingJob, EmbeddingUpdate, RankedRow};

#[derive(Debug, Clone)]
struct StoredProduct {
    record: CatalogRecord,
    embeddings: BTreeMap<EmbeddingField, Vec<f32>>,
}

/// In-process product table with the same ranking as the Postgres store
pub struct MemoryVectorStore {
    dim: usize,
    weights: ScoreWeights,
    products: RwLock<BTreeMap<String, StoredProduct>>,
}

impl MemoryVectorStore {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            weights: ScoreWeights::default(),
            products: RwLock::new(BTreeMap::new()),
        }
    }

    /// Insert or replace a product. Existing embeddings are kept, the way a
    /// catalog edit leaves vector columns alone until the worker catches up.
    pub async fn upsert_record(&self, record: CatalogRecord) {
        let mut products = self.products.write().await;
        match products.get_mut(&record.id) {
            Some(existing) => existing.record = record,
            None => {
                products.insert(
                    record.id.clone(),
                    StoredProduct {
                        record,
                        embeddings: BTreeMap::new(),
                    },
                );
            }
        }
    }

    /// Stored vectors of one product
    pub async fn embeddings(&self, product_id: &str) -> Option<BTreeMap<EmbeddingField, Vec<f32>>> {
        self.products
            .read()
            .await
            .get(product_id)
            .map(|p| p.embeddings.clone())
    }

    fn to_row(record: &CatalogRecord) -> CatalogRow {
        CatalogRow {
            id: record.id.clone(),
            name: record.name.clone(),
            description: record.description.clone(),
            picture: record.picture.clone(),
            currency_code: record.price_usd.currency_code.clone(),
            units: record.price_usd.units,
            nanos: record.price_usd.nanos,
            categories: Some(encode_text_array(&record.categories)),
            target_tags: Some(encode_text_array(&record.target_tags)),
            use_context: Some(encode_text_array(&record.use_context)),
        }
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn write_embeddings(&self, product_id: &str, update: &EmbeddingUpdate) -> Result<u64> {
        if update.dim() != self.dim {
            return Err(CatalogSearchError::DimensionMismatch {
                expected: self.dim,
                actual: update.dim(),
            });
        }

        let mut products = self.products.write().await;
        let Some(product) = products.get_mut(product_id) else {
            return Ok(0);
        };

        for (field, vector) in update.iter() {
            match vector {
                Some(v) => {
                    product.embeddings.insert(field, v.to_vec());
                }
                None => {
                    product.embeddings.remove(&field);
                }
            }
        }
        Ok(1)
    }

    async fn rank(&self, query: &[f32], limit: usize) -> Result<Vec<RankedRow>> {
        if query.len() != self.dim {
            return Err(CatalogSearchError::DimensionMismatch {
                expected: self.dim,
                actual: query.len(),
            });
        }

        let products = self.products.read().await;
        let mut ranked: Vec<RankedRow> = products
            .values()
            .filter_map(|p| {
                let combined = p.embeddings.get(&EmbeddingField::Combined)?;
                let distance = |field: EmbeddingField| p.embeddings.get(&field).and_then(|v| cosine_distance(v, query));
                let score = self.weights.score(
                    cosine_distance(combined, query),
                    distance(EmbeddingField::TargetTags),
                    distance(EmbeddingField::UseContext),
                );
                Some(RankedRow {
                    row: Self::to_row(&p.record),
                    score,
                })
            })
            .collect();

        ranked.sort_by(|a, b| {
            a.score
                .partial_cmp(&b.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.row.id.cmp(&b.row.id))
        });
        ranked.truncate(limit);

        debug!("Memory store ranked {} rows", ranked.len());
        Ok(ranked)
    }

    async fn pending_jobs(&self, after_id: Option<&str>, limit: usize) -> Result<Vec<EmbeddingJob>> {
        let products = self.products.read().await;
        Ok(products
            .values()
            .filter(|p| !p.embeddings.contains_key(&EmbeddingField::Combined))
            .filter(|p| after_id.map_or(true, |after| p.record.id.as_str() > after))
            .take(limit)
            .map(|p| EmbeddingJob {
                id: p.record.id.clone(),
                name: p.record.name.clone(),
                description: p.record.description.clone(),
                categories: p.record.categories.join(", "),
                target_tags: p.record.target_tags.clone(),
                use_context: p.record.use_context.clone(),
            })
            .collect())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
