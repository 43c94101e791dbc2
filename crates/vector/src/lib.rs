//! Catalog search vector core
//!
//! Per-field product embeddings, the weighted hybrid ranking over them, and
//! the semantic → lexical fallback chain that answers search requests.

pub mod codec;
pub mod engine;
pub mod fallback;
pub mod lexical;
pub mod memory;
pub mod pg;
pub mod scoring;
pub mod store;
pub mod types;

pub use engine::{SearchLimits, SearchOutcome, SemanticSearchEngine, SemanticTier};
pub use fallback::{ChainOutcome, FallbackChain, LexicalTier, SearchTier};
pub use lexical::{CatalogLexicalSearch, LexicalSearch, PgLexicalSearch};
pub use memory::MemoryVectorStore;
pub use pg::PgVectorStore;
pub use scoring::{cosine_distance, ScoreWeights, MISSING_DISTANCE};
pub use store::{StoreHandle, VectorStore};
pub use types::{
    CatalogRecord, CatalogRow, EmbeddingField, EmbeddingJob, EmbeddingUpdate, Money, RankedRow,
};
