use async_trait::async_trait;
use catalogsearch_common::{CatalogSearchError, Result};
use serde::Deserialize;
use sqlx::postgres::PgPool;
use std::path::Path;
use tracing::{info, warn};

use crate::pg::{catalog_row, PRODUCT_COLUMNS};
use crate::types::CatalogRecord;

/// Keyword/substring product search provided by the catalog
#[async_trait]
pub trait LexicalSearch: Send + Sync {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<CatalogRecord>>;
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    products: Vec<CatalogRecord>,
}

/// Case-insensitive substring match over a static product list
#[derive(Debug, Clone, Default)]
pub struct CatalogLexicalSearch {
    products: Vec<CatalogRecord>,
}

impl CatalogLexicalSearch {
    pub fn new(products: Vec<CatalogRecord>) -> Self {
        Self { products }
    }

    /// Load a `{"products": [...]}` catalog file
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| {
            CatalogSearchError::config(format!("Failed to read catalog {}: {}", path.display(), e))
        })?;
        let catalog: CatalogFile = serde_json::from_str(&data)?;
        info!("Loaded {} products from {}", catalog.products.len(), path.display());
        Ok(Self::new(catalog.products))
    }

    pub fn products(&self) -> &[CatalogRecord] {
        &self.products
    }
}

#[async_trait]
impl LexicalSearch for CatalogLexicalSearch {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<CatalogRecord>> {
        let needle = query.trim().to_lowercase();
        Ok(self
            .products
            .iter()
            .filter(|p| {
                p.name.to_lowercase().contains(&needle) || p.description.to_lowercase().contains(&needle)
            })
            .take(limit)
            .cloned()
            .collect())
    }
}

/// `ILIKE` search over the products table
#[derive(Debug, Clone)]
pub struct PgLexicalSearch {
    pool: PgPool,
}

impl PgLexicalSearch {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Escape LIKE metacharacters and wrap in wildcards
fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for c in query.trim().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[async_trait]
impl LexicalSearch for PgLexicalSearch {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<CatalogRecord>> {
        let sql = format!(
            "SELECT {} FROM products p \
             WHERE p.name ILIKE $1 OR p.description ILIKE $1 \
             ORDER BY p.id ASC LIMIT $2",
            PRODUCT_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(like_pattern(query))
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            match catalog_row(row).map_err(CatalogSearchError::from).and_then(|r| r.decode()) {
                Ok(record) => records.push(record),
                Err(e) => warn!("Skipping malformed product row: {}", e),
            }
        }
        Ok(records)
    }
}
