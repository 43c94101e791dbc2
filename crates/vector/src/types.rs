use catalogsearch_common::{CatalogSearchError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::codec::{decode_text_array, join_tags};

/// Price in USD, split the way the catalog stores it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Money {
    #[serde(default)]
    pub currency_code: String,

    #[serde(default)]
    pub units: i64,

    #[serde(default)]
    pub nanos: i32,
}

/// Catalog product as returned to search callers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogRecord {
    /// Stable product ID
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub picture: String,

    #[serde(default)]
    pub price_usd: Money,

    #[serde(default)]
    pub categories: Vec<String>,

    /// Audiences the product is aimed at
    #[serde(default)]
    pub target_tags: Vec<String>,

    /// Situations the product is used in
    #[serde(default)]
    pub use_context: Vec<String>,
}

/// One of the five per-product embedding columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EmbeddingField {
    Description,
    Category,
    Combined,
    TargetTags,
    UseContext,
}

impl EmbeddingField {
    pub const ALL: [EmbeddingField; 5] = [
        EmbeddingField::Description,
        EmbeddingField::Category,
        EmbeddingField::Combined,
        EmbeddingField::TargetTags,
        EmbeddingField::UseContext,
    ];

    /// Store column holding this vector
    pub fn column(self) -> &'static str {
        match self {
            Self::Description => "description_embedding",
            Self::Category => "category_embedding",
            Self::Combined => "combined_embedding",
            Self::TargetTags => "target_tags_embedding",
            Self::UseContext => "use_context_embedding",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Description => "description",
            Self::Category => "category",
            Self::Combined => "combined",
            Self::TargetTags => "target_tags",
            Self::UseContext => "use_context",
        }
    }
}

impl fmt::Display for EmbeddingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Change notification for one product
///
/// May be delivered more than once; processing it must be idempotent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EmbeddingJob {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Raw category string as the notifier sent it
    pub categories: String,
    pub target_tags: Vec<String>,
    pub use_context: Vec<String>,
}

impl EmbeddingJob {
    /// Source text for each embedding column
    pub fn variants(&self) -> [(EmbeddingField, String); 5] {
        let combined = format!("{} {} {}", self.name, self.description, self.categories);
        [
            (EmbeddingField::Description, self.description.clone()),
            (EmbeddingField::Category, self.categories.clone()),
            (EmbeddingField::Combined, combined.trim().to_string()),
            (EmbeddingField::TargetTags, join_tags(&self.target_tags)),
            (EmbeddingField::UseContext, join_tags(&self.use_context)),
        ]
    }
}

/// Column changes for a single write-back
///
/// `Some(vector)` overwrites a column, `None` clears it. Every vector held
/// here has exactly the configured dimensionality.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingUpdate {
    dim: usize,
    columns: BTreeMap<EmbeddingField, Option<Vec<f32>>>,
}

impl EmbeddingUpdate {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            columns: BTreeMap::new(),
        }
    }

    /// Stage a vector for `field`; rejects partial vectors
    pub fn set(&mut self, field: EmbeddingField, vector: Vec<f32>) -> Result<()> {
        if vector.len() != self.dim {
            return Err(CatalogSearchError::DimensionMismatch {
                expected: self.dim,
                actual: vector.len(),
            });
        }
        self.columns.insert(field, Some(vector));
        Ok(())
    }

    /// Stage a NULL for `field`
    pub fn clear(&mut self, field: EmbeddingField) {
        self.columns.insert(field, None);
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn iter(&self) -> impl Iterator<Item = (EmbeddingField, Option<&[f32]>)> {
        self.columns.iter().map(|(f, v)| (*f, v.as_deref()))
    }

    /// Fields receiving a vector
    pub fn computed_fields(&self) -> Vec<EmbeddingField> {
        self.columns
            .iter()
            .filter(|(_, v)| v.is_some())
            .map(|(f, _)| *f)
            .collect()
    }

    pub fn has_vectors(&self) -> bool {
        self.columns.values().any(Option::is_some)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Undecoded product row; list columns are still delimiter-encoded text
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogRow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub picture: String,
    pub currency_code: String,
    pub units: i64,
    pub nanos: i32,
    pub categories: Option<String>,
    pub target_tags: Option<String>,
    pub use_context: Option<String>,
}

impl CatalogRow {
    /// Rebuild the catalog record, splitting encoded list columns
    pub fn decode(self) -> Result<CatalogRecord> {
        if self.id.trim().is_empty() {
            return Err(CatalogSearchError::serialization("row has an empty product id"));
        }
        if self.nanos.unsigned_abs() >= 1_000_000_000 {
            return Err(CatalogSearchError::serialization(format!(
                "row {} has out-of-range nanos {}",
                self.id, self.nanos
            )));
        }

        let categories = decode_list(self.categories.as_deref())?;
        let target_tags = decode_list(self.target_tags.as_deref())?;
        let use_context = decode_list(self.use_context.as_deref())?;

        Ok(CatalogRecord {
            id: self.id,
            name: self.name,
            description: self.description,
            picture: self.picture,
            price_usd: Money {
                currency_code: self.currency_code,
                units: self.units,
                nanos: self.nanos,
            },
            categories,
            target_tags,
            use_context,
        })
    }
}

fn decode_list(raw: Option<&str>) -> Result<Vec<String>> {
    raw.map(decode_text_array).transpose().map(Option::unwrap_or_default)
}

/// Ranked row with its weighted distance (lower = more similar)
#[derive(Debug, Clone, PartialEq)]
pub struct RankedRow {
    pub row: CatalogRow,
    pub score: f64,
}
