/// Catalog search error types
#[derive(Debug, thiserror::Error)]
pub enum CatalogSearchError {
    /// Embedding provider related error
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Vector store related error
    #[error("Store error: {0}")]
    Store(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network/HTTP error
    #[error("Network error: {0}")]
    Network(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Vector length does not match the configured dimensionality
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Caller cancelled the request
    #[error("Request cancelled")]
    Cancelled,

    /// Deadline elapsed
    #[error("Timed out: {0}")]
    Timeout(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Database driver error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// General error (anyhow integration)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CatalogSearchError {
    /// Create embedding error
    pub fn embedding<S: Into<String>>(msg: S) -> Self {
        Self::Embedding(msg.into())
    }

    /// Create store error
    pub fn store<S: Into<String>>(msg: S) -> Self {
        Self::Store(msg.into())
    }

    /// Create config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create network error
    pub fn network<S: Into<String>>(msg: S) -> Self {
        Self::Network(msg.into())
    }

    /// Create serialization error
    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        Self::Serialization(msg.into())
    }

    /// Create invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create timeout error
    pub fn timeout<S: Into<String>>(msg: S) -> Self {
        Self::Timeout(msg.into())
    }

    /// Whether retrying the same operation later may succeed.
    ///
    /// Data errors (wrong vector length, undecodable payloads) never heal on
    /// their own; connection and provider hiccups usually do.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) | Self::Embedding(_) | Self::Store(_) => true,
            Self::Io(_) => true,
            Self::Database(e) => matches!(
                e,
                sqlx::Error::Io(_)
                    | sqlx::Error::PoolTimedOut
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::WorkerCrashed
            ),
            _ => false,
        }
    }
}

// HTTP response conversion
impl CatalogSearchError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidInput(_) => 400,
            Self::Json(_) => 400,
            Self::Cancelled => 499,
            Self::Timeout(_) => 504,
            Self::Network(_) => 503,
            Self::Config(_) => 500,
            Self::Embedding(_) => 500,
            Self::Store(_) => 500,
            Self::Database(_) => 500,
            Self::DimensionMismatch { .. } => 500,
            Self::Serialization(_) => 500,
            Self::Io(_) => 500,
            Self::Other(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(CatalogSearchError::invalid_input("nil request").status_code(), 400);
        assert_eq!(CatalogSearchError::Cancelled.status_code(), 499);
        assert_eq!(CatalogSearchError::network("down").status_code(), 503);
        assert_eq!(CatalogSearchError::timeout("slow").status_code(), 504);
    }

    #[test]
    fn test_transient_classification() {
        assert!(CatalogSearchError::network("reset").is_transient());
        assert!(CatalogSearchError::Database(sqlx::Error::PoolTimedOut).is_transient());
        assert!(!CatalogSearchError::invalid_input("bad").is_transient());
        assert!(!CatalogSearchError::DimensionMismatch { expected: 768, actual: 3 }.is_transient());
    }

    #[test]
    fn test_dimension_mismatch_message() {
        let err = CatalogSearchError::DimensionMismatch { expected: 768, actual: 512 };
        assert_eq!(err.to_string(), "Dimension mismatch: expected 768, got 512");
    }
}
