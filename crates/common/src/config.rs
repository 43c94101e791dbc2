use crate::error::CatalogSearchError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Catalog search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Postgres connection string. `None` puts semantic search into permanent
    /// lexical fallback.
    pub database_url: Option<String>,

    /// Maximum pooled Store connections per process
    pub db_max_connections: u32,

    /// Seconds to wait for a Store connection
    pub db_connect_timeout_secs: u64,

    /// Embedding service base URL
    pub embedding_service_url: String,

    /// Embedding dimensionality (D)
    pub embedding_dim: usize,

    /// Per-call embedding timeout in seconds
    pub embedding_timeout_secs: u64,

    /// Retry attempts for worker-side embedding calls
    pub embedding_max_retries: u32,

    /// Page size used when the caller sends no (or a non-positive) limit
    pub search_default_limit: usize,

    /// Hard ceiling for a single search page
    pub search_max_limit: usize,

    /// Request-scoped deadline for a semantic search, in seconds
    pub search_timeout_secs: u64,

    /// Notification channel the worker listens on
    pub notify_channel: String,

    /// Bounded wait per notification poll, in seconds
    pub worker_poll_timeout_secs: u64,

    /// Reconnect attempts before the worker gives up
    pub worker_max_reconnect_attempts: u32,

    /// First reconnect delay in milliseconds (doubles per attempt)
    pub worker_reconnect_base_delay_ms: u64,

    /// JSON product catalog used for lexical search
    pub catalog_path: Option<PathBuf>,

    /// Server bind address
    pub server_host: String,

    /// Server port
    pub server_port: u16,

    /// Log directory
    pub log_dir: PathBuf,

    /// Log level
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            db_max_connections: 5,
            db_connect_timeout_secs: 5,
            embedding_service_url: "http://embeddingservice:8081".to_string(),
            embedding_dim: 768,
            embedding_timeout_secs: 30,
            embedding_max_retries: 3,
            search_default_limit: 10,
            search_max_limit: 50,
            search_timeout_secs: 10,
            notify_channel: "embedding_jobs".to_string(),
            worker_poll_timeout_secs: 5,
            worker_max_reconnect_attempts: 5,
            worker_reconnect_base_delay_ms: 500,
            catalog_path: None,
            server_host: "0.0.0.0".to_string(),
            server_port: 3550,
            log_dir: PathBuf::from("./log"),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and .env file
    pub fn from_env() -> Result<Self, CatalogSearchError> {
        // Load .env file (ignore if not exists)
        let _ = dotenv::dotenv();

        let defaults = Self::default();
        let config = Self {
            database_url: std::env::var("DATABASE_URL")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            db_max_connections: Self::get_env_parsed("DB_MAX_CONNECTIONS")
                .unwrap_or(defaults.db_max_connections),
            db_connect_timeout_secs: Self::get_env_parsed("DB_CONNECT_TIMEOUT_SECS")
                .unwrap_or(defaults.db_connect_timeout_secs),
            embedding_service_url: std::env::var("EMBEDDING_SERVICE_URL")
                .unwrap_or(defaults.embedding_service_url),
            embedding_dim: Self::get_env_parsed("EMBEDDING_DIM")
                .unwrap_or(defaults.embedding_dim),
            embedding_timeout_secs: Self::get_env_parsed("EMBEDDING_TIMEOUT_SECS")
                .unwrap_or(defaults.embedding_timeout_secs),
            embedding_max_retries: Self::get_env_parsed("EMBEDDING_MAX_RETRIES")
                .unwrap_or(defaults.embedding_max_retries),
            search_default_limit: Self::get_env_parsed("SEARCH_DEFAULT_LIMIT")
                .unwrap_or(defaults.search_default_limit),
            search_max_limit: Self::get_env_parsed("SEARCH_MAX_LIMIT")
                .unwrap_or(defaults.search_max_limit),
            search_timeout_secs: Self::get_env_parsed("SEARCH_TIMEOUT_SECS")
                .unwrap_or(defaults.search_timeout_secs),
            notify_channel: std::env::var("NOTIFY_CHANNEL")
                .unwrap_or(defaults.notify_channel),
            worker_poll_timeout_secs: Self::get_env_parsed("WORKER_POLL_TIMEOUT_SECS")
                .unwrap_or(defaults.worker_poll_timeout_secs),
            worker_max_reconnect_attempts: Self::get_env_parsed("WORKER_MAX_RECONNECT_ATTEMPTS")
                .unwrap_or(defaults.worker_max_reconnect_attempts),
            worker_reconnect_base_delay_ms: Self::get_env_parsed("WORKER_RECONNECT_BASE_DELAY_MS")
                .unwrap_or(defaults.worker_reconnect_base_delay_ms),
            catalog_path: Self::get_env_path("CATALOG_PATH"),
            server_host: std::env::var("SERVER_HOST")
                .unwrap_or(defaults.server_host),
            server_port: Self::get_env_parsed("SERVER_PORT")
                .unwrap_or(defaults.server_port),
            log_dir: Self::get_env_path("LOG_DIR")
                .unwrap_or(defaults.log_dir),
            log_level: std::env::var("LOG_LEVEL")
                .unwrap_or(defaults.log_level),
        };

        config.validate()?;

        Ok(config)
    }

    /// Get PathBuf from environment variable
    fn get_env_path(key: &str) -> Option<PathBuf> {
        std::env::var(key).ok().map(PathBuf::from)
    }

    /// Parse an environment variable, ignoring unset or malformed values
    fn get_env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
        std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
    }

    /// Whether a Store connection string was supplied
    pub fn store_configured(&self) -> bool {
        self.database_url.is_some()
    }

    pub fn embedding_timeout(&self) -> Duration {
        Duration::from_secs(self.embedding_timeout_secs.max(1))
    }

    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs.max(1))
    }

    pub fn worker_poll_timeout(&self) -> Duration {
        Duration::from_secs(self.worker_poll_timeout_secs.max(1))
    }

    /// Get server bind address (host:port)
    pub fn server_bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), CatalogSearchError> {
        if !self.embedding_service_url.starts_with("http://")
            && !self.embedding_service_url.starts_with("https://") {
            return Err(CatalogSearchError::config(
                "Embedding service URL must start with http:// or https://"
            ));
        }

        if self.embedding_dim == 0 {
            return Err(CatalogSearchError::config("Embedding dimension must be positive"));
        }

        if self.search_default_limit == 0 || self.search_default_limit > self.search_max_limit {
            return Err(CatalogSearchError::config(format!(
                "Default search limit {} must be within 1..={}",
                self.search_default_limit, self.search_max_limit
            )));
        }

        if self.notify_channel.trim().is_empty() {
            return Err(CatalogSearchError::config("Notify channel cannot be empty"));
        }

        if self.server_port == 0 {
            return Err(CatalogSearchError::config("Server port cannot be 0"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.embedding_dim, 768);
        assert_eq!(config.search_max_limit, 50);
        assert_eq!(config.notify_channel, "embedding_jobs");
        assert!(!config.store_configured());
    }

    #[test]
    fn test_server_bind_address() {
        let config = AppConfig::default();
        assert_eq!(config.server_bind_address(), "0.0.0.0:3550");
    }

    #[test]
    fn test_validate() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());

        let mut bad_url = AppConfig::default();
        bad_url.embedding_service_url = "embeddingservice:8081".to_string();
        assert!(bad_url.validate().is_err());

        let mut bad_limits = AppConfig::default();
        bad_limits.search_default_limit = 60;
        assert!(bad_limits.validate().is_err());

        let mut bad_dim = AppConfig::default();
        bad_dim.embedding_dim = 0;
        assert!(bad_dim.validate().is_err());
    }

    #[test]
    fn test_timeouts_never_zero() {
        let mut config = AppConfig::default();
        config.worker_poll_timeout_secs = 0;
        assert_eq!(config.worker_poll_timeout(), Duration::from_secs(1));
    }
}
