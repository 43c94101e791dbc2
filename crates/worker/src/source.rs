use async_trait::async_trait;
use catalogsearch_common::{AppConfig, CatalogSearchError, Result};
use sqlx::postgres::{PgListener, PgPool};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::sync::EmbeddingSyncWorker;

const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Stream of raw notification payloads
#[async_trait]
pub trait JobSource: Send {
    /// Wait up to `timeout` for the next payload. `Ok(None)` means the wait
    /// timed out; `Err` means the connection is gone.
    async fn recv(&mut self, timeout: Duration) -> Result<Option<String>>;

    async fn reconnect(&mut self) -> Result<()>;
}

/// `LISTEN` on a Postgres notification channel
pub struct PgJobSource {
    pool: PgPool,
    channel: String,
    listener: PgListener,
}

impl PgJobSource {
    pub async fn connect(pool: PgPool, channel: &str) -> Result<Self> {
        let listener = Self::listen(&pool, channel).await?;
        info!("Listening for embedding jobs on channel '{}'", channel);
        Ok(Self {
            pool,
            channel: channel.to_string(),
            listener,
        })
    }

    async fn listen(pool: &PgPool, channel: &str) -> Result<PgListener> {
        let mut listener = PgListener::connect_with(pool).await?;
        listener.listen(channel).await?;
        Ok(listener)
    }
}

#[async_trait]
impl JobSource for PgJobSource {
    async fn recv(&mut self, timeout: Duration) -> Result<Option<String>> {
        match tokio::time::timeout(timeout, self.listener.try_recv()).await {
            Err(_) => Ok(None),
            Ok(Ok(Some(notification))) => Ok(Some(notification.payload().to_string())),
            Ok(Ok(None)) => Err(CatalogSearchError::store("notification connection closed")),
            Ok(Err(e)) => Err(e.into()),
        }
    }

    async fn reconnect(&mut self) -> Result<()> {
        self.listener = Self::listen(&self.pool, &self.channel).await?;
        Ok(())
    }
}

/// Wait and reconnect tuning for [`run`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenSettings {
    pub poll_timeout: Duration,
    pub max_reconnect_attempts: u32,
    pub reconnect_base_delay: Duration,
}

impl Default for ListenSettings {
    fn default() -> Self {
        Self {
            poll_timeout: Duration::from_secs(5),
            max_reconnect_attempts: 5,
            reconnect_base_delay: Duration::from_millis(500),
        }
    }
}

impl ListenSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            poll_timeout: config.worker_poll_timeout(),
            max_reconnect_attempts: config.worker_max_reconnect_attempts,
            reconnect_base_delay: Duration::from_millis(config.worker_reconnect_base_delay_ms),
        }
    }

    /// Delay before reconnect attempt `attempt` (1-based), doubling each time
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.reconnect_base_delay.saturating_mul(factor).min(MAX_BACKOFF)
    }
}

/// Consume jobs until `shutdown` fires
///
/// The wait is bounded so shutdown is noticed while idle. A lost connection
/// is re-established with exponential backoff; once the attempts run out the
/// loop gives up with an error.
pub async fn run<S>(
    worker: &mut EmbeddingSyncWorker,
    source: &mut S,
    settings: &ListenSettings,
    shutdown: &CancellationToken,
) -> Result<()>
where
    S: JobSource + ?Sized,
{
    info!("Embedding worker started");

    loop {
        let received = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            received = source.recv(settings.poll_timeout) => received,
        };

        match received {
            Ok(Some(payload)) => {
                worker.handle_payload(&payload).await;
            }
            Ok(None) => debug!("No notifications within {:?}", settings.poll_timeout),
            Err(e) => {
                warn!("Lost notification connection: {}", e);
                if let Err(e) = reconnect_with_backoff(source, settings, shutdown).await {
                    error!("{}", e);
                    worker.stats().log();
                    return Err(e);
                }
            }
        }
    }

    info!("Embedding worker stopped");
    worker.stats().log();
    Ok(())
}

async fn reconnect_with_backoff<S>(source: &mut S, settings: &ListenSettings, shutdown: &CancellationToken) -> Result<()>
where
    S: JobSource + ?Sized,
{
    for attempt in 1..=settings.max_reconnect_attempts {
        let delay = settings.backoff(attempt);
        info!(
            "Reconnecting in {:?} (attempt {}/{})",
            delay, attempt, settings.max_reconnect_attempts
        );

        tokio::select! {
            biased;
            _ = shutdown.cancelled() => return Ok(()),
            _ = tokio::time::sleep(delay) => {}
        }

        match source.reconnect().await {
            Ok(()) => {
                info!("Notification connection re-established");
                return Ok(());
            }
            Err(e) => warn!("Reconnect attempt {} failed: {}", attempt, e),
        }
    }

    Err(CatalogSearchError::store(format!(
        "Gave up reconnecting after {} attempts",
        settings.max_reconnect_attempts
    )))
}
