use catalogsearch_common::Result;
use catalogsearch_embed::EmbeddingProvider;
use catalogsearch_vector::{EmbeddingField, EmbeddingJob, EmbeddingUpdate, VectorStore};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::job::decode_job;
use crate::source::ListenSettings;

const STATS_LOG_INTERVAL: u64 = 10;

/// What happened to one job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    /// One write-back was issued
    Written { computed: usize, cleared: usize },
    /// No variant could be embedded; nothing was written
    NothingComputed,
    /// The write-back itself failed
    StoreFailed,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkerStats {
    pub processed: u64,
    pub failed: u64,
    pub skipped: u64,
    pub started_at: DateTime<Utc>,
}

impl Default for WorkerStats {
    fn default() -> Self {
        Self {
            processed: 0,
            failed: 0,
            skipped: 0,
            started_at: Utc::now(),
        }
    }
}

impl WorkerStats {
    pub fn total(&self) -> u64 {
        self.processed + self.failed + self.skipped
    }

    fn record(&mut self, outcome: JobOutcome) {
        match outcome {
            JobOutcome::Written { .. } => self.processed += 1,
            JobOutcome::NothingComputed => self.skipped += 1,
            JobOutcome::StoreFailed => self.failed += 1,
        }
    }

    pub fn log(&self) {
        let uptime = Utc::now().signed_duration_since(self.started_at);
        info!(
            "Worker stats - processed: {}, failed: {}, skipped: {} (running {}s)",
            self.processed,
            self.failed,
            self.skipped,
            uptime.num_seconds()
        );
    }
}

/// Keeps product embeddings in step with catalog edits
pub struct EmbeddingSyncWorker {
    provider: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    dim: usize,
    retry: ListenSettings,
    stats: WorkerStats,
}

impl EmbeddingSyncWorker {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, store: Arc<dyn VectorStore>, dim: usize) -> Self {
        Self {
            provider,
            store,
            dim,
            retry: ListenSettings::default(),
            stats: WorkerStats::default(),
        }
    }

    /// Back off transient write-back failures the same way lost
    /// notification connections are retried
    pub fn with_retry(mut self, settings: ListenSettings) -> Self {
        self.retry = settings;
        self
    }

    pub fn stats(&self) -> &WorkerStats {
        &self.stats
    }

    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    /// Decode a notification payload and process it. Undecodable payloads
    /// count as failures.
    pub async fn handle_payload(&mut self, payload: &str) -> Option<JobOutcome> {
        match decode_job(payload) {
            Ok(job) => Some(self.process_job(&job).await),
            Err(e) => {
                error!("Invalid embedding job payload: {}", e);
                self.stats.failed += 1;
                self.maybe_log_stats();
                None
            }
        }
    }

    /// Embed every obtainable variant of `job` and write them back at once
    ///
    /// A variant whose embedding fails keeps its stored value. A variant with
    /// empty source text is cleared, but only alongside at least one freshly
    /// computed vector.
    pub async fn process_job(&mut self, job: &EmbeddingJob) -> JobOutcome {
        let outcome = self.embed_and_write(job).await;
        self.stats.record(outcome);
        self.maybe_log_stats();
        outcome
    }

    async fn embed_and_write(&self, job: &EmbeddingJob) -> JobOutcome {
        info!(product_id = %job.id, "Processing embedding job");

        let mut update = EmbeddingUpdate::new(self.dim);
        let mut empty: Vec<EmbeddingField> = Vec::new();

        for (field, text) in job.variants() {
            if text.trim().is_empty() {
                empty.push(field);
                continue;
            }

            let embedded = match self.provider.embed(&text).await {
                Ok(vector) => update.set(field, vector),
                Err(e) => Err(e),
            };
            match embedded {
                Ok(()) => debug!(product_id = %job.id, "Generated {} embedding", field),
                Err(e) => warn!(
                    product_id = %job.id,
                    "Failed to generate {} embedding, keeping stored value: {}",
                    field,
                    e
                ),
            }
        }

        if !update.has_vectors() {
            warn!(product_id = %job.id, "No embeddings generated, skipping write-back");
            return JobOutcome::NothingComputed;
        }

        let computed = update.computed_fields().len();
        for field in &empty {
            update.clear(*field);
        }

        match self.write_with_retry(&job.id, &update).await {
            Ok(0) => {
                warn!(product_id = %job.id, "Product not found, no row updated");
                JobOutcome::Written { computed, cleared: empty.len() }
            }
            Ok(_) => {
                info!(
                    product_id = %job.id,
                    "Updated embeddings ({} computed, {} cleared)",
                    computed,
                    empty.len()
                );
                JobOutcome::Written { computed, cleared: empty.len() }
            }
            Err(e) => {
                error!(product_id = %job.id, "Failed to write embeddings: {}", e);
                JobOutcome::StoreFailed
            }
        }
    }

    async fn write_with_retry(&self, product_id: &str, update: &EmbeddingUpdate) -> Result<u64> {
        let mut attempt = 0;
        loop {
            match self.store.write_embeddings(product_id, update).await {
                Err(e) if e.is_transient() && attempt < self.retry.max_reconnect_attempts => {
                    attempt += 1;
                    let delay = self.retry.backoff(attempt);
                    warn!(
                        product_id = %product_id,
                        "Write-back failed, retrying in {:?} (attempt {}/{}): {}",
                        delay,
                        attempt,
                        self.retry.max_reconnect_attempts,
                        e
                    );
                    tokio::time::sleep(delay).await;
                }
                result => return result,
            }
        }
    }

    fn maybe_log_stats(&self) {
        let total = self.stats.total();
        if total > 0 && total % STATS_LOG_INTERVAL == 0 {
            self.stats.log();
        }
    }
}
