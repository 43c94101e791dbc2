use catalogsearch_common::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::sync::{EmbeddingSyncWorker, JobOutcome};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackfillReport {
    pub scanned: u64,
    pub written: u64,
    pub failed: u64,
    pub cancelled: bool,
}

/// Embed every product that has no combined vector yet
///
/// Pages through pending products by id, so a product that keeps failing is
/// visited once per run rather than blocking the pages behind it.
pub async fn backfill(
    worker: &mut EmbeddingSyncWorker,
    batch_size: usize,
    show_progress: bool,
    shutdown: &CancellationToken,
) -> Result<BackfillReport> {
    let batch_size = batch_size.max(1);
    let store = worker.store().clone();
    let mut report = BackfillReport::default();
    let mut after_id: Option<String> = None;

    let pb = if show_progress {
        ProgressBar::new_spinner()
    } else {
        ProgressBar::hidden()
    };
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner} [{elapsed_precise}] {pos} products {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message("embedding");

    info!("Backfilling embeddings in batches of {}", batch_size);

    'pages: loop {
        let jobs = store.pending_jobs(after_id.as_deref(), batch_size).await?;
        let Some(last) = jobs.last() else {
            break;
        };
        after_id = Some(last.id.clone());

        for job in &jobs {
            if shutdown.is_cancelled() {
                report.cancelled = true;
                break 'pages;
            }

            report.scanned += 1;
            match worker.process_job(job).await {
                JobOutcome::Written { .. } => report.written += 1,
                JobOutcome::NothingComputed | JobOutcome::StoreFailed => report.failed += 1,
            }
            pb.inc(1);
        }

        if jobs.len() < batch_size {
            break;
        }
    }

    pb.finish_with_message(if report.cancelled { "cancelled" } else { "done" });
    info!(
        "Backfill {}: {} scanned, {} written, {} failed",
        if report.cancelled { "cancelled" } else { "complete" },
        report.scanned,
        report.written,
        report.failed
    );
    Ok(report)
}
