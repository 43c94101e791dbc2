pub mod backfill;
pub mod job;
pub mod source;
pub mod sync;

pub use backfill::{backfill, BackfillReport};
pub use job::decode_job;
pub use source::{run, JobSource, ListenSettings, PgJobSource};
pub use sync::{EmbeddingSyncWorker, JobOutcome, WorkerStats};
