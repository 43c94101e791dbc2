use anyhow::{Context, Result};
use catalogsearch_common::{logger, AppConfig};
use catalogsearch_embed::{EmbeddingProvider, HttpEmbeddingClient};
use catalogsearch_vector::PgVectorStore;
use catalogsearch_worker::{EmbeddingSyncWorker, ListenSettings, PgJobSource};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Find project root by looking for .git directory
fn find_project_root() -> Option<PathBuf> {
    let mut current_dir = std::env::current_dir().ok()?;

    loop {
        if current_dir.join(".git").exists() {
            return Some(current_dir);
        }

        if !current_dir.pop() {
            break;
        }
    }

    None
}

/// Load .env file from project root
fn load_dotenv_from_project_root() {
    match find_project_root().map(|root| root.join(".env")) {
        Some(env_path) if env_path.exists() => {
            dotenv::from_path(&env_path).ok();
        }
        _ => {
            dotenv::dotenv().ok();
        }
    }
}

#[derive(Parser)]
#[command(name = "catalogsearch")]
#[command(about = "Catalog semantic search - embedding sync worker and search API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the search HTTP server
    Serve {
        /// Host to bind to
        #[arg(long, env = "SERVER_HOST")]
        host: Option<String>,

        /// Port to bind to
        #[arg(long, env = "SERVER_PORT")]
        port: Option<u16>,
    },

    /// Listen for change notifications and keep embeddings in sync
    Worker,

    /// Embed every product that has no vectors yet, then exit
    Backfill {
        /// Products fetched per page
        #[arg(long, default_value_t = 100)]
        batch_size: usize,

        /// Hide the progress bar
        #[arg(long)]
        no_progress: bool,
    },
}

/// Cancel `token` on Ctrl-C
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received interrupt signal, shutting down...");
            token.cancel();
        }
    });
}

/// Embedding client and eagerly connected store for the worker commands
async fn worker_parts(config: &AppConfig) -> Result<(EmbeddingSyncWorker, PgVectorStore)> {
    let provider = HttpEmbeddingClient::from_config(config)?.with_retries(config.embedding_max_retries);
    match provider.health().await {
        Ok(health) => tracing::info!("Embedding service: {} ({:?})", health.status, health.model),
        Err(e) => tracing::warn!("Embedding service not reachable yet: {}", e),
    }

    let store = PgVectorStore::connect(config)
        .await
        .context("The worker needs DATABASE_URL pointing at a reachable database")?;

    let dim = provider.dimensions();
    let worker = EmbeddingSyncWorker::new(Arc::new(provider), Arc::new(store.clone()), dim)
        .with_retry(ListenSettings::from_config(config));
    Ok((worker, store))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load environment variables from .env at project root
    load_dotenv_from_project_root();

    match cli.command.unwrap_or(Commands::Serve { host: None, port: None }) {
        Commands::Serve { host, port } => {
            let mut config = AppConfig::from_env()?;
            if let Some(host) = host {
                config.server_host = host;
            }
            if let Some(port) = port {
                config.server_port = port;
            }
            config.validate()?;

            let log_file = logger::setup_logging(&config)?;
            tracing::info!("Catalog search starting...");
            tracing::info!("  Bind: {}", config.server_bind_address());
            tracing::info!(
                "  Store: {}",
                if config.store_configured() { "configured" } else { "disabled (lexical fallback only)" }
            );
            tracing::info!("  Embedding service: {}", config.embedding_service_url);
            tracing::info!("  Log file: {}", log_file.display());

            catalogsearch_server::start_server(config).await?;
        }
        Commands::Worker => {
            let config = AppConfig::from_env()?;
            logger::setup_logging(&config)?;
            tracing::info!("Starting embedding worker on channel '{}'", config.notify_channel);

            let (mut worker, store) = worker_parts(&config).await?;
            let mut source = PgJobSource::connect(store.pool().clone(), &config.notify_channel).await?;

            let shutdown = CancellationToken::new();
            cancel_on_ctrl_c(shutdown.clone());

            catalogsearch_worker::run(&mut worker, &mut source, &ListenSettings::from_config(&config), &shutdown)
                .await?;
        }
        Commands::Backfill { batch_size, no_progress } => {
            let config = AppConfig::from_env()?;
            logger::setup_console_logging(&config.log_level)?;

            let (mut worker, _store) = worker_parts(&config).await?;
            let shutdown = CancellationToken::new();
            cancel_on_ctrl_c(shutdown.clone());

            let report = catalogsearch_worker::backfill(&mut worker, batch_size, !no_progress, &shutdown).await?;
            println!(
                "Backfill {}: {} scanned, {} written, {} failed",
                if report.cancelled { "cancelled" } else { "complete" },
                report.scanned,
                report.written,
                report.failed
            );
        }
    }

    Ok(())
}
