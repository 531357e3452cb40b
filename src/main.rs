//! TradeReplay - trade capture and review
//!
//! Main entry point for the coordinator server and the popup/review CLI.

mod cli;
mod cmd_popup;
mod cmd_review;
mod cmd_serve;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use tradereplay_backend::BackendClient;
use tradereplay_config::{Config, ConfigLoader, ConfigValidator};
use tradereplay_store::{FileStore, SESSION_FILE};

use crate::cli::{Cli, Commands};

/// Initialize tracing with console and optional file output.
///
/// Log files are written to `<data_dir>/logs/` with daily rotation.
fn init_tracing(config: &Config) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let file_layer = if config.logging.file {
        let log_dir = config.storage.data_dir.join("logs");
        std::fs::create_dir_all(&log_dir)
            .with_context(|| format!("creating {}", log_dir.display()))?;

        let file_appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix("tradereplay")
            .filename_suffix("log")
            .max_log_files(14)
            .build(&log_dir)?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        // The guard flushes on drop, so it lives as long as the process.
        static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
            std::sync::OnceLock::new();
        let _ = GUARD.set(guard);

        Some(fmt::layer().with_writer(non_blocking).with_ansi(false).boxed())
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => ConfigLoader::load(path)?,
        None => ConfigLoader::load_or_default(&ConfigLoader::default_path())?,
    };
    Ok(config)
}

/// The coordinator's local store.
async fn open_store(config: &Config) -> anyhow::Result<Arc<FileStore>> {
    let store = FileStore::open(&config.storage.data_dir)
        .await
        .with_context(|| format!("opening store in {}", config.storage.data_dir.display()))?;
    Ok(Arc::new(store))
}

/// Backend session store. Separate from the coordinator's store, which a
/// running `serve` owns.
pub(crate) async fn open_session_store(config: &Config) -> anyhow::Result<Arc<FileStore>> {
    let store = FileStore::open_file(&config.storage.data_dir, SESSION_FILE)
        .await
        .with_context(|| format!("opening session in {}", config.storage.data_dir.display()))?;
    Ok(Arc::new(store))
}

/// Backend client with any stored session restored.
pub(crate) async fn backend_client(config: &Config) -> anyhow::Result<BackendClient> {
    if !config.backend.is_configured() {
        anyhow::bail!("backend.base_url is not configured");
    }
    let store = open_session_store(config).await?;
    let client = BackendClient::new(&config.backend, store)?;
    if let Err(e) = client.load_session().await {
        warn!("Ignoring stored session: {}", e);
    }
    Ok(client)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    init_tracing(&config)?;

    let validation = ConfigValidator::validate(&config);
    for warning in &validation.warnings {
        warn!("Config: {}", warning);
    }
    if !validation.is_valid() {
        for error in &validation.errors {
            tracing::error!("Config: {}", error);
        }
        anyhow::bail!("invalid configuration");
    }

    match cli.command {
        None => cmd_serve::run(&config, None, None).await,
        Some(Commands::Serve { host, port }) => cmd_serve::run(&config, host, port).await,
        Some(Commands::Popup { url, action }) => {
            cmd_popup::handle_popup_command(&config, url, action).await
        }
        Some(Commands::Review { action }) => cmd_review::handle_review_command(&config, action).await,
        Some(Commands::Login { email, password }) => {
            let client = backend_client(&config).await?;
            let session = client.sign_in(&email, &password).await?;
            info!("Signed in as {}", session.user_id);
            println!("Signed in as {}", session.email.as_deref().unwrap_or(&email));
            Ok(())
        }
        Some(Commands::Logout) => {
            let client = backend_client(&config).await?;
            client.sign_out().await?;
            println!("Signed out");
            Ok(())
        }
    }
}
