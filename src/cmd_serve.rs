//! `serve`: the background coordinator behind the WebSocket bridge.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use tradereplay_backend::BackendClient;
use tradereplay_bridge::Bridge;
use tradereplay_config::Config;
use tradereplay_coordinator::{BackgroundCoordinator, CoordinatorService};
use tradereplay_protocols::{BackendError, TradeRecord, TradeSink};
use tradereplay_store::FileStore;

/// Remote sync that follows `tradereplay login`/`logout` run while serving.
///
/// The session file is written by the CLI process, so it is re-read
/// whenever no session is loaded.
struct SessionSink {
    client: BackendClient,
    sessions: Arc<FileStore>,
}

impl SessionSink {
    async fn refresh_session(&self) -> Result<bool, BackendError> {
        if self.client.session().is_some() {
            return Ok(true);
        }
        self.sessions.reload().await?;
        Ok(self.client.load_session().await?.is_some())
    }
}

#[async_trait]
impl TradeSink for SessionSink {
    async fn push_trade(&self, trade: &TradeRecord) -> Result<(), BackendError> {
        if !self.refresh_session().await? {
            return Err(BackendError::NotAuthenticated);
        }
        match self.client.push_trade(trade).await {
            Err(BackendError::Http { status: 401, .. }) => {
                // Signed out or rotated elsewhere; reload before the next trade.
                self.client.forget_session();
                Err(BackendError::NotAuthenticated)
            }
            other => other,
        }
    }
}

/// Run until Ctrl-C.
pub(crate) async fn run(
    config: &Config,
    host: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    info!("Starting TradeReplay v{}", env!("CARGO_PKG_VERSION"));
    let store = crate::open_store(config).await?;
    info!("Local store: {}", store.path().display());

    let bridge = Bridge::new();
    let mut coordinator =
        BackgroundCoordinator::new(store.clone(), bridge.host(), config.coordinator.clone());

    if config.backend.is_configured() {
        let sessions = crate::open_session_store(config).await?;
        let client = BackendClient::new(&config.backend, sessions.clone())?;
        let sink = SessionSink { client, sessions };
        match sink.refresh_session().await {
            Ok(true) => info!("Syncing trades to {}", sink.client.base_url()),
            Ok(false) => warn!("Backend configured but not signed in; sync starts after `tradereplay login`"),
            Err(e) => warn!("Failed to load backend session: {}", e),
        }
        coordinator = coordinator.with_sink(Arc::new(sink));
    }

    info!("Coordinator {} ready", coordinator.id());
    let (handle, service) = CoordinatorService::spawn(coordinator);

    let addr = format!(
        "{}:{}",
        host.as_deref().unwrap_or(&config.server.host),
        port.unwrap_or(config.server.port)
    );
    let listener = Bridge::bind(&addr).await?;

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Received Ctrl+C, shutting down...");
            }
            shutdown.cancel();
        });
    }

    bridge
        .serve(listener, handle, shutdown)
        .await
        .context("bridge server failed")?;

    // Bridge sockets may still hold coordinator handles.
    service.abort();
    info!("TradeReplay stopped");
    Ok(())
}
