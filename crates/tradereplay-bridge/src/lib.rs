//! # Tradereplay Bridge
//!
//! Out-of-process extension contexts (content agents and the popup) reach
//! the background coordinator over a WebSocket at `/ws`. The bridge keeps
//! one connection per context and implements
//! [`BrowserHost`](tradereplay_protocols::BrowserHost) on top of them, so
//! coordinator pushes are delivered over the same sockets.
//!
//! ## Usage
//!
//! ```ignore
//! let bridge = Bridge::new();
//! let coordinator = BackgroundCoordinator::new(store, bridge.host(), config);
//! let (handle, _task) = CoordinatorService::spawn(coordinator);
//! let listener = Bridge::bind("127.0.0.1:8787").await?;
//! bridge.serve(listener, handle, shutdown).await?;
//! ```

mod connection;
mod error;
mod host;
mod server;

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use tradereplay_coordinator::CoordinatorHandle;
use tradereplay_protocols::TabId;

pub use connection::Connection;
pub use error::BridgeError;
pub use host::WsHost;
pub use server::create_router;

/// Connection bookkeeping shared by the socket handlers and [`WsHost`].
#[derive(Default)]
pub struct BridgeState {
    /// Open connections by connection id.
    pub connections: DashMap<String, Connection>,
    /// Which connection hosts the content agent of a tab.
    pub tabs: DashMap<TabId, String>,
    /// Last badge text set by the coordinator.
    pub badge: Mutex<String>,
}

impl BridgeState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids of tabs with a live connection, ascending.
    pub fn tab_ids(&self) -> Vec<TabId> {
        let mut ids: Vec<TabId> = self.tabs.iter().map(|e| *e.key()).collect();
        ids.sort_unstable();
        ids
    }
}

/// The bridge server.
#[derive(Clone, Default)]
pub struct Bridge {
    state: Arc<BridgeState>,
}

impl Bridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> Arc<BridgeState> {
        self.state.clone()
    }

    /// Host capabilities backed by this bridge's connections.
    pub fn host(&self) -> Arc<WsHost> {
        Arc::new(WsHost::new(self.state.clone()))
    }

    pub fn connection_count(&self) -> usize {
        self.state.connections.len()
    }

    pub async fn bind(addr: &str) -> Result<TcpListener, BridgeError> {
        let addr: std::net::SocketAddr = addr
            .parse()
            .map_err(|e| BridgeError::Bind(format!("Invalid address '{}': {}", addr, e)))?;
        TcpListener::bind(addr)
            .await
            .map_err(|e| BridgeError::Bind(format!("Failed to bind {}: {}", addr, e)))
    }

    /// Serve until `shutdown` fires.
    pub async fn serve(
        &self,
        listener: TcpListener,
        handle: CoordinatorHandle,
        shutdown: CancellationToken,
    ) -> Result<(), BridgeError> {
        let router = create_router(self.state.clone(), handle);
        if let Ok(addr) = listener.local_addr() {
            info!("Bridge listening on ws://{}/ws", addr);
        }
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown.cancelled_owned())
            .await
            .map_err(|e| BridgeError::Serve(e.to_string()))
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
