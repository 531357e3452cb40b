//! WebSocket connection handling.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures::stream::SplitStream;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use tradereplay_coordinator::CoordinatorHandle;
use tradereplay_protocols::{
    ChannelError, Hello, Push, RequestFrame, Response, Sender, ServerFrame, TabInfo,
};

use crate::error::BridgeError;
use crate::BridgeState;

/// One connected extension context.
pub struct Connection {
    pub id: String,
    /// The tab this context runs in; `None` for the popup.
    pub tab: Option<TabInfo>,
    tx: mpsc::UnboundedSender<String>,
}

impl Connection {
    pub fn new(id: impl Into<String>, tab: Option<TabInfo>, tx: mpsc::UnboundedSender<String>) -> Self {
        Self {
            id: id.into(),
            tab,
            tx,
        }
    }

    fn send_frame(&self, frame: &ServerFrame) -> Result<(), ChannelError> {
        let json = serde_json::to_string(frame).map_err(|e| ChannelError::Protocol(e.to_string()))?;
        self.tx
            .send(json)
            .map_err(|_| ChannelError::Disconnected(format!("connection {} closed", self.id)))
    }

    pub fn push(&self, push: Push) -> Result<(), ChannelError> {
        self.send_frame(&ServerFrame::Push { push })
    }

    pub fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }
}

async fn read_hello(ws_rx: &mut SplitStream<WebSocket>) -> Result<Hello, BridgeError> {
    while let Some(msg) = ws_rx.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                return serde_json::from_str(&text)
                    .map_err(|e| BridgeError::Protocol(format!("invalid hello: {}", e)));
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => return Err(BridgeError::Protocol(e.to_string())),
        }
    }
    Err(BridgeError::Protocol("closed before hello".into()))
}

/// Serve one socket: hello, then request frames until it closes.
///
/// Requests are forwarded one at a time, so a context's requests reach the
/// coordinator in the order it sent them.
pub(crate) async fn handle_socket(socket: WebSocket, state: Arc<BridgeState>, handle: CoordinatorHandle) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    let (mut ws_tx, mut ws_rx) = socket.split();

    let hello = match read_hello(&mut ws_rx).await {
        Ok(hello) => hello,
        Err(e) => {
            warn!("Dropping connection {}: {}", conn_id, e);
            return;
        }
    };

    let (tx, mut outbound_rx) = mpsc::unbounded_channel::<String>();
    let tab = hello.tab;
    let tab_id = tab.as_ref().map(|t| t.id);
    let sender = Sender { tab: tab.clone() };

    state
        .connections
        .insert(conn_id.clone(), Connection::new(conn_id.clone(), tab, tx.clone()));
    if let Some(id) = tab_id {
        if let Some(previous) = state.tabs.insert(id, conn_id.clone()) {
            debug!("Tab {} reconnected, replacing connection {}", id, previous);
        }
    }
    info!(
        "Bridge connection {} established ({})",
        conn_id,
        tab_id.map_or_else(|| "extension page".to_string(), |id| format!("tab {}", id))
    );

    loop {
        tokio::select! {
            Some(frame) = outbound_rx.recv() => {
                if let Err(e) = ws_tx.send(Message::Text(frame.into())).await {
                    warn!("Failed to send to {}: {}", conn_id, e);
                    break;
                }
            }

            result = ws_rx.next() => {
                match result {
                    Some(Ok(Message::Text(text))) => {
                        let reply = match serde_json::from_str::<RequestFrame>(&text) {
                            Ok(frame) => {
                                let response = handle
                                    .request(frame.request, sender.clone())
                                    .await
                                    .unwrap_or_else(|e| Response::failure(e.to_string()));
                                ServerFrame::Reply { id: frame.id, response }
                            }
                            Err(e) => {
                                warn!("Bad frame from {}: {}", conn_id, e);
                                continue;
                            }
                        };
                        match serde_json::to_string(&reply) {
                            Ok(json) => {
                                let _ = tx.send(json);
                            }
                            Err(e) => error!("Failed to encode reply: {}", e),
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        info!("Bridge connection closed: {}", conn_id);
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        error!("WebSocket error from {}: {}", conn_id, e);
                        break;
                    }
                }
            }
        }
    }

    state.connections.remove(&conn_id);
    if let Some(id) = tab_id {
        // Only forget the tab if a newer connection has not taken it over.
        let removed = state.tabs.remove_if(&id, |_, owner| *owner == conn_id).is_some();
        if removed {
            handle.tab_removed(id).await;
        }
    }
    debug!("Bridge connection removed: {}", conn_id);
}
