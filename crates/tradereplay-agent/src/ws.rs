//! Message channel over the bridge WebSocket.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace, warn};

use tradereplay_protocols::{
    ChannelError, Hello, MessageChannel, Push, Request, RequestFrame, Response, ServerFrame,
    TabInfo,
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;
type Pending = Arc<Mutex<HashMap<u64, oneshot::Sender<Response>>>>;

/// Removes a pending entry if the caller stops waiting.
struct PendingGuard {
    pending: Pending,
    id: u64,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.pending.lock().remove(&self.id);
    }
}

/// A [`MessageChannel`] to a coordinator behind the bridge.
///
/// Replies are matched to requests by frame id. Pushes are delivered on the
/// receiver returned by [`connect`](Self::connect).
pub struct WsChannel {
    ws_tx: tokio::sync::Mutex<WsSink>,
    next_id: AtomicU64,
    pending: Pending,
    closed: Arc<AtomicBool>,
    recv_task: tokio::task::JoinHandle<()>,
}

impl WsChannel {
    /// Connect and introduce this context. `tab` is `None` for the popup.
    pub async fn connect(
        url: &str,
        tab: Option<TabInfo>,
    ) -> Result<(Self, mpsc::UnboundedReceiver<Push>), ChannelError> {
        let (ws_stream, _) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| ChannelError::Disconnected(format!("{}: {}", url, e)))?;
        let (mut ws_sink, ws_source) = ws_stream.split();

        let hello = serde_json::to_string(&Hello { tab })
            .map_err(|e| ChannelError::Protocol(e.to_string()))?;
        ws_sink
            .send(Message::Text(hello.into()))
            .await
            .map_err(|e| ChannelError::SendFailed(e.to_string()))?;

        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
        let closed = Arc::new(AtomicBool::new(false));
        let (push_tx, push_rx) = mpsc::unbounded_channel();

        let recv_task = {
            let pending = pending.clone();
            let closed = closed.clone();
            tokio::spawn(async move {
                Self::receive_loop(ws_source, pending.clone(), push_tx).await;
                closed.store(true, Ordering::SeqCst);
                // Dropping the senders wakes every waiter with an error.
                pending.lock().clear();
            })
        };

        debug!("Connected to bridge at {}", url);
        Ok((
            Self {
                ws_tx: tokio::sync::Mutex::new(ws_sink),
                next_id: AtomicU64::new(1),
                pending,
                closed,
                recv_task,
            },
            push_rx,
        ))
    }

    async fn receive_loop(
        mut ws_source: WsSource,
        pending: Pending,
        push_tx: mpsc::UnboundedSender<Push>,
    ) {
        while let Some(msg) = ws_source.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    trace!("Bridge recv: {}", text);
                    match serde_json::from_str::<ServerFrame>(&text) {
                        Ok(ServerFrame::Reply { id, response }) => {
                            let waiter = pending.lock().remove(&id);
                            match waiter {
                                Some(tx) => {
                                    let _ = tx.send(response);
                                }
                                None => debug!("Late reply for request {}", id),
                            }
                        }
                        Ok(ServerFrame::Push { push }) => {
                            let _ = push_tx.send(push);
                        }
                        Err(e) => warn!("Failed to parse bridge frame: {}", e),
                    }
                }
                Ok(Message::Close(_)) => {
                    debug!("Bridge closed the connection");
                    break;
                }
                Err(e) => {
                    warn!("Bridge connection error: {}", e);
                    break;
                }
                _ => {}
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessageChannel for WsChannel {
    async fn send(&self, request: Request) -> Result<Response, ChannelError> {
        if self.is_closed() {
            return Err(ChannelError::Disconnected("bridge connection closed".into()));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let json = serde_json::to_string(&RequestFrame { id, request })
            .map_err(|e| ChannelError::Protocol(e.to_string()))?;
        trace!("Bridge send: {}", json);

        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id, tx);
        let _guard = PendingGuard {
            pending: self.pending.clone(),
            id,
        };
        if self.is_closed() {
            return Err(ChannelError::Disconnected("bridge connection closed".into()));
        }

        {
            let mut ws = self.ws_tx.lock().await;
            ws.send(Message::Text(json.into()))
                .await
                .map_err(|e| ChannelError::SendFailed(e.to_string()))?;
        }

        rx.await
            .map_err(|_| ChannelError::Disconnected("bridge connection closed".into()))
    }
}

impl Drop for WsChannel {
    fn drop(&mut self) {
        self.recv_task.abort();
    }
}
