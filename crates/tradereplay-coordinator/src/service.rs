//! Coordinator service loop.
//!
//! The coordinator runs on a single task that drains a command queue, so
//! read-modify-write updates to the store never interleave.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use tradereplay_protocols::{ChannelError, MessageChannel, Request, Response, Sender, TabId};

use crate::coordinator::BackgroundCoordinator;

const COMMAND_QUEUE_SIZE: usize = 256;

/// A request waiting for its response.
struct Envelope {
    request: Request,
    sender: Sender,
    reply: oneshot::Sender<Response>,
}

enum Command {
    Message(Envelope),
    TabRemoved(TabId),
    TabUpdated {
        tab_id: TabId,
        url: String,
        complete: bool,
    },
}

/// Spawns the coordinator task.
pub struct CoordinatorService;

impl CoordinatorService {
    /// Start serving. The task exits once every handle has been dropped.
    pub fn spawn(coordinator: BackgroundCoordinator) -> (CoordinatorHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(COMMAND_QUEUE_SIZE);
        let task = tokio::spawn(Self::run(coordinator, rx));
        (CoordinatorHandle { tx }, task)
    }

    async fn run(coordinator: BackgroundCoordinator, mut rx: mpsc::Receiver<Command>) {
        info!("Background coordinator {} started", coordinator.id());

        while let Some(command) = rx.recv().await {
            match command {
                Command::Message(envelope) => {
                    let response = coordinator
                        .handle(envelope.request, &envelope.sender)
                        .await;
                    if envelope.reply.send(response).is_err() {
                        debug!("Caller stopped waiting for response");
                    }
                }
                Command::TabRemoved(tab_id) => coordinator.on_tab_removed(tab_id),
                Command::TabUpdated {
                    tab_id,
                    url,
                    complete,
                } => coordinator.on_tab_updated(tab_id, &url, complete).await,
            }
        }

        info!("Background coordinator {} stopped", coordinator.id());
    }
}

/// Cloneable entry point into the coordinator task.
#[derive(Clone)]
pub struct CoordinatorHandle {
    tx: mpsc::Sender<Command>,
}

impl CoordinatorHandle {
    /// Send one request on behalf of `sender` and wait for the response.
    pub async fn request(&self, request: Request, sender: Sender) -> Result<Response, ChannelError> {
        let (reply, rx) = oneshot::channel();
        let envelope = Envelope {
            request,
            sender,
            reply,
        };
        self.tx
            .send(Command::Message(envelope))
            .await
            .map_err(|_| ChannelError::Disconnected("background coordinator stopped".into()))?;
        rx.await
            .map_err(|_| ChannelError::Disconnected("background coordinator dropped the request".into()))
    }

    /// A channel bound to one sender context.
    pub fn port(&self, sender: Sender) -> Port {
        Port {
            handle: self.clone(),
            sender: Arc::new(sender),
        }
    }

    pub async fn tab_removed(&self, tab_id: TabId) {
        let _ = self.tx.send(Command::TabRemoved(tab_id)).await;
    }

    pub async fn tab_updated(&self, tab_id: TabId, url: impl Into<String>, complete: bool) {
        let command = Command::TabUpdated {
            tab_id,
            url: url.into(),
            complete,
        };
        let _ = self.tx.send(command).await;
    }
}

/// [`MessageChannel`] from one context (a tab or the popup) to the coordinator.
#[derive(Clone)]
pub struct Port {
    handle: CoordinatorHandle,
    sender: Arc<Sender>,
}

impl Port {
    pub fn sender(&self) -> &Sender {
        &self.sender
    }
}

#[async_trait]
impl MessageChannel for Port {
    async fn send(&self, request: Request) -> Result<Response, ChannelError> {
        self.handle
            .request(request, self.sender.as_ref().clone())
            .await
    }
}
