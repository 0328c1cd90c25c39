//! Single-task publish/subscribe hub for UI clients.
//!
//! The coordinator task owns the client set. Registration, removal,
//! broadcast and the client-count query all travel through one bounded
//! command queue, so they are applied in the order they were issued.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use axum::extract::ws::Utf8Bytes;
use medbridge_core::EventPublisher;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::config::WebSocketConfig;

pub type ClientId = u64;

/// Outbound frame: `{"type": ..., "data": ...}`.
#[derive(Debug, Clone, Serialize)]
pub struct WsFrame {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: Value,
}

enum HubCommand {
    Register {
        id: ClientId,
        sender: mpsc::Sender<Utf8Bytes>,
    },
    Unregister {
        id: ClientId,
    },
    Broadcast(WsFrame),
    Count(oneshot::Sender<usize>),
}

/// A registered client's end of its outbound queue.
pub struct Subscription {
    pub id: ClientId,
    pub receiver: mpsc::Receiver<Utf8Bytes>,
}

/// Cloneable handle to the coordinator task.
#[derive(Clone)]
pub struct HubHandle {
    commands: mpsc::Sender<HubCommand>,
    next_id: Arc<AtomicU64>,
    client_queue: usize,
    settings: Arc<WebSocketConfig>,
}

impl HubHandle {
    /// Start the coordinator task.
    pub fn spawn(settings: WebSocketConfig) -> (Self, JoinHandle<()>) {
        let (commands, receiver) = mpsc::channel(settings.command_queue);
        let task = tokio::spawn(run(receiver));
        let handle = Self {
            commands,
            next_id: Arc::new(AtomicU64::new(1)),
            client_queue: settings.client_queue,
            settings: Arc::new(settings),
        };
        (handle, task)
    }

    pub fn settings(&self) -> &WebSocketConfig {
        &self.settings
    }

    /// Register a new client. `None` once the coordinator has stopped.
    pub async fn register(&self) -> Option<Subscription> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::channel(self.client_queue);
        self.commands
            .send(HubCommand::Register { id, sender })
            .await
            .ok()?;
        Some(Subscription { id, receiver })
    }

    pub async fn unregister(&self, id: ClientId) {
        let _ = self.commands.send(HubCommand::Unregister { id }).await;
    }

    pub async fn broadcast(&self, event_type: &str, data: Value) {
        let frame = WsFrame {
            event_type: event_type.to_string(),
            data,
        };
        if self.commands.send(HubCommand::Broadcast(frame)).await.is_err() {
            tracing::warn!(event_type, "websocket hub stopped, event dropped");
        }
    }

    /// Number of registered clients, after every earlier command was applied.
    pub async fn client_count(&self) -> usize {
        let (tx, rx) = oneshot::channel();
        if self.commands.send(HubCommand::Count(tx)).await.is_err() {
            return 0;
        }
        rx.await.unwrap_or_default()
    }
}

#[async_trait]
impl EventPublisher for HubHandle {
    async fn publish(&self, event_type: &str, data: Value) {
        self.broadcast(event_type, data).await;
    }
}

async fn run(mut commands: mpsc::Receiver<HubCommand>) {
    let mut clients: HashMap<ClientId, mpsc::Sender<Utf8Bytes>> = HashMap::new();

    while let Some(command) = commands.recv().await {
        match command {
            HubCommand::Register { id, sender } => {
                clients.insert(id, sender);
                tracing::info!(client_id = id, total = clients.len(), "websocket client connected");
            }
            HubCommand::Unregister { id } => {
                if clients.remove(&id).is_some() {
                    tracing::info!(client_id = id, total = clients.len(), "websocket client disconnected");
                }
            }
            HubCommand::Broadcast(frame) => {
                let text = match serde_json::to_string(&frame) {
                    Ok(text) => Utf8Bytes::from(text),
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to encode websocket frame");
                        continue;
                    }
                };
                tracing::debug!(event_type = %frame.event_type, clients = clients.len(), "broadcasting");

                clients.retain(|id, sender| match sender.try_send(text.clone()) {
                    Ok(()) => true,
                    Err(TrySendError::Full(_)) => {
                        tracing::warn!(client_id = *id, "websocket client queue full, dropping client");
                        false
                    }
                    Err(TrySendError::Closed(_)) => false,
                });
            }
            HubCommand::Count(reply) => {
                let _ = reply.send(clients.len());
            }
        }
    }
    tracing::debug!("websocket hub stopped");
}
