use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use tokio::time::{MissedTickBehavior, interval};

use super::hub::HubHandle;

/// `GET /ws`
pub async fn ws_handler(ws: WebSocketUpgrade, State(hub): State<HubHandle>) -> Response {
    ws.on_upgrade(move |socket| serve_socket(socket, hub))
}

/// Forward hub frames to one client until either side goes away.
async fn serve_socket(socket: WebSocket, hub: HubHandle) {
    let Some(mut subscription) = hub.register().await else {
        return;
    };
    let client_id = subscription.id;
    let (mut sender, mut receiver) = socket.split();

    let period = hub.settings().ping_interval();
    let mut ping = interval(period);
    ping.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ping.tick().await;

    loop {
        tokio::select! {
            msg = receiver.next() => match msg {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(Message::Ping(data))) => {
                    if sender.send(Message::Pong(data)).await.is_err() {
                        break;
                    }
                }
                // Clients have nothing to say to the hub.
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!(client_id, error = %e, "websocket read error");
                    break;
                }
            },
            frame = subscription.receiver.recv() => match frame {
                Some(text) => {
                    if let Err(e) = sender.send(Message::Text(text)).await {
                        tracing::debug!(client_id, error = %e, "websocket write failed");
                        break;
                    }
                }
                // Dropped by the hub.
                None => break,
            },
            _ = ping.tick() => {
                if sender.send(Message::Ping(Bytes::new())).await.is_err() {
                    break;
                }
            }
        }
    }

    hub.unregister(client_id).await;
    let _ = sender.close().await;
}
