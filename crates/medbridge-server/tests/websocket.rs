//! Browser-facing `/ws` endpoint over a real socket.

mod common;

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use medbridge_server::ServiceRole;
use medbridge_server::build_app;
use medbridge_server::config::WebSocketConfig;
use medbridge_server::ws::{self, HubHandle};
use serde_json::{Value, json};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use common::{eventually, serve};

#[tokio::test]
async fn clients_receive_broadcasts_and_disconnect_cleanly() {
    let (hub, _) = HubHandle::spawn(WebSocketConfig::default());
    let server = serve(build_app(ws::routes(hub.clone()), ServiceRole::Hub, 1024)).await;

    let (mut first, _) = connect_async(server.ws_url()).await.unwrap();
    let (mut second, _) = connect_async(server.ws_url()).await.unwrap();
    let counted = &hub;
    assert!(eventually(move || async move { counted.client_count().await == 2 }).await);

    // Inbound text is ignored.
    first.send(Message::text("hello")).await.unwrap();
    hub.broadcast("patient_created", json!({"id": "7"})).await;

    for socket in [&mut first, &mut second] {
        let msg = tokio::time::timeout(Duration::from_secs(2), socket.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        let frame: Value = serde_json::from_str(msg.to_text().unwrap()).unwrap();
        assert_eq!(frame, json!({"type": "patient_created", "data": {"id": "7"}}));
    }

    first.close(None).await.unwrap();
    assert!(eventually(move || async move { counted.client_count().await == 1 }).await);

    drop(second);
    assert!(eventually(move || async move { counted.client_count().await == 0 }).await);
}

#[tokio::test]
async fn server_pings_idle_clients() {
    let (hub, _) = HubHandle::spawn(WebSocketConfig {
        ping_interval_secs: 1,
        ..Default::default()
    });
    let server = serve(build_app(ws::routes(hub), ServiceRole::Clinician, 1024)).await;
    let (mut socket, _) = connect_async(server.ws_url()).await.unwrap();

    let msg = tokio::time::timeout(Duration::from_secs(3), socket.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert!(matches!(msg, Message::Ping(_)));
}
