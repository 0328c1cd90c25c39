//! WebSocket fan-out to browser clients.

pub mod hub;
pub mod session;

use axum::Router;
use axum::routing::get;

pub use hub::{ClientId, HubHandle, Subscription, WsFrame};

/// `GET /ws` bound to `hub`.
pub fn routes(hub: HubHandle) -> Router {
    Router::new()
        .route("/ws", get(session::ws_handler))
        .with_state(hub)
}
