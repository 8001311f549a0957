//! WebSocket observer sessions.

use crate::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        Extension, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;

/// Handler for `GET /ws`.
///
/// Upgrades the connection and attaches the client as a tracker observer.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Extension(state): Extension<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Forwards tracker events to the socket as JSON text frames.
///
/// The subscription queue is bounded by the tracker; a client that cannot
/// keep up loses events there (logged by the hub) instead of growing memory
/// here. Inbound frames are drained and ignored: observers are read-only,
/// ingestion goes through `POST /api/observe`.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let subscription = state.tracker.attach();
    let observer_id = subscription.id();
    let mut events = subscription.into_receiver();
    tracing::debug!(observer = %observer_id, "websocket observer connected");

    let send_task = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let frame = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!(error = %e, "failed to serialize tracker event");
                    continue;
                }
            };
            if sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(frame)) = receiver.next().await {
        if let Message::Close(_) = frame {
            break;
        }
    }

    state.tracker.detach(observer_id);
    send_task.abort();
    tracing::debug!(observer = %observer_id, "websocket observer disconnected");
}
