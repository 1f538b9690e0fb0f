//! WebSocket handler for live reload.
//!
//! Forwards every [`ReloadMessage`](super::ReloadMessage) to the connected
//! browser as a JSON text frame.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use super::{AppState, ReloadMessage};

/// Handle WebSocket upgrade for live reload.
pub(crate) async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>) {
    let mut receiver = state.reload.subscribe();
    let mut shutdown = state.shutdown.clone();
    if *shutdown.borrow() {
        return;
    }
    debug!("live-reload client connected");

    loop {
        tokio::select! {
            result = receiver.recv() => {
                let message = match result {
                    Ok(message) => message,
                    Err(RecvError::Closed) => break,
                    // Missed messages; a full reload covers whatever they were.
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "live-reload client lagged");
                        ReloadMessage::Reload
                    }
                };
                let text = match serde_json::to_string(&message) {
                    Ok(text) => text,
                    Err(err) => {
                        warn!(error = %err, "failed to encode reload message");
                        continue;
                    }
                };
                if socket.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            result = socket.recv() => {
                match result {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
            _ = shutdown.changed() => {
                let _ = socket.send(Message::Close(None)).await;
                break;
            }
        }
    }

    debug!("live-reload client disconnected");
}
