//! WebSocket endpoint, one session per connection
//!
//! Outbound [`ServerMessage`]s and inbound [`ClientCall`]s travel as JSON text frames.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use web_notifications_protocol::{ClientCall, ServerMessage};

use super::ServerState;
use crate::core::error::Error;
use crate::core::sessions::Session;
use crate::notifications::WebNotifications;

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws_connection(socket, state))
}

async fn handle_ws_connection(socket: WebSocket, state: Arc<ServerState>) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    // Channel for messages to the client
    let (client_tx, mut client_rx) = mpsc::unbounded_channel::<ServerMessage>();
    let session = state.open_session(client_tx);
    let session_id = session.id();
    info!("Session {} connected", session_id);

    // Spawn writer task
    let writer = tokio::spawn(async move {
        while let Some(message) = client_rx.recv().await {
            let text = match serde_json::to_string(&message) {
                Ok(text) => text,
                Err(e) => {
                    warn!("Failed to encode message for session {}: {}", session_id, e);
                    continue;
                }
            };
            if ws_tx.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    // Read loop: client function calls
    while let Some(msg) = ws_rx.next().await {
        match msg {
            Ok(Message::Text(text)) => handle_client_text(&session, text.as_str()),
            Ok(Message::Close(_)) => break,
            Err(e) => {
                warn!("WS read error in session {}: {}", session_id, e);
                break;
            }
            _ => {} // Ignore binary/ping/pong
        }
    }

    writer.abort();
    state.close_session(&session);
    info!("Session {} disconnected", session_id);
}

/// Route one text frame from the client to the session's notification bridge
pub(crate) fn handle_client_text(session: &Session, text: &str) {
    let call: ClientCall = match serde_json::from_str(text).map_err(Error::from) {
        Ok(call) => call,
        Err(e) => {
            warn!("Session {}: invalid client call: {}", session.id(), e);
            return;
        }
    };

    // Calls can only refer to notifications shown through an attached bridge
    let bridge = match session.extension::<WebNotifications>() {
        Some(bridge) => bridge,
        None => {
            debug!("Session {}: {} without notifications attached", session.id(), call.function);
            return;
        }
    };

    let _guard = session.enter();
    if let Err(e) = bridge.handle_call(&call) {
        warn!("Session {}: {}", session.id(), e);
    }
}
