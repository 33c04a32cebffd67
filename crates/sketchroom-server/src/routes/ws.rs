//! WebSocket sessions.
//!
//! The token is checked after the upgrade so a rejected client receives a
//! close frame with a specific code rather than an HTTP error. An accepted
//! connection then runs a `select!` loop over client frames and its
//! outbound queue until either side closes.

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use serde::Deserialize;
use sketchroom_core::protocol::ClientMessage;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::AuthError;
use crate::registry::ConnectionId;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WsParams {
    token: Option<String>,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsParams>,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| async move {
        match state.verifier.verify(params.token.as_deref()) {
            Ok(user_id) => run_session(socket, state, user_id).await,
            Err(e) => reject(socket, e).await,
        }
    })
}

async fn reject(mut socket: WebSocket, error: AuthError) {
    warn!(code = error.close_code(), error = %error, "Rejecting connection");
    let frame = CloseFrame {
        code: error.close_code(),
        reason: error.to_string().into(),
    };
    let _ = socket.send(Message::Close(Some(frame))).await;
}

async fn run_session(mut socket: WebSocket, state: AppState, user_id: String) {
    let conn: ConnectionId = Uuid::new_v4();
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<String>(state.config.peer_queue);
    info!(%conn, user = %user_id, "Connection opened");

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(Ok(msg)) = msg else { break };
                match msg {
                    Message::Text(text) => handle_frame(&state, conn, &outbound_tx, text.as_str()).await,
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Some(frame) = outbound_rx.recv() => {
                if socket.send(Message::Text(frame.into())).await.is_err() {
                    break;
                }
            }
        }
    }

    state.relay.disconnect(conn);
    info!(%conn, "Connection closed");
}

async fn handle_frame(
    state: &AppState,
    conn: ConnectionId,
    outbound: &mpsc::Sender<String>,
    text: &str,
) {
    match ClientMessage::from_json(text) {
        Ok(ClientMessage::JoinRoom { room_id }) => {
            state.relay.join(&room_id, conn, outbound.clone());
        }
        Ok(ClientMessage::Chat { room_id, message }) => {
            state.relay.chat(conn, &room_id, message).await;
        }
        Err(e) => warn!(%conn, error = %e, "Invalid message"),
    }
}
