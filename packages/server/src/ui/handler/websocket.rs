//! WebSocket connection handlers.
//!
//! 受信した JSON を `ClientMessage` として解釈し、対応するユースケースに振り分けます。
//! 送信者に起因するエラーはその接続にだけ `error` メッセージとして返します。

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::{
    domain::{ConnectionId, DisplayName, ErrorCode, RoomId, UserId, ValueObjectError},
    infrastructure::dto::websocket::ClientMessage,
    ui::state::AppState,
    usecase::{ProgressError, ProgressReport},
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Forward messages queued for this connection to its WebSocket sink.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (sender, mut receiver) = socket.split();
    let (tx, rx) = mpsc::unbounded_channel();

    let connection_id = match state.connect_client_usecase.execute(tx).await {
        Ok(id) => id,
        Err(e) => {
            tracing::error!("Failed to register connection: {}", e);
            return;
        }
    };

    let mut send_task = pusher_loop(rx, sender);

    let recv_state = state.clone();
    let recv_connection = connection_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!("WebSocket error on '{}': {}", recv_connection, e);
                    break;
                }
            };
            match msg {
                Message::Text(text) => {
                    handle_text(&recv_state, &recv_connection, text.as_str()).await;
                }
                Message::Close(_) => {
                    tracing::debug!("Connection '{}' requested close", recv_connection);
                    break;
                }
                _ => {}
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    state
        .disconnect_client_usecase
        .execute(&connection_id)
        .await;
}

async fn handle_text(state: &AppState, connection_id: &ConnectionId, text: &str) {
    let message = match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => message,
        Err(e) => {
            tracing::warn!("Unparseable message from '{}': {}", connection_id, e);
            reply_error(state, connection_id, ErrorCode::InvalidMessage, e.to_string()).await;
            return;
        }
    };

    match message {
        ClientMessage::JoinMatchmaking {
            user_id,
            display_name,
        } => {
            let parsed = UserId::new(user_id)
                .and_then(|user| DisplayName::new(display_name).map(|name| (user, name)));
            let (user_id, display_name) = match parsed {
                Ok(pair) => pair,
                Err(e) => return reject_invalid(state, connection_id, e).await,
            };
            if let Err(e) = state
                .join_matchmaking_usecase
                .execute(connection_id.clone(), user_id, display_name)
                .await
            {
                tracing::warn!("Matchmaking failed for '{}': {}", connection_id, e);
                reply_error(state, connection_id, e.code(), e.to_string()).await;
            }
        }
        ClientMessage::LeaveRoom { room_id } => {
            let room_id = match RoomId::new(room_id) {
                Ok(id) => id,
                Err(e) => return reject_invalid(state, connection_id, e).await,
            };
            if let Err(e) = state
                .leave_room_usecase
                .execute(connection_id, &room_id)
                .await
            {
                tracing::warn!("Leave failed for '{}': {}", connection_id, e);
                reply_error(state, connection_id, e.code(), e.to_string()).await;
            }
        }
        ClientMessage::TypingProgress {
            room_id,
            user_id,
            submitted_text,
            char_index,
        } => {
            let parsed = RoomId::new(room_id)
                .and_then(|room| UserId::new(user_id).map(|user| (room, user)));
            let (room_id, user_id) = match parsed {
                Ok(pair) => pair,
                Err(e) => return reject_invalid(state, connection_id, e).await,
            };
            let report = ProgressReport {
                room_id,
                user_id,
                submitted_text,
                char_index,
            };
            match state
                .report_progress_usecase
                .execute(connection_id, report)
                .await
            {
                Ok(()) | Err(ProgressError::Stale) => {}
                Err(e) => reply_error(state, connection_id, e.code(), e.to_string()).await,
            }
        }
    }
}

async fn reject_invalid(state: &AppState, connection_id: &ConnectionId, error: ValueObjectError) {
    tracing::warn!("Invalid field from '{}': {}", connection_id, error);
    reply_error(state, connection_id, ErrorCode::InvalidMessage, error.to_string()).await;
}

async fn reply_error(
    state: &AppState,
    connection_id: &ConnectionId,
    code: ErrorCode,
    message: String,
) {
    state
        .connect_client_usecase
        .send_error(connection_id, code, message)
        .await;
}
