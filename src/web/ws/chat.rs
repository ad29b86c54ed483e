//! Chat WebSocket handler.
//!
//! The upgrade is unauthenticated. Each `join` and `send` frame carries its
//! own token and is admitted separately; refused frames are dropped without
//! a reply.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};

use crate::chat::{ChatService, ChatSession};
use crate::web::handlers::AppState;

use super::messages::{ClientMessage, ServerMessage};

/// GET /api/chat/ws
pub async fn chat_ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    let chat = state.chat.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, chat))
}

fn to_frame(msg: &ServerMessage) -> Option<Message> {
    match serde_json::to_string(msg) {
        Ok(json) => Some(Message::Text(json)),
        Err(e) => {
            tracing::warn!("Failed to serialize server frame: {}", e);
            None
        }
    }
}

/// Handle a WebSocket connection.
async fn handle_socket(socket: WebSocket, chat: ChatService) {
    let (session, mut events) = chat.open_session();
    let (mut ws_sender, mut ws_receiver) = socket.split();

    tracing::debug!(session_id = %session.id(), "WebSocket session started");

    loop {
        tokio::select! {
            incoming = ws_receiver.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        let reply = match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(msg) => handle_client_message(&chat, &session, msg).await,
                            Err(e) => {
                                tracing::debug!(session_id = %session.id(), "Ignoring malformed frame: {}", e);
                                None
                            }
                        };
                        if let Some(frame) = reply.as_ref().and_then(to_frame) {
                            if ws_sender.send(frame).await.is_err() {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = ws_sender.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::debug!(session_id = %session.id(), "WebSocket closed by client");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::debug!(session_id = %session.id(), "WebSocket error: {}", e);
                        break;
                    }
                }
            }

            Some(event) = events.recv() => {
                let Some(frame) = to_frame(&ServerMessage::from(event)) else {
                    continue;
                };
                if ws_sender.send(frame).await.is_err() {
                    break;
                }
            }
        }
    }

    chat.disconnect(&session).await;
    tracing::debug!(session_id = %session.id(), "WebSocket session ended");
}

/// Apply one client frame. Returns the direct reply, if any.
async fn handle_client_message(
    chat: &ChatService,
    session: &ChatSession,
    msg: ClientMessage,
) -> Option<ServerMessage> {
    match msg {
        ClientMessage::Join {
            token,
            application_id,
        } => {
            chat.join(session, token.as_deref(), application_id).await;
            None
        }
        ClientMessage::Send {
            token,
            application_id,
            text,
            reply_to,
        } => {
            chat.send(token.as_deref(), application_id, &text, reply_to)
                .await;
            None
        }
        ClientMessage::Leave { application_id } => {
            chat.leave(session, application_id).await;
            None
        }
        ClientMessage::Ping => Some(ServerMessage::Pong),
    }
}
