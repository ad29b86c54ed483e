//! Chat handlers.
//!
//! Request/response side of the chat. Live delivery goes through the
//! WebSocket channel in `web::ws`.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use super::AppState;
use crate::application::ChatEnabledApplication;
use crate::chat::MessageView;
use crate::datetime::format_timestamp;
use crate::web::dto::{ApiResponse, ClearAllResponse, ClearForMeResponse, DeleteMessageResponse};
use crate::web::error::ApiError;
use crate::web::middleware::AuthUser;

/// GET /api/chat/enabled - Accepted applications the caller can chat on.
pub async fn chat_enabled_applications(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<ChatEnabledApplication>>>, ApiError> {
    let applications = state.chat.chat_enabled_applications(auth.user_id()).await?;
    Ok(Json(ApiResponse::new(applications)))
}

/// GET /api/chat/:application_id - History as the caller sees it.
pub async fn chat_history(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(application_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<MessageView>>>, ApiError> {
    let history = state.chat.history(auth.user_id(), application_id).await?;
    Ok(Json(ApiResponse::new(history)))
}

/// DELETE /api/chat/:application_id - Remove every message for everyone.
pub async fn clear_chat(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(application_id): Path<i64>,
) -> Result<Json<ApiResponse<ClearAllResponse>>, ApiError> {
    let removed = state
        .chat
        .clear_all(&auth.identity(), application_id)
        .await?;
    Ok(Json(ApiResponse::new(ClearAllResponse {
        application_id,
        removed,
    })))
}

/// POST /api/chat/:application_id/clear-for-me - Hide current history from the caller.
pub async fn clear_chat_for_me(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(application_id): Path<i64>,
) -> Result<Json<ApiResponse<ClearForMeResponse>>, ApiError> {
    let cleared_at = state
        .chat
        .clear_for_me(auth.user_id(), application_id)
        .await?;
    Ok(Json(ApiResponse::new(ClearForMeResponse {
        application_id,
        cleared_at: format_timestamp(&cleared_at),
    })))
}

/// DELETE /api/chat/message/:message_id - Delete a message for everyone.
pub async fn delete_message(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(message_id): Path<i64>,
) -> Result<Json<ApiResponse<DeleteMessageResponse>>, ApiError> {
    let outcome = state
        .chat
        .delete_message(&auth.identity(), message_id)
        .await?;
    Ok(Json(ApiResponse::new(DeleteMessageResponse::new(
        message_id, outcome,
    ))))
}
