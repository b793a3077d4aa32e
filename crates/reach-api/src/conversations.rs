use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use reach_db::models::ConversationRow;
use reach_types::api::{
    Claims, ConversationResponse, CreateConversationRequest, DataResponse, MessageResponse,
    SendMessageRequest,
};
use reach_types::models::MESSAGE_MAX_LEN;

use crate::auth::AppState;
use crate::convert::{conversation_response, message_response};
use crate::error::{ApiError, blocking};

/// Find-or-create the 1:1 conversation between the caller and another user.
pub async fn create(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateConversationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.participant_id == claims.sub {
        return Err(ApiError::Validation("cannot start a conversation with yourself".into()));
    }

    let db = state.clone();
    let other = req.participant_id.to_string();
    blocking(move || db.db.get_user_by_id(&other))
        .await?
        .ok_or(ApiError::NotFound("user"))?;

    let new_id = Uuid::new_v4();
    let db = state.clone();
    let caller = claims.sub.to_string();
    let other = req.participant_id.to_string();
    let row = blocking(move || db.db.find_or_create_conversation(&new_id.to_string(), &caller, &other))
        .await?;

    Ok((StatusCode::CREATED, Json(conversation_response(row))))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let caller = claims.sub.to_string();
    let rows = blocking(move || db.db.list_conversations(&caller)).await?;
    let conversations: Vec<ConversationResponse> =
        rows.into_iter().map(conversation_response).collect();
    Ok(Json(DataResponse::new(conversations, "conversations fetched")))
}

#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Cursor-based pagination — pass the id of the oldest message from
    /// the previous page to fetch older messages.
    pub before: Option<String>,
}

fn default_limit() -> u32 {
    50
}

pub async fn send_message(
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let content_len = req.content.chars().count();
    if content_len == 0 || content_len > MESSAGE_MAX_LEN {
        return Err(ApiError::Validation(format!(
            "message content must be 1-{MESSAGE_MAX_LEN} characters"
        )));
    }

    require_participant(&state, conversation_id, &claims).await?;

    let message_id = Uuid::new_v4();
    let db = state.clone();
    let sender = claims.sub.to_string();
    let content = req.content.clone();
    blocking(move || {
        db.db
            .insert_message(&message_id.to_string(), &conversation_id.to_string(), &sender, &content)
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            id: message_id,
            conversation_id,
            sender_id: claims.sub,
            content: req.content,
            status: reach_types::models::MessageStatus::Delivered,
            created_at: chrono::Utc::now(),
        }),
    ))
}

pub async fn get_messages(
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
    Query(query): Query<MessageQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    require_participant(&state, conversation_id, &claims).await?;

    let db = state.clone();
    let limit = query.limit.min(200);
    let before = query.before;
    let page = blocking(move || {
        db.db
            .get_messages(&conversation_id.to_string(), limit, before.as_deref())
    })
    .await?;

    let messages: Vec<MessageResponse> = page.messages.into_iter().map(message_response).collect();
    Ok(Json(messages))
}

/// Mark the caller's incoming messages in this conversation as read.
pub async fn mark_read(
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    require_participant(&state, conversation_id, &claims).await?;

    let db = state.clone();
    let reader = claims.sub.to_string();
    let marked =
        blocking(move || db.db.mark_conversation_read(&conversation_id.to_string(), &reader))
            .await?;

    Ok(Json(json!({ "data": marked, "message": "messages marked read" })))
}

async fn require_participant(
    state: &AppState,
    conversation_id: Uuid,
    claims: &Claims,
) -> Result<ConversationRow, ApiError> {
    let db = state.clone();
    let row = blocking(move || db.db.get_conversation(&conversation_id.to_string()))
        .await?
        .ok_or(ApiError::NotFound("conversation"))?;

    let caller = claims.sub.to_string();
    if row.participant_a != caller && row.participant_b != caller {
        return Err(ApiError::Forbidden("not a participant in this conversation".into()));
    }
    Ok(row)
}
