//! Messaging endpoints: quota-gated, quality-gated sends plus the handoff
//! prompt once the in-app quota runs out.

use axum::extract::{Path, Query, State};
use axum::response::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};
use ts_rs::TS;
use uuid::Uuid;

use crate::data;
use crate::data::messages::{Message, MessageLimitInfo};
use crate::matching::quality::{MESSAGE_LIMIT, message_quality, passes_send_gate};
use crate::state::AppState;
use crate::web::error::{ApiError, ApiErrorCode, OptionNotFoundExt, db_error};

/// Platforms suggested once the in-app quota is exhausted.
const HANDOFF_PLATFORMS: &[&str] = &["Instagram", "WhatsApp", "Discord", "Phone"];

#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SendMessageBody {
    pub sender_id: Uuid,
    pub content: String,
}

#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SendMessageResponse {
    #[serde(flatten)]
    pub message: Message,
    pub quality_score: f64,
    pub remaining_messages: i32,
}

/// `POST /api/connections/{id}/messages`
///
/// A rejected message never consumes quota. Quality rejection is 422 so
/// clients can distinguish "write more" from the 409 quota wall.
pub async fn send_message(
    State(state): State<AppState>,
    Path(connection_id): Path<Uuid>,
    Json(body): Json<SendMessageBody>,
) -> Result<Json<SendMessageResponse>, ApiError> {
    let content = body.content.trim();
    if content.is_empty() {
        return Err(ApiError::invalid_input("message content is empty"));
    }

    let connection = data::connections::get_connection(&state.db_pool, connection_id)
        .await
        .map_err(|e| db_error("Load connection", e))?
        .or_not_found("Connection", connection_id)?;

    if connection.status != "accepted" {
        return Err(ApiError::invalid_input(
            "messages can only be sent on accepted connections",
        ));
    }

    let receiver_id = if connection.user1_id == body.sender_id {
        connection.user2_id
    } else if connection.user2_id == body.sender_id {
        connection.user1_id
    } else {
        return Err(ApiError::invalid_input(
            "sender is not part of this connection",
        ));
    };

    let count = data::messages::current_count(&state.db_pool, connection_id, body.sender_id)
        .await
        .map_err(|e| db_error("Load message count", e))?;
    if count >= MESSAGE_LIMIT {
        return Err(ApiError::new(
            ApiErrorCode::MessageLimitReached,
            format!(
                "you've used all {MESSAGE_LIMIT} messages for this connection. \
                 Time to take it off-platform!"
            ),
        ));
    }

    let quality = message_quality(content);
    if !passes_send_gate(content) {
        debug!(connection_id = %connection_id, quality, "message rejected below quality gate");
        return Err(ApiError::new(
            ApiErrorCode::LowQualityMessage,
            "put a bit more effort into your message. Try asking a question \
             or sharing something about yourself",
        ));
    }

    let message = data::messages::insert_message(
        &state.db_pool,
        connection_id,
        body.sender_id,
        receiver_id,
        content,
        count + 1,
    )
    .await
    .map_err(|e| db_error("Insert message", e))?;

    notify_message(&state, &message).await;

    Ok(Json(SendMessageResponse {
        quality_score: quality,
        remaining_messages: MessageLimitInfo::from_count(message.message_count).remaining_messages,
        message,
    }))
}

async fn notify_message(state: &AppState, message: &Message) {
    let name = data::profiles::display_name(&state.db_pool, message.sender_id)
        .await
        .ok()
        .flatten()
        .unwrap_or_else(|| "Someone".to_owned());

    if let Err(e) = data::notifications::insert(
        &state.db_pool,
        message.receiver_id,
        "new_message",
        "New Message",
        &format!("{name} sent you a message"),
        json!({ "connection_id": message.connection_id }),
    )
    .await
    {
        warn!(error = ?e, "failed to insert message notification");
    }
}

/// `GET /api/connections/{id}/messages`
pub async fn list_messages(
    State(state): State<AppState>,
    Path(connection_id): Path<Uuid>,
) -> Result<Json<Vec<Message>>, ApiError> {
    data::connections::get_connection(&state.db_pool, connection_id)
        .await
        .map_err(|e| db_error("Load connection", e))?
        .or_not_found("Connection", connection_id)?;

    let rows = data::messages::list(&state.db_pool, connection_id)
        .await
        .map_err(|e| db_error("List messages", e))?;
    Ok(Json(rows))
}

#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct MarkReadBody {
    pub user_id: Uuid,
}

/// `POST /api/connections/{id}/messages/read`
pub async fn mark_read(
    State(state): State<AppState>,
    Path(connection_id): Path<Uuid>,
    Json(body): Json<MarkReadBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let updated = data::messages::mark_read(&state.db_pool, connection_id, body.user_id)
        .await
        .map_err(|e| db_error("Mark messages read", e))?;
    Ok(Json(json!({ "markedRead": updated })))
}

#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LimitParams {
    pub user_id: Uuid,
}

#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct MessageLimitResponse {
    #[serde(flatten)]
    pub limit: MessageLimitInfo,
    /// Populated once the quota is spent; where to continue the conversation.
    pub handoff_platforms: Option<Vec<String>>,
}

/// `GET /api/connections/{id}/messages/limit`
pub async fn get_limit(
    State(state): State<AppState>,
    Path(connection_id): Path<Uuid>,
    Query(params): Query<LimitParams>,
) -> Result<Json<MessageLimitResponse>, ApiError> {
    let count = data::messages::current_count(&state.db_pool, connection_id, params.user_id)
        .await
        .map_err(|e| db_error("Load message count", e))?;
    let limit = MessageLimitInfo::from_count(count);
    let handoff_platforms = limit
        .limit_reached
        .then(|| HANDOFF_PLATFORMS.iter().map(|p| p.to_string()).collect());

    Ok(Json(MessageLimitResponse {
        limit,
        handoff_platforms,
    }))
}
