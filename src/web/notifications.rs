//! Notification read endpoints.

use axum::extract::{Path, Query, State};
use axum::response::Json;
use serde::Deserialize;
use serde_json::json;
use ts_rs::TS;
use uuid::Uuid;

use crate::data;
use crate::data::notifications::Notification;
use crate::state::AppState;
use crate::web::error::{ApiError, db_error};

#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ListParams {
    pub user_id: Uuid,
    pub limit: Option<i64>,
}

/// `GET /api/notifications`
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Notification>>, ApiError> {
    let limit = params.limit.unwrap_or(50).clamp(1, 200);
    let rows = data::notifications::list(&state.db_pool, params.user_id, limit)
        .await
        .map_err(|e| db_error("List notifications", e))?;
    Ok(Json(rows))
}

/// `POST /api/notifications/{id}/read`
pub async fn mark_read(
    State(state): State<AppState>,
    Path(notification_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let updated = data::notifications::mark_read(&state.db_pool, notification_id)
        .await
        .map_err(|e| db_error("Mark notification read", e))?;
    if !updated {
        return Err(ApiError::not_found("Notification", notification_id));
    }
    Ok(Json(json!({ "read": true })))
}
