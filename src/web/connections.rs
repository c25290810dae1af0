//! Connection request endpoints.

use axum::extract::{Path, Query, State};
use axum::response::Json;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};
use ts_rs::TS;
use uuid::Uuid;

use crate::data;
use crate::data::connections::{Connection, ConnectionListItem};
use crate::matching::types::ConnectionType;
use crate::state::AppState;
use crate::web::error::{ApiError, OptionNotFoundExt, db_error};

#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateConnectionBody {
    pub user_id: Uuid,
    pub target_user_id: Uuid,
    #[serde(rename = "type")]
    pub connection_type: String,
    pub compatibility_score: Option<f32>,
}

/// `POST /api/connections`
pub async fn create_connection(
    State(state): State<AppState>,
    Json(body): Json<CreateConnectionBody>,
) -> Result<Json<Connection>, ApiError> {
    let connection_type = ConnectionType::parse(&body.connection_type).ok_or_else(|| {
        ApiError::invalid_input(format!(
            "invalid connection type '{}'. Valid: friend, date",
            body.connection_type
        ))
    })?;

    if body.user_id == body.target_user_id {
        return Err(ApiError::invalid_input("cannot connect with yourself"));
    }

    data::profiles::get_profile(&state.db_pool, body.target_user_id)
        .await
        .map_err(|e| db_error("Load target user", e))?
        .or_not_found("User", body.target_user_id)?;

    let connection = data::connections::create_connection(
        &state.db_pool,
        body.user_id,
        body.target_user_id,
        connection_type,
        body.compatibility_score,
    )
    .await
    .map_err(|e| db_error("Create connection", e))?;

    notify_request(&state, &connection).await;

    info!(
        connection_id = %connection.id,
        user_id = %body.user_id,
        target_user_id = %body.target_user_id,
        connection_type = connection_type.as_str(),
        "connection request created"
    );

    Ok(Json(connection))
}

async fn notify_request(state: &AppState, connection: &Connection) {
    let name = data::profiles::display_name(&state.db_pool, connection.user1_id)
        .await
        .ok()
        .flatten()
        .unwrap_or_else(|| "Someone".to_owned());

    if let Err(e) = data::notifications::insert(
        &state.db_pool,
        connection.user2_id,
        "connection_request",
        "New Connection Request",
        &format!("{name} wants to connect with you!"),
        json!({ "connection_id": connection.id }),
    )
    .await
    {
        warn!(error = ?e, "failed to insert connection request notification");
    }
}

/// `POST /api/connections/{id}/accept`
pub async fn accept(
    State(state): State<AppState>,
    Path(connection_id): Path<Uuid>,
) -> Result<Json<Connection>, ApiError> {
    respond(state, connection_id, true).await
}

/// `POST /api/connections/{id}/decline`
pub async fn decline(
    State(state): State<AppState>,
    Path(connection_id): Path<Uuid>,
) -> Result<Json<Connection>, ApiError> {
    respond(state, connection_id, false).await
}

async fn respond(
    state: AppState,
    connection_id: Uuid,
    accept: bool,
) -> Result<Json<Connection>, ApiError> {
    let connection = data::connections::respond(&state.db_pool, connection_id, accept)
        .await
        .map_err(|e| db_error("Respond to connection", e))?;

    if accept {
        let name = data::profiles::display_name(&state.db_pool, connection.user2_id)
            .await
            .ok()
            .flatten()
            .unwrap_or_else(|| "Someone".to_owned());

        if let Err(e) = data::notifications::insert(
            &state.db_pool,
            connection.user1_id,
            "connection_accepted",
            "Connection Accepted",
            &format!("{name} accepted your connection request!"),
            json!({ "connection_id": connection.id }),
        )
        .await
        {
            warn!(error = ?e, "failed to insert connection accepted notification");
        }
    }

    Ok(Json(connection))
}

#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UserParams {
    pub user_id: Uuid,
}

/// `GET /api/connections`
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<UserParams>,
) -> Result<Json<Vec<ConnectionListItem>>, ApiError> {
    let rows = data::connections::list_for_user(&state.db_pool, params.user_id)
        .await
        .map_err(|e| db_error("List connections", e))?;
    Ok(Json(rows))
}

#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BlockBody {
    pub user_id: Uuid,
}

/// `POST /api/users/{id}/block`
///
/// Blocking is silent: the blocked user gets no notification and simply stops
/// appearing in the blocker's candidate pools.
pub async fn block(
    State(state): State<AppState>,
    Path(blocked_user_id): Path<Uuid>,
    Json(body): Json<BlockBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if body.user_id == blocked_user_id {
        return Err(ApiError::invalid_input("cannot block yourself"));
    }

    data::connections::block_user(&state.db_pool, body.user_id, blocked_user_id)
        .await
        .map_err(|e| db_error("Block user", e))?;

    info!(user_id = %body.user_id, blocked_user_id = %blocked_user_id, "user blocked");
    Ok(Json(json!({ "blocked": true })))
}
