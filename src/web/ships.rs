//! Shipping endpoints: third parties pairing up two friends by email.

use axum::extract::{Path, Query, State};
use axum::response::Json;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};
use ts_rs::TS;
use uuid::Uuid;

use crate::data;
use crate::data::ships::{ACCEPTED_SHIP_SCORE, Ship, ShipStats};
use crate::matching::types::ConnectionType;
use crate::state::AppState;
use crate::web::error::{ApiError, ApiErrorCode, db_error};

#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateShipBody {
    pub shipper_id: Uuid,
    pub email1: String,
    pub email2: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub is_anonymous: bool,
}

/// `POST /api/ships`
///
/// Both emails must resolve to registered users; a pair with one unknown
/// address is a 404, not a silent partial ship.
pub async fn create_ship(
    State(state): State<AppState>,
    Json(body): Json<CreateShipBody>,
) -> Result<Json<Ship>, ApiError> {
    let email1 = body.email1.trim().to_lowercase();
    let email2 = body.email2.trim().to_lowercase();
    if email1 == email2 {
        return Err(ApiError::invalid_input("cannot ship a user with themselves"));
    }

    let (user1_id, user2_id) = data::profiles::resolve_pair_by_email(&state.db_pool, &email1, &email2)
        .await
        .map_err(|e| db_error("Resolve ship pair", e))?
        .ok_or_else(|| {
            ApiError::new(
                ApiErrorCode::NotFound,
                "one or both emails do not belong to registered users",
            )
        })?;

    if body.shipper_id == user1_id || body.shipper_id == user2_id {
        return Err(ApiError::invalid_input("you cannot ship yourself"));
    }

    let ship = data::ships::create(
        &state.db_pool,
        body.shipper_id,
        user1_id,
        user2_id,
        body.message.trim(),
        body.is_anonymous,
    )
    .await
    .map_err(|e| db_error("Create ship", e))?;

    notify_shipped_pair(&state, &ship).await;

    info!(ship_id = %ship.id, shipper_id = %body.shipper_id, "ship created");
    Ok(Json(ship))
}

async fn notify_shipped_pair(state: &AppState, ship: &Ship) {
    let shipper = if ship.is_anonymous {
        "Someone".to_owned()
    } else {
        data::profiles::display_name(&state.db_pool, ship.shipper_id)
            .await
            .ok()
            .flatten()
            .unwrap_or_else(|| "Someone".to_owned())
    };

    for (user_id, other_id) in [
        (ship.user1_id, ship.user2_id),
        (ship.user2_id, ship.user1_id),
    ] {
        let other = data::profiles::display_name(&state.db_pool, other_id)
            .await
            .ok()
            .flatten()
            .unwrap_or_else(|| "someone".to_owned());

        if let Err(e) = data::notifications::insert(
            &state.db_pool,
            user_id,
            "ship_received",
            "You've Been Shipped!",
            &format!("{shipper} thinks you and {other} would be great together"),
            json!({ "ship_id": ship.id }),
        )
        .await
        {
            warn!(error = ?e, "failed to insert ship notification");
        }
    }
}

#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RespondBody {
    pub accept: bool,
}

/// `POST /api/ships/{id}/respond`
///
/// Accepting a ship opens a pending friend connection between the pair,
/// seeded with a fixed score rather than a computed one.
pub async fn respond(
    State(state): State<AppState>,
    Path(ship_id): Path<Uuid>,
    Json(body): Json<RespondBody>,
) -> Result<Json<Ship>, ApiError> {
    let ship = data::ships::respond(&state.db_pool, ship_id, body.accept)
        .await
        .map_err(|e| db_error("Respond to ship", e))?;

    if body.accept {
        match data::connections::create_connection(
            &state.db_pool,
            ship.user1_id,
            ship.user2_id,
            ConnectionType::Friend,
            Some(ACCEPTED_SHIP_SCORE),
        )
        .await
        {
            Ok(_) => {}
            Err(e) if e.downcast_ref::<data::connections::ConnectionError>().is_some() => {
                info!(ship_id = %ship.id, "shipped pair already connected");
            }
            Err(e) => return Err(db_error("Create connection from ship", e)),
        }

        if !ship.is_anonymous {
            if let Err(e) = data::notifications::insert(
                &state.db_pool,
                ship.shipper_id,
                "ship_accepted",
                "Your Ship Sailed!",
                "A pair you shipped accepted the match",
                json!({ "ship_id": ship.id }),
            )
            .await
            {
                warn!(error = ?e, "failed to insert ship accepted notification");
            }
        }
    }

    Ok(Json(ship))
}

#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UserParams {
    pub user_id: Uuid,
}

/// `GET /api/ships/sent`
pub async fn list_sent(
    State(state): State<AppState>,
    Query(params): Query<UserParams>,
) -> Result<Json<Vec<Ship>>, ApiError> {
    let rows = data::ships::list_sent(&state.db_pool, params.user_id)
        .await
        .map_err(|e| db_error("List sent ships", e))?;
    Ok(Json(rows))
}

/// `GET /api/ships/received`
pub async fn list_received(
    State(state): State<AppState>,
    Query(params): Query<UserParams>,
) -> Result<Json<Vec<Ship>>, ApiError> {
    let rows = data::ships::list_received(&state.db_pool, params.user_id)
        .await
        .map_err(|e| db_error("List received ships", e))?;
    Ok(Json(rows))
}

/// `GET /api/ships/stats`
pub async fn get_stats(
    State(state): State<AppState>,
    Query(params): Query<UserParams>,
) -> Result<Json<ShipStats>, ApiError> {
    let stats = data::ships::stats(&state.db_pool, params.user_id)
        .await
        .map_err(|e| db_error("Load ship stats", e))?;
    Ok(Json(stats))
}
