//! Peer matchmaking ("shipping"): a third party proposes a pairing between
//! two other users, who can accept or decline.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use ts_rs::TS;
use uuid::Uuid;

/// Compatibility score recorded on connections created from accepted ships.
/// A human vouched for the pair, which outranks most algorithmic scores.
pub const ACCEPTED_SHIP_SCORE: f32 = 0.8;

#[derive(Debug, thiserror::Error)]
pub enum ShipError {
    #[error("ship not found")]
    NoSuchShip,
    #[error("you have already shipped these users")]
    AlreadyShipped,
}

#[derive(Debug, Clone, Serialize, TS, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Ship {
    pub id: Uuid,
    pub shipper_id: Uuid,
    pub user1_id: Uuid,
    pub user2_id: Uuid,
    pub message: String,
    pub is_anonymous: bool,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

const SHIP_COLUMNS: &str =
    "id, shipper_id, user1_id, user2_id, message, is_anonymous, status, created_at, responded_at";

/// Create a pending ship. One shipper gets one attempt per pair, in either
/// orientation.
pub async fn create(
    pool: &PgPool,
    shipper_id: Uuid,
    user1_id: Uuid,
    user2_id: Uuid,
    message: &str,
    is_anonymous: bool,
) -> Result<Ship> {
    let existing: Option<Uuid> = sqlx::query_scalar(
        "SELECT id FROM ships \
         WHERE shipper_id = $1 \
           AND ((user1_id = $2 AND user2_id = $3) OR (user1_id = $3 AND user2_id = $2)) \
         LIMIT 1",
    )
    .bind(shipper_id)
    .bind(user1_id)
    .bind(user2_id)
    .fetch_optional(pool)
    .await
    .context("failed to check for existing ship")?;

    if existing.is_some() {
        return Err(ShipError::AlreadyShipped.into());
    }

    let sql = format!(
        "INSERT INTO ships (shipper_id, user1_id, user2_id, message, is_anonymous) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING {SHIP_COLUMNS}"
    );
    sqlx::query_as(&sql)
        .bind(shipper_id)
        .bind(user1_id)
        .bind(user2_id)
        .bind(message)
        .bind(is_anonymous)
        .fetch_one(pool)
        .await
        .context("failed to create ship")
}

/// Accept or decline a pending ship. Returns the updated row.
pub async fn respond(pool: &PgPool, ship_id: Uuid, accept: bool) -> Result<Ship> {
    let status = if accept { "accepted" } else { "declined" };
    let sql = format!(
        "UPDATE ships SET status = $2, responded_at = NOW() \
         WHERE id = $1 AND status = 'pending' \
         RETURNING {SHIP_COLUMNS}"
    );
    let row: Option<Ship> = sqlx::query_as(&sql)
        .bind(ship_id)
        .bind(status)
        .fetch_optional(pool)
        .await
        .context("failed to respond to ship")?;

    row.ok_or_else(|| ShipError::NoSuchShip.into())
}

/// Ships proposed by a user, newest first.
pub async fn list_sent(pool: &PgPool, shipper_id: Uuid) -> Result<Vec<Ship>> {
    let sql = format!(
        "SELECT {SHIP_COLUMNS} FROM ships WHERE shipper_id = $1 ORDER BY created_at DESC"
    );
    sqlx::query_as(&sql)
        .bind(shipper_id)
        .fetch_all(pool)
        .await
        .context("failed to list sent ships")
}

/// Ships naming a user as one half of the pair, newest first.
pub async fn list_received(pool: &PgPool, user_id: Uuid) -> Result<Vec<Ship>> {
    let sql = format!(
        "SELECT {SHIP_COLUMNS} FROM ships WHERE user1_id = $1 OR user2_id = $1 \
         ORDER BY created_at DESC"
    );
    sqlx::query_as(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await
        .context("failed to list received ships")
}

/// Sent/received status tallies.
#[derive(Debug, Clone, Serialize, TS, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ShipStatusCounts {
    pub total: i64,
    pub accepted: i64,
    pub pending: i64,
    pub declined: i64,
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ShipStats {
    pub sent: ShipStatusCounts,
    pub received: ShipStatusCounts,
}

pub async fn stats(pool: &PgPool, user_id: Uuid) -> Result<ShipStats> {
    let sent: ShipStatusCounts = sqlx::query_as(
        "SELECT COUNT(*) AS total, \
                COUNT(*) FILTER (WHERE status = 'accepted') AS accepted, \
                COUNT(*) FILTER (WHERE status = 'pending') AS pending, \
                COUNT(*) FILTER (WHERE status = 'declined') AS declined \
         FROM ships WHERE shipper_id = $1",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await
    .context("failed to load sent ship stats")?;

    let received: ShipStatusCounts = sqlx::query_as(
        "SELECT COUNT(*) AS total, \
                COUNT(*) FILTER (WHERE status = 'accepted') AS accepted, \
                COUNT(*) FILTER (WHERE status = 'pending') AS pending, \
                COUNT(*) FILTER (WHERE status = 'declined') AS declined \
         FROM ships WHERE user1_id = $1 OR user2_id = $1",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await
    .context("failed to load received ship stats")?;

    Ok(ShipStats { sent, received })
}
