//! Connection lifecycle: requests, accept/decline, blocking, and the
//! exclusion set the matcher uses to avoid re-surfacing known pairs.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use std::collections::HashSet;
use ts_rs::TS;
use uuid::Uuid;

use crate::matching::types::ConnectionType;

/// Domain errors for connection operations. The web layer downcasts
/// `anyhow::Error` to this type to pick HTTP status codes.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("connection not found")]
    NoSuchConnection,
    #[error("a connection between these users already exists")]
    AlreadyExists,
}

#[derive(Debug, Clone, Serialize, TS, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Connection {
    pub id: Uuid,
    pub user1_id: Uuid,
    pub user2_id: Uuid,
    pub connection_type: String,
    pub status: String,
    pub compatibility_score: Option<f32>,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

/// A connection annotated with the other party, for list views.
#[derive(Debug, Clone, Serialize, TS, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ConnectionListItem {
    pub id: Uuid,
    pub connection_type: String,
    pub status: String,
    pub compatibility_score: Option<f32>,
    pub created_at: DateTime<Utc>,
    pub other_user_id: Uuid,
    pub other_display_name: String,
}

/// All user ids connected, pending, or blocked with the requester in either
/// direction. Every status excludes: a declined pair should not resurface
/// either.
pub async fn exclusion_ids(pool: &PgPool, user_id: Uuid) -> Result<HashSet<Uuid>> {
    let rows: Vec<(Uuid, Uuid)> = sqlx::query_as(
        "SELECT user1_id, user2_id FROM connections WHERE user1_id = $1 OR user2_id = $1",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("failed to load connection exclusions")?;

    Ok(rows
        .into_iter()
        .map(|(u1, u2)| if u1 == user_id { u2 } else { u1 })
        .collect())
}

/// Create a pending connection request. Fails with
/// [`ConnectionError::AlreadyExists`] when any row already links the pair.
pub async fn create_connection(
    pool: &PgPool,
    user1_id: Uuid,
    user2_id: Uuid,
    connection_type: ConnectionType,
    compatibility_score: Option<f32>,
) -> Result<Connection> {
    let existing: Option<Uuid> = sqlx::query_scalar(
        "SELECT id FROM connections \
         WHERE (user1_id = $1 AND user2_id = $2) OR (user1_id = $2 AND user2_id = $1) \
         LIMIT 1",
    )
    .bind(user1_id)
    .bind(user2_id)
    .fetch_optional(pool)
    .await
    .context("failed to check for existing connection")?;

    if existing.is_some() {
        return Err(ConnectionError::AlreadyExists.into());
    }

    sqlx::query_as(
        "INSERT INTO connections (user1_id, user2_id, connection_type, compatibility_score) \
         VALUES ($1, $2, $3, $4) \
         RETURNING id, user1_id, user2_id, connection_type, status, compatibility_score, \
                   created_at, responded_at",
    )
    .bind(user1_id)
    .bind(user2_id)
    .bind(connection_type.as_str())
    .bind(compatibility_score)
    .fetch_one(pool)
    .await
    .context("failed to create connection")
}

/// Accept or decline a pending request. Returns the updated row.
pub async fn respond(pool: &PgPool, connection_id: Uuid, accept: bool) -> Result<Connection> {
    let status = if accept { "accepted" } else { "declined" };
    let row: Option<Connection> = sqlx::query_as(
        "UPDATE connections SET status = $2, responded_at = NOW() \
         WHERE id = $1 AND status = 'pending' \
         RETURNING id, user1_id, user2_id, connection_type, status, compatibility_score, \
                   created_at, responded_at",
    )
    .bind(connection_id)
    .bind(status)
    .fetch_optional(pool)
    .await
    .context("failed to respond to connection")?;

    row.ok_or_else(|| ConnectionError::NoSuchConnection.into())
}

/// Block a user: flip any existing pair row to blocked, or insert a fresh
/// blocked row when none exists.
pub async fn block_user(pool: &PgPool, user_id: Uuid, blocked_user_id: Uuid) -> Result<()> {
    let updated = sqlx::query(
        "UPDATE connections SET status = 'blocked', responded_at = NOW() \
         WHERE (user1_id = $1 AND user2_id = $2) OR (user1_id = $2 AND user2_id = $1)",
    )
    .bind(user_id)
    .bind(blocked_user_id)
    .execute(pool)
    .await
    .context("failed to block existing connection")?;

    if updated.rows_affected() == 0 {
        sqlx::query(
            "INSERT INTO connections (user1_id, user2_id, connection_type, status) \
             VALUES ($1, $2, 'friend', 'blocked')",
        )
        .bind(user_id)
        .bind(blocked_user_id)
        .execute(pool)
        .await
        .context("failed to insert block row")?;
    }

    Ok(())
}

/// All connections involving a user, newest first, with the other party's
/// display name joined in.
pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<ConnectionListItem>> {
    sqlx::query_as(
        "SELECT c.id, c.connection_type, c.status, c.compatibility_score, c.created_at, \
                CASE WHEN c.user1_id = $1 THEN c.user2_id ELSE c.user1_id END AS other_user_id, \
                u.display_name AS other_display_name \
         FROM connections c \
         JOIN users u ON u.id = CASE WHEN c.user1_id = $1 THEN c.user2_id ELSE c.user1_id END \
         WHERE c.user1_id = $1 OR c.user2_id = $1 \
         ORDER BY c.created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("failed to list connections")
}

/// Load a single connection row.
pub async fn get_connection(pool: &PgPool, connection_id: Uuid) -> Result<Option<Connection>> {
    sqlx::query_as(
        "SELECT id, user1_id, user2_id, connection_type, status, compatibility_score, \
                created_at, responded_at \
         FROM connections WHERE id = $1",
    )
    .bind(connection_id)
    .fetch_optional(pool)
    .await
    .context("failed to load connection")
}
