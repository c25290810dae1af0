//! Fire-and-forget notification rows.
//!
//! Insert failures are logged and swallowed by the helpers in the web layer;
//! a missed notification must never fail the triggering operation.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, TS, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub message: String,
    pub data: serde_json::Value,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

pub async fn insert(
    pool: &PgPool,
    user_id: Uuid,
    kind: &str,
    title: &str,
    message: &str,
    data: serde_json::Value,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO notifications (user_id, type, title, message, data) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(user_id)
    .bind(kind)
    .bind(title)
    .bind(message)
    .bind(data)
    .execute(pool)
    .await
    .context("failed to insert notification")?;
    Ok(())
}

/// A user's notifications, unread first, newest within each group.
pub async fn list(pool: &PgPool, user_id: Uuid, limit: i64) -> Result<Vec<Notification>> {
    sqlx::query_as(
        "SELECT id, user_id, type, title, message, data, is_read, created_at \
         FROM notifications WHERE user_id = $1 \
         ORDER BY is_read ASC, created_at DESC \
         LIMIT $2",
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("failed to list notifications")
}

/// Returns false when the id is unknown.
pub async fn mark_read(pool: &PgPool, notification_id: Uuid) -> Result<bool> {
    let result = sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = $1")
        .bind(notification_id)
        .execute(pool)
        .await
        .context("failed to mark notification read")?;
    Ok(result.rows_affected() > 0)
}
