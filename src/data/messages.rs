//! Quota-tracked messages within a connection.
//!
//! `message_count` is denormalized onto each row: the Nth accepted message
//! from a sender carries N. The quota check reads the max, so the counter is
//! monotonic per (connection, sender) with no decrement or reset.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use ts_rs::TS;
use uuid::Uuid;

use crate::matching::quality::MESSAGE_LIMIT;

#[derive(Debug, Clone, Serialize, TS, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Message {
    pub id: Uuid,
    pub connection_id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub content: String,
    pub message_count: i32,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Quota standing for one sender within one conversation.
#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct MessageLimitInfo {
    pub current_count: i32,
    pub limit_reached: bool,
    pub remaining_messages: i32,
}

impl MessageLimitInfo {
    pub fn from_count(current_count: i32) -> Self {
        MessageLimitInfo {
            current_count,
            limit_reached: current_count >= MESSAGE_LIMIT,
            remaining_messages: (MESSAGE_LIMIT - current_count).max(0),
        }
    }
}

/// Highest message_count a sender has used in a conversation (0 when none).
pub async fn current_count(pool: &PgPool, connection_id: Uuid, sender_id: Uuid) -> Result<i32> {
    let count: Option<i32> = sqlx::query_scalar(
        "SELECT MAX(message_count) FROM messages WHERE connection_id = $1 AND sender_id = $2",
    )
    .bind(connection_id)
    .bind(sender_id)
    .fetch_one(pool)
    .await
    .context("failed to load message count")?;
    Ok(count.unwrap_or(0))
}

/// Insert an accepted message carrying its quota position. Callers enforce
/// the quota and quality gates before reaching here.
pub async fn insert_message(
    pool: &PgPool,
    connection_id: Uuid,
    sender_id: Uuid,
    receiver_id: Uuid,
    content: &str,
    message_count: i32,
) -> Result<Message> {
    sqlx::query_as(
        "INSERT INTO messages (connection_id, sender_id, receiver_id, content, message_count) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING id, connection_id, sender_id, receiver_id, content, message_count, \
                   is_read, created_at",
    )
    .bind(connection_id)
    .bind(sender_id)
    .bind(receiver_id)
    .bind(content)
    .bind(message_count)
    .fetch_one(pool)
    .await
    .context("failed to insert message")
}

/// All messages in a conversation, oldest first.
pub async fn list(pool: &PgPool, connection_id: Uuid) -> Result<Vec<Message>> {
    sqlx::query_as(
        "SELECT id, connection_id, sender_id, receiver_id, content, message_count, \
                is_read, created_at \
         FROM messages WHERE connection_id = $1 \
         ORDER BY created_at ASC",
    )
    .bind(connection_id)
    .fetch_all(pool)
    .await
    .context("failed to list messages")
}

/// Mark everything addressed to `receiver_id` in this conversation as read.
/// Returns the number of rows flipped.
pub async fn mark_read(pool: &PgPool, connection_id: Uuid, receiver_id: Uuid) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE messages SET is_read = TRUE \
         WHERE connection_id = $1 AND receiver_id = $2 AND NOT is_read",
    )
    .bind(connection_id)
    .bind(receiver_id)
    .execute(pool)
    .await
    .context("failed to mark messages read")?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_info_saturates_at_zero_remaining() {
        let info = MessageLimitInfo::from_count(7);
        assert!(info.limit_reached);
        assert_eq!(info.remaining_messages, 0);

        let info = MessageLimitInfo::from_count(3);
        assert!(!info.limit_reached);
        assert_eq!(info.remaining_messages, 2);
    }

    #[test]
    fn limit_is_reached_exactly_at_cap() {
        let info = MessageLimitInfo::from_count(MESSAGE_LIMIT);
        assert!(info.limit_reached);
        assert_eq!(info.remaining_messages, 0);
    }
}
