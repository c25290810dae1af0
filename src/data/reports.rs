//! User safety reports.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use ts_rs::TS;
use uuid::Uuid;

/// Accepted report categories; anything else is rejected at the web layer.
pub const REPORT_TYPES: &[&str] = &[
    "harassment",
    "spam",
    "fake_profile",
    "inappropriate_content",
    "other",
];

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("you have already reported this user")]
    AlreadyReported,
}

#[derive(Debug, Clone, Serialize, TS, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Report {
    pub id: Uuid,
    pub reporter_id: Uuid,
    pub reported_user_id: Uuid,
    pub report_type: String,
    pub description: String,
    pub evidence_urls: Vec<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// File a report. One report per (reporter, reported) pair.
pub async fn create(
    pool: &PgPool,
    reporter_id: Uuid,
    reported_user_id: Uuid,
    report_type: &str,
    description: &str,
    evidence_urls: &[String],
) -> Result<Report> {
    let already: Option<Uuid> = sqlx::query_scalar(
        "SELECT id FROM reports WHERE reporter_id = $1 AND reported_user_id = $2",
    )
    .bind(reporter_id)
    .bind(reported_user_id)
    .fetch_optional(pool)
    .await
    .context("failed to check for existing report")?;

    if already.is_some() {
        return Err(ReportError::AlreadyReported.into());
    }

    sqlx::query_as(
        "INSERT INTO reports (reporter_id, reported_user_id, report_type, description, evidence_urls) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING id, reporter_id, reported_user_id, report_type, description, evidence_urls, \
                   status, created_at",
    )
    .bind(reporter_id)
    .bind(reported_user_id)
    .bind(report_type)
    .bind(description)
    .bind(evidence_urls)
    .fetch_one(pool)
    .await
    .context("failed to create report")
}

/// Reports filed by a user, newest first.
pub async fn list_for_reporter(pool: &PgPool, reporter_id: Uuid) -> Result<Vec<Report>> {
    sqlx::query_as(
        "SELECT id, reporter_id, reported_user_id, report_type, description, evidence_urls, \
                status, created_at \
         FROM reports WHERE reporter_id = $1 \
         ORDER BY created_at DESC",
    )
    .bind(reporter_id)
    .fetch_all(pool)
    .await
    .context("failed to list reports")
}
