//! User report endpoints.

use axum::extract::{Query, State};
use axum::response::Json;
use serde::Deserialize;
use tracing::info;
use ts_rs::TS;
use uuid::Uuid;

use crate::data;
use crate::data::reports::{REPORT_TYPES, Report};
use crate::state::AppState;
use crate::web::error::{ApiError, OptionNotFoundExt, db_error};

#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateReportBody {
    pub reporter_id: Uuid,
    pub reported_user_id: Uuid,
    pub report_type: String,
    pub description: String,
    #[serde(default)]
    pub evidence_urls: Vec<String>,
}

/// `POST /api/reports`
pub async fn create_report(
    State(state): State<AppState>,
    Json(body): Json<CreateReportBody>,
) -> Result<Json<Report>, ApiError> {
    if !REPORT_TYPES.contains(&body.report_type.as_str()) {
        return Err(ApiError::invalid_input(format!(
            "invalid report type '{}'. Valid: {}",
            body.report_type,
            REPORT_TYPES.join(", ")
        )));
    }
    if body.reporter_id == body.reported_user_id {
        return Err(ApiError::invalid_input("cannot report yourself"));
    }
    if body.description.trim().is_empty() {
        return Err(ApiError::invalid_input("a description is required"));
    }

    data::profiles::get_profile(&state.db_pool, body.reported_user_id)
        .await
        .map_err(|e| db_error("Load reported user", e))?
        .or_not_found("User", body.reported_user_id)?;

    let report = data::reports::create(
        &state.db_pool,
        body.reporter_id,
        body.reported_user_id,
        &body.report_type,
        body.description.trim(),
        &body.evidence_urls,
    )
    .await
    .map_err(|e| db_error("Create report", e))?;

    info!(
        report_id = %report.id,
        report_type = %report.report_type,
        "user report filed"
    );

    Ok(Json(report))
}

#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ReporterParams {
    pub reporter_id: Uuid,
}

/// `GET /api/reports`
pub async fn list_reports(
    State(state): State<AppState>,
    Query(params): Query<ReporterParams>,
) -> Result<Json<Vec<Report>>, ApiError> {
    let rows = data::reports::list_for_reporter(&state.db_pool, params.reporter_id)
        .await
        .map_err(|e| db_error("List reports", e))?;
    Ok(Json(rows))
}
