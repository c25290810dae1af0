//! Daily match endpoints: idempotent retrieval, actions, streak, history.

use axum::extract::{Path, Query, State};
use axum::response::Json;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};
use ts_rs::TS;
use uuid::Uuid;

use crate::data;
use crate::data::daily_matches::{DailyMatch, DailyMatchHistoryItem, MatchAction};
use crate::data::profiles::PublicProfile;
use crate::matching::ALGORITHM_VERSION;
use crate::matching::filter::{ExclusionSets, filter_candidates};
use crate::matching::ranker::{rank, select_daily};
use crate::matching::types::{ConnectionType, MatchingCriteria, Profile};
use crate::state::AppState;
use crate::web::error::{ApiError, OptionNotFoundExt, db_error};

/// Pool size fed into the weighted daily draw.
const DAILY_MAX_RESULTS: usize = 50;

#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UserParams {
    pub user_id: Uuid,
}

#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DailyMatchResponse {
    /// `None` when no eligible candidate exists today; a neutral empty state,
    /// never an error.
    #[serde(rename = "match")]
    pub daily_match: Option<DailyMatchPayload>,
}

#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DailyMatchPayload {
    #[serde(flatten)]
    pub record: DailyMatch,
    pub matched_user: PublicProfile,
}

async fn payload_for(state: &AppState, record: DailyMatch) -> Result<DailyMatchPayload, ApiError> {
    let matched = data::profiles::get_profile(&state.db_pool, record.matched_user_id)
        .await
        .map_err(|e| db_error("Load matched user", e))?
        .or_not_found("User", record.matched_user_id)?;
    Ok(DailyMatchPayload {
        matched_user: PublicProfile::from(&matched),
        record,
    })
}

/// `GET /api/daily-match`
///
/// Returns today's record unchanged when one exists; only generates when the
/// user has no row for today. Repeated calls on the same day are idempotent.
pub async fn get_daily_match(
    State(state): State<AppState>,
    Query(params): Query<UserParams>,
) -> Result<Json<DailyMatchResponse>, ApiError> {
    let today = chrono::Utc::now().date_naive();

    let existing = data::daily_matches::get_for_date(&state.db_pool, params.user_id, today)
        .await
        .map_err(|e| db_error("Load daily match", e))?;
    if let Some(record) = data::daily_matches::reusable_row(existing, today) {
        return Ok(Json(DailyMatchResponse {
            daily_match: Some(payload_for(&state, record).await?),
        }));
    }

    let user = data::profiles::get_profile(&state.db_pool, params.user_id)
        .await
        .map_err(|e| db_error("Load requester", e))?
        .or_not_found("User", params.user_id)?;

    let Some(selected) = generate_daily_match(&state, &user).await? else {
        debug!(user_id = %user.id, "no eligible daily match candidate");
        return Ok(Json(DailyMatchResponse { daily_match: None }));
    };

    let record = data::daily_matches::replace_for_date(
        &state.db_pool,
        user.id,
        selected.0,
        today,
        selected.1,
        ALGORITHM_VERSION,
    )
    .await
    .map_err(|e| db_error("Persist daily match", e))?;

    notify_daily_match(&state, &user, record.matched_user_id).await;

    info!(
        user_id = %user.id,
        matched_user_id = %record.matched_user_id,
        score = record.compatibility_score,
        "daily match generated"
    );

    Ok(Json(DailyMatchResponse {
        daily_match: Some(payload_for(&state, record).await?),
    }))
}

/// Run the matching pipeline and pick one candidate. Daily matches always use
/// the friend context with the user's stored connect similarity; the 7-day
/// repeat window is applied at selection time so its fallback can still reach
/// recently seen candidates.
async fn generate_daily_match(
    state: &AppState,
    user: &Profile,
) -> Result<Option<(Uuid, f32)>, ApiError> {
    let criteria = MatchingCriteria {
        user_id: user.id,
        connection_type: ConnectionType::Friend,
        similarity: user.preferences.connect_similarity,
        max_results: DAILY_MAX_RESULTS,
    };

    let pool = data::profiles::candidate_pool(
        &state.db_pool,
        user.id,
        state.config.candidate_pool_size,
    )
    .await
    .map_err(|e| db_error("Load candidate pool", e))?;

    let exclusions = ExclusionSets {
        connected: data::connections::exclusion_ids(&state.db_pool, user.id)
            .await
            .map_err(|e| db_error("Load exclusions", e))?,
        recent_daily: Default::default(),
    };

    let today = chrono::Utc::now().date_naive();
    let recent = data::daily_matches::recent_match_ids(&state.db_pool, user.id, today, 7)
        .await
        .map_err(|e| db_error("Load recent daily matches", e))?;

    let candidates = filter_candidates(user, &pool, &exclusions, &criteria);
    let ranked = rank::<StdRng>(user, &candidates, &criteria, None);

    let mut rng = rand::rng();
    Ok(select_daily(&ranked, &recent, &mut rng)
        .map(|m| (m.candidate.id, m.compatibility_score as f32)))
}

async fn notify_daily_match(state: &AppState, user: &Profile, matched_user_id: Uuid) {
    let name = data::profiles::display_name(&state.db_pool, matched_user_id)
        .await
        .ok()
        .flatten()
        .unwrap_or_else(|| "Someone new".to_owned());

    if let Err(e) = data::notifications::insert(
        &state.db_pool,
        user.id,
        "daily_match",
        "Your Daily Match is Here!",
        &format!("Check out {name} - they might be perfect for you!"),
        json!({ "match_date": chrono::Utc::now().date_naive() }),
    )
    .await
    {
        warn!(error = ?e, "failed to insert daily match notification");
    }
}

#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ActionBody {
    pub action: String,
}

/// `POST /api/daily-match/{id}/action`
///
/// Records pass/connect/super_like. Connect and super-like also open a
/// pending friend connection carrying the snapshotted score.
pub async fn record_action(
    State(state): State<AppState>,
    Path(match_id): Path<Uuid>,
    Json(body): Json<ActionBody>,
) -> Result<Json<DailyMatch>, ApiError> {
    let action = MatchAction::parse(&body.action).ok_or_else(|| {
        ApiError::invalid_input(format!(
            "invalid action '{}'. Valid: pass, connect, super_like",
            body.action
        ))
    })?;

    let record = data::daily_matches::record_action(&state.db_pool, match_id, action)
        .await
        .map_err(|e| db_error("Record daily match action", e))?
        .or_not_found("Daily match", match_id)?;

    if matches!(action, MatchAction::Connect | MatchAction::SuperLike) {
        match data::connections::create_connection(
            &state.db_pool,
            record.user_id,
            record.matched_user_id,
            ConnectionType::Friend,
            Some(record.compatibility_score),
        )
        .await
        {
            Ok(_) => {}
            // An existing pair row is fine here; the action still stands.
            Err(e) if e.downcast_ref::<data::connections::ConnectionError>().is_some() => {
                debug!(match_id = %match_id, "connection already exists for daily match pair");
            }
            Err(e) => return Err(db_error("Create connection from daily match", e)),
        }
    }

    Ok(Json(record))
}

#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StreakResponse {
    pub streak: i64,
}

/// `GET /api/daily-match/streak`
pub async fn get_streak(
    State(state): State<AppState>,
    Query(params): Query<UserParams>,
) -> Result<Json<StreakResponse>, ApiError> {
    let today = chrono::Utc::now().date_naive();
    let streak = data::daily_matches::streak(&state.db_pool, params.user_id, today)
        .await
        .map_err(|e| db_error("Load streak", e))?;
    Ok(Json(StreakResponse { streak }))
}

#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct HistoryParams {
    pub user_id: Uuid,
    pub limit: Option<i64>,
}

/// `GET /api/daily-match/history`
pub async fn get_history(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<DailyMatchHistoryItem>>, ApiError> {
    let limit = params.limit.unwrap_or(10).clamp(1, 100);
    let rows = data::daily_matches::history(&state.db_pool, params.user_id, limit)
        .await
        .map_err(|e| db_error("Load daily match history", e))?;
    Ok(Json(rows))
}

#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StatsResponse {
    pub total: i64,
    pub viewed: i64,
    pub connected: i64,
    pub passed: i64,
    pub super_liked: i64,
    pub connection_rate: f64,
}

/// `GET /api/daily-match/stats`
pub async fn get_stats(
    State(state): State<AppState>,
    Query(params): Query<UserParams>,
) -> Result<Json<StatsResponse>, ApiError> {
    let stats = data::daily_matches::stats(&state.db_pool, params.user_id)
        .await
        .map_err(|e| db_error("Load daily match stats", e))?;
    Ok(Json(StatsResponse {
        connection_rate: stats.connection_rate(),
        total: stats.total,
        viewed: stats.viewed,
        connected: stats.connected,
        passed: stats.passed,
        super_liked: stats.super_liked,
    }))
}
