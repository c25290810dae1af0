//! Discovery endpoint: scored, ranked match lists for connect and dating.

use axum::extract::{Query, State};
use axum::response::Json;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;
use uuid::Uuid;

use crate::data;
use crate::data::profiles::PublicProfile;
use crate::matching::filter::{ExclusionSets, filter_candidates};
use crate::matching::ranker::rank;
use crate::matching::types::{ConnectionType, MatchingCriteria, SimilarityPreference};
use crate::state::AppState;
use crate::web::error::{ApiError, OptionNotFoundExt, db_error};

const DEFAULT_LIMIT: usize = 10;

#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct MatchParams {
    pub user_id: Uuid,
    /// "friend" or "date".
    #[serde(rename = "type")]
    pub connection_type: String,
    /// +1 similar, -1 opposites. Defaults to the user's stored preference.
    pub similarity: Option<i16>,
    pub limit: Option<i64>,
    /// Disable display-order jitter (for stable pagination in clients).
    pub no_jitter: Option<bool>,
}

#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct MatchItem {
    pub user: PublicProfile,
    pub compatibility_score: f64,
    pub match_reasons: Vec<String>,
}

#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct MatchesResponse {
    pub matches: Vec<MatchItem>,
    pub count: usize,
}

/// `GET /api/matches`
pub async fn get_matches(
    State(state): State<AppState>,
    Query(params): Query<MatchParams>,
) -> Result<Json<MatchesResponse>, ApiError> {
    let connection_type = ConnectionType::parse(&params.connection_type).ok_or_else(|| {
        ApiError::invalid_input(format!(
            "invalid connection type '{}'. Valid: friend, date",
            params.connection_type
        ))
    })?;

    // Fail fast on malformed limits rather than clamping silently.
    if let Some(limit) = params.limit
        && limit <= 0
    {
        return Err(ApiError::invalid_input("limit must be positive"));
    }

    let user = data::profiles::get_profile(&state.db_pool, params.user_id)
        .await
        .map_err(|e| db_error("Load requester", e))?
        .or_not_found("User", params.user_id)?;

    // Browsing matches counts as activity.
    if let Err(e) = data::profiles::touch_last_seen(&state.db_pool, user.id).await {
        debug!(error = ?e, "failed to update last_seen");
    }

    let similarity = match params.similarity {
        Some(v) => SimilarityPreference::from_sign(v),
        None => user.preferences.similarity_for(connection_type),
    };
    let criteria = MatchingCriteria {
        user_id: user.id,
        connection_type,
        similarity,
        max_results: params.limit.unwrap_or(DEFAULT_LIMIT as i64) as usize,
    };
    criteria
        .validate()
        .map_err(|e| ApiError::invalid_input(e.to_string()))?;

    let pool = data::profiles::candidate_pool(
        &state.db_pool,
        user.id,
        state.config.candidate_pool_size,
    )
    .await
    .map_err(|e| db_error("Load candidate pool", e))?;

    let today = chrono::Utc::now().date_naive();
    let exclusions = ExclusionSets {
        connected: data::connections::exclusion_ids(&state.db_pool, user.id)
            .await
            .map_err(|e| db_error("Load exclusions", e))?,
        recent_daily: data::daily_matches::recent_match_ids(&state.db_pool, user.id, today, 7)
            .await
            .map_err(|e| db_error("Load recent daily matches", e))?,
    };

    let candidates = filter_candidates(&user, &pool, &exclusions, &criteria);
    if candidates.is_empty() {
        // Valid empty result; distinct from all-below-threshold for observability.
        debug!(user_id = %user.id, "candidate pool empty after filtering");
    }

    let ranked = if params.no_jitter.unwrap_or(false) {
        rank::<StdRng>(&user, &candidates, &criteria, None)
    } else {
        let mut rng = rand::rng();
        rank(&user, &candidates, &criteria, Some(&mut rng))
    };
    if ranked.is_empty() && !candidates.is_empty() {
        debug!(user_id = %user.id, "all candidates below acceptance threshold");
    }

    let matches: Vec<MatchItem> = ranked
        .iter()
        .map(|m| MatchItem {
            user: PublicProfile::from(&m.candidate),
            compatibility_score: m.compatibility_score,
            match_reasons: m.match_reasons.clone(),
        })
        .collect();

    Ok(Json(MatchesResponse {
        count: matches.len(),
        matches,
    }))
}
