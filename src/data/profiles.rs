//! User profile loading for the matching pipeline.
//!
//! Pure data functions returning `anyhow::Result`. Profiles come out of here
//! fully parsed into `matching::types::Profile` so the engine never sees raw
//! rows.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use ts_rs::TS;
use uuid::Uuid;

use crate::matching::types::{
    Gender, GenderPreference, MatchPreferences, Profile, SimilarityPreference,
};

#[derive(sqlx::FromRow)]
struct ProfileRow {
    id: Uuid,
    display_name: String,
    campus: String,
    branch: String,
    year: i32,
    age: Option<i32>,
    gender: Option<String>,
    interests: Vec<String>,
    connect_similarity: i16,
    dating_similarity: i16,
    gender_preference: String,
    verified: bool,
    is_active: bool,
    last_seen: DateTime<Utc>,
    streak_count: i32,
}

impl ProfileRow {
    fn into_profile(self) -> Profile {
        Profile {
            id: self.id,
            display_name: self.display_name,
            campus: self.campus,
            branch: self.branch,
            year: self.year,
            age: self.age,
            gender: self.gender.as_deref().and_then(Gender::parse),
            // Interests are case-normalized at the boundary; scoring assumes it.
            interests: self
                .interests
                .into_iter()
                .map(|i| i.trim().to_lowercase())
                .filter(|i| !i.is_empty())
                .collect(),
            preferences: MatchPreferences {
                connect_similarity: SimilarityPreference::from_sign(self.connect_similarity),
                dating_similarity: SimilarityPreference::from_sign(self.dating_similarity),
                gender_preference: GenderPreference::parse(&self.gender_preference)
                    .unwrap_or_default(),
            },
            verified: self.verified,
            is_active: self.is_active,
            last_seen: self.last_seen,
            streak_count: self.streak_count,
        }
    }
}

const PROFILE_COLUMNS: &str = "id, display_name, campus, branch, year, age, gender, interests, \
     connect_similarity, dating_similarity, gender_preference, verified, is_active, last_seen, \
     streak_count";

/// Load a single profile by id.
pub async fn get_profile(pool: &PgPool, user_id: Uuid) -> Result<Option<Profile>> {
    let sql = format!("SELECT {PROFILE_COLUMNS} FROM users WHERE id = $1");
    let row: Option<ProfileRow> = sqlx::query_as(&sql)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .context("failed to load profile")?;

    Ok(row.map(ProfileRow::into_profile))
}

/// Load the bounded candidate pool for a requester: active, verified, not the
/// requester, most recently seen first. The cap is a performance bound, not a
/// correctness one; filtering happens in `matching::filter`.
pub async fn candidate_pool(pool: &PgPool, user_id: Uuid, cap: i64) -> Result<Vec<Profile>> {
    let sql = format!(
        "SELECT {PROFILE_COLUMNS} FROM users \
         WHERE id <> $1 AND is_active AND verified \
         ORDER BY last_seen DESC \
         LIMIT $2"
    );
    let rows: Vec<ProfileRow> = sqlx::query_as(&sql)
        .bind(user_id)
        .bind(cap)
        .fetch_all(pool)
        .await
        .context("failed to load candidate pool")?;

    Ok(rows.into_iter().map(ProfileRow::into_profile).collect())
}

/// Bump a user's `last_seen` to now.
pub async fn touch_last_seen(pool: &PgPool, user_id: Uuid) -> Result<()> {
    sqlx::query("UPDATE users SET last_seen = NOW() WHERE id = $1")
        .bind(user_id)
        .execute(pool)
        .await
        .context("failed to update last_seen")?;
    Ok(())
}

/// Resolve two campus emails to user ids, in argument order.
pub async fn resolve_pair_by_email(
    pool: &PgPool,
    email1: &str,
    email2: &str,
) -> Result<Option<(Uuid, Uuid)>> {
    let rows: Vec<(Uuid, String)> =
        sqlx::query_as("SELECT id, bits_email FROM users WHERE bits_email = ANY($1)")
            .bind(vec![email1.to_owned(), email2.to_owned()])
            .fetch_all(pool)
            .await
            .context("failed to resolve users by email")?;

    let first = rows.iter().find(|(_, e)| e == email1).map(|(id, _)| *id);
    let second = rows.iter().find(|(_, e)| e == email2).map(|(id, _)| *id);
    Ok(first.zip(second))
}

/// Fetch a user's display name, for notification copy.
pub async fn display_name(pool: &PgPool, user_id: Uuid) -> Result<Option<String>> {
    sqlx::query_scalar("SELECT display_name FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .context("failed to load display name")
}

/// The profile fields exposed over the API. Never includes preferences or
/// activity internals.
#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PublicProfile {
    pub id: Uuid,
    pub display_name: String,
    pub campus: String,
    pub branch: String,
    pub year: i32,
    pub age: Option<i32>,
    pub interests: Vec<String>,
    pub verified: bool,
    pub streak_count: i32,
}

impl From<&Profile> for PublicProfile {
    fn from(p: &Profile) -> Self {
        let mut interests: Vec<String> = p.interests.iter().cloned().collect();
        interests.sort_unstable();
        PublicProfile {
            id: p.id,
            display_name: p.display_name.clone(),
            campus: p.campus.clone(),
            branch: p.branch.clone(),
            year: p.year,
            age: p.age,
            interests,
            verified: p.verified,
            streak_count: p.streak_count,
        }
    }
}
