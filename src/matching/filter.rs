//! Candidate pool filtering ahead of scoring.
//!
//! The filter only shrinks the pool; it never orders or bounds it. Callers cap
//! the loaded pool size for performance before scoring, not for correctness.

use super::scoring::gender_compatible;
use super::types::{ConnectionType, MatchingCriteria, Profile};
use std::collections::HashSet;
use uuid::Uuid;

/// User IDs a requester must never be scored against.
#[derive(Debug, Default, Clone)]
pub struct ExclusionSets {
    /// Connected, pending, or blocked with the requester, in either direction.
    pub connected: HashSet<Uuid>,
    /// Shown as the requester's daily match within the trailing 7 days.
    ///
    /// The daily-match pipeline leaves this empty here and applies the window
    /// itself so its empty-pool fallback can still reach recent candidates.
    pub recent_daily: HashSet<Uuid>,
}

/// Select the eligible, non-excluded candidates for a requesting user.
///
/// Eligibility: active and verified. Exclusion: self, anyone in the exclusion
/// sets, and (for `Date`) pairs failing the symmetric gender gate. The gate is
/// applied exactly once, here.
pub fn filter_candidates<'a>(
    user: &Profile,
    candidates: &'a [Profile],
    exclusions: &ExclusionSets,
    criteria: &MatchingCriteria,
) -> Vec<&'a Profile> {
    candidates
        .iter()
        .filter(|c| c.id != user.id)
        .filter(|c| c.is_active && c.verified)
        .filter(|c| !exclusions.connected.contains(&c.id))
        .filter(|c| !exclusions.recent_daily.contains(&c.id))
        .filter(|c| {
            criteria.connection_type != ConnectionType::Date || gender_compatible(user, c)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::types::{
        Gender, GenderPreference, MatchPreferences, SimilarityPreference,
    };
    use chrono::Utc;

    fn profile(name: &str) -> Profile {
        Profile {
            id: Uuid::new_v4(),
            display_name: name.to_owned(),
            campus: "Pilani".to_owned(),
            branch: "CS".to_owned(),
            year: 2,
            age: Some(20),
            gender: Some(Gender::Female),
            interests: HashSet::new(),
            preferences: MatchPreferences::default(),
            verified: true,
            is_active: true,
            last_seen: Utc::now(),
            streak_count: 0,
        }
    }

    fn criteria(user: &Profile, connection_type: ConnectionType) -> MatchingCriteria {
        MatchingCriteria {
            user_id: user.id,
            connection_type,
            similarity: SimilarityPreference::Similar,
            max_results: 10,
        }
    }

    #[test]
    fn excludes_self_inactive_and_unverified() {
        let user = profile("me");
        let mut inactive = profile("inactive");
        inactive.is_active = false;
        let mut unverified = profile("unverified");
        unverified.verified = false;
        let ok = profile("ok");

        let pool = vec![user.clone(), inactive, unverified, ok.clone()];
        let out = filter_candidates(
            &user,
            &pool,
            &ExclusionSets::default(),
            &criteria(&user, ConnectionType::Friend),
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, ok.id);
    }

    #[test]
    fn excludes_connected_and_recent_daily() {
        let user = profile("me");
        let connected = profile("connected");
        let recent = profile("recent");
        let fresh = profile("fresh");

        let exclusions = ExclusionSets {
            connected: [connected.id].into_iter().collect(),
            recent_daily: [recent.id].into_iter().collect(),
        };
        let pool = vec![connected, recent, fresh.clone()];
        let out = filter_candidates(
            &user,
            &pool,
            &exclusions,
            &criteria(&user, ConnectionType::Friend),
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, fresh.id);
    }

    #[test]
    fn gender_gate_applies_only_to_dating() {
        let mut user = profile("me");
        user.gender = Some(Gender::Male);
        user.preferences.gender_preference = GenderPreference::Female;

        let mut incompatible = profile("incompatible");
        incompatible.gender = Some(Gender::Male);
        incompatible.preferences.gender_preference = GenderPreference::Female;

        let pool = vec![incompatible];
        let dating = filter_candidates(
            &user,
            &pool,
            &ExclusionSets::default(),
            &criteria(&user, ConnectionType::Date),
        );
        assert!(dating.is_empty());

        let friends = filter_candidates(
            &user,
            &pool,
            &ExclusionSets::default(),
            &criteria(&user, ConnectionType::Friend),
        );
        assert_eq!(friends.len(), 1);
    }
}
