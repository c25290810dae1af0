//! Ranking, display-order jitter, and daily-match selection.
//!
//! Scoring stays deterministic; all randomness enters through an injected
//! `Rng` so seeded tests reproduce exactly.

use super::scoring::{compatibility, match_reasons};
use super::types::{ConnectionType, MatchResult, MatchingCriteria, Profile};
use rand::Rng;
use std::collections::HashSet;
use uuid::Uuid;

/// Strict acceptance cutoffs: a score exactly at the threshold is rejected.
pub const FRIEND_THRESHOLD: f64 = 0.3;
pub const DATE_THRESHOLD: f64 = 0.4;

/// Symmetric jitter applied to sort keys only, to vary presentation order
/// across repeated calls. Never touches the reported score.
const JITTER: f64 = 0.025;

/// Daily selection considers at most this many top-ranked candidates.
const DAILY_POOL: usize = 20;
/// Exponential position-weight decay for the daily draw.
const DAILY_DECAY: f64 = 0.8;

/// Acceptance threshold for the given context.
pub fn threshold(connection_type: ConnectionType) -> f64 {
    match connection_type {
        ConnectionType::Friend => FRIEND_THRESHOLD,
        ConnectionType::Date => DATE_THRESHOLD,
    }
}

/// Score, cut, and order the filtered candidates.
///
/// Candidates at or below the context threshold are dropped. When a jitter
/// source is supplied, sort keys are perturbed by ±[`JITTER`] and re-sorted
/// before truncating to `max_results`.
pub fn rank<R: Rng>(
    user: &Profile,
    candidates: &[&Profile],
    criteria: &MatchingCriteria,
    jitter: Option<&mut R>,
) -> Vec<MatchResult> {
    let cutoff = threshold(criteria.connection_type);

    let mut scored: Vec<(f64, MatchResult)> = candidates
        .iter()
        .filter_map(|candidate| {
            let score = compatibility(
                user,
                candidate,
                criteria.connection_type,
                criteria.similarity,
            );
            if score > cutoff {
                Some((
                    score,
                    MatchResult {
                        candidate: (*candidate).clone(),
                        compatibility_score: score,
                        match_reasons: match_reasons(user, candidate),
                    },
                ))
            } else {
                None
            }
        })
        .collect();

    if let Some(rng) = jitter {
        for (key, _) in scored.iter_mut() {
            *key += rng.random_range(-JITTER..=JITTER);
        }
    }

    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored.truncate(criteria.max_results);
    scored.into_iter().map(|(_, result)| result).collect()
}

/// Pick one daily match from a ranked list via weighted random sampling.
///
/// The top [`DAILY_POOL`] candidates get exponentially decaying weights
/// `0.8^index`, trading strict best-match determinism for serendipity while
/// still favoring higher ranks. Candidates matched within the trailing 7 days
/// are excluded first; if that empties the pool, falls back to a uniform pick
/// over the full ranked list rather than returning no match.
pub fn select_daily<R: Rng>(
    ranked: &[MatchResult],
    recent: &HashSet<Uuid>,
    rng: &mut R,
) -> Option<MatchResult> {
    if ranked.is_empty() {
        return None;
    }

    let pool: Vec<&MatchResult> = ranked
        .iter()
        .take(DAILY_POOL)
        .filter(|m| !recent.contains(&m.candidate.id))
        .collect();

    if pool.is_empty() {
        let idx = rng.random_range(0..ranked.len());
        return Some(ranked[idx].clone());
    }

    let weights: Vec<f64> = (0..pool.len()).map(|i| DAILY_DECAY.powi(i as i32)).collect();
    let total: f64 = weights.iter().sum();
    let mut draw = rng.random_range(0.0..total);

    for (candidate, weight) in pool.iter().zip(&weights) {
        if draw < *weight {
            return Some((*candidate).clone());
        }
        draw -= weight;
    }

    // Floating-point tail: the cumulative walk can fall through by an ulp.
    pool.last().map(|m| (*m).clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::types::{MatchPreferences, SimilarityPreference};
    use chrono::Utc;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet as StdHashSet;

    fn profile(campus: &str, interests: &[&str]) -> Profile {
        Profile {
            id: Uuid::new_v4(),
            display_name: "p".to_owned(),
            campus: campus.to_owned(),
            branch: "CS".to_owned(),
            year: 2,
            age: Some(20),
            gender: None,
            interests: interests.iter().map(|s| s.to_string()).collect(),
            preferences: MatchPreferences::default(),
            verified: true,
            is_active: true,
            last_seen: Utc::now(),
            streak_count: 0,
        }
    }

    fn criteria(user: &Profile, max_results: usize) -> MatchingCriteria {
        MatchingCriteria {
            user_id: user.id,
            connection_type: ConnectionType::Friend,
            similarity: SimilarityPreference::Similar,
            max_results,
        }
    }

    fn graded_pool(user: &Profile, n: usize) -> Vec<Profile> {
        // Decreasing interest overlap with the user as index grows.
        let all = ["music", "gaming", "code", "anime", "trekking", "cricket"];
        (0..n)
            .map(|i| {
                let keep = all.len().saturating_sub(i).max(1);
                let mut p = profile("Pilani", &all[..keep]);
                p.campus = user.campus.clone();
                p
            })
            .collect()
    }

    #[test]
    fn threshold_is_strictly_greater_than() {
        // A pair engineered to land exactly on the friend threshold is
        // rejected; strictly above passes.
        let user = profile("Pilani", &[]);
        let mut at = profile("Goa", &[]);
        at.verified = false;
        at.is_active = false;
        at.age = None;
        at.year = 7;
        at.branch = "Mech".to_owned();
        // personality: campus .6*.3 + year .25*(1-5*.15)=.25*.25 + branch .7*.2 + age .6*.25
        //            = .18 + .0625 + .14 + .15 = .5325
        // score: 0*.45 + .5325*.35 + .5*.1 + .5*.1 = .186375 + .1 = .236... below.
        let ranked = rank::<StdRng>(&user, &[&at], &criteria(&user, 10), None);
        assert!(ranked.is_empty());

        let good = profile("Pilani", &[]);
        let ranked = rank::<StdRng>(&user, &[&good], &criteria(&user, 10), None);
        assert_eq!(ranked.len(), 1);
    }

    #[test]
    fn ranking_is_descending_and_truncated() {
        let user = profile("Pilani", &["music", "gaming", "code", "anime", "trekking", "cricket"]);
        let pool = graded_pool(&user, 6);
        let refs: Vec<&Profile> = pool.iter().collect();
        let ranked = rank::<StdRng>(&user, &refs, &criteria(&user, 3), None);
        assert_eq!(ranked.len(), 3);
        assert!(ranked[0].compatibility_score >= ranked[1].compatibility_score);
        assert!(ranked[1].compatibility_score >= ranked[2].compatibility_score);
    }

    #[test]
    fn jitter_never_alters_reported_scores() {
        let user = profile("Pilani", &["music", "gaming", "code", "anime", "trekking", "cricket"]);
        let pool = graded_pool(&user, 6);
        let refs: Vec<&Profile> = pool.iter().collect();

        let plain = rank::<StdRng>(&user, &refs, &criteria(&user, 10), None);
        let mut rng = StdRng::seed_from_u64(7);
        let jittered = rank(&user, &refs, &criteria(&user, 10), Some(&mut rng));

        let mut plain_scores: Vec<u64> = plain
            .iter()
            .map(|m| m.compatibility_score.to_bits())
            .collect();
        let mut jittered_scores: Vec<u64> = jittered
            .iter()
            .map(|m| m.compatibility_score.to_bits())
            .collect();
        plain_scores.sort_unstable();
        jittered_scores.sort_unstable();
        assert_eq!(plain_scores, jittered_scores);
    }

    #[test]
    fn daily_selection_is_reproducible_with_seeded_rng() {
        let user = profile("Pilani", &["music", "gaming", "code", "anime", "trekking", "cricket"]);
        let pool = graded_pool(&user, 8);
        let refs: Vec<&Profile> = pool.iter().collect();
        let ranked = rank::<StdRng>(&user, &refs, &criteria(&user, 20), None);
        assert!(ranked.len() >= 5);

        let first = select_daily(&ranked, &StdHashSet::new(), &mut StdRng::seed_from_u64(42));
        let second = select_daily(&ranked, &StdHashSet::new(), &mut StdRng::seed_from_u64(42));
        assert_eq!(
            first.as_ref().map(|m| m.candidate.id),
            second.as_ref().map(|m| m.candidate.id)
        );
    }

    #[test]
    fn daily_selection_favors_higher_ranks() {
        let user = profile("Pilani", &["music", "gaming", "code", "anime", "trekking", "cricket"]);
        let pool = graded_pool(&user, 6);
        let refs: Vec<&Profile> = pool.iter().collect();
        let ranked = rank::<StdRng>(&user, &refs, &criteria(&user, 20), None);
        assert!(ranked.len() >= 5);

        let top = ranked[0].candidate.id;
        let fifth = ranked[4].candidate.id;
        let mut top_hits = 0u32;
        let mut fifth_hits = 0u32;
        for seed in 0..2000u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let picked = select_daily(&ranked, &StdHashSet::new(), &mut rng).unwrap();
            if picked.candidate.id == top {
                top_hits += 1;
            } else if picked.candidate.id == fifth {
                fifth_hits += 1;
            }
        }
        assert!(
            top_hits > fifth_hits,
            "rank 0 picked {top_hits}x, rank 4 picked {fifth_hits}x"
        );
    }

    #[test]
    fn exhausted_pool_falls_back_to_uniform_pick() {
        let user = profile("Pilani", &["music", "gaming", "code", "anime", "trekking", "cricket"]);
        let pool = graded_pool(&user, 4);
        let refs: Vec<&Profile> = pool.iter().collect();
        let ranked = rank::<StdRng>(&user, &refs, &criteria(&user, 20), None);
        assert!(!ranked.is_empty());

        let recent: StdHashSet<Uuid> = ranked.iter().map(|m| m.candidate.id).collect();
        let picked = select_daily(&ranked, &recent, &mut StdRng::seed_from_u64(1));
        assert!(picked.is_some(), "fallback must still produce a match");
    }

    #[test]
    fn empty_ranking_yields_no_daily_match() {
        assert!(
            select_daily(&[], &StdHashSet::new(), &mut StdRng::seed_from_u64(1)).is_none()
        );
    }
}
