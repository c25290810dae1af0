//! Compatibility scoring between two campus profiles.
//!
//! Every sub-score normalizes to [0, 1] before weighting; the weighted sum
//! plus the streak bonus is clamped to [0, 1] at the end, and that final clamp
//! is the correctness boundary. Constants are hand-tuned against the original
//! match-quality review sessions, not fitted.

use super::types::{ConnectionType, Profile, SimilarityPreference};
use std::collections::HashSet;

/// Common-interest bonus: `min(common / 5, 0.3)` on top of the Jaccard index.
/// Deliberately over-rewards users sharing many of a small interest universe.
const INTEREST_BONUS_PER_COMMON: f64 = 1.0 / 5.0;
const INTEREST_BONUS_CAP: f64 = 0.3;

/// Personality blend factor weights.
const W_CAMPUS: f64 = 0.30;
const W_YEAR: f64 = 0.25;
const W_BRANCH: f64 = 0.20;
const W_AGE: f64 = 0.25;

/// Campus factor: same campus vs. different.
const CAMPUS_SAME: f64 = 1.0;
const CAMPUS_OTHER: f64 = 0.6;
/// Year proximity falloff per year of difference.
const YEAR_FALLOFF: f64 = 0.15;
/// Branch factor: same branch vs. different.
const BRANCH_SAME: f64 = 0.9;
const BRANCH_OTHER: f64 = 0.7;
/// Age proximity falloff per year of difference; neutral when either is unknown.
const AGE_FALLOFF: f64 = 0.08;
const AGE_UNKNOWN: f64 = 0.6;

/// Opposites-attract: scale the blended personality score and add a flat
/// diversity bonus when branches differ.
const OPPOSITES_SCALE: f64 = 0.8;
const OPPOSITES_DIVERSITY_BONUS: f64 = 0.2;

/// Streak bonus: `min((s1 + s2) / 20, 0.2)`, added after weighting.
const STREAK_DIVISOR: f64 = 20.0;
const STREAK_BONUS_CAP: f64 = 0.2;

/// Both-on-a-streak reason fires when each side's streak exceeds this.
const STREAK_REASON_MIN: i32 = 5;

/// Maximum number of match reasons returned.
const MAX_REASONS: usize = 4;

/// Sub-score weights per connection type: (interests, personality, activity,
/// verification).
fn weights(connection_type: ConnectionType) -> (f64, f64, f64, f64) {
    match connection_type {
        ConnectionType::Friend => (0.45, 0.35, 0.10, 0.10),
        ConnectionType::Date => (0.30, 0.50, 0.10, 0.10),
    }
}

/// Jaccard similarity of two interest sets plus the common-interest bonus,
/// clamped to 1.0. Defined as exactly 0 when either set is empty.
pub fn interest_similarity(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let common = a.intersection(b).count();
    let union = a.union(b).count();
    let jaccard = common as f64 / union as f64;
    let bonus = (common as f64 * INTEREST_BONUS_PER_COMMON).min(INTEREST_BONUS_CAP);
    (jaccard + bonus).min(1.0)
}

/// Weighted blend of campus, year-proximity, branch, and age-proximity
/// factors. Under `Opposites`, the blend is scaled down and a flat diversity
/// bonus applies when branches differ, capped at 1.0.
pub fn personality_match(a: &Profile, b: &Profile, similarity: SimilarityPreference) -> f64 {
    let campus = if a.campus == b.campus {
        CAMPUS_SAME
    } else {
        CAMPUS_OTHER
    };
    let year = (1.0 - (a.year - b.year).abs() as f64 * YEAR_FALLOFF).max(0.0);
    let branch = if a.branch == b.branch {
        BRANCH_SAME
    } else {
        BRANCH_OTHER
    };
    let age = match (a.age, b.age) {
        (Some(x), Some(y)) => (1.0 - (x - y).abs() as f64 * AGE_FALLOFF).max(0.0),
        _ => AGE_UNKNOWN,
    };

    let blended = campus * W_CAMPUS + year * W_YEAR + branch * W_BRANCH + age * W_AGE;

    match similarity {
        SimilarityPreference::Similar => blended,
        SimilarityPreference::Opposites => {
            let diversity = if a.branch != b.branch {
                OPPOSITES_DIVERSITY_BONUS
            } else {
                0.0
            };
            (blended * OPPOSITES_SCALE + diversity).min(1.0)
        }
    }
}

/// Binary activity score: 1.0 when both profiles are active, else 0.5.
pub fn activity_score(a: &Profile, b: &Profile) -> f64 {
    if a.is_active && b.is_active { 1.0 } else { 0.5 }
}

/// 0.5 per verified party: both = 1.0, one = 0.5, neither = 0.
pub fn verification_score(a: &Profile, b: &Profile) -> f64 {
    let mut score = 0.0;
    if a.verified {
        score += 0.5;
    }
    if b.verified {
        score += 0.5;
    }
    score
}

/// Combined streak bonus, added after the weighted sum. The final clamp in
/// [`compatibility`] handles any overflow past 1.0.
pub fn streak_bonus(a: &Profile, b: &Profile) -> f64 {
    ((a.streak_count + b.streak_count).max(0) as f64 / STREAK_DIVISOR).min(STREAK_BONUS_CAP)
}

/// Symmetric gender gate for romantic contexts.
///
/// `Any` on either side satisfies the pair outright; otherwise each party's
/// preference must match the other's actual gender. An unset gender never
/// satisfies a concrete preference.
pub fn gender_compatible(a: &Profile, b: &Profile) -> bool {
    let a_pref = a.preferences.gender_preference;
    let b_pref = b.preferences.gender_preference;

    if a_pref == super::types::GenderPreference::Any
        || b_pref == super::types::GenderPreference::Any
    {
        return true;
    }
    a_pref.accepts(b.gender) && b_pref.accepts(a.gender)
}

/// Full compatibility score for a pair in the given context, in [0, 1].
///
/// Deterministic for fixed inputs; any display-order jitter is a ranker
/// concern, never part of the score.
pub fn compatibility(
    user: &Profile,
    candidate: &Profile,
    connection_type: ConnectionType,
    similarity: SimilarityPreference,
) -> f64 {
    let (w_interest, w_personality, w_activity, w_verification) = weights(connection_type);

    let weighted = interest_similarity(&user.interests, &candidate.interests) * w_interest
        + personality_match(user, candidate, similarity) * w_personality
        + activity_score(user, candidate) * w_activity
        + verification_score(user, candidate) * w_verification;

    (weighted + streak_bonus(user, candidate)).clamp(0.0, 1.0)
}

/// Human-readable reasons a pair matched, in fixed evaluation order
/// (campus, year, branch, interests, streaks, verification), truncated to 4.
pub fn match_reasons(user: &Profile, candidate: &Profile) -> Vec<String> {
    let mut reasons = Vec::new();

    if user.campus == candidate.campus {
        reasons.push(format!("Both at BITS {}", user.campus));
    }

    let year_diff = (user.year - candidate.year).abs();
    if year_diff == 0 {
        reasons.push("Same academic year".to_owned());
    } else if year_diff == 1 {
        reasons.push("Adjacent academic years".to_owned());
    }

    if user.branch == candidate.branch {
        reasons.push(format!("Both studying {}", user.branch));
    } else {
        reasons.push("Complementary academic backgrounds".to_owned());
    }

    let mut common: Vec<&str> = user
        .interests
        .intersection(&candidate.interests)
        .map(String::as_str)
        .collect();
    common.sort_unstable();
    if common.len() >= 3 {
        reasons.push(format!("Share {} common interests", common.len()));
    } else if !common.is_empty() {
        reasons.push(format!("Share interests in {}", common.join(", ")));
    }

    if user.streak_count > STREAK_REASON_MIN && candidate.streak_count > STREAK_REASON_MIN {
        reasons.push("Both on daily-match streaks".to_owned());
    }

    if user.verified && candidate.verified {
        reasons.push("Both verified students".to_owned());
    }

    reasons.truncate(MAX_REASONS);
    reasons
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::types::{Gender, GenderPreference, MatchPreferences};
    use chrono::Utc;
    use uuid::Uuid;

    fn profile(interests: &[&str]) -> Profile {
        Profile {
            id: Uuid::new_v4(),
            display_name: "Test".to_owned(),
            campus: "Pilani".to_owned(),
            branch: "CS".to_owned(),
            year: 2,
            age: None,
            gender: None,
            interests: interests.iter().map(|s| s.to_string()).collect(),
            preferences: MatchPreferences::default(),
            verified: true,
            is_active: true,
            last_seen: Utc::now(),
            streak_count: 3,
        }
    }

    #[test]
    fn interest_similarity_is_symmetric() {
        let a = profile(&["music", "gaming", "code"]).interests;
        let b = profile(&["music", "trekking"]).interests;
        assert_eq!(interest_similarity(&a, &b), interest_similarity(&b, &a));
    }

    #[test]
    fn interest_similarity_empty_set_is_zero() {
        let a = profile(&[]).interests;
        let b = profile(&["music", "gaming"]).interests;
        assert_eq!(interest_similarity(&a, &b), 0.0);
        assert_eq!(interest_similarity(&b, &a), 0.0);
        assert_eq!(interest_similarity(&a, &a), 0.0);
    }

    #[test]
    fn interest_bonus_caps_at_one() {
        // Identical 6-element sets: jaccard 1.0 + bonus 0.3, clamped.
        let a = profile(&["a", "b", "c", "d", "e", "f"]).interests;
        assert_eq!(interest_similarity(&a, &a), 1.0);
    }

    #[test]
    fn score_is_clamped_for_all_inputs() {
        let mut a = profile(&["music", "gaming", "code"]);
        let mut b = profile(&["music", "gaming", "code"]);
        a.streak_count = 1000;
        b.streak_count = 1000;
        let score = compatibility(
            &a,
            &b,
            ConnectionType::Friend,
            SimilarityPreference::Similar,
        );
        assert!((0.0..=1.0).contains(&score));
        assert_eq!(score, 1.0);
    }

    #[test]
    fn score_is_deterministic() {
        let a = profile(&["music", "gaming"]);
        let b = profile(&["music", "anime"]);
        for &ct in &[ConnectionType::Friend, ConnectionType::Date] {
            let first = compatibility(&a, &b, ct, SimilarityPreference::Similar);
            let second = compatibility(&a, &b, ct, SimilarityPreference::Similar);
            assert_eq!(first, second);
        }
    }

    #[test]
    fn worked_example_scores_exactly_one() {
        // A{music,gaming,code} vs B{music,gaming}, same campus/year/branch,
        // both verified+active, streak 3 each, friend context:
        // interests ~0.967, personality 0.88, activity/verification 1.0,
        // + streak bonus 0.2 pushes past 1.0 and clamps.
        let a = profile(&["music", "gaming", "code"]);
        let b = profile(&["music", "gaming"]);
        let score = compatibility(
            &a,
            &b,
            ConnectionType::Friend,
            SimilarityPreference::Similar,
        );
        assert_eq!(score, 1.0);
    }

    #[test]
    fn unknown_age_degrades_to_neutral() {
        let a = profile(&["music"]);
        let mut b = profile(&["music"]);
        b.age = Some(21);
        // One side unknown: age factor is the neutral 0.6, not an error.
        let score = personality_match(&a, &b, SimilarityPreference::Similar);
        let expected = 1.0 * 0.30 + 1.0 * 0.25 + 0.9 * 0.20 + 0.6 * 0.25;
        assert!((score - expected).abs() < 1e-12);
    }

    #[test]
    fn opposites_caps_personality_at_one() {
        let a = profile(&[]);
        let mut b = profile(&[]);
        b.branch = "EEE".to_owned();
        let score = personality_match(&a, &b, SimilarityPreference::Opposites);
        assert!(score <= 1.0);
        // Scaled blend plus diversity bonus.
        let blended = 1.0 * 0.30 + 1.0 * 0.25 + 0.7 * 0.20 + 0.6 * 0.25;
        let expected = (blended * 0.8_f64 + 0.2).min(1.0);
        assert!((score - expected).abs() < 1e-12);
    }

    #[test]
    fn gender_gate_is_symmetric() {
        let mut a = profile(&[]);
        let mut b = profile(&[]);
        a.gender = Some(Gender::Male);
        a.preferences.gender_preference = GenderPreference::Female;
        b.gender = Some(Gender::Female);
        b.preferences.gender_preference = GenderPreference::Male;
        assert!(gender_compatible(&a, &b));
        assert!(gender_compatible(&b, &a));

        b.preferences.gender_preference = GenderPreference::Female;
        assert_eq!(gender_compatible(&a, &b), gender_compatible(&b, &a));
        assert!(!gender_compatible(&a, &b));
    }

    #[test]
    fn gender_any_on_either_side_is_compatible() {
        let mut a = profile(&[]);
        let mut b = profile(&[]);
        a.gender = Some(Gender::Male);
        a.preferences.gender_preference = GenderPreference::Any;
        b.gender = None;
        b.preferences.gender_preference = GenderPreference::Male;
        assert!(gender_compatible(&a, &b));
        assert!(gender_compatible(&b, &a));
    }

    #[test]
    fn unset_gender_fails_concrete_preferences() {
        let mut a = profile(&[]);
        let mut b = profile(&[]);
        a.gender = None;
        a.preferences.gender_preference = GenderPreference::Female;
        b.gender = Some(Gender::Female);
        b.preferences.gender_preference = GenderPreference::Male;
        assert!(!gender_compatible(&a, &b));
    }

    #[test]
    fn reasons_follow_evaluation_order_and_cap_at_four() {
        let a = profile(&["music", "gaming", "code", "anime"]);
        let b = profile(&["music", "gaming", "code", "anime"]);
        let reasons = match_reasons(&a, &b);
        assert_eq!(reasons.len(), 4);
        assert_eq!(reasons[0], "Both at BITS Pilani");
        assert_eq!(reasons[1], "Same academic year");
        assert_eq!(reasons[2], "Both studying CS");
        assert_eq!(reasons[3], "Share 4 common interests");
    }

    #[test]
    fn different_branch_yields_complementary_reason() {
        let a = profile(&[]);
        let mut b = profile(&[]);
        b.branch = "Mech".to_owned();
        let reasons = match_reasons(&a, &b);
        assert!(
            reasons
                .iter()
                .any(|r| r == "Complementary academic backgrounds")
        );
    }

    #[test]
    fn few_common_interests_are_named() {
        let a = profile(&["music", "trekking", "x"]);
        let mut b = profile(&["music", "trekking", "y"]);
        b.campus = "Goa".to_owned();
        b.branch = "Mech".to_owned();
        b.year = 4;
        let reasons = match_reasons(&a, &b);
        assert!(reasons.iter().any(|r| r == "Share interests in music, trekking"));
    }
}
