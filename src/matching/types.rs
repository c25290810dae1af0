//! Plain data types consumed and produced by the matching engine.
//!
//! The engine is pure: callers load profiles and exclusion sets from the
//! database up front (see `crate::data::profiles`) and pass them in as
//! arguments. Nothing in this module tree performs I/O.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Self-reported gender, stored as text. The `as_str`/`parse` pair is the
/// single wire representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
    NonBinary,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::NonBinary => "non_binary",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "male" => Some(Gender::Male),
            "female" => Some(Gender::Female),
            "non_binary" | "nonbinary" => Some(Gender::NonBinary),
            _ => None,
        }
    }
}

/// Who a user wants to be shown in romantic contexts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenderPreference {
    Male,
    Female,
    #[default]
    Any,
}

impl GenderPreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenderPreference::Male => "male",
            GenderPreference::Female => "female",
            GenderPreference::Any => "any",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "male" => Some(GenderPreference::Male),
            "female" => Some(GenderPreference::Female),
            "any" => Some(GenderPreference::Any),
            _ => None,
        }
    }

    /// Whether a candidate's actual gender satisfies this preference.
    pub fn accepts(&self, gender: Option<Gender>) -> bool {
        match self {
            GenderPreference::Any => true,
            GenderPreference::Male => gender == Some(Gender::Male),
            GenderPreference::Female => gender == Some(Gender::Female),
        }
    }
}

/// Similar-minded vs. opposites-attract. Stored as +1 / -1 in the DB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimilarityPreference {
    #[default]
    Similar,
    Opposites,
}

impl SimilarityPreference {
    pub fn from_sign(v: i16) -> Self {
        if v < 0 {
            SimilarityPreference::Opposites
        } else {
            SimilarityPreference::Similar
        }
    }
}

/// The two discovery contexts. Weighting and acceptance thresholds differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionType {
    Friend,
    Date,
}

impl ConnectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionType::Friend => "friend",
            ConnectionType::Date => "date",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "friend" => Some(ConnectionType::Friend),
            "date" => Some(ConnectionType::Date),
            _ => None,
        }
    }
}

/// Explicit matching preferences from the user's settings page.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchPreferences {
    pub connect_similarity: SimilarityPreference,
    pub dating_similarity: SimilarityPreference,
    pub gender_preference: GenderPreference,
}

impl MatchPreferences {
    /// Similarity preference for the given discovery context.
    pub fn similarity_for(&self, connection_type: ConnectionType) -> SimilarityPreference {
        match connection_type {
            ConnectionType::Friend => self.connect_similarity,
            ConnectionType::Date => self.dating_similarity,
        }
    }
}

/// A fully-loaded user profile, the read-only input to all scoring.
///
/// `interests` are lowercased at load time; an empty set is valid and simply
/// contributes zero interest similarity.
#[derive(Debug, Clone)]
pub struct Profile {
    pub id: Uuid,
    pub display_name: String,
    pub campus: String,
    pub branch: String,
    pub year: i32,
    pub age: Option<i32>,
    pub gender: Option<Gender>,
    pub interests: HashSet<String>,
    pub preferences: MatchPreferences,
    pub verified: bool,
    pub is_active: bool,
    pub last_seen: DateTime<Utc>,
    pub streak_count: i32,
}

/// Drives both candidate filtering and scoring-weight selection.
#[derive(Debug, Clone, Copy)]
pub struct MatchingCriteria {
    pub user_id: Uuid,
    pub connection_type: ConnectionType,
    pub similarity: SimilarityPreference,
    pub max_results: usize,
}

impl MatchingCriteria {
    /// Reject malformed criteria up front rather than silently clamping.
    pub fn validate(&self) -> Result<(), MatchError> {
        if self.max_results == 0 {
            return Err(MatchError::InvalidCriteria(
                "max_results must be positive".to_owned(),
            ));
        }
        Ok(())
    }
}

/// A scored candidate, computed per request and never persisted (except when
/// a daily match snapshots one pairing).
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub candidate: Profile,
    pub compatibility_score: f64,
    pub match_reasons: Vec<String>,
}

/// Errors the matching pipeline can surface to callers.
///
/// An empty candidate pool or an all-below-threshold result is a valid empty
/// outcome, not an error; only genuinely unrecoverable conditions live here.
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    #[error("invalid matching criteria: {0}")]
    InvalidCriteria(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gender_text_round_trips() {
        for g in [Gender::Male, Gender::Female, Gender::NonBinary] {
            assert_eq!(Gender::parse(g.as_str()), Some(g));
        }
        assert_eq!(Gender::NonBinary.as_str(), "non_binary");
        // legacy rows written without the underscore still parse
        assert_eq!(Gender::parse("nonbinary"), Some(Gender::NonBinary));
    }

    #[test]
    fn criteria_validation_rejects_zero_results() {
        let criteria = MatchingCriteria {
            user_id: Uuid::new_v4(),
            connection_type: ConnectionType::Friend,
            similarity: SimilarityPreference::default(),
            max_results: 0,
        };
        assert!(matches!(
            criteria.validate(),
            Err(MatchError::InvalidCriteria(_))
        ));
    }
}
