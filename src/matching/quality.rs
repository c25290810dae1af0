//! Message-quality heuristic gating the per-conversation quota.
//!
//! Every message costs one of five quota slots, so low-effort one-liners are
//! rejected before they count. The heuristic always returns a value in [0, 1]
//! for any input, empty strings included.

use regex::Regex;
use std::sync::LazyLock;

/// Messages scoring below this are rejected without consuming quota. A hard
/// business rule, not advisory.
pub const SEND_THRESHOLD: f64 = 0.3;

/// Fixed cap on quality-gated messages per sender per conversation. Once
/// reached, sending is blocked and external-platform handoff is suggested.
/// There is no decrement or reset.
pub const MESSAGE_LIMIT: i32 = 5;

/// Characters at which the length component saturates.
const LENGTH_TARGET: f64 = 50.0;
/// Word count at which the word component saturates.
const WORD_TARGET: f64 = 10.0;
/// Anything this short is low-effort regardless of content.
const TRIVIAL_LEN: usize = 3;

const LOW_EFFORT_SCORE: f64 = 0.2;
const QUESTION_BONUS: f64 = 0.2;

/// Trivial greetings, acknowledgments, and laughter tokens.
static LOW_EFFORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(hi+|hey+|hell*o+|yo+|sup|wassup|ok+|okay+|hm+|lo+l|lmao+|rofl|haha[ha]*|hehe[he]*|nice|cool|good|fine|great|yes|yep|no|nope|yeah+|nah+|k|kk|thanks|thx|ty|wyd|wbu|hbu|idk|gm|gn)[.!?\s]*$",
    )
    .unwrap()
});

/// Score a candidate message in [0, 1].
///
/// Blend of length, word count, and an effort gate, plus a flat bonus for
/// asking a question. Deterministic and total over all strings.
pub fn message_quality(text: &str) -> f64 {
    let trimmed = text.trim();

    let length_score = (trimmed.chars().count() as f64 / LENGTH_TARGET).min(1.0);
    let word_score = (trimmed.split_whitespace().count() as f64 / WORD_TARGET).min(1.0);

    let low_effort = trimmed.chars().count() <= TRIVIAL_LEN || LOW_EFFORT_RE.is_match(trimmed);
    let effort_score = if low_effort { LOW_EFFORT_SCORE } else { 1.0 };

    let question_bonus = if trimmed.contains('?') {
        QUESTION_BONUS
    } else {
        0.0
    };

    (length_score * 0.4 + word_score * 0.4 + effort_score * 0.2 + question_bonus).min(1.0)
}

/// Whether a message clears the send gate.
pub fn passes_send_gate(text: &str) -> bool {
    message_quality(text) >= SEND_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trivial_messages_fall_below_the_gate() {
        for msg in ["hi", "ok", "lol", "k", "yo", "..", ""] {
            let score = message_quality(msg);
            assert!(
                score <= SEND_THRESHOLD,
                "{msg:?} scored {score}, expected <= {SEND_THRESHOLD}"
            );
            assert!(!passes_send_gate(msg));
        }
    }

    #[test]
    fn substantial_question_scores_well() {
        // 60 characters, 12 words, contains a question mark.
        let msg = "So which fest event are you most excited for this sem then?;";
        assert_eq!(msg.chars().count(), 60);
        assert_eq!(msg.split_whitespace().count(), 12);
        let score = message_quality(msg);
        assert!(score > 0.5, "scored {score}");
        assert!(passes_send_gate(msg));
    }

    #[test]
    fn score_is_always_bounded() {
        for msg in [
            "",
            "?",
            "hahahaha",
            "a very long message that rambles on and on about campus life, fests, and everything in between, does it cap?",
        ] {
            let score = message_quality(msg);
            assert!((0.0..=1.0).contains(&score), "{msg:?} scored {score}");
        }
    }

    #[test]
    fn question_bonus_is_flat() {
        let without = message_quality("I really liked that talk on distributed systems today");
        let with = message_quality("I really liked that talk on distributed systems today?");
        assert!(with > without);
        assert!(with <= 1.0);
    }

    #[test]
    fn laughter_variants_are_low_effort() {
        for msg in ["haha", "hahaha", "hehe", "lmaooo", "looool"] {
            let score = message_quality(msg);
            assert!(score < 0.5, "{msg:?} scored {score}");
        }
    }

    #[test]
    fn whitespace_padding_does_not_help() {
        assert_eq!(message_quality("  hi  "), message_quality("hi"));
    }
}
