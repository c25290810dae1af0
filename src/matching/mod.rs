//! The matching engine: candidate filtering, compatibility scoring, ranking,
//! daily-match selection, and the message-quality heuristic.
//!
//! Pure and synchronous throughout. Safe to call concurrently; there is no
//! shared mutable state anywhere in this tree.

pub mod filter;
pub mod quality;
pub mod ranker;
pub mod scoring;
pub mod types;

/// Stamped onto persisted daily-match rows so scoring changes can be
/// distinguished in historical data.
pub const ALGORITHM_VERSION: &str = "2.0";
