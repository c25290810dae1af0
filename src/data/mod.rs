//! Database models and queries.

pub mod connections;
pub mod daily_matches;
pub mod messages;
pub mod notifications;
pub mod profiles;
pub mod reports;
pub mod ships;
