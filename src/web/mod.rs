//! Web API module for the bitspark application.

pub mod connections;
pub mod daily_match;
pub mod error;
pub mod matches;
pub mod messages;
pub mod middleware;
pub mod notifications;
pub mod reports;
pub mod routes;
pub mod ships;
pub mod status;

pub use routes::*;
