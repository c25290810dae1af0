//! Web API router construction.

use axum::{
    Router,
    routing::{get, post},
};

use std::time::Duration;

use crate::state::AppState;
use crate::web::middleware::request_id::RequestIdLayer;
use crate::web::{
    connections, daily_match, matches, messages, notifications, reports, ships, status,
};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;

/// Creates the web server router
pub fn create_router(app_state: AppState) -> Router {
    let api_router = Router::new()
        .route("/health", get(status::health))
        .route("/status", get(status::status))
        .route("/matches", get(matches::get_matches))
        .route("/daily-match", get(daily_match::get_daily_match))
        .route("/daily-match/streak", get(daily_match::get_streak))
        .route("/daily-match/history", get(daily_match::get_history))
        .route("/daily-match/stats", get(daily_match::get_stats))
        .route("/daily-match/{id}/action", post(daily_match::record_action))
        .route(
            "/connections",
            get(connections::list).post(connections::create_connection),
        )
        .route("/connections/{id}/accept", post(connections::accept))
        .route("/connections/{id}/decline", post(connections::decline))
        .route("/users/{id}/block", post(connections::block))
        .route(
            "/connections/{id}/messages",
            get(messages::list_messages).post(messages::send_message),
        )
        .route("/connections/{id}/messages/read", post(messages::mark_read))
        .route("/connections/{id}/messages/limit", get(messages::get_limit))
        .route("/ships", post(ships::create_ship))
        .route("/ships/sent", get(ships::list_sent))
        .route("/ships/received", get(ships::list_received))
        .route("/ships/stats", get(ships::get_stats))
        .route("/ships/{id}/respond", post(ships::respond))
        .route("/reports", get(reports::list_reports).post(reports::create_report))
        .route("/notifications", get(notifications::list))
        .route(
            "/notifications/{id}/read",
            post(notifications::mark_read),
        );

    let router = Router::new()
        .nest("/api", api_router)
        .with_state(app_state);

    router.layer((
        // Outermost: per-request ID span + severity-proportional response logging.
        RequestIdLayer,
        CorsLayer::permissive(),
        // Compress API responses (gzip/brotli/zstd).
        CompressionLayer::new()
            .zstd(true)
            .br(true)
            .gzip(true)
            .quality(tower_http::CompressionLevel::Fastest),
        TimeoutLayer::new(Duration::from_secs(30)),
    ))
}
