use crate::config::Config;
use crate::state::{AppState, ServiceStatus};
use crate::web::create_router;
use anyhow::Context;
use figment::{Figment, providers::Env};
use sqlx::ConnectOptions;
use sqlx::postgres::PgPoolOptions;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Main application struct containing all necessary components
pub struct App {
    config: Arc<Config>,
    app_state: AppState,
}

impl App {
    /// Create a new App instance with all necessary components initialized
    pub async fn new() -> Result<Self, anyhow::Error> {
        // Load configuration
        let config: Config = Figment::new()
            .merge(Env::raw())
            .extract()
            .context("Failed to load config")?;
        let config = Arc::new(config);

        // Create database connection pool
        let connect_options = sqlx::postgres::PgConnectOptions::from_str(&config.database_url)
            .context("Failed to parse database URL")?
            .log_statements(tracing::log::LevelFilter::Debug)
            .log_slow_statements(tracing::log::LevelFilter::Warn, Duration::from_secs(1));

        let db_pool = PgPoolOptions::new()
            .min_connections(0)
            .max_connections(8)
            .acquire_timeout(Duration::from_secs(4))
            .idle_timeout(Duration::from_secs(60 * 2))
            .max_lifetime(Duration::from_secs(60 * 30))
            .connect_with(connect_options)
            .await
            .context("Failed to create database pool")?;

        info!(
            min_connections = 0,
            max_connections = 8,
            acquire_timeout = "4s",
            idle_timeout = "2m",
            max_lifetime = "30m",
            "database pool established"
        );

        // Run database migrations
        info!("Running database migrations...");
        sqlx::migrate!("./migrations")
            .run(&db_pool)
            .await
            .context("Failed to run database migrations")?;
        info!("Database migrations completed successfully");

        let app_state = AppState::new(db_pool, config.clone());
        app_state
            .service_statuses
            .set("database", ServiceStatus::Connected);

        match app_state.matchable_user_count().await {
            Ok(count) => info!(matchable_users = count, "user pool loaded"),
            Err(e) => warn!(error = ?e, "Failed to count matchable users (non-fatal)"),
        }

        Ok(App { config, app_state })
    }

    /// Bind the listener and serve the API until a shutdown signal arrives.
    pub async fn run(self) -> ExitCode {
        let router = create_router(self.app_state.clone());
        let addr = format!("{}:{}", self.config.host, self.config.port);

        let listener = match tokio::net::TcpListener::bind(&addr).await {
            Ok(listener) => listener,
            Err(e) => {
                error!(error = ?e, addr = %addr, "Failed to bind listener");
                return ExitCode::FAILURE;
            }
        };

        info!(addr = %addr, "web server listening");
        self.app_state
            .service_statuses
            .set("web", ServiceStatus::Active);

        let shutdown_timeout = Duration::from_secs(self.config.shutdown_timeout);
        let result = axum::serve(
            listener,
            router.into_make_service_with_connect_info::<std::net::SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal(shutdown_timeout))
        .await;

        match result {
            Ok(()) => {
                info!("web server stopped cleanly");
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!(error = ?e, "web server exited with error");
                ExitCode::FAILURE
            }
        }
    }
}

/// Resolves when SIGINT or SIGTERM arrives, after logging the grace window.
async fn shutdown_signal(grace: Duration) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
    info!(grace_seconds = grace.as_secs(), "draining in-flight requests");
}
