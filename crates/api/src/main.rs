use std::net::SocketAddr;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use upback_api::config::ServerConfig;
use upback_api::router::build_app_router;
use upback_api::state::AppState;

/// Upper bound on waiting for the scheduler loop after cancellation.
const SCHEDULER_STOP_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "upback_api=debug,upback_sync=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        backups_root = %config.sync.backups_root.display(),
        "Loaded server configuration"
    );

    // --- Database ---
    let pool = upback_db::create_pool(&config.database_url)
        .await
        .expect("Failed to open database");
    tracing::info!("Database connection pool created");

    upback_db::health_check(&pool)
        .await
        .expect("Database health check failed");

    upback_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    std::fs::create_dir_all(&config.sync.backups_root).expect("Failed to create backups root");

    // --- Engine ---
    let state = AppState::new(pool, config.clone());

    let jobs = state
        .scheduler
        .reload()
        .await
        .expect("Failed to load backup jobs");
    tracing::info!(jobs, "Backup jobs loaded");

    let shutdown = state.shutdown.clone();
    let scheduler_handle = state.scheduler.start(shutdown.clone());

    // --- Router ---
    let coordinator = state.coordinator.clone();
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown({
            let shutdown = shutdown.clone();
            async move {
                shutdown_signal().await;
                // Ends the scheduler loop and every open SSE stream.
                shutdown.cancel();
            }
        })
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    shutdown.cancel();
    let _ = tokio::time::timeout(SCHEDULER_STOP_TIMEOUT, scheduler_handle).await;
    tracing::info!("Cron scheduler stopped");

    coordinator.shutdown();

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
