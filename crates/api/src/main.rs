use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use invoicer_api::config::{LogFormat, ServerConfig};
use invoicer_api::router::build_app_router;
use invoicer_api::state::AppState;
use invoicer_api::ws;
use invoicer_inventory::HttpGateway;

/// Poll interval while waiting for jobs to drain on shutdown.
const DRAIN_POLL: Duration = Duration::from_millis(100);

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Configuration ---
    let config = ServerConfig::from_env();

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "invoicer_api=debug,invoicer_engine=debug,invoicer_inventory=debug,tower_http=debug".into()
    });
    let subscriber = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => subscriber
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => subscriber.with(tracing_subscriber::fmt::layer()).init(),
    }

    tracing::info!(
        host = %config.host,
        port = %config.port,
        profiles = %config.profiles_path.display(),
        inventory_api = %config.inventory_api_url,
        "Loaded server configuration",
    );

    // --- Inventory gateway ---
    let gateway = HttpGateway::new(config.inventory_api_url.clone(), config.gateway_timeout())
        .expect("Failed to build inventory HTTP client");

    // --- App state ---
    let state = AppState::new(config.clone(), Arc::new(gateway));
    let registry = Arc::clone(&state.registry);
    let ws_manager = Arc::clone(&state.ws_manager);

    // --- Heartbeat ---
    let heartbeat_handle = ws::start_heartbeat(Arc::clone(&ws_manager));

    // --- Router ---
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

    // Open WebSocket connections keep the server alive, so they are closed
    // as soon as the signal arrives rather than after `serve` returns.
    let shutdown_registry = Arc::clone(&registry);
    let shutdown_ws = Arc::clone(&ws_manager);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let ended = shutdown_registry.end_all();
            tracing::info!(ended, "Ended running jobs");
            shutdown_ws.shutdown_all().await;
        })
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    let drain_deadline = Duration::from_secs(config.shutdown_timeout_secs);
    let drained = tokio::time::timeout(drain_deadline, async {
        while !registry.is_empty() {
            tokio::time::sleep(DRAIN_POLL).await;
        }
    })
    .await
    .is_ok();
    if drained {
        tracing::info!("All jobs finished");
    } else {
        tracing::warn!(remaining = registry.len(), "Jobs still running at shutdown deadline");
    }

    heartbeat_handle.abort();
    tracing::info!("Heartbeat task stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
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
