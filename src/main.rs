use std::net::SocketAddr;
use tokio::signal;
use tracing::{error, info, warn};

use emopop_api::{
    build_router,
    config::Config,
    middleware::init_tracing,
    state::AppState,
};

#[tokio::main]
async fn main() {
    // Initialize structured logging
    if let Err(e) = init_tracing() {
        eprintln!("Failed to initialize tracing: {}", e);
        std::process::exit(1);
    }

    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(config) => {
            info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            error!("Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    let port = config.port;

    let state = match AppState::from_config(config) {
        Ok(state) => state.into_shared(),
        Err(e) => {
            error!("Failed to initialize application state: {:#}", e);
            std::process::exit(1);
        }
    };

    // The info endpoint must stay up even when the database is not, so a
    // failed bootstrap is logged and serving continues.
    match state.db.migrate().await {
        Ok(()) => {
            if let Err(e) = state.db.seed_emotions().await {
                warn!("Failed to seed emotions: {}", e);
            }
        }
        Err(e) => warn!("Database bootstrap skipped, data endpoints will fail until it is reachable: {}", e),
    }

    let app = match build_router(state) {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to build router: {:#}", e);
            std::process::exit(1);
        }
    };

    // Bind to all interfaces
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting server on {}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => {
            info!("Server listening on {}", addr);
            listener
        }
        Err(e) => {
            error!("Failed to bind to address {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    // Start the server with graceful shutdown handling
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", e);
        std::process::exit(1);
    }

    info!("Server shutdown complete");
}

/// Graceful shutdown signal handler
/// Listens for SIGTERM and SIGINT signals
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal, initiating graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM signal, initiating graceful shutdown");
        },
    }
}
