use callrelay::application::signaling::SignalingCoordinator;
use callrelay::config::Config;
use callrelay::infrastructure::identity::{IdentityProvider, StaticTokenProvider};
use callrelay::infrastructure::metrics::init_metrics;
use callrelay::interface::api::{build_router, AppState};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::load()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting callrelay signaling server");
    info!("Configuration loaded: {:?}", config.server);

    // Initialize metrics exporter
    let prometheus_handle = match init_metrics() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!("Prometheus exporter unavailable: {}", e);
            None
        }
    };

    let coordinator = Arc::new(SignalingCoordinator::new(config.signaling.clone()));
    if let Some(timeout) = config.signaling.ring_timeout() {
        info!("Unanswered calls end after {:?}", timeout);
    }

    let mut state = AppState::new(coordinator.clone());
    if config.auth.enabled {
        let provider = StaticTokenProvider::from_config(&config.auth);
        if provider.is_empty() {
            warn!("Authentication enabled but no tokens configured, every connection will be refused");
        }
        info!("Token authentication enabled ({} tokens)", provider.len());
        let provider: Arc<dyn IdentityProvider> = Arc::new(provider);
        state = state.with_identity_provider(provider);
    }

    let app = build_router(state, prometheus_handle, &config.server.cors_origins);

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(coordinator))
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Wait for Ctrl-C, then drop all signaling state so open sockets close
async fn shutdown_signal(coordinator: Arc<SignalingCoordinator>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutting down...");
    coordinator.shutdown().await;
}
