//! API Router configuration

use super::metrics_handler::metrics_handler;
use super::presence_handler::{get_active_calls, get_online_users, health_check, AppState};
use super::webrtc_signaling::signaling_handler;
use axum::{
    http::{HeaderValue, Method},
    routing::get,
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Build the API router
pub fn build_router(
    state: AppState,
    prometheus_handle: Option<PrometheusHandle>,
    cors_origins: &[String],
) -> Router {
    // Health check route
    let health_routes = Router::new().route("/health", get(health_check));

    // Presence and call inspection routes
    let presence_routes = Router::new()
        .route("/presence", get(get_online_users))
        .route("/calls", get(get_active_calls));

    // Signaling socket
    let signaling_routes = Router::new().route("/signaling", get(signaling_handler));

    let mut router = Router::new()
        .merge(health_routes)
        .merge(presence_routes)
        .merge(signaling_routes)
        .with_state(state);

    // Metrics route (separate state)
    if let Some(handle) = prometheus_handle {
        let metrics_routes = Router::new()
            .route("/metrics", get(metrics_handler))
            .with_state(handle);
        router = router.merge(metrics_routes);
    }

    router
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET])
        .allow_headers(Any)
}
