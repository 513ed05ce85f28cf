//! Presence and call inspection API handlers

use super::dto::{
    ActiveCallsResponse, ApiResponse, CallResponse, OnlineUserResponse, PresenceListResponse,
};
use crate::application::signaling::SignalingCoordinator;
use crate::infrastructure::identity::IdentityProvider;
use axum::{extract::State, Json};
use std::sync::Arc;
use tracing::debug;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<SignalingCoordinator>,
    /// Verifies socket credentials; `None` trusts the identity sent in `join`
    pub identity_provider: Option<Arc<dyn IdentityProvider>>,
}

impl AppState {
    pub fn new(coordinator: Arc<SignalingCoordinator>) -> Self {
        Self {
            coordinator,
            identity_provider: None,
        }
    }

    pub fn with_identity_provider(mut self, provider: Arc<dyn IdentityProvider>) -> Self {
        self.identity_provider = Some(provider);
        self
    }
}

/// Health check
pub async fn health_check() -> Json<ApiResponse<&'static str>> {
    Json(ApiResponse::success("OK"))
}

/// Get online users
pub async fn get_online_users(
    State(state): State<AppState>,
) -> Json<ApiResponse<PresenceListResponse>> {
    debug!("API: Getting online users");

    let users: Vec<OnlineUserResponse> = state
        .coordinator
        .online_users()
        .await
        .into_iter()
        .map(OnlineUserResponse::from)
        .collect();
    let total = users.len();

    Json(ApiResponse::success(PresenceListResponse { users, total }))
}

/// Get call sessions, ringing and active
pub async fn get_active_calls(
    State(state): State<AppState>,
) -> Json<ApiResponse<ActiveCallsResponse>> {
    debug!("API: Getting active calls");

    let calls: Vec<CallResponse> = state
        .coordinator
        .active_calls()
        .await
        .into_iter()
        .map(CallResponse::from)
        .collect();
    let total = calls.len();

    Json(ApiResponse::success(ActiveCallsResponse { calls, total }))
}
