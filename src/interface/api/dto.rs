//! API DTOs

use crate::domain::call::CallSession;
use crate::domain::presence::PresenceEntry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Generic API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// Online user
#[derive(Debug, Serialize, Deserialize)]
pub struct OnlineUserResponse {
    pub identity: String,
    pub display_name: String,
    pub joined_at: DateTime<Utc>,
}

impl From<PresenceEntry> for OnlineUserResponse {
    fn from(entry: PresenceEntry) -> Self {
        Self {
            identity: entry.identity.to_string(),
            display_name: entry.display_name,
            joined_at: entry.joined_at,
        }
    }
}

/// Online users list response
#[derive(Debug, Serialize, Deserialize)]
pub struct PresenceListResponse {
    pub users: Vec<OnlineUserResponse>,
    pub total: usize,
}

/// Call session
#[derive(Debug, Serialize, Deserialize)]
pub struct CallResponse {
    pub call_id: String,
    pub caller: String,
    pub callee: String,
    pub state: String,
    pub created_at: DateTime<Utc>,
    pub answered_at: Option<DateTime<Utc>>,
}

impl From<CallSession> for CallResponse {
    fn from(session: CallSession) -> Self {
        Self {
            call_id: session.id().to_string(),
            caller: session.caller().to_string(),
            callee: session.callee().to_string(),
            state: session.state().as_str().to_string(),
            created_at: session.created_at(),
            answered_at: session.answered_at(),
        }
    }
}

/// Active calls list response
#[derive(Debug, Serialize, Deserialize)]
pub struct ActiveCallsResponse {
    pub calls: Vec<CallResponse>,
    pub total: usize,
}
