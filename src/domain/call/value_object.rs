//! Call value objects

use serde::{Deserialize, Serialize};
use std::fmt;

/// Call session state
///
/// Idle has no variant: a pair of users without a session is idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallState {
    /// Offer forwarded to the callee, waiting for an answer
    Ringing,
    /// Callee answered, both sides are negotiating or in media
    Active,
}

impl CallState {
    /// Check if state transition is valid
    pub fn can_transition_to(&self, new_state: &CallState) -> bool {
        matches!((self, new_state), (CallState::Ringing, CallState::Active))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CallState::Ringing => "ringing",
            CallState::Active => "active",
        }
    }
}

impl fmt::Display for CallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reason a session was torn down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// A participant sent an explicit end
    Hangup,
    /// The callee (or caller, while ringing) refused
    Rejected,
    /// A participant's connection went away
    Disconnected,
    /// Nobody answered within the configured ring timeout
    RingTimeout,
}

impl EndReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndReason::Hangup => "hangup",
            EndReason::Rejected => "rejected",
            EndReason::Disconnected => "disconnected",
            EndReason::RingTimeout => "ring_timeout",
        }
    }
}
