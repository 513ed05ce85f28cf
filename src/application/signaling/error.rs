//! Signaling errors
//!
//! None of these are fatal to the relay. Each one is reported back to the
//! connection that issued the failing request and nowhere else.

use super::message::ServerMessage;
use crate::domain::shared::error::DomainError;
use crate::domain::shared::value_objects::UserId;
use thiserror::Error;

pub type SignalingResult<T> = std::result::Result<T, SignalingError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignalingError {
    #[error("{0} is not online")]
    UnreachableTarget(UserId),

    #[error("{0} is already in a call")]
    TargetBusy(UserId),

    #[error("already in a call")]
    CallerBusy,

    #[error("invalid join: {0}")]
    InvalidJoin(String),

    #[error("connection was superseded by a newer connection for the same user")]
    StaleConnection,

    #[error("connection has not joined yet")]
    NotJoined,

    #[error("no matching call with {0}")]
    NoSuchCall(UserId),

    #[error("cannot call yourself")]
    SelfCall,

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl SignalingError {
    /// Stable code carried in `error` frames
    pub fn code(&self) -> &'static str {
        match self {
            SignalingError::UnreachableTarget(_) => "UNREACHABLE_TARGET",
            SignalingError::TargetBusy(_) => "TARGET_BUSY",
            SignalingError::CallerBusy => "CALLER_BUSY",
            SignalingError::InvalidJoin(_) => "INVALID_JOIN",
            SignalingError::StaleConnection => "STALE_CONNECTION",
            SignalingError::NotJoined => "NOT_JOINED",
            SignalingError::NoSuchCall(_) => "NO_SUCH_CALL",
            SignalingError::SelfCall => "SELF_CALL",
            SignalingError::Domain(_) => "INVALID_STATE",
        }
    }

    /// Negative acknowledgment for the requesting connection
    pub fn to_message(&self) -> ServerMessage {
        match self {
            SignalingError::UnreachableTarget(target) => ServerMessage::CallUnreachable {
                target: target.clone(),
                reason: self.to_string(),
            },
            SignalingError::TargetBusy(target) => ServerMessage::CallBusy {
                target: target.clone(),
                reason: self.to_string(),
            },
            _ => ServerMessage::error(self.code(), self.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreachable_maps_to_call_unreachable() {
        let err = SignalingError::UnreachableTarget(UserId::new("bob"));
        match err.to_message() {
            ServerMessage::CallUnreachable { target, reason } => {
                assert_eq!(target, UserId::new("bob"));
                assert_eq!(reason, "bob is not online");
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_busy_maps_to_call_busy() {
        let err = SignalingError::TargetBusy(UserId::new("bob"));
        assert!(matches!(err.to_message(), ServerMessage::CallBusy { .. }));
    }

    #[test]
    fn test_other_errors_map_to_error_frame() {
        let msg = SignalingError::StaleConnection.to_message();
        match msg {
            ServerMessage::Error { code, .. } => assert_eq!(code, "STALE_CONNECTION"),
            other => panic!("unexpected message: {:?}", other),
        }
    }
}
