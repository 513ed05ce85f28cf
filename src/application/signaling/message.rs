//! Signaling wire messages
//!
//! Negotiation payloads (`offer`, `answer`) and profile metadata
//! (`caller_meta`, `rejector_meta`) are arbitrary JSON and are relayed
//! verbatim.

use crate::domain::call::EndReason;
use crate::domain::presence::PresenceEntry;
use crate::domain::shared::value_objects::{CallId, ConnectionId, UserId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Messages a client sends to the relay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Announce presence under a user identity
    Join {
        identity: String,
        #[serde(default)]
        display_name: String,
    },
    /// Ring `target` with an offer
    CallRequest {
        target: UserId,
        offer: Value,
        #[serde(default)]
        caller_meta: Value,
    },
    /// Accept a ringing call from `target`
    CallAnswer { target: UserId, answer: Value },
    /// Refuse the call with `target`
    CallReject {
        target: UserId,
        #[serde(default)]
        rejector_meta: Value,
    },
    /// Hang up the call with `target`
    CallEnd { target: UserId },
}

/// Public view of an online user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceUser {
    pub identity: UserId,
    pub display_name: String,
}

impl From<&PresenceEntry> for PresenceUser {
    fn from(entry: &PresenceEntry) -> Self {
        Self {
            identity: entry.identity.clone(),
            display_name: entry.display_name.clone(),
        }
    }
}

/// Messages the relay sends to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// First message on every connection
    Welcome { connection_id: ConnectionId },
    /// Full list of online users, sent to everyone after a join or leave
    PresenceUpdate { users: Vec<PresenceUser> },
    /// Incoming call
    CallOffer {
        call_id: CallId,
        caller: UserId,
        caller_name: String,
        offer: Value,
        caller_meta: Value,
    },
    /// The callee is not online
    CallUnreachable { target: UserId, reason: String },
    /// The callee is already in a call
    CallBusy { target: UserId, reason: String },
    /// Someone tried to call while this user was busy
    BusyNotice { caller: UserId, caller_meta: Value },
    /// The callee answered
    CallAccepted {
        call_id: CallId,
        callee: UserId,
        answer: Value,
    },
    /// The other party refused the call
    CallRejected {
        call_id: CallId,
        rejector: UserId,
        rejector_meta: Value,
    },
    /// The call is over
    CallEnded {
        call_id: CallId,
        peer: UserId,
        reason: EndReason,
    },
    /// Negative acknowledgment for the last request
    Error { code: String, message: String },
}

impl ServerMessage {
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        ServerMessage::Error {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn presence_update(entries: &[PresenceEntry]) -> Self {
        ServerMessage::PresenceUpdate {
            users: entries.iter().map(PresenceUser::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_join() {
        let msg: ClientMessage = serde_json::from_value(json!({
            "type": "join",
            "identity": "alice",
            "display_name": "Alice"
        }))
        .unwrap();

        assert_eq!(
            msg,
            ClientMessage::Join {
                identity: "alice".to_string(),
                display_name: "Alice".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_call_request_keeps_payload_opaque() {
        let msg: ClientMessage = serde_json::from_value(json!({
            "type": "call_request",
            "target": "bob",
            "offer": {"type": "offer", "sdp": "v=0\r\n"}
        }))
        .unwrap();

        match msg {
            ClientMessage::CallRequest {
                target,
                offer,
                caller_meta,
            } => {
                assert_eq!(target, UserId::new("bob"));
                assert_eq!(offer["sdp"], "v=0\r\n");
                assert_eq!(caller_meta, Value::Null);
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let result: Result<ClientMessage, _> =
            serde_json::from_value(json!({"type": "teleport", "target": "bob"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_server_message_tagging() {
        let value = serde_json::to_value(ServerMessage::error("NOT_JOINED", "join first")).unwrap();
        assert_eq!(value["type"], "error");
        assert_eq!(value["code"], "NOT_JOINED");

        let value = serde_json::to_value(ServerMessage::CallEnded {
            call_id: CallId::new(),
            peer: UserId::new("bob"),
            reason: EndReason::Disconnected,
        })
        .unwrap();
        assert_eq!(value["type"], "call_ended");
        assert_eq!(value["peer"], "bob");
        assert_eq!(value["reason"], "disconnected");
    }
}
