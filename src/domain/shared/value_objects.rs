//! Shared value objects used across multiple bounded contexts

use super::error::{DomainError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Call identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallId(Uuid);

impl CallId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CallId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of one live client link.
///
/// Minted by the transport when a socket is accepted and never reused, so a
/// reconnecting user always shows up with a new value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable application user identity, as handed over by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Parse an identity coming off the wire.
    ///
    /// Surrounding whitespace is dropped; blank identities and identities
    /// longer than `max_len` characters are refused.
    pub fn parse(raw: &str, max_len: usize) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::ValidationError(
                "identity must not be empty".to_string(),
            ));
        }
        if trimmed.chars().count() > max_len {
            return Err(DomainError::ValidationError(format!(
                "identity longer than {} characters",
                max_len
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_parse_trims() {
        let id = UserId::parse("  alice  ", 64).unwrap();
        assert_eq!(id.as_str(), "alice");
    }

    #[test]
    fn test_user_id_parse_rejects_blank_and_long() {
        assert!(UserId::parse("   ", 64).is_err());
        assert!(UserId::parse("", 64).is_err());
        assert!(UserId::parse("abcdef", 5).is_err());
        assert!(UserId::parse("abcde", 5).is_ok());
    }

    #[test]
    fn test_connection_ids_are_unique() {
        assert_ne!(ConnectionId::new(), ConnectionId::new());
    }

    #[test]
    fn test_user_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&UserId::new("bob")).unwrap();
        assert_eq!(json, "\"bob\"");
    }
}
