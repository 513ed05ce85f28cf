//! Presence registry
//!
//! Single source of truth for who is online and which live connection
//! currently reaches them. At most one entry exists per identity; a later
//! join for the same identity takes over the entry ("last join wins") and
//! removal is always keyed by connection so a late disconnect of a
//! superseded link can never evict the reconnected user.

use crate::domain::shared::value_objects::{ConnectionId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One user currently known to be online
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceEntry {
    pub identity: UserId,
    pub display_name: String,
    pub connection: ConnectionId,
    pub joined_at: DateTime<Utc>,
}

/// Outcome of a join
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Identity was not online before
    Joined,
    /// Identity was online on another connection, which is now superseded
    Reconnected { previous: ConnectionId },
    /// Same identity on the same connection joined again
    Refreshed,
}

/// Presence registry, keyed by identity with a reverse index on connection
#[derive(Debug, Default)]
pub struct PresenceRegistry {
    entries: HashMap<UserId, PresenceEntry>,
    by_connection: HashMap<ConnectionId, UserId>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or re-register a user on `connection`
    pub fn join(
        &mut self,
        identity: UserId,
        display_name: String,
        connection: ConnectionId,
    ) -> JoinOutcome {
        let entry = PresenceEntry {
            identity: identity.clone(),
            display_name,
            connection,
            joined_at: Utc::now(),
        };

        let outcome = match self.entries.insert(identity.clone(), entry) {
            None => JoinOutcome::Joined,
            Some(old) if old.connection == connection => JoinOutcome::Refreshed,
            Some(old) => {
                self.by_connection.remove(&old.connection);
                JoinOutcome::Reconnected {
                    previous: old.connection,
                }
            }
        };

        self.by_connection.insert(connection, identity);
        outcome
    }

    /// Remove the entry whose current connection is `connection`.
    ///
    /// Returns `None` when no entry points at this connection any more,
    /// which covers duplicate and superseded disconnects.
    pub fn leave(&mut self, connection: &ConnectionId) -> Option<PresenceEntry> {
        let identity = self.by_connection.remove(connection)?;
        match self.entries.get(&identity) {
            Some(entry) if entry.connection == *connection => self.entries.remove(&identity),
            _ => None,
        }
    }

    /// Current connection of `identity`
    pub fn resolve(&self, identity: &UserId) -> Option<ConnectionId> {
        self.entries.get(identity).map(|entry| entry.connection)
    }

    pub fn is_online(&self, identity: &UserId) -> bool {
        self.entries.contains_key(identity)
    }

    pub fn get(&self, identity: &UserId) -> Option<&PresenceEntry> {
        self.entries.get(identity)
    }

    /// Online users ordered by identity
    pub fn online_users(&self) -> Vec<PresenceEntry> {
        let mut users: Vec<PresenceEntry> = self.entries.values().cloned().collect();
        users.sort_by(|a, b| a.identity.cmp(&b.identity));
        users
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.by_connection.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> UserId {
        UserId::new("alice")
    }

    #[test]
    fn test_join_and_resolve() {
        let mut registry = PresenceRegistry::new();
        let conn = ConnectionId::new();

        let outcome = registry.join(alice(), "Alice".to_string(), conn);
        assert_eq!(outcome, JoinOutcome::Joined);
        assert_eq!(registry.resolve(&alice()), Some(conn));
        assert!(registry.is_online(&alice()));
    }

    #[test]
    fn test_reconnect_wins() {
        let mut registry = PresenceRegistry::new();
        let first = ConnectionId::new();
        let second = ConnectionId::new();

        registry.join(alice(), "Alice".to_string(), first);
        let outcome = registry.join(alice(), "Alice".to_string(), second);

        assert_eq!(outcome, JoinOutcome::Reconnected { previous: first });
        assert_eq!(registry.resolve(&alice()), Some(second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_stale_leave_does_not_evict_reconnected_user() {
        let mut registry = PresenceRegistry::new();
        let first = ConnectionId::new();
        let second = ConnectionId::new();

        registry.join(alice(), "Alice".to_string(), first);
        registry.join(alice(), "Alice".to_string(), second);

        assert!(registry.leave(&first).is_none());
        assert_eq!(registry.resolve(&alice()), Some(second));
    }

    #[test]
    fn test_leave_is_idempotent() {
        let mut registry = PresenceRegistry::new();
        let conn = ConnectionId::new();
        registry.join(alice(), "Alice".to_string(), conn);

        let removed = registry.leave(&conn);
        assert_eq!(removed.map(|e| e.identity), Some(alice()));
        assert!(registry.leave(&conn).is_none());
        assert!(!registry.is_online(&alice()));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_rejoin_on_same_connection_refreshes_display_name() {
        let mut registry = PresenceRegistry::new();
        let conn = ConnectionId::new();
        registry.join(alice(), "Alice".to_string(), conn);

        let outcome = registry.join(alice(), "Alice Liddell".to_string(), conn);
        assert_eq!(outcome, JoinOutcome::Refreshed);
        assert_eq!(registry.get(&alice()).unwrap().display_name, "Alice Liddell");
    }

    #[test]
    fn test_resolve_tracks_most_recent_surviving_join() {
        let mut registry = PresenceRegistry::new();
        let conns: Vec<ConnectionId> = (0..4).map(|_| ConnectionId::new()).collect();

        for conn in &conns {
            registry.join(alice(), "Alice".to_string(), *conn);
        }
        // Disconnects of every superseded link arrive late
        for conn in &conns[..3] {
            registry.leave(conn);
        }
        assert_eq!(registry.resolve(&alice()), Some(conns[3]));

        registry.leave(&conns[3]);
        assert_eq!(registry.resolve(&alice()), None);
    }

    #[test]
    fn test_online_users_sorted() {
        let mut registry = PresenceRegistry::new();
        registry.join(UserId::new("carol"), "Carol".to_string(), ConnectionId::new());
        registry.join(UserId::new("bob"), "Bob".to_string(), ConnectionId::new());
        registry.join(alice(), "Alice".to_string(), ConnectionId::new());

        let names: Vec<String> = registry
            .online_users()
            .into_iter()
            .map(|e| e.identity.to_string())
            .collect();
        assert_eq!(names, vec!["alice", "bob", "carol"]);
    }

    #[test]
    fn test_clear() {
        let mut registry = PresenceRegistry::new();
        let conn = ConnectionId::new();
        registry.join(alice(), "Alice".to_string(), conn);
        registry.clear();
        assert!(registry.is_empty());
        assert!(registry.leave(&conn).is_none());
    }
}
