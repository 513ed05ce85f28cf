//! In-memory call session table

use crate::domain::call::aggregate::CallSession;
use crate::domain::shared::error::{DomainError, Result};
use crate::domain::shared::value_objects::{CallId, UserId};
use std::collections::HashMap;

/// Sessions keyed by id, plus one lookup entry per participant.
///
/// Every identity maps to at most one session; `insert` refuses a session
/// whose caller or callee is already taken.
#[derive(Debug, Default)]
pub struct SessionTable {
    sessions: HashMap<CallId, CallSession>,
    by_user: HashMap<UserId, CallId>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, session: CallSession) -> Result<CallId> {
        for participant in [session.caller(), session.callee()] {
            if self.by_user.contains_key(participant) {
                return Err(DomainError::Conflict(format!(
                    "{} already participates in a call",
                    participant
                )));
            }
        }

        let id = *session.id();
        self.by_user.insert(session.caller().clone(), id);
        self.by_user.insert(session.callee().clone(), id);
        self.sessions.insert(id, session);
        Ok(id)
    }

    pub fn is_busy(&self, identity: &UserId) -> bool {
        self.by_user.contains_key(identity)
    }

    pub fn get(&self, id: &CallId) -> Option<&CallSession> {
        self.sessions.get(id)
    }

    pub fn get_mut(&mut self, id: &CallId) -> Option<&mut CallSession> {
        self.sessions.get_mut(id)
    }

    pub fn find_by_user(&self, identity: &UserId) -> Option<&CallSession> {
        self.by_user
            .get(identity)
            .and_then(|id| self.sessions.get(id))
    }

    /// Session joining `a` and `b`, whichever of them placed the call
    pub fn find_between(&self, a: &UserId, b: &UserId) -> Option<&CallSession> {
        self.find_by_user(a).filter(|session| session.is_between(a, b))
    }

    pub fn remove(&mut self, id: &CallId) -> Option<CallSession> {
        let session = self.sessions.remove(id)?;
        self.by_user.remove(session.caller());
        self.by_user.remove(session.callee());
        Some(session)
    }

    pub fn remove_by_user(&mut self, identity: &UserId) -> Option<CallSession> {
        let id = *self.by_user.get(identity)?;
        self.remove(&id)
    }

    /// Snapshot of every session, oldest first
    pub fn all(&self) -> Vec<CallSession> {
        let mut sessions: Vec<CallSession> = self.sessions.values().cloned().collect();
        sessions.sort_by_key(|session| session.created_at());
        sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn clear(&mut self) {
        self.sessions.clear();
        self.by_user.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str) -> UserId {
        UserId::new(name)
    }

    #[test]
    fn test_insert_indexes_both_participants() {
        let mut table = SessionTable::new();
        let id = table
            .insert(CallSession::ringing(user("alice"), user("bob")))
            .unwrap();

        assert!(table.is_busy(&user("alice")));
        assert!(table.is_busy(&user("bob")));
        assert!(!table.is_busy(&user("carol")));
        assert_eq!(table.find_by_user(&user("bob")).map(|s| *s.id()), Some(id));
        assert!(table.find_between(&user("bob"), &user("alice")).is_some());
        assert!(table.find_between(&user("bob"), &user("carol")).is_none());
    }

    #[test]
    fn test_insert_refuses_busy_participant() {
        let mut table = SessionTable::new();
        table
            .insert(CallSession::ringing(user("alice"), user("bob")))
            .unwrap();

        let err = table
            .insert(CallSession::ringing(user("carol"), user("bob")))
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert!(!table.is_busy(&user("carol")));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_remove_frees_both_participants() {
        let mut table = SessionTable::new();
        table
            .insert(CallSession::ringing(user("alice"), user("bob")))
            .unwrap();

        let removed = table.remove_by_user(&user("bob")).unwrap();
        assert_eq!(removed.caller(), &user("alice"));
        assert!(!table.is_busy(&user("alice")));
        assert!(table.is_empty());
        assert!(table.remove_by_user(&user("bob")).is_none());
    }
}
