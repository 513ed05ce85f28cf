//! Call session aggregate root

use crate::domain::call::value_object::CallState;
use crate::domain::shared::error::{DomainError, Result};
use crate::domain::shared::value_objects::{CallId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One pending or in-progress call between exactly two identities.
///
/// The session only knows identities. Reaching either side is always done
/// by resolving the identity through the presence registry at send time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSession {
    id: CallId,
    caller: UserId,
    callee: UserId,
    state: CallState,
    created_at: DateTime<Utc>,
    answered_at: Option<DateTime<Utc>>,
}

impl CallSession {
    /// Create a session in the ringing state
    pub fn ringing(caller: UserId, callee: UserId) -> Self {
        Self {
            id: CallId::new(),
            caller,
            callee,
            state: CallState::Ringing,
            created_at: Utc::now(),
            answered_at: None,
        }
    }

    /// Callee answered
    pub fn answer(&mut self) -> Result<()> {
        self.transition_to(CallState::Active)?;
        self.answered_at = Some(Utc::now());
        Ok(())
    }

    fn transition_to(&mut self, new_state: CallState) -> Result<()> {
        if !self.state.can_transition_to(&new_state) {
            return Err(DomainError::InvalidStateTransition(format!(
                "Cannot transition from {:?} to {:?}",
                self.state, new_state
            )));
        }

        self.state = new_state;
        Ok(())
    }

    /// The other participant, if `identity` takes part in this session
    pub fn peer_of(&self, identity: &UserId) -> Option<&UserId> {
        if self.caller == *identity {
            Some(&self.callee)
        } else if self.callee == *identity {
            Some(&self.caller)
        } else {
            None
        }
    }

    /// True when the session joins `a` and `b`, in either direction
    pub fn is_between(&self, a: &UserId, b: &UserId) -> bool {
        (self.caller == *a && self.callee == *b) || (self.caller == *b && self.callee == *a)
    }

    // Getters
    pub fn id(&self) -> &CallId {
        &self.id
    }

    pub fn caller(&self) -> &UserId {
        &self.caller
    }

    pub fn callee(&self) -> &UserId {
        &self.callee
    }

    pub fn state(&self) -> CallState {
        self.state
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn answered_at(&self) -> Option<DateTime<Utc>> {
        self.answered_at
    }
}
