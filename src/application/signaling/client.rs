//! Per-connection client context held by the transport

use super::error::{SignalingError, SignalingResult};
use crate::domain::shared::value_objects::{ConnectionId, UserId};
use crate::infrastructure::identity::VerifiedIdentity;

/// Who is speaking on a connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub connection: ConnectionId,
    pub identity: UserId,
}

/// State one socket carries between messages.
///
/// The identity is bound by the first successful join and never changes
/// for the lifetime of the connection.
#[derive(Debug, Clone)]
pub struct ClientContext {
    connection: ConnectionId,
    verified: Option<VerifiedIdentity>,
    identity: Option<UserId>,
}

impl ClientContext {
    pub fn new(connection: ConnectionId) -> Self {
        Self {
            connection,
            verified: None,
            identity: None,
        }
    }

    /// Context for a connection whose credentials were checked at upgrade
    pub fn verified(connection: ConnectionId, verified: VerifiedIdentity) -> Self {
        Self {
            connection,
            verified: Some(verified),
            identity: None,
        }
    }

    pub fn connection(&self) -> ConnectionId {
        self.connection
    }

    pub fn verified_identity(&self) -> Option<&VerifiedIdentity> {
        self.verified.as_ref()
    }

    pub fn identity(&self) -> Option<&UserId> {
        self.identity.as_ref()
    }

    pub(crate) fn bind(&mut self, identity: UserId) {
        self.identity = Some(identity);
    }

    pub fn origin(&self) -> SignalingResult<Origin> {
        let identity = self.identity.clone().ok_or(SignalingError::NotJoined)?;
        Ok(Origin {
            connection: self.connection,
            identity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_requires_join() {
        let mut client = ClientContext::new(ConnectionId::new());
        assert_eq!(client.origin(), Err(SignalingError::NotJoined));

        client.bind(UserId::new("alice"));
        let origin = client.origin().unwrap();
        assert_eq!(origin.identity, UserId::new("alice"));
        assert_eq!(origin.connection, client.connection());
    }
}
