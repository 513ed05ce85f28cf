//! Call session coordinator
//!
//! Drives presence and the call lifecycle (ringing → active → ended) for
//! every connected client. All registry and session mutation, together
//! with the resulting deliveries, runs under one lock, so each inbound
//! event is handled to completion before the next one touches the shared
//! state and per-call delivery order follows arrival order.
//!
//! Sessions hold identities only. Every delivery resolves the recipient's
//! current connection through the presence registry at send time, so a
//! reconnect in the middle of a call keeps routing correctly.

use super::client::{ClientContext, Origin};
use super::error::{SignalingError, SignalingResult};
use super::hub::{ConnectionHub, OutboundSender};
use super::message::ServerMessage;
use crate::config::SignalingConfig;
use crate::domain::call::{CallSession, CallState, EndReason, SessionTable};
use crate::domain::presence::{JoinOutcome, PresenceEntry, PresenceRegistry};
use crate::domain::shared::error::DomainError;
use crate::domain::shared::value_objects::{CallId, ConnectionId, UserId};
use crate::infrastructure::metrics;
use serde_json::Value;
use std::sync::{Arc, Weak};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Registry and sessions, always mutated together
#[derive(Debug, Default)]
struct SignalingState {
    presence: PresenceRegistry,
    calls: SessionTable,
}

impl SignalingState {
    /// The origin must still be the live connection of its identity
    fn authorize(&self, origin: &Origin) -> SignalingResult<()> {
        match self.presence.resolve(&origin.identity) {
            Some(current) if current == origin.connection => Ok(()),
            _ => Err(SignalingError::StaleConnection),
        }
    }

    fn display_name(&self, identity: &UserId) -> String {
        self.presence
            .get(identity)
            .map(|entry| entry.display_name.clone())
            .unwrap_or_else(|| identity.to_string())
    }
}

pub struct SignalingCoordinator {
    state: Mutex<SignalingState>,
    hub: Arc<ConnectionHub>,
    config: SignalingConfig,
}

impl SignalingCoordinator {
    pub fn new(config: SignalingConfig) -> Self {
        Self::with_hub(config, Arc::new(ConnectionHub::new()))
    }

    pub fn with_hub(config: SignalingConfig, hub: Arc<ConnectionHub>) -> Self {
        Self {
            state: Mutex::new(SignalingState::default()),
            hub,
            config,
        }
    }

    pub fn hub(&self) -> &Arc<ConnectionHub> {
        &self.hub
    }

    /// Accept a new connection and greet it with its connection id
    pub async fn connect(&self, connection: ConnectionId, sender: OutboundSender) {
        self.hub.register(connection, sender).await;
        self.hub
            .send(
                &connection,
                ServerMessage::Welcome {
                    connection_id: connection,
                },
            )
            .await;
        info!("Signaling connection {} accepted", connection);
    }

    /// Register the client's user as online on its connection
    pub async fn join(
        &self,
        client: &mut ClientContext,
        identity: &str,
        display_name: &str,
    ) -> SignalingResult<JoinOutcome> {
        let identity = UserId::parse(identity, self.config.max_identity_len)
            .map_err(|e| SignalingError::InvalidJoin(e.to_string()))?;

        if let Some(verified) = client.verified_identity() {
            if verified.identity != identity {
                return Err(SignalingError::InvalidJoin(format!(
                    "credentials were issued for {}",
                    verified.identity
                )));
            }
        }
        if let Some(bound) = client.identity() {
            if *bound != identity {
                return Err(SignalingError::InvalidJoin(format!(
                    "connection already joined as {}",
                    bound
                )));
            }
        }

        let display_name = self.display_name_for(client, &identity, display_name)?;
        let connection = client.connection();

        let mut state = self.state.lock().await;
        let outcome = state
            .presence
            .join(identity.clone(), display_name, connection);
        match outcome {
            JoinOutcome::Joined => info!("{} joined on {}", identity, connection),
            JoinOutcome::Reconnected { previous } => info!(
                "{} reconnected on {}, superseding {}",
                identity, connection, previous
            ),
            JoinOutcome::Refreshed => debug!("{} re-joined on {}", identity, connection),
        }
        if let JoinOutcome::Reconnected { previous } = outcome {
            // Last word to the old link, then drop its queue so its socket closes
            self.hub
                .send(
                    &previous,
                    ServerMessage::error(
                        "SUPERSEDED",
                        format!("{} joined from another connection", identity),
                    ),
                )
                .await;
            self.hub.unregister(&previous).await;
        }
        client.bind(identity);

        self.broadcast_presence(&state).await;
        Ok(outcome)
    }

    fn display_name_for(
        &self,
        client: &ClientContext,
        identity: &UserId,
        requested: &str,
    ) -> SignalingResult<String> {
        let requested = requested.trim();
        if requested.chars().count() > self.config.max_display_name_len {
            return Err(SignalingError::InvalidJoin(format!(
                "display name longer than {} characters",
                self.config.max_display_name_len
            )));
        }
        if !requested.is_empty() {
            return Ok(requested.to_string());
        }
        Ok(client
            .verified_identity()
            .map(|verified| verified.display_name.clone())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| identity.to_string()))
    }

    /// Admit a new call from the client to `target` and ring the callee
    pub async fn call_request(
        self: &Arc<Self>,
        client: &ClientContext,
        target: &UserId,
        offer: Value,
        caller_meta: Value,
    ) -> SignalingResult<CallId> {
        let origin = client.origin()?;
        let mut state = self.state.lock().await;
        state.authorize(&origin)?;

        let result = self
            .admit(&mut state, &origin, target, offer, caller_meta)
            .await;
        match &result {
            Ok(call_id) => {
                metrics::record_call_initiated();
                metrics::update_active_calls(state.calls.len());
                self.schedule_ring_timeout(*call_id);
            }
            Err(e) => metrics::record_call_failed(e.code()),
        }
        result
    }

    async fn admit(
        &self,
        state: &mut SignalingState,
        origin: &Origin,
        target: &UserId,
        offer: Value,
        caller_meta: Value,
    ) -> SignalingResult<CallId> {
        let caller = &origin.identity;
        if caller == target {
            return Err(SignalingError::SelfCall);
        }

        let callee_connection = state
            .presence
            .resolve(target)
            .ok_or_else(|| SignalingError::UnreachableTarget(target.clone()))?;

        if state.calls.is_busy(target) {
            info!("{} called {} who is busy", caller, target);
            self.hub
                .send(
                    &callee_connection,
                    ServerMessage::BusyNotice {
                        caller: caller.clone(),
                        caller_meta,
                    },
                )
                .await;
            return Err(SignalingError::TargetBusy(target.clone()));
        }
        if state.calls.is_busy(caller) {
            warn!("{} tried to call {} while already in a call", caller, target);
            return Err(SignalingError::CallerBusy);
        }

        let call_id = state
            .calls
            .insert(CallSession::ringing(caller.clone(), target.clone()))
            .map_err(|e| match e {
                DomainError::Conflict(_) => SignalingError::TargetBusy(target.clone()),
                other => SignalingError::Domain(other),
            })?;

        let caller_name = state.display_name(caller);
        self.hub
            .send(
                &callee_connection,
                ServerMessage::CallOffer {
                    call_id,
                    caller: caller.clone(),
                    caller_name,
                    offer,
                    caller_meta,
                },
            )
            .await;

        info!("Call {} ringing: {} -> {}", call_id, caller, target);
        Ok(call_id)
    }

    fn schedule_ring_timeout(self: &Arc<Self>, call_id: CallId) {
        let Some(timeout) = self.config.ring_timeout() else {
            return;
        };
        let coordinator: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            if let Some(coordinator) = coordinator.upgrade() {
                coordinator.expire_ringing(&call_id).await;
            }
        });
    }

    /// Callee accepts the ringing call placed by `target`
    pub async fn answer(
        &self,
        client: &ClientContext,
        target: &UserId,
        answer: Value,
    ) -> SignalingResult<CallId> {
        let origin = client.origin()?;
        let mut state = self.state.lock().await;
        state.authorize(&origin)?;

        let call_id = state
            .calls
            .find_between(&origin.identity, target)
            .filter(|session| {
                session.callee() == &origin.identity && session.state() == CallState::Ringing
            })
            .map(|session| *session.id())
            .ok_or_else(|| SignalingError::NoSuchCall(target.clone()))?;

        if let Some(session) = state.calls.get_mut(&call_id) {
            session.answer()?;
        }

        match state.presence.resolve(target) {
            Some(caller_connection) => {
                self.hub
                    .send(
                        &caller_connection,
                        ServerMessage::CallAccepted {
                            call_id,
                            callee: origin.identity.clone(),
                            answer,
                        },
                    )
                    .await;
            }
            None => warn!("Caller {} of call {} is not reachable", target, call_id),
        }

        metrics::record_call_answered();
        info!("Call {} active: {} <-> {}", call_id, target, origin.identity);
        Ok(call_id)
    }

    /// Refuse the call with `target`; works from either side and in either state
    pub async fn reject(
        &self,
        client: &ClientContext,
        target: &UserId,
        rejector_meta: Value,
    ) -> SignalingResult<CallId> {
        let origin = client.origin()?;
        let mut state = self.state.lock().await;
        state.authorize(&origin)?;

        let session = Self::take_session(&mut state, &origin.identity, target)?;
        let call_id = *session.id();

        self.deliver(
            &state,
            target,
            ServerMessage::CallRejected {
                call_id,
                rejector: origin.identity.clone(),
                rejector_meta,
            },
        )
        .await;

        Self::record_teardown(&state, EndReason::Rejected);
        info!("Call {} rejected by {}", call_id, origin.identity);
        Ok(call_id)
    }

    /// Hang up the call with `target`
    pub async fn end(&self, client: &ClientContext, target: &UserId) -> SignalingResult<CallId> {
        let origin = client.origin()?;
        let mut state = self.state.lock().await;
        state.authorize(&origin)?;

        let session = Self::take_session(&mut state, &origin.identity, target)?;
        let call_id = *session.id();

        self.deliver(
            &state,
            target,
            ServerMessage::CallEnded {
                call_id,
                peer: origin.identity.clone(),
                reason: EndReason::Hangup,
            },
        )
        .await;

        Self::record_teardown(&state, EndReason::Hangup);
        info!("Call {} ended by {}", call_id, origin.identity);
        Ok(call_id)
    }

    fn take_session(
        state: &mut SignalingState,
        identity: &UserId,
        target: &UserId,
    ) -> SignalingResult<CallSession> {
        let call_id = state
            .calls
            .find_between(identity, target)
            .map(|session| *session.id())
            .ok_or_else(|| SignalingError::NoSuchCall(target.clone()))?;
        state
            .calls
            .remove(&call_id)
            .ok_or_else(|| SignalingError::NoSuchCall(target.clone()))
    }

    /// A connection went away.
    ///
    /// If it was the live connection of a user, the user leaves, any call
    /// they were in ends for the other participant and everyone gets the
    /// new presence list. Disconnects of superseded or never-joined
    /// connections only drop the connection.
    pub async fn disconnect(&self, connection: &ConnectionId) -> Option<PresenceEntry> {
        let mut state = self.state.lock().await;
        self.hub.unregister(connection).await;

        let Some(entry) = state.presence.leave(connection) else {
            debug!("Connection {} closed without live presence", connection);
            return None;
        };
        info!("{} left ({})", entry.identity, connection);

        if let Some(session) = state.calls.remove_by_user(&entry.identity) {
            if let Some(peer) = session.peer_of(&entry.identity) {
                self.deliver(
                    &state,
                    peer,
                    ServerMessage::CallEnded {
                        call_id: *session.id(),
                        peer: entry.identity.clone(),
                        reason: EndReason::Disconnected,
                    },
                )
                .await;
            }
            Self::record_teardown(&state, EndReason::Disconnected);
            info!(
                "Call {} ended because {} disconnected",
                session.id(),
                entry.identity
            );
        }

        self.broadcast_presence(&state).await;
        Some(entry)
    }

    /// End a session that is still ringing; no-op once answered or gone
    pub async fn expire_ringing(&self, call_id: &CallId) -> bool {
        let mut state = self.state.lock().await;

        let ringing = state
            .calls
            .get(call_id)
            .map_or(false, |session| session.state() == CallState::Ringing);
        if !ringing {
            return false;
        }
        let Some(session) = state.calls.remove(call_id) else {
            return false;
        };

        for (recipient, peer) in [
            (session.caller(), session.callee()),
            (session.callee(), session.caller()),
        ] {
            self.deliver(
                &state,
                recipient,
                ServerMessage::CallEnded {
                    call_id: *call_id,
                    peer: peer.clone(),
                    reason: EndReason::RingTimeout,
                },
            )
            .await;
        }

        Self::record_teardown(&state, EndReason::RingTimeout);
        info!("Call {} was not answered in time", call_id);
        true
    }

    /// Send to the current connection of `identity`, if any
    async fn deliver(&self, state: &SignalingState, identity: &UserId, message: ServerMessage) {
        match state.presence.resolve(identity) {
            Some(connection) => {
                self.hub.send(&connection, message).await;
            }
            None => debug!("{} is offline, dropping {:?}", identity, message),
        }
    }

    async fn broadcast_presence(&self, state: &SignalingState) {
        let users = state.presence.online_users();
        metrics::update_online_users(users.len());
        self.hub
            .broadcast(ServerMessage::presence_update(&users))
            .await;
    }

    fn record_teardown(state: &SignalingState, reason: EndReason) {
        metrics::record_call_ended(reason.as_str());
        metrics::update_active_calls(state.calls.len());
    }

    pub async fn resolve(&self, identity: &UserId) -> Option<ConnectionId> {
        self.state.lock().await.presence.resolve(identity)
    }

    pub async fn is_online(&self, identity: &UserId) -> bool {
        self.state.lock().await.presence.is_online(identity)
    }

    pub async fn online_users(&self) -> Vec<PresenceEntry> {
        self.state.lock().await.presence.online_users()
    }

    pub async fn active_calls(&self) -> Vec<CallSession> {
        self.state.lock().await.calls.all()
    }

    pub async fn call_of(&self, identity: &UserId) -> Option<CallSession> {
        self.state
            .lock()
            .await
            .calls
            .find_by_user(identity)
            .cloned()
    }

    /// Forget all presence and sessions and close every connection
    pub async fn shutdown(&self) {
        let mut state = self.state.lock().await;
        let users = state.presence.len();
        let calls = state.calls.len();
        state.presence.clear();
        state.calls.clear();
        self.hub.close_all().await;
        metrics::update_online_users(0);
        metrics::update_active_calls(0);
        info!(
            "Signaling state cleared ({} users, {} calls dropped)",
            users, calls
        );
    }
}
