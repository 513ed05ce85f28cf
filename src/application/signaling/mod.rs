//! Call signaling and presence coordination

pub mod client;
pub mod coordinator;
pub mod error;
pub mod hub;
pub mod message;

pub use client::{ClientContext, Origin};
pub use coordinator::SignalingCoordinator;
pub use error::{SignalingError, SignalingResult};
pub use hub::{outbound_channel, ConnectionHub, OutboundReceiver, OutboundSender};
pub use message::{ClientMessage, PresenceUser, ServerMessage};
