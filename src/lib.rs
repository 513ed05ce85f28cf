//! Callrelay - presence and call signaling relay for peer-to-peer video calls
//!
//! Clients announce themselves over a WebSocket, browse who else is online
//! and negotiate direct media sessions with each other. The relay never
//! carries media; it only tracks presence, enforces one call per user and
//! forwards the opaque negotiation payloads between the two participants.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interface;

// Re-export commonly used types
pub use application::signaling::{SignalingCoordinator, SignalingError};
pub use domain::shared::error::DomainError;
pub use domain::shared::error::Result;
