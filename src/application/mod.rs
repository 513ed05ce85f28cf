//! Application layer - Use cases and application services
//!
//! This layer orchestrates domain objects to fulfill use cases.
//! It's responsible for:
//! - Serializing every signaling event against the shared presence and session state
//! - Routing relayed payloads to the current connection of each participant
//! - Converting between domain models and wire messages

pub mod signaling;
