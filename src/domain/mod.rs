//! Domain layer - Core business logic and rules
//!
//! This layer contains:
//! - Presence: who is online and on which connection
//! - Call: call sessions, their states and the one-call-per-user table
//! - Shared: identifiers and domain errors

pub mod call;
pub mod presence;
pub mod shared;

// Re-export commonly used types
pub use shared::{DomainError, Result};
