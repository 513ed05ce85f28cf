//! Interface layer - External interfaces (API, WebSocket, etc.)
//!
//! This layer handles:
//! - The signaling WebSocket
//! - REST endpoints for health, presence and calls
//! - Request/response formatting

pub mod api;
