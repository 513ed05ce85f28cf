//! API interface implementations

pub mod dto;
pub mod metrics_handler;
pub mod presence_handler;
pub mod router;
pub mod webrtc_signaling;

pub use presence_handler::AppState;
pub use router::build_router;
