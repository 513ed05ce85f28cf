//! Call bounded context - sessions between two users and their lifecycle

pub mod aggregate;
pub mod sessions;
pub mod value_object;

pub use aggregate::CallSession;
pub use sessions::SessionTable;
pub use value_object::{CallState, EndReason};
