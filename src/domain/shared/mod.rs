//! Shared kernel - identifiers and errors used by every bounded context

pub mod error;
pub mod value_objects;

pub use error::{DomainError, Result};
pub use value_objects::*;
