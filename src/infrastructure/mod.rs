//! Infrastructure layer - Technical implementations
//!
//! This layer contains:
//! - Identity provider adapters
//! - Metrics exporter

pub mod identity;
pub mod metrics;
