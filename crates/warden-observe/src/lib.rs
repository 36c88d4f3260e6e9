//! # Warden Observe - Logging Setup
//!
//! Structured logging initialization shared by services and tests.

pub mod logging;

pub use logging::{init_logging, LogConfig, LogFormat};
