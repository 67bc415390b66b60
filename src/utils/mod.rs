//! Utility modules for configuration, error handling, and diagnostics.

pub mod config;
pub mod diagnostic;
pub mod error;

// Re-export commonly used error types for convenience
pub use diagnostic::Diagnostic;
pub use error::{ConfigError, DecodeError, OutputError, UnpackError};
