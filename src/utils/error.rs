//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.
//!
//! Expected outcomes of a load (a trace losing precedence, a corrupted
//! container) are not errors: they are reported as [`Diagnostic`]s.
//!
//! [`Diagnostic`]: super::diagnostic::Diagnostic

use thiserror::Error;

/// Errors that can occur while decoding an elementary trace file
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("JSON deserialization failed: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid trace format: {0}")]
    InvalidFormat(String),

    #[error("Entry index {index} out of bounds (trace has {len} entries)")]
    EntryOutOfBounds { index: usize, len: usize },
}

/// Errors that can occur while unpacking a container
#[derive(Error, Debug)]
pub enum UnpackError {
    #[error("Corrupted container {name}: {source}")]
    Corrupted {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}

/// Errors that can occur while loading a policy configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Policy TOML parse error: {0}")]
    ParseFailed(#[from] toml::de::Error),

    #[error("Invalid policy configuration: {0}")]
    Invalid(String),
}
