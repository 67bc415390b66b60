//! Collaborators that turn uploaded bytes into candidate parsers.
//!
//! The pipeline only depends on the two traits defined here. The reference
//! implementations handle gzip containers and a JSON trace format.

pub mod gzip;
pub mod json_trace;

// Re-export main types
pub use gzip::GzipUnpacker;
pub use json_trace::JsonParserFactory;

use crate::trace::{TraceFile, TraceParser};
use crate::utils::{DecodeError, Diagnostic, UnpackError};

/// Splits a container into the elementary files it holds
pub trait Unpacker {
    /// # Errors
    /// * `UnpackError::Corrupted` - If the container cannot be read
    fn unpack(&self, container: TraceFile) -> Result<Vec<TraceFile>, UnpackError>;
}

/// Elementary files sorted by the decoder family that handles them
#[derive(Debug, Default)]
pub struct ClassifiedFiles {
    pub legacy: Vec<TraceFile>,
    pub session: Option<TraceFile>,
    /// Files that were recognized by no decoder or lost against another one
    pub diagnostics: Vec<Diagnostic>,
}

impl ClassifiedFiles {
    pub fn is_empty(&self) -> bool {
        self.legacy.is_empty() && self.session.is_none()
    }
}

/// Format-specific decoding.
///
/// Parsers are returned boxed so the pipeline can create their timestamps
/// before sharing them.
pub trait ParserFactory {
    /// Decide which decoder family handles each file. At most one session
    /// file is selected.
    fn classify(&self, files: Vec<TraceFile>) -> ClassifiedFiles;

    fn create_legacy(&self, file: &TraceFile) -> Result<Box<dyn TraceParser>, DecodeError>;

    /// Every category recorded in one session file
    fn create_session(&self, file: &TraceFile) -> Result<Vec<Box<dyn TraceParser>>, DecodeError>;
}
