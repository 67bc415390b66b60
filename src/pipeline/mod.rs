//! Batch ingestion.
//!
//! Coordinates the unpacker and decoder collaborators, feeds the merge
//! registry and recomputes the frame table after every load.

pub mod hooks;
pub mod loader;
pub mod report;

// Re-export main types
pub use hooks::{DerivedTraceFactory, LogProgress, ProgressListener};
pub use loader::TracePipeline;
pub use report::LoadReport;
