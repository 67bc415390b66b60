//! Output writers for load results.
//!
//! This module handles writing data to disk:
//! - JSON load reports (pretty)
//! - Exported trace archives as directory trees

pub mod archive;
pub mod json;

// Re-export main functions
pub use archive::write_archive;
pub use json::{report_to_string, write_report, Report, TraceSummary};
