//! Canonical set of loaded traces.
//!
//! This module decides which decoded traces survive a load:
//! - Session (modern) parsers take precedence over per-file (legacy) ones
//! - Traces whose data predates the rest of the load are discarded
//! - A screen recording makes screenshots redundant
//! - Remaining duplicates of one category are resolved by precedence

pub mod archive;
pub mod merge;
pub mod policy;

// Re-export main types
pub use archive::{download_archive_filename, ArchiveEntry, TraceArchive};
pub use merge::MergeRegistry;
pub use policy::{rank, MergePolicy, Rank};
