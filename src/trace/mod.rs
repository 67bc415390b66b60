//! Trace data model: categories, timestamps and the decoder contract.
//!
//! This module defines:
//! - The categories a trace can belong to
//! - Real and elapsed timestamps and their conversion
//! - The `TraceParser` contract implemented by every decoder
//! - The per-category collection used for frame correlation

pub mod category;
pub mod memory;
pub mod parser;
pub mod timestamp;
pub mod traces;

// Re-export main types
pub use category::{CategoryInfo, TraceCategory};
pub use memory::{InMemoryParser, ParserBuilder};
pub use parser::{
    Coarseness, CustomQueryType, LoadedParser, SessionParsers, TimelineExt, TraceFile, TraceParser,
};
pub use timestamp::{TimeBase, TimeRange, Timestamp, TimestampConverter, TimestampKind};
pub use traces::Traces;
