//! trace-frames
//!
//! Merges UI traces captured by several recording tools and correlates
//! their entries by display frame.
//!
//! This crate provides the core implementation for the `trace-frames` CLI
//! tool:
//! - [`registry`] keeps one canonical trace per category across loads
//! - [`frames`] maps trace entries to display frames
//! - [`pipeline`] drives a batch load from raw files to the frame table
//!
//! ## Getting Started
//!
//! ```ignore
//! use trace_frames::pipeline::TracePipeline;
//! use trace_frames::trace::TraceFile;
//!
//! let mut pipeline = TracePipeline::default();
//! let report = pipeline.load_files(vec![TraceFile::new("wm.json", bytes)]);
//! for diagnostic in &report.diagnostics {
//!     println!("{diagnostic}");
//! }
//! let frames = pipeline.frames();
//! ```

pub mod commands;
pub mod frames;
pub mod ingest;
pub mod output;
pub mod pipeline;
pub mod registry;
pub mod trace;
pub mod utils;
