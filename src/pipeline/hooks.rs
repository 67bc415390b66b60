//! Optional extension points of the pipeline.

use crate::trace::{TraceParser, Traces};
use std::sync::Arc;

/// Receives coarse progress of a load
pub trait ProgressListener {
    /// `percentage` is in `0.0..=100.0`
    fn on_progress(&self, message: &str, percentage: f64);

    fn on_finished(&self) {}
}

/// Builds traces computed from the loaded ones, such as transitions merged
/// from the WM and shell halves.
///
/// Derived traces are added after merging and replace any loaded trace of
/// the same category.
pub trait DerivedTraceFactory {
    fn derive(&self, traces: &Traces) -> Vec<Arc<dyn TraceParser>>;
}

/// Progress listener that forwards to the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgress;

impl ProgressListener for LogProgress {
    fn on_progress(&self, message: &str, percentage: f64) {
        log::debug!("{} {:.0}%", message, percentage);
    }

    fn on_finished(&self) {
        log::debug!("Load finished");
    }
}
