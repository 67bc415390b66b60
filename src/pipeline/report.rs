//! Outcome of a batch load.

use crate::trace::TraceCategory;
use crate::utils::Diagnostic;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Everything that was skipped or discarded, in the order it happened
    pub diagnostics: Vec<Diagnostic>,
    /// Categories available after the load
    pub categories: Vec<TraceCategory>,
}

impl LoadReport {
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.diagnostics.extend(diagnostics);
    }

    /// True when nothing was discarded
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}
