//! The per-category collection handed to the frame correlator.

use super::category::TraceCategory;
use super::parser::TraceParser;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct Traces {
    traces: BTreeMap<TraceCategory, Arc<dyn TraceParser>>,
}

impl Traces {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `parser` under its own category, replacing any previous one
    pub fn set(&mut self, parser: Arc<dyn TraceParser>) {
        self.traces.insert(parser.category(), parser);
    }

    pub fn get(&self, category: TraceCategory) -> Option<&Arc<dyn TraceParser>> {
        self.traces.get(&category)
    }

    pub fn contains(&self, category: TraceCategory) -> bool {
        self.traces.contains_key(&category)
    }

    pub fn remove(&mut self, category: TraceCategory) -> Option<Arc<dyn TraceParser>> {
        self.traces.remove(&category)
    }

    pub fn categories(&self) -> impl Iterator<Item = TraceCategory> + '_ {
        self.traces.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn TraceParser>> {
        self.traces.values()
    }

    pub fn len(&self) -> usize {
        self.traces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }
}

impl FromIterator<Arc<dyn TraceParser>> for Traces {
    fn from_iter<I: IntoIterator<Item = Arc<dyn TraceParser>>>(iter: I) -> Self {
        let mut traces = Traces::new();
        for parser in iter {
            traces.set(parser);
        }
        traces
    }
}

impl std::fmt::Debug for Traces {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.traces.iter().map(|(category, parser)| (category, parser.len())))
            .finish()
    }
}
