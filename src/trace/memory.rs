//! Fully decoded, in-memory trace.
//!
//! Used by the JSON decoder and as the building block for tests.

use super::category::TraceCategory;
use super::parser::{Coarseness, CustomQueryType, TraceParser};
use super::timestamp::{TimeBase, Timestamp, TimestampConverter};
use crate::utils::error::DecodeError;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct InMemoryParser {
    category: TraceCategory,
    coarseness: Coarseness,
    descriptors: Vec<String>,
    raw_ns: Vec<i64>,
    time_base: TimeBase,
    epoch_offset_ns: Option<i64>,
    timestamps: Vec<Timestamp>,
    entries: Vec<serde_json::Value>,
    queries: HashMap<CustomQueryType, Vec<i64>>,
}

impl TraceParser for InMemoryParser {
    fn category(&self) -> TraceCategory {
        self.category
    }

    fn coarseness(&self) -> Coarseness {
        self.coarseness
    }

    fn timestamps(&self) -> &[Timestamp] {
        &self.timestamps
    }

    fn len(&self) -> usize {
        self.raw_ns.len()
    }

    fn entry(&self, index: usize) -> Result<serde_json::Value, DecodeError> {
        if index >= self.raw_ns.len() {
            return Err(DecodeError::EntryOutOfBounds {
                index,
                len: self.raw_ns.len(),
            });
        }
        Ok(self
            .entries
            .get(index)
            .cloned()
            .unwrap_or(serde_json::Value::Null))
    }

    fn descriptors(&self) -> Vec<String> {
        self.descriptors.clone()
    }

    fn epoch_offset_ns(&self) -> Option<i64> {
        self.epoch_offset_ns
    }

    fn create_timestamps(&mut self, converter: &TimestampConverter) {
        self.timestamps = self
            .raw_ns
            .iter()
            .map(|&raw| converter.make_timestamp(raw, self.time_base, self.epoch_offset_ns))
            .collect();
    }

    fn custom_query(&self, query: CustomQueryType) -> Option<Vec<i64>> {
        self.queries.get(&query).cloned()
    }
}

/// Builder for [`InMemoryParser`]
///
/// `build` creates timestamps with a default converter so the parser can be
/// used right away; `build_raw` leaves that to the caller.
#[derive(Debug, Clone)]
pub struct ParserBuilder {
    category: TraceCategory,
    coarseness: Coarseness,
    descriptors: Vec<String>,
    raw_ns: Vec<i64>,
    time_base: TimeBase,
    epoch_offset_ns: Option<i64>,
    entries: Vec<serde_json::Value>,
    queries: HashMap<CustomQueryType, Vec<i64>>,
}

impl ParserBuilder {
    pub fn new(category: TraceCategory) -> Self {
        Self {
            category,
            coarseness: Coarseness::Legacy,
            descriptors: Vec::new(),
            raw_ns: Vec::new(),
            time_base: TimeBase::Elapsed,
            epoch_offset_ns: None,
            entries: Vec::new(),
            queries: HashMap::new(),
        }
    }

    pub fn coarseness(mut self, coarseness: Coarseness) -> Self {
        self.coarseness = coarseness;
        self
    }

    pub fn descriptor(mut self, descriptor: impl Into<String>) -> Self {
        self.descriptors.push(descriptor.into());
        self
    }

    /// Wall-clock timestamps
    pub fn real_timestamps(mut self, values_ns: impl IntoIterator<Item = i64>) -> Self {
        self.raw_ns = values_ns.into_iter().collect();
        self.time_base = TimeBase::Real;
        self
    }

    /// Monotonic timestamps, turned into real ones only if an epoch offset is set
    pub fn elapsed_timestamps(mut self, values_ns: impl IntoIterator<Item = i64>) -> Self {
        self.raw_ns = values_ns.into_iter().collect();
        self.time_base = TimeBase::Elapsed;
        self
    }

    pub fn epoch_offset_ns(mut self, offset_ns: i64) -> Self {
        self.epoch_offset_ns = Some(offset_ns);
        self
    }

    pub fn entries(mut self, entries: impl IntoIterator<Item = serde_json::Value>) -> Self {
        self.entries = entries.into_iter().collect();
        self
    }

    pub fn custom_query(mut self, query: CustomQueryType, values: impl IntoIterator<Item = i64>) -> Self {
        self.queries.insert(query, values.into_iter().collect());
        self
    }

    pub fn build_raw(self) -> InMemoryParser {
        InMemoryParser {
            category: self.category,
            coarseness: self.coarseness,
            descriptors: self.descriptors,
            raw_ns: self.raw_ns,
            time_base: self.time_base,
            epoch_offset_ns: self.epoch_offset_ns,
            timestamps: Vec::new(),
            entries: self.entries,
            queries: self.queries,
        }
    }

    pub fn build(self) -> Arc<dyn TraceParser> {
        let mut parser = self.build_raw();
        parser.create_timestamps(&TimestampConverter::default());
        Arc::new(parser)
    }
}
