//! The contract every format-specific decoder implements.

use super::category::TraceCategory;
use super::timestamp::{Timestamp, TimestampConverter};
use crate::utils::error::DecodeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Which family of decoder produced a parser.
///
/// Modern decoders read one recording session holding several categories at
/// once; legacy decoders read a single-category file each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Coarseness {
    Legacy,
    Modern,
}

/// Keyed per-entry queries a decoder may answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomQueryType {
    /// Display frame identifier shared by compositor state and the
    /// transactions applied in that frame
    VsyncId,
}

/// A decoded trace.
///
/// Timestamps are only available after [`create_timestamps`] ran with the
/// converter of the current load; before that `timestamps()` is empty.
///
/// [`create_timestamps`]: TraceParser::create_timestamps
pub trait TraceParser: Send + Sync {
    fn category(&self) -> TraceCategory;

    fn coarseness(&self) -> Coarseness;

    /// Ascending (not necessarily strictly) timestamps, one per entry
    fn timestamps(&self) -> &[Timestamp];

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decode entry `index`
    fn entry(&self, index: usize) -> Result<serde_json::Value, DecodeError>;

    /// Names of the files this parser was built from
    fn descriptors(&self) -> Vec<String>;

    /// Real-to-elapsed clock offset reported by the recording device, if any
    fn epoch_offset_ns(&self) -> Option<i64>;

    fn create_timestamps(&mut self, converter: &TimestampConverter);

    /// One value per entry, or `None` if the decoder cannot answer `query`
    fn custom_query(&self, _query: CustomQueryType) -> Option<Vec<i64>> {
        None
    }
}

/// Span helpers shared by the merge policy and the correlator
pub trait TimelineExt {
    fn first_timestamp(&self) -> Option<Timestamp>;
    fn last_timestamp(&self) -> Option<Timestamp>;
    /// Single-sample snapshot rather than a timeline
    fn is_dump(&self) -> bool;
    /// Non-empty and none of the timestamps is real
    fn is_elapsed_only(&self) -> bool;
    fn has_real_timestamps(&self) -> bool;
    fn span_ns(&self) -> i64;
}

impl<P: TraceParser + ?Sized> TimelineExt for P {
    fn first_timestamp(&self) -> Option<Timestamp> {
        self.timestamps().first().copied()
    }

    fn last_timestamp(&self) -> Option<Timestamp> {
        self.timestamps().last().copied()
    }

    fn is_dump(&self) -> bool {
        self.timestamps().len() == 1
    }

    fn is_elapsed_only(&self) -> bool {
        !self.timestamps().is_empty() && !self.has_real_timestamps()
    }

    fn has_real_timestamps(&self) -> bool {
        self.timestamps().iter().any(Timestamp::is_real)
    }

    fn span_ns(&self) -> i64 {
        match (self.first_timestamp(), self.last_timestamp()) {
            (Some(first), Some(last)) => last.value_ns.saturating_sub(first.value_ns),
            _ => 0,
        }
    }
}

/// An elementary file, possibly extracted from a container
#[derive(Clone, PartialEq, Eq)]
pub struct TraceFile {
    pub name: String,
    pub parent: Option<String>,
    pub data: Arc<[u8]>,
}

impl TraceFile {
    pub fn new(name: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            data: data.into(),
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// `name`, or `name (container)` for extracted files
    pub fn descriptor(&self) -> String {
        match &self.parent {
            Some(parent) => format!("{} ({})", self.name, parent),
            None => self.name.clone(),
        }
    }

    /// File name without any directory components
    pub fn base_name(&self) -> &str {
        self.name.rsplit(['/', '\\']).next().unwrap_or(&self.name)
    }

    /// Lowercase extension including the dot, e.g. `.pb`
    pub fn extension(&self) -> Option<String> {
        let base = self.base_name();
        base.rfind('.')
            .filter(|&i| i > 0)
            .map(|i| base[i..].to_ascii_lowercase())
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }
}

impl fmt::Debug for TraceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraceFile")
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("size", &self.data.len())
            .finish()
    }
}

/// A legacy parser together with the file it was decoded from
#[derive(Clone)]
pub struct LoadedParser {
    pub file: TraceFile,
    pub parser: Arc<dyn TraceParser>,
}

impl LoadedParser {
    pub fn new(file: TraceFile, parser: Arc<dyn TraceParser>) -> Self {
        Self { file, parser }
    }

    pub fn category(&self) -> TraceCategory {
        self.parser.category()
    }

    pub fn source(&self) -> String {
        self.parser.descriptors().join(", ")
    }
}

impl fmt::Debug for LoadedParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedParser")
            .field("file", &self.file)
            .field("category", &self.parser.category())
            .field("entries", &self.parser.len())
            .finish()
    }
}

/// Every parser decoded from one recording session file
#[derive(Clone)]
pub struct SessionParsers {
    pub file: TraceFile,
    pub parsers: Vec<Arc<dyn TraceParser>>,
}

impl SessionParsers {
    pub fn new(file: TraceFile, parsers: Vec<Arc<dyn TraceParser>>) -> Self {
        Self { file, parsers }
    }
}
