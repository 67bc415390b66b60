//! JSON trace format.
//!
//! A legacy file holds one trace object:
//!
//! ```json
//! {
//!   "category": "window_manager",
//!   "time_base": "elapsed",
//!   "real_to_elapsed_offset_ns": 1700000000000000000,
//!   "timestamps_ns": [10, 20, 30],
//!   "vsync_ids": [1, 2, 3],
//!   "entries": [{}, {}, {}]
//! }
//! ```
//!
//! A session file holds several of them: `{"session": [ ... ]}`.

use super::{ClassifiedFiles, ParserFactory};
use crate::trace::{Coarseness, CustomQueryType, ParserBuilder, TimeBase, TraceCategory, TraceFile, TraceParser};
use crate::utils::{DecodeError, Diagnostic};
use log::debug;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct JsonTrace {
    category: TraceCategory,
    #[serde(default)]
    timestamps_ns: Vec<i64>,
    #[serde(default)]
    time_base: TimeBase,
    real_to_elapsed_offset_ns: Option<i64>,
    vsync_ids: Option<Vec<i64>>,
    #[serde(default)]
    entries: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct JsonSession {
    session: Vec<JsonTrace>,
    /// Applies to every trace of the session without its own offset
    real_to_elapsed_offset_ns: Option<i64>,
}

enum FileKind {
    Legacy,
    Session,
    Unsupported,
}

fn kind_of(file: &TraceFile) -> FileKind {
    match serde_json::from_slice::<Value>(&file.data) {
        Ok(Value::Object(object)) if object.get("session").is_some_and(Value::is_array) => FileKind::Session,
        Ok(Value::Object(object)) if object.contains_key("category") => FileKind::Legacy,
        _ => FileKind::Unsupported,
    }
}

/// Decoder for the JSON trace format
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonParserFactory;

impl JsonParserFactory {
    fn build(trace: JsonTrace, coarseness: Coarseness, descriptor: String) -> Result<Box<dyn TraceParser>, DecodeError> {
        let len = trace.timestamps_ns.len();
        if trace.timestamps_ns.windows(2).any(|pair| pair[0] > pair[1]) {
            return Err(DecodeError::InvalidFormat(format!(
                "{} timestamps are not in ascending order",
                trace.category
            )));
        }
        if trace.entries.len() > len {
            return Err(DecodeError::InvalidFormat(format!(
                "{} has {} entries but only {} timestamps",
                trace.category,
                trace.entries.len(),
                len
            )));
        }

        let mut builder = ParserBuilder::new(trace.category)
            .coarseness(coarseness)
            .descriptor(descriptor)
            .entries(trace.entries);
        builder = match trace.time_base {
            TimeBase::Real => builder.real_timestamps(trace.timestamps_ns),
            TimeBase::Elapsed => builder.elapsed_timestamps(trace.timestamps_ns),
        };
        if let Some(offset) = trace.real_to_elapsed_offset_ns {
            builder = builder.epoch_offset_ns(offset);
        }
        if let Some(vsync_ids) = trace.vsync_ids {
            if vsync_ids.len() != len {
                return Err(DecodeError::InvalidFormat(format!(
                    "{} has {} vsync ids for {} timestamps",
                    trace.category,
                    vsync_ids.len(),
                    len
                )));
            }
            builder = builder.custom_query(CustomQueryType::VsyncId, vsync_ids);
        }

        Ok(Box::new(builder.build_raw()))
    }
}

impl ParserFactory for JsonParserFactory {
    fn classify(&self, files: Vec<TraceFile>) -> ClassifiedFiles {
        let mut classified = ClassifiedFiles::default();
        let mut sessions = Vec::new();

        for file in files {
            match kind_of(&file) {
                FileKind::Legacy => classified.legacy.push(file),
                FileKind::Session => sessions.push(file),
                FileKind::Unsupported => {
                    debug!("{} is not a JSON trace", file.descriptor());
                    classified.diagnostics.push(Diagnostic::UnsupportedFile {
                        source: file.descriptor(),
                    });
                }
            }
        }

        // Only one session per load; keep the largest
        sessions.sort_by_key(|file| std::cmp::Reverse(file.size()));
        let mut sessions = sessions.into_iter();
        classified.session = sessions.next();
        for file in sessions {
            classified.diagnostics.push(Diagnostic::overridden(file.descriptor()));
        }
        classified
    }

    fn create_legacy(&self, file: &TraceFile) -> Result<Box<dyn TraceParser>, DecodeError> {
        let trace: JsonTrace = serde_json::from_slice(&file.data)?;
        Self::build(trace, Coarseness::Legacy, file.descriptor())
    }

    fn create_session(&self, file: &TraceFile) -> Result<Vec<Box<dyn TraceParser>>, DecodeError> {
        let session: JsonSession = serde_json::from_slice(&file.data)?;
        let shared_offset = session.real_to_elapsed_offset_ns;
        session
            .session
            .into_iter()
            .map(|mut trace| {
                trace.real_to_elapsed_offset_ns = trace.real_to_elapsed_offset_ns.or(shared_offset);
                Self::build(trace, Coarseness::Modern, file.descriptor())
            })
            .collect()
    }
}
