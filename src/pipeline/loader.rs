//! Batch loading from uploaded containers to a correlated frame table.

use super::hooks::{DerivedTraceFactory, ProgressListener};
use super::report::LoadReport;
use crate::frames::{default_relations, FrameMapper, FrameRelation, FrameTable};
use crate::ingest::{GzipUnpacker, JsonParserFactory, ParserFactory, Unpacker};
use crate::registry::{download_archive_filename, MergePolicy, MergeRegistry, TraceArchive};
use crate::trace::{
    LoadedParser, SessionParsers, TimestampConverter, TraceCategory, TraceFile, TraceParser, Traces,
};
use crate::utils::config::DEFAULT_ARCHIVE_NAME;
use crate::utils::Diagnostic;
use chrono::Utc;
use log::{debug, info, warn};
use std::sync::Arc;

const UNPACK_MESSAGE: &str = "Unpacking files...";
const DECODE_MESSAGE: &str = "Decoding traces...";

/// Owns the canonical trace set across loads.
///
/// Each [`load_files`] call processes its containers strictly in order, so a
/// later container wins over an earlier one exactly as a later call would.
///
/// [`load_files`]: TracePipeline::load_files
pub struct TracePipeline {
    unpacker: Box<dyn Unpacker>,
    factory: Box<dyn ParserFactory>,
    derived: Option<Box<dyn DerivedTraceFactory>>,
    progress: Option<Box<dyn ProgressListener>>,
    relations: Vec<FrameRelation>,
    source_label: String,

    registry: MergeRegistry,
    converter: TimestampConverter,
    traces: Traces,
    frames: FrameTable,
    download_name: Option<String>,
}

impl Default for TracePipeline {
    fn default() -> Self {
        Self::new(Box::new(GzipUnpacker), Box::new(JsonParserFactory))
    }
}

impl TracePipeline {
    pub fn new(unpacker: Box<dyn Unpacker>, factory: Box<dyn ParserFactory>) -> Self {
        Self {
            unpacker,
            factory,
            derived: None,
            progress: None,
            relations: default_relations(),
            source_label: "files".to_string(),
            registry: MergeRegistry::new(),
            converter: TimestampConverter::new(),
            traces: Traces::new(),
            frames: FrameTable::default(),
            download_name: None,
        }
    }

    /// Replace the merge policy. Discards anything loaded so far.
    pub fn with_policy(mut self, policy: MergePolicy) -> Self {
        self.registry = MergeRegistry::with_policy(policy);
        self
    }

    pub fn with_relations(mut self, relations: Vec<FrameRelation>) -> Self {
        self.relations = relations;
        self
    }

    pub fn with_derived_traces(mut self, factory: Box<dyn DerivedTraceFactory>) -> Self {
        self.derived = Some(factory);
        self
    }

    pub fn with_progress(mut self, listener: Box<dyn ProgressListener>) -> Self {
        self.progress = Some(listener);
        self
    }

    /// Label naming downloads of multi-file loads
    pub fn with_source_label(mut self, label: impl Into<String>) -> Self {
        self.source_label = label.into();
        self
    }

    fn report_progress(&self, message: &str, done: usize, total: usize) {
        if let Some(listener) = &self.progress {
            let percentage = if total == 0 {
                100.0
            } else {
                100.0 * done as f64 / total as f64
            };
            listener.on_progress(message, percentage);
        }
    }

    /// Load a batch of containers into the canonical set and recompute frames.
    ///
    /// Never fails: anything that cannot be used is reported in the returned
    /// [`LoadReport`] and the rest of the batch is still processed.
    pub fn load_files(&mut self, containers: Vec<TraceFile>) -> LoadReport {
        info!("Loading {} container(s)", containers.len());
        let mut report = LoadReport::default();

        self.update_download_name(&containers);
        let groups = self.unpack_all(containers, &mut report);

        if groups.is_empty() {
            report.push(Diagnostic::NoInputFiles);
        } else {
            let total = groups.len();
            for (i, group) in groups.into_iter().enumerate() {
                self.report_progress(DECODE_MESSAGE, i, total);
                self.load_group(group, &mut report);
            }
            self.report_progress(DECODE_MESSAGE, total, total);
            self.rebuild();
        }

        if let Some(listener) = &self.progress {
            listener.on_finished();
        }
        report.categories = self.traces.categories().collect();
        info!(
            "Load finished: {} trace(s), {} frame(s), {} diagnostic(s)",
            self.traces.len(),
            self.frames.len(),
            report.diagnostics.len()
        );
        report
    }

    fn update_download_name(&mut self, containers: &[TraceFile]) {
        let files: Vec<&TraceFile> = match (&self.download_name, containers) {
            (None, [single]) => vec![single],
            _ => Vec::new(),
        };
        self.download_name = Some(download_archive_filename(
            &files,
            Some(self.source_label.as_str()),
            Utc::now(),
        ));
    }

    fn unpack_all(&self, containers: Vec<TraceFile>, report: &mut LoadReport) -> Vec<Vec<TraceFile>> {
        let total = containers.len();
        let mut groups = Vec::with_capacity(total);

        self.report_progress(UNPACK_MESSAGE, 0, total);
        for (i, container) in containers.into_iter().enumerate() {
            let source = container.descriptor();
            match self.unpacker.unpack(container) {
                Ok(files) => {
                    debug!("{} unpacked into {} file(s)", source, files.len());
                    groups.push(files);
                }
                Err(e) => {
                    warn!("Skipping container: {}", e);
                    report.push(Diagnostic::CorruptedContainer { source });
                }
            }
            self.report_progress(UNPACK_MESSAGE, i + 1, total);
        }
        groups
    }

    /// Decode one unpacked container and merge its parsers
    fn load_group(&mut self, files: Vec<TraceFile>, report: &mut LoadReport) {
        let mut classified = self.factory.classify(files);
        report.extend(std::mem::take(&mut classified.diagnostics));
        if classified.is_empty() {
            report.push(Diagnostic::NoInputFiles);
            return;
        }

        let mut legacy: Vec<(TraceFile, Box<dyn TraceParser>)> = Vec::new();
        for file in classified.legacy {
            match self.factory.create_legacy(&file) {
                Ok(parser) => legacy.push((file, parser)),
                Err(e) => report.push(Diagnostic::InvalidTrace {
                    source: file.descriptor(),
                    reason: e.to_string(),
                }),
            }
        }

        let mut session = classified
            .session
            .and_then(|file| match self.factory.create_session(&file) {
                Ok(parsers) => Some((file, parsers)),
                Err(e) => {
                    report.push(Diagnostic::InvalidTrace {
                        source: file.descriptor(),
                        reason: e.to_string(),
                    });
                    None
                }
            });

        let offsets = legacy
            .iter()
            .map(|(_, parser)| parser.epoch_offset_ns())
            .chain(session.iter().flat_map(|(_, parsers)| parsers.iter().map(|p| p.epoch_offset_ns())));
        if let Some(offset) = self.registry.latest_epoch_offset(offsets) {
            self.converter.set_real_to_elapsed_offset_ns(offset);
        }

        for (_, parser) in legacy.iter_mut() {
            parser.create_timestamps(&self.converter);
        }
        for (_, parsers) in session.iter_mut() {
            for parser in parsers.iter_mut() {
                parser.create_timestamps(&self.converter);
            }
        }

        let new_legacy = legacy
            .into_iter()
            .map(|(file, parser)| LoadedParser::new(file, Arc::from(parser)))
            .collect();
        let new_session = session.map(|(file, parsers)| {
            SessionParsers::new(file, parsers.into_iter().map(Arc::from).collect())
        });
        report.extend(self.registry.merge(new_legacy, new_session));
    }

    /// Rebuild the trace collection from the canonical set and recompute frames
    fn rebuild(&mut self) {
        let mut traces: Traces = self.registry.parsers().into_iter().collect();

        if let Some(factory) = &self.derived {
            for parser in factory.derive(&traces) {
                debug!("Adding derived {} trace", parser.category());
                traces.set(parser);
            }
        }
        if traces.contains(TraceCategory::Transitions) {
            traces.remove(TraceCategory::WmTransition);
            traces.remove(TraceCategory::ShellTransition);
        }
        if traces.contains(TraceCategory::Cujs) {
            traces.remove(TraceCategory::EventLog);
        }

        self.traces = traces;
        self.frames = FrameMapper::with_relations(&self.traces, self.relations.clone()).compute();
    }

    /// Evict one category and recompute frames
    pub fn remove_trace(&mut self, category: TraceCategory) -> bool {
        let removed = self.registry.remove(category) | self.traces.remove(category).is_some();
        if removed {
            self.frames = FrameMapper::with_relations(&self.traces, self.relations.clone()).compute();
        }
        removed
    }

    /// Forget everything loaded so far
    pub fn clear(&mut self) {
        self.registry.clear();
        self.traces = Traces::new();
        self.frames = FrameTable::default();
        self.converter = TimestampConverter::new();
        self.download_name = None;
    }

    pub fn traces(&self) -> &Traces {
        &self.traces
    }

    pub fn frames(&self) -> &FrameTable {
        &self.frames
    }

    pub fn registry(&self) -> &MergeRegistry {
        &self.registry
    }

    pub fn converter(&self) -> &TimestampConverter {
        &self.converter
    }

    /// Files backing the canonical set, laid out for download
    pub fn make_archive(&self) -> TraceArchive {
        self.registry.export_archive()
    }

    pub fn download_archive_filename(&self) -> String {
        self.download_name
            .clone()
            .unwrap_or_else(|| DEFAULT_ARCHIVE_NAME.to_string())
    }
}

impl std::fmt::Debug for TracePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TracePipeline")
            .field("registry", &self.registry)
            .field("traces", &self.traces)
            .field("frames", &self.frames.len())
            .finish()
    }
}
