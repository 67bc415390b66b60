//! End-to-end loads through the default pipeline (gzip containers, JSON traces)

use flate2::write::GzEncoder;
use flate2::Compression;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::io::Write;
use std::sync::{Arc, Mutex};
use trace_frames::pipeline::{DerivedTraceFactory, ProgressListener, TracePipeline};
use trace_frames::trace::{ParserBuilder, Timestamp, TraceCategory, TraceFile, TraceParser, Traces};
use trace_frames::utils::Diagnostic;

fn json_file(name: &str, value: Value) -> TraceFile {
    TraceFile::new(name, serde_json::to_vec(&value).unwrap())
}

fn gzip_file(name: &str, value: Value) -> TraceFile {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&serde_json::to_vec(&value).unwrap()).unwrap();
    TraceFile::new(name, encoder.finish().unwrap())
}

fn real_trace(category: &str, timestamps: &[i64]) -> Value {
    json!({"category": category, "time_base": "real", "timestamps_ns": timestamps})
}

fn session() -> Value {
    json!({
        "session": [
            {
                "category": "surface_flinger",
                "time_base": "real",
                "timestamps_ns": [100, 200, 300],
                "vsync_ids": [1, 2, 3]
            },
            {
                "category": "transactions",
                "time_base": "real",
                "timestamps_ns": [90, 95, 280],
                "vsync_ids": [1, 1, 3]
            }
        ]
    })
}

#[test]
fn test_session_and_legacy_are_correlated() {
    let mut pipeline = TracePipeline::default();
    let report = pipeline.load_files(vec![
        gzip_file("session.json.gz", session()),
        json_file("wm.json", real_trace("window_manager", &[50, 150, 250])),
    ]);

    assert!(report.is_clean(), "{:?}", report.diagnostics);
    assert_eq!(
        report.categories,
        vec![
            TraceCategory::WindowManager,
            TraceCategory::SurfaceFlinger,
            TraceCategory::Transactions
        ]
    );

    let frames = pipeline.frames();
    assert_eq!(frames.len(), 3);
    assert!(frames.is_framed(TraceCategory::Transactions));
    assert!(frames.is_framed(TraceCategory::WindowManager));
    assert_eq!(frames.frames_of(TraceCategory::Transactions, 0), vec![0]);
    assert_eq!(frames.frames_of(TraceCategory::Transactions, 1), vec![0]);
    assert_eq!(frames.frames_of(TraceCategory::Transactions, 2), vec![2]);
    assert_eq!(frames.entries(0, TraceCategory::SurfaceFlinger), &[0]);
}

#[test]
fn test_corrupted_container_is_skipped() {
    let mut pipeline = TracePipeline::default();
    let report = pipeline.load_files(vec![TraceFile::new(
        "broken.json.gz",
        vec![0x1f, 0x8b, 0x00, 0x01, 0x02],
    )]);

    assert_eq!(
        report.diagnostics,
        vec![
            Diagnostic::CorruptedContainer {
                source: "broken.json.gz".into()
            },
            Diagnostic::NoInputFiles,
        ]
    );
    assert!(pipeline.traces().is_empty());
}

#[test]
fn test_corrupted_container_does_not_stop_the_batch() {
    let mut pipeline = TracePipeline::default();
    let report = pipeline.load_files(vec![
        TraceFile::new("broken.gz", vec![0x1f, 0x8b, 0x00]),
        json_file("wm.json", real_trace("window_manager", &[1, 2])),
    ]);

    assert_eq!(
        report.diagnostics,
        vec![Diagnostic::CorruptedContainer {
            source: "broken.gz".into()
        }]
    );
    assert!(pipeline.traces().contains(TraceCategory::WindowManager));
}

#[test]
fn test_nothing_to_load() {
    let mut pipeline = TracePipeline::default();
    assert_eq!(pipeline.load_files(vec![]).diagnostics, vec![Diagnostic::NoInputFiles]);

    let report = pipeline.load_files(vec![TraceFile::new("notes.txt", b"hello".as_slice())]);
    assert_eq!(
        report.diagnostics,
        vec![
            Diagnostic::UnsupportedFile {
                source: "notes.txt".into()
            },
            Diagnostic::NoInputFiles,
        ]
    );
}

#[test]
fn test_undecodable_trace_is_reported() {
    let mut pipeline = TracePipeline::default();
    let report = pipeline.load_files(vec![json_file("audio.json", json!({"category": "audio"}))]);

    assert_eq!(report.diagnostics.len(), 1);
    assert!(matches!(
        &report.diagnostics[0],
        Diagnostic::InvalidTrace { source, .. } if source == "audio.json"
    ));
}

#[test]
fn test_later_container_replaces_earlier_one() {
    let mut pipeline = TracePipeline::default();
    let report = pipeline.load_files(vec![
        json_file("wm_a.json", real_trace("window_manager", &[1, 2, 3, 4])),
        json_file("wm_b.json", real_trace("window_manager", &[1, 2])),
    ]);

    assert_eq!(report.diagnostics, vec![Diagnostic::overridden("wm_a.json")]);
    let wm = pipeline.traces().get(TraceCategory::WindowManager).unwrap();
    assert_eq!(wm.descriptors(), vec!["wm_b.json".to_string()]);
}

#[test]
fn test_epoch_offset_is_shared_across_loads() {
    let mut pipeline = TracePipeline::default();
    pipeline.load_files(vec![json_file(
        "wm.json",
        json!({"category": "window_manager", "timestamps_ns": [1, 2], "real_to_elapsed_offset_ns": 1000}),
    )]);
    assert_eq!(pipeline.converter().real_to_elapsed_offset_ns(), Some(1000));

    pipeline.load_files(vec![json_file(
        "sf.json",
        json!({"category": "surface_flinger", "timestamps_ns": [5, 6], "real_to_elapsed_offset_ns": 2000}),
    )]);
    assert_eq!(pipeline.converter().real_to_elapsed_offset_ns(), Some(2000));

    let traces = pipeline.traces();
    let sf = traces.get(TraceCategory::SurfaceFlinger).unwrap();
    assert_eq!(sf.timestamps()[0], Timestamp::real(2005));
    let wm = traces.get(TraceCategory::WindowManager).unwrap();
    assert_eq!(wm.timestamps()[0], Timestamp::real(1001));

    // No offset of its own: stays on the elapsed clock and loses to real traces
    let report = pipeline.load_files(vec![json_file(
        "protolog.json",
        json!({"category": "proto_log", "timestamps_ns": [3, 4]}),
    )]);
    assert_eq!(report.diagnostics, vec![Diagnostic::old_data("protolog.json", None)]);
    assert!(!pipeline.traces().contains(TraceCategory::ProtoLog));
}

struct MergedTransitions;

impl DerivedTraceFactory for MergedTransitions {
    fn derive(&self, traces: &Traces) -> Vec<Arc<dyn TraceParser>> {
        if !(traces.contains(TraceCategory::WmTransition) && traces.contains(TraceCategory::ShellTransition)) {
            return Vec::new();
        }
        vec![ParserBuilder::new(TraceCategory::Transitions)
            .real_timestamps([10, 20])
            .build()]
    }
}

#[test]
fn test_merged_traces_hide_their_halves() {
    let mut pipeline = TracePipeline::default().with_derived_traces(Box::new(MergedTransitions));
    let report = pipeline.load_files(vec![
        json_file("wm_transition.json", real_trace("wm_transition", &[10, 20])),
        json_file("shell_transition.json", real_trace("shell_transition", &[11, 21])),
        json_file("eventlog.json", real_trace("event_log", &[10, 15])),
        json_file("cujs.json", real_trace("cujs", &[12])),
    ]);
    assert!(report.is_clean(), "{:?}", report.diagnostics);

    let traces = pipeline.traces();
    assert!(traces.contains(TraceCategory::Transitions));
    assert!(traces.contains(TraceCategory::Cujs));
    assert!(!traces.contains(TraceCategory::WmTransition));
    assert!(!traces.contains(TraceCategory::ShellTransition));
    assert!(!traces.contains(TraceCategory::EventLog));

    // The halves stay canonical so they are still exported
    assert!(pipeline.registry().contains(TraceCategory::WmTransition));
    assert!(pipeline.registry().contains(TraceCategory::EventLog));
}

#[test]
fn test_remove_trace_recomputes_frames() {
    let mut pipeline = TracePipeline::default();
    pipeline.load_files(vec![gzip_file("session.json.gz", session())]);
    assert!(pipeline.frames().is_framed(TraceCategory::Transactions));

    assert!(pipeline.remove_trace(TraceCategory::Transactions));
    assert!(!pipeline.traces().contains(TraceCategory::Transactions));
    assert!(!pipeline.frames().is_framed(TraceCategory::Transactions));
    assert_eq!(pipeline.frames().len(), 3);

    assert!(!pipeline.remove_trace(TraceCategory::Transactions));
}

#[test]
fn test_clear_forgets_everything() {
    let mut pipeline = TracePipeline::default();
    pipeline.load_files(vec![gzip_file("session.json.gz", session())]);
    pipeline.clear();

    assert!(pipeline.traces().is_empty());
    assert!(pipeline.registry().is_empty());
    assert!(pipeline.frames().is_empty());
    assert_eq!(pipeline.converter().real_to_elapsed_offset_ns(), None);
    assert_eq!(pipeline.download_archive_filename(), "traces");
}

#[test]
fn test_archive_layout() {
    let mut pipeline = TracePipeline::default();
    pipeline.load_files(vec![
        gzip_file("session.json.gz", session()),
        json_file("wm.json", real_trace("window_manager", &[50, 150, 250])),
    ]);

    let archive = pipeline.make_archive();
    assert_eq!(archive.paths(), vec!["session.json", "wm/wm.json"]);
}

#[test]
fn test_download_name() {
    let timestamp_len = "_20260101_000000".len();

    let mut pipeline = TracePipeline::default().with_source_label("upload");
    assert_eq!(pipeline.download_archive_filename(), "traces");

    pipeline.load_files(vec![json_file("capture.json", real_trace("window_manager", &[1, 2]))]);
    let name = pipeline.download_archive_filename();
    assert!(name.starts_with("capture_"), "{}", name);
    assert_eq!(name.len(), "capture".len() + timestamp_len);

    pipeline.load_files(vec![
        json_file("a.json", real_trace("proto_log", &[1, 2])),
        json_file("b.json", real_trace("surface_flinger", &[1, 2])),
    ]);
    assert!(pipeline.download_archive_filename().starts_with("upload_"));
}

#[derive(Default)]
struct RecordingProgress {
    events: Arc<Mutex<Vec<(String, f64)>>>,
    finished: Arc<Mutex<bool>>,
}

impl ProgressListener for RecordingProgress {
    fn on_progress(&self, message: &str, percentage: f64) {
        self.events.lock().unwrap().push((message.to_string(), percentage));
    }

    fn on_finished(&self) {
        *self.finished.lock().unwrap() = true;
    }
}

#[test]
fn test_progress_reaches_completion() {
    let listener = RecordingProgress::default();
    let (events, finished) = (listener.events.clone(), listener.finished.clone());

    let mut pipeline = TracePipeline::default().with_progress(Box::new(listener));
    pipeline.load_files(vec![
        json_file("wm.json", real_trace("window_manager", &[1, 2])),
        json_file("sf.json", real_trace("surface_flinger", &[1, 2])),
    ]);

    let events = events.lock().unwrap();
    assert!(!events.is_empty());
    assert!(events.iter().all(|(_, p)| (0.0..=100.0).contains(p)));
    assert_eq!(events.last().map(|(_, p)| *p), Some(100.0));
    assert!(*finished.lock().unwrap());
}
