//! JSON load report writer.
//!
//! Writes the outcome of a load (traces, diagnostics and frame table) to a
//! JSON file with proper formatting.

use crate::frames::FrameTable;
use crate::pipeline::{LoadReport, TracePipeline};
use crate::trace::{Coarseness, TimelineExt, Timestamp, TraceCategory};
use crate::utils::config::SCHEMA_VERSION;
use crate::utils::error::OutputError;
use crate::utils::Diagnostic;
use log::{debug, info};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// One loaded trace as listed in the report
#[derive(Debug, Clone, Serialize)]
pub struct TraceSummary {
    pub category: TraceCategory,
    pub coarseness: Coarseness,
    pub entries: usize,
    pub sources: Vec<String>,
    pub first: Option<Timestamp>,
    pub last: Option<Timestamp>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report<'a> {
    pub version: &'static str,
    pub generated_at: String,
    pub archive_name: String,
    pub traces: Vec<TraceSummary>,
    pub diagnostics: &'a [Diagnostic],
    pub frames: &'a FrameTable,
}

impl<'a> Report<'a> {
    /// Snapshot of `pipeline` after the load that produced `load`
    pub fn new(pipeline: &'a TracePipeline, load: &'a LoadReport) -> Self {
        let traces = pipeline
            .traces()
            .iter()
            .map(|parser| TraceSummary {
                category: parser.category(),
                coarseness: parser.coarseness(),
                entries: parser.len(),
                sources: parser.descriptors(),
                first: parser.first_timestamp(),
                last: parser.last_timestamp(),
            })
            .collect();

        Self {
            version: SCHEMA_VERSION,
            generated_at: chrono::Utc::now().to_rfc3339(),
            archive_name: pipeline.download_archive_filename(),
            traces,
            diagnostics: &load.diagnostics,
            frames: pipeline.frames(),
        }
    }
}

/// Write a load report to a JSON file
///
/// **Public** - main entry point for JSON output
///
/// # Arguments
/// * `report` - Report to write
/// * `output_path` - Path to output JSON file
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::SerializationFailed` - JSON serialization error
/// * `OutputError::InvalidPath` - Path cannot be created or is invalid
pub fn write_report(report: &Report<'_>, output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    info!("Writing report to: {}", output_path.display());

    validate_output_path(output_path)?;
    create_parent_dirs(output_path)?;

    let file = File::create(output_path).map_err(OutputError::WriteFailed)?;
    let writer = BufWriter::new(file);

    serde_json::to_writer_pretty(writer, report).map_err(OutputError::SerializationFailed)?;

    info!("Report written successfully ({} bytes)", calculate_file_size(output_path));

    Ok(())
}

/// Serialize a report to a string (for stdout or tests)
pub fn report_to_string(report: &Report<'_>) -> Result<String, OutputError> {
    serde_json::to_string_pretty(report).map_err(OutputError::SerializationFailed)
}

pub(crate) fn create_parent_dirs(path: &Path) -> Result<(), OutputError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating parent directories: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                OutputError::InvalidPath(format!("Cannot create directory {}: {}", parent.display(), e))
            })?;
        }
    }
    Ok(())
}

/// Validate that output path is writable
///
/// **Private** - internal validation
fn validate_output_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("Path is empty".to_string()));
    }

    if path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    Ok(())
}

fn calculate_file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_rejects_directory_path() {
        let dir = TempDir::new().unwrap();
        let pipeline = TracePipeline::default();
        let load = LoadReport::default();
        let report = Report::new(&pipeline, &load);

        assert!(matches!(
            write_report(&report, dir.path()),
            Err(OutputError::InvalidPath(_))
        ));
        assert!(matches!(write_report(&report, ""), Err(OutputError::InvalidPath(_))));
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/out/report.json");
        let pipeline = TracePipeline::default();
        let load = LoadReport::default();

        write_report(&Report::new(&pipeline, &load), &path).unwrap();

        let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["version"], SCHEMA_VERSION);
        assert_eq!(json["archive_name"], "traces");
        assert!(json["traces"].as_array().unwrap().is_empty());
    }
}
