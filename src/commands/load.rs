//! Load command implementation.
//!
//! The load command:
//! 1. Reads the policy configuration (optional)
//! 2. Collects input files, walking directories
//! 3. Runs the pipeline (unpack, decode, merge, correlate)
//! 4. Writes the JSON report and the exported archive

use crate::frames::FrameTable;
use crate::output::{report_to_string, write_archive, write_report, Report};
use crate::pipeline::{LoadReport, LogProgress, TracePipeline};
use crate::trace::TraceFile;
use crate::utils::config::{load_policy, PolicyConfig};
use anyhow::{Context, Result};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Arguments for the load command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone, Default)]
pub struct LoadArgs {
    /// Trace files, containers or directories to load, in order
    pub inputs: Vec<PathBuf>,

    /// Output path for the JSON report (stdout when absent)
    pub output_json: Option<PathBuf>,

    /// Directory receiving the canonical trace files
    pub export_dir: Option<PathBuf>,

    /// Policy TOML file
    pub config: Option<PathBuf>,

    /// Print text summary to stdout
    pub print_summary: bool,
}

/// Execute the load command
///
/// **Public** - main entry point called from main.rs
///
/// # Returns
/// The load report, so callers can inspect what was discarded
///
/// # Errors
/// * Policy file unreadable or invalid
/// * Input files unreadable
/// * Report or archive write errors
pub fn execute_load(args: LoadArgs) -> Result<LoadReport> {
    let start_time = Instant::now();

    let policy = match &args.config {
        Some(path) => load_policy(path)
            .with_context(|| format!("Failed to load policy from {}", path.display()))?,
        None => PolicyConfig::default(),
    };

    info!("Step 1/3: Reading input files...");
    let containers = read_inputs(&args.inputs).context("Failed to read input files")?;
    debug!("Read {} container(s)", containers.len());

    info!("Step 2/3: Loading traces...");
    let mut pipeline = TracePipeline::default()
        .with_policy(policy.merge_policy())
        .with_relations(policy.relations())
        .with_progress(Box::new(LogProgress));
    let load = pipeline.load_files(containers);

    info!("Step 3/3: Writing outputs...");
    let report = Report::new(&pipeline, &load);
    match &args.output_json {
        Some(path) => {
            write_report(&report, path).context("Failed to write report JSON")?;
            info!("✓ Report written to: {}", path.display());
        }
        None => println!("{}", report_to_string(&report).context("Failed to serialize report")?),
    }

    if let Some(dir) = &args.export_dir {
        let archive = pipeline.make_archive();
        let written = write_archive(&archive, dir)
            .with_context(|| format!("Failed to export traces to {}", dir.display()))?;
        info!("✓ Exported {} file(s) to: {}", written.len(), dir.display());
    }

    if args.print_summary {
        print_summary(&pipeline, &load);
    }

    info!("Load completed in {:.2}s", start_time.elapsed().as_secs_f64());
    Ok(load)
}

fn print_summary(pipeline: &TracePipeline, load: &LoadReport) {
    println!("\n{}", "=".repeat(80));
    println!("LOAD SUMMARY");
    println!("{}", "=".repeat(80));
    for parser in pipeline.traces().iter() {
        println!(
            "{:<24} {:>8} entries  {}",
            parser.category().to_string(),
            parser.len(),
            parser.descriptors().join(", ")
        );
    }
    println!("\nFrames: {}", pipeline.frames().len());
    println!("{}", frame_coverage(pipeline.frames()));

    if !load.diagnostics.is_empty() {
        println!("\nDiagnostics:");
        for diagnostic in &load.diagnostics {
            println!("  - {}", diagnostic);
        }
    }
    println!("{}", "=".repeat(80));
}

/// One line per framed category: how many frames contain any of its entries
fn frame_coverage(table: &FrameTable) -> String {
    table
        .categories()
        .iter()
        .map(|&category| {
            let covered = table
                .frames()
                .iter()
                .filter(|frame| frame.entries.get(&category).is_some_and(|e| !e.is_empty()))
                .count();
            format!("  {:<22} in {}/{} frames", category.to_string(), covered, table.len())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Read every input into memory, expanding directories in name order
fn read_inputs(inputs: &[PathBuf]) -> Result<Vec<TraceFile>> {
    let mut paths = Vec::new();
    for input in inputs {
        collect_files(input, &mut paths)?;
    }

    paths
        .into_iter()
        .map(|path| {
            let data = fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;
            Ok(TraceFile::new(path.display().to_string(), data))
        })
        .collect()
}

fn collect_files(path: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    if !path.is_dir() {
        out.push(path.to_path_buf());
        return Ok(());
    }

    let mut entries: Vec<PathBuf> = fs::read_dir(path)
        .with_context(|| format!("Failed to list {}", path.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .collect();
    entries.sort();
    for entry in entries {
        collect_files(&entry, out)?;
    }
    Ok(())
}

/// Validate load arguments
///
/// **Public** - can be called before execute_load for early validation
pub fn validate_args(args: &LoadArgs) -> Result<()> {
    if args.inputs.is_empty() {
        anyhow::bail!("At least one input path is required");
    }

    for input in &args.inputs {
        if !input.exists() {
            anyhow::bail!("Input does not exist: {}", input.display());
        }
    }

    if let Some(output) = &args.output_json {
        if output.is_dir() {
            anyhow::bail!("Report path is a directory: {}", output.display());
        }
    }

    if let Some(dir) = &args.export_dir {
        if dir.is_file() {
            anyhow::bail!("Export directory is a file: {}", dir.display());
        }
    }

    if let Some(config) = &args.config {
        if !config.is_file() {
            anyhow::bail!("Policy file not found: {}", config.display());
        }
    }

    Ok(())
}
