//! trace-frames CLI
//!
//! Loads UI traces from several recordings, keeps one canonical trace per
//! category and correlates their entries by display frame.

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use trace_frames::commands::{display_relations, display_version, execute_load, validate_args, LoadArgs};
use trace_frames::utils::config::load_policy;

/// trace-frames - merge and frame-correlate UI traces
#[derive(Parser, Debug)]
#[command(name = "trace-frames")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Load traces and print or write the frame report
    Load {
        /// Trace files, gzip containers or directories, loaded in order
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Output path for the JSON report (printed to stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Export the canonical trace files into this directory
        #[arg(long)]
        export: Option<PathBuf>,

        /// Policy TOML file overriding merge and correlation thresholds
        #[arg(short, long, env = "TRACE_FRAMES_CONFIG")]
        config: Option<PathBuf>,

        /// Print text summary to stdout
        #[arg(long)]
        summary: bool,
    },

    /// Display the frame relation graph
    Relations {
        /// Apply gap overrides from a policy file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    match cli.command {
        Commands::Load {
            paths,
            output,
            export,
            config,
            summary,
        } => {
            let args = LoadArgs {
                inputs: paths,
                output_json: output,
                export_dir: export,
                config,
                print_summary: summary,
            };

            validate_args(&args)?;
            execute_load(args)?;
        }

        Commands::Relations { config } => {
            let policy = match config {
                Some(path) => load_policy(path)?,
                None => Default::default(),
            };
            display_relations(&policy.relations());
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}
