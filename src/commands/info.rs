//! Informational commands.

use crate::frames::FrameRelation;
use crate::trace::TraceCategory;
use crate::utils::config::SCHEMA_VERSION;

/// Display the relation graph used for frame correlation
pub fn display_relations(relations: &[FrameRelation]) {
    println!("Frame relations (frames flow from downstream to upstream):");
    println!();
    for relation in relations {
        println!(
            "  {:<22} <- {:<18} {} (max gap {} ms)",
            relation.upstream.to_string(),
            relation.downstream.to_string(),
            relation.link,
            relation.max_gap_ns / 1_000_000
        );
    }
    println!();
    println!("Archive layout:");
    for category in TraceCategory::ALL {
        let info = category.info();
        let dir = if info.archive_dir.is_empty() {
            "."
        } else {
            info.archive_dir
        };
        println!("  {:<26} {:<6} {}", info.name, dir, info.legacy_ext);
    }
}

/// Display version information
pub fn display_version() {
    println!("trace-frames v{}", env!("CARGO_PKG_VERSION"));
    println!("Report Schema: v{}", SCHEMA_VERSION);
    println!();
    println!("Merges UI traces from several recordings and correlates them by display frame.");
}
