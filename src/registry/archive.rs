//! Download layout of the canonical trace files.

use crate::trace::{LoadedParser, TraceFile};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;

use crate::utils::config::DEFAULT_ARCHIVE_NAME;

const SESSION_EXT: &str = ".perfetto-trace";
const SESSION_EXTS: &[&str] = &[".perfetto-trace", ".pftrace", ".perfetto", ".json"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Relative path inside the archive, `/`-separated
    pub path: String,
    pub data: Arc<[u8]>,
}

/// In-memory archive ready to be written out
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraceArchive {
    pub entries: Vec<ArchiveEntry>,
}

impl TraceArchive {
    pub fn paths(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.path.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_size(&self) -> usize {
        self.entries.iter().map(|entry| entry.data.len()).sum()
    }

    /// Add `data` at `path`, renaming to `stem (n).ext` on clashes
    fn push_unique(&mut self, taken: &mut HashSet<String>, path: String, data: Arc<[u8]>) {
        let mut candidate = path.clone();
        let mut n = 1;
        while taken.contains(&candidate) {
            candidate = with_suffix(&path, n);
            n += 1;
        }
        taken.insert(candidate.clone());
        self.entries.push(ArchiveEntry { path: candidate, data });
    }
}

fn with_suffix(path: &str, n: usize) -> String {
    let (dir, base) = match path.rfind('/') {
        Some(i) => (&path[..=i], &path[i + 1..]),
        None => ("", path),
    };
    match base.rfind('.').filter(|&i| i > 0) {
        Some(i) => format!("{}{} ({}){}", dir, &base[..i], n, &base[i..]),
        None => format!("{}{} ({})", dir, base, n),
    }
}

fn ensure_extension(file: &TraceFile, recognized: &[&str], fallback: &str) -> String {
    let base = file.base_name();
    match file.extension() {
        Some(ext) if recognized.contains(&ext.as_str()) => base.to_string(),
        _ => format!("{}{}", base, fallback),
    }
}

pub(crate) fn build_archive<'a>(
    session: Option<&TraceFile>,
    legacy: impl Iterator<Item = &'a LoadedParser>,
) -> TraceArchive {
    let mut archive = TraceArchive::default();
    let mut taken = HashSet::new();

    if let Some(file) = session {
        let path = ensure_extension(file, SESSION_EXTS, SESSION_EXT);
        archive.push_unique(&mut taken, path, file.data.clone());
    }

    for loaded in legacy {
        let info = loaded.category().info();
        let name = ensure_extension(&loaded.file, info.recognized_exts, info.legacy_ext);
        let path = if info.archive_dir.is_empty() {
            name
        } else {
            format!("{}/{}", info.archive_dir, name)
        };
        archive.push_unique(&mut taken, path, loaded.file.data.clone());
    }
    archive
}

/// Suggested file name for a download of the loaded traces.
///
/// A single loaded file keeps its own name; otherwise `label` (typically the
/// name of the uploaded container) is used. The download time is appended
/// and characters unsafe in file names are replaced.
///
/// # Arguments
/// * `files` - Files backing the canonical set
/// * `label` - Name to use when several files are loaded
/// * `now` - Download time
pub fn download_archive_filename(files: &[&TraceFile], label: Option<&str>, now: DateTime<Utc>) -> String {
    let stem = match files {
        [single] => {
            let base = single.base_name();
            match single.extension() {
                Some(ext) => base[..base.len() - ext.len()].to_string(),
                None => base.to_string(),
            }
        }
        _ => label.unwrap_or_default().to_string(),
    };
    let stem = sanitize(&stem);
    let stem = if stem.is_empty() {
        DEFAULT_ARCHIVE_NAME.to_string()
    } else {
        stem
    };
    format!("{}_{}", stem, now.format("%Y%m%d_%H%M%S"))
}

fn sanitize(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::{ParserBuilder, TraceCategory};
    use chrono::TimeZone;

    fn loaded(category: TraceCategory, name: &str) -> LoadedParser {
        let parser = ParserBuilder::new(category).real_timestamps([1, 2]).build();
        LoadedParser::new(TraceFile::new(name, name.as_bytes()), parser)
    }

    #[test]
    fn test_layout_by_category() {
        let session = TraceFile::new("capture", b"perfetto".as_slice());
        let legacy = [
            loaded(TraceCategory::WindowManager, "wm_trace.pb"),
            loaded(TraceCategory::Transactions, "dir/transactions"),
            loaded(TraceCategory::ScreenRecording, "screen.mp4"),
            loaded(TraceCategory::Screenshot, "shot"),
        ];

        let archive = build_archive(Some(&session), legacy.iter());
        assert_eq!(
            archive.paths(),
            vec![
                "capture.perfetto-trace",
                "wm/wm_trace.pb",
                "sf/transactions.winscope",
                "screen.mp4",
                "shot.png",
            ]
        );
        assert_eq!(&*archive.entries[0].data, b"perfetto");
        let names: usize = ["wm_trace.pb", "dir/transactions", "screen.mp4", "shot"].iter().map(|n| n.len()).sum();
        assert_eq!(archive.total_size(), "perfetto".len() + names);
    }

    #[test]
    fn test_clashing_names_get_suffix() {
        let legacy = [
            loaded(TraceCategory::SurfaceFlinger, "a/trace.pb"),
            loaded(TraceCategory::Transactions, "b/trace.pb"),
            loaded(TraceCategory::EventLog, "notes"),
            loaded(TraceCategory::Cujs, "notes.winscope"),
        ];

        let archive = build_archive(None, legacy.iter());
        assert_eq!(
            archive.paths(),
            vec!["sf/trace.pb", "sf/trace (1).pb", "notes.winscope", "notes (1).winscope"]
        );
    }

    #[test]
    fn test_download_filename() {
        let now = Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
        let wm = TraceFile::new("traces/wm_trace.pb", b"".as_slice());
        let sf = TraceFile::new("sf.pb", b"".as_slice());

        assert_eq!(download_archive_filename(&[&wm], None, now), "wm_trace_20240305_140709");
        assert_eq!(
            download_archive_filename(&[&wm, &sf], Some("bug:report"), now),
            "bug_report_20240305_140709"
        );
        assert_eq!(download_archive_filename(&[&wm, &sf], None, now), "traces_20240305_140709");
    }
}
