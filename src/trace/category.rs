//! Trace categories and their static properties.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic kind of a trace stream. At most one canonical trace per category
/// is loaded at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceCategory {
    WindowManager,
    SurfaceFlinger,
    Transactions,
    ProtoLog,
    ScreenRecording,
    Screenshot,
    InputMethodClients,
    InputMethodManagerService,
    InputMethodService,
    WmTransition,
    ShellTransition,
    Transitions,
    EventLog,
    Cujs,
    ViewCapture,
}

/// Static per-category information
#[derive(Debug, Clone, Copy)]
pub struct CategoryInfo {
    pub name: &'static str,
    /// Directory token used when exporting an archive (empty = archive root)
    pub archive_dir: &'static str,
    /// Extension appended on export to files without a recognized one
    pub legacy_ext: &'static str,
    pub recognized_exts: &'static [&'static str],
}

const PROTO_EXTS: &[&str] = &[".winscope", ".pb", ".json"];

impl TraceCategory {
    pub const ALL: [TraceCategory; 15] = [
        TraceCategory::WindowManager,
        TraceCategory::SurfaceFlinger,
        TraceCategory::Transactions,
        TraceCategory::ProtoLog,
        TraceCategory::ScreenRecording,
        TraceCategory::Screenshot,
        TraceCategory::InputMethodClients,
        TraceCategory::InputMethodManagerService,
        TraceCategory::InputMethodService,
        TraceCategory::WmTransition,
        TraceCategory::ShellTransition,
        TraceCategory::Transitions,
        TraceCategory::EventLog,
        TraceCategory::Cujs,
        TraceCategory::ViewCapture,
    ];

    pub fn info(self) -> CategoryInfo {
        let (name, archive_dir) = match self {
            TraceCategory::WindowManager => ("Window Manager", "wm"),
            TraceCategory::SurfaceFlinger => ("Surface Flinger", "sf"),
            TraceCategory::Transactions => ("Transactions", "sf"),
            TraceCategory::ProtoLog => ("ProtoLog", "wm"),
            TraceCategory::ScreenRecording => {
                return CategoryInfo {
                    name: "Screen Recording",
                    archive_dir: "",
                    legacy_ext: ".mp4",
                    recognized_exts: &[".mp4"],
                }
            }
            TraceCategory::Screenshot => {
                return CategoryInfo {
                    name: "Screenshot",
                    archive_dir: "",
                    legacy_ext: ".png",
                    recognized_exts: &[".png"],
                }
            }
            TraceCategory::InputMethodClients => ("IME Clients", "ime"),
            TraceCategory::InputMethodManagerService => ("IME Manager Service", "ime"),
            TraceCategory::InputMethodService => ("IME Service", "ime"),
            TraceCategory::WmTransition => ("WM Transitions", "wm"),
            TraceCategory::ShellTransition => ("Shell Transitions", "shell"),
            TraceCategory::Transitions => ("Transitions", ""),
            TraceCategory::EventLog => ("Event Log", ""),
            TraceCategory::Cujs => ("CUJs", ""),
            TraceCategory::ViewCapture => ("View Capture", "vc"),
        };
        CategoryInfo {
            name,
            archive_dir,
            legacy_ext: ".winscope",
            recognized_exts: PROTO_EXTS,
        }
    }

    /// Input method traces are all correlated against window manager state
    pub fn is_input_method(self) -> bool {
        matches!(
            self,
            TraceCategory::InputMethodClients
                | TraceCategory::InputMethodManagerService
                | TraceCategory::InputMethodService
        )
    }
}

impl fmt::Display for TraceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.info().name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_names_are_snake_case() {
        let json = serde_json::to_string(&TraceCategory::InputMethodManagerService).unwrap();
        assert_eq!(json, "\"input_method_manager_service\"");

        let parsed: TraceCategory = serde_json::from_str("\"proto_log\"").unwrap();
        assert_eq!(parsed, TraceCategory::ProtoLog);
    }

    #[test]
    fn test_all_is_exhaustive_and_ordered() {
        let mut sorted = TraceCategory::ALL.to_vec();
        sorted.sort();
        assert_eq!(sorted, TraceCategory::ALL.to_vec());
        assert!(TraceCategory::ALL
            .iter()
            .all(|c| c.info().recognized_exts.contains(&c.info().legacy_ext)));
    }
}
