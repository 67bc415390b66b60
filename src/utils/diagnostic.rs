//! User-facing diagnostics emitted while loading traces.
//!
//! A load never aborts on a single bad input: every dropped container, file or
//! parser is reported here and processing continues with the rest.

use crate::trace::{TimeRange, TraceCategory};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A trace was discarded in favour of another source. `dominant` names the
    /// winning category when it differs from the discarded trace's own.
    Overridden {
        source: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        dominant: Option<TraceCategory>,
    },

    /// A trace was discarded because its data predates the rest of the load.
    /// `gap` is present when the decision came from a time gap between traces.
    OldData {
        source: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        gap: Option<TimeRange>,
    },

    CorruptedContainer { source: String },

    NoInputFiles,

    UnsupportedFile { source: String },

    InvalidTrace { source: String, reason: String },
}

impl Diagnostic {
    pub fn overridden(source: impl Into<String>) -> Self {
        Diagnostic::Overridden {
            source: source.into(),
            dominant: None,
        }
    }

    pub fn overridden_by(source: impl Into<String>, dominant: TraceCategory) -> Self {
        Diagnostic::Overridden {
            source: source.into(),
            dominant: Some(dominant),
        }
    }

    pub fn old_data(source: impl Into<String>, gap: Option<TimeRange>) -> Self {
        Diagnostic::OldData {
            source: source.into(),
            gap,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::Overridden {
                source,
                dominant: Some(category),
            } => write!(f, "{source} was overridden by {category}"),
            Diagnostic::Overridden {
                source,
                dominant: None,
            } => write!(f, "{source} was overridden by another trace of the same type"),
            Diagnostic::OldData {
                source,
                gap: Some(gap),
            } => write!(
                f,
                "{source} discarded because it contains old data ({} gap between {} and {})",
                gap.duration_string(),
                gap.from,
                gap.to
            ),
            Diagnostic::OldData { source, gap: None } => write!(
                f,
                "{source} discarded because it only has elapsed timestamps while other traces have real ones"
            ),
            Diagnostic::CorruptedContainer { source } => {
                write!(f, "{source} is corrupted and was skipped")
            }
            Diagnostic::NoInputFiles => write!(f, "Input has no valid trace files"),
            Diagnostic::UnsupportedFile { source } => {
                write!(f, "{source} is not a supported trace file")
            }
            Diagnostic::InvalidTrace { source, reason } => {
                write!(f, "{source} could not be decoded: {reason}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::Timestamp;

    #[test]
    fn test_display_names_dominant_category() {
        let diagnostic = Diagnostic::overridden_by("screenshot.png", TraceCategory::ScreenRecording);
        assert_eq!(
            diagnostic.to_string(),
            "screenshot.png was overridden by Screen Recording"
        );
    }

    #[test]
    fn test_serializes_with_kind_tag() {
        let diagnostic = Diagnostic::old_data(
            "sf.pb",
            Some(TimeRange::new(Timestamp::elapsed(4), Timestamp::elapsed(100))),
        );
        let json = serde_json::to_value(&diagnostic).unwrap();
        assert_eq!(json["kind"], "old_data");
        assert_eq!(json["gap"]["from"]["value_ns"], 4);
        assert_eq!(json["gap"]["to"]["value_ns"], 100);
    }
}
