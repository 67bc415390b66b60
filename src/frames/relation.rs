//! The fixed graph of trace relations used for frame propagation.

use crate::trace::{CustomQueryType, TraceCategory};
use crate::utils::config::MAX_UI_PIPELINE_LATENCY_NS;
use serde::Serialize;
use std::fmt;

/// How entries of an upstream trace are matched to the downstream entries
/// that already carry frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkMode {
    /// Each downstream entry is caused by the last upstream entry before it
    LatestBefore,
    /// Entries sharing a key value belong together
    ExplicitKey(CustomQueryType),
    /// An upstream entry takes every downstream entry up to the next upstream one
    FollowingInterval,
    /// An upstream entry takes the first downstream entry at or after it
    PrecedingInterval,
    /// An upstream entry takes the closest downstream entry, the earlier one on ties
    Nearest,
}

impl fmt::Display for LinkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkMode::LatestBefore => f.write_str("latest upstream entry before each downstream entry"),
            LinkMode::ExplicitKey(CustomQueryType::VsyncId) => f.write_str("matching vsync id"),
            LinkMode::FollowingInterval => f.write_str("downstream entries until the next upstream entry"),
            LinkMode::PrecedingInterval => f.write_str("first downstream entry at or after"),
            LinkMode::Nearest => f.write_str("nearest downstream entry"),
        }
    }
}

/// An edge of the relation graph. Frames flow from `downstream` (already
/// framed) to `upstream`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FrameRelation {
    pub upstream: TraceCategory,
    pub downstream: TraceCategory,
    pub link: LinkMode,
    /// Entries farther apart than this are never linked
    pub max_gap_ns: i64,
}

impl FrameRelation {
    pub fn new(upstream: TraceCategory, downstream: TraceCategory, link: LinkMode) -> Self {
        Self {
            upstream,
            downstream,
            link,
            max_gap_ns: MAX_UI_PIPELINE_LATENCY_NS,
        }
    }
}

/// Categories that can seed the frame numbering, most preferred first
pub const ROOT_PREFERENCE: [TraceCategory; 4] = [
    TraceCategory::ScreenRecording,
    TraceCategory::SurfaceFlinger,
    TraceCategory::Transactions,
    TraceCategory::WindowManager,
];

/// Relations in propagation order. Each edge needs its downstream side
/// framed by an earlier edge or by the root.
pub fn default_relations() -> Vec<FrameRelation> {
    use TraceCategory::*;

    vec![
        FrameRelation::new(SurfaceFlinger, ScreenRecording, LinkMode::LatestBefore),
        FrameRelation::new(
            Transactions,
            SurfaceFlinger,
            LinkMode::ExplicitKey(CustomQueryType::VsyncId),
        ),
        FrameRelation::new(WindowManager, Transactions, LinkMode::FollowingInterval),
        FrameRelation::new(ProtoLog, WindowManager, LinkMode::PrecedingInterval),
        FrameRelation::new(InputMethodClients, WindowManager, LinkMode::Nearest),
        FrameRelation::new(InputMethodManagerService, WindowManager, LinkMode::Nearest),
        FrameRelation::new(InputMethodService, WindowManager, LinkMode::Nearest),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_edge_is_reachable_from_a_root() {
        let mut framed: Vec<TraceCategory> = ROOT_PREFERENCE.to_vec();
        for relation in default_relations() {
            assert!(
                framed.contains(&relation.downstream),
                "{} has no framed downstream",
                relation.upstream
            );
            framed.push(relation.upstream);
        }
    }

    #[test]
    fn test_ime_categories_all_follow_window_manager() {
        let ime: Vec<_> = default_relations()
            .into_iter()
            .filter(|r| r.upstream.is_input_method())
            .collect();
        assert_eq!(ime.len(), 3);
        assert!(ime
            .iter()
            .all(|r| r.downstream == TraceCategory::WindowManager && r.link == LinkMode::Nearest));
    }
}
