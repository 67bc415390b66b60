//! Ranking and eviction rules applied by the merge registry.

use crate::trace::{TimeRange, TimelineExt, TraceCategory, TraceParser};
use crate::utils::config::MAX_ALLOWED_TIME_GAP_BETWEEN_TRACES_NS;
use std::sync::Arc;

/// Tunable thresholds of the merge policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergePolicy {
    /// A trace ending more than this before another one starts is dropped
    pub max_time_gap_ns: i64,
}

impl Default for MergePolicy {
    fn default() -> Self {
        Self {
            max_time_gap_ns: MAX_ALLOWED_TIME_GAP_BETWEEN_TRACES_NS,
        }
    }
}

/// Precedence between two same-category candidates of the same coarseness.
///
/// Variants are ordered: any timeline beats a dump, a dump beats an empty
/// trace, and longer timelines beat shorter ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Rank {
    Empty,
    Dump,
    Timeline { span_ns: i64 },
}

pub fn rank(parser: &dyn TraceParser) -> Rank {
    match parser.timestamps().len() {
        0 => Rank::Empty,
        1 => Rank::Dump,
        _ => Rank::Timeline {
            span_ns: parser.span_ns(),
        },
    }
}

/// Merged transitions take their timestamps from the shell producer only, so
/// WM transition timestamps must not decide whether data is stale.
const OLD_DATA_EXEMPT: &[TraceCategory] = &[TraceCategory::WmTransition];

/// Compare by address only; two `Arc`s of the same parser may carry different vtables
pub(crate) fn same_parser(a: &Arc<dyn TraceParser>, b: &Arc<dyn TraceParser>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

fn has_valid_timeline(parser: &dyn TraceParser) -> bool {
    !parser.is_empty() && !parser.timestamps().is_empty() && !parser.is_dump()
}

/// Gap proving `candidate` is a dangling file from an earlier recording:
/// another trace starts more than `policy.max_time_gap_ns` after it ends.
pub(crate) fn find_old_data_gap(
    candidate: &Arc<dyn TraceParser>,
    pool: &[Arc<dyn TraceParser>],
    policy: &MergePolicy,
) -> Option<TimeRange> {
    if OLD_DATA_EXEMPT.contains(&candidate.category()) || !has_valid_timeline(candidate.as_ref()) {
        return None;
    }
    let end = candidate.last_timestamp()?;

    pool.iter()
        .filter(|other| !same_parser(other, candidate))
        .filter(|other| has_valid_timeline(other.as_ref()))
        .filter_map(|other| other.first_timestamp())
        .find(|start| start.value_ns.saturating_sub(end.value_ns) > policy.max_time_gap_ns)
        .map(|start| TimeRange::new(end, start))
}

/// Whether some parser other than `candidate` carries wall-clock timestamps
pub(crate) fn has_real_elsewhere(candidate: &Arc<dyn TraceParser>, pool: &[Arc<dyn TraceParser>]) -> bool {
    pool.iter()
        .any(|other| !same_parser(other, candidate) && other.has_real_timestamps())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::{ParserBuilder, Timestamp};

    fn real(category: TraceCategory, ts: &[i64]) -> Arc<dyn TraceParser> {
        ParserBuilder::new(category)
            .real_timestamps(ts.iter().copied())
            .build()
    }

    #[test]
    fn test_rank_order() {
        let empty = real(TraceCategory::WindowManager, &[]);
        let dump = real(TraceCategory::WindowManager, &[7]);
        let short = real(TraceCategory::WindowManager, &[0, 1, 2, 3, 4, 5, 6]);
        let long = real(TraceCategory::WindowManager, &[0, 10]);

        assert!(rank(empty.as_ref()) < rank(dump.as_ref()));
        assert!(rank(dump.as_ref()) < rank(short.as_ref()));
        assert!(rank(short.as_ref()) < rank(long.as_ref()));
    }

    #[test]
    fn test_old_data_gap_found() {
        let policy = MergePolicy { max_time_gap_ns: 90 };
        let old = real(TraceCategory::SurfaceFlinger, &[0, 1, 2, 3, 4]);
        let new = real(TraceCategory::WindowManager, &[100, 101, 102, 103, 104]);
        let pool = vec![old.clone(), new.clone()];

        assert_eq!(
            find_old_data_gap(&old, &pool, &policy),
            Some(TimeRange::new(Timestamp::real(4), Timestamp::real(100)))
        );
        assert_eq!(find_old_data_gap(&new, &pool, &policy), None);
    }

    #[test]
    fn test_gap_equal_to_threshold_is_kept() {
        let policy = MergePolicy { max_time_gap_ns: 96 };
        let old = real(TraceCategory::SurfaceFlinger, &[0, 4]);
        let new = real(TraceCategory::WindowManager, &[100, 104]);
        let pool = vec![old.clone(), new];
        assert_eq!(find_old_data_gap(&old, &pool, &policy), None);
    }

    #[test]
    fn test_dumps_never_old_and_never_evidence() {
        let policy = MergePolicy { max_time_gap_ns: 10 };
        let dump = real(TraceCategory::WindowManager, &[0]);
        let timeline = real(TraceCategory::SurfaceFlinger, &[0, 5]);
        let late_dump = real(TraceCategory::ProtoLog, &[1_000]);
        let pool = vec![dump.clone(), timeline.clone(), late_dump];

        assert_eq!(find_old_data_gap(&dump, &pool, &policy), None);
        assert_eq!(find_old_data_gap(&timeline, &pool, &policy), None);
    }

    #[test]
    fn test_has_real_elsewhere_ignores_self() {
        let real_sf = real(TraceCategory::SurfaceFlinger, &[1]);
        let elapsed = ParserBuilder::new(TraceCategory::WindowManager)
            .elapsed_timestamps([1])
            .build();

        assert!(!has_real_elsewhere(&real_sf, &[real_sf.clone()]));
        assert!(has_real_elsewhere(&elapsed, &[real_sf, elapsed.clone()]));
    }
}
