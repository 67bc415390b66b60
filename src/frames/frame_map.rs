//! Per-entry frame ranges and the matching rules that propagate them.
//!
//! All matching functions take entry timestamps in nanoseconds, ascending.

use std::collections::HashMap;
use std::ops::Range;

/// Half-open range of frame indices covered by one entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramesRange {
    pub start: usize,
    pub end: usize,
}

impl FramesRange {
    pub fn single(frame: usize) -> Self {
        Self {
            start: frame,
            end: frame + 1,
        }
    }

    pub fn union(self, other: FramesRange) -> FramesRange {
        FramesRange {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn frames(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Frames of every entry of one trace; `None` for entries outside any frame
pub type FrameMap = Vec<Option<FramesRange>>;

fn merge(acc: Option<FramesRange>, next: Option<FramesRange>) -> Option<FramesRange> {
    match (acc, next) {
        (Some(a), Some(b)) => Some(a.union(b)),
        (a, b) => a.or(b),
    }
}

/// Number the entries of the root trace. Consecutive entries sharing a key
/// share a frame.
pub fn root_frames(len: usize, keys: Option<&[i64]>) -> FrameMap {
    let Some(keys) = keys.filter(|keys| keys.len() == len) else {
        return (0..len).map(|i| Some(FramesRange::single(i))).collect();
    };

    let mut frame = 0;
    keys.iter()
        .enumerate()
        .map(|(i, key)| {
            if i > 0 && keys[i - 1] != *key {
                frame += 1;
            }
            Some(FramesRange::single(frame))
        })
        .collect()
}

/// Each downstream entry hands its frames to the last upstream entry strictly
/// before it, if that entry is within `max_gap_ns`.
pub fn latest_before(upstream: &[i64], downstream: &[i64], frames: &[Option<FramesRange>], max_gap_ns: i64) -> FrameMap {
    let mut map = vec![None; upstream.len()];
    for (&t, &range) in downstream.iter().zip(frames) {
        let before = upstream.partition_point(|&u| u < t);
        if before == 0 || range.is_none() {
            continue;
        }
        let i = before - 1;
        if t.saturating_sub(upstream[i]) <= max_gap_ns {
            map[i] = merge(map[i], range);
        }
    }
    map
}

pub fn explicit_key(upstream_keys: &[i64], downstream_keys: &[i64], frames: &[Option<FramesRange>]) -> FrameMap {
    let mut by_key: HashMap<i64, FramesRange> = HashMap::new();
    for (&key, &range) in downstream_keys.iter().zip(frames) {
        if let Some(range) = range {
            by_key
                .entry(key)
                .and_modify(|acc| *acc = acc.union(range))
                .or_insert(range);
        }
    }
    upstream_keys.iter().map(|key| by_key.get(key).copied()).collect()
}

/// Upstream entry `i` takes the downstream entries in
/// `[u_i, min(u_{i+1}, u_i + max_gap_ns))`.
pub fn following_interval(
    upstream: &[i64],
    downstream: &[i64],
    frames: &[Option<FramesRange>],
    max_gap_ns: i64,
) -> FrameMap {
    upstream
        .iter()
        .enumerate()
        .map(|(i, &from)| {
            let limit = from.saturating_add(max_gap_ns);
            let to = upstream.get(i + 1).map_or(limit, |&next| next.min(limit));
            let lo = downstream.partition_point(|&d| d < from);
            let hi = downstream.partition_point(|&d| d < to).min(frames.len());
            if hi <= lo {
                return None;
            }
            frames[lo..hi].iter().copied().fold(None, merge)
        })
        .collect()
}

/// Upstream entry takes the first downstream entry at or after it
pub fn preceding_interval(
    upstream: &[i64],
    downstream: &[i64],
    frames: &[Option<FramesRange>],
    max_gap_ns: i64,
) -> FrameMap {
    upstream
        .iter()
        .map(|&u| {
            let j = downstream.partition_point(|&d| d < u);
            match downstream.get(j) {
                Some(&d) if d.saturating_sub(u) <= max_gap_ns => frames.get(j).copied().flatten(),
                _ => None,
            }
        })
        .collect()
}

/// Upstream entry takes the closest downstream entry; the earlier one wins ties
pub fn nearest(upstream: &[i64], downstream: &[i64], frames: &[Option<FramesRange>], max_gap_ns: i64) -> FrameMap {
    upstream
        .iter()
        .map(|&u| {
            let j = downstream.partition_point(|&d| d < u);
            let before = j.checked_sub(1).map(|i| (i, u.saturating_sub(downstream[i])));
            let after = downstream.get(j).map(|&d| (j, d.saturating_sub(u)));
            let closest = match (before, after) {
                (Some(b), Some(a)) => Some(if b.1 <= a.1 { b } else { a }),
                (b, a) => b.or(a),
            };
            closest
                .filter(|&(_, distance)| distance <= max_gap_ns)
                .and_then(|(i, _)| frames.get(i).copied().flatten())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn singles(n: usize) -> FrameMap {
        (0..n).map(|i| Some(FramesRange::single(i))).collect()
    }

    fn range(start: usize, end: usize) -> Option<FramesRange> {
        Some(FramesRange { start, end })
    }

    #[test]
    fn test_root_frames_group_consecutive_keys() {
        let map = root_frames(5, Some(&[7, 7, 8, 7, 7][..]));
        assert_eq!(map, vec![range(0, 1), range(0, 1), range(1, 2), range(2, 3), range(2, 3)]);
        // Key count mismatch falls back to one frame per entry
        assert_eq!(root_frames(2, Some(&[1][..])), singles(2));
    }

    #[test]
    fn test_latest_before_merges_into_one_upstream_entry() {
        let map = latest_before(&[0, 10], &[11, 12, 13], &singles(3), 100);
        assert_eq!(map, vec![None, range(0, 3)]);
    }

    #[test]
    fn test_latest_before_respects_gap() {
        let map = latest_before(&[0], &[5, 50], &singles(2), 10);
        assert_eq!(map, vec![range(0, 1)]);
    }

    #[test]
    fn test_explicit_key_unmatched_is_none() {
        let map = explicit_key(&[1, 2, 3], &[1, 3, 3], &[range(0, 1), range(1, 2), range(2, 3)]);
        assert_eq!(map, vec![range(0, 1), None, range(1, 3)]);
    }

    #[test]
    fn test_following_interval_last_entry_bounded_by_gap() {
        let map = following_interval(&[0, 10], &[1, 2, 11, 30], &singles(4), 15);
        assert_eq!(map, vec![range(0, 2), range(2, 3)]);
    }

    #[test]
    fn test_preceding_interval_includes_equal_timestamp() {
        let map = preceding_interval(&[5, 6], &[5], &singles(1), 10);
        assert_eq!(map, vec![range(0, 1), None]);
    }

    #[test]
    fn test_nearest_tie_goes_to_earlier() {
        let map = nearest(&[5, 100], &[4, 6], &singles(2), 10);
        assert_eq!(map, vec![range(0, 1), None]);
    }

    #[test]
    fn test_extreme_timestamps_do_not_overflow() {
        let frames = singles(1);
        assert_eq!(preceding_interval(&[-10], &[i64::MAX], &frames, 100), vec![None]);
        assert_eq!(nearest(&[i64::MIN, i64::MAX], &[0], &frames, 100), vec![None, None]);
        assert_eq!(latest_before(&[i64::MIN], &[i64::MAX], &frames, 100), vec![None]);
        assert_eq!(nearest(&[i64::MAX], &[i64::MAX - 1], &frames, 100), vec![range(0, 1)]);
    }
}
