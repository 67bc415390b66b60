//! Frame-indexed view of the correlated traces.

use super::frame_map::FrameMap;
use crate::trace::TraceCategory;
use serde::Serialize;
use std::collections::BTreeMap;

/// Entries of every framed category that belong to one frame
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Frame {
    pub index: usize,
    pub entries: BTreeMap<TraceCategory, Vec<usize>>,
}

/// Result of frame correlation.
///
/// Every frame lists all framed categories, possibly with no entries.
/// Categories without frame information are absent altogether.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FrameTable {
    categories: Vec<TraceCategory>,
    frames: Vec<Frame>,
    #[serde(skip)]
    maps: BTreeMap<TraceCategory, FrameMap>,
}

impl FrameTable {
    pub(crate) fn from_maps(maps: BTreeMap<TraceCategory, FrameMap>) -> Self {
        let count = maps
            .values()
            .flat_map(|map| map.iter().flatten())
            .map(|range| range.end)
            .max()
            .unwrap_or(0);

        let empty_frame: BTreeMap<TraceCategory, Vec<usize>> =
            maps.keys().map(|category| (*category, Vec::new())).collect();
        let mut frames: Vec<Frame> = (0..count)
            .map(|index| Frame {
                index,
                entries: empty_frame.clone(),
            })
            .collect();

        for (category, map) in &maps {
            for (entry, range) in map.iter().enumerate() {
                let Some(range) = range else { continue };
                for frame in range.frames() {
                    if let Some(list) = frames[frame].entries.get_mut(category) {
                        list.push(entry);
                    }
                }
            }
        }

        Self {
            categories: maps.keys().copied().collect(),
            frames,
            maps,
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Categories that received frame information, in category order
    pub fn categories(&self) -> &[TraceCategory] {
        &self.categories
    }

    pub fn is_framed(&self, category: TraceCategory) -> bool {
        self.maps.contains_key(&category)
    }

    pub fn frame(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Entries of `category` in frame `index`
    pub fn entries(&self, index: usize, category: TraceCategory) -> &[usize] {
        self.frames
            .get(index)
            .and_then(|frame| frame.entries.get(&category))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Frames containing entry `entry` of `category`
    pub fn frames_of(&self, category: TraceCategory, entry: usize) -> Vec<usize> {
        self.maps
            .get(&category)
            .and_then(|map| map.get(entry).copied().flatten())
            .map(|range| range.frames().collect())
            .unwrap_or_default()
    }
}
