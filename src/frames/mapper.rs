//! Frame correlation across the loaded traces.

use super::frame_map::{self, FrameMap};
use super::relation::{default_relations, FrameRelation, LinkMode, ROOT_PREFERENCE};
use super::table::FrameTable;
use crate::trace::{CustomQueryType, TraceParser, Traces};
use log::{debug, warn};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Assigns display-frame indices to trace entries.
///
/// The first non-empty trace of [`ROOT_PREFERENCE`] is numbered directly;
/// frames then flow along the relation graph to every related trace. The
/// mapper only reads `traces`, so computing twice yields the same table.
pub struct FrameMapper<'a> {
    traces: &'a Traces,
    relations: Vec<FrameRelation>,
}

impl<'a> FrameMapper<'a> {
    pub fn new(traces: &'a Traces) -> Self {
        Self::with_relations(traces, default_relations())
    }

    pub fn with_relations(traces: &'a Traces, relations: Vec<FrameRelation>) -> Self {
        debug_assert!(
            relations.iter().all(|r| r.upstream != r.downstream),
            "a relation cannot link a category to itself"
        );
        Self { traces, relations }
    }

    pub fn compute(&self) -> FrameTable {
        let Some(root) = self.root() else {
            debug!("No trace can seed frames, skipping correlation");
            return FrameTable::default();
        };

        let mut maps: BTreeMap<_, FrameMap> = BTreeMap::new();
        let keys = root.custom_query(CustomQueryType::VsyncId);
        maps.insert(root.category(), frame_map::root_frames(root.len(), keys.as_deref()));
        debug!("Frames seeded from {} ({} entries)", root.category(), root.len());

        for relation in &self.relations {
            if maps.contains_key(&relation.upstream) {
                continue;
            }
            let (Some(upstream), Some(downstream), Some(frames)) = (
                self.traces.get(relation.upstream),
                self.traces.get(relation.downstream),
                maps.get(&relation.downstream),
            ) else {
                continue;
            };

            if let Some(mut map) = propagate(relation, upstream.as_ref(), downstream.as_ref(), frames) {
                map.resize(upstream.len(), None);
                debug!(
                    "Propagated frames {} -> {} ({})",
                    relation.downstream, relation.upstream, relation.link
                );
                maps.insert(relation.upstream, map);
            }
        }

        FrameTable::from_maps(maps)
    }

    fn root(&self) -> Option<&Arc<dyn TraceParser>> {
        ROOT_PREFERENCE
            .iter()
            .filter_map(|category| self.traces.get(*category))
            .find(|parser| !parser.is_empty())
    }
}

fn values_ns(parser: &dyn TraceParser) -> Vec<i64> {
    parser.timestamps().iter().map(|ts| ts.value_ns).collect()
}

/// Frame map of `relation.upstream`, or `None` when the link cannot be evaluated
fn propagate(
    relation: &FrameRelation,
    upstream: &dyn TraceParser,
    downstream: &dyn TraceParser,
    frames: &FrameMap,
) -> Option<FrameMap> {
    let gap = relation.max_gap_ns;
    let map = match relation.link {
        LinkMode::ExplicitKey(query) => {
            let upstream_keys = upstream.custom_query(query).filter(|k| k.len() == upstream.len());
            let downstream_keys = downstream.custom_query(query).filter(|k| k.len() == downstream.len());
            let (Some(upstream_keys), Some(downstream_keys)) = (upstream_keys, downstream_keys) else {
                warn!(
                    "Cannot relate {} to {}: {:?} unavailable",
                    relation.upstream, relation.downstream, query
                );
                return None;
            };
            frame_map::explicit_key(&upstream_keys, &downstream_keys, frames)
        }
        LinkMode::LatestBefore => {
            frame_map::latest_before(&values_ns(upstream), &values_ns(downstream), frames, gap)
        }
        LinkMode::FollowingInterval => {
            frame_map::following_interval(&values_ns(upstream), &values_ns(downstream), frames, gap)
        }
        LinkMode::PrecedingInterval => {
            frame_map::preceding_interval(&values_ns(upstream), &values_ns(downstream), frames, gap)
        }
        LinkMode::Nearest => frame_map::nearest(&values_ns(upstream), &values_ns(downstream), frames, gap),
    };
    Some(map)
}
