//! Configuration and constants for the loader and the CLI.
//!
//! The policy constants can be overridden through a TOML file:
//!
//! ```toml
//! [merge]
//! max_time_gap_ms = 300000
//!
//! [correlation]
//! max_gap_ms = 2000
//!
//! [[correlation.edge]]
//! upstream = "proto_log"
//! downstream = "window_manager"
//! max_gap_ms = 500
//! ```

use crate::frames::{default_relations, FrameRelation};
use crate::registry::MergePolicy;
use crate::trace::TraceCategory;
use crate::utils::error::ConfigError;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Current report schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

const NS_PER_MS: i64 = 1_000_000;

/// A trace ending this long before another one starts is a dangling file
/// left over from a previous recording.
pub const MAX_ALLOWED_TIME_GAP_BETWEEN_TRACES_NS: i64 = 5 * 60 * 1_000 * NS_PER_MS; // 5m

/// Entries of two related traces farther apart than this are not the same event.
pub const MAX_UI_PIPELINE_LATENCY_NS: i64 = 2 * 1_000 * NS_PER_MS; // 2s

/// Archive name used when no better one can be derived from the input
pub const DEFAULT_ARCHIVE_NAME: &str = "traces";

/// Complete policy configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PolicyConfig {
    /// Merge policy overrides
    #[serde(default)]
    pub merge: MergeSection,

    /// Correlation gap overrides
    #[serde(default)]
    pub correlation: CorrelationSection,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MergeSection {
    /// Gap after which an earlier trace is considered dangling old data
    pub max_time_gap_ms: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CorrelationSection {
    /// Gap applied to every relation without its own override
    pub max_gap_ms: Option<i64>,

    /// Per-relation overrides
    #[serde(default, rename = "edge")]
    pub edges: Vec<EdgeOverride>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EdgeOverride {
    pub upstream: TraceCategory,
    pub downstream: TraceCategory,
    pub max_gap_ms: i64,
}

/// Load a policy configuration from a TOML file
///
/// # Errors
/// * `ConfigError::IoError` - If file cannot be read
/// * `ConfigError::ParseFailed` - If TOML is invalid
/// * `ConfigError::Invalid` - If a value is out of range or names an unknown relation
pub fn load_policy(path: impl AsRef<Path>) -> Result<PolicyConfig, ConfigError> {
    let path = path.as_ref();
    debug!("Loading policy configuration from {}", path.display());

    let contents = fs::read_to_string(path)?;
    let config: PolicyConfig = toml::from_str(&contents)?;
    config.validate()?;
    Ok(config)
}

impl PolicyConfig {
    /// Reject negative gaps and overrides for relations that do not exist
    pub fn validate(&self) -> Result<(), ConfigError> {
        let gaps = self
            .merge
            .max_time_gap_ms
            .iter()
            .chain(self.correlation.max_gap_ms.iter())
            .chain(self.correlation.edges.iter().map(|e| &e.max_gap_ms));
        if let Some(gap) = gaps.into_iter().find(|gap| **gap < 0) {
            return Err(ConfigError::Invalid(format!(
                "gap must not be negative, got {gap}ms"
            )));
        }

        let relations = default_relations();
        for edge in &self.correlation.edges {
            let known = relations
                .iter()
                .any(|r| r.upstream == edge.upstream && r.downstream == edge.downstream);
            if !known {
                return Err(ConfigError::Invalid(format!(
                    "no relation between {} and {}",
                    edge.upstream, edge.downstream
                )));
            }
        }

        Ok(())
    }

    /// Merge policy with overrides applied
    pub fn merge_policy(&self) -> MergePolicy {
        let mut policy = MergePolicy::default();
        if let Some(ms) = self.merge.max_time_gap_ms {
            policy.max_time_gap_ns = ms.saturating_mul(NS_PER_MS);
        }
        policy
    }

    /// Relation graph with gap overrides applied
    pub fn relations(&self) -> Vec<FrameRelation> {
        let mut relations = default_relations();
        for relation in &mut relations {
            if let Some(ms) = self.correlation.max_gap_ms {
                relation.max_gap_ns = ms.saturating_mul(NS_PER_MS);
            }
            if let Some(edge) = self
                .correlation
                .edges
                .iter()
                .find(|e| e.upstream == relation.upstream && e.downstream == relation.downstream)
            {
                relation.max_gap_ns = edge.max_gap_ms.saturating_mul(NS_PER_MS);
            }
        }
        relations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: PolicyConfig = toml::from_str("").unwrap();
        assert_eq!(
            config.merge_policy().max_time_gap_ns,
            MAX_ALLOWED_TIME_GAP_BETWEEN_TRACES_NS
        );
        assert!(config
            .relations()
            .iter()
            .all(|r| r.max_gap_ns == MAX_UI_PIPELINE_LATENCY_NS));
    }

    #[test]
    fn test_edge_override_only_touches_its_relation() {
        let config: PolicyConfig = toml::from_str(
            r#"
            [correlation]
            max_gap_ms = 100

            [[correlation.edge]]
            upstream = "proto_log"
            downstream = "window_manager"
            max_gap_ms = 7
            "#,
        )
        .unwrap();
        config.validate().unwrap();

        for relation in config.relations() {
            let expected = if relation.upstream == TraceCategory::ProtoLog {
                7 * NS_PER_MS
            } else {
                100 * NS_PER_MS
            };
            assert_eq!(relation.max_gap_ns, expected);
        }
    }

    #[test]
    fn test_unknown_relation_rejected() {
        let config: PolicyConfig = toml::from_str(
            r#"
            [[correlation.edge]]
            upstream = "event_log"
            downstream = "window_manager"
            max_gap_ms = 7
            "#,
        )
        .unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_negative_gap_rejected() {
        let config: PolicyConfig = toml::from_str("[merge]\nmax_time_gap_ms = -1").unwrap();
        assert!(config.validate().is_err());
    }
}
