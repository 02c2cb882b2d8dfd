use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::constants::profile;

/// Tunables of the transformation pipeline.
///
/// Every field has a default, so a partial YAML/JSON section is enough.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    /// Expected length of facility (medical institution) codes.
    pub facility_code_length: usize,
    /// UTC offset, in hours, used for document timestamps.
    pub utc_offset_hours: i32,
    /// Bundle profiles the compliance validator recognizes.
    pub recognized_profiles: Vec<String>,
    /// Per-field narrative caps, keyed by input field name.
    pub narrative_limits: BTreeMap<String, NarrativeLimit>,
    /// Cap applied to narrative fields with no explicit entry.
    pub default_narrative_limit: NarrativeLimit,
}

/// Character caps for a narrative field.
///
/// Texts containing Japanese script use the tighter `japanese` cap.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct NarrativeLimit {
    pub latin: usize,
    pub japanese: usize,
}

impl NarrativeLimit {
    pub const fn new(latin: usize, japanese: usize) -> Self {
        Self { latin, japanese }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let narrative_limits = [
            ("reason", NarrativeLimit::new(1000, 500)),
            ("presentIllness", NarrativeLimit::new(4000, 2000)),
            ("clinicalSummary", NarrativeLimit::new(4000, 2000)),
            ("hospitalCourse", NarrativeLimit::new(8000, 4000)),
            ("recommendations", NarrativeLimit::new(2000, 1000)),
            ("dosageText", NarrativeLimit::new(500, 250)),
            ("note", NarrativeLimit::new(1000, 500)),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self {
            facility_code_length: 10,
            utc_offset_hours: 9,
            recognized_profiles: profile::DOCUMENT_BUNDLE_PROFILES
                .iter()
                .map(|p| p.to_string())
                .collect(),
            narrative_limits,
            default_narrative_limit: NarrativeLimit::new(1000, 500),
        }
    }
}

impl PipelineConfig {
    /// Narrative cap for an input field, falling back to the default cap.
    pub fn narrative_limit(&self, field: &str) -> NarrativeLimit {
        self.narrative_limits
            .get(field)
            .copied()
            .unwrap_or(self.default_narrative_limit)
    }

    /// Offset used for document timestamps; UTC if the configured hours are out of range.
    pub fn offset(&self) -> FixedOffset {
        self.utc_offset_hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.facility_code_length, 10);
        assert_eq!(config.utc_offset_hours, 9);
        assert_eq!(config.recognized_profiles.len(), 3);
        assert_eq!(config.narrative_limit("reason"), NarrativeLimit::new(1000, 500));
    }

    #[test]
    fn test_unknown_field_uses_default_limit() {
        let config = PipelineConfig::default();
        assert_eq!(
            config.narrative_limit("somethingElse"),
            config.default_narrative_limit
        );
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"facility_code_length": 7}"#).unwrap();
        assert_eq!(config.facility_code_length, 7);
        assert_eq!(config.utc_offset_hours, 9);
        assert!(!config.narrative_limits.is_empty());
    }

    #[test]
    fn test_offset() {
        let config = PipelineConfig::default();
        assert_eq!(config.offset().local_minus_utc(), 9 * 3600);
        let broken = PipelineConfig {
            utc_offset_hours: 99,
            ..PipelineConfig::default()
        };
        assert_eq!(broken.offset().local_minus_utc(), 0);
    }
}
