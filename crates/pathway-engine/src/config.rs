//! Campus configuration: every static table the engine consumes.
//!
//! A [`CampusConfig`] is plain serde data. It is validated and compiled
//! into immutable lookup structures once, by [`Planner::new`], and never
//! mutated afterwards. The [`Default`] configuration describes the
//! University of Hawaiʻi at Mānoa campus (see [`crate::manoa`]).
//!
//! [`Planner::new`]: crate::Planner::new

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::curve::{CurveConfig, CurveError};
use crate::layout::LayoutConfig;
use crate::resolver::{MatchField, ResolvedMeta};
use crate::types::{Footprint, GeoCoordinate, Point, Polyline};

/// Static description of one campus location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSpec {
    /// Stable lookup key. Normalized (see [`crate::registry::normalize_key`])
    /// when the registry is built.
    pub key: String,
    /// Human-readable name shown on markers.
    pub name: String,
    /// Centre of the building in plan coordinates.
    pub position: Point,
    /// Block footprint centred on `position`.
    pub footprint: Footprint,
    /// Nominal building height in scene units.
    pub height: f64,
    /// Base color (CSS hex string).
    pub color: String,
    /// Optional geographic coordinate for map-SDK collaborators.
    #[serde(default)]
    pub geo: Option<GeoCoordinate>,
}

/// A pattern matcher in the resolver's rule chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatcherSpec {
    /// Regular expression, matched case-insensitively.
    pub pattern: String,
    /// Which course field the pattern is tested against.
    #[serde(default)]
    pub field: MatchField,
    /// Result returned when the pattern matches.
    pub meta: ResolvedMeta,
}

/// Time-slot synthesis and palette cycling for the schedule builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Ascending start times (minutes from midnight) handed out by index
    /// to stops without an explicit start.
    pub slot_starts: Vec<i32>,
    /// Minutes added per index once `slot_starts` is exhausted.
    pub slot_increment: i32,
    /// Duration used when the resolved meta carries none.
    pub default_duration: i32,
    /// Colors cycled by stop index when the resolved meta carries none.
    pub palette: Vec<String>,
}

impl ScheduleConfig {
    /// Default minutes between extrapolated slots.
    pub const DEFAULT_SLOT_INCREMENT: i32 = 90;

    /// Default class duration in minutes.
    pub const DEFAULT_DURATION: i32 = 75;
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            slot_starts: vec![510, 585, 660, 735, 810, 885, 960],
            slot_increment: Self::DEFAULT_SLOT_INCREMENT,
            default_duration: Self::DEFAULT_DURATION,
            palette: [
                "#34d399", "#22d3ee", "#f472b6", "#fb7185", "#facc15", "#c084fc",
            ]
            .map(String::from)
            .to_vec(),
        }
    }
}

/// Complete static configuration for one campus.
///
/// Missing fields in serialized input fall back to the Mānoa defaults,
/// so a JSON override only needs to name the tables it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CampusConfig {
    /// Campus display name.
    pub name: String,
    /// Location label given to shaped courses that carry no location.
    pub default_location_label: String,
    /// Location table, in display order.
    pub locations: Vec<LocationSpec>,
    /// Alternate spellings (normalized) mapped to canonical keys.
    pub aliases: BTreeMap<String, String>,
    /// Key of the location substituted for anything unresolvable.
    pub fallback_location: String,
    /// Exact code/name table (shared namespace, normalized keys).
    pub course_meta: BTreeMap<String, ResolvedMeta>,
    /// Ordered pattern matchers. Order is part of the behavior.
    pub matchers: Vec<MatcherSpec>,
    /// Buildings drawn as blocks in the campus view.
    pub focus_buildings: Vec<String>,
    /// Muted colors cycled across focus buildings.
    pub focus_palette: Vec<String>,
    /// Closed road loops.
    pub roads: Vec<Polyline>,
    /// Closed shuttle/car route.
    pub car_route: Polyline,
    pub schedule: ScheduleConfig,
    pub curve: CurveConfig,
    pub layout: LayoutConfig,
}

impl Default for CampusConfig {
    fn default() -> Self {
        crate::manoa::config()
    }
}

impl CampusConfig {
    /// Parse a JSON configuration. Omitted fields take the Mānoa defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] if the input is not a valid
    /// configuration document. Semantic validation happens later, in
    /// [`Planner::new`](crate::Planner::new).
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Errors raised while validating a [`CampusConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Two locations normalize to the same key.
    #[error("duplicate location key: {0}")]
    DuplicateLocation(String),

    /// The fallback location is not in the location table.
    #[error("fallback location {0:?} is not a configured location")]
    UnknownFallback(String),

    /// An alias, meta entry, matcher, or focus list names a missing location.
    #[error("{context} refers to unknown location {key:?}")]
    UnknownLocation {
        /// Where the reference was found.
        context: String,
        /// The unresolved key.
        key: String,
    },

    /// A location position, height, or footprint is not finite.
    #[error("location {0:?} has non-finite geometry")]
    NonFiniteGeometry(String),

    /// The slot table is empty.
    #[error("schedule slot table is empty")]
    EmptySlotTable,

    /// The slot table is not ascending.
    #[error("schedule slot table is not ascending at index {index}")]
    UnsortedSlotTable {
        /// First index whose value is below its predecessor.
        index: usize,
    },

    /// The fallback palette is empty.
    #[error("schedule palette is empty")]
    EmptyPalette,

    /// A duration or slot increment is zero or negative.
    #[error("{context} must be positive, got {minutes} minutes")]
    NonPositiveMinutes {
        /// Which value was rejected.
        context: String,
        /// The rejected value.
        minutes: i32,
    },

    /// A matcher pattern failed to compile.
    #[error("matcher {index} has an invalid pattern: {source}")]
    InvalidPattern {
        /// Position of the matcher in the chain.
        index: usize,
        /// Underlying regex error.
        #[source]
        source: regex::Error,
    },

    /// The built-in course-code pattern failed to compile.
    #[error("course code pattern is invalid: {0}")]
    CodePattern(#[source] regex::Error),

    /// The curve sampling density is zero.
    #[error("curve samples per segment must be at least 1")]
    ZeroSamples,

    /// A road loop or the car route cannot be turned into a curve.
    #[error("road {index} is invalid: {source}")]
    Road {
        /// Road index (`roads.len()` denotes the car route).
        index: usize,
        /// Underlying curve error.
        #[source]
        source: CurveError,
    },

    /// The configuration document could not be parsed.
    #[error("invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn schedule_defaults_match_slot_table() {
        let config = ScheduleConfig::default();
        assert_eq!(config.slot_starts, vec![510, 585, 660, 735, 810, 885, 960]);
        assert_eq!(config.slot_increment, 90);
        assert_eq!(config.default_duration, 75);
        assert_eq!(config.palette.len(), 6);
    }

    #[test]
    fn campus_default_is_manoa() {
        let config = CampusConfig::default();
        assert_eq!(config.fallback_location, "campuscenter");
        assert!(config.locations.iter().any(|l| l.key == "post"));
        assert_eq!(config.roads.len(), 2);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let json = r#"{ "name": "Test Campus", "schedule": { "default_duration": 50 } }"#;
        let config: CampusConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.name, "Test Campus");
        assert_eq!(config.schedule.default_duration, 50);
        assert_eq!(config.schedule.slot_starts.len(), 7);
        assert_eq!(config.fallback_location, "campuscenter");
    }

    #[test]
    fn config_serde_round_trip() {
        let config = CampusConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: CampusConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config.aliases, back.aliases);
        assert_eq!(config.course_meta, back.course_meta);
        assert_eq!(config.matchers, back.matchers);
        assert_eq!(config.schedule, back.schedule);
        assert_eq!(config.locations.len(), back.locations.len());
    }

    #[test]
    fn from_json_overrides_fallback() {
        let config = CampusConfig::from_json(r#"{ "fallback_location": "post" }"#).unwrap();
        assert_eq!(config.fallback_location, "post");
        assert_eq!(config.matchers.len(), 7);
    }

    #[test]
    fn from_json_rejects_malformed_input() {
        let err = CampusConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
        assert!(err.to_string().starts_with("invalid configuration JSON"));
    }

    #[test]
    fn error_display_names_context() {
        let err = ConfigError::UnknownLocation {
            context: "alias \"kellerhall\"".to_string(),
            key: "kel".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "alias \"kellerhall\" refers to unknown location \"kel\""
        );
    }
}
