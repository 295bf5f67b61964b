//! Building registry: static lookup of named campus locations.
//!
//! Course location hints are free text and cannot be enumerated, so the
//! registry never fails a lookup: anything it cannot place resolves to a
//! designated fallback location (the campus-centre placeholder).
//!
//! Direct keys and aliases go through the same [`normalize_key`] step,
//! so `"POST Building"`, `"post"`, and `"PostBuilding"` all land on the
//! same entry.

use std::collections::HashMap;

use geo::Intersects;
use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, LocationSpec};
use crate::types::{Footprint, GeoCoordinate, Point, Point3};

/// Normalize free text into a lookup key: lower-case ASCII letters and
/// digits only.
///
/// # Examples
///
/// ```
/// use pathway_engine::registry::normalize_key;
///
/// assert_eq!(normalize_key("POST Building"), "postbuilding");
/// assert_eq!(normalize_key("C-MORE Hale"), "cmorehale");
/// assert_eq!(normalize_key("  "), "");
/// ```
#[must_use]
pub fn normalize_key(value: &str) -> String {
    value
        .chars()
        .flat_map(char::to_lowercase)
        .filter(char::is_ascii_alphanumeric)
        .collect()
}

/// A named campus location. Immutable once the registry is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Normalized lookup key.
    pub key: String,
    /// Human-readable name.
    pub name: String,
    /// Centre of the building in plan coordinates.
    pub position: Point,
    /// Block footprint centred on `position`.
    pub footprint: Footprint,
    /// Nominal building height.
    pub height: f64,
    /// Base color (CSS hex string).
    pub color: String,
    /// Geographic coordinate, when known.
    pub geo: Option<GeoCoordinate>,
}

impl Location {
    /// Rooftop centre in scene coordinates.
    #[must_use]
    pub const fn rooftop(&self) -> Point3 {
        self.position.lift(self.height)
    }

    /// Footprint as an axis-aligned rectangle in plan coordinates.
    #[must_use]
    pub fn bounds(&self) -> geo::Rect<f64> {
        let half_w = self.footprint.width / 2.0;
        let half_d = self.footprint.depth / 2.0;
        geo::Rect::new(
            (self.position.x - half_w, self.position.y - half_d),
            (self.position.x + half_w, self.position.y + half_d),
        )
    }
}

/// A building block for the campus view, colored for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingFootprint {
    pub key: String,
    pub center: Point,
    pub footprint: Footprint,
    pub height: f64,
    pub color: String,
}

/// Read-only location table with alias resolution and a fallback entry.
#[derive(Debug, Clone)]
pub struct BuildingRegistry {
    locations: Vec<Location>,
    index: HashMap<String, usize>,
    aliases: HashMap<String, String>,
    fallback: usize,
}

impl BuildingRegistry {
    /// Build a registry from location specs and an alias table.
    ///
    /// Keys and aliases are normalized on the way in.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateLocation`] when two locations share a
    /// normalized key, [`ConfigError::NonFiniteGeometry`] for NaN or
    /// infinite geometry, [`ConfigError::UnknownLocation`] when an alias
    /// targets a missing key, and [`ConfigError::UnknownFallback`] when
    /// `fallback` is not in the table.
    pub fn new<'a>(
        specs: &[LocationSpec],
        aliases: impl IntoIterator<Item = (&'a String, &'a String)>,
        fallback: &str,
    ) -> Result<Self, ConfigError> {
        let mut locations = Vec::with_capacity(specs.len());
        let mut index = HashMap::with_capacity(specs.len());

        for spec in specs {
            let key = normalize_key(&spec.key);
            let finite = spec.position.x.is_finite()
                && spec.position.y.is_finite()
                && spec.footprint.width.is_finite()
                && spec.footprint.depth.is_finite()
                && spec.height.is_finite();
            if !finite {
                return Err(ConfigError::NonFiniteGeometry(key));
            }
            if index.insert(key.clone(), locations.len()).is_some() {
                return Err(ConfigError::DuplicateLocation(key));
            }
            locations.push(Location {
                key,
                name: spec.name.clone(),
                position: spec.position,
                footprint: spec.footprint,
                height: spec.height,
                color: spec.color.clone(),
                geo: spec.geo,
            });
        }

        let mut alias_map = HashMap::new();
        for (alias, target) in aliases {
            let target_key = normalize_key(target);
            if !index.contains_key(&target_key) {
                return Err(ConfigError::UnknownLocation {
                    context: format!("alias {alias:?}"),
                    key: target.clone(),
                });
            }
            alias_map.insert(normalize_key(alias), target_key);
        }

        let fallback = *index
            .get(&normalize_key(fallback))
            .ok_or_else(|| ConfigError::UnknownFallback(fallback.to_string()))?;

        Ok(Self {
            locations,
            index,
            aliases: alias_map,
            fallback,
        })
    }

    /// Resolve free text to a canonical key: direct key first, then alias,
    /// then the fallback key.
    #[must_use]
    pub fn resolve_key(&self, hint: &str) -> &str {
        self.try_resolve_key(hint)
            .unwrap_or(&self.locations[self.fallback].key)
    }

    /// Like [`resolve_key`](Self::resolve_key) but reports a miss instead of
    /// substituting the fallback.
    #[must_use]
    pub fn try_resolve_key(&self, hint: &str) -> Option<&str> {
        let key = normalize_key(hint);
        if let Some(&i) = self.index.get(&key) {
            return Some(&self.locations[i].key);
        }
        self.aliases.get(&key).map(String::as_str)
    }

    /// Look up a location by key. Unknown keys return the fallback.
    #[must_use]
    pub fn get(&self, key: &str) -> &Location {
        self.index
            .get(&normalize_key(key))
            .map_or(&self.locations[self.fallback], |&i| &self.locations[i])
    }

    /// Resolve free text (key or alias) to a location, falling back when
    /// nothing matches.
    #[must_use]
    pub fn lookup(&self, hint: &str) -> &Location {
        self.get(self.resolve_key(hint))
    }

    /// Whether `key` names a configured location (aliases excluded).
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(&normalize_key(key))
    }

    /// The designated fallback location.
    #[must_use]
    pub fn fallback(&self) -> &Location {
        &self.locations[self.fallback]
    }

    /// Iterate locations in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = &Location> {
        self.locations.iter()
    }

    /// Number of configured locations.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.locations.len()
    }

    /// Whether the registry is empty. Never true for a built registry,
    /// since the fallback must exist.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// The first location whose footprint contains `point` (boundary
    /// inclusive). Used for marker hit-testing.
    #[must_use]
    pub fn locate(&self, point: Point) -> Option<&Location> {
        let p = geo::Point::new(point.x, point.y);
        self.locations.iter().find(|l| l.bounds().intersects(&p))
    }

    /// Footprints for the block view. Focus keys that are not in the
    /// registry are skipped; colors cycle through `palette`.
    #[must_use]
    pub fn footprints(&self, focus: &[String], palette: &[String]) -> Vec<BuildingFootprint> {
        focus
            .iter()
            .filter_map(|key| self.index.get(&normalize_key(key)))
            .enumerate()
            .map(|(i, &idx)| {
                let location = &self.locations[idx];
                BuildingFootprint {
                    key: location.key.clone(),
                    center: location.position,
                    footprint: location.footprint,
                    height: location.height,
                    color: palette
                        .get(i % palette.len().max(1))
                        .cloned()
                        .unwrap_or_else(|| location.color.clone()),
                }
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::CampusConfig;

    fn manoa() -> BuildingRegistry {
        let config = CampusConfig::default();
        BuildingRegistry::new(
            &config.locations,
            &config.aliases,
            &config.fallback_location,
        )
        .unwrap()
    }

    fn spec(key: &str, x: f64, y: f64) -> LocationSpec {
        LocationSpec {
            key: key.to_string(),
            name: key.to_uppercase(),
            position: Point::new(x, y),
            footprint: Footprint::new(10.0, 10.0),
            height: 5.0,
            color: "#000000".to_string(),
            geo: None,
        }
    }

    #[test]
    fn normalize_strips_non_alphanumerics() {
        assert_eq!(normalize_key("Hawaiʻi Hall"), "hawaiihall");
        assert_eq!(normalize_key("ICS-111"), "ics111");
        assert_eq!(normalize_key("UH Mānoa"), "uhmnoa");
    }

    #[test]
    fn every_key_returns_its_location() {
        let registry = manoa();
        for location in registry.iter() {
            assert_eq!(registry.get(&location.key), location);
        }
    }

    #[test]
    fn unknown_key_returns_same_fallback_every_time() {
        let registry = manoa();
        let a = registry.get("nowhere");
        let b = registry.get("also nowhere");
        assert_eq!(a.key, "campuscenter");
        assert_eq!(a, b);
        assert_eq!(registry.get(""), registry.fallback());
    }

    #[test]
    fn aliases_share_normalization() {
        let registry = manoa();
        assert_eq!(registry.resolve_key("POST Building"), "post");
        assert_eq!(registry.resolve_key("post"), "post");
        assert_eq!(registry.resolve_key("PostBuilding"), "post");
        assert_eq!(registry.lookup("Keller Hall").key, "keller");
        assert_eq!(registry.lookup("C-MORE Hale").key, "cmore");
    }

    #[test]
    fn unresolvable_hint_falls_back() {
        let registry = manoa();
        assert_eq!(registry.try_resolve_key("Mānoa Campus"), None);
        assert_eq!(registry.resolve_key("Mānoa Campus"), "campuscenter");
        assert_eq!(registry.lookup("Mānoa Campus").name, "Campus Center");
    }

    #[test]
    fn contains_excludes_aliases() {
        let registry = manoa();
        assert!(registry.contains("keller"));
        assert!(!registry.contains("kellerhall"));
    }

    #[test]
    fn locate_finds_containing_footprint() {
        let registry = manoa();
        // Keller Hall: centre (-18, 30), 16 x 12.
        assert_eq!(registry.locate(Point::new(-20.0, 33.0)).unwrap().key, "keller");
        assert_eq!(registry.locate(Point::new(-26.0, 30.0)).unwrap().key, "keller");
        assert!(registry.locate(Point::new(200.0, 200.0)).is_none());
    }

    #[test]
    fn footprints_cycle_focus_palette() {
        let registry = manoa();
        let config = CampusConfig::default();
        let footprints = registry.footprints(&config.focus_buildings, &config.focus_palette);
        assert_eq!(footprints.len(), 17);
        assert_eq!(footprints[0].key, "saunders");
        assert_eq!(footprints[0].color, "#111827");
        assert_eq!(footprints[4].color, "#111827");
        assert_eq!(footprints[5].color, "#1f2937");
    }

    #[test]
    fn footprints_skip_unknown_focus_keys() {
        let registry = manoa();
        let focus = vec!["nope".to_string(), "post".to_string()];
        let footprints = registry.footprints(&focus, &[]);
        assert_eq!(footprints.len(), 1);
        assert_eq!(footprints[0].color, "#0ea5e9");
    }

    #[test]
    fn duplicate_keys_rejected() {
        let specs = vec![spec("Hall A", 0.0, 0.0), spec("hall-a", 1.0, 1.0)];
        let err = BuildingRegistry::new(&specs, std::iter::empty(), "halla").unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateLocation(k) if k == "halla"));
    }

    #[test]
    fn missing_fallback_rejected() {
        let specs = vec![spec("a", 0.0, 0.0)];
        let err = BuildingRegistry::new(&specs, std::iter::empty(), "b").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownFallback(_)));
    }

    #[test]
    fn alias_to_missing_key_rejected() {
        let specs = vec![spec("a", 0.0, 0.0)];
        let alias = ("ay".to_string(), "b".to_string());
        let err =
            BuildingRegistry::new(&specs, std::iter::once((&alias.0, &alias.1)), "a").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownLocation { .. }));
    }

    #[test]
    fn non_finite_position_rejected() {
        let specs = vec![spec("a", f64::NAN, 0.0)];
        let err = BuildingRegistry::new(&specs, std::iter::empty(), "a").unwrap_err();
        assert!(matches!(err, ConfigError::NonFiniteGeometry(_)));
    }

    #[test]
    fn rooftop_lifts_to_height() {
        let registry = manoa();
        let post = registry.get("post");
        assert_eq!(post.rooftop(), Point3::new(-6.0, 17.0, 10.0));
    }
}
