//! Built-in campus tables for the University of Hawaiʻi at Mānoa.
//!
//! Plan coordinates are the hand-authored block layout of the campus
//! view (roughly metres/4 around Campus Center); geographic coordinates
//! are for map-SDK collaborators.

use std::collections::BTreeMap;

use crate::config::{CampusConfig, LocationSpec, MatcherSpec, ScheduleConfig};
use crate::curve::CurveConfig;
use crate::layout::LayoutConfig;
use crate::resolver::{MatchField, ResolvedMeta};
use crate::types::{Footprint, GeoCoordinate, Point, Polyline};

/// Key of the campus-centre placeholder used for anything unresolvable.
pub const FALLBACK_LOCATION: &str = "campuscenter";

/// Label given to shaped courses that carry no location of their own.
pub const DEFAULT_LOCATION_LABEL: &str = "UH Mānoa";

/// `(key, name, position, footprint, height, color, lat, lng)`
type LocationRow = (
    &'static str,
    &'static str,
    (f64, f64),
    (f64, f64),
    f64,
    &'static str,
    (f64, f64),
);

#[rustfmt::skip]
const LOCATIONS: &[LocationRow] = &[
    ("post", "Pacific Ocean Science & Technology (POST)", (-6.0, 10.0), (30.0, 22.0), 17.0, "#0ea5e9", (21.2979, -157.8172)),
    ("keller", "Keller Hall", (-18.0, 30.0), (16.0, 12.0), 16.0, "#1d4ed8", (21.2979, -157.8165)),
    ("bilger", "Bilger Hall", (-26.0, -2.0), (18.0, 14.0), 13.0, "#0284c7", (21.2972, -157.8177)),
    ("kuykendall", "Kuykendall Hall", (-24.0, 16.0), (16.0, 18.0), 13.0, "#14b8a6", (21.2988, -157.8167)),
    ("hemenway", "Hemenway Hall", (-46.0, 10.0), (16.0, 12.0), 11.0, "#0f766e", (21.2995, -157.8184)),
    ("sinclair", "Sinclair Library / Student Success Center", (22.0, 12.0), (18.0, 14.0), 10.0, "#65a30d", (21.2999, -157.8173)),
    ("hamilton", "Hamilton Library", (2.0, 34.0), (32.0, 12.0), 17.0, "#15803d", (21.3006, -157.8181)),
    ("moore", "Moore Hall", (36.0, 28.0), (16.0, 12.0), 12.0, "#a855f7", (21.2997, -157.8161)),
    ("shidler", "Shidler College of Business", (40.0, -22.0), (18.0, 16.0), 14.0, "#dc2626", (21.2949, -157.8183)),
    ("art", "Art Building", (10.0, -8.0), (24.0, 12.0), 11.0, "#f97316", (21.2976, -157.8159)),
    ("hawaiihall", "Hawaii Hall", (-32.0, 32.0), (14.0, 12.0), 12.0, "#fbbf24", (21.3007, -157.8176)),
    ("saunders", "Saunders Hall", (-52.0, 30.0), (12.0, 18.0), 14.0, "#d97706", (21.3016, -157.8164)),
    ("campuscenter", "Campus Center", (-32.0, -22.0), (18.0, 12.0), 8.0, "#f97316", (21.2978, -157.8170)),
    ("warriorrec", "Warrior Recreation Center", (18.0, -30.0), (16.0, 12.0), 12.0, "#ea580c", (21.2964, -157.8175)),
    ("stan", "Stan Sheriff Center", (54.0, -36.0), (28.0, 22.0), 18.0, "#9f1239", (21.2938, -157.8167)),
    ("kennedy", "Kennedy Theatre", (32.0, 6.0), (14.0, 10.0), 12.0, "#e11d48", (21.2997, -157.8153)),
    ("cmore", "C-MORE Hale / Marine Science Building", (-44.0, -8.0), (16.0, 10.0), 12.0, "#0ea5e9", (21.2960, -157.8184)),
    ("snyder", "Snyder Hall", (-14.0, -12.0), (14.0, 10.0), 11.0, "#4ade80", (21.2973, -157.8166)),
    ("watanabe", "Watanabe Hall", (-6.0, -24.0), (14.0, 10.0), 13.0, "#60a5fa", (21.2974, -157.8173)),
    ("marine", "Marine Science Labs", (-36.0, -32.0), (16.0, 12.0), 11.0, "#0891b2", (21.2949, -157.8190)),
    ("lawlibrary", "William S. Richardson Law Library", (-4.0, -40.0), (48.0, 14.0), 14.0, "#155e75", (21.2962, -157.8162)),
    ("businessannex", "Business Annex", (-42.0, -30.0), (16.0, 12.0), 11.0, "#0f172a", (21.2955, -157.8178)),
];

#[rustfmt::skip]
const ALIASES: &[(&str, &str)] = &[
    ("postbuilding", "post"),
    ("pacificoceanscienceandtechnology", "post"),
    ("kellersciencebuilding", "keller"),
    ("kellerhall", "keller"),
    ("bilgerhall", "bilger"),
    ("kuykendallhall", "kuykendall"),
    ("hemenwayhall", "hemenway"),
    ("sinclairlibrary", "sinclair"),
    ("hamiltonlibrary", "hamilton"),
    ("moorehall", "moore"),
    ("shidlercollegeofbusiness", "shidler"),
    ("artbuilding", "art"),
    ("hawaiihall", "hawaiihall"),
    ("saundershall", "saunders"),
    ("campuscentercomplex", "campuscenter"),
    ("warriorreccenter", "warriorrec"),
    ("stansheriffcenter", "stan"),
    ("kennedytheatre", "kennedy"),
    ("cmorehale", "cmore"),
    ("cmorehalemarinesciencebuilding", "cmore"),
    ("snyderhall", "snyder"),
    ("watanabehall", "watanabe"),
    ("marinesciencebuilding", "marine"),
    ("lawlibrary", "lawlibrary"),
    ("williamrichardsonlawlibrary", "lawlibrary"),
    ("businessannex", "businessannex"),
];

/// `(key, location, start, duration, color)`
type MetaRow = (
    &'static str,
    &'static str,
    Option<i32>,
    Option<i32>,
    Option<&'static str>,
);

#[rustfmt::skip]
const COURSE_META: &[MetaRow] = &[
    ("ics111", "post", Some(510), Some(75), Some("#34d399")),
    ("ics141", "keller", Some(600), Some(75), Some("#2dd4bf")),
    ("ics110", "post", Some(540), Some(75), None),
    ("math241", "keller", Some(585), Some(75), Some("#0ea5e9")),
    ("math215", "keller", Some(600), Some(75), None),
    ("math140", "keller", Some(585), None, None),
    ("wrtg150", "kuykendall", Some(690), Some(70), Some("#a855f7")),
    ("eng100", "kuykendall", Some(690), Some(70), None),
    ("eng190", "kuykendall", Some(690), None, None),
    ("cine255", "art", Some(540), Some(85), Some("#fb7185")),
    ("cine215", "art", Some(600), Some(85), None),
    ("cine216", "art", Some(705), Some(85), None),
    ("art113", "art", Some(615), Some(85), Some("#f97316")),
    ("bus310", "shidler", Some(540), Some(75), Some("#f87171")),
    ("econ130", "kuykendall", Some(615), Some(75), None),
    ("biol171", "snyder", Some(525), Some(75), Some("#22c55e")),
    ("ocn201", "marine", Some(660), Some(75), Some("#0ea5e9")),
    ("hsl101", "moore", Some(720), Some(60), Some("#a855f7")),
    ("hsl102", "moore", Some(720), Some(60), None),
    ("fg", "hemenway", Some(765), Some(60), Some("#0f766e")),
    ("fq", "keller", Some(585), Some(60), None),
    ("fw", "kuykendall", Some(690), Some(60), None),
    ("db", "bilger", Some(570), Some(75), None),
    ("dp", "bilger", Some(570), Some(75), None),
    ("dy", "watanabe", Some(780), Some(110), None),
    ("ds", "hawaiihall", Some(705), Some(75), None),
    ("elective", "campuscenter", Some(840), Some(60), None),
    ("honors", "sinclair", Some(900), Some(60), None),
    ("lab", "watanabe", Some(780), Some(110), None),
];

/// `(pattern, field, location, start, duration, color)`
type MatcherRow = (&'static str, MatchField, &'static str, i32, i32, &'static str);

#[rustfmt::skip]
const MATCHERS: &[MatcherRow] = &[
    ("^hsl", MatchField::CodeOrName, "moore", 720, 60, "#a855f7"),
    ("writing|english|composition|fw", MatchField::Name, "kuykendall", 690, 65, "#a855f7"),
    ("lab", MatchField::Name, "watanabe", 780, 105, "#f97316"),
    ("physics|chem|bio|db|dp", MatchField::Name, "bilger", 570, 75, "#0ea5e9"),
    ("math|calculus|f[q]", MatchField::Name, "keller", 585, 75, "#22d3ee"),
    ("global|history|fg|anth", MatchField::Name, "hemenway", 765, 60, "#0f766e"),
    ("elective|seminar", MatchField::Name, "campuscenter", 840, 60, "#f59e0b"),
];

const FOCUS_BUILDINGS: &[&str] = &[
    "saunders", "hawaiihall", "keller", "hamilton", "moore", "post", "kuykendall", "sinclair",
    "bilger", "hemenway", "snyder", "watanabe", "art", "campuscenter", "lawlibrary",
    "businessannex", "shidler",
];

const FOCUS_PALETTE: &[&str] = &["#111827", "#1f2937", "#374151", "#4b5563"];

#[rustfmt::skip]
const OUTER_LOOP: &[(f64, f64)] = &[
    (-70.0, 46.0), (-36.0, 48.0), (0.0, 48.0), (34.0, 46.0), (58.0, 38.0), (70.0, 16.0),
    (66.0, -10.0), (50.0, -34.0), (18.0, -50.0), (-16.0, -52.0), (-48.0, -44.0),
    (-68.0, -26.0), (-74.0, 2.0), (-70.0, 46.0),
];

#[rustfmt::skip]
const INNER_LOOP: &[(f64, f64)] = &[
    (-52.0, 18.0), (-32.0, 24.0), (-10.0, 26.0), (14.0, 24.0), (32.0, 18.0), (42.0, 4.0),
    (40.0, -12.0), (24.0, -24.0), (4.0, -32.0), (-20.0, -30.0), (-36.0, -20.0),
    (-46.0, -6.0), (-52.0, 6.0), (-52.0, 18.0),
];

#[rustfmt::skip]
const CAR_ROUTE: &[(f64, f64)] = &[
    (-60.0, -18.0), (-44.0, -34.0), (-12.0, -40.0), (18.0, -36.0), (40.0, -22.0),
    (52.0, -2.0), (50.0, 18.0), (30.0, 34.0), (2.0, 38.0), (-26.0, 36.0), (-44.0, 26.0),
    (-60.0, 6.0), (-62.0, -6.0), (-60.0, -18.0),
];

/// The full Mānoa campus configuration.
#[must_use]
pub fn config() -> CampusConfig {
    CampusConfig {
        name: "University of Hawaiʻi at Mānoa".to_string(),
        default_location_label: DEFAULT_LOCATION_LABEL.to_string(),
        locations: LOCATIONS
            .iter()
            .map(
                |&(key, name, (x, y), (width, depth), height, color, (lat, lng))| LocationSpec {
                    key: key.to_string(),
                    name: name.to_string(),
                    position: Point::new(x, y),
                    footprint: Footprint::new(width, depth),
                    height,
                    color: color.to_string(),
                    geo: Some(GeoCoordinate::new(lat, lng)),
                },
            )
            .collect(),
        aliases: ALIASES
            .iter()
            .map(|&(alias, key)| (alias.to_string(), key.to_string()))
            .collect::<BTreeMap<_, _>>(),
        fallback_location: FALLBACK_LOCATION.to_string(),
        course_meta: COURSE_META
            .iter()
            .map(|&(key, location, start, duration, color)| {
                let meta = ResolvedMeta {
                    location: location.to_string(),
                    start_minutes: start,
                    duration_minutes: duration,
                    color: color.map(String::from),
                };
                (key.to_string(), meta)
            })
            .collect(),
        matchers: MATCHERS
            .iter()
            .map(|&(pattern, field, location, start, duration, color)| MatcherSpec {
                pattern: pattern.to_string(),
                field,
                meta: ResolvedMeta::at(location)
                    .starting_at(start)
                    .lasting(duration)
                    .colored(color),
            })
            .collect(),
        focus_buildings: FOCUS_BUILDINGS.iter().map(|&k| k.to_string()).collect(),
        focus_palette: FOCUS_PALETTE.iter().map(|&c| c.to_string()).collect(),
        roads: vec![Polyline::from_pairs(OUTER_LOOP), Polyline::from_pairs(INNER_LOOP)],
        car_route: Polyline::from_pairs(CAR_ROUTE),
        schedule: ScheduleConfig::default(),
        curve: CurveConfig::default(),
        layout: LayoutConfig::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_alias_targets_a_location() {
        for &(alias, key) in ALIASES {
            assert!(
                LOCATIONS.iter().any(|row| row.0 == key),
                "alias {alias} targets missing location {key}"
            );
        }
    }

    #[test]
    fn every_meta_entry_targets_a_location() {
        let keys: Vec<&str> = COURSE_META
            .iter()
            .map(|row| row.1)
            .chain(MATCHERS.iter().map(|row| row.2))
            .collect();
        for key in keys {
            assert!(LOCATIONS.iter().any(|row| row.0 == key), "missing {key}");
        }
    }

    #[test]
    fn fallback_is_a_location() {
        assert!(LOCATIONS.iter().any(|row| row.0 == FALLBACK_LOCATION));
    }

    #[test]
    fn road_loops_are_authored_closed() {
        for road in [OUTER_LOOP, INNER_LOOP, CAR_ROUTE] {
            assert_eq!(road.first(), road.last());
        }
    }
}
