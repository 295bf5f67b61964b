//! Schedule builder: ordered course list to ordered, fully resolved stops.
//!
//! Every course yields exactly one [`Stop`], in input order. Whatever the
//! resolver leaves unset is synthesized here: start times from the slot
//! table (extrapolated past its end), durations from the default, and
//! colors by cycling the palette. Building is a pure function of the input,
//! so a caller can re-derive the whole list on every change and compare
//! [`Schedule::fingerprint`]s instead of patching.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use geo::Euclidean;
use geo::line_measures::Distance;
use serde::{Deserialize, Serialize};
use siphasher::sip::SipHasher13;

use crate::config::{ConfigError, ScheduleConfig};
use crate::course::CourseRecord;
use crate::registry::{BuildingRegistry, Location};
use crate::resolver::{CourseResolver, ResolvedBy};
use crate::types::{Point, Point3};

const MINUTES_PER_DAY: i32 = 24 * 60;

/// Format minutes from midnight as a 12-hour clock time (`9:05 AM`).
///
/// Values outside one day wrap, including negative values.
///
/// ```
/// use pathway_engine::schedule::format_minutes;
///
/// assert_eq!(format_minutes(0), "12:00 AM");
/// assert_eq!(format_minutes(765), "12:45 PM");
/// assert_eq!(format_minutes(-30), "11:30 PM");
/// ```
#[must_use]
pub fn format_minutes(minutes: i32) -> String {
    let minutes = minutes.rem_euclid(MINUTES_PER_DAY);
    let hours = minutes / 60;
    let mins = minutes % 60;
    let suffix = if hours >= 12 { "PM" } else { "AM" };
    let hour12 = match hours % 12 {
        0 => 12,
        h => h,
    };
    format!("{hour12}:{mins:02} {suffix}")
}

/// A fully resolved, renderable itinerary entry.
///
/// Positions are copied from the [`Location`] when the stop is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    /// Course id, or `stop-<index>` when the course has none.
    pub id: String,
    pub code: String,
    pub name: String,
    pub location_key: String,
    pub location_name: String,
    /// Formatted start time.
    pub start_time: String,
    /// Formatted end time.
    pub end_time: String,
    pub start_minutes: i32,
    pub end_minutes: i32,
    /// Plan position of the building.
    pub position: Point,
    /// Rooftop of the building in scene coordinates.
    pub position3: Point3,
    pub color: String,
    pub description: String,
}

impl Stop {
    /// Length of the class in minutes.
    #[must_use]
    pub const fn duration_minutes(&self) -> i32 {
        self.end_minutes - self.start_minutes
    }

    fn hash_into(&self, hasher: &mut impl Hasher) {
        self.id.hash(hasher);
        self.code.hash(hasher);
        self.name.hash(hasher);
        self.location_key.hash(hasher);
        self.location_name.hash(hasher);
        self.start_time.hash(hasher);
        self.end_time.hash(hasher);
        self.start_minutes.hash(hasher);
        self.end_minutes.hash(hasher);
        for value in [
            self.position.x,
            self.position.y,
            self.position3.x,
            self.position3.y,
            self.position3.z,
        ] {
            value.to_bits().hash(hasher);
        }
        self.color.hash(hasher);
        self.description.hash(hasher);
    }
}

/// Travel between two consecutive stops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leg {
    /// Index of the departure stop.
    pub from: usize,
    /// Index of the arrival stop.
    pub to: usize,
    /// Straight-line plan distance between the two buildings.
    pub distance: f64,
    /// Minutes between the end of one class and the start of the next
    /// (negative when they overlap).
    pub gap_minutes: i32,
}

/// The ordered stop list plus its content fingerprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    stops: Vec<Stop>,
    fingerprint: u64,
}

impl Schedule {
    /// Wrap a stop list, computing its fingerprint.
    #[must_use]
    pub fn new(stops: Vec<Stop>) -> Self {
        let mut hasher = SipHasher13::new();
        stops.len().hash(&mut hasher);
        for stop in &stops {
            stop.hash_into(&mut hasher);
        }
        Self {
            fingerprint: hasher.finish(),
            stops,
        }
    }

    #[must_use]
    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stops.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// Content hash over every field of every stop. Equal schedules have
    /// equal fingerprints; this is the stop-list identity.
    #[must_use]
    pub const fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    /// Distinct locations visited, in first-visit order.
    #[must_use]
    pub fn locations<'r>(&self, registry: &'r BuildingRegistry) -> Vec<&'r Location> {
        let mut seen = Vec::new();
        let mut out = Vec::new();
        for stop in &self.stops {
            if !seen.contains(&stop.location_key.as_str()) {
                seen.push(stop.location_key.as_str());
                out.push(registry.get(&stop.location_key));
            }
        }
        out
    }

    /// Consecutive stop pairs with the distance between their buildings.
    #[must_use]
    pub fn legs(&self) -> Vec<Leg> {
        self.stops
            .windows(2)
            .enumerate()
            .map(|(i, pair)| {
                let a = geo::Point::new(pair[0].position.x, pair[0].position.y);
                let b = geo::Point::new(pair[1].position.x, pair[1].position.y);
                Leg {
                    from: i,
                    to: i + 1,
                    distance: Euclidean.distance(a, b),
                    gap_minutes: pair[1].start_minutes - pair[0].end_minutes,
                }
            })
            .collect()
    }
}

/// How one stop was produced. Collected by [`ScheduleBuilder::build_traced`]
/// for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopTrace {
    /// The rule that resolved the course.
    pub resolved_by: ResolvedBy,
    /// The location hint did not resolve and the fallback was used.
    pub fell_back: bool,
    /// The start time came from the slot table or its extrapolation.
    pub synthesized_start: bool,
    /// The color came from the palette.
    pub synthesized_color: bool,
}

/// Builds [`Schedule`]s from course lists. Holds no state between calls.
#[derive(Debug, Clone)]
pub struct ScheduleBuilder {
    resolver: Arc<CourseResolver>,
    config: ScheduleConfig,
}

impl ScheduleBuilder {
    /// Validate the slot table, timing defaults, and palette.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptySlotTable`],
    /// [`ConfigError::UnsortedSlotTable`], [`ConfigError::EmptyPalette`], or
    /// [`ConfigError::NonPositiveMinutes`] for a zero or negative slot
    /// increment or default duration.
    pub fn new(resolver: Arc<CourseResolver>, config: ScheduleConfig) -> Result<Self, ConfigError> {
        if config.slot_starts.is_empty() {
            return Err(ConfigError::EmptySlotTable);
        }
        if let Some(index) = config
            .slot_starts
            .windows(2)
            .position(|w| w[1] < w[0])
        {
            return Err(ConfigError::UnsortedSlotTable { index: index + 1 });
        }
        if config.palette.is_empty() {
            return Err(ConfigError::EmptyPalette);
        }
        for (context, minutes) in [
            ("slot increment", config.slot_increment),
            ("default duration", config.default_duration),
        ] {
            if minutes <= 0 {
                return Err(ConfigError::NonPositiveMinutes {
                    context: context.to_string(),
                    minutes,
                });
            }
        }
        Ok(Self { resolver, config })
    }

    #[must_use]
    pub const fn config(&self) -> &ScheduleConfig {
        &self.config
    }

    /// Start time handed to the stop at `index` when the resolver supplies
    /// none: the slot table entry, or the last entry plus one increment
    /// per index past the end.
    #[must_use]
    pub fn default_start(&self, index: usize) -> i32 {
        let slots = &self.config.slot_starts;
        if let Some(&start) = slots.get(index) {
            return start;
        }
        let last = slots.last().copied().unwrap_or(0);
        let beyond = i32::try_from(index + 1 - slots.len()).unwrap_or(i32::MAX);
        last.saturating_add(beyond.saturating_mul(self.config.slot_increment))
    }

    /// Build the schedule for `courses`.
    #[must_use]
    pub fn build(&self, courses: &[CourseRecord]) -> Schedule {
        self.build_traced(courses).0
    }

    /// Build the schedule and report how each stop was produced.
    #[must_use]
    pub fn build_traced(&self, courses: &[CourseRecord]) -> (Schedule, Vec<StopTrace>) {
        let registry = self.resolver.registry();
        let mut stops = Vec::with_capacity(courses.len());
        let mut traces = Vec::with_capacity(courses.len());

        for (index, course) in courses.iter().enumerate() {
            let (meta, resolved_by) = self.resolver.resolve_with_rule(course);
            let location = registry.get(&meta.location);
            let fell_back = resolved_by == ResolvedBy::LocationHint
                && registry.try_resolve_key(&course.location).is_none();

            let start = meta.start_minutes.unwrap_or_else(|| self.default_start(index));
            let duration = meta.duration_minutes.unwrap_or(self.config.default_duration);
            let end = start.saturating_add(duration);
            let color = meta.color.clone().unwrap_or_else(|| {
                self.config.palette[index % self.config.palette.len()].clone()
            });

            traces.push(StopTrace {
                resolved_by,
                fell_back,
                synthesized_start: meta.start_minutes.is_none(),
                synthesized_color: meta.color.is_none(),
            });
            stops.push(Stop {
                id: if course.id.is_empty() {
                    format!("stop-{index}")
                } else {
                    course.id.clone()
                },
                code: course.code.clone(),
                name: course.name.clone(),
                location_key: location.key.clone(),
                location_name: location.name.clone(),
                start_time: format_minutes(start),
                end_time: format_minutes(end),
                start_minutes: start,
                end_minutes: end,
                position: location.position,
                position3: location.rooftop(),
                color,
                description: course.description.clone(),
            });
        }

        let schedule = Schedule::new(stops);
        tracing::debug!(
            stops = schedule.len(),
            fingerprint = schedule.fingerprint(),
            "built schedule"
        );
        (schedule, traces)
    }
}
