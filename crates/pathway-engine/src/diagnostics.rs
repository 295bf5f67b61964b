//! Planning diagnostics: timing and counts for each stage.
//!
//! [`plan_with_diagnostics`] runs the same stages as
//! [`Planner::plan`](crate::Planner::plan) and records, per stage, the
//! wall-clock duration and the metrics useful for tuning campus tables:
//! which rules resolved the courses, how many stops fell back, how many
//! start times were synthesized.
//!
//! Timing goes through the [`Clock`] trait so callers (and tests) choose
//! the time source. [`SystemClock`] uses the `web-time` crate, which uses
//! `performance.now()` on WASM and `std::time::Instant` on native.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::course::RawCourse;
use crate::curve::CurveError;
use crate::{Plan, Planner};

/// Source of timestamps for stage timing.
pub trait Clock {
    /// Opaque timestamp.
    type Instant;

    /// The current time.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// [`Clock`] backed by [`web_time::Instant`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    type Instant = web_time::Instant;

    fn now(&self) -> web_time::Instant {
        web_time::Instant::now()
    }

    fn elapsed(&self, since: &web_time::Instant) -> Duration {
        since.elapsed()
    }
}

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics collected from a single planning run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanDiagnostics {
    /// Stage 1: raw course shaping.
    pub shape: StageDiagnostics,
    /// Stage 2: resolution and stop synthesis.
    pub schedule: StageDiagnostics,
    /// Stage 3: itinerary path layout.
    pub layout: StageDiagnostics,
    /// Total wall-clock duration (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    pub summary: PlanSummary,
}

/// Diagnostics for one stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    pub metrics: StageMetrics,
}

/// Stage-specific metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    Shape {
        /// Raw records received.
        input_count: usize,
        /// Rows in the injected catalog (0 when none).
        catalog_entries: usize,
    },
    Schedule {
        stop_count: usize,
        /// Stops per resolving rule, keyed by rule label.
        rule_hits: BTreeMap<String, usize>,
        /// Stops placed at the fallback location.
        fallback_locations: usize,
        /// Stops whose start came from the slot table.
        synthesized_starts: usize,
        /// Stops whose color came from the palette.
        synthesized_colors: usize,
        fingerprint: u64,
    },
    Layout {
        /// Closed road loops (built once with the planner).
        road_count: usize,
        /// Total length of all road loops.
        road_length: f64,
        /// Itinerary path length (0 with fewer than two stops).
        path_length: f64,
        marker_count: usize,
    },
}

/// Headline numbers for the whole run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanSummary {
    pub campus: String,
    pub stop_count: usize,
    pub distinct_locations: usize,
    pub fallback_count: usize,
    /// Sum of straight-line distances between consecutive stops.
    pub leg_distance: f64,
    pub path_length: f64,
}

impl PlanDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Plan Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Campus: {} ({} stops at {} locations)",
            self.summary.campus, self.summary.stop_count, self.summary.distinct_locations,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<16} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        for (name, diag) in [
            ("Shape", &self.shape),
            ("Schedule", &self.schedule),
            ("Layout", &self.layout),
        ] {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<16} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(format!(
            "Fallbacks: {}  |  Walking distance: {:.1}  |  Path length: {:.1}",
            self.summary.fallback_count, self.summary.leg_distance, self.summary.path_length,
        ));

        lines.join("\n")
    }
}

fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Shape {
            input_count,
            catalog_entries,
        } => format!("{input_count} records, catalog={catalog_entries}"),
        StageMetrics::Schedule {
            stop_count,
            rule_hits,
            fallback_locations,
            synthesized_starts,
            synthesized_colors,
            fingerprint,
        } => {
            let hits = rule_hits
                .iter()
                .map(|(rule, count)| format!("{rule}={count}"))
                .collect::<Vec<_>>()
                .join(" ");
            format!(
                "{stop_count} stops [{hits}] fallback={fallback_locations} slots={synthesized_starts} palette={synthesized_colors} id={fingerprint:016x}",
            )
        }
        StageMetrics::Layout {
            road_count,
            road_length,
            path_length,
            marker_count,
        } => format!(
            "{road_count} roads ({road_length:.1}), path={path_length:.1}, {marker_count} markers",
        ),
    }
}

/// Run every planning stage on `raw`, timing each with `clock`.
///
/// # Errors
///
/// Returns [`CurveError`] if the itinerary path cannot be built (a stop
/// position is not finite).
pub fn plan_with_diagnostics<C: Clock>(
    planner: &Planner,
    raw: &[RawCourse],
    clock: &C,
) -> Result<(Plan, PlanDiagnostics), CurveError> {
    let total_start = clock.now();

    // 1. Shape.
    let start = clock.now();
    let courses = planner.shape(raw);
    let shape = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::Shape {
            input_count: raw.len(),
            catalog_entries: planner.catalog().map_or(0, crate::course::Catalog::len),
        },
    };

    // 2. Resolve and build stops.
    let start = clock.now();
    let (schedule, traces) = planner.schedule_builder().build_traced(&courses);
    let mut rule_hits = BTreeMap::new();
    for trace in &traces {
        *rule_hits.entry(trace.resolved_by.to_string()).or_insert(0) += 1;
    }
    let fallback_locations = traces.iter().filter(|t| t.fell_back).count();
    let schedule_stage = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::Schedule {
            stop_count: schedule.len(),
            rule_hits,
            fallback_locations,
            synthesized_starts: traces.iter().filter(|t| t.synthesized_start).count(),
            synthesized_colors: traces.iter().filter(|t| t.synthesized_color).count(),
            fingerprint: schedule.fingerprint(),
        },
    };

    // 3. Layout.
    let start = clock.now();
    let path = planner.itinerary_path(&schedule)?;
    let path_length = path.as_ref().map_or(0.0, |p| p.scene.length());
    let roads = planner.layout().roads();
    let layout = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::Layout {
            road_count: roads.len(),
            road_length: roads.iter().map(|r| r.curve.length()).sum(),
            path_length,
            marker_count: path.as_ref().map_or(0, |p| p.markers.len()),
        },
    };

    let summary = PlanSummary {
        campus: planner.campus_name().to_string(),
        stop_count: schedule.len(),
        distinct_locations: schedule.locations(planner.registry()).len(),
        fallback_count: fallback_locations,
        leg_distance: schedule.legs().iter().map(|l| l.distance).sum(),
        path_length,
    };

    let diagnostics = PlanDiagnostics {
        shape,
        schedule: schedule_stage,
        layout,
        total_duration: clock.elapsed(&total_start),
        summary,
    };

    Ok((
        Plan {
            courses,
            schedule,
            path,
        },
        diagnostics,
    ))
}
