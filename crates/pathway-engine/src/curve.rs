//! Smooth curves through ordered waypoints, queried by arc length.
//!
//! A [`Curve`] is a Catmull-Rom spline: one cubic segment per consecutive
//! waypoint pair (plus a wrap-around segment when closed). The spline
//! parameter does not advance uniformly with distance, so every query goes
//! through an arc-length lookup table built once at construction:
//! `samples_per_segment` raw-parameter samples per segment, with the
//! cumulative chord length at each sample. Fractions are mapped to a
//! distance, the bracketing samples are found by binary search, and the
//! raw parameter is linearly interpolated between them.
//!
//! Each segment is evaluated in Hermite form. The tangents depend on the
//! [`CurveKind`]:
//!
//! - [`Centripetal`](CurveKind::Centripetal): knot spacing is the square
//!   root of the chord length. No cusps or self-intersections within a
//!   segment.
//! - [`Chordal`](CurveKind::Chordal): knot spacing is the chord length.
//! - [`Uniform`](CurveKind::Uniform): fixed tension of 0.5.
//!
//! Open curves extrapolate a phantom point beyond each end so the first and
//! last segments are well defined.

use serde::{Deserialize, Serialize};

use crate::types::Waypoint;

/// Knot spacings below this are treated as coincident points.
const MIN_KNOT_SPACING: f64 = 1e-4;

/// Tension of the uniform variant.
const UNIFORM_TENSION: f64 = 0.5;

/// Catmull-Rom parameterization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveKind {
    /// Knot spacing `|d|^0.5`.
    #[default]
    Centripetal,
    /// Knot spacing `|d|`.
    Chordal,
    /// Uniform knots with tension 0.5.
    Uniform,
}

impl CurveKind {
    /// Exponent applied to the *squared* chord length to get knot spacing.
    const fn spacing_exponent(self) -> Option<f64> {
        match self {
            Self::Centripetal => Some(0.25),
            Self::Chordal => Some(0.5),
            Self::Uniform => None,
        }
    }
}

/// Curve construction parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveConfig {
    pub kind: CurveKind,
    /// Raw-parameter samples per segment in the arc-length table. Higher
    /// values cost memory and setup time and reduce placement error.
    pub samples_per_segment: usize,
}

impl CurveConfig {
    /// Default arc-length table density.
    pub const DEFAULT_SAMPLES_PER_SEGMENT: usize = 64;
}

impl Default for CurveConfig {
    fn default() -> Self {
        Self {
            kind: CurveKind::default(),
            samples_per_segment: Self::DEFAULT_SAMPLES_PER_SEGMENT,
        }
    }
}

/// Errors raised when a curve cannot be built from its waypoints.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CurveError {
    /// Fewer than two distinct waypoints.
    #[error("a curve needs at least 2 waypoints, got {count}")]
    TooFewWaypoints { count: usize },

    /// A waypoint has a NaN or infinite coordinate.
    #[error("waypoint {index} has a non-finite coordinate")]
    NonFiniteWaypoint { index: usize },
}

/// One cubic segment `c0 + c1 u + c2 u^2 + c3 u^3`, `u` in `[0, 1]`.
#[derive(Debug, Clone, Copy)]
struct Cubic<P> {
    c0: P,
    c1: P,
    c2: P,
    c3: P,
}

impl<P: Waypoint> Cubic<P> {
    /// Hermite segment from `p1` to `p2` with end tangents `t1` and `t2`.
    fn hermite(p1: P, p2: P, t1: P, t2: P) -> Self {
        Self {
            c0: p1,
            c1: t1,
            c2: P::ZERO
                .add_scaled(p1, -3.0)
                .add_scaled(p2, 3.0)
                .add_scaled(t1, -2.0)
                .add_scaled(t2, -1.0),
            c3: P::ZERO
                .add_scaled(p1, 2.0)
                .add_scaled(p2, -2.0)
                .add_scaled(t1, 1.0)
                .add_scaled(t2, 1.0),
        }
    }

    /// Catmull-Rom segment between `p1` and `p2` with neighbours `p0`, `p3`.
    fn catmull_rom(p0: P, p1: P, p2: P, p3: P, kind: CurveKind) -> Self {
        let Some(exponent) = kind.spacing_exponent() else {
            let t1 = p2.minus(p0).scaled(UNIFORM_TENSION);
            let t2 = p3.minus(p1).scaled(UNIFORM_TENSION);
            return Self::hermite(p1, p2, t1, t2);
        };

        let mut dt0 = p0.distance_squared_to(p1).powf(exponent);
        let mut dt1 = p1.distance_squared_to(p2).powf(exponent);
        let mut dt2 = p2.distance_squared_to(p3).powf(exponent);

        // Repeated points would divide by zero.
        if dt1 < MIN_KNOT_SPACING {
            dt1 = 1.0;
        }
        if dt0 < MIN_KNOT_SPACING {
            dt0 = dt1;
        }
        if dt2 < MIN_KNOT_SPACING {
            dt2 = dt1;
        }

        let t1 = p1
            .minus(p0)
            .scaled(1.0 / dt0)
            .add_scaled(p2.minus(p0), -1.0 / (dt0 + dt1))
            .add_scaled(p2.minus(p1), 1.0 / dt1)
            .scaled(dt1);
        let t2 = p2
            .minus(p1)
            .scaled(1.0 / dt1)
            .add_scaled(p3.minus(p1), -1.0 / (dt1 + dt2))
            .add_scaled(p3.minus(p2), 1.0 / dt2)
            .scaled(dt1);

        Self::hermite(p1, p2, t1, t2)
    }

    fn point(&self, u: f64) -> P {
        let u2 = u * u;
        self.c0
            .add_scaled(self.c1, u)
            .add_scaled(self.c2, u2)
            .add_scaled(self.c3, u2 * u)
    }

    fn derivative(&self, u: f64) -> P {
        self.c1
            .add_scaled(self.c2, 2.0 * u)
            .add_scaled(self.c3, 3.0 * u * u)
    }
}

/// A smooth curve through ordered waypoints with arc-length queries.
///
/// Immutable after construction; the total length and lookup table are
/// computed once.
#[derive(Debug, Clone)]
pub struct Curve<P> {
    waypoints: Vec<P>,
    closed: bool,
    kind: CurveKind,
    segments: Vec<Cubic<P>>,
    samples_per_segment: usize,
    /// Cumulative length at each table sample; `cumulative[0] == 0`.
    cumulative: Vec<f64>,
}

impl<P: Waypoint> Curve<P> {
    /// Build a curve through `waypoints`.
    ///
    /// For closed curves the last segment wraps back to the first waypoint;
    /// an authored closing waypoint equal to the first is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::NonFiniteWaypoint`] if any coordinate is NaN or
    /// infinite, and [`CurveError::TooFewWaypoints`] if fewer than two
    /// waypoints remain.
    pub fn new(waypoints: &[P], closed: bool, config: &CurveConfig) -> Result<Self, CurveError> {
        if let Some(index) = waypoints.iter().position(|p| !p.is_finite()) {
            return Err(CurveError::NonFiniteWaypoint { index });
        }

        let mut points = waypoints.to_vec();
        if closed
            && points.len() > 1
            && points[0].distance_squared_to(points[points.len() - 1]) <= f64::EPSILON
        {
            points.pop();
        }
        let n = points.len();
        if n < 2 {
            return Err(CurveError::TooFewWaypoints { count: n });
        }

        let segment_count = if closed { n } else { n - 1 };
        let segments: Vec<_> = (0..segment_count)
            .map(|i| {
                let p1 = points[i];
                let p2 = points[(i + 1) % n];
                let (p0, p3) = if closed {
                    (points[(i + n - 1) % n], points[(i + 2) % n])
                } else {
                    let p0 = if i > 0 {
                        points[i - 1]
                    } else {
                        p1.add_scaled(p1.minus(p2), 1.0)
                    };
                    let p3 = if i + 2 < n {
                        points[i + 2]
                    } else {
                        p2.add_scaled(p2.minus(p1), 1.0)
                    };
                    (p0, p3)
                };
                Cubic::catmull_rom(p0, p1, p2, p3, config.kind)
            })
            .collect();

        let samples_per_segment = config.samples_per_segment.max(1);
        let mut curve = Self {
            waypoints: points,
            closed,
            kind: config.kind,
            segments,
            samples_per_segment,
            cumulative: Vec::new(),
        };
        curve.cumulative = curve.build_table();
        Ok(curve)
    }

    #[allow(clippy::cast_precision_loss)]
    fn build_table(&self) -> Vec<f64> {
        let total = self.sample_count();
        let mut cumulative = Vec::with_capacity(total + 1);
        let mut length = 0.0;
        let mut previous = self.raw_point(0, 0.0);
        cumulative.push(0.0);
        for k in 1..=total {
            let (segment, u) = self.table_position(k, 0.0);
            let point = self.raw_point(segment, u);
            length += point.distance_to(previous);
            cumulative.push(length);
            previous = point;
        }
        cumulative
    }

    /// Total number of table intervals.
    const fn sample_count(&self) -> usize {
        self.segments.len() * self.samples_per_segment
    }

    /// Segment index and local parameter for table sample `k` advanced by
    /// `frac` of one interval.
    #[allow(clippy::cast_precision_loss)]
    fn table_position(&self, k: usize, frac: f64) -> (usize, f64) {
        if k >= self.sample_count() {
            return (self.segments.len() - 1, 1.0);
        }
        let segment = k / self.samples_per_segment;
        let local = (k % self.samples_per_segment) as f64 + frac;
        (segment, local / self.samples_per_segment as f64)
    }

    fn raw_point(&self, segment: usize, u: f64) -> P {
        self.segments[segment].point(u)
    }

    /// Map an arc-length fraction to a segment and local parameter.
    fn locate(&self, fraction: f64) -> (usize, f64) {
        let fraction = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let total = self.length();
        if total <= 0.0 {
            return (0, 0.0);
        }
        let target = fraction * total;
        let i = self.cumulative.partition_point(|&c| c <= target);
        let lo = i.saturating_sub(1);
        if lo >= self.sample_count() {
            return self.table_position(lo, 0.0);
        }
        let span = self.cumulative[lo + 1] - self.cumulative[lo];
        let frac = if span > 0.0 {
            (target - self.cumulative[lo]) / span
        } else {
            0.0
        };
        self.table_position(lo, frac)
    }

    /// Total arc length (cached).
    #[must_use]
    pub fn length(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// Point at arc-length `fraction` of the total length. Fractions are
    /// clamped to `[0, 1]`; non-finite fractions map to 0.
    #[must_use]
    pub fn point_at(&self, fraction: f64) -> P {
        let (segment, u) = self.locate(fraction);
        self.raw_point(segment, u)
    }

    /// Unit direction of travel at arc-length `fraction`.
    #[must_use]
    pub fn tangent_at(&self, fraction: f64) -> P {
        let (segment, u) = self.locate(fraction);
        self.segments[segment].derivative(u).unit()
    }

    /// `count` points evenly spaced in arc length, from the start to the
    /// end inclusive.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn sample(&self, count: usize) -> Vec<P> {
        match count {
            0 => Vec::new(),
            1 => vec![self.point_at(0.0)],
            _ => {
                let last = (count - 1) as f64;
                (0..count).map(|i| self.point_at(i as f64 / last)).collect()
            }
        }
    }

    /// Arc-length fraction at which the curve passes each waypoint.
    #[must_use]
    pub fn waypoint_fractions(&self) -> Vec<f64> {
        let total = self.length();
        (0..self.waypoints.len())
            .map(|k| {
                if total > 0.0 {
                    self.cumulative[k * self.samples_per_segment] / total
                } else {
                    0.0
                }
            })
            .collect()
    }

    /// The waypoints the curve passes through (closing duplicate removed).
    #[must_use]
    pub fn waypoints(&self) -> &[P] {
        &self.waypoints
    }

    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    #[must_use]
    pub const fn kind(&self) -> CurveKind {
        self.kind
    }

    /// Number of cubic segments.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::cast_precision_loss)]
mod tests {
    use super::*;
    use crate::types::{Point, Point3};

    fn open(points: &[(f64, f64)]) -> Curve<Point> {
        let points: Vec<_> = points.iter().map(|&(x, y)| Point::new(x, y)).collect();
        Curve::new(&points, false, &CurveConfig::default()).unwrap()
    }

    fn square(kind: CurveKind) -> Curve<Point> {
        let points = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ];
        let config = CurveConfig {
            kind,
            ..CurveConfig::default()
        };
        Curve::new(&points, true, &config).unwrap()
    }

    #[test]
    fn two_point_length_is_distance() {
        let curve = open(&[(0.0, 0.0), (3.0, 4.0)]);
        assert!((curve.length() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn two_point_midpoint() {
        let curve = open(&[(0.0, 0.0), (10.0, 0.0)]);
        let mid = curve.point_at(0.5);
        assert!((mid.x - 5.0).abs() < 1e-9);
        assert!(mid.y.abs() < 1e-9);
    }

    #[test]
    fn endpoints_are_first_and_last_waypoints() {
        let curve = open(&[(0.0, 0.0), (10.0, 5.0), (20.0, -5.0)]);
        assert_eq!(curve.point_at(0.0), Point::new(0.0, 0.0));
        let end = curve.point_at(1.0);
        assert!((end.x - 20.0).abs() < 1e-9);
        assert!((end.y - -5.0).abs() < 1e-9);
    }

    #[test]
    fn closed_loop_returns_to_start() {
        for kind in [CurveKind::Centripetal, CurveKind::Chordal, CurveKind::Uniform] {
            let curve = square(kind);
            let start = curve.point_at(0.0);
            let end = curve.point_at(1.0);
            let near_end = curve.point_at(0.9999);
            assert!(start.distance(end) < 1e-9, "{kind:?}");
            assert!(start.distance(near_end) > 1e-6, "{kind:?}");
        }
    }

    #[test]
    fn closed_curve_has_wrap_segment() {
        let curve = square(CurveKind::Centripetal);
        assert_eq!(curve.segment_count(), 4);
        assert!(curve.is_closed());
    }

    #[test]
    fn authored_closing_point_is_collapsed() {
        let points = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 0.0),
        ];
        let curve = Curve::new(&points, true, &CurveConfig::default()).unwrap();
        assert_eq!(curve.waypoints().len(), 3);
        assert_eq!(curve.segment_count(), 3);
    }

    #[test]
    fn fractions_are_clamped() {
        let curve = open(&[(0.0, 0.0), (10.0, 0.0)]);
        assert_eq!(curve.point_at(-1.0), curve.point_at(0.0));
        assert_eq!(curve.point_at(2.0), curve.point_at(1.0));
        assert_eq!(curve.point_at(f64::NAN), curve.point_at(0.0));
    }

    #[test]
    fn point_at_is_monotonic_in_arc_length() {
        let curve = open(&[(0.0, 0.0), (1.0, 0.0), (50.0, 0.0), (51.0, 0.0)]);
        let xs: Vec<f64> = (0..=100).map(|i| curve.point_at(f64::from(i) / 100.0).x).collect();
        assert!(xs.windows(2).all(|w| w[1] >= w[0]));
    }

    #[test]
    fn samples_are_evenly_spaced() {
        let curve = open(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]);
        let samples = curve.sample(11);
        let steps: Vec<f64> = samples.windows(2).map(|w| w[0].distance(w[1])).collect();
        let mean = steps.iter().sum::<f64>() / steps.len() as f64;
        for step in steps {
            assert!((step - mean).abs() / mean < 0.05, "step {step} vs mean {mean}");
        }
    }

    #[test]
    fn arc_length_differs_from_raw_parameter() {
        // Short first segment, long second: raw u = 0.5 is at the joint,
        // arc-length 0.5 is well into the long segment.
        let curve = open(&[(0.0, 0.0), (1.0, 0.0), (21.0, 0.0)]);
        let mid = curve.point_at(0.5);
        assert!((mid.x - 10.5).abs() < 0.2, "mid = {mid:?}");
    }

    #[test]
    fn waypoint_fractions_span_unit_interval() {
        let curve = open(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]);
        let fractions = curve.waypoint_fractions();
        assert_eq!(fractions.len(), 3);
        assert!(fractions[0].abs() < 1e-12);
        assert!((fractions[2] - 1.0).abs() < 1e-12);
        assert!(fractions[1] > 0.3 && fractions[1] < 0.7);
        let at = curve.point_at(fractions[1]);
        assert!(at.distance(Point::new(10.0, 0.0)) < 0.05);
    }

    #[test]
    fn tangent_is_unit_length() {
        let curve = open(&[(0.0, 0.0), (10.0, 0.0)]);
        let t = curve.tangent_at(0.3);
        assert!((t.x - 1.0).abs() < 1e-9);
        assert!(t.y.abs() < 1e-9);
    }

    #[test]
    fn sample_counts() {
        let curve = open(&[(0.0, 0.0), (10.0, 0.0)]);
        assert!(curve.sample(0).is_empty());
        assert_eq!(curve.sample(1).len(), 1);
        assert_eq!(curve.sample(5).len(), 5);
    }

    #[test]
    fn works_in_three_dimensions() {
        let points = [Point3::new(0.0, 1.0, 0.0), Point3::new(0.0, 1.0, 8.0)];
        let curve = Curve::new(&points, false, &CurveConfig::default()).unwrap();
        assert!((curve.length() - 8.0).abs() < 1e-9);
        let mid = curve.point_at(0.5);
        assert!((mid.z - 4.0).abs() < 1e-9);
        assert!((mid.y - 1.0).abs() < 1e-9);
    }

    #[test]
    fn repeated_waypoints_do_not_produce_nan() {
        let curve = open(&[(0.0, 0.0), (5.0, 5.0), (5.0, 5.0), (10.0, 0.0)]);
        assert!(curve.length().is_finite());
        assert!(curve.sample(20).iter().all(|p| p.x.is_finite() && p.y.is_finite()));
    }

    #[test]
    fn too_few_waypoints_rejected() {
        let err = Curve::new(&[Point::new(1.0, 1.0)], false, &CurveConfig::default()).unwrap_err();
        assert_eq!(err, CurveError::TooFewWaypoints { count: 1 });

        let empty: [Point; 0] = [];
        let err = Curve::new(&empty, true, &CurveConfig::default()).unwrap_err();
        assert_eq!(err, CurveError::TooFewWaypoints { count: 0 });
    }

    #[test]
    fn closed_pair_of_identical_points_rejected() {
        let points = [Point::new(1.0, 1.0), Point::new(1.0, 1.0)];
        let err = Curve::new(&points, true, &CurveConfig::default()).unwrap_err();
        assert_eq!(err, CurveError::TooFewWaypoints { count: 1 });
    }

    #[test]
    fn non_finite_waypoint_rejected() {
        let points = [Point::new(0.0, 0.0), Point::new(f64::INFINITY, 1.0)];
        let err = Curve::new(&points, false, &CurveConfig::default()).unwrap_err();
        assert_eq!(err, CurveError::NonFiniteWaypoint { index: 1 });
    }

    #[test]
    fn zero_samples_is_clamped() {
        let config = CurveConfig {
            samples_per_segment: 0,
            ..CurveConfig::default()
        };
        let points = [Point::new(0.0, 0.0), Point::new(4.0, 0.0)];
        let curve = Curve::new(&points, false, &config).unwrap();
        assert!((curve.length() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn config_serde_defaults() {
        let config: CurveConfig = serde_json::from_str(r#"{"kind": "uniform"}"#).unwrap();
        assert_eq!(config.kind, CurveKind::Uniform);
        assert_eq!(config.samples_per_segment, 64);
    }
}
