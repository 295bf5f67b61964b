//! Shared geometric types for the pathway engine.

use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

/// A 2D point in campus plan coordinates.
///
/// The plan is a flat local frame centred on the campus; `x` grows east and
/// `y` grows south, matching the ground plane of the 3D view once lifted by
/// [`Point::lift`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// East-west position.
    pub x: f64,
    /// North-south position.
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Avoids the square root for comparison purposes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Lift a plan point into the 3D scene, where the plan's `y` axis
    /// becomes the scene's `z` axis and `height` is the vertical offset.
    #[must_use]
    pub const fn lift(self, height: f64) -> Point3 {
        Point3::new(self.x, height, self.y)
    }
}

/// A 3D point in scene coordinates (`y` is up).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Drop the vertical axis, returning the plan position.
    #[must_use]
    pub const fn plan(self) -> Point {
        Point::new(self.x, self.z)
    }

    /// Dot product with another vector.
    #[must_use]
    pub fn dot(self, other: Self) -> f64 {
        self.x
            .mul_add(other.x, self.y.mul_add(other.y, self.z * other.z))
    }

    /// Cross product with another vector.
    #[must_use]
    pub fn cross(self, other: Self) -> Self {
        Self::new(
            self.y.mul_add(other.z, -(self.z * other.y)),
            self.z.mul_add(other.x, -(self.x * other.z)),
            self.x.mul_add(other.y, -(self.y * other.x)),
        )
    }

    /// Euclidean length of the vector.
    #[must_use]
    pub fn magnitude(self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Unit vector in the same direction, or the zero vector when the
    /// magnitude is zero.
    #[must_use]
    pub fn normalize(self) -> Self {
        let len = self.magnitude();
        if len > 0.0 { self * (1.0 / len) } else { self }
    }

    /// Rotate the vector around a unit `axis` by `angle` radians
    /// (Rodrigues' rotation formula).
    #[must_use]
    pub fn rotate_around(self, axis: Self, angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        self * cos + axis.cross(self) * sin + axis * (axis.dot(self) * (1.0 - cos))
    }
}

impl Add for Point3 {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl Sub for Point3 {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl Mul<f64> for Point3 {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self {
        Self::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

/// Vector arithmetic needed to interpolate a spline through waypoints.
///
/// Implemented for [`Point`] (schematic view) and [`Point3`] (campus
/// view) so a single curve implementation serves both.
pub trait Waypoint: Copy + std::fmt::Debug {
    /// The origin.
    const ZERO: Self;

    /// Component-wise `self + other * scale`.
    #[must_use]
    fn add_scaled(self, other: Self, scale: f64) -> Self;

    /// Component-wise difference `self - other`.
    #[must_use]
    fn minus(self, other: Self) -> Self;

    /// Multiply every component by `scale`.
    #[must_use]
    fn scaled(self, scale: f64) -> Self;

    /// Squared Euclidean distance to another waypoint.
    fn distance_squared_to(self, other: Self) -> f64;

    /// Whether every component is finite.
    fn is_finite(self) -> bool;

    /// Euclidean distance to another waypoint.
    fn distance_to(self, other: Self) -> f64 {
        self.distance_squared_to(other).sqrt()
    }

    /// Unit vector in the same direction, or the zero vector when the
    /// length is zero.
    #[must_use]
    fn unit(self) -> Self {
        let len = self.distance_to(Self::ZERO);
        if len > 0.0 { self.scaled(1.0 / len) } else { Self::ZERO }
    }
}

impl Waypoint for Point {
    const ZERO: Self = Self::new(0.0, 0.0);

    fn add_scaled(self, other: Self, scale: f64) -> Self {
        Self::new(other.x.mul_add(scale, self.x), other.y.mul_add(scale, self.y))
    }

    fn minus(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }

    fn scaled(self, scale: f64) -> Self {
        Self::new(self.x * scale, self.y * scale)
    }

    fn distance_squared_to(self, other: Self) -> f64 {
        self.distance_squared(other)
    }

    fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Waypoint for Point3 {
    const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    fn add_scaled(self, other: Self, scale: f64) -> Self {
        Self::new(
            other.x.mul_add(scale, self.x),
            other.y.mul_add(scale, self.y),
            other.z.mul_add(scale, self.z),
        )
    }

    fn minus(self, other: Self) -> Self {
        self - other
    }

    fn scaled(self, scale: f64) -> Self {
        self * scale
    }

    fn distance_squared_to(self, other: Self) -> f64 {
        let d = self - other;
        d.dot(d)
    }

    fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// A sequence of connected plan points forming a road, route, or path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline(Vec<Point>);

impl Polyline {
    /// Create a new polyline from a vector of points.
    #[must_use]
    pub const fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// Build a polyline from `(x, y)` pairs.
    #[must_use]
    pub fn from_pairs(pairs: &[(f64, f64)]) -> Self {
        Self(pairs.iter().map(|&(x, y)| Point::new(x, y)).collect())
    }

    /// Returns `true` if the polyline has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of points in the polyline.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the first point, if any.
    #[must_use]
    pub fn first(&self) -> Option<&Point> {
        self.0.first()
    }

    /// Returns the last point, if any.
    #[must_use]
    pub fn last(&self) -> Option<&Point> {
        self.0.last()
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    /// Total length of the straight segments between consecutive points.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.0.windows(2).map(|w| w[0].distance(w[1])).sum()
    }

    /// Lift every point into the 3D scene at a fixed height.
    #[must_use]
    pub fn lift(&self, height: f64) -> Vec<Point3> {
        self.0.iter().map(|p| p.lift(height)).collect()
    }
}

/// Footprint dimensions of a building block, in plan units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    /// Extent along the plan `x` axis.
    pub width: f64,
    /// Extent along the plan `y` axis.
    pub depth: f64,
}

impl Footprint {
    /// Create a new footprint.
    #[must_use]
    pub const fn new(width: f64, depth: f64) -> Self {
        Self { width, depth }
    }
}

/// Geographic coordinate for map-SDK collaborators (WGS84 degrees).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinate {
    pub lat: f64,
    pub lng: f64,
}

impl GeoCoordinate {
    /// Create a new coordinate.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Convert to a `geo` point (`x` = longitude, `y` = latitude).
    #[must_use]
    pub fn to_geo(self) -> geo::Point<f64> {
        geo::Point::new(self.lng, self.lat)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // --- Point tests ---

    #[test]
    fn point_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((a.distance_squared(b) - 25.0).abs() < f64::EPSILON);
        assert!((a.distance(b) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn point_lift_maps_plan_y_to_scene_z() {
        let p = Point::new(-6.0, 10.0).lift(7.6);
        assert_eq!(p, Point3::new(-6.0, 7.6, 10.0));
        assert_eq!(p.plan(), Point::new(-6.0, 10.0));
    }

    // --- Point3 tests ---

    #[test]
    fn cross_of_axes_is_third_axis() {
        let x = Point3::new(1.0, 0.0, 0.0);
        let y = Point3::new(0.0, 1.0, 0.0);
        assert_eq!(x.cross(y), Point3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn normalize_zero_vector_stays_zero() {
        let z = Point3::new(0.0, 0.0, 0.0);
        assert_eq!(z.normalize(), z);
    }

    #[test]
    fn rotate_quarter_turn_around_y() {
        let v = Point3::new(1.0, 0.0, 0.0);
        let r = v.rotate_around(Point3::new(0.0, 1.0, 0.0), std::f64::consts::FRAC_PI_2);
        assert!((r.x - 0.0).abs() < 1e-12);
        assert!((r.z - -1.0).abs() < 1e-12);
    }

    // --- Waypoint tests ---

    #[test]
    fn waypoint_add_scaled() {
        let p = Point::new(1.0, 1.0).add_scaled(Point::new(2.0, -2.0), 0.5);
        assert_eq!(p, Point::new(2.0, 0.0));
    }

    #[test]
    fn waypoint_finite_check() {
        assert!(Point::new(1.0, 2.0).is_finite());
        assert!(!Point::new(f64::NAN, 2.0).is_finite());
        assert!(!Point3::new(0.0, f64::INFINITY, 0.0).is_finite());
    }

    // --- Polyline tests ---

    #[test]
    fn polyline_length_sums_segments() {
        let pl = Polyline::from_pairs(&[(0.0, 0.0), (3.0, 4.0), (3.0, 10.0)]);
        assert!((pl.length() - 11.0).abs() < 1e-12);
        assert_eq!(pl.len(), 3);
        assert_eq!(pl.first(), Some(&Point::new(0.0, 0.0)));
        assert_eq!(pl.last(), Some(&Point::new(3.0, 10.0)));
    }

    #[test]
    fn polyline_empty() {
        let pl = Polyline::new(vec![]);
        assert!(pl.is_empty());
        assert!(pl.first().is_none());
        assert!((pl.length()).abs() < f64::EPSILON);
    }

    #[test]
    fn geo_coordinate_orders_lng_lat() {
        let c = GeoCoordinate::new(21.2992, -157.8174).to_geo();
        assert!((c.x() - -157.8174).abs() < f64::EPSILON);
        assert!((c.y() - 21.2992).abs() < f64::EPSILON);
    }

    #[test]
    fn polyline_serde_round_trip() {
        let pl = Polyline::from_pairs(&[(0.0, 0.0), (1.5, 2.5)]);
        let json = serde_json::to_string(&pl).unwrap();
        let back: Polyline = serde_json::from_str(&json).unwrap();
        assert_eq!(pl, back);
    }
}
