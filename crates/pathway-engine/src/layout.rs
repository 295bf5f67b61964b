//! Campus layout: road loops, the car route, and the itinerary path in
//! scene coordinates.
//!
//! Plan points `(x, y)` are lifted to scene points `(x, height, y)`. Each
//! kind of geometry sits at its own height above the ground so overlapping
//! tubes do not z-fight: roads just above the ground, the car route above
//! the roads, and the itinerary path well above the buildings' bases.

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::curve::{Curve, CurveConfig, CurveError};
use crate::mesh::TubeParams;
use crate::schedule::{Schedule, Stop};
use crate::types::{Point, Point3, Polyline};

/// Heights and tube radii for the 3D campus view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Ground plane height.
    pub base_height: f64,
    /// Road tubes, above the ground.
    pub road_lift: f64,
    /// Car route tube, above the ground.
    pub route_lift: f64,
    /// Itinerary path, above the ground.
    pub path_lift: f64,
    /// Stop markers, above the building roof.
    pub marker_clearance: f64,
    /// Tube radius of the first (outer) road loop.
    pub outer_road_radius: f64,
    /// Tube radius of every other road loop.
    pub road_radius: f64,
    /// Tube radius of the itinerary path.
    pub path_radius: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            base_height: 1.6,
            road_lift: 0.15,
            route_lift: 0.4,
            path_lift: 6.0,
            marker_clearance: 2.5,
            outer_road_radius: 1.6,
            road_radius: 1.0,
            path_radius: 0.6,
        }
    }
}

impl LayoutConfig {
    #[must_use]
    pub fn road_height(&self) -> f64 {
        self.base_height + self.road_lift
    }

    #[must_use]
    pub fn route_height(&self) -> f64 {
        self.base_height + self.route_lift
    }

    #[must_use]
    pub fn path_height(&self) -> f64 {
        self.base_height + self.path_lift
    }

    /// Tube radius of road loop `index`.
    #[must_use]
    pub const fn road_radius_for(&self, index: usize) -> f64 {
        if index == 0 {
            self.outer_road_radius
        } else {
            self.road_radius
        }
    }
}

/// A road loop as a closed scene curve.
#[derive(Debug, Clone)]
pub struct RoadCurve {
    pub curve: Curve<Point3>,
    /// Tube parameters for tessellation.
    pub tube: TubeParams,
}

/// The stop path: an open curve through every stop in order.
#[derive(Debug, Clone)]
pub struct ItineraryPath {
    /// Curve through the stops' plan positions.
    pub plan: Curve<Point>,
    /// The same path lifted to the path height.
    pub scene: Curve<Point3>,
    /// Arc-length fraction at which the path reaches each stop.
    pub marker_fractions: Vec<f64>,
    /// Marker position above each stop's building.
    pub markers: Vec<Point3>,
    pub tube: TubeParams,
}

impl ItineraryPath {
    /// Number of markers the path has passed at `progress` (a fraction of
    /// the path's length).
    #[must_use]
    pub fn markers_reached(&self, progress: f64) -> usize {
        self.marker_fractions
            .iter()
            .filter(|&&f| f <= progress)
            .count()
    }
}

/// Static campus geometry plus the parameters for itinerary paths.
#[derive(Debug, Clone)]
pub struct CampusLayout {
    roads: Vec<RoadCurve>,
    car_route: Option<Curve<Point3>>,
    curve: CurveConfig,
    config: LayoutConfig,
}

impl CampusLayout {
    /// Build closed curves for every road loop and the car route. An empty
    /// car route is allowed and yields no curve.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Road`] when a loop cannot form a curve;
    /// `index == roads.len()` denotes the car route.
    pub fn new(
        roads: &[Polyline],
        car_route: &Polyline,
        curve: CurveConfig,
        config: LayoutConfig,
    ) -> Result<Self, ConfigError> {
        let roads = roads
            .iter()
            .enumerate()
            .map(|(index, road)| {
                let points = road.lift(config.road_height());
                let built = Curve::new(&points, true, &curve)
                    .map_err(|source| ConfigError::Road { index, source })?;
                Ok(RoadCurve {
                    curve: built,
                    tube: TubeParams::with_radius(config.road_radius_for(index)),
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        let car_route = if car_route.is_empty() {
            None
        } else {
            let points = car_route.lift(config.route_height());
            Some(
                Curve::new(&points, true, &curve).map_err(|source| ConfigError::Road {
                    index: roads.len(),
                    source,
                })?,
            )
        };

        tracing::debug!(
            roads = roads.len(),
            car_route = car_route.is_some(),
            "built campus layout"
        );

        Ok(Self {
            roads,
            car_route,
            curve,
            config,
        })
    }

    #[must_use]
    pub fn roads(&self) -> &[RoadCurve] {
        &self.roads
    }

    #[must_use]
    pub const fn car_route(&self) -> Option<&Curve<Point3>> {
        self.car_route.as_ref()
    }

    #[must_use]
    pub const fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Marker position above a stop's building.
    #[must_use]
    pub fn marker_position(&self, stop: &Stop) -> Point3 {
        stop.position3 + Point3::new(0.0, self.config.marker_clearance, 0.0)
    }

    /// The path through `schedule`'s stops, or `None` with fewer than two
    /// stops.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::NonFiniteWaypoint`] if a stop position is not
    /// finite.
    pub fn itinerary_path(&self, schedule: &Schedule) -> Result<Option<ItineraryPath>, CurveError> {
        let stops = schedule.stops();
        if stops.len() < 2 {
            return Ok(None);
        }

        let plan_points: Vec<Point> = stops.iter().map(|s| s.position).collect();
        let height = self.config.path_height();
        let scene_points: Vec<Point3> = plan_points.iter().map(|p| p.lift(height)).collect();

        let plan = Curve::new(&plan_points, false, &self.curve)?;
        let scene = Curve::new(&scene_points, false, &self.curve)?;
        let marker_fractions = scene.waypoint_fractions();
        let markers = stops.iter().map(|s| self.marker_position(s)).collect();

        tracing::debug!(
            stops = stops.len(),
            length = scene.length(),
            "built itinerary path"
        );

        Ok(Some(ItineraryPath {
            plan,
            scene,
            marker_fractions,
            markers,
            tube: TubeParams::with_radius(self.config.path_radius),
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::CampusConfig;

    fn manoa() -> CampusLayout {
        let config = CampusConfig::default();
        CampusLayout::new(&config.roads, &config.car_route, config.curve, config.layout).unwrap()
    }

    fn stop_at(x: f64, y: f64, height: f64) -> Stop {
        Stop {
            id: String::new(),
            code: String::new(),
            name: String::new(),
            location_key: String::new(),
            location_name: String::new(),
            start_time: String::new(),
            end_time: String::new(),
            start_minutes: 0,
            end_minutes: 0,
            position: Point::new(x, y),
            position3: Point::new(x, y).lift(height),
            color: String::new(),
            description: String::new(),
        }
    }

    #[test]
    fn heights() {
        let config = LayoutConfig::default();
        assert!((config.road_height() - 1.75).abs() < 1e-12);
        assert!((config.route_height() - 2.0).abs() < 1e-12);
        assert!((config.path_height() - 7.6).abs() < 1e-12);
        assert!((config.road_radius_for(0) - 1.6).abs() < f64::EPSILON);
        assert!((config.road_radius_for(1) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn roads_are_closed_at_road_height() {
        let layout = manoa();
        assert_eq!(layout.roads().len(), 2);
        for road in layout.roads() {
            assert!(road.curve.is_closed());
            let start = road.curve.point_at(0.0);
            let end = road.curve.point_at(1.0);
            assert!((start - end).magnitude() < 1e-9);
            assert!((start.y - 1.75).abs() < 1e-9);
            assert!(road.curve.length() > 0.0);
        }
        assert!((layout.roads()[0].tube.radius - 1.6).abs() < f64::EPSILON);
        assert!((layout.roads()[1].tube.radius - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn car_route_is_lifted_above_roads() {
        let layout = manoa();
        let route = layout.car_route().unwrap();
        assert!(route.is_closed());
        assert!((route.point_at(0.37).y - 2.0).abs() < 1e-9);
    }

    #[test]
    fn empty_car_route_is_skipped() {
        let config = CampusConfig::default();
        let layout = CampusLayout::new(
            &config.roads,
            &Polyline::new(vec![]),
            config.curve,
            config.layout,
        )
        .unwrap();
        assert!(layout.car_route().is_none());
    }

    #[test]
    fn degenerate_road_reports_index() {
        let roads = vec![
            Polyline::from_pairs(&[(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)]),
            Polyline::from_pairs(&[(1.0, 1.0)]),
        ];
        let err = CampusLayout::new(
            &roads,
            &Polyline::new(vec![]),
            CurveConfig::default(),
            LayoutConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Road {
                index: 1,
                source: CurveError::TooFewWaypoints { count: 1 }
            }
        ));
    }

    #[test]
    fn path_needs_two_stops() {
        let layout = manoa();
        assert!(layout.itinerary_path(&Schedule::new(vec![])).unwrap().is_none());
        let one = Schedule::new(vec![stop_at(0.0, 0.0, 10.0)]);
        assert!(layout.itinerary_path(&one).unwrap().is_none());
    }

    #[test]
    fn path_passes_through_stops_at_path_height() {
        let layout = manoa();
        let schedule = Schedule::new(vec![
            stop_at(0.0, 0.0, 10.0),
            stop_at(20.0, 0.0, 12.0),
            stop_at(20.0, 20.0, 8.0),
        ]);
        let path = layout.itinerary_path(&schedule).unwrap().unwrap();
        assert_eq!(path.marker_fractions.len(), 3);
        assert!(path.marker_fractions[0].abs() < 1e-12);
        assert!((path.marker_fractions[2] - 1.0).abs() < 1e-12);

        let second = path.scene.point_at(path.marker_fractions[1]);
        assert!((second - Point3::new(20.0, 7.6, 0.0)).magnitude() < 0.1);

        assert_eq!(path.markers[1], Point3::new(20.0, 14.5, 0.0));
        assert!((path.plan.length() - path.scene.length()).abs() < 1e-9);
    }

    #[test]
    fn markers_reached_counts_passed_fractions() {
        let layout = manoa();
        let schedule = Schedule::new(vec![
            stop_at(0.0, 0.0, 10.0),
            stop_at(10.0, 0.0, 10.0),
            stop_at(20.0, 0.0, 10.0),
        ]);
        let path = layout.itinerary_path(&schedule).unwrap().unwrap();
        assert_eq!(path.markers_reached(0.0), 1);
        assert_eq!(path.markers_reached(0.6), 2);
        assert_eq!(path.markers_reached(1.0), 3);
    }
}
