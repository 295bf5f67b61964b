//! SVG schematic serializer.
//!
//! Draws a laid-out itinerary in plan coordinates using the [`svg`] crate
//! for document construction, XML escaping, and path data formatting:
//!
//! - `<g id="roads">`: one closed `<path>` per road loop, plus the car
//!   route (dashed) when present.
//! - `<g id="buildings">`: one `<rect>` per focus building footprint.
//! - `<path id="itinerary">`: the smooth path through every stop.
//! - `<g id="stops">`: one `<circle>` marker per stop, in stop order, with
//!   a numbered label and a `<title>` tooltip.
//!
//! Optional [`SvgMetadata`] embeds `<title>` and `<desc>` elements.
//!
//! This is a pure function with no I/O -- it returns a `String`.

use svg::Document;
use svg::node::element::path::Data;
use svg::node::element::{Circle, Description, Element, Group, Path, Rectangle, Title};
use svg::node::{Node, Text, Value};

use pathway_engine::{Plan, Planner, Point, Point3, Stop};

/// Samples taken along each road loop and the car route.
const ROAD_SAMPLES: usize = 256;
/// Samples taken along the itinerary path.
const PATH_SAMPLES: usize = 200;
/// Plan units of empty space around the drawing.
const PADDING: f64 = 6.0;
/// Stop marker radius in plan units.
const MARKER_RADIUS: f64 = 2.5;

/// Metadata to embed in the SVG document.
#[derive(Debug, Clone, Default)]
pub struct SvgMetadata<'a> {
    /// Document title, emitted as `<title>`.
    pub title: Option<&'a str>,

    /// Document description, emitted as `<desc>`.
    pub description: Option<&'a str>,
}

/// Build an SVG path `d` attribute string from plan points.
///
/// Uses `M` for the first point, `L` for subsequent points, and `z` when
/// `closed`. Returns an empty string for fewer than 2 points.
///
/// # Examples
///
/// ```
/// use pathway_engine::Point;
/// use pathway_export::build_path_data;
///
/// let points = [Point::new(10.0, 20.0), Point::new(30.0, 40.0)];
/// assert_eq!(build_path_data(&points, false), "M10,20 L30,40");
/// ```
#[must_use]
pub fn build_path_data(points: &[Point], closed: bool) -> String {
    if points.len() < 2 {
        return String::new();
    }

    let first = &points[0];
    let mut data = Data::new().move_to((first.x, first.y));
    for p in &points[1..] {
        data = data.line_to((p.x, p.y));
    }
    if closed {
        data = data.close();
    }
    String::from(Value::from(data))
}

/// Axis-aligned extent of everything drawn.
#[derive(Debug, Clone, Copy)]
struct Bounds {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl Bounds {
    const EMPTY: Self = Self {
        min_x: f64::INFINITY,
        min_y: f64::INFINITY,
        max_x: f64::NEG_INFINITY,
        max_y: f64::NEG_INFINITY,
    };

    fn include(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    /// `(x, y, width, height)` with padding; a unit box around the origin
    /// when nothing was included.
    fn view_box(self) -> (f64, f64, f64, f64) {
        if self.min_x > self.max_x {
            return (-PADDING, -PADDING, 2.0 * PADDING, 2.0 * PADDING);
        }
        (
            self.min_x - PADDING,
            self.min_y - PADDING,
            self.max_x - self.min_x + 2.0 * PADDING,
            self.max_y - self.min_y + 2.0 * PADDING,
        )
    }
}

fn stop_tooltip(index: usize, stop: &Stop) -> String {
    let label = if stop.code.is_empty() || stop.code == stop.name {
        stop.name.clone()
    } else {
        format!("{} {}", stop.code, stop.name)
    };
    format!(
        "{}. {label} ({} to {}) at {}",
        index + 1,
        stop.start_time,
        stop.end_time,
        stop.location_name,
    )
}

/// Serialize a plan into an SVG schematic.
///
/// Static campus geometry (roads, car route, focus buildings) comes from
/// `planner`; the path and markers come from `plan`. The `viewBox` covers
/// everything drawn plus a margin.
#[must_use]
pub fn to_svg(planner: &Planner, plan: &Plan, metadata: &SvgMetadata<'_>) -> String {
    let mut bounds = Bounds::EMPTY;

    let road_points: Vec<Vec<Point>> = planner
        .layout()
        .roads()
        .iter()
        .map(|road| {
            road.curve
                .sample(ROAD_SAMPLES)
                .into_iter()
                .map(Point3::plan)
                .collect()
        })
        .collect();
    let route_points: Vec<Point> = planner
        .layout()
        .car_route()
        .map(|route| {
            route
                .sample(ROAD_SAMPLES)
                .into_iter()
                .map(Point3::plan)
                .collect()
        })
        .unwrap_or_default();
    let path_points: Vec<Point> = plan
        .path
        .as_ref()
        .map(|path| path.plan.sample(PATH_SAMPLES))
        .unwrap_or_default();

    for p in road_points.iter().flatten().chain(&route_points).chain(&path_points) {
        bounds.include(p.x, p.y);
    }
    for building in planner.footprints() {
        let half_w = building.footprint.width / 2.0;
        let half_d = building.footprint.depth / 2.0;
        bounds.include(building.center.x - half_w, building.center.y - half_d);
        bounds.include(building.center.x + half_w, building.center.y + half_d);
    }
    for stop in plan.schedule.stops() {
        bounds.include(stop.position.x, stop.position.y);
    }

    let (x, y, width, height) = bounds.view_box();
    let mut doc = Document::new()
        .set("viewBox", (x, y, width, height))
        .set("preserveAspectRatio", "xMidYMid meet");

    if let Some(title) = metadata.title {
        doc = doc.add(Title::new(title));
    }
    if let Some(description) = metadata.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }

    let mut roads = Group::new()
        .set("id", "roads")
        .set("fill", "none")
        .set("stroke", "#9ca3af");
    for (index, points) in road_points.iter().enumerate() {
        let d = build_path_data(points, true);
        if d.is_empty() {
            continue;
        }
        roads = roads.add(
            Path::new()
                .set("d", d)
                .set("stroke-width", 2.0 * planner.layout().config().road_radius_for(index)),
        );
    }
    let route = build_path_data(&route_points, true);
    if !route.is_empty() {
        roads = roads.add(
            Path::new()
                .set("id", "car-route")
                .set("d", route)
                .set("stroke", "#f59e0b")
                .set("stroke-width", 0.8)
                .set("stroke-dasharray", "3 2"),
        );
    }
    doc = doc.add(roads);

    let mut buildings = Group::new().set("id", "buildings");
    for building in planner.footprints() {
        buildings = buildings.add(
            Rectangle::new()
                .set("x", building.center.x - building.footprint.width / 2.0)
                .set("y", building.center.y - building.footprint.depth / 2.0)
                .set("width", building.footprint.width)
                .set("height", building.footprint.depth)
                .set("fill", building.color.as_str())
                .set("data-location", building.key.as_str()),
        );
    }
    doc = doc.add(buildings);

    let d = build_path_data(&path_points, false);
    if !d.is_empty() {
        let radius = plan.path.as_ref().map_or(0.6, |path| path.tube.radius);
        doc = doc.add(
            Path::new()
                .set("id", "itinerary")
                .set("d", d)
                .set("fill", "none")
                .set("stroke", "#38bdf8")
                .set("stroke-width", 2.0 * radius)
                .set("stroke-linecap", "round"),
        );
    }

    let mut stops = Group::new().set("id", "stops");
    for (index, stop) in plan.schedule.stops().iter().enumerate() {
        let marker = Circle::new()
            .set("cx", stop.position.x)
            .set("cy", stop.position.y)
            .set("r", MARKER_RADIUS)
            .set("fill", stop.color.as_str())
            .set("stroke", "white")
            .set("stroke-width", 0.5)
            .set("data-stop", index)
            .set("data-location", stop.location_key.as_str())
            .add(Title::new(stop_tooltip(index, stop)));
        stops = stops.add(marker);

        let mut label = Element::new("text");
        label.assign("x", stop.position.x);
        label.assign("y", stop.position.y - MARKER_RADIUS - 1.0);
        label.assign("text-anchor", "middle");
        label.assign("font-size", 3);
        label.append(Text::new((index + 1).to_string()));
        stops = stops.add(label);
    }
    doc = doc.add(stops);

    // The svg crate omits the XML declaration, so we prepend it.
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pathway_engine::{CampusConfig, RawCourse};

    fn planner() -> Planner {
        Planner::new(CampusConfig::default()).unwrap()
    }

    fn named(name: &str) -> RawCourse {
        RawCourse {
            name: Some(name.to_string()),
            ..RawCourse::default()
        }
    }

    fn no_meta() -> SvgMetadata<'static> {
        SvgMetadata::default()
    }

    #[test]
    fn build_path_data_open_and_closed() {
        let points = [
            Point::new(10.0, 15.0),
            Point::new(12.5, 18.3),
            Point::new(14.0, 20.1),
        ];
        assert_eq!(build_path_data(&points, false), "M10,15 L12.5,18.3 L14,20.1");
        assert!(build_path_data(&points, true).ends_with('z'));
    }

    #[test]
    fn build_path_data_skips_single_point() {
        assert!(build_path_data(&[Point::new(1.0, 1.0)], false).is_empty());
        assert!(build_path_data(&[], true).is_empty());
    }

    #[test]
    fn one_marker_per_stop() {
        let planner = planner();
        let plan = planner
            .plan(&[named("ICS 111"), named("Writing Lab"), named("MATH 241")])
            .unwrap();
        let svg = to_svg(&planner, &plan, &no_meta());
        assert_eq!(svg.matches("<circle").count(), 3);
        assert!(svg.contains(r#"id="itinerary""#));
        assert!(svg.contains(r#"data-location="kuykendall""#));
    }

    #[test]
    fn empty_plan_still_draws_campus() {
        let planner = planner();
        let plan = planner.plan(&[]).unwrap();
        let svg = to_svg(&planner, &plan, &no_meta());
        assert!(svg.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(!svg.contains("<circle"));
        assert!(!svg.contains(r#"id="itinerary""#));
        assert!(svg.contains(r#"id="car-route""#));
        assert_eq!(svg.matches("<rect").count(), planner.footprints().len());
    }

    #[test]
    fn single_stop_has_marker_but_no_path() {
        let planner = planner();
        let plan = planner.plan(&[named("Intro Lab")]).unwrap();
        let svg = to_svg(&planner, &plan, &no_meta());
        assert_eq!(svg.matches("<circle").count(), 1);
        assert!(!svg.contains(r#"id="itinerary""#));
    }

    #[test]
    fn tooltip_names_time_and_building() {
        let planner = planner();
        let plan = planner.plan(&[named("ICS 111 Intro to CS")]).unwrap();
        let svg = to_svg(&planner, &plan, &no_meta());
        assert!(svg.contains("1. ICS 111 Intro to CS (8:30 AM to 9:45 AM)"));
    }

    #[test]
    fn title_and_desc_emitted_and_escaped() {
        let planner = planner();
        let plan = planner.plan(&[]).unwrap();
        let meta = SvgMetadata {
            title: Some("Fall <2026>"),
            description: Some("Mānoa & friends"),
        };
        let svg = to_svg(&planner, &plan, &meta);
        assert!(svg.contains("<title>Fall &lt;2026&gt;</title>"));
        assert!(svg.contains("<desc>Mānoa &amp; friends</desc>"));
    }

    #[test]
    fn view_box_of_nothing_is_padded_unit_box() {
        let (x, y, w, h) = Bounds::EMPTY.view_box();
        assert!((x + PADDING).abs() < f64::EPSILON);
        assert!((y + PADDING).abs() < f64::EPSILON);
        assert!((w - 2.0 * PADDING).abs() < f64::EPSILON);
        assert!((h - 2.0 * PADDING).abs() < f64::EPSILON);
    }
}
