//! pathway-engine: Itinerary resolution and spatial layout (sans-IO).
//!
//! Turns a student's course list into an ordered campus itinerary through:
//! shape -> resolve -> build stops -> lay out path.
//!
//! Every course is assigned a building, a time window, and a color by an
//! ordered rule chain with graceful fallback, so resolution never fails.
//! The resulting stops are threaded onto an arc-length parameterized
//! Catmull-Rom curve for markers and the animated reveal.
//!
//! This crate has **no I/O dependencies**. Rendering backends plug in
//! through [`mesh::GeometryBackend`]; file and terminal handling lives in
//! `pathway-plan`.

pub mod animator;
pub mod config;
pub mod course;
pub mod curve;
pub mod diagnostics;
pub mod layout;
pub mod manoa;
pub mod mesh;
pub mod registry;
pub mod resolver;
pub mod schedule;
pub mod types;

use std::sync::Arc;

pub use animator::{PathAnimator, RevealState};
pub use config::{CampusConfig, ConfigError, ScheduleConfig};
pub use course::{Catalog, CourseRecord, CourseShaper, RawCourse};
pub use curve::{Curve, CurveConfig, CurveError, CurveKind};
pub use diagnostics::{Clock, PlanDiagnostics, SystemClock, plan_with_diagnostics};
pub use layout::{CampusLayout, ItineraryPath, LayoutConfig};
pub use mesh::{GeometryBackend, RetainedGeometry, TubeMesh, TubeParams};
pub use registry::{BuildingFootprint, BuildingRegistry, Location};
pub use resolver::{CourseResolver, MatchField, ResolvedBy, ResolvedMeta};
pub use schedule::{Schedule, ScheduleBuilder, Stop};
pub use types::{Point, Point3, Polyline};

/// Output of [`Planner::plan`].
#[derive(Debug, Clone)]
pub struct Plan {
    /// Shaped course records, in input order.
    pub courses: Vec<CourseRecord>,
    pub schedule: Schedule,
    /// Path through the stops; `None` with fewer than two stops.
    pub path: Option<ItineraryPath>,
}

/// A validated campus configuration compiled into immutable lookup tables.
///
/// Construction does all validation; every planning call afterwards is
/// infallible except for curve construction on non-finite positions.
#[derive(Debug, Clone)]
pub struct Planner {
    name: String,
    registry: Arc<BuildingRegistry>,
    resolver: Arc<CourseResolver>,
    builder: ScheduleBuilder,
    shaper: CourseShaper,
    catalog: Option<Arc<Catalog>>,
    layout: CampusLayout,
    footprints: Vec<BuildingFootprint>,
}

impl Planner {
    /// Validate `config` and compile it.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] describing the first problem found: a
    /// duplicate or non-finite location, an unknown fallback, an alias,
    /// meta entry, matcher, or focus building naming an unknown location,
    /// an invalid matcher pattern, a bad slot table or palette, zero curve
    /// samples, or a road loop that cannot form a curve.
    pub fn new(config: CampusConfig) -> Result<Self, ConfigError> {
        if config.curve.samples_per_segment == 0 {
            return Err(ConfigError::ZeroSamples);
        }

        let registry = Arc::new(BuildingRegistry::new(
            &config.locations,
            &config.aliases,
            &config.fallback_location,
        )?);

        if let Some(key) = config
            .focus_buildings
            .iter()
            .find(|key| registry.try_resolve_key(key).is_none())
        {
            return Err(ConfigError::UnknownLocation {
                context: "focus buildings".to_string(),
                key: key.clone(),
            });
        }
        let footprints = registry.footprints(&config.focus_buildings, &config.focus_palette);

        let resolver = Arc::new(CourseResolver::new(
            Arc::clone(&registry),
            &config.course_meta,
            &config.matchers,
        )?);
        let builder = ScheduleBuilder::new(Arc::clone(&resolver), config.schedule)?;
        let shaper =
            CourseShaper::new(&config.default_location_label).map_err(ConfigError::CodePattern)?;
        let layout = CampusLayout::new(&config.roads, &config.car_route, config.curve, config.layout)?;

        tracing::debug!(
            campus = %config.name,
            locations = registry.len(),
            rules = resolver.rules().len(),
            "planner ready"
        );

        Ok(Self {
            name: config.name,
            registry,
            resolver,
            builder,
            shaper,
            catalog: None,
            layout,
            footprints,
        })
    }

    /// Enrich shaped courses from `catalog`.
    #[must_use]
    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = Some(Arc::new(catalog));
        self
    }

    #[must_use]
    pub fn campus_name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn registry(&self) -> &BuildingRegistry {
        &self.registry
    }

    #[must_use]
    pub fn resolver(&self) -> &CourseResolver {
        &self.resolver
    }

    #[must_use]
    pub const fn schedule_builder(&self) -> &ScheduleBuilder {
        &self.builder
    }

    #[must_use]
    pub const fn layout(&self) -> &CampusLayout {
        &self.layout
    }

    #[must_use]
    pub fn catalog(&self) -> Option<&Catalog> {
        self.catalog.as_deref()
    }

    /// Focus buildings with their palette colors, for block rendering.
    #[must_use]
    pub fn footprints(&self) -> &[BuildingFootprint] {
        &self.footprints
    }

    /// Shape raw input into course records.
    #[must_use]
    pub fn shape(&self, raw: &[RawCourse]) -> Vec<CourseRecord> {
        self.shaper.shape_all(raw, self.catalog())
    }

    /// Resolve courses and build the ordered stops.
    #[must_use]
    pub fn schedule(&self, courses: &[CourseRecord]) -> Schedule {
        self.builder.build(courses)
    }

    /// The path through a schedule's stops.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::NonFiniteWaypoint`] if a stop position is not
    /// finite.
    pub fn itinerary_path(&self, schedule: &Schedule) -> Result<Option<ItineraryPath>, CurveError> {
        self.layout.itinerary_path(schedule)
    }

    /// Run every stage: shape, resolve and build stops, lay out the path.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError`] if the itinerary path cannot be built.
    pub fn plan(&self, raw: &[RawCourse]) -> Result<Plan, CurveError> {
        let courses = self.shape(raw);
        let schedule = self.schedule(&courses);
        let path = self.itinerary_path(&schedule)?;
        Ok(Plan {
            courses,
            schedule,
            path,
        })
    }
}
