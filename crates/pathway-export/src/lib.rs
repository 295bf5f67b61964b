//! pathway-export: Pure format serializers (sans-IO)
//!
//! Converts laid-out itineraries into output formats. Currently supports
//! an SVG schematic of the campus plan.

pub mod svg;

pub use svg::{SvgMetadata, build_path_data, to_svg};
