//! pathway-plan: CLI tool for planning campus itineraries.
//!
//! Reads a JSON list of courses (catalog rows or AI suggestions), resolves
//! each to a building and time window, lays the stops out along a path,
//! and prints the itinerary with per-stage diagnostics. Useful for:
//!
//! - Checking where a course list lands on campus
//! - Tuning alias, meta, and matcher tables in a campus config
//! - Comparing curve parameterizations and arc-length table densities
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin pathway-plan -- [OPTIONS] <COURSES_PATH>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{ArgAction, Parser, ValueEnum};
use pathway_engine::course::CatalogEntry;
use pathway_engine::diagnostics::{PlanDiagnostics, SystemClock, plan_with_diagnostics};
use pathway_engine::{CampusConfig, Catalog, CurveConfig, CurveKind, Plan, Planner, RawCourse};
use tracing_subscriber::EnvFilter;

/// Campus itinerary planning and diagnostics for pathway.
///
/// Resolves a course list into an ordered campus itinerary and prints the
/// stops along with per-stage timing and rule-hit diagnostics.
#[derive(Parser)]
#[command(name = "pathway-plan", version)]
struct Cli {
    /// Path to a JSON array of courses.
    courses_path: PathBuf,

    /// Campus configuration JSON file (defaults to UH Mānoa).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Full campus config as a JSON string.
    ///
    /// When provided, `--config` and the curve flags are ignored.
    #[arg(long)]
    config_json: Option<String>,

    /// Course catalog JSON file (array of catalog rows) used to fill in
    /// titles, credits, and descriptions.
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Catmull-Rom parameterization.
    #[arg(long, value_enum)]
    curve: Option<Curve>,

    /// Arc-length table samples per curve segment.
    #[arg(long, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    samples_per_segment: Option<usize>,

    /// Write an SVG schematic to file.
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Number of runs for averaging.
    #[arg(long, default_value_t = 1, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    runs: usize,

    /// Output the schedule and diagnostics as JSON.
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace). `RUST_LOG`
    /// takes precedence when set.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// Curve parameterization selection.
#[derive(Clone, Copy, ValueEnum)]
enum Curve {
    /// Knot spacing by square root of chord length (no cusps).
    Centripetal,
    /// Knot spacing by chord length.
    Chordal,
    /// Uniform knots.
    Uniform,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Result<T, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Error reading {what} {}: {e}", path.display()))?;
    serde_json::from_str(&text).map_err(|e| format!("Error parsing {what} {}: {e}", path.display()))
}

/// Build a [`CampusConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and every
/// other config flag is ignored. Otherwise the `--config` file (or the
/// built-in campus) is loaded and the curve flags applied on top.
fn config_from_cli(cli: &Cli) -> Result<CampusConfig, String> {
    if let Some(ref json) = cli.config_json {
        return CampusConfig::from_json(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    let mut config = match cli.config {
        Some(ref path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| format!("Error reading config {}: {e}", path.display()))?;
            CampusConfig::from_json(&text)
                .map_err(|e| format!("Error parsing config {}: {e}", path.display()))?
        }
        None => CampusConfig::default(),
    };

    config.curve = CurveConfig {
        kind: cli.curve.map_or(config.curve.kind, |curve| match curve {
            Curve::Centripetal => CurveKind::Centripetal,
            Curve::Chordal => CurveKind::Chordal,
            Curve::Uniform => CurveKind::Uniform,
        }),
        samples_per_segment: cli
            .samples_per_segment
            .unwrap_or(config.curve.samples_per_segment),
    };
    Ok(config)
}

fn print_itinerary(plan: &Plan) {
    println!(
        "{:<3} {:>8} {:>8}  {:<10} {:<32} {}",
        "#", "Start", "End", "Code", "Course", "Location"
    );
    println!("{}", "-".repeat(100));
    for (i, stop) in plan.schedule.stops().iter().enumerate() {
        println!(
            "{:<3} {:>8} {:>8}  {:<10} {:<32} {}",
            i + 1,
            stop.start_time,
            stop.end_time,
            stop.code,
            stop.name,
            stop.location_name,
        );
    }
    for leg in plan.schedule.legs() {
        if leg.gap_minutes < 0 {
            println!(
                "warning: stops {} and {} overlap by {} minutes",
                leg.from + 1,
                leg.to + 1,
                -leg.gap_minutes,
            );
        }
    }
    println!();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let mut planner = match Planner::new(config) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Invalid campus config: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Some(ref path) = cli.catalog {
        match read_json::<Vec<CatalogEntry>>(path, "catalog") {
            Ok(entries) => planner = planner.with_catalog(Catalog::new(entries)),
            Err(msg) => {
                eprintln!("{msg}");
                return ExitCode::FAILURE;
            }
        }
    }

    let courses: Vec<RawCourse> = match read_json(&cli.courses_path, "courses") {
        Ok(courses) => courses,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    eprintln!(
        "Courses: {} ({} entries)",
        cli.courses_path.display(),
        courses.len(),
    );
    eprintln!("Campus: {}", planner.campus_name());
    eprintln!("Runs: {}", cli.runs);
    eprintln!();
    tracing::info!(
        locations = planner.registry().len(),
        rules = planner.resolver().rules().len(),
        catalog = planner.catalog().map_or(0, Catalog::len),
        "planner ready"
    );

    let mut all_diagnostics = Vec::with_capacity(cli.runs);

    for run in 0..cli.runs {
        if cli.runs > 1 {
            eprintln!("--- Run {}/{} ---", run + 1, cli.runs);
        }

        match plan_with_diagnostics(&planner, &courses, &SystemClock) {
            Ok((plan, diagnostics)) => {
                if cli.json {
                    let output = serde_json::json!({
                        "schedule": plan.schedule,
                        "diagnostics": diagnostics,
                    });
                    match serde_json::to_string_pretty(&output) {
                        Ok(json) => println!("{json}"),
                        Err(e) => {
                            eprintln!("Error serializing output: {e}");
                            return ExitCode::FAILURE;
                        }
                    }
                } else {
                    if run == 0 {
                        print_itinerary(&plan);
                    }
                    println!("{}", diagnostics.report());
                }

                // Write SVG on the first run only.
                if run == 0
                    && let Some(ref svg_path) = cli.svg
                {
                    let title = cli
                        .courses_path
                        .file_stem()
                        .and_then(|s| s.to_str())
                        .unwrap_or("itinerary");
                    let metadata = pathway_export::SvgMetadata {
                        title: Some(title),
                        description: Some(planner.campus_name()),
                    };
                    let svg = pathway_export::to_svg(&planner, &plan, &metadata);
                    match std::fs::write(svg_path, &svg) {
                        Ok(()) => {
                            eprintln!(
                                "SVG written to {} ({} bytes)",
                                svg_path.display(),
                                svg.len(),
                            );
                        }
                        Err(e) => {
                            eprintln!("Error writing SVG to {}: {e}", svg_path.display());
                        }
                    }
                }

                all_diagnostics.push(diagnostics);
            }
            Err(e) => {
                eprintln!("Layout error: {e}");
                return ExitCode::FAILURE;
            }
        }

        if cli.runs > 1 {
            eprintln!();
        }
    }

    if cli.runs > 1 {
        print_multi_run_summary(&all_diagnostics);
    }

    ExitCode::SUCCESS
}

/// Function pointer type for extracting a stage duration from diagnostics.
type StageExtractor = fn(&PlanDiagnostics) -> Duration;

/// Print aggregated statistics across multiple runs.
#[allow(clippy::cast_precision_loss)]
fn print_multi_run_summary(all_diagnostics: &[PlanDiagnostics]) {
    println!();
    println!(
        "Summary ({} runs)\n{}",
        all_diagnostics.len(),
        "=".repeat(60),
    );

    if all_diagnostics.is_empty() {
        println!("Warning: no diagnostics to summarize");
        return;
    }

    let durations: Vec<f64> = all_diagnostics
        .iter()
        .map(|d| d.total_duration.as_secs_f64() * 1000.0)
        .collect();

    let min = durations.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = durations.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let mean = durations.iter().sum::<f64>() / durations.len() as f64;

    println!("Total duration: min={min:.3}ms  mean={mean:.3}ms  max={max:.3}ms");

    println!();
    println!("{:<16} {:>12}", "Stage", "Mean (ms)");
    println!("{}", "-".repeat(30));

    let stage_extractors: &[(&str, StageExtractor)] = &[
        ("Shape", |d| d.shape.duration),
        ("Schedule", |d| d.schedule.duration),
        ("Layout", |d| d.layout.duration),
    ];

    for (name, extractor) in stage_extractors {
        let stage_mean = all_diagnostics
            .iter()
            .map(|d| extractor(d).as_secs_f64() * 1000.0)
            .sum::<f64>()
            / all_diagnostics.len() as f64;
        println!("{name:<16} {stage_mean:>10.3}ms");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("pathway-plan").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_to_built_in_campus() {
        let config = config_from_cli(&cli(&["courses.json"])).unwrap();
        assert_eq!(config, CampusConfig::default());
    }

    #[test]
    fn curve_flags_override_config() {
        let config = config_from_cli(&cli(&[
            "courses.json",
            "--curve",
            "chordal",
            "--samples-per-segment",
            "8",
        ]))
        .unwrap();
        assert_eq!(config.curve.kind, CurveKind::Chordal);
        assert_eq!(config.curve.samples_per_segment, 8);
    }

    #[test]
    fn config_json_ignores_curve_flags() {
        let config = config_from_cli(&cli(&[
            "courses.json",
            "--curve",
            "uniform",
            "--config-json",
            r#"{ "name": "Elsewhere" }"#,
        ]))
        .unwrap();
        assert_eq!(config.name, "Elsewhere");
        assert_eq!(config.curve.kind, CurveKind::Centripetal);
    }

    #[test]
    fn bad_config_json_is_reported() {
        let err = config_from_cli(&cli(&["courses.json", "--config-json", "{"])).unwrap_err();
        assert!(err.starts_with("Error parsing --config-json"));
    }

    #[test]
    fn zero_samples_rejected_by_parser() {
        let result = Cli::try_parse_from(["pathway-plan", "c.json", "--samples-per-segment", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn verbosity_counts() {
        assert_eq!(cli(&["c.json", "-vv"]).verbose, 2);
    }
}
