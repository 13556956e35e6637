//! lamella: CLI tool for solver parameter experimentation and
//! diagnostics.
//!
//! Runs the field solver on a pair of contour files with configurable
//! parameters, printing detailed per-stage diagnostics. Useful for:
//!
//! - Tuning grid size, tolerance, and the iteration cap
//! - Inspecting convergence behavior on new shapes
//! - Exporting fields, equipotentials, and thickness profiles as CSV
//! - Estimating the fractal dimension of a traced point set
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin lamella -- solve [OPTIONS] <OUTER_CSV> <INNER_CSV>
//! cargo run --release --bin lamella -- fractal [OPTIONS] <POINTS_CSV>
//! ```
//!
//! Contour files are two-column CSV (`x,y` per line); a single header
//! line is tolerated and skipped.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use lamella_solver::{Contour, Point, SolveDiagnostics, SolverConfig};

/// Field solver parameter experimentation and diagnostics for lamella.
#[derive(Parser)]
#[command(name = "lamella", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Solve the potential field between two nested contours.
    Solve(SolveArgs),
    /// Estimate the box-counting fractal dimension of a point set.
    Fractal(FractalArgs),
}

#[derive(Parser)]
struct SolveArgs {
    /// Path to the outer contour CSV (x,y per line).
    outer_path: PathBuf,

    /// Path to the inner contour CSV (x,y per line).
    inner_path: PathBuf,

    /// Raster grid side length L (grid is LxL).
    #[arg(long, default_value_t = SolverConfig::DEFAULT_GRID_SIZE, value_parser = clap::builder::RangedU64ValueParser::<u32>::new().range(4..))]
    grid_size: u32,

    /// Potential fixed on the interior region.
    #[arg(long, default_value_t = SolverConfig::DEFAULT_HIGH_POT, allow_hyphen_values = true)]
    high_pot: f64,

    /// Potential fixed on the exterior region.
    #[arg(long, default_value_t = SolverConfig::DEFAULT_LOW_POT, allow_hyphen_values = true)]
    low_pot: f64,

    /// Initial value of free annulus cells.
    #[arg(long, default_value_t = SolverConfig::DEFAULT_INIT_GUESS, allow_hyphen_values = true)]
    init_guess: f64,

    /// Relative convergence tolerance.
    #[arg(long, default_value_t = SolverConfig::DEFAULT_TOLERANCE)]
    tolerance: f64,

    /// Hard iteration cap.
    #[arg(long, default_value_t = SolverConfig::DEFAULT_MAX_ITERATIONS, value_parser = clap::builder::RangedU64ValueParser::<u32>::new().range(1..))]
    max_iterations: u32,

    /// Equipotential levels, comma-separated and non-decreasing.
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    levels: Option<Vec<f64>>,

    /// Full solver config as a JSON string.
    ///
    /// When provided, all other solver parameter flags are ignored.
    /// The JSON must be a valid `SolverConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,

    /// Write the full result (field, gradient, levels, thickness) as
    /// JSON to a file.
    #[arg(long)]
    result_json: Option<PathBuf>,

    /// Write the thickness profile as a single-row CSV.
    #[arg(long)]
    thickness_csv: Option<PathBuf>,

    /// Write the relaxed field grid as CSV.
    #[arg(long)]
    field_csv: Option<PathBuf>,

    /// Write the equipotential point table as CSV.
    #[arg(long)]
    levels_csv: Option<PathBuf>,

    /// Number of runs for duration averaging.
    #[arg(long, default_value_t = 1, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    runs: usize,

    /// Output diagnostics as JSON instead of a human-readable report.
    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
struct FractalArgs {
    /// Path to the point set CSV (x,y per line).
    points_path: PathBuf,

    /// Box scales, comma-separated. At least two distinct values.
    #[arg(long, value_delimiter = ',', default_values_t = [0.2, 0.1, 0.05, 0.025])]
    epsilons: Vec<f64>,

    /// Write the log-log regression table as CSV.
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Output the fit as JSON instead of a human-readable summary.
    #[arg(long)]
    json: bool,
}

/// Build a [`SolverConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored. Otherwise, a config is
/// assembled from the individual flags.
fn config_from_args(args: &SolveArgs) -> Result<SolverConfig, String> {
    if let Some(ref json) = args.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    Ok(SolverConfig {
        grid_size: args.grid_size,
        high_pot: args.high_pot,
        low_pot: args.low_pot,
        init_guess: args.init_guess,
        tolerance: args.tolerance,
        max_iterations: args.max_iterations,
        levels: args
            .levels
            .clone()
            .unwrap_or_else(SolverConfig::default_levels),
    })
}

/// Parse a two-column `x,y` CSV into points.
///
/// A single non-numeric header line is tolerated; blank lines are
/// skipped.
fn read_points(path: &PathBuf) -> Result<Vec<Point>, String> {
    let text =
        std::fs::read_to_string(path).map_err(|e| format!("Error reading {}: {e}", path.display()))?;
    let mut points = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let mut fields = trimmed.split(',');
        let parsed = fields
            .next()
            .map(str::trim)
            .and_then(|x| x.parse::<f64>().ok())
            .zip(
                fields
                    .next()
                    .map(str::trim)
                    .and_then(|y| y.parse::<f64>().ok()),
            );
        match parsed {
            Some((x, y)) => points.push(Point::new(x, y)),
            None if index == 0 => {} // header line
            None => {
                return Err(format!(
                    "{}:{}: expected `x,y`, got `{trimmed}`",
                    path.display(),
                    index + 1,
                ));
            }
        }
    }
    Ok(points)
}

/// Read and validate a contour file.
fn read_contour(path: &PathBuf) -> Result<Contour, String> {
    let points = read_points(path)?;
    Contour::new(points).map_err(|e| format!("{}: {e}", path.display()))
}

/// Write a serialized export, logging the outcome to stderr.
fn write_export(path: &PathBuf, contents: &str, what: &str) {
    match std::fs::write(path, contents) {
        Ok(()) => eprintln!(
            "{what} written to {} ({} bytes)",
            path.display(),
            contents.len(),
        ),
        Err(e) => eprintln!("Error writing {what} to {}: {e}", path.display()),
    }
}

fn run_solve(args: &SolveArgs) -> ExitCode {
    let config = match config_from_args(args) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let outer = match read_contour(&args.outer_path) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };
    let inner = match read_contour(&args.inner_path) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    eprintln!(
        "Contours: outer {} ({} vertices), inner {} ({} vertices)",
        args.outer_path.display(),
        outer.len(),
        args.inner_path.display(),
        inner.len(),
    );
    eprintln!("Config: {config:#?}");
    eprintln!("Runs: {}", args.runs);
    eprintln!();

    let mut all_diagnostics = Vec::with_capacity(args.runs);

    for run in 0..args.runs {
        if args.runs > 1 {
            eprintln!("--- Run {}/{} ---", run + 1, args.runs);
        }

        let staged = match lamella_solver::solve_staged(&outer, &inner, &config) {
            Ok(staged) => staged,
            Err(e) => {
                eprintln!("Solver error: {e}");
                return ExitCode::FAILURE;
            }
        };

        if !staged.relaxation.converged {
            eprintln!(
                "Warning: relaxation hit the iteration cap ({}) without converging \
                 (residual {:.3e}); the field may be inaccurate",
                config.max_iterations, staged.relaxation.max_change,
            );
        }

        if args.json {
            match serde_json::to_string_pretty(&staged.diagnostics) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("Error serializing diagnostics: {e}");
                    return ExitCode::FAILURE;
                }
            }
        } else {
            println!("{}", staged.diagnostics.report());
        }

        // Write exports on the first run only.
        if run == 0 {
            if let Some(ref path) = args.result_json {
                let result = lamella_solver::SolveResult {
                    field: staged.relaxation.field.clone(),
                    gradient: staged.gradient.clone(),
                    iterations: staged.relaxation.iterations,
                    max_change: staged.relaxation.max_change,
                    converged: staged.relaxation.converged,
                    levels: staged.levels.clone(),
                    thickness: staged.thickness.clone(),
                };
                match serde_json::to_string(&result) {
                    Ok(json) => write_export(path, &json, "Result JSON"),
                    Err(e) => eprintln!("Error serializing result: {e}"),
                }
            }
            if let Some(ref path) = args.thickness_csv {
                let csv = lamella_export::to_thickness_csv(&staged.thickness);
                write_export(path, &csv, "Thickness CSV");
            }
            if let Some(ref path) = args.field_csv {
                let csv = lamella_export::to_field_csv(&staged.relaxation.field);
                write_export(path, &csv, "Field CSV");
            }
            if let Some(ref path) = args.levels_csv {
                let csv = lamella_export::to_levels_csv(&staged.levels);
                write_export(path, &csv, "Levels CSV");
            }
        }

        all_diagnostics.push(staged.diagnostics);

        if args.runs > 1 {
            eprintln!();
        }
    }

    if args.runs > 1 {
        print_multi_run_summary(&all_diagnostics);
    }

    ExitCode::SUCCESS
}

fn run_fractal(args: &FractalArgs) -> ExitCode {
    let points = match read_points(&args.points_path) {
        Ok(p) => p,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };
    eprintln!(
        "Points: {} ({} points), scales: {:?}",
        args.points_path.display(),
        points.len(),
        args.epsilons,
    );

    let fit = match lamella_solver::fractal_dimension(&points, &args.epsilons) {
        Ok(fit) => fit,
        Err(e) => {
            eprintln!("Box counting error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if args.json {
        match serde_json::to_string_pretty(&fit) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing fit: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        println!(
            "Fractal dimension: {:.4} (intercept {:.4}, {} scales)",
            fit.dimension,
            fit.intercept,
            fit.samples.len(),
        );
        for sample in &fit.samples {
            println!(
                "  log(1/eps) = {:>8.4}   log N = {:>8.4}",
                sample.log_inv_epsilon, sample.log_count,
            );
        }
    }

    if let Some(ref path) = args.csv {
        let csv = lamella_export::to_boxcount_csv(&fit);
        write_export(path, &csv, "Box-count CSV");
    }

    ExitCode::SUCCESS
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli.command {
        Command::Solve(args) => run_solve(&args),
        Command::Fractal(args) => run_fractal(&args),
    }
}

/// Print aggregated duration statistics across multiple runs.
#[allow(clippy::cast_precision_loss)]
fn print_multi_run_summary(all_diagnostics: &[SolveDiagnostics]) {
    debug_assert!(!all_diagnostics.is_empty(), "no diagnostics to summarize");

    println!();
    println!(
        "Summary ({} runs)\n{}",
        all_diagnostics.len(),
        "=".repeat(60),
    );

    let durations: Vec<f64> = all_diagnostics
        .iter()
        .map(|d| d.total_duration.as_secs_f64() * 1000.0)
        .collect();

    let min = durations.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = durations.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let mean = durations.iter().sum::<f64>() / durations.len().max(1) as f64;

    println!("Total duration: min={min:.3}ms  mean={mean:.3}ms  max={max:.3}ms");

    println!();
    println!("{:<16} {:>12}", "Stage", "Mean (ms)");
    println!("{}", "-".repeat(32));

    type StageExtractor = fn(&SolveDiagnostics) -> std::time::Duration;
    let stage_extractors: &[(&str, StageExtractor)] = &[
        ("Normalize", |d| d.normalize.duration),
        ("Rasterize", |d| d.rasterize.duration),
        ("Initialize", |d| d.initialize.duration),
        ("Relax", |d| d.relax.duration),
        ("Gradient", |d| d.gradient.duration),
        ("Contours", |d| d.contours.duration),
        ("Thickness", |d| d.thickness.duration),
    ];

    for (name, extractor) in stage_extractors {
        let stage_mean = all_diagnostics
            .iter()
            .map(|d| extractor(d).as_secs_f64() * 1000.0)
            .sum::<f64>()
            / all_diagnostics.len().max(1) as f64;
        println!("{name:<16} {stage_mean:>10.3}ms");
    }
}
