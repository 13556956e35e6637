//! Solver diagnostics: timing, counts, and convergence metrics for
//! each stage of a run.
//!
//! These diagnostics are permanent instrumentation intended for grid
//! sizing and tolerance experimentation. Every call to
//! [`solve_staged`](crate::solve_staged) collects diagnostics
//! alongside the solver results.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics collected from a single solver run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveDiagnostics {
    /// Stage 0: contour normalization onto the grid.
    pub normalize: StageDiagnostics,
    /// Stage 1: polygon rasterization into filled masks.
    pub rasterize: StageDiagnostics,
    /// Stage 2: region labelling and boundary-condition setup.
    pub initialize: StageDiagnostics,
    /// Stage 3: Jacobi relaxation.
    pub relax: StageDiagnostics,
    /// Stage 4: gradient of the relaxed field.
    pub gradient: StageDiagnostics,
    /// Stage 5: equipotential extraction.
    pub contours: StageDiagnostics,
    /// Stage 6: thickness sampling.
    pub thickness: StageDiagnostics,
    /// Total wall-clock duration of the entire run (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all stages.
    pub summary: SolveSummary,
}

/// Diagnostics for a single solver stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics (counts, residuals, etc.).
    pub metrics: StageMetrics,
}

/// Stage-specific metrics that vary by solver stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Contour normalization metrics.
    Normalize {
        /// Grid side length in cells.
        grid_size: u32,
        /// Uniform scale factor applied to both contours.
        scale: f64,
        /// Vertex count of the outer contour.
        outer_vertex_count: usize,
        /// Vertex count of the inner contour.
        inner_vertex_count: usize,
    },
    /// Polygon rasterization metrics.
    Rasterize {
        /// Filled pixel count of the outer mask.
        outer_filled: u64,
        /// Filled pixel count of the inner mask.
        inner_filled: u64,
    },
    /// Region labelling metrics.
    Initialize {
        /// Number of free (relaxing) cells.
        free_cell_count: usize,
        /// Number of fixed (Dirichlet) cells.
        fixed_cell_count: usize,
        /// Annulus area in cells from the label grid.
        annulus_area: f64,
    },
    /// Relaxation metrics.
    Relax {
        /// Iterations performed.
        iterations: u32,
        /// Final `max(|new - old|)` over the field.
        max_change: f64,
        /// Whether the tolerance criterion was met before the cap.
        converged: bool,
        /// Configured iteration cap.
        max_iterations: u32,
    },
    /// Gradient metrics.
    Gradient {
        /// Grid side length in cells.
        grid_size: u32,
    },
    /// Equipotential extraction metrics.
    Contours {
        /// Number of requested levels.
        level_count: usize,
        /// Levels that produced at least one component.
        nonempty_level_count: usize,
        /// Total points across all extracted components.
        total_point_count: usize,
    },
    /// Thickness sampling metrics.
    Thickness {
        /// Number of accumulated samples.
        sample_count: usize,
        /// Mean of the profile, when any samples exist.
        mean: Option<f64>,
    },
}

/// High-level summary counts for the entire run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveSummary {
    /// Grid side length in cells.
    pub grid_size: u32,
    /// Iterations performed by the relaxation.
    pub iterations: u32,
    /// Whether the relaxation converged before the cap.
    pub converged: bool,
    /// Number of requested equipotential levels.
    pub level_count: usize,
    /// Number of thickness samples.
    pub sample_count: usize,
}

impl SolveDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Solver Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Grid: {size}x{size} cells",
            size = self.summary.grid_size,
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
        let stages: [(&str, &StageDiagnostics); 7] = [
            ("Normalize", &self.normalize),
            ("Rasterize", &self.rasterize),
            ("Initialize", &self.initialize),
            ("Relax", &self.relax),
            ("Gradient", &self.gradient),
            ("Contours", &self.contours),
            ("Thickness", &self.thickness),
        ];

        for (name, diag) in &stages {
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
            "Iterations: {}  |  Converged: {}  |  Thickness samples: {}",
            self.summary.iterations, self.summary.converged, self.summary.sample_count,
        ));

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Normalize {
            grid_size,
            scale,
            outer_vertex_count,
            inner_vertex_count,
        } => {
            format!(
                "L={grid_size} scale={scale:.4} outer={outer_vertex_count}v inner={inner_vertex_count}v",
            )
        }
        StageMetrics::Rasterize {
            outer_filled,
            inner_filled,
        } => format!("outer={outer_filled}px inner={inner_filled}px"),
        StageMetrics::Initialize {
            free_cell_count,
            fixed_cell_count,
            annulus_area,
        } => {
            format!("free={free_cell_count} fixed={fixed_cell_count} annulus={annulus_area:.0}px",)
        }
        StageMetrics::Relax {
            iterations,
            max_change,
            converged,
            max_iterations,
        } => {
            format!(
                "{iterations}/{max_iterations} iters, residual={max_change:.2e}, converged={converged}",
            )
        }
        StageMetrics::Gradient { grid_size } => format!("L={grid_size}"),
        StageMetrics::Contours {
            level_count,
            nonempty_level_count,
            total_point_count,
        } => {
            format!("{nonempty_level_count}/{level_count} levels, {total_point_count} pts",)
        }
        StageMetrics::Thickness { sample_count, mean } => mean.map_or_else(
            || format!("{sample_count} samples"),
            |m| format!("{sample_count} samples, mean={m:.2}"),
        ),
    }
}

/// Count filled pixels (value == 255) in a grayscale mask.
pub(crate) fn count_filled_pixels(image: &image::GrayImage) -> u64 {
    image
        .pixels()
        .map(|p| u64::from(u8::from(p.0[0] == 255)))
        .sum()
}

/// Total points across the components of a set of level sets.
pub(crate) fn total_contour_points(level_sets: &[crate::contour::LevelSet]) -> usize {
    level_sets
        .iter()
        .flat_map(|set| set.contours.iter())
        .map(crate::types::Polyline::len)
        .sum()
}
