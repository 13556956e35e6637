//! lamella-solver: Pure elliptic-field solver for annular domains
//! (sans-IO).
//!
//! Computes the potential field between two nested polygonal contours
//! through: normalize -> rasterize -> label -> relax -> gradient ->
//! equipotentials -> thickness statistics.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! geometry and returns structured data. File and terminal interaction
//! lives in `lamella-cli`.

pub mod contour;
pub mod diagnostics;
pub mod field;
pub mod fractal;
pub mod gradient;
pub mod normalize;
pub mod raster;
pub mod relax;
pub mod thickness;
pub mod types;

use std::time::Instant;

use serde::{Deserialize, Serialize};

pub use contour::{LevelSet, extract_level, extract_levels};
pub use diagnostics::{SolveDiagnostics, SolveSummary, StageDiagnostics, StageMetrics};
pub use field::{ANNULUS, AnnulusEstimate, Domain, EXTERIOR, INTERIOR, annulus_estimate};
pub use fractal::{BoxCountSample, FractalFit, fractal_dimension, occupied_boxes};
pub use gradient::{GradientField, gradient};
pub use normalize::{NormalizedPair, normalize_pair};
pub use relax::{Relaxation, relax};
pub use thickness::{ThicknessReport, thickness_profile};
pub use types::{
    BoundaryMask, Contour, Point, Polyline, RasterPoint, ScalarField, SolverConfig, SolverError,
};

/// The data a solver run produces for downstream consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveResult {
    /// The relaxed potential field.
    pub field: ScalarField,
    /// Gradient of the relaxed field.
    pub gradient: GradientField,
    /// Relaxation iterations actually performed.
    pub iterations: u32,
    /// Final `max(|new - old|)` of the relaxation.
    pub max_change: f64,
    /// Whether the relaxation met the tolerance before the cap.
    pub converged: bool,
    /// Equipotential level sets, one per requested level.
    pub levels: Vec<LevelSet>,
    /// Thickness statistics across the requested levels.
    pub thickness: ThicknessReport,
}

/// Every intermediate of a solver run, plus diagnostics.
///
/// Produced by [`solve_staged`] for visualization, export, and
/// parameter tuning. Callers that only need the final field and
/// statistics should prefer [`solve`], which discards the raster
/// intermediates.
#[derive(Debug, Clone)]
pub struct StagedResult {
    /// Stage 0: scaled, centered, rounded contour vertices.
    pub normalized: NormalizedPair,
    /// Stage 1: filled outer mask.
    pub mask_outer: image::GrayImage,
    /// Stage 1: filled inner mask.
    pub mask_inner: image::GrayImage,
    /// Stage 2: label grid, initial field, and boundary mask.
    pub domain: Domain,
    /// Stage 3: relaxation outcome.
    pub relaxation: Relaxation,
    /// Stage 4: gradient of the relaxed field.
    pub gradient: GradientField,
    /// Stage 5: equipotential level sets.
    pub levels: Vec<LevelSet>,
    /// Stage 6: thickness statistics.
    pub thickness: ThicknessReport,
    /// Per-stage timing and metrics.
    pub diagnostics: SolveDiagnostics,
}

/// Run the full solver.
///
/// Takes the outer and inner boundary contours and a configuration,
/// then produces a [`SolveResult`] with the relaxed field, its
/// gradient, the requested equipotentials, and thickness statistics.
///
/// # Solver steps
///
/// 1. Normalize both contours onto the grid (uniform scale, shared
///    centering on the outer contour's centroid)
/// 2. Rasterize each contour into a filled polygon mask
/// 3. Label the grid into exterior / annulus / interior and impose
///    boundary potentials
/// 4. Jacobi relaxation to the discrete Laplace solution
/// 5. Gradient of the relaxed field
/// 6. Marching-squares equipotential extraction
/// 7. Nearest-point thickness sampling between adjacent levels
///
/// # Errors
///
/// Returns [`SolverError::InvalidConfig`] for a rejected configuration
/// and [`SolverError::DegenerateGeometry`] when the outer contour has
/// no usable extent.
pub fn solve(
    outer: &Contour,
    inner: &Contour,
    config: &SolverConfig,
) -> Result<SolveResult, SolverError> {
    config.validate()?;

    // 1. Normalize both contours onto the grid.
    let normalized = normalize::normalize_pair(outer, inner, config.grid_size)?;

    // 2. Rasterize into filled masks.
    let (mask_outer, mask_inner) = raster::fill_masks(&normalized, config.grid_size);

    // 3. Label regions and impose boundary potentials.
    let domain = field::initialize(&mask_outer, &mask_inner, config)?;

    // 4. Jacobi relaxation.
    let relaxation = relax::relax(&domain.potential, &domain.boundary, config)?;

    // 5. Gradient of the relaxed field.
    let grad = gradient::gradient(&relaxation.field);

    // 6. Equipotential extraction.
    let levels = contour::extract_levels(&relaxation.field, &config.levels);

    // 7. Thickness statistics.
    let samples = thickness::thickness_profile(&levels);
    let thickness = ThicknessReport {
        mean: thickness::mean(&samples),
        samples,
        estimate: field::annulus_estimate(&domain.region),
    };

    Ok(SolveResult {
        field: relaxation.field,
        gradient: grad,
        iterations: relaxation.iterations,
        max_change: relaxation.max_change,
        converged: relaxation.converged,
        levels,
        thickness,
    })
}

/// Run the full solver, retaining every intermediate and collecting
/// per-stage diagnostics.
///
/// # Errors
///
/// Same failure modes as [`solve`].
pub fn solve_staged(
    outer: &Contour,
    inner: &Contour,
    config: &SolverConfig,
) -> Result<StagedResult, SolverError> {
    config.validate()?;
    let run_start = Instant::now();

    let stage_start = Instant::now();
    let normalized = normalize::normalize_pair(outer, inner, config.grid_size)?;
    let normalize_diag = StageDiagnostics {
        duration: stage_start.elapsed(),
        metrics: StageMetrics::Normalize {
            grid_size: config.grid_size,
            scale: normalized.scale,
            outer_vertex_count: normalized.outer.len(),
            inner_vertex_count: normalized.inner.len(),
        },
    };

    let stage_start = Instant::now();
    let (mask_outer, mask_inner) = raster::fill_masks(&normalized, config.grid_size);
    let rasterize_diag = StageDiagnostics {
        duration: stage_start.elapsed(),
        metrics: StageMetrics::Rasterize {
            outer_filled: diagnostics::count_filled_pixels(&mask_outer),
            inner_filled: diagnostics::count_filled_pixels(&mask_inner),
        },
    };

    let stage_start = Instant::now();
    let domain = field::initialize(&mask_outer, &mask_inner, config)?;
    let estimate = field::annulus_estimate(&domain.region);
    let cell_count = domain.potential.size() * domain.potential.size();
    let free_cell_count = domain.boundary.free_count();
    let initialize_diag = StageDiagnostics {
        duration: stage_start.elapsed(),
        metrics: StageMetrics::Initialize {
            free_cell_count,
            fixed_cell_count: cell_count - free_cell_count,
            annulus_area: estimate.area,
        },
    };

    let stage_start = Instant::now();
    let relaxation = relax::relax(&domain.potential, &domain.boundary, config)?;
    let relax_diag = StageDiagnostics {
        duration: stage_start.elapsed(),
        metrics: StageMetrics::Relax {
            iterations: relaxation.iterations,
            max_change: relaxation.max_change,
            converged: relaxation.converged,
            max_iterations: config.max_iterations,
        },
    };

    let stage_start = Instant::now();
    let grad = gradient::gradient(&relaxation.field);
    let gradient_diag = StageDiagnostics {
        duration: stage_start.elapsed(),
        metrics: StageMetrics::Gradient {
            grid_size: config.grid_size,
        },
    };

    let stage_start = Instant::now();
    let levels = contour::extract_levels(&relaxation.field, &config.levels);
    let contours_diag = StageDiagnostics {
        duration: stage_start.elapsed(),
        metrics: StageMetrics::Contours {
            level_count: levels.len(),
            nonempty_level_count: levels.iter().filter(|s| !s.contours.is_empty()).count(),
            total_point_count: diagnostics::total_contour_points(&levels),
        },
    };

    let stage_start = Instant::now();
    let samples = thickness::thickness_profile(&levels);
    let thickness = ThicknessReport {
        mean: thickness::mean(&samples),
        samples,
        estimate,
    };
    let thickness_diag = StageDiagnostics {
        duration: stage_start.elapsed(),
        metrics: StageMetrics::Thickness {
            sample_count: thickness.samples.len(),
            mean: thickness.mean,
        },
    };

    let diagnostics = SolveDiagnostics {
        summary: SolveSummary {
            grid_size: config.grid_size,
            iterations: relaxation.iterations,
            converged: relaxation.converged,
            level_count: levels.len(),
            sample_count: thickness.samples.len(),
        },
        normalize: normalize_diag,
        rasterize: rasterize_diag,
        initialize: initialize_diag,
        relax: relax_diag,
        gradient: gradient_diag,
        contours: contours_diag,
        thickness: thickness_diag,
        total_duration: run_start.elapsed(),
    };

    Ok(StagedResult {
        normalized,
        mask_outer,
        mask_inner,
        domain,
        relaxation,
        gradient: grad,
        levels,
        thickness,
        diagnostics,
    })
}
