//! Shared types for the lamella solver pipeline.

use serde::{Deserialize, Serialize};

/// Re-export `GrayImage` so downstream crates can reference raster
/// masks and the region label grid without depending on `image`
/// directly.
pub use image::GrayImage;

/// A 2D point in grid coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (columns from the left edge).
    pub x: f64,
    /// Vertical position (rows from the top edge).
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
}

/// A point in integer raster coordinates, produced by geometry
/// normalization and consumed by the rasterizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RasterPoint {
    /// Column index.
    pub x: i32,
    /// Row index.
    pub y: i32,
}

impl RasterPoint {
    /// Create a new raster point.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A sequence of connected points forming one path (typically one
/// connected component of an equipotential level set).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline(Vec<Point>);

impl Polyline {
    /// Create a new polyline from a vector of points.
    #[must_use]
    pub const fn new(points: Vec<Point>) -> Self {
        Self(points)
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

    /// Consumes the polyline and returns the underlying vector of points.
    #[must_use]
    pub fn into_points(self) -> Vec<Point> {
        self.0
    }
}

/// An ordered, implicitly closed polygonal contour.
///
/// The closing edge from the last vertex back to the first is implied
/// and must not be stored explicitly. At least 3 vertices are required;
/// self-intersection is not validated (rasterization is best-effort for
/// degenerate input, see [`crate::raster`]).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contour(Vec<Point>);

impl Contour {
    /// Create a contour from a vertex list.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::InvalidContour`] if fewer than 3 vertices
    /// are given.
    pub fn new(points: Vec<Point>) -> Result<Self, SolverError> {
        if points.len() < 3 {
            return Err(SolverError::InvalidContour(points.len()));
        }
        Ok(Self(points))
    }

    /// Returns a slice of all vertices.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    /// Returns the number of vertices.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`: an empty contour cannot be constructed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }
}

impl<'de> Deserialize<'de> for Contour {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let points = Vec::<Point>::deserialize(deserializer)?;
        Self::new(points).map_err(serde::de::Error::custom)
    }
}

/// A square grid of `f64` values in row-major order.
///
/// The backing vector length is always `size * size`; the invariant is
/// checked at construction and on deserialization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScalarField {
    size: usize,
    data: Vec<f64>,
}

impl ScalarField {
    /// Create a field of the given side length, filled with `value`.
    #[must_use]
    pub fn filled(size: usize, value: f64) -> Self {
        Self {
            size,
            data: vec![value; size * size],
        }
    }

    /// Side length of the square grid.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Value at `(row, col)`.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.size + col]
    }

    /// Set the value at `(row, col)`.
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.size + col] = value;
    }

    /// The backing row-major slice.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Minimum and maximum value over the whole field, or `None` for a
    /// zero-sized grid.
    #[must_use]
    pub fn min_max(&self) -> Option<(f64, f64)> {
        let first = *self.data.first()?;
        let (mut lo, mut hi) = (first, first);
        for &v in &self.data {
            if v < lo {
                lo = v;
            }
            if v > hi {
                hi = v;
            }
        }
        Some((lo, hi))
    }
}

/// Serde proxy for [`ScalarField`]: re-validates the length invariant
/// on deserialization.
#[derive(Deserialize)]
struct ScalarFieldProxy {
    size: usize,
    data: Vec<f64>,
}

impl<'de> Deserialize<'de> for ScalarField {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let proxy = ScalarFieldProxy::deserialize(deserializer)?;
        if proxy.data.len() != proxy.size * proxy.size {
            return Err(serde::de::Error::custom(
                "scalar field data length does not match size * size",
            ));
        }
        Ok(Self {
            size: proxy.size,
            data: proxy.data,
        })
    }
}

/// Boolean grid marking cells whose potential is fixed (Dirichlet
/// cells). Computed once from the region label grid and immutable
/// thereafter; the complement is the set of free cells the relaxer
/// updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryMask {
    size: usize,
    fixed: Vec<bool>,
}

impl BoundaryMask {
    /// Build a mask from a row-major boolean vector.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::InvalidConfig`] if the vector length is
    /// not `size * size`.
    pub fn new(size: usize, fixed: Vec<bool>) -> Result<Self, SolverError> {
        if fixed.len() != size * size {
            return Err(SolverError::InvalidConfig(format!(
                "boundary mask length {} does not match grid {size}x{size}",
                fixed.len(),
            )));
        }
        Ok(Self { size, fixed })
    }

    /// Side length of the square grid.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Whether the cell at `(row, col)` holds a fixed potential.
    #[must_use]
    pub fn is_fixed(&self, row: usize, col: usize) -> bool {
        self.fixed[row * self.size + col]
    }

    /// Number of free (non-fixed) cells.
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.fixed.iter().filter(|&&f| !f).count()
    }
}

/// Configuration for the solver pipeline.
///
/// All parameters have defaults matching the reference setup: a
/// [-1, 1] potential range with a neutral initial guess, a relative
/// tolerance of 1e-4 and a hard iteration cap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Side length L of the raster grid (grid is L×L).
    pub grid_size: u32,

    /// Potential fixed on INTERIOR cells.
    pub high_pot: f64,

    /// Potential fixed on EXTERIOR cells.
    pub low_pot: f64,

    /// Initial value of free (ANNULUS) cells. Typically the midpoint
    /// of the potential range.
    pub init_guess: f64,

    /// Relative convergence tolerance: iteration stops when
    /// `max_abs_change / (high_pot - low_pot)` drops below this value.
    pub tolerance: f64,

    /// Hard iteration cap. Reaching the cap is reported, not raised.
    pub max_iterations: u32,

    /// Equipotential levels for contour extraction and thickness
    /// sampling, in non-decreasing order.
    pub levels: Vec<f64>,
}

impl SolverConfig {
    /// Default raster side length.
    pub const DEFAULT_GRID_SIZE: u32 = 512;
    /// Default INTERIOR potential.
    pub const DEFAULT_HIGH_POT: f64 = 1.0;
    /// Default EXTERIOR potential.
    pub const DEFAULT_LOW_POT: f64 = -1.0;
    /// Default initial guess for free cells.
    pub const DEFAULT_INIT_GUESS: f64 = 0.0;
    /// Default relative convergence tolerance.
    pub const DEFAULT_TOLERANCE: f64 = 1e-4;
    /// Default iteration cap.
    pub const DEFAULT_MAX_ITERATIONS: u32 = 1_000_000;

    /// Default equipotential levels for the [-1, 1] potential range.
    ///
    /// The boundary potentials themselves are omitted: a level equal to
    /// a fixed boundary value produces no grid-edge crossing under the
    /// marching-squares corner rule and would always be soft-skipped.
    #[must_use]
    pub fn default_levels() -> Vec<f64> {
        vec![-0.9, -0.5, 0.0, 0.5, 0.9]
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::InvalidConfig`] naming the first violated
    /// constraint: grid at least 4 cells wide, `high_pot > low_pot`,
    /// initial guess inside the potential range, finite positive
    /// tolerance, nonzero iteration cap, finite non-decreasing levels.
    pub fn validate(&self) -> Result<(), SolverError> {
        if self.grid_size < 4 {
            return Err(SolverError::InvalidConfig(format!(
                "grid_size must be at least 4, got {}",
                self.grid_size,
            )));
        }
        if !(self.high_pot.is_finite() && self.low_pot.is_finite()) {
            return Err(SolverError::InvalidConfig(
                "boundary potentials must be finite".to_owned(),
            ));
        }
        if self.high_pot <= self.low_pot {
            return Err(SolverError::InvalidConfig(format!(
                "high_pot ({}) must exceed low_pot ({})",
                self.high_pot, self.low_pot,
            )));
        }
        if !(self.low_pot..=self.high_pot).contains(&self.init_guess) {
            return Err(SolverError::InvalidConfig(format!(
                "init_guess ({}) must lie within [low_pot, high_pot]",
                self.init_guess,
            )));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(SolverError::InvalidConfig(format!(
                "tolerance must be finite and positive, got {}",
                self.tolerance,
            )));
        }
        if self.max_iterations == 0 {
            return Err(SolverError::InvalidConfig(
                "max_iterations must be at least 1".to_owned(),
            ));
        }
        if self.levels.iter().any(|l| !l.is_finite()) {
            return Err(SolverError::InvalidConfig(
                "equipotential levels must be finite".to_owned(),
            ));
        }
        if self.levels.windows(2).any(|w| w[1] < w[0]) {
            return Err(SolverError::InvalidConfig(
                "equipotential levels must be in non-decreasing order".to_owned(),
            ));
        }
        Ok(())
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            grid_size: Self::DEFAULT_GRID_SIZE,
            high_pot: Self::DEFAULT_HIGH_POT,
            low_pot: Self::DEFAULT_LOW_POT,
            init_guess: Self::DEFAULT_INIT_GUESS,
            tolerance: Self::DEFAULT_TOLERANCE,
            max_iterations: Self::DEFAULT_MAX_ITERATIONS,
            levels: Self::default_levels(),
        }
    }
}

/// Errors that can abort a solver run.
///
/// Soft conditions are deliberately *not* represented here: an empty
/// level set shrinks the thickness sample set, and a relaxation that
/// hits the iteration cap is reported through
/// [`Relaxation::converged`](crate::relax::Relaxation) — both let the
/// pipeline complete with a partial or flagged result.
#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    /// The outer contour's bounding box has zero width or height, so no
    /// scale factor exists. Fatal: no sensible raster can be produced.
    #[error("degenerate geometry: outer contour bounding box is {width} x {height}")]
    DegenerateGeometry {
        /// Bounding-box width of the offending contour.
        width: f64,
        /// Bounding-box height of the offending contour.
        height: f64,
    },

    /// A polygonal contour had fewer than 3 vertices.
    #[error("contour requires at least 3 vertices, got {0}")]
    InvalidContour(usize),

    /// Solver configuration is invalid.
    #[error("invalid solver configuration: {0}")]
    InvalidConfig(String),
}
