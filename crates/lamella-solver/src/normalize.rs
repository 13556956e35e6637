//! Geometry normalization: map two contours into raster coordinates.
//!
//! Computes a single uniform scale factor from the outer contour's
//! bounding box so that the outer shape occupies 90% of the shorter
//! raster dimension while preserving aspect ratio, applies the same
//! factor to both contours (their relative proportions are preserved),
//! and translates both so the outer contour's vertex centroid maps to
//! the raster center.
//!
//! The centroid is the mean of the vertices, not the area centroid of
//! the polygon. For roughly uniformly sampled boundary traces the two
//! coincide closely, and the vertex mean is what the downstream
//! thickness statistic was calibrated against.

use geo::{BoundingRect, Centroid, MultiPoint};

use crate::types::{Contour, Point, RasterPoint, SolverError};

/// Fraction of the raster occupied by the outer contour's bounding box.
const FILL_FRACTION: f64 = 0.9;

/// Both contours mapped into integer raster coordinates, ready for
/// rasterization.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedPair {
    /// Outer boundary vertices in raster coordinates.
    pub outer: Vec<RasterPoint>,
    /// Inner boundary vertices in raster coordinates.
    pub inner: Vec<RasterPoint>,
    /// The shared uniform scale factor that was applied.
    pub scale: f64,
}

/// Normalize an outer/inner contour pair onto an L×L raster.
///
/// # Errors
///
/// Returns [`SolverError::DegenerateGeometry`] if the outer contour's
/// bounding box has zero (or non-finite) width or height — the scale
/// factor would divide by zero, and no sensible raster exists.
pub fn normalize_pair(
    outer: &Contour,
    inner: &Contour,
    grid_size: u32,
) -> Result<NormalizedPair, SolverError> {
    let scale = uniform_scale(outer, grid_size)?;

    let outer_scaled = scale_points(outer.points(), scale);
    let inner_scaled = scale_points(inner.points(), scale);

    // Translate both contours by the same offset: the scaled outer
    // centroid goes to the raster center.
    let centroid = vertex_centroid(&outer_scaled);
    let center = f64::from(grid_size / 2);
    let dx = center - centroid.x;
    let dy = center - centroid.y;

    Ok(NormalizedPair {
        outer: translate_and_round(&outer_scaled, dx, dy),
        inner: translate_and_round(&inner_scaled, dx, dy),
        scale,
    })
}

/// Compute the uniform scale factor from the outer contour's bounding
/// box: the smaller of the two per-axis factors that would make the
/// shape span [`FILL_FRACTION`] of the raster.
///
/// # Errors
///
/// Returns [`SolverError::DegenerateGeometry`] for a zero-extent or
/// non-finite bounding box.
pub fn uniform_scale(outer: &Contour, grid_size: u32) -> Result<f64, SolverError> {
    let multipoint: MultiPoint<f64> = outer
        .points()
        .iter()
        .map(|p| geo::Point::new(p.x, p.y))
        .collect();

    let Some(rect) = multipoint.bounding_rect() else {
        // Unreachable for a validated contour (>= 3 vertices), but the
        // geo API returns an Option for empty inputs.
        return Err(SolverError::DegenerateGeometry {
            width: 0.0,
            height: 0.0,
        });
    };

    let width = rect.width();
    let height = rect.height();
    if !(width > 0.0 && height > 0.0) || !width.is_finite() || !height.is_finite() {
        return Err(SolverError::DegenerateGeometry { width, height });
    }

    let target = f64::from(grid_size) * FILL_FRACTION;
    Ok((target / width).min(target / height))
}

/// Scale all points by a shared factor, preserving proportions.
fn scale_points(points: &[Point], factor: f64) -> Vec<Point> {
    points
        .iter()
        .map(|p| Point::new(p.x * factor, p.y * factor))
        .collect()
}

/// Mean of the vertices (the original's centroid definition).
fn vertex_centroid(points: &[Point]) -> Point {
    let multipoint: MultiPoint<f64> = points.iter().map(|p| geo::Point::new(p.x, p.y)).collect();
    multipoint.centroid().map_or(Point::new(0.0, 0.0), |c| {
        Point::new(c.x(), c.y())
    })
}

/// Apply a translation and round to integer raster coordinates.
#[allow(clippy::cast_possible_truncation)]
fn translate_and_round(points: &[Point], dx: f64, dy: f64) -> Vec<RasterPoint> {
    points
        .iter()
        .map(|p| RasterPoint::new((p.x + dx).round() as i32, (p.y + dy).round() as i32))
        .collect()
}
