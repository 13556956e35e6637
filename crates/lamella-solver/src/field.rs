//! Field initialization: combine the two occupancy masks into a
//! three-region label grid, the initial potential field, and the
//! Dirichlet boundary mask.
//!
//! Label priority is fixed: cells inside the inner mask are INTERIOR,
//! cells inside the outer mask but outside the inner mask are ANNULUS,
//! everything else is EXTERIOR. INTERIOR wins even where the inner mask
//! leaks outside the outer mask — this precedence is the defined
//! behavior, not a containment check.
//!
//! This module also computes the closed-form thickness estimate
//! `area / perimeter` directly from the label grid (annulus cell count
//! over the outer border length), independent of the PDE solution.

use image::{GrayImage, Luma};
use imageproc::contours::{BorderType, find_contours};

use crate::raster::FILLED;
use crate::types::{BoundaryMask, ScalarField, SolverConfig, SolverError};

/// Label for cells outside the outer boundary (fixed at `low_pot`).
pub const EXTERIOR: u8 = 0;
/// Label for free cells between the two boundaries.
pub const ANNULUS: u8 = 50;
/// Label for cells inside the inner boundary (fixed at `high_pot`).
pub const INTERIOR: u8 = 100;

/// The initialized solver domain: label grid, initial potential and
/// the immutable Dirichlet mask.
#[derive(Debug, Clone)]
pub struct Domain {
    /// Three-region label grid (EXTERIOR / ANNULUS / INTERIOR).
    pub region: GrayImage,
    /// Initial potential field: boundary values on fixed cells, the
    /// configured guess on free cells.
    pub potential: ScalarField,
    /// True exactly where the region label is not ANNULUS.
    pub boundary: BoundaryMask,
}

/// The closed-form annulus thickness estimate.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AnnulusEstimate {
    /// Number of ANNULUS cells.
    pub area: f64,
    /// Closed length of the first outer border of the filled region,
    /// or `None` when the raster contains no filled cells.
    pub perimeter: Option<f64>,
    /// `area / perimeter`, or `None` when no positive perimeter exists.
    pub thickness: Option<f64>,
}

/// Build the solver domain from the two binary masks.
///
/// # Errors
///
/// Returns [`SolverError::InvalidConfig`] if the two masks disagree in
/// size (cannot happen when both come from [`crate::raster::fill_masks`]).
pub fn initialize(
    mask_outer: &GrayImage,
    mask_inner: &GrayImage,
    config: &SolverConfig,
) -> Result<Domain, SolverError> {
    if mask_outer.dimensions() != mask_inner.dimensions() {
        return Err(SolverError::InvalidConfig(format!(
            "mask dimensions disagree: {:?} vs {:?}",
            mask_outer.dimensions(),
            mask_inner.dimensions(),
        )));
    }

    let (width, height) = mask_outer.dimensions();
    if width != height {
        return Err(SolverError::InvalidConfig(format!(
            "masks must be square, got {width}x{height}",
        )));
    }
    let size = width as usize;
    let mut region = GrayImage::new(width, height);
    let mut potential = ScalarField::filled(size, config.init_guess);
    let mut fixed = vec![false; size * size];

    for row in 0..height {
        for col in 0..width {
            let inner = mask_inner.get_pixel(col, row)[0] == FILLED;
            let outer = mask_outer.get_pixel(col, row)[0] == FILLED;

            let label = if inner {
                INTERIOR
            } else if outer {
                ANNULUS
            } else {
                EXTERIOR
            };
            region.put_pixel(col, row, Luma([label]));

            let (r, c) = (row as usize, col as usize);
            match label {
                INTERIOR => {
                    potential.set(r, c, config.high_pot);
                    fixed[r * size + c] = true;
                }
                EXTERIOR => {
                    potential.set(r, c, config.low_pot);
                    fixed[r * size + c] = true;
                }
                _ => {} // ANNULUS keeps the initial guess and stays free.
            }
        }
    }

    let boundary = BoundaryMask::new(size, fixed)?;
    Ok(Domain {
        region,
        potential,
        boundary,
    })
}

/// Compute the `area / perimeter` thickness estimate from the label
/// grid.
///
/// The perimeter is the closed length of the first outer border found
/// around the filled region (ANNULUS ∪ INTERIOR), traced with the
/// Suzuki-Abe border follower. An empty raster yields `perimeter:
/// None` and `thickness: None` rather than an error.
#[must_use]
pub fn annulus_estimate(region: &GrayImage) -> AnnulusEstimate {
    let area = region.pixels().filter(|p| p[0] == ANNULUS).count();
    #[allow(clippy::cast_precision_loss)]
    let area = area as f64;

    let binary = GrayImage::from_fn(region.width(), region.height(), |x, y| {
        if region.get_pixel(x, y)[0] == EXTERIOR {
            Luma([0])
        } else {
            Luma([255])
        }
    });

    let contours = find_contours::<u32>(&binary);
    let perimeter = contours
        .iter()
        .find(|c| c.border_type == BorderType::Outer)
        .map(|c| closed_length(&c.points))
        .filter(|&len| len > 0.0);

    AnnulusEstimate {
        area,
        perimeter,
        thickness: perimeter.map(|p| area / p),
    }
}

/// Total length of a closed polygonal border, including the edge from
/// the last point back to the first.
fn closed_length(points: &[imageproc::point::Point<u32>]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    let mut length = 0.0;
    for i in 0..points.len() {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        let dx = f64::from(a.x) - f64::from(b.x);
        let dy = f64::from(a.y) - f64::from(b.y);
        length += dx.hypot(dy);
    }
    length
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::raster::fill_mask;
    use crate::types::RasterPoint;

    fn square_mask(x0: i32, side: i32, grid: u32) -> GrayImage {
        let points = vec![
            RasterPoint::new(x0, x0),
            RasterPoint::new(x0 + side, x0),
            RasterPoint::new(x0 + side, x0 + side),
            RasterPoint::new(x0, x0 + side),
        ];
        fill_mask(&points, grid)
    }

    fn config() -> SolverConfig {
        SolverConfig {
            grid_size: 16,
            high_pot: 100.0,
            low_pot: 0.0,
            init_guess: 50.0,
            ..SolverConfig::default()
        }
    }

    #[test]
    fn labels_are_exclusive_and_exhaustive() {
        let outer = square_mask(2, 11, 16);
        let inner = square_mask(6, 4, 16);
        let domain = initialize(&outer, &inner, &config()).unwrap();

        for p in domain.region.pixels() {
            assert!(matches!(p[0], EXTERIOR | ANNULUS | INTERIOR));
        }
        // All three regions are present.
        assert!(domain.region.pixels().any(|p| p[0] == EXTERIOR));
        assert!(domain.region.pixels().any(|p| p[0] == ANNULUS));
        assert!(domain.region.pixels().any(|p| p[0] == INTERIOR));
    }

    #[test]
    fn potential_matches_labels() {
        let outer = square_mask(2, 11, 16);
        let inner = square_mask(6, 4, 16);
        let domain = initialize(&outer, &inner, &config()).unwrap();

        for row in 0..16u32 {
            for col in 0..16u32 {
                let label = domain.region.get_pixel(col, row)[0];
                let value = domain.potential.get(row as usize, col as usize);
                match label {
                    INTERIOR => assert!((value - 100.0).abs() < f64::EPSILON),
                    EXTERIOR => assert!(value.abs() < f64::EPSILON),
                    _ => assert!((value - 50.0).abs() < f64::EPSILON),
                }
            }
        }
    }

    #[test]
    fn boundary_mask_is_complement_of_annulus() {
        let outer = square_mask(2, 11, 16);
        let inner = square_mask(6, 4, 16);
        let domain = initialize(&outer, &inner, &config()).unwrap();

        for row in 0..16u32 {
            for col in 0..16u32 {
                let label = domain.region.get_pixel(col, row)[0];
                assert_eq!(
                    domain.boundary.is_fixed(row as usize, col as usize),
                    label != ANNULUS,
                );
            }
        }
    }

    #[test]
    fn interior_wins_outside_outer() {
        // Inner mask leaking outside the outer mask: INTERIOR takes
        // priority per the defined precedence.
        let outer = square_mask(2, 6, 16);
        let inner = square_mask(6, 8, 16); // extends past outer
        let domain = initialize(&outer, &inner, &config()).unwrap();
        // Cell (12, 12) is inside inner only.
        assert_eq!(domain.region.get_pixel(12, 12)[0], INTERIOR);
    }

    #[test]
    fn coincident_masks_leave_no_free_cells() {
        let outer = square_mask(3, 8, 16);
        let domain = initialize(&outer, &outer, &config()).unwrap();
        assert_eq!(domain.boundary.free_count(), 0);
    }

    #[test]
    fn estimate_on_square_annulus() {
        let outer = square_mask(2, 11, 16);
        let inner = square_mask(6, 4, 16);
        let domain = initialize(&outer, &inner, &config()).unwrap();
        let estimate = annulus_estimate(&domain.region);

        // 12x12 filled block minus 5x5 inner block.
        assert!((estimate.area - (144.0 - 25.0)).abs() < f64::EPSILON);
        let perimeter = estimate.perimeter.unwrap();
        // Border of a 12x12 block: close to 4 * 11.
        assert!((perimeter - 44.0).abs() <= 4.0, "perimeter = {perimeter}");
        assert!(estimate.thickness.unwrap() > 0.0);
    }

    #[test]
    fn estimate_on_empty_raster_is_none() {
        let empty = GrayImage::new(8, 8);
        let estimate = annulus_estimate(&empty);
        assert!(estimate.area.abs() < f64::EPSILON);
        assert!(estimate.perimeter.is_none());
        assert!(estimate.thickness.is_none());
    }
}
