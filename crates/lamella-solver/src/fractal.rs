//! Box-counting fractal dimension of a planar point set.
//!
//! For each scale ε, a grid of boxes of side ε is laid over the point
//! set's bounding box (with one extra box per axis so the far edge is
//! covered), each point marks its box as occupied (indices clamped to
//! the last box), and the non-empty boxes are counted. The dimension
//! is the slope of the least-squares line through
//! `(log(1/ε), log N(ε))`.
//!
//! The occupancy counting and regression here are a strict subset of
//! the field solver's complexity; the module shares its geometric
//! types and error vocabulary.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::types::{Point, SolverError};

/// One point of the log–log regression input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxCountSample {
    /// `log(1 / ε)` for this scale.
    pub log_inv_epsilon: f64,
    /// `log N(ε)`: log of the occupied-box count.
    pub log_count: f64,
}

/// Result of a box-counting fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FractalFit {
    /// Estimated fractal dimension (the fitted slope).
    pub dimension: f64,
    /// Intercept of the fitted line.
    pub intercept: f64,
    /// The regression input, for tabular export.
    pub samples: Vec<BoxCountSample>,
}

/// Count the boxes of side `epsilon` occupied by at least one point.
///
/// A zero-extent point set occupies exactly one box.
///
/// # Errors
///
/// Returns [`SolverError::DegenerateGeometry`] for an empty point set
/// and [`SolverError::InvalidConfig`] for a non-positive or non-finite
/// `epsilon`.
pub fn occupied_boxes(points: &[Point], epsilon: f64) -> Result<usize, SolverError> {
    if !(epsilon.is_finite() && epsilon > 0.0) {
        return Err(SolverError::InvalidConfig(format!(
            "box scale epsilon must be finite and positive, got {epsilon}",
        )));
    }
    let Some(first) = points.first() else {
        return Err(SolverError::DegenerateGeometry {
            width: 0.0,
            height: 0.0,
        });
    };

    let (mut min_x, mut max_x) = (first.x, first.x);
    let (mut min_y, mut max_y) = (first.y, first.y);
    for p in points {
        min_x = min_x.min(p.x);
        max_x = max_x.max(p.x);
        min_y = min_y.min(p.y);
        max_y = max_y.max(p.y);
    }

    // One extra box per axis so points on the far edge land inside.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let boxes_x = ((max_x - min_x) / epsilon) as usize + 1;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let boxes_y = ((max_y - min_y) / epsilon) as usize + 1;

    let mut occupied: HashSet<(usize, usize)> = HashSet::new();
    for p in points {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let ix = (((p.x - min_x) / epsilon) as usize).min(boxes_x - 1);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let iy = (((p.y - min_y) / epsilon) as usize).min(boxes_y - 1);
        occupied.insert((ix, iy));
    }
    Ok(occupied.len())
}

/// Estimate the fractal dimension over the given scales.
///
/// # Errors
///
/// Returns [`SolverError::DegenerateGeometry`] for an empty point set,
/// and [`SolverError::InvalidConfig`] when fewer than two scales are
/// given, any scale is invalid, or all scales are equal (the fit has
/// no spread in the independent variable).
pub fn fractal_dimension(points: &[Point], epsilons: &[f64]) -> Result<FractalFit, SolverError> {
    if epsilons.len() < 2 {
        return Err(SolverError::InvalidConfig(format!(
            "box counting needs at least 2 scales, got {}",
            epsilons.len(),
        )));
    }

    let mut samples = Vec::with_capacity(epsilons.len());
    for &epsilon in epsilons {
        let count = occupied_boxes(points, epsilon)?;
        #[allow(clippy::cast_precision_loss)]
        samples.push(BoxCountSample {
            log_inv_epsilon: (1.0 / epsilon).ln(),
            log_count: (count as f64).ln(),
        });
    }

    let (dimension, intercept) = fit_line(&samples)?;
    Ok(FractalFit {
        dimension,
        intercept,
        samples,
    })
}

/// Least-squares line through the regression samples.
fn fit_line(samples: &[BoxCountSample]) -> Result<(f64, f64), SolverError> {
    #[allow(clippy::cast_precision_loss)]
    let n = samples.len() as f64;
    let mean_x = samples.iter().map(|s| s.log_inv_epsilon).sum::<f64>() / n;
    let mean_y = samples.iter().map(|s| s.log_count).sum::<f64>() / n;

    let mut covariance = 0.0;
    let mut variance = 0.0;
    for s in samples {
        let dx = s.log_inv_epsilon - mean_x;
        covariance += dx * (s.log_count - mean_y);
        variance += dx * dx;
    }

    if variance <= 0.0 {
        return Err(SolverError::InvalidConfig(
            "box counting scales must not all be equal".to_owned(),
        ));
    }

    let slope = covariance / variance;
    Ok((slope, slope.mul_add(-mean_x, mean_y)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Dense grid of points filling the unit square.
    fn filled_square(per_side: usize) -> Vec<Point> {
        let mut points = Vec::new();
        for i in 0..per_side {
            for j in 0..per_side {
                points.push(Point::new(
                    i as f64 / (per_side - 1) as f64,
                    j as f64 / (per_side - 1) as f64,
                ));
            }
        }
        points
    }

    /// Points along the unit-square diagonal.
    fn diagonal(count: usize) -> Vec<Point> {
        (0..count)
            .map(|i| {
                let t = i as f64 / (count - 1) as f64;
                Point::new(t, t)
            })
            .collect()
    }

    #[test]
    fn single_point_occupies_one_box() {
        let points = vec![Point::new(3.0, 4.0)];
        assert_eq!(occupied_boxes(&points, 0.1).unwrap(), 1);
    }

    #[test]
    fn square_counts_scale_quadratically() {
        let points = filled_square(101);
        let coarse = occupied_boxes(&points, 0.5).unwrap();
        let fine = occupied_boxes(&points, 0.25).unwrap();
        // Halving epsilon roughly quadruples the count for a 2D set.
        assert!(fine >= 3 * coarse, "coarse={coarse}, fine={fine}");
    }

    #[test]
    fn filled_square_dimension_near_two() {
        let points = filled_square(201);
        let epsilons = [0.2, 0.1, 0.05, 0.025];
        let fit = fractal_dimension(&points, &epsilons).unwrap();
        assert!(
            (fit.dimension - 2.0).abs() < 0.25,
            "dimension = {}",
            fit.dimension,
        );
    }

    #[test]
    fn line_dimension_near_one() {
        let points = diagonal(2001);
        let epsilons = [0.2, 0.1, 0.05, 0.025];
        let fit = fractal_dimension(&points, &epsilons).unwrap();
        assert!(
            (fit.dimension - 1.0).abs() < 0.2,
            "dimension = {}",
            fit.dimension,
        );
    }

    #[test]
    fn empty_point_set_is_degenerate() {
        assert!(matches!(
            occupied_boxes(&[], 0.5),
            Err(SolverError::DegenerateGeometry { .. })
        ));
    }

    #[test]
    fn invalid_epsilon_is_rejected() {
        let points = vec![Point::new(0.0, 0.0)];
        assert!(occupied_boxes(&points, 0.0).is_err());
        assert!(occupied_boxes(&points, -1.0).is_err());
        assert!(occupied_boxes(&points, f64::NAN).is_err());
    }

    #[test]
    fn equal_scales_are_rejected() {
        let points = diagonal(10);
        assert!(fractal_dimension(&points, &[0.1, 0.1]).is_err());
    }

    #[test]
    fn too_few_scales_are_rejected() {
        let points = diagonal(10);
        assert!(fractal_dimension(&points, &[0.1]).is_err());
    }

    #[test]
    fn samples_are_exported_per_scale() {
        let points = filled_square(51);
        let epsilons = [0.2, 0.1, 0.05];
        let fit = fractal_dimension(&points, &epsilons).unwrap();
        assert_eq!(fit.samples.len(), 3);
        assert!(fit.samples[0].log_inv_epsilon < fit.samples[2].log_inv_epsilon);
    }
}
