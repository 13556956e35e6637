//! Jacobi relaxation of the potential field toward the discrete
//! Laplace equation.
//!
//! Each iteration replaces every free cell with the mean of its four
//! edge neighbours (weight 1/4 each), reading exclusively from the
//! previous iteration's field (double buffering, so iteration k+1 sees
//! iteration k's fully-updated state). Fixed cells are re-imposed from
//! the initial field after every pass. Cells on the outermost ring are
//! never updated: the stencil requires four full neighbours, and this
//! boundary simplification is deliberate.
//!
//! Convergence: the iteration stops when
//! `max_abs_change / (high_pot - low_pot)` drops below the configured
//! tolerance, or when the iteration cap is reached — whichever comes
//! first. Hitting the cap is never an error; it is reported through
//! [`Relaxation::converged`] so the caller can decide whether to trust
//! the field.

use serde::{Deserialize, Serialize};

use crate::types::{BoundaryMask, ScalarField, SolverConfig, SolverError};

/// Outcome of a relaxation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relaxation {
    /// The relaxed field (converged, or the state at the iteration cap).
    pub field: ScalarField,
    /// Number of iterations actually performed (at least 1).
    pub iterations: u32,
    /// `max(|new - old|)` over the whole field in the final iteration.
    pub max_change: f64,
    /// Whether the tolerance criterion was met before the cap.
    pub converged: bool,
}

/// Relax `initial` until convergence or the iteration cap.
///
/// The caller's field is not mutated; fresh buffers carry the state.
/// A domain with no free cells (a fully-Dirichlet field) converges in
/// exactly one iteration: the first pass changes nothing.
///
/// # Errors
///
/// Returns [`SolverError::InvalidConfig`] if the field and mask sizes
/// disagree or the potential range `high_pot - low_pot` is not
/// positive.
pub fn relax(
    initial: &ScalarField,
    boundary: &BoundaryMask,
    config: &SolverConfig,
) -> Result<Relaxation, SolverError> {
    if initial.size() != boundary.size() {
        return Err(SolverError::InvalidConfig(format!(
            "field size {} does not match boundary mask size {}",
            initial.size(),
            boundary.size(),
        )));
    }
    let range = config.high_pot - config.low_pot;
    if !(range.is_finite() && range > 0.0) {
        return Err(SolverError::InvalidConfig(format!(
            "potential range must be positive, got {range}",
        )));
    }

    let size = initial.size();
    let mut current = initial.clone();
    let mut next = initial.clone();

    let mut iterations = 0;
    let mut max_change = 0.0;
    let mut converged = false;

    for n in 1..=config.max_iterations {
        // Stencil pass over interior free cells only.
        for row in 1..size.saturating_sub(1) {
            for col in 1..size - 1 {
                if boundary.is_fixed(row, col) {
                    continue;
                }
                let sum = current.get(row - 1, col)
                    + current.get(row + 1, col)
                    + current.get(row, col - 1)
                    + current.get(row, col + 1);
                next.set(row, col, 0.25 * sum);
            }
        }

        // Re-impose fixed potentials in case anything disturbed them.
        for row in 0..size {
            for col in 0..size {
                if boundary.is_fixed(row, col) {
                    next.set(row, col, initial.get(row, col));
                }
            }
        }

        max_change = current
            .as_slice()
            .iter()
            .zip(next.as_slice())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max);

        std::mem::swap(&mut current, &mut next);
        iterations = n;

        if max_change / range < config.tolerance {
            converged = true;
            break;
        }
    }

    Ok(Relaxation {
        field: current,
        iterations,
        max_change,
        converged,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config(max_iterations: u32) -> SolverConfig {
        SolverConfig {
            grid_size: 8,
            high_pot: 1.0,
            low_pot: -1.0,
            init_guess: 0.0,
            tolerance: 1e-4,
            max_iterations,
            levels: vec![],
        }
    }

    /// 8x8 domain: left column fixed at -1, right column fixed at +1,
    /// everything else free. The converged solution is linear in the
    /// column index.
    fn strip_domain() -> (ScalarField, BoundaryMask) {
        let size = 8;
        let mut field = ScalarField::filled(size, 0.0);
        let mut fixed = vec![false; size * size];
        for row in 0..size {
            field.set(row, 0, -1.0);
            fixed[row * size] = true;
            field.set(row, size - 1, 1.0);
            fixed[row * size + size - 1] = true;
            // Top and bottom rows fixed at the linear profile so the
            // edge-ring exclusion does not distort the interior.
            for col in 0..size {
                let value = -1.0 + 2.0 * (col as f64) / ((size - 1) as f64);
                if row == 0 || row == size - 1 {
                    field.set(row, col, value);
                    fixed[row * size + col] = true;
                }
            }
        }
        (field, BoundaryMask::new(size, fixed).unwrap())
    }

    #[test]
    fn fully_dirichlet_converges_in_one_iteration() {
        let size = 6;
        let field = ScalarField::filled(size, 0.5);
        let mask = BoundaryMask::new(size, vec![true; size * size]).unwrap();
        let result = relax(&field, &mask, &config(1000)).unwrap();

        assert!(result.converged);
        assert_eq!(result.iterations, 1);
        assert!(result.max_change.abs() < f64::EPSILON);
        assert_eq!(result.field, field);
    }

    #[test]
    fn strip_converges_to_linear_profile() {
        let (field, mask) = strip_domain();
        let result = relax(&field, &mask, &config(100_000)).unwrap();

        assert!(result.converged);
        for row in 1..7 {
            for col in 1..7 {
                let expected = -1.0 + 2.0 * (col as f64) / 7.0;
                let got = result.field.get(row, col);
                assert!(
                    (got - expected).abs() < 0.01,
                    "cell ({row}, {col}): expected {expected}, got {got}",
                );
            }
        }
    }

    #[test]
    fn fixed_cells_never_move() {
        let (field, mask) = strip_domain();
        let result = relax(&field, &mask, &config(500)).unwrap();
        for row in 0..8 {
            for col in 0..8 {
                if mask.is_fixed(row, col) {
                    assert!(
                        (result.field.get(row, col) - field.get(row, col)).abs() < f64::EPSILON,
                        "fixed cell ({row}, {col}) changed",
                    );
                }
            }
        }
    }

    #[test]
    fn cap_exhaustion_is_reported_not_raised() {
        let (field, mask) = strip_domain();
        let result = relax(&field, &mask, &config(2)).unwrap();
        assert!(!result.converged);
        assert_eq!(result.iterations, 2);
        assert!(result.max_change > 0.0);
    }

    #[test]
    fn mismatched_sizes_are_rejected() {
        let field = ScalarField::filled(8, 0.0);
        let mask = BoundaryMask::new(4, vec![true; 16]).unwrap();
        assert!(relax(&field, &mask, &config(10)).is_err());
    }

    #[test]
    fn caller_field_is_untouched() {
        let (field, mask) = strip_domain();
        let snapshot = field.clone();
        let _ = relax(&field, &mask, &config(50)).unwrap();
        assert_eq!(field, snapshot);
    }
}
