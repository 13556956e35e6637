//! Discrete gradient of the potential field.
//!
//! Central differences on interior cells, one-sided differences on the
//! first and last row/column (the same scheme as `numpy.gradient` with
//! unit spacing). The result is consumed by external streamline or
//! vector-plot collaborators; nothing in this crate reads it back.

use serde::{Deserialize, Serialize};

use crate::types::ScalarField;

/// The two partial-derivative components of the field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientField {
    /// Partial derivative along rows (d/dy, row index increasing).
    pub gy: ScalarField,
    /// Partial derivative along columns (d/dx, column index increasing).
    pub gx: ScalarField,
}

/// Compute the gradient of a field.
///
/// Grids narrower than 2 cells have no defined difference; their
/// gradient components are zero.
#[must_use]
pub fn gradient(field: &ScalarField) -> GradientField {
    let size = field.size();
    let mut gy = ScalarField::filled(size, 0.0);
    let mut gx = ScalarField::filled(size, 0.0);

    if size < 2 {
        return GradientField { gy, gx };
    }

    for row in 0..size {
        for col in 0..size {
            let dy = if row == 0 {
                field.get(1, col) - field.get(0, col)
            } else if row == size - 1 {
                field.get(size - 1, col) - field.get(size - 2, col)
            } else {
                (field.get(row + 1, col) - field.get(row - 1, col)) / 2.0
            };
            gy.set(row, col, dy);

            let dx = if col == 0 {
                field.get(row, 1) - field.get(row, 0)
            } else if col == size - 1 {
                field.get(row, size - 1) - field.get(row, size - 2)
            } else {
                (field.get(row, col + 1) - field.get(row, col - 1)) / 2.0
            };
            gx.set(row, col, dx);
        }
    }

    GradientField { gy, gx }
}
