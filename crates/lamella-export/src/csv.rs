//! CSV serializers for solver output.
//!
//! All serializers are pure functions returning a `String`. Values are
//! formatted with Rust's default `f64` display, which is the shortest
//! representation that round-trips.
//!
//! The thickness serializer emits a **single row**: the distance
//! profile is one sample set, and a one-row file concatenates cleanly
//! across runs. The other serializers are conventional one-record-
//! per-row tables with a header line.

use std::fmt::Write;

use lamella_solver::{FractalFit, LevelSet, ScalarField, ThicknessReport};

/// Serialize the accumulated thickness profile as a single
/// comma-separated row.
///
/// An empty profile produces an empty string (no trailing newline).
#[must_use]
pub fn to_thickness_csv(report: &ThicknessReport) -> String {
    let mut out = String::new();
    for (i, sample) in report.samples.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        let _ = write!(out, "{sample}");
    }
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

/// Serialize a box-counting fit as a two-column log–log table.
///
/// The header row names the regression axes; one row follows per
/// scale.
#[must_use]
pub fn to_boxcount_csv(fit: &FractalFit) -> String {
    let mut out = String::from("log_inv_epsilon,log_count\n");
    for sample in &fit.samples {
        let _ = writeln!(out, "{},{}", sample.log_inv_epsilon, sample.log_count);
    }
    out
}

/// Serialize a scalar field as a grid of comma-separated rows, top
/// row first.
#[must_use]
pub fn to_field_csv(field: &ScalarField) -> String {
    let size = field.size();
    let mut out = String::new();
    for row in 0..size {
        for col in 0..size {
            if col > 0 {
                out.push(',');
            }
            let _ = write!(out, "{}", field.get(row, col));
        }
        out.push('\n');
    }
    out
}

/// Serialize equipotential level sets as a flat point table.
///
/// Columns: level, component index, x, y. Every point of every
/// component appears as one row, preserving extraction order.
#[must_use]
pub fn to_levels_csv(level_sets: &[LevelSet]) -> String {
    let mut out = String::from("level,component,x,y\n");
    for set in level_sets {
        for (component, polyline) in set.contours.iter().enumerate() {
            for p in polyline.points() {
                let _ = writeln!(out, "{},{component},{},{}", set.level, p.x, p.y);
            }
        }
    }
    out
}
