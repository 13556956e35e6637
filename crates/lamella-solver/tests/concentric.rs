//! Integration tests: full solver runs on nested shapes with known
//! analytic behavior.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use lamella_solver::{
    BoundaryMask, Contour, Point, ScalarField, SolverConfig, relax, solve, solve_staged,
};

/// Axis-aligned rectangle contour centred on the origin.
fn rectangle(half_w: f64, half_h: f64) -> Contour {
    Contour::new(vec![
        Point::new(-half_w, -half_h),
        Point::new(half_w, -half_h),
        Point::new(half_w, half_h),
        Point::new(-half_w, half_h),
    ])
    .unwrap()
}

/// The concentric-squares reference scenario: a 50-unit outer square
/// around a 20-unit inner square on a 64-cell grid, potentials 0..100.
///
/// The 15-unit gap scales by `0.9 * 64 / 50 = 1.152` to 17.28 grid
/// units, which the accumulated thickness profile should approximate.
fn squares_config() -> (Contour, Contour, SolverConfig) {
    let outer = rectangle(25.0, 25.0);
    let inner = rectangle(10.0, 10.0);
    let config = SolverConfig {
        grid_size: 64,
        high_pot: 100.0,
        low_pot: 0.0,
        init_guess: 50.0,
        tolerance: 1e-4,
        max_iterations: 100_000,
        levels: vec![2.0, 25.0, 50.0, 75.0, 98.0],
    };
    (outer, inner, config)
}

#[test]
fn concentric_squares_thickness_matches_scaled_gap() {
    let (outer, inner, config) = squares_config();
    let result = solve(&outer, &inner, &config).expect("solver should succeed");

    assert!(result.converged, "expected convergence before the cap");
    assert!(
        result.iterations < config.max_iterations,
        "converged run should not exhaust the cap ({} iterations)",
        result.iterations,
    );

    // Every requested level lies strictly inside (0, 100): each must
    // produce at least one component.
    for set in &result.levels {
        assert!(
            !set.contours.is_empty(),
            "level {} produced no contour",
            set.level,
        );
    }

    let mean = result.thickness.mean.expect("expected thickness samples");
    let expected = 15.0 * 0.9 * 64.0 / 50.0; // 17.28 grid units
    assert!(
        (mean - expected).abs() / expected < 0.25,
        "thickness mean {mean} too far from expected {expected}",
    );
}

#[test]
fn concentric_squares_area_estimate_is_positive() {
    let (outer, inner, config) = squares_config();
    let result = solve(&outer, &inner, &config).unwrap();

    let estimate = &result.thickness.estimate;
    assert!(estimate.area > 0.0);
    // The outer square spans 0.9 * 64 = 57.6 cells per side; the filled
    // interior area must be in that ballpark.
    assert!(estimate.area > 40.0 * 40.0, "area = {}", estimate.area);
    assert!(estimate.area < 64.0 * 64.0, "area = {}", estimate.area);
    assert!(estimate.perimeter.is_some());
    assert!(estimate.thickness.unwrap() > 0.0);
}

#[test]
fn out_of_range_level_is_soft_skipped() {
    let (outer, inner, mut config) = squares_config();
    config.levels = vec![50.0, 150.0];

    let result = solve(&outer, &inner, &config).expect("out-of-range level must not abort");
    assert_eq!(result.levels.len(), 2);
    assert!(!result.levels[0].contours.is_empty());
    assert!(result.levels[1].contours.is_empty(), "150 exceeds the range");
    // The only pair touches the empty level, so no samples accumulate.
    assert!(result.thickness.samples.is_empty());
    assert_eq!(result.thickness.mean, None);
}

#[test]
fn coincident_boundaries_leave_no_free_cells() {
    let shape = rectangle(25.0, 25.0);
    let config = SolverConfig {
        grid_size: 64,
        high_pot: 100.0,
        low_pot: 0.0,
        init_guess: 50.0,
        tolerance: 1e-4,
        max_iterations: 1000,
        levels: vec![50.0, 50.0],
    };

    // Outer and inner contour coincide: the annulus is empty and the
    // whole grid is Dirichlet, so the first pass changes nothing.
    let result = solve(&shape, &shape, &config).unwrap();
    assert!(result.converged);
    assert_eq!(result.iterations, 1);
    assert!(result.max_change.abs() < f64::EPSILON);

    // Duplicate levels trace identical contours, so every accumulated
    // distance is zero.
    assert!(result.thickness.samples.iter().all(|&d| d.abs() < 1e-9));
}

#[test]
fn non_square_outer_preserves_aspect_ratio() {
    let (_, inner, config) = squares_config();
    let outer = rectangle(100.0, 50.0); // 2:1 rectangle
    let result = solve_staged(&outer, &inner, &config).unwrap();

    let xs: Vec<i32> = result.normalized.outer.iter().map(|p| p.x).collect();
    let ys: Vec<i32> = result.normalized.outer.iter().map(|p| p.y).collect();
    let span_x = xs.iter().max().unwrap() - xs.iter().min().unwrap();
    let span_y = ys.iter().max().unwrap() - ys.iter().min().unwrap();

    // Uniform scaling: scale = min(0.9*64/200, 0.9*64/100) = 0.288, so
    // the spans are about 57 x 28 cells, ratio 2 within rounding.
    let ratio = f64::from(span_x) / f64::from(span_y);
    assert!((ratio - 2.0).abs() < 0.1, "aspect ratio {ratio}");
    assert!(span_x <= 58, "outer must fit the grid, span_x = {span_x}");
}

/// Circular boundary masks built directly from pixel distances, on an
/// odd grid so the center cell is exact. Feeding them straight into
/// the labelling and relaxation stages isolates the solver from
/// rasterization rounding.
fn circular_domain(
    size: u32,
    outer_radius: f64,
    inner_radius: f64,
    config: &SolverConfig,
) -> (ScalarField, BoundaryMask) {
    let mut mask_outer = image::GrayImage::new(size, size);
    let mut mask_inner = image::GrayImage::new(size, size);
    let center = f64::from(size / 2);
    for y in 0..size {
        for x in 0..size {
            let r = (f64::from(x) - center).hypot(f64::from(y) - center);
            if r <= outer_radius {
                mask_outer.put_pixel(x, y, image::Luma([255]));
            }
            if r <= inner_radius {
                mask_inner.put_pixel(x, y, image::Luma([255]));
            }
        }
    }
    let domain = lamella_solver::field::initialize(&mask_outer, &mask_inner, config).unwrap();
    (domain.potential, domain.boundary)
}

#[test]
fn circular_annulus_field_is_mirror_symmetric() {
    let config = SolverConfig {
        grid_size: 65,
        high_pot: 1.0,
        low_pot: -1.0,
        init_guess: 0.0,
        tolerance: 1e-5,
        max_iterations: 100_000,
        levels: vec![],
    };
    let (potential, boundary) = circular_domain(65, 25.0, 10.0, &config);
    let result = relax(&potential, &boundary, &config).unwrap();
    assert!(result.converged);

    // The masks are symmetric under both axis mirrors; the relaxed
    // field must be too (up to accumulated floating-point noise).
    let size = result.field.size();
    for row in 0..size {
        for col in 0..size {
            let mirrored_col = result.field.get(row, size - 1 - col);
            let mirrored_row = result.field.get(size - 1 - row, col);
            let v = result.field.get(row, col);
            assert!(
                (v - mirrored_col).abs() < 1e-6,
                "x-mirror asymmetry at ({row}, {col})",
            );
            assert!(
                (v - mirrored_row).abs() < 1e-6,
                "y-mirror asymmetry at ({row}, {col})",
            );
        }
    }
}

#[test]
fn circular_annulus_potential_decreases_outward() {
    let config = SolverConfig {
        grid_size: 65,
        high_pot: 1.0,
        low_pot: -1.0,
        init_guess: 0.0,
        tolerance: 1e-5,
        max_iterations: 100_000,
        levels: vec![],
    };
    let (potential, boundary) = circular_domain(65, 25.0, 10.0, &config);
    let result = relax(&potential, &boundary, &config).unwrap();

    // Walking from the center outward along a row, the potential must
    // fall monotonically from high to low across the annulus.
    let mid = 32;
    for col in 43..57 {
        let nearer = result.field.get(mid, col - 1);
        let farther = result.field.get(mid, col);
        assert!(
            nearer >= farther - 1e-9,
            "potential rose outward at col {col}: {nearer} -> {farther}",
        );
    }
}
