//! Equipotential extraction: marching-squares level-set tracing.
//!
//! For each requested level, every 2×2 cell of the field is classified
//! by which corners sit at or above the level (`>=` rule); the lookup
//! table yields up to two line segments per cell, with crossing points
//! placed by linear interpolation along the cell edges. Saddle cells
//! (cases 5 and 10) are split into two segments without disambiguation.
//! Segments are then connected into polylines by endpoint matching.
//!
//! A level outside the field's value range crosses no cell edge and
//! yields an empty contour set — the soft-skip case downstream
//! consumers must tolerate.
//!
//! Points are in grid coordinates: `x` is the column index, `y` the
//! row index.

use serde::{Deserialize, Serialize};

use crate::types::{Point, Polyline, ScalarField};

/// Tolerance for matching segment endpoints while connecting.
const MATCH_EPSILON: f64 = 1e-3;

/// All connected components extracted at one equipotential level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSet {
    /// The potential value this set traces.
    pub level: f64,
    /// Connected components, in deterministic extraction order.
    /// Thickness sampling consumes only the first (see
    /// [`crate::thickness`]).
    pub contours: Vec<Polyline>,
}

/// Extract level sets for every requested level.
#[must_use]
pub fn extract_levels(field: &ScalarField, levels: &[f64]) -> Vec<LevelSet> {
    levels
        .iter()
        .map(|&level| LevelSet {
            level,
            contours: extract_level(field, level),
        })
        .collect()
}

/// Extract all connected contour components at a single level.
#[must_use]
pub fn extract_level(field: &ScalarField, level: f64) -> Vec<Polyline> {
    connect_segments(&march_squares(field, level))
}

/// An unordered contour line segment within one grid cell.
#[derive(Debug, Clone, Copy)]
struct Segment {
    start: Point,
    end: Point,
}

/// Run marching squares over the field, producing unordered segments.
fn march_squares(field: &ScalarField, level: f64) -> Vec<Segment> {
    let size = field.size();
    let mut segments = Vec::new();
    if size < 2 {
        return segments;
    }

    for row in 0..size - 1 {
        for col in 0..size - 1 {
            let tl = field.get(row, col);
            let tr = field.get(row, col + 1);
            let bl = field.get(row + 1, col);
            let br = field.get(row + 1, col + 1);

            let mut index = 0u8;
            if tl >= level {
                index |= 1;
            }
            if tr >= level {
                index |= 2;
            }
            if br >= level {
                index |= 4;
            }
            if bl >= level {
                index |= 8;
            }

            #[allow(clippy::cast_precision_loss)]
            let (x, y) = (col as f64, row as f64);
            cell_segments(index, x, y, tl, tr, br, bl, level, &mut segments);
        }
    }
    segments
}

/// Append the lookup-table segments for one cell.
#[allow(clippy::too_many_arguments)]
fn cell_segments(
    index: u8,
    x: f64,
    y: f64,
    tl: f64,
    tr: f64,
    br: f64,
    bl: f64,
    level: f64,
    out: &mut Vec<Segment>,
) {
    let top = interpolate_edge(x, y, x + 1.0, y, tl, tr, level);
    let right = interpolate_edge(x + 1.0, y, x + 1.0, y + 1.0, tr, br, level);
    let bottom = interpolate_edge(x, y + 1.0, x + 1.0, y + 1.0, bl, br, level);
    let left = interpolate_edge(x, y, x, y + 1.0, tl, bl, level);

    match index {
        0 | 15 => {}
        1 | 14 => out.push(Segment {
            start: left,
            end: top,
        }),
        2 | 13 => out.push(Segment {
            start: top,
            end: right,
        }),
        3 | 12 => out.push(Segment {
            start: left,
            end: right,
        }),
        4 | 11 => out.push(Segment {
            start: right,
            end: bottom,
        }),
        5 => {
            // Saddle: two separate segments.
            out.push(Segment {
                start: left,
                end: top,
            });
            out.push(Segment {
                start: right,
                end: bottom,
            });
        }
        6 | 9 => out.push(Segment {
            start: top,
            end: bottom,
        }),
        7 | 8 => out.push(Segment {
            start: left,
            end: bottom,
        }),
        _ => {
            // 10: the other saddle.
            out.push(Segment {
                start: top,
                end: right,
            });
            out.push(Segment {
                start: left,
                end: bottom,
            });
        }
    }
}

/// Linear interpolation of the crossing point along one cell edge.
fn interpolate_edge(x1: f64, y1: f64, x2: f64, y2: f64, v1: f64, v2: f64, level: f64) -> Point {
    if (v2 - v1).abs() < 1e-12 {
        return Point::new((x1 + x2) / 2.0, (y1 + y2) / 2.0);
    }
    let t = ((level - v1) / (v2 - v1)).clamp(0.0, 1.0);
    Point::new(t.mul_add(x2 - x1, x1), t.mul_add(y2 - y1, y1))
}

/// Connect unordered segments into polylines by greedy endpoint
/// matching. Deterministic: components are seeded in segment scan
/// order, which makes "the first component" a stable notion for
/// downstream consumers.
fn connect_segments(segments: &[Segment]) -> Vec<Polyline> {
    let mut contours = Vec::new();
    let mut used = vec![false; segments.len()];

    for seed in 0..segments.len() {
        if used[seed] {
            continue;
        }
        used[seed] = true;
        let mut points = vec![segments[seed].start, segments[seed].end];
        let mut tail = segments[seed].end;

        let mut extended = true;
        while extended {
            extended = false;
            for (i, seg) in segments.iter().enumerate() {
                if used[i] {
                    continue;
                }
                if seg.start.distance(tail) < MATCH_EPSILON {
                    points.push(seg.end);
                    tail = seg.end;
                    used[i] = true;
                    extended = true;
                    break;
                }
                if seg.end.distance(tail) < MATCH_EPSILON {
                    points.push(seg.start);
                    tail = seg.start;
                    used[i] = true;
                    extended = true;
                    break;
                }
            }
        }

        if points.len() >= 2 {
            contours.push(Polyline::new(points));
        }
    }
    contours
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Radially decreasing field: a peak at the center.
    fn peak_field(size: usize) -> ScalarField {
        let mut field = ScalarField::filled(size, 0.0);
        let center = (size as f64 - 1.0) / 2.0;
        for row in 0..size {
            for col in 0..size {
                let r = Point::new(col as f64, row as f64).distance(Point::new(center, center));
                field.set(row, col, 10.0 - r);
            }
        }
        field
    }

    #[test]
    fn flat_field_has_no_contours() {
        let field = ScalarField::filled(6, 5.0);
        // Every corner is >= level: case 15 everywhere.
        assert!(extract_level(&field, 5.0).is_empty());
        assert!(extract_level(&field, 4.0).is_empty());
    }

    #[test]
    fn level_outside_range_yields_empty_set() {
        let field = peak_field(9);
        assert!(extract_level(&field, 1e6).is_empty());
        assert!(extract_level(&field, -1e6).is_empty());
    }

    #[test]
    fn peak_produces_closed_ring() {
        let field = peak_field(11);
        let contours = extract_level(&field, 7.0);
        assert_eq!(contours.len(), 1, "one connected ring expected");
        let ring = &contours[0];
        assert!(ring.len() >= 8);
        // The ring closes back on itself.
        let first = *ring.first().unwrap();
        let last = *ring.last().unwrap();
        assert!(first.distance(last) < MATCH_EPSILON);
    }

    #[test]
    fn contour_points_lie_near_the_level_radius() {
        let field = peak_field(21);
        let contours = extract_level(&field, 5.0);
        let center = Point::new(10.0, 10.0);
        for p in contours[0].points() {
            let r = p.distance(center);
            // level 5 corresponds to radius 5
            assert!((r - 5.0).abs() < 0.75, "point {p:?} at radius {r}");
        }
    }

    #[test]
    fn extract_levels_preserves_order_and_levels() {
        let field = peak_field(11);
        let sets = extract_levels(&field, &[4.0, 6.0, 8.0]);
        assert_eq!(sets.len(), 3);
        assert!((sets[0].level - 4.0).abs() < f64::EPSILON);
        assert!((sets[2].level - 8.0).abs() < f64::EPSILON);
        assert!(!sets[1].contours.is_empty());
    }

    #[test]
    fn interpolation_places_crossing_proportionally() {
        let p = interpolate_edge(0.0, 0.0, 1.0, 0.0, 0.0, 10.0, 2.5);
        assert!((p.x - 0.25).abs() < 1e-12);
        assert!(p.y.abs() < 1e-12);
    }
}
