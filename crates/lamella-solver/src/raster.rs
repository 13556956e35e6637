//! Rasterization: fill normalized contours into binary occupancy masks.
//!
//! Each contour's interior (including its boundary) is filled into an
//! L×L `GrayImage` via `imageproc`'s scanline polygon fill, which uses
//! the even-odd rule. Self-intersecting or degenerate polygons yield a
//! deterministic, possibly partially-filled mask rather than an error:
//! fill is best-effort by design.

use image::{GrayImage, Luma};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point as ImgPoint;

use crate::normalize::NormalizedPair;
use crate::types::RasterPoint;

/// Pixel value marking a filled cell.
pub const FILLED: u8 = 255;

/// Fill both normalized contours into same-sized binary masks.
///
/// Returns `(mask_outer, mask_inner)`.
#[must_use]
pub fn fill_masks(pair: &NormalizedPair, grid_size: u32) -> (GrayImage, GrayImage) {
    (
        fill_mask(&pair.outer, grid_size),
        fill_mask(&pair.inner, grid_size),
    )
}

/// Fill a single contour into an L×L binary mask.
///
/// Consecutive duplicate vertices and a trailing vertex equal to the
/// first are dropped before the fill call (the closing edge is implied;
/// `imageproc` requires an open vertex list). If fewer than 3 distinct
/// vertices remain the mask is left empty — the deterministic
/// best-effort outcome for degenerate input.
#[must_use]
pub fn fill_mask(contour: &[RasterPoint], grid_size: u32) -> GrayImage {
    let mut mask = GrayImage::new(grid_size, grid_size);

    let mut vertices: Vec<ImgPoint<i32>> = Vec::with_capacity(contour.len());
    for p in contour {
        let v = ImgPoint::new(p.x, p.y);
        if vertices.last() != Some(&v) {
            vertices.push(v);
        }
    }
    while vertices.len() > 1 && vertices.last() == vertices.first() {
        vertices.pop();
    }

    if vertices.len() >= 3 {
        draw_polygon_mut(&mut mask, &vertices, Luma([FILLED]));
    }
    mask
}
