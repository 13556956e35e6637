//! Thickness sampling between consecutive equipotential contours.
//!
//! For each adjacent pair of levels, every point on the first connected
//! component of the lower level's contour is matched to its nearest
//! point (minimum Euclidean distance) on the first component of the
//! upper level's contour, via an R-tree over the target points. The
//! per-point distances accumulate across consecutive pairs into a
//! single profile, so the profile's mean approximates the total
//! annulus width spanned by the requested levels.
//!
//! Two behaviors are preserved from the reference implementation and
//! are deliberate, documented limitations rather than bugs:
//!
//! - Only the **first** component at each level contributes. For the
//!   simply-connected shapes this solver targets, levels have a single
//!   component; multi-component level sets are not aggregated.
//! - When adjacent contours have different point counts, the profile
//!   is resized by **tiling** (repeating its existing values), the
//!   `np.resize` semantics of the original statistic.
//!
//! Pairs where either side has no contour are skipped: the sample set
//! shrinks, it never errors.

use rstar::RTree;
use serde::{Deserialize, Serialize};

use crate::contour::LevelSet;
use crate::field::AnnulusEstimate;
use crate::types::Polyline;

/// The thickness statistics produced by one solver run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThicknessReport {
    /// Accumulated per-point distance profile across consecutive
    /// equipotential pairs, in grid units.
    pub samples: Vec<f64>,
    /// Mean of the profile, or `None` when no pair produced samples.
    pub mean: Option<f64>,
    /// The closed-form `area / perimeter` estimate, computed from the
    /// label grid independently of the PDE solution.
    pub estimate: AnnulusEstimate,
}

/// Accumulate the nearest-point distance profile over consecutive
/// level pairs.
#[must_use]
pub fn thickness_profile(level_sets: &[LevelSet]) -> Vec<f64> {
    let mut profile: Vec<f64> = Vec::new();

    for pair in level_sets.windows(2) {
        let (Some(from), Some(to)) = (first_component(&pair[0]), first_component(&pair[1]))
        else {
            continue; // empty level: skip this pair
        };

        resize_tiling(&mut profile, from.len());

        let tree = RTree::bulk_load(to.points().iter().map(|p| [p.x, p.y]).collect());
        for (slot, p) in profile.iter_mut().zip(from.points()) {
            if let Some(nearest) = tree.nearest_neighbor(&[p.x, p.y]) {
                let dx = p.x - nearest[0];
                let dy = p.y - nearest[1];
                *slot += dx.hypot(dy);
            }
        }
    }

    profile
}

/// Mean of a sample set, `None` when empty.
#[must_use]
pub fn mean(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = samples.len() as f64;
    Some(samples.iter().sum::<f64>() / n)
}

/// First non-empty component of a level set, if any.
fn first_component(set: &LevelSet) -> Option<&Polyline> {
    set.contours.iter().find(|c| !c.is_empty())
}

/// Resize the profile to `n` entries, tiling existing values when
/// growing (`np.resize` semantics). A profile that is still empty
/// grows with zeros.
fn resize_tiling(profile: &mut Vec<f64>, n: usize) {
    if profile.is_empty() {
        profile.resize(n, 0.0);
        return;
    }
    if n <= profile.len() {
        profile.truncate(n);
        return;
    }
    let period = profile.len();
    for i in period..n {
        let repeated = profile[i % period];
        profile.push(repeated);
    }
}
