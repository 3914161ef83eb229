use ndarray::Array2;
use tracing::debug;

use crate::consts::MIN_PYRAMID_LEVEL_SIZE;
use crate::error::{Result, ZStackError};

use super::resample::{expand, reduce};
use super::{Pyramid, PyramidLevel};

/// Build a Gaussian/Laplacian pyramid with `depth` levels.
///
/// The frame is promoted to `f64` once; nothing is clamped or quantised
/// between levels. `depth` is capped at [`max_depth`] so no level is requested
/// below 1x1.
pub fn build_pyramid(data: &Array2<f32>, depth: usize) -> Result<Pyramid> {
    let (h, w) = data.dim();
    if h == 0 || w == 0 {
        return Err(ZStackError::InvalidInput(format!(
            "cannot build a pyramid of a {w}x{h} image"
        )));
    }
    if depth == 0 {
        return Err(ZStackError::InvalidInput(
            "pyramid depth must be at least 1".into(),
        ));
    }

    let limit = max_depth(h, w);
    if depth > limit {
        debug!(requested = depth, used = limit, "Pyramid depth capped");
    }
    let gaussians = gaussian_levels(data.mapv(|v| v as f64), depth.min(limit));
    Ok(laplacian_levels(gaussians))
}

/// Successive REDUCE steps; index 0 is the input.
pub fn gaussian_levels(data: Array2<f64>, depth: usize) -> Vec<Array2<f64>> {
    let mut levels = Vec::with_capacity(depth);
    levels.push(data);
    for i in 1..depth {
        let next = reduce(&levels[i - 1]);
        levels.push(next);
    }
    levels
}

fn laplacian_levels(gaussians: Vec<Array2<f64>>) -> Pyramid {
    let depth = gaussians.len();
    let mut bands: Vec<Array2<f64>> = Vec::with_capacity(depth);
    for i in 0..depth {
        let band = if i + 1 < depth {
            &gaussians[i] - &expand(&gaussians[i + 1], gaussians[i].dim())
        } else {
            gaussians[i].clone()
        };
        bands.push(band);
    }

    let levels = gaussians
        .into_iter()
        .zip(bands)
        .enumerate()
        .map(|(i, (gaussian, band))| PyramidLevel::new(i, gaussian, band, i + 1 == depth))
        .collect();
    Pyramid { levels }
}

/// Number of levels until both dimensions reach 1.
pub fn max_depth(height: usize, width: usize) -> usize {
    let (mut h, mut w) = (height.max(1), width.max(1));
    let mut levels = 1;
    while h > 1 || w > 1 {
        h = h.div_ceil(2);
        w = w.div_ceil(2);
        levels += 1;
    }
    levels
}

/// Deepest pyramid whose coarsest level is at least
/// [`MIN_PYRAMID_LEVEL_SIZE`] on both sides. Never less than 1.
pub fn auto_depth(height: usize, width: usize) -> usize {
    let (mut h, mut w) = (height, width);
    let mut levels = 1;
    while h.div_ceil(2) >= MIN_PYRAMID_LEVEL_SIZE && w.div_ceil(2) >= MIN_PYRAMID_LEVEL_SIZE {
        h = h.div_ceil(2);
        w = w.div_ceil(2);
        levels += 1;
    }
    levels
}
