use ndarray::{Array2, Zip};
use rayon::prelude::*;
use tracing::debug;

use crate::error::{Result, ZStackError};
use crate::pipeline::config::{BaseFusion, CompositeConfig, FocusMeasure};

use super::{FusedPyramid, Pyramid};

/// Statistics and neighbourhood used to pick a source per pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FusionParams {
    pub kernel_size: usize,
    pub band_metric: FocusMeasure,
    pub base_fusion: BaseFusion,
}

impl From<&CompositeConfig> for FusionParams {
    fn from(config: &CompositeConfig) -> Self {
        Self {
            kernel_size: config.fusion_kernel_radius,
            band_metric: config.band_metric,
            base_fusion: config.base_fusion,
        }
    }
}

/// Source frame chosen for every pixel of one level.
#[derive(Clone, Debug)]
pub enum LevelSelection {
    /// One source per pixel.
    Single(Array2<usize>),
    /// Two sources per pixel, averaged.
    Blend(Array2<usize>, Array2<usize>),
}

/// Per-level selection of source pyramids, finest level first.
///
/// Computed once from a set of pyramids (luminance for color stacks) and
/// applicable to any pyramids of the same shape.
#[derive(Clone, Debug)]
pub struct FusionMap {
    pub levels: Vec<LevelSelection>,
}

/// Fuse pyramids by picking, on every level and pixel, the source with the
/// highest local focus statistic.
pub fn fuse_pyramids(pyramids: &[Pyramid], params: &FusionParams) -> Result<FusedPyramid> {
    let map = fusion_map(pyramids, params)?;
    apply_fusion_map(pyramids, &map)
}

/// Decide the source frame of every pixel on every level.
///
/// Band levels use `params.band_metric`; the coarsest level uses
/// `params.base_fusion`. Ties go to the earliest pyramid.
pub fn fusion_map(pyramids: &[Pyramid], params: &FusionParams) -> Result<FusionMap> {
    let shape = check_shapes(pyramids)?;
    let depth = shape.len();
    let k = params.kernel_size;

    let levels = (0..depth)
        .into_par_iter()
        .map(|level| {
            if level + 1 < depth {
                LevelSelection::Single(argmax_measure(pyramids, level, params.band_metric, k))
            } else {
                match params.base_fusion {
                    BaseFusion::Deviation => LevelSelection::Single(argmax_measure(
                        pyramids,
                        level,
                        FocusMeasure::Deviation,
                        k,
                    )),
                    BaseFusion::Entropy => LevelSelection::Single(argmax_measure(
                        pyramids,
                        level,
                        FocusMeasure::Entropy,
                        k,
                    )),
                    BaseFusion::EntropyDeviation => LevelSelection::Blend(
                        argmax_measure(pyramids, level, FocusMeasure::Entropy, k),
                        argmax_measure(pyramids, level, FocusMeasure::Deviation, k),
                    ),
                }
            }
        })
        .collect();

    debug!(sources = pyramids.len(), depth, "Computed fusion map");
    Ok(FusionMap { levels })
}

/// Assemble fused bands from `pyramids` following `map`.
pub fn apply_fusion_map(pyramids: &[Pyramid], map: &FusionMap) -> Result<FusedPyramid> {
    let shape = check_shapes(pyramids)?;
    if map.levels.len() != shape.len() {
        return Err(ZStackError::InvalidInput(format!(
            "fusion map has {} levels, pyramids have {}",
            map.levels.len(),
            shape.len()
        )));
    }

    let levels = map
        .levels
        .par_iter()
        .enumerate()
        .map(|(level, selection)| {
            let band = |src: usize, r: usize, c: usize| pyramids[src].levels[level].band[[r, c]];
            match selection {
                LevelSelection::Single(idx) => {
                    Array2::from_shape_fn(idx.dim(), |(r, c)| band(idx[[r, c]], r, c))
                }
                LevelSelection::Blend(a, b) => Array2::from_shape_fn(a.dim(), |(r, c)| {
                    0.5 * (band(a[[r, c]], r, c) + band(b[[r, c]], r, c))
                }),
            }
        })
        .collect();

    Ok(FusedPyramid { levels })
}

/// Index of the pyramid with the strictly highest statistic at each pixel.
fn argmax_measure(
    pyramids: &[Pyramid],
    level: usize,
    kind: FocusMeasure,
    kernel_size: usize,
) -> Array2<usize> {
    let first = pyramids[0].levels[level].measure(kind, kernel_size);
    let mut best = first.into_owned();
    let mut idx = Array2::<usize>::zeros(best.dim());

    for (source, pyramid) in pyramids.iter().enumerate().skip(1) {
        let m = pyramid.levels[level].measure(kind, kernel_size);
        Zip::from(&mut idx)
            .and(&mut best)
            .and(&*m)
            .for_each(|i, b, &v| {
                if v > *b {
                    *b = v;
                    *i = source;
                }
            });
    }

    idx
}

fn check_shapes(pyramids: &[Pyramid]) -> Result<Vec<(usize, usize)>> {
    let first = pyramids
        .first()
        .ok_or_else(|| ZStackError::InvalidInput("no pyramids to fuse".into()))?;
    let shape = first.shape();
    for (i, p) in pyramids.iter().enumerate().skip(1) {
        if p.shape() != shape {
            return Err(ZStackError::InvalidInput(format!(
                "pyramid {i} has shape {:?}, expected {:?}",
                p.shape(),
                shape
            )));
        }
    }
    Ok(shape)
}
