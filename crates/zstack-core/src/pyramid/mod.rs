//! Gaussian/Laplacian pyramids and their fusion.
//!
//! A [`Pyramid`] holds, for every level, the Gaussian image of that level and
//! the band-pass image derived from it. Level 0 is full resolution; the last
//! level is the coarsest, and its band is the Gaussian image itself.

pub mod build;
pub mod collapse;
pub mod fuse;
pub mod measure;
pub mod resample;

use std::borrow::Cow;
use std::sync::OnceLock;

use ndarray::Array2;

use crate::error::Result;
use crate::pipeline::config::FocusMeasure;

pub use build::{auto_depth, build_pyramid, max_depth};
pub use collapse::collapse_bands;
pub use fuse::{apply_fusion_map, fuse_pyramids, fusion_map, FusionMap, FusionParams};

/// One level of a [`Pyramid`].
#[derive(Debug)]
pub struct PyramidLevel {
    /// 0 = full resolution.
    pub level: usize,
    /// Gaussian image this level's band was derived from.
    pub gaussian: Array2<f64>,
    /// Band-pass detail, or the Gaussian image on the coarsest level.
    pub band: Array2<f64>,
    /// True on the coarsest level.
    pub is_base: bool,
    measures: [OnceLock<(usize, Array2<f64>)>; FocusMeasure::COUNT],
}

impl PyramidLevel {
    pub fn new(level: usize, gaussian: Array2<f64>, band: Array2<f64>, is_base: bool) -> Self {
        Self {
            level,
            gaussian,
            band,
            is_base,
            measures: Default::default(),
        }
    }

    pub fn dim(&self) -> (usize, usize) {
        self.band.dim()
    }

    /// Focus measure of this level's band over a `kernel_size` neighbourhood.
    ///
    /// The first request per measure is cached; a later request with another
    /// kernel size is computed without touching the cache.
    pub fn measure(&self, kind: FocusMeasure, kernel_size: usize) -> Cow<'_, Array2<f64>> {
        let slot = &self.measures[kind.slot()];
        let (cached_kernel, cached) = slot.get_or_init(|| {
            (kernel_size, measure::compute(&self.band, kind, kernel_size, self.is_base))
        });
        if *cached_kernel == kernel_size {
            Cow::Borrowed(cached)
        } else {
            Cow::Owned(measure::compute(&self.band, kind, kernel_size, self.is_base))
        }
    }
}

/// Gaussian/Laplacian pyramid of one image. Read-only once built.
#[derive(Debug)]
pub struct Pyramid {
    pub levels: Vec<PyramidLevel>,
}

impl Pyramid {
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// Dimensions of every level, finest first.
    pub fn shape(&self) -> Vec<(usize, usize)> {
        self.levels.iter().map(PyramidLevel::dim).collect()
    }

    /// Coarsest level, `None` for an empty pyramid.
    pub fn base(&self) -> Option<&PyramidLevel> {
        self.levels.last()
    }

    /// Rebuild the full-resolution image from the bands, without clipping.
    pub fn reconstruct(&self) -> Result<Array2<f64>> {
        let bands: Vec<&Array2<f64>> = self.levels.iter().map(|l| &l.band).collect();
        collapse_bands(&bands)
    }
}

/// Bands synthesized by fusion. No level keeps a link to a source frame.
#[derive(Clone, Debug)]
pub struct FusedPyramid {
    pub levels: Vec<Array2<f64>>,
}

impl FusedPyramid {
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// Collapse to a full-resolution image, clipped to [0, 1].
    pub fn collapse(&self) -> Result<Array2<f32>> {
        let bands: Vec<&Array2<f64>> = self.levels.iter().collect();
        collapse::collapse_clipped(&bands)
    }
}
