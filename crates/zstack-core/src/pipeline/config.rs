use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_FUSION_KERNEL_SIZE, DEFAULT_REGION_SIZE, DEFAULT_WINDOW_SIZE};
use crate::error::{Result, ZStackError};

/// Input/output paths plus the compositing parameters, as read from TOML.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Image files or directories, in z-stack order.
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
    /// Fuse the RGB channels instead of working on luminance only.
    #[serde(default)]
    pub color: bool,
    #[serde(default)]
    pub composite: CompositeConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            inputs: vec![PathBuf::from("stack")],
            output: PathBuf::from("composite.tiff"),
            color: false,
            composite: CompositeConfig::default(),
        }
    }
}

/// Parameters of one `composite` call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositeConfig {
    /// Frames kept around the best-focus frame (rounded up to even).
    pub window_size: usize,
    /// Pyramid levels including full resolution. `None` picks a depth whose
    /// coarsest level is still a few pixels wide.
    pub pyramid_depth: Option<usize>,
    /// Side length of the neighbourhood used by fusion statistics. Must be odd.
    pub fusion_kernel_radius: usize,
    /// Statistic deciding the source of every band-pass pixel.
    pub band_metric: FocusMeasure,
    /// Rule for the coarsest level.
    pub base_fusion: BaseFusion,
    /// Side length of the square scored around a point of interest.
    pub region_size: usize,
    /// Worker threads for parallel stages; 0 uses the global pool.
    pub max_workers: usize,
}

impl Default for CompositeConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            pyramid_depth: None,
            fusion_kernel_radius: DEFAULT_FUSION_KERNEL_SIZE,
            band_metric: FocusMeasure::RegionEnergy,
            base_fusion: BaseFusion::Deviation,
            region_size: DEFAULT_REGION_SIZE,
            max_workers: 0,
        }
    }
}

impl CompositeConfig {
    /// Reject values no stage can work with.
    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(ZStackError::InvalidInput(
                "window_size must be at least 1".into(),
            ));
        }
        if self.pyramid_depth == Some(0) {
            return Err(ZStackError::InvalidInput(
                "pyramid_depth must be at least 1".into(),
            ));
        }
        if self.fusion_kernel_radius == 0 || self.fusion_kernel_radius % 2 == 0 {
            return Err(ZStackError::InvalidInput(format!(
                "fusion_kernel_radius must be an odd positive integer, got {}",
                self.fusion_kernel_radius
            )));
        }
        if self.region_size == 0 {
            return Err(ZStackError::InvalidInput(
                "region_size must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Local statistic used to judge which frame is in focus at a pixel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FocusMeasure {
    /// Smoothed squared value.
    #[default]
    RegionEnergy,
    /// Local variance.
    Deviation,
    /// Local sum of histogram self-information.
    Entropy,
}

impl FocusMeasure {
    pub const COUNT: usize = 3;

    pub(crate) fn slot(self) -> usize {
        match self {
            Self::RegionEnergy => 0,
            Self::Deviation => 1,
            Self::Entropy => 2,
        }
    }
}

impl fmt::Display for FocusMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RegionEnergy => write!(f, "Region Energy"),
            Self::Deviation => write!(f, "Deviation"),
            Self::Entropy => write!(f, "Entropy"),
        }
    }
}

/// How the coarsest pyramid level is fused.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BaseFusion {
    /// Take the pixel with the highest local deviation.
    #[default]
    Deviation,
    /// Take the pixel with the highest local entropy.
    Entropy,
    /// Average of the deviation pick and the entropy pick.
    EntropyDeviation,
}

impl fmt::Display for BaseFusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deviation => write!(f, "Deviation"),
            Self::Entropy => write!(f, "Entropy"),
            Self::EntropyDeviation => write!(f, "Entropy + Deviation"),
        }
    }
}
