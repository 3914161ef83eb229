/// Minimum pixel count (h*w) to use row-level Rayon parallelism.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// B3 spline 1D kernel coefficients: [1, 4, 6, 4, 1] / 16.
pub const B3_KERNEL: [f64; 5] = [1.0 / 16.0, 4.0 / 16.0, 6.0 / 16.0, 4.0 / 16.0, 1.0 / 16.0];

/// ITU-R BT.601 luminance coefficient for the red channel.
pub const LUMINANCE_R: f32 = 0.299;

/// ITU-R BT.601 luminance coefficient for the green channel.
pub const LUMINANCE_G: f32 = 0.587;

/// ITU-R BT.601 luminance coefficient for the blue channel.
pub const LUMINANCE_B: f32 = 0.114;

/// Default number of frames kept around the best-focus frame.
pub const DEFAULT_WINDOW_SIZE: usize = 8;

/// Default side length (odd) of the neighbourhood used by fusion statistics.
pub const DEFAULT_FUSION_KERNEL_SIZE: usize = 5;

/// Default side length of the square crop scored around a point of interest.
pub const DEFAULT_REGION_SIZE: usize = 100;

/// Fraction of the magnitude spectrum dropped from every edge before averaging.
/// The unshifted spectrum keeps DC and the lowest frequencies along its edges.
pub const SPECTRUM_EDGE_FRACTION: f64 = 0.05;

/// Smallest side length the coarsest level may have when the pyramid depth is
/// chosen automatically.
pub const MIN_PYRAMID_LEVEL_SIZE: usize = 8;

/// Number of histogram bins for local entropy.
pub const ENTROPY_HISTOGRAM_BINS: usize = 256;
