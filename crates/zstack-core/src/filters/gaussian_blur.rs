use ndarray::Array2;

use crate::frame::Frame;

use super::convolve::{convolve_separable, gaussian_kernel};

/// Apply Gaussian blur to a frame using separable 1D convolution.
pub fn gaussian_blur(frame: &Frame, sigma: f32) -> Frame {
    let blurred = gaussian_blur_array(&frame.data, sigma);
    Frame {
        data: blurred,
        original_bit_depth: frame.original_bit_depth,
        metadata: frame.metadata.clone(),
    }
}

/// Apply Gaussian blur to a raw array. `sigma <= 0` returns a copy.
pub fn gaussian_blur_array(data: &Array2<f32>, sigma: f32) -> Array2<f32> {
    if sigma <= 0.0 {
        return data.clone();
    }
    let kernel = gaussian_kernel(sigma as f64);
    convolve_separable(&data.mapv(|v| v as f64), &kernel).mapv(|v| v as f32)
}
