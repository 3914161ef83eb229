pub mod convolve;
pub mod gaussian_blur;
