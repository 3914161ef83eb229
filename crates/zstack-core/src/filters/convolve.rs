//! Separable 2D convolution on `f64` arrays with mirrored borders.
//!
//! Every pyramid and fusion filter in the crate is separable, so a 1D kernel
//! is applied along rows and then along columns.

use ndarray::{Array2, Axis};
use rayon::prelude::*;

use crate::consts::PARALLEL_PIXEL_THRESHOLD;

/// Convolve rows then columns with the same odd-length 1D kernel.
pub fn convolve_separable(data: &Array2<f64>, kernel: &[f64]) -> Array2<f64> {
    let row_pass = convolve_rows(data, kernel);
    convolve_cols(&row_pass, kernel)
}

/// Normalised Gaussian kernel of radius `ceil(3 * sigma)`.
pub fn gaussian_kernel(sigma: f64) -> Vec<f64> {
    let radius = (sigma * 3.0).ceil().max(0.0) as usize;
    let s2 = 2.0 * sigma * sigma;
    let mut kernel: Vec<f64> = (0..2 * radius + 1)
        .map(|i| {
            let x = i as f64 - radius as f64;
            if s2 > 0.0 {
                (-x * x / s2).exp()
            } else {
                1.0
            }
        })
        .collect();
    normalize(&mut kernel);
    kernel
}

/// Normalised binomial kernel with `size` taps (row `size - 1` of Pascal's
/// triangle). `size = 3` gives `[1, 2, 1] / 4`, `size = 5` gives
/// `[1, 4, 6, 4, 1] / 16`.
pub fn binomial_kernel(size: usize) -> Vec<f64> {
    let size = size.max(1);
    let mut kernel = vec![1.0f64];
    for _ in 1..size {
        let mut next = vec![1.0f64; kernel.len() + 1];
        for i in 1..kernel.len() {
            next[i] = kernel[i - 1] + kernel[i];
        }
        kernel = next;
    }
    normalize(&mut kernel);
    kernel
}

/// Uniform averaging kernel with `size` taps.
pub fn box_kernel(size: usize) -> Vec<f64> {
    let size = size.max(1);
    vec![1.0 / size as f64; size]
}

fn normalize(kernel: &mut [f64]) {
    let sum: f64 = kernel.iter().sum();
    if sum > 0.0 {
        for v in kernel.iter_mut() {
            *v /= sum;
        }
    }
}

fn convolve_rows(data: &Array2<f64>, kernel: &[f64]) -> Array2<f64> {
    let (h, w) = data.dim();
    let radius = kernel.len() / 2;
    let mut result = Array2::<f64>::zeros((h, w));

    let fill_row = |row: usize, mut out: ndarray::ArrayViewMut1<f64>| {
        for col in 0..w {
            let mut sum = 0.0f64;
            for (ki, &kv) in kernel.iter().enumerate() {
                let src_col = mirror_index(col as isize + ki as isize - radius as isize, w);
                sum += data[[row, src_col]] * kv;
            }
            out[col] = sum;
        }
    };

    if h * w >= PARALLEL_PIXEL_THRESHOLD {
        result
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .for_each(|(row, out)| fill_row(row, out));
    } else {
        for (row, out) in result.axis_iter_mut(Axis(0)).enumerate() {
            fill_row(row, out);
        }
    }

    result
}

fn convolve_cols(data: &Array2<f64>, kernel: &[f64]) -> Array2<f64> {
    let (h, w) = data.dim();
    let radius = kernel.len() / 2;
    let mut result = Array2::<f64>::zeros((h, w));

    let fill_row = |row: usize, mut out: ndarray::ArrayViewMut1<f64>| {
        for col in 0..w {
            let mut sum = 0.0f64;
            for (ki, &kv) in kernel.iter().enumerate() {
                let src_row = mirror_index(row as isize + ki as isize - radius as isize, h);
                sum += data[[src_row, col]] * kv;
            }
            out[col] = sum;
        }
    };

    if h * w >= PARALLEL_PIXEL_THRESHOLD {
        result
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .for_each(|(row, out)| fill_row(row, out));
    } else {
        for (row, out) in result.axis_iter_mut(Axis(0)).enumerate() {
            fill_row(row, out);
        }
    }

    result
}

/// Mirror boundary handling without repeating the edge sample:
/// `-1 -> 1` and `size -> size - 2`. Period is `2 * (size - 1)`.
pub fn mirror_index(idx: isize, size: usize) -> usize {
    if size <= 1 {
        return 0;
    }
    let period = 2 * (size - 1);
    let m = idx.unsigned_abs() % period;

    if m < size {
        m
    } else {
        period - m
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binomial_kernel_matches_pascal_row() {
        let k = binomial_kernel(5);
        let expected = [1.0, 4.0, 6.0, 4.0, 1.0].map(|v| v / 16.0);
        for (a, b) in k.iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-15);
        }
    }

    #[test]
    fn convolution_preserves_constant_image() {
        let data = Array2::from_elem((7, 9), 0.25);
        let out = convolve_separable(&data, &gaussian_kernel(1.5));
        for v in out.iter() {
            assert!((v - 0.25).abs() < 1e-12, "got {v}");
        }
    }

    #[test]
    fn mirror_index_reflects_both_edges() {
        assert_eq!(mirror_index(-1, 5), 1);
        assert_eq!(mirror_index(-2, 5), 2);
        assert_eq!(mirror_index(5, 5), 3);
        assert_eq!(mirror_index(6, 5), 2);
        assert_eq!(mirror_index(9, 5), 1);
        assert_eq!(mirror_index(3, 1), 0);
    }
}
