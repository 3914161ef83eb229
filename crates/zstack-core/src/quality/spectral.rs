//! Frequency-domain sharpness metric.
//!
//! The frame is zero-padded to an FFT-friendly size, transformed, and the mean
//! magnitude of the spectrum is taken after dropping a margin from every edge.
//! In the unshifted spectrum those edges carry DC, the lowest spatial
//! frequencies and most of the leakage from the image border, so the remaining
//! interior measures high-frequency content.

use std::sync::Arc;

use ndarray::{s, Array2, ArrayView2};
use num_complex::Complex;
use rayon::prelude::*;
use rustfft::{Fft, FftPlanner};

use crate::consts::{PARALLEL_PIXEL_THRESHOLD, SPECTRUM_EDGE_FRACTION};
use crate::error::{Result, ZStackError};
use crate::frame::{Frame, Point};

/// Spectral sharpness of a whole frame.
pub fn sharpness(frame: &Frame) -> Result<f64> {
    sharpness_array(&frame.data.view())
}

/// Spectral sharpness of a raw array. Higher means sharper.
pub fn sharpness_array(data: &ArrayView2<f32>) -> Result<f64> {
    let (h, w) = data.dim();
    if h == 0 || w == 0 {
        return Err(ZStackError::InvalidInput(format!(
            "cannot score a {w}x{h} image"
        )));
    }

    let padded = pad_to(data, fast_fft_len(h), fast_fft_len(w));
    let spectrum = fft2d_forward(&padded);
    let (ph, pw) = spectrum.dim();

    let mr = (ph as f64 * SPECTRUM_EDGE_FRACTION).floor() as usize;
    let mc = (pw as f64 * SPECTRUM_EDGE_FRACTION).floor() as usize;
    let interior = spectrum.slice(s![mr..ph - mr, mc..pw - mc]);

    let count = interior.len() as f64;
    let sum: f64 = interior.iter().map(|c| c.norm()).sum();
    Ok(sum / count)
}

/// Spectral sharpness of a `size`x`size` square centred on `point`.
///
/// The square is clipped to the image bounds. Points outside the image are
/// rejected.
pub fn region_sharpness(data: &Array2<f32>, point: Point, size: usize) -> Result<f64> {
    let region = crop_region(data, point, size)?;
    sharpness_array(&region)
}

/// Clip a square of side `size` centred on `point` to the image bounds.
pub fn crop_region(data: &Array2<f32>, point: Point, size: usize) -> Result<ArrayView2<'_, f32>> {
    let (h, w) = data.dim();
    if size == 0 {
        return Err(ZStackError::InvalidInput("region size must be positive".into()));
    }
    if point.row >= h || point.col >= w {
        return Err(ZStackError::InvalidInput(format!(
            "point ({}, {}) lies outside the {w}x{h} frame",
            point.row, point.col
        )));
    }

    let half = size / 2;
    let r0 = point.row.saturating_sub(half);
    let c0 = point.col.saturating_sub(half);
    let r1 = (point.row + size - half).min(h);
    let c1 = (point.col + size - half).min(w);

    Ok(data.slice(s![r0..r1, c0..c1]))
}

/// Smallest `n' >= n` whose only prime factors are 2, 3 and 5.
pub fn fast_fft_len(n: usize) -> usize {
    let mut candidate = n.max(1);
    loop {
        let mut m = candidate;
        for p in [2, 3, 5] {
            while m % p == 0 {
                m /= p;
            }
        }
        if m == 1 {
            return candidate;
        }
        candidate += 1;
    }
}

fn pad_to(data: &ArrayView2<f32>, h: usize, w: usize) -> Array2<Complex<f64>> {
    let mut out = Array2::<Complex<f64>>::zeros((h, w));
    out.slice_mut(s![..data.nrows(), ..data.ncols()])
        .zip_mut_with(data, |o, &v| *o = Complex::new(v as f64, 0.0));
    out
}

/// 2D forward FFT: row-wise FFT, then column-wise FFT.
fn fft2d_forward(input: &Array2<Complex<f64>>) -> Array2<Complex<f64>> {
    let (h, w) = input.dim();
    let mut planner = FftPlanner::new();
    let fft_row = planner.plan_fft_forward(w);
    let fft_col = planner.plan_fft_forward(h);

    let mut result = input.clone();
    let parallel = h * w >= PARALLEL_PIXEL_THRESHOLD;
    transform_rows(&mut result, &fft_row, parallel);

    let mut transposed = result.reversed_axes().as_standard_layout().into_owned();
    transform_rows(&mut transposed, &fft_col, parallel);
    transposed.reversed_axes()
}

fn transform_rows(data: &mut Array2<Complex<f64>>, fft: &Arc<dyn Fft<f64>>, parallel: bool) {
    let w = data.ncols();
    let process = |mut row: ndarray::ArrayViewMut1<Complex<f64>>| {
        let mut buf: Vec<Complex<f64>> = row.to_vec();
        fft.process(&mut buf);
        for (dst, src) in row.iter_mut().zip(buf) {
            *dst = src;
        }
    };

    if parallel && w > 0 {
        data.axis_iter_mut(ndarray::Axis(0))
            .into_par_iter()
            .for_each(process);
    } else {
        data.axis_iter_mut(ndarray::Axis(0)).for_each(process);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fast_len_is_five_smooth() {
        assert_eq!(fast_fft_len(1), 1);
        assert_eq!(fast_fft_len(7), 8);
        assert_eq!(fast_fft_len(11), 12);
        assert_eq!(fast_fft_len(97), 100);
        assert_eq!(fast_fft_len(128), 128);
    }

    #[test]
    fn fft_of_impulse_is_flat() {
        let mut data = Array2::<Complex<f64>>::zeros((6, 10));
        data[[0, 0]] = Complex::new(1.0, 0.0);
        let spectrum = fft2d_forward(&data);
        for c in spectrum.iter() {
            assert!((c.norm() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn fft_dc_term_is_sum() {
        let data = Array2::from_elem((4, 5), Complex::new(0.5, 0.0));
        let spectrum = fft2d_forward(&data);
        assert!((spectrum[[0, 0]].re - 10.0).abs() < 1e-12);
        assert!(spectrum[[1, 2]].norm() < 1e-12);
    }
}
