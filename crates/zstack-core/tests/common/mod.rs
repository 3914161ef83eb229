#![allow(dead_code)]

use ndarray::Array2;

use zstack_core::filters::gaussian_blur::gaussian_blur_array;
use zstack_core::frame::{ColorFrame, Frame};

/// One-pixel checkerboard of 0.0 and 1.0.
pub fn checkerboard(h: usize, w: usize) -> Array2<f32> {
    Array2::from_shape_fn((h, w), |(r, c)| if (r + c) % 2 == 0 { 1.0 } else { 0.0 })
}

/// Deterministic pseudo-random texture in [0, 1].
pub fn texture(h: usize, w: usize, seed: u64) -> Array2<f32> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    Array2::from_shape_fn((h, w), |_| {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((state >> 33) as f32) / (u32::MAX >> 1) as f32
    })
}

/// Bright disc on a dark background with a hard edge.
pub fn disc(size: usize, radius: f32) -> Array2<f32> {
    let centre = size as f32 / 2.0;
    Array2::from_shape_fn((size, size), |(r, c)| {
        let dr = r as f32 + 0.5 - centre;
        let dc = c as f32 + 0.5 - centre;
        if (dr * dr + dc * dc).sqrt() <= radius {
            0.8
        } else {
            0.1
        }
    })
}

/// `n` frames of the same disc, frame `sharpest` unblurred and the others
/// blurred more the further they are from it.
pub fn disc_stack(n: usize, sharpest: usize, size: usize) -> Vec<Frame> {
    let sharp = disc(size, size as f32 * 0.25);
    (0..n)
        .map(|i| {
            let sigma = sharpest.abs_diff(i) as f32 * 0.8;
            Frame::new(gaussian_blur_array(&sharp, sigma), 16).with_index(i)
        })
        .collect()
}

pub fn gray_color(frame: &Frame) -> ColorFrame {
    ColorFrame {
        red: frame.clone(),
        green: frame.clone(),
        blue: frame.clone(),
    }
}

pub fn mean_abs_diff(a: &Array2<f32>, b: &Array2<f32>) -> f64 {
    assert_eq!(a.dim(), b.dim());
    let sum: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(&x, &y)| (x as f64 - y as f64).abs())
        .sum();
    sum / a.len() as f64
}

pub fn max_abs_diff(a: &Array2<f32>, b: &Array2<f32>) -> f32 {
    assert_eq!(a.dim(), b.dim());
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| (x - y).abs())
        .fold(0.0, f32::max)
}
