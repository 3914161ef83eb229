//! Local focus statistics over a square neighbourhood.

use ndarray::Array2;

use crate::consts::ENTROPY_HISTOGRAM_BINS;
use crate::filters::convolve::{binomial_kernel, box_kernel, convolve_separable};
use crate::pipeline::config::FocusMeasure;

/// Compute `kind` over `data`. `is_base` selects the quantisation range used
/// by entropy: [0, 1] for a Gaussian base, [-1, 1] for band-pass detail.
pub fn compute(
    data: &Array2<f64>,
    kind: FocusMeasure,
    kernel_size: usize,
    is_base: bool,
) -> Array2<f64> {
    match kind {
        FocusMeasure::RegionEnergy => region_energy(data, kernel_size),
        FocusMeasure::Deviation => local_deviation(data, kernel_size),
        FocusMeasure::Entropy => {
            let range = if is_base { (0.0, 1.0) } else { (-1.0, 1.0) };
            local_entropy(data, kernel_size, range)
        }
    }
}

/// Squared values smoothed with a normalised binomial kernel.
pub fn region_energy(data: &Array2<f64>, kernel_size: usize) -> Array2<f64> {
    let squared = data.mapv(|v| v * v);
    convolve_separable(&squared, &binomial_kernel(kernel_size))
}

/// Variance of the values in each `kernel_size` x `kernel_size` window.
pub fn local_deviation(data: &Array2<f64>, kernel_size: usize) -> Array2<f64> {
    let kernel = box_kernel(kernel_size);
    let mean = convolve_separable(data, &kernel);
    let mean_sq = convolve_separable(&data.mapv(|v| v * v), &kernel);
    let mut var = mean_sq - mean.mapv(|m| m * m);
    var.mapv_inplace(|v| v.max(0.0));
    var
}

/// Sum over each window of `-p(v) ln p(v)`, where `p` is the frequency of a
/// pixel's quantised value across the whole image.
pub fn local_entropy(data: &Array2<f64>, kernel_size: usize, range: (f64, f64)) -> Array2<f64> {
    let bins = quantize(data, range);
    let total = bins.len().max(1) as f64;

    let mut histogram = vec![0usize; ENTROPY_HISTOGRAM_BINS];
    for &b in bins.iter() {
        histogram[b] += 1;
    }
    let information: Vec<f64> = histogram
        .iter()
        .map(|&count| {
            let p = count as f64 / total;
            if p > 0.0 {
                -p * p.ln()
            } else {
                0.0
            }
        })
        .collect();

    let per_pixel = bins.mapv(|b| information[b]);
    let window = (kernel_size * kernel_size) as f64;
    convolve_separable(&per_pixel, &box_kernel(kernel_size)) * window
}

fn quantize(data: &Array2<f64>, (lo, hi): (f64, f64)) -> Array2<usize> {
    let top = (ENTROPY_HISTOGRAM_BINS - 1) as f64;
    let span = hi - lo;
    data.mapv(|v| {
        let t = ((v - lo) / span).clamp(0.0, 1.0);
        (t * top).round() as usize
    })
}
