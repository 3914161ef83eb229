use ndarray::Array2;

use crate::consts::B3_KERNEL;
use crate::filters::convolve::convolve_separable;

/// Blur with the B3 kernel and keep every other row and column.
///
/// Output is `ceil(h/2)` x `ceil(w/2)`.
pub fn reduce(data: &Array2<f64>) -> Array2<f64> {
    let (h, w) = data.dim();
    let blurred = convolve_separable(data, &B3_KERNEL);
    Array2::from_shape_fn((h.div_ceil(2), w.div_ceil(2)), |(r, c)| blurred[[2 * r, 2 * c]])
}

/// Zero-insert `data` into an image of exactly `dim` and interpolate with the
/// B3 kernel scaled by 2 on each axis.
///
/// `dim` is the size of the finer level, so odd sizes are honoured exactly
/// instead of producing a one-pixel mismatch.
pub fn expand(data: &Array2<f64>, dim: (usize, usize)) -> Array2<f64> {
    let (h, w) = dim;
    let (sh, sw) = data.dim();
    let mut up = Array2::<f64>::zeros((h, w));

    for r in 0..sh.min(h.div_ceil(2)) {
        for c in 0..sw.min(w.div_ceil(2)) {
            up[[2 * r, 2 * c]] = data[[r, c]];
        }
    }

    let kernel = B3_KERNEL.map(|k| 2.0 * k);
    convolve_separable(&up, &kernel)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduce_rounds_odd_sizes_up() {
        let data = Array2::<f64>::zeros((7, 10));
        assert_eq!(reduce(&data).dim(), (4, 5));
    }

    #[test]
    fn expand_hits_requested_size() {
        let data = Array2::<f64>::from_elem((4, 5), 1.0);
        assert_eq!(expand(&data, (7, 9)).dim(), (7, 9));
        assert_eq!(expand(&data, (8, 10)).dim(), (8, 10));
    }

    #[test]
    fn expand_of_constant_is_constant_in_interior() {
        let data = Array2::<f64>::from_elem((8, 8), 0.5);
        let up = expand(&data, (16, 16));
        for r in 2..14 {
            for c in 2..14 {
                assert!((up[[r, c]] - 0.5).abs() < 1e-12, "({r}, {c}) = {}", up[[r, c]]);
            }
        }
    }
}
