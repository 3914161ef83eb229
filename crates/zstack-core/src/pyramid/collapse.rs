use ndarray::Array2;

use crate::error::{Result, ZStackError};

use super::resample::expand;

/// Rebuild a full-resolution image from bands ordered finest first.
///
/// Starting at the coarsest band, the running image is expanded to the next
/// finer band's exact size and that band is added. Values are not clipped.
pub fn collapse_bands(bands: &[&Array2<f64>]) -> Result<Array2<f64>> {
    let (coarsest, finer) = bands.split_last().ok_or_else(|| {
        ZStackError::InvalidInput("cannot collapse a pyramid with no levels".into())
    })?;

    let mut acc = (*coarsest).clone();
    for band in finer.iter().rev() {
        acc = expand(&acc, band.dim());
        acc += *band;
    }
    Ok(acc)
}

/// Collapse and clip into the [0, 1] pixel range of a `Frame`.
pub fn collapse_clipped(bands: &[&Array2<f64>]) -> Result<Array2<f32>> {
    Ok(collapse_bands(bands)?.mapv(|v| v.clamp(0.0, 1.0) as f32))
}
