mod common;

use ndarray::Array2;

use zstack_core::error::ZStackError;
use zstack_core::pyramid::{
    auto_depth, build_pyramid, collapse_bands, max_depth, FusedPyramid, Pyramid,
};

use common::texture;

#[test]
fn test_level_dimensions_round_up() {
    let p = build_pyramid(&texture(37, 50, 1), 4).unwrap();
    assert_eq!(p.depth(), 4);
    assert_eq!(p.shape(), vec![(37, 50), (19, 25), (10, 13), (5, 7)]);
    assert!(p.base().unwrap().is_base);
    assert!(!p.levels[0].is_base);
}

#[test]
fn test_reconstruction_is_exact() {
    for &(h, w) in &[(64, 64), (37, 50), (33, 17), (9, 9)] {
        let data = texture(h, w, (h * w) as u64);
        let p = build_pyramid(&data, 5).unwrap();
        let rebuilt = p.reconstruct().unwrap();
        let err = rebuilt
            .iter()
            .zip(data.iter())
            .map(|(&a, &b)| (a - b as f64).abs())
            .fold(0.0, f64::max);
        assert!(err < 1e-9, "{h}x{w}: max error {err}");
    }
}

#[test]
fn test_base_band_is_gaussian() {
    let p = build_pyramid(&texture(32, 32, 2), 3).unwrap();
    let base = p.base().unwrap();
    assert_eq!(base.band, base.gaussian);
}

#[test]
fn test_depth_one_is_the_image() {
    let data = texture(10, 12, 4);
    let p = build_pyramid(&data, 1).unwrap();
    assert_eq!(p.depth(), 1);
    assert_eq!(p.levels[0].band, data.mapv(|v| v as f64));
}

#[test]
fn test_depth_capped_at_single_pixel() {
    assert_eq!(max_depth(4, 4), 3);
    assert_eq!(max_depth(1, 1), 1);
    assert_eq!(max_depth(5, 2), 4);

    let p = build_pyramid(&texture(4, 4, 9), 10).unwrap();
    assert_eq!(p.depth(), 3);
    assert_eq!(p.base().unwrap().dim(), (1, 1));
}

#[test]
fn test_auto_depth_keeps_coarsest_level_usable() {
    assert_eq!(auto_depth(64, 64), 4);
    assert_eq!(auto_depth(1024, 768), 7);
    assert_eq!(auto_depth(5, 5), 1);
    assert_eq!(auto_depth(15, 200), 2);
}

#[test]
fn test_invalid_pyramids_are_rejected() {
    assert!(build_pyramid(&texture(8, 8, 1), 0).is_err());
    assert!(build_pyramid(&Array2::<f32>::zeros((0, 8)), 3).is_err());
}

#[test]
fn test_collapse_of_single_band_is_identity() {
    let band = Array2::from_shape_fn((3, 4), |(r, c)| (r * 4 + c) as f64);
    assert_eq!(collapse_bands(&[&band]).unwrap(), band);
}

#[test]
fn test_constant_image_has_flat_bands() {
    let p = build_pyramid(&Array2::from_elem((20, 24), 0.4f32), 4).unwrap();
    for level in &p.levels[..3] {
        assert!(level.band.iter().all(|v| v.abs() < 1e-12));
    }
    assert!(p.base().unwrap().band.iter().all(|v| (v - 0.4).abs() < 1e-6));
}

#[test]
fn test_empty_pyramids_do_not_collapse() {
    assert!(matches!(
        collapse_bands(&[]),
        Err(ZStackError::InvalidInput(_))
    ));

    let fused = FusedPyramid { levels: vec![] };
    assert!(matches!(
        fused.collapse(),
        Err(ZStackError::InvalidInput(_))
    ));

    let empty = Pyramid { levels: vec![] };
    assert!(empty.base().is_none());
    assert!(empty.reconstruct().is_err());
}
