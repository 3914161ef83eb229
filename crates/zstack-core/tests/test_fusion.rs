mod common;

use zstack_core::filters::gaussian_blur::gaussian_blur_array;
use zstack_core::pipeline::config::{BaseFusion, FocusMeasure};
use zstack_core::pyramid::fuse::LevelSelection;
use zstack_core::pyramid::{
    apply_fusion_map, build_pyramid, fuse_pyramids, fusion_map, FusionParams,
};

use common::{checkerboard, max_abs_diff, texture};

fn params(band_metric: FocusMeasure, base_fusion: BaseFusion) -> FusionParams {
    FusionParams {
        kernel_size: 5,
        band_metric,
        base_fusion,
    }
}

#[test]
fn test_identical_pyramids_fuse_to_the_input() {
    let data = texture(40, 36, 21);
    let pyramids = vec![
        build_pyramid(&data, 4).unwrap(),
        build_pyramid(&data, 4).unwrap(),
        build_pyramid(&data, 4).unwrap(),
    ];

    for metric in [
        FocusMeasure::RegionEnergy,
        FocusMeasure::Deviation,
        FocusMeasure::Entropy,
    ] {
        for base in [
            BaseFusion::Deviation,
            BaseFusion::Entropy,
            BaseFusion::EntropyDeviation,
        ] {
            let fused = fuse_pyramids(&pyramids, &params(metric, base)).unwrap();
            assert_eq!(fused.depth(), 4);
            let out = fused.collapse().unwrap();
            assert!(
                max_abs_diff(&out, &data) < 1e-5,
                "{metric} / {base} changed an identical stack"
            );
        }
    }
}

#[test]
fn test_ties_pick_first_source() {
    let data = texture(24, 24, 4);
    let pyramids = vec![
        build_pyramid(&data, 3).unwrap(),
        build_pyramid(&data, 3).unwrap(),
    ];
    let map = fusion_map(
        &pyramids,
        &params(FocusMeasure::RegionEnergy, BaseFusion::Deviation),
    )
    .unwrap();

    assert_eq!(map.levels.len(), 3);
    for level in &map.levels {
        match level {
            LevelSelection::Single(idx) => assert!(idx.iter().all(|&i| i == 0)),
            LevelSelection::Blend(..) => panic!("deviation base must not blend"),
        }
    }
}

#[test]
fn test_sharp_frame_wins_everywhere() {
    let sharp = checkerboard(32, 32);
    let blurred = gaussian_blur_array(&sharp, 2.0);

    for order in [[&sharp, &blurred], [&blurred, &sharp]] {
        let pyramids: Vec<_> = order
            .iter()
            .map(|d| build_pyramid(d, 4).unwrap())
            .collect();
        let fused = fuse_pyramids(
            &pyramids,
            &params(FocusMeasure::RegionEnergy, BaseFusion::Deviation),
        )
        .unwrap();
        let out = fused.collapse().unwrap();
        let err = max_abs_diff(&out, &sharp);
        assert!(err < 1e-4, "composite strays from the sharp frame by {err}");
    }
}

#[test]
fn test_entropy_deviation_blends_base_only() {
    let pyramids = vec![
        build_pyramid(&texture(16, 16, 1), 3).unwrap(),
        build_pyramid(&texture(16, 16, 2), 3).unwrap(),
    ];
    let map = fusion_map(
        &pyramids,
        &params(FocusMeasure::Deviation, BaseFusion::EntropyDeviation),
    )
    .unwrap();

    assert!(matches!(map.levels[0], LevelSelection::Single(_)));
    assert!(matches!(map.levels[1], LevelSelection::Single(_)));
    assert!(matches!(map.levels[2], LevelSelection::Blend(..)));
}

#[test]
fn test_map_applies_to_matching_pyramids_only() {
    let a = vec![
        build_pyramid(&texture(16, 16, 1), 3).unwrap(),
        build_pyramid(&texture(16, 16, 2), 3).unwrap(),
    ];
    let map = fusion_map(
        &a,
        &params(FocusMeasure::RegionEnergy, BaseFusion::Deviation),
    )
    .unwrap();
    assert_eq!(apply_fusion_map(&a, &map).unwrap().depth(), 3);

    let shallow = vec![
        build_pyramid(&texture(16, 16, 1), 2).unwrap(),
        build_pyramid(&texture(16, 16, 2), 2).unwrap(),
    ];
    assert!(apply_fusion_map(&shallow, &map).is_err());
}

#[test]
fn test_mismatched_pyramids_are_rejected() {
    let pyramids = vec![
        build_pyramid(&texture(16, 16, 1), 3).unwrap(),
        build_pyramid(&texture(18, 16, 2), 3).unwrap(),
    ];
    let p = params(FocusMeasure::RegionEnergy, BaseFusion::Deviation);
    assert!(fuse_pyramids(&pyramids, &p).is_err());
    assert!(fuse_pyramids(&[], &p).is_err());
}

#[test]
fn test_measure_cache_respects_kernel_size() {
    let p = build_pyramid(&texture(20, 20, 8), 2).unwrap();
    let level = &p.levels[0];
    let small = level.measure(FocusMeasure::RegionEnergy, 3).into_owned();
    let large = level.measure(FocusMeasure::RegionEnergy, 7).into_owned();
    let again = level.measure(FocusMeasure::RegionEnergy, 3).into_owned();
    assert_ne!(small, large);
    assert_eq!(small, again);
}
