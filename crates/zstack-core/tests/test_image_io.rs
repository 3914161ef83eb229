mod common;

use std::path::PathBuf;

use ndarray::Array2;

use zstack_core::error::ZStackError;
use zstack_core::frame::{ColorFrame, Composite, Frame};
use zstack_core::io::image_io::{
    collect_image_paths, image_dimensions, load_color_image, load_image, save_color_png,
    save_png, save_tiff, ImageFileSource,
};
use zstack_core::pipeline::config::{CompositeConfig, PipelineConfig};
use zstack_core::pipeline::{run_pipeline, NoOpReporter};
use zstack_core::quality::FrameSource;

use common::{disc_stack, max_abs_diff, texture};

#[test]
fn test_save_load_roundtrip_tiff() {
    let mut data = Array2::<f32>::zeros((4, 4));
    data[[0, 1]] = 0.5;
    data[[1, 0]] = 1.0;
    data[[2, 3]] = 0.25;
    let frame = Frame::new(data, 16);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.tiff");

    save_tiff(&frame, &path).unwrap();
    let loaded = load_image(&path).unwrap();

    assert_eq!(loaded.width(), 4);
    assert_eq!(loaded.height(), 4);
    assert_eq!(loaded.metadata.source.as_deref(), Some(path.as_path()));
    assert!((loaded.data[[0, 0]] - 0.0).abs() < 1e-4);
    assert!((loaded.data[[0, 1]] - 0.5).abs() < 1e-3);
    assert!((loaded.data[[1, 0]] - 1.0).abs() < 1e-4);
    assert!((loaded.data[[2, 3]] - 0.25).abs() < 1e-3);
}

#[test]
fn test_color_png_roundtrip() {
    let color = ColorFrame {
        red: Frame::new(Array2::from_elem((3, 5), 1.0), 8),
        green: Frame::new(Array2::from_elem((3, 5), 0.0), 8),
        blue: Frame::new(Array2::from_elem((3, 5), 0.5), 8),
    };

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("color.png");
    save_color_png(&color, &path).unwrap();

    let loaded = load_color_image(&path).unwrap();
    assert_eq!((loaded.height(), loaded.width()), (3, 5));
    assert!((loaded.red.data[[1, 1]] - 1.0).abs() < 1e-3);
    assert!(loaded.green.data[[1, 1]].abs() < 1e-3);
    assert!((loaded.blue.data[[1, 1]] - 0.5).abs() < 1e-2);
}

#[test]
fn test_collect_sorts_directory_entries() {
    let dir = tempfile::tempdir().unwrap();
    let frame = Frame::new(texture(8, 8, 1), 8);
    for name in ["slice_02.png", "slice_00.png", "slice_01.png"] {
        save_png(&frame, &dir.path().join(name)).unwrap();
    }
    std::fs::write(dir.path().join("notes.txt"), "not an image").unwrap();

    let paths = collect_image_paths(&[dir.path().to_path_buf()]).unwrap();
    let names: Vec<_> = paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, ["slice_00.png", "slice_01.png", "slice_02.png"]);
}

#[test]
fn test_collect_rejects_empty_input() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        collect_image_paths(&[dir.path().to_path_buf()]),
        Err(ZStackError::InvalidInput(_))
    ));
}

#[test]
fn test_file_source_tags_frame_index() {
    let dir = tempfile::tempdir().unwrap();
    let paths: Vec<PathBuf> = (0..3)
        .map(|i| {
            let path = dir.path().join(format!("{i}.png"));
            save_png(&Frame::new(texture(6, 6, i), 8), &path).unwrap();
            path
        })
        .collect();

    let source = ImageFileSource::mono(paths);
    assert_eq!(source.len(), 3);
    assert_eq!(source.load(2).unwrap().metadata.frame_index, 2);
    assert!(source.load(3).is_err());
}

#[test]
fn test_missing_file_reports_its_index() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("good.png");
    save_png(&Frame::new(texture(16, 16, 1), 8), &good).unwrap();
    let paths = vec![good.clone(), dir.path().join("missing.png"), good];

    let config = PipelineConfig {
        inputs: paths,
        output: dir.path().join("out.png"),
        color: false,
        composite: CompositeConfig::default(),
    };
    match run_pipeline(&config, &NoOpReporter) {
        Err(ZStackError::WorkerFailure { index, .. }) => assert_eq!(index, 1),
        other => panic!("expected WorkerFailure, got {:?}", other.map(|(_, r)| r)),
    }
}

#[test]
fn test_odd_sized_frame_outside_window_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut inputs: Vec<PathBuf> = disc_stack(9, 1, 32)
        .iter()
        .map(|frame| {
            let path = dir
                .path()
                .join(format!("f{:02}.png", frame.metadata.frame_index));
            save_png(frame, &path).unwrap();
            path
        })
        .collect();
    let odd = dir.path().join("f09.png");
    save_png(&Frame::new(texture(20, 24, 3), 8), &odd).unwrap();
    inputs.push(odd);

    let output = dir.path().join("out.png");
    let config = PipelineConfig {
        inputs,
        output: output.clone(),
        color: false,
        composite: CompositeConfig {
            window_size: 4,
            ..Default::default()
        },
    };
    assert!(matches!(
        run_pipeline(&config, &NoOpReporter),
        Err(ZStackError::InvalidInput(_))
    ));
    assert!(!output.exists());
}

#[test]
fn test_header_dimensions_match_decoded_frame() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dims.tiff");
    save_tiff(&Frame::new(texture(7, 11, 1), 16), &path).unwrap();
    assert_eq!(image_dimensions(&path).unwrap(), (7, 11));
}

#[test]
fn test_run_pipeline_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let input_dir = dir.path().join("stack");
    std::fs::create_dir(&input_dir).unwrap();
    for frame in disc_stack(5, 2, 32) {
        let path = input_dir.join(format!("z{:02}.tiff", frame.metadata.frame_index));
        save_tiff(&frame, &path).unwrap();
    }

    let output = dir.path().join("composite.tiff");
    let config = PipelineConfig {
        inputs: vec![input_dir],
        output: output.clone(),
        color: false,
        composite: CompositeConfig {
            window_size: 4,
            ..Default::default()
        },
    };
    let (composite, report) = run_pipeline(&config, &NoOpReporter).unwrap();

    assert!(output.exists());
    assert_eq!(report.scores.len(), 5);
    assert_eq!(report.window.best, 2);
    assert_eq!(report.window.len(), 4);
    assert!(matches!(composite, Composite::Mono(_)));

    let saved = load_image(&output).unwrap();
    assert_eq!((saved.width(), saved.height()), (32, 32));
    assert!(max_abs_diff(&saved.data, &composite.to_mono().data) < 1e-3);
}

#[test]
fn test_run_pipeline_color() {
    let dir = tempfile::tempdir().unwrap();
    let mut inputs = Vec::new();
    for frame in disc_stack(3, 1, 16) {
        let path = dir.path().join(format!("c{}.png", frame.metadata.frame_index));
        let color = ColorFrame {
            red: frame.clone(),
            green: frame.clone(),
            blue: frame,
        };
        save_color_png(&color, &path).unwrap();
        inputs.push(path);
    }

    let config = PipelineConfig {
        inputs,
        output: dir.path().join("out.png"),
        color: true,
        composite: CompositeConfig::default(),
    };
    let (composite, _) = run_pipeline(&config, &NoOpReporter).unwrap();
    match composite {
        Composite::Color(c) => assert_eq!(c.width(), 16),
        Composite::Mono(_) => panic!("color run produced a mono composite"),
    }
}
