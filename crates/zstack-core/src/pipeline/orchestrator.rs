use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use tracing::{debug, info};

use crate::error::{Result, ZStackError};
use crate::frame::{ColorFrame, Composite, Frame, SharpnessScore};
use crate::io::image_io::{
    collect_image_paths, image_dimensions, load_color_image, load_image, save_composite,
    ImageFileSource,
};
use crate::pool::WorkerPool;
use crate::pyramid::{
    apply_fusion_map, auto_depth, build_pyramid, fuse_pyramids, fusion_map, FusionParams, Pyramid,
};
use crate::quality::{score_frames_with_progress, score_source, FrameSource};
use crate::select::{select_window, FrameWindow};

use super::config::{CompositeConfig, PipelineConfig};
use super::types::{CompositeReport, NoOpReporter, PipelineStage, ProgressReporter};

/// Merge a focal stack into one all-in-focus frame.
///
/// Frames must be in z order, at least 2, with identical dimensions.
pub fn composite(frames: &[Frame], config: &CompositeConfig) -> Result<Frame> {
    composite_with_report(frames, config, &NoOpReporter).map(|(frame, _)| frame)
}

/// [`composite`] with progress reporting.
pub fn composite_reported(
    frames: &[Frame],
    config: &CompositeConfig,
    reporter: &dyn ProgressReporter,
) -> Result<Frame> {
    composite_with_report(frames, config, reporter).map(|(frame, _)| frame)
}

/// [`composite`], also returning the scores and window that were used.
pub fn composite_with_report(
    frames: &[Frame],
    config: &CompositeConfig,
    reporter: &dyn ProgressReporter,
) -> Result<(Frame, CompositeReport)> {
    config.validate()?;
    let dim = check_stack(frames.len(), frames.iter().map(|f| f.data.dim()))?;
    let pool = WorkerPool::new(config.max_workers)?;
    info!(frames = frames.len(), width = dim.1, height = dim.0, "Compositing stack");

    reporter.begin_stage(PipelineStage::Scoring, Some(frames.len()));
    let scores = score_frames_with_progress(frames, &pool, |done| reporter.advance(done))?;
    reporter.finish_stage();

    let window = choose_window(&scores, config, reporter)?;
    let depth = resolve_depth(config, dim);
    let selected = window.apply(frames);

    let fused = fuse_mono(selected, window.start, depth, config, &pool, reporter)?;
    let report = CompositeReport {
        scores,
        window,
        depth,
    };
    Ok((fused, report))
}

/// Merge a stack of RGB frames. Scoring and per-pixel source selection use
/// luminance, and every channel takes its value from the same source.
pub fn composite_color(frames: &[ColorFrame], config: &CompositeConfig) -> Result<ColorFrame> {
    composite_color_with_report(frames, config, &NoOpReporter).map(|(frame, _)| frame)
}

/// [`composite_color`], also returning the scores and window that were used.
pub fn composite_color_with_report(
    frames: &[ColorFrame],
    config: &CompositeConfig,
    reporter: &dyn ProgressReporter,
) -> Result<(ColorFrame, CompositeReport)> {
    config.validate()?;
    let dim = check_stack(frames.len(), color_dims(frames))?;
    let pool = WorkerPool::new(config.max_workers)?;
    info!(frames = frames.len(), width = dim.1, height = dim.0, "Compositing color stack");

    let luminance: Vec<Frame> =
        pool.install(|| frames.par_iter().map(ColorFrame::luminance).collect());

    reporter.begin_stage(PipelineStage::Scoring, Some(frames.len()));
    let scores = score_frames_with_progress(&luminance, &pool, |done| reporter.advance(done))?;
    reporter.finish_stage();

    let window = choose_window(&scores, config, reporter)?;
    let depth = resolve_depth(config, dim);

    let fused = fuse_color(
        window.apply(frames),
        window.apply(&luminance),
        window.start,
        depth,
        config,
        &pool,
        reporter,
    )?;
    let report = CompositeReport {
        scores,
        window,
        depth,
    };
    Ok((fused, report))
}

/// Composite image files. Every file's size is read from its header before
/// any decoding. Each file is then decoded inside the worker that scores it;
/// only the frames inside the focus window are decoded again for fusion.
pub fn composite_source(
    source: &ImageFileSource,
    color: bool,
    config: &CompositeConfig,
    reporter: &dyn ProgressReporter,
) -> Result<(Composite, CompositeReport)> {
    config.validate()?;
    let dims = source
        .paths()
        .iter()
        .enumerate()
        .map(|(i, p)| image_dimensions(p).map_err(|e| ZStackError::worker(i, e)))
        .collect::<Result<Vec<_>>>()?;
    check_stack(source.len(), dims.into_iter())?;
    let pool = WorkerPool::new(config.max_workers)?;
    info!(frames = source.len(), color, "Compositing image files");

    reporter.begin_stage(PipelineStage::Scoring, Some(source.len()));
    let scores = score_source(source, &pool, |done| reporter.advance(done))?;
    reporter.finish_stage();

    let window = choose_window(&scores, config, reporter)?;
    let paths = window.apply(source.paths());

    reporter.begin_stage(PipelineStage::Reading, Some(paths.len()));
    let (composite, depth) = if color {
        let frames: Vec<ColorFrame> = pool.install(|| {
            paths
                .par_iter()
                .enumerate()
                .map(|(i, p)| {
                    load_color_image(p).map_err(|e| ZStackError::worker(window.start + i, e))
                })
                .collect::<Result<_>>()
        })?;
        reporter.finish_stage();

        let dim = check_stack(frames.len(), color_dims(&frames))?;
        let luminance: Vec<Frame> =
            pool.install(|| frames.par_iter().map(ColorFrame::luminance).collect());
        let depth = resolve_depth(config, dim);
        let fused = fuse_color(&frames, &luminance, window.start, depth, config, &pool, reporter)?;
        (Composite::Color(fused), depth)
    } else {
        let frames: Vec<Frame> = pool.install(|| {
            paths
                .par_iter()
                .enumerate()
                .map(|(i, p)| {
                    load_image(p)
                        .map(|f| f.with_index(window.start + i))
                        .map_err(|e| ZStackError::worker(window.start + i, e))
                })
                .collect::<Result<_>>()
        })?;
        reporter.finish_stage();

        let dim = check_stack(frames.len(), frames.iter().map(|f| f.data.dim()))?;
        let depth = resolve_depth(config, dim);
        let fused = fuse_mono(&frames, window.start, depth, config, &pool, reporter)?;
        (Composite::Mono(fused), depth)
    };

    let report = CompositeReport {
        scores,
        window,
        depth,
    };
    Ok((composite, report))
}

/// Run a full file-to-file composite as described by `config`.
pub fn run_pipeline(
    config: &PipelineConfig,
    reporter: &dyn ProgressReporter,
) -> Result<(Composite, CompositeReport)> {
    let paths = collect_image_paths(&config.inputs)?;
    let source = if config.color {
        ImageFileSource::luminance(paths)
    } else {
        ImageFileSource::mono(paths)
    };

    let (composite, report) = composite_source(&source, config.color, &config.composite, reporter)?;

    reporter.begin_stage(PipelineStage::Writing, None);
    save_composite(&composite, &config.output)?;
    reporter.finish_stage();
    info!(output = %config.output.display(), "Composite saved");

    Ok((composite, report))
}

/// Stack of `count` frames whose planes all share one non-empty size.
fn check_stack(
    count: usize,
    mut dims: impl Iterator<Item = (usize, usize)>,
) -> Result<(usize, usize)> {
    let first = dims
        .next()
        .ok_or_else(|| ZStackError::InvalidInput("focus stack is empty".into()))?;
    if first.0 == 0 || first.1 == 0 {
        return Err(ZStackError::InvalidInput(format!(
            "frame has zero area ({}x{})",
            first.1, first.0
        )));
    }
    if let Some(dim) = dims.find(|&d| d != first) {
        return Err(ZStackError::InvalidInput(format!(
            "frame size {}x{} does not match {}x{}",
            dim.1, dim.0, first.1, first.0
        )));
    }
    if count < 2 {
        return Err(ZStackError::InsufficientFrames { available: count });
    }
    Ok(first)
}

fn choose_window(
    scores: &[SharpnessScore],
    config: &CompositeConfig,
    reporter: &dyn ProgressReporter,
) -> Result<FrameWindow> {
    reporter.begin_stage(PipelineStage::WindowSelection, None);
    let window = select_window(scores, config.window_size)?;
    reporter.finish_stage();

    if window.len() < 2 {
        return Err(ZStackError::InsufficientFrames {
            available: window.len(),
        });
    }
    info!(
        best = window.best,
        start = window.start,
        end = window.end,
        "Selected focus window"
    );
    Ok(window)
}

fn resolve_depth(config: &CompositeConfig, (h, w): (usize, usize)) -> usize {
    let depth = config.pyramid_depth.unwrap_or_else(|| auto_depth(h, w));
    debug!(depth, "Pyramid depth");
    depth
}

fn build_pyramids(
    frames: &[&Frame],
    first_index: usize,
    depth: usize,
    pool: &WorkerPool,
    reporter: &dyn ProgressReporter,
    done: &AtomicUsize,
) -> Result<Vec<Pyramid>> {
    pool.install(|| {
        frames
            .par_iter()
            .enumerate()
            .map(|(i, frame)| {
                let pyramid = build_pyramid(&frame.data, depth)
                    .map_err(|e| ZStackError::worker(first_index + i, e))?;
                let completed = done.fetch_add(1, Ordering::Relaxed) + 1;
                reporter.advance(completed);
                Ok(pyramid)
            })
            .collect::<Result<Vec<_>>>()
    })
}

fn fuse_mono(
    frames: &[Frame],
    first_index: usize,
    depth: usize,
    config: &CompositeConfig,
    pool: &WorkerPool,
    reporter: &dyn ProgressReporter,
) -> Result<Frame> {
    reporter.begin_stage(PipelineStage::PyramidBuild, Some(frames.len()));
    let refs: Vec<&Frame> = frames.iter().collect();
    let pyramids = build_pyramids(
        &refs,
        first_index,
        depth,
        pool,
        reporter,
        &AtomicUsize::new(0),
    )?;
    reporter.finish_stage();

    reporter.begin_stage(PipelineStage::Fusion, None);
    let params = FusionParams::from(config);
    let fused = pool.install(|| fuse_pyramids(&pyramids, &params))?;
    drop(pyramids);
    reporter.finish_stage();

    reporter.begin_stage(PipelineStage::Collapse, None);
    let data = fused.collapse()?;
    reporter.finish_stage();

    Ok(Frame::new(data, frames[0].original_bit_depth))
}

fn fuse_color(
    frames: &[ColorFrame],
    luminance: &[Frame],
    first_index: usize,
    depth: usize,
    config: &CompositeConfig,
    pool: &WorkerPool,
    reporter: &dyn ProgressReporter,
) -> Result<ColorFrame> {
    reporter.begin_stage(PipelineStage::PyramidBuild, Some(frames.len() * 4));
    let done = AtomicUsize::new(0);
    let lum_refs: Vec<&Frame> = luminance.iter().collect();
    let lum_pyramids = build_pyramids(&lum_refs, first_index, depth, pool, reporter, &done)?;
    let channel_pyramids: Vec<Vec<Pyramid>> = (0..3)
        .map(|c| {
            let refs: Vec<&Frame> = frames.iter().map(|cf| cf.channels()[c]).collect();
            build_pyramids(&refs, first_index, depth, pool, reporter, &done)
        })
        .collect::<Result<_>>()?;
    reporter.finish_stage();

    reporter.begin_stage(PipelineStage::Fusion, None);
    let params = FusionParams::from(config);
    let map = pool.install(|| fusion_map(&lum_pyramids, &params))?;
    drop(lum_pyramids);

    let bit_depth = frames[0].red.original_bit_depth;
    let fuse_channel = |pyramids: &[Pyramid]| -> Result<Frame> {
        let fused = apply_fusion_map(pyramids, &map)?;
        Ok(Frame::new(fused.collapse()?, bit_depth))
    };
    let (red, (green, blue)) = pool.install(|| {
        rayon::join(
            || fuse_channel(&channel_pyramids[0]),
            || {
                rayon::join(
                    || fuse_channel(&channel_pyramids[1]),
                    || fuse_channel(&channel_pyramids[2]),
                )
            },
        )
    });
    reporter.finish_stage();

    Ok(ColorFrame {
        red: red?,
        green: green?,
        blue: blue?,
    })
}

fn color_dims(frames: &[ColorFrame]) -> impl Iterator<Item = (usize, usize)> + '_ {
    frames
        .iter()
        .flat_map(|cf| cf.channels().map(|ch| ch.data.dim()))
}
