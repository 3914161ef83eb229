use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use tracing::debug;

use crate::error::{Result, ZStackError};
use crate::frame::{Frame, Point, PointScore, SharpnessScore};
use crate::pool::WorkerPool;

use super::spectral::{region_sharpness, sharpness};

/// Lazily decoded sequence of frames.
///
/// `load` is called from scoring workers, so decoding of one frame happens on
/// the thread that scores it and the frame is dropped right after.
pub trait FrameSource: Sync {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn load(&self, index: usize) -> Result<Frame>;
}

/// Score every frame in parallel, one task per frame.
///
/// Results are in frame order. The first failing frame aborts the whole call.
pub fn score_frames(frames: &[Frame], pool: &WorkerPool) -> Result<Vec<SharpnessScore>> {
    score_frames_with_progress(frames, pool, |_| {})
}

/// Score every frame with per-frame progress reporting.
///
/// Calls `on_progress(items_done)` as each frame is scored.
pub fn score_frames_with_progress(
    frames: &[Frame],
    pool: &WorkerPool,
    on_progress: impl Fn(usize) + Send + Sync,
) -> Result<Vec<SharpnessScore>> {
    let done = AtomicUsize::new(0);
    let scores = pool.install(|| {
        frames
            .par_iter()
            .enumerate()
            .map(|(index, frame)| {
                let value = sharpness(frame).map_err(|e| ZStackError::worker(index, e))?;
                let completed = done.fetch_add(1, Ordering::Relaxed) + 1;
                on_progress(completed);
                Ok(SharpnessScore { index, value })
            })
            .collect::<Result<Vec<_>>>()
    })?;

    debug!(frames = scores.len(), "Scored frames");
    Ok(scores)
}

/// Decode and score every frame of `source` in parallel.
pub fn score_source(
    source: &dyn FrameSource,
    pool: &WorkerPool,
    on_progress: impl Fn(usize) + Send + Sync,
) -> Result<Vec<SharpnessScore>> {
    let done = AtomicUsize::new(0);
    let scores = pool.install(|| {
        (0..source.len())
            .into_par_iter()
            .map(|index| {
                let frame = source
                    .load(index)
                    .map_err(|e| ZStackError::worker(index, e))?;
                let value = sharpness(&frame).map_err(|e| ZStackError::worker(index, e))?;
                let completed = done.fetch_add(1, Ordering::Relaxed) + 1;
                on_progress(completed);
                Ok(SharpnessScore { index, value })
            })
            .collect::<Result<Vec<_>>>()
    })?;

    debug!(frames = scores.len(), "Scored frame source");
    Ok(scores)
}

/// Score a square region around each point in each frame, one task per
/// (frame, point) pair.
///
/// Unlike whole-frame scoring a failing pair does not abort: its entry carries
/// `score: None`. Output is ordered by frame, then by point.
pub fn score_points(
    frames: &[Frame],
    points: &[Point],
    region_size: usize,
    pool: &WorkerPool,
) -> Vec<PointScore> {
    let pairs: Vec<(usize, usize)> = (0..frames.len())
        .flat_map(|f| (0..points.len()).map(move |p| (f, p)))
        .collect();

    pool.install(|| {
        pairs
            .par_iter()
            .map(|&(frame_index, point_index)| {
                let point = points[point_index];
                let score = region_sharpness(&frames[frame_index].data, point, region_size).ok();
                PointScore {
                    frame_index,
                    point_index,
                    point,
                    score,
                }
            })
            .collect()
    })
}

/// For each of `num_points` points, the frame whose region scored highest.
///
/// Ties go to the earliest frame; points with no successful score map to
/// `None`.
pub fn best_frame_per_point(scores: &[PointScore], num_points: usize) -> Vec<Option<usize>> {
    let mut best: Vec<Option<(usize, f64)>> = vec![None; num_points];
    for s in scores {
        let (Some(value), Some(slot)) = (s.score, best.get_mut(s.point_index)) else {
            continue;
        };
        let better = match slot {
            None => true,
            Some((frame, prev)) => value > *prev || (value == *prev && s.frame_index < *frame),
        };
        if better {
            *slot = Some((s.frame_index, value));
        }
    }
    best.into_iter().map(|b| b.map(|(frame, _)| frame)).collect()
}
