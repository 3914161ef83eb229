use std::ops::Range;

use crate::error::{Result, ZStackError};
use crate::frame::SharpnessScore;

/// Contiguous, half-open range of z-stack indices fed to fusion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameWindow {
    pub start: usize,
    pub end: usize,
    /// Index of the sharpest frame; always inside the window.
    pub best: usize,
}

impl FrameWindow {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, index: usize) -> bool {
        (self.start..self.end).contains(&index)
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Borrow the windowed items out of a full-stack slice.
    pub fn apply<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        &items[self.start..self.end.min(items.len())]
    }
}

/// Index of the highest score; the first one wins ties. Non-finite scores
/// are never chosen.
pub fn best_index(scores: &[SharpnessScore]) -> Option<usize> {
    let mut best: Option<&SharpnessScore> = None;
    for s in scores.iter().filter(|s| s.value.is_finite()) {
        match best {
            Some(b) if s.value <= b.value => {}
            _ => best = Some(s),
        }
    }
    best.map(|s| s.index)
}

/// Pick the window of frames around the sharpest one.
///
/// With `h = ceil(window_size / 2)` the window spans `2h` frames centred on
/// the best frame, shifted inward when it would run past either end of the
/// stack. When `2h >= N` every frame is kept.
///
/// `scores` must hold one entry per frame with indices `0..N`.
pub fn select_window(scores: &[SharpnessScore], window_size: usize) -> Result<FrameWindow> {
    if window_size == 0 {
        return Err(ZStackError::InvalidInput(
            "window size must be at least 1".into(),
        ));
    }
    let n = scores.len();
    let best = best_index(scores)
        .ok_or_else(|| ZStackError::InvalidInput("no finite frame scores to select from".into()))?;
    if best >= n {
        return Err(ZStackError::InvalidInput(format!(
            "score index {best} out of range for {n} frames"
        )));
    }

    Ok(window_around(best, n, window_size))
}

/// Window policy on raw indices. `best < n` and `window_size >= 1`.
pub fn window_around(best: usize, n: usize, window_size: usize) -> FrameWindow {
    let half = window_size.div_ceil(2);
    let span = half.saturating_mul(2);

    if span >= n {
        return FrameWindow {
            start: 0,
            end: n,
            best,
        };
    }

    let start = best.saturating_sub(half).min(n - span);
    FrameWindow {
        start,
        end: start + span,
        best,
    }
}
