use crate::frame::SharpnessScore;
use crate::select::FrameWindow;

/// Pipeline processing stage, used for progress reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineStage {
    Reading,
    Scoring,
    WindowSelection,
    PyramidBuild,
    Fusion,
    Collapse,
    Writing,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reading => write!(f, "Reading frames"),
            Self::Scoring => write!(f, "Scoring sharpness"),
            Self::WindowSelection => write!(f, "Selecting focus window"),
            Self::PyramidBuild => write!(f, "Building pyramids"),
            Self::Fusion => write!(f, "Fusing pyramids"),
            Self::Collapse => write!(f, "Collapsing pyramid"),
            Self::Writing => write!(f, "Writing output"),
        }
    }
}

/// What the pipeline decided on the way to a composite.
#[derive(Clone, Debug)]
pub struct CompositeReport {
    /// One score per input frame, in stack order.
    pub scores: Vec<SharpnessScore>,
    pub window: FrameWindow,
    /// Pyramid levels actually built.
    pub depth: usize,
}

/// Thread-safe progress reporting for the pipeline.
///
/// Implementors can use this to drive progress bars, logging, or any other
/// UI feedback. All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    /// A new pipeline stage has started. `total_items` is the number of
    /// work items in this stage (e.g., frame count), if known.
    fn begin_stage(&self, _stage: PipelineStage, _total_items: Option<usize>) {}

    /// One work item within the current stage has completed.
    fn advance(&self, _items_done: usize) {}

    /// The current stage is finished.
    fn finish_stage(&self) {}
}

/// Progress reporter that ignores everything.
pub struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}
