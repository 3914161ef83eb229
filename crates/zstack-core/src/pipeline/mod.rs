pub mod config;
mod orchestrator;
mod types;

pub use orchestrator::{
    composite, composite_color, composite_color_with_report, composite_reported,
    composite_source, composite_with_report, run_pipeline,
};
pub use types::{CompositeReport, NoOpReporter, PipelineStage, ProgressReporter};
