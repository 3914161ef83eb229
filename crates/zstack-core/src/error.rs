use thiserror::Error;

#[derive(Error, Debug)]
pub enum ZStackError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image format error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Worker for frame {index} failed: {reason}")]
    WorkerFailure { index: usize, reason: String },

    #[error("At least 2 frames are required to composite, got {available}")]
    InsufficientFrames { available: usize },

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl ZStackError {
    /// Wrap any error raised inside a parallel unit of work.
    pub fn worker(index: usize, err: impl std::fmt::Display) -> Self {
        Self::WorkerFailure {
            index,
            reason: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ZStackError>;
