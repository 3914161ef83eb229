pub mod coordinator;
pub mod spectral;

pub use coordinator::{
    best_frame_per_point, score_frames, score_frames_with_progress, score_points, score_source,
    FrameSource,
};
pub use spectral::{region_sharpness, sharpness, sharpness_array};
