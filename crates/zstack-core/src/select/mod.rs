pub mod window;

pub use window::{best_index, select_window, window_around, FrameWindow};
