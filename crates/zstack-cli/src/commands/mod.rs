pub mod config;
pub mod points;
pub mod score;
pub mod stack;

use indicatif::{ProgressBar, ProgressStyle};

fn frame_bar(total: usize, message: &'static str) -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg:24} [{bar:40}] {pos}/{len}")?
            .progress_chars("=> "),
    );
    pb.set_message(message);
    Ok(pb)
}
