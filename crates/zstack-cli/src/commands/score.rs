use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use zstack_core::io::{collect_image_paths, ImageFileSource};
use zstack_core::pool::WorkerPool;
use zstack_core::quality::{score_source, FrameSource};
use zstack_core::select::select_window;

use super::frame_bar;

#[derive(Args)]
pub struct ScoreArgs {
    /// Image files or directories, in z order
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Score RGB images by their luminance instead of decoding as grayscale
    #[arg(long)]
    pub color: bool,

    /// Show top N frames only
    #[arg(long, default_value = "20")]
    pub top: usize,

    /// Also report the focus window of this many frames
    #[arg(long, default_value = "8")]
    pub window: usize,

    /// Worker threads (0 = all cores)
    #[arg(long, default_value = "0")]
    pub workers: usize,
}

pub fn run(args: &ScoreArgs) -> Result<()> {
    let paths = collect_image_paths(&args.inputs)?;
    let source = if args.color {
        ImageFileSource::luminance(paths)
    } else {
        ImageFileSource::mono(paths)
    };
    let pool = WorkerPool::new(args.workers)?;

    let pb = frame_bar(source.len(), "Scoring sharpness")?;
    let scores = score_source(&source, &pool, |done| pb.set_position(done as u64))?;
    pb.finish_with_message("Scored");

    let window = select_window(&scores, args.window)?;

    let mut ranked: Vec<_> = scores.iter().collect();
    ranked.sort_by(|a, b| b.value.total_cmp(&a.value).then(a.index.cmp(&b.index)));

    let paths = source.paths();
    println!(
        "\nTop {} frames by sharpness (of {}):",
        args.top.min(ranked.len()),
        ranked.len()
    );
    println!("{:>5}  {:>7}  {:>14}  {}", "Rank", "Frame", "Sharpness", "File");
    println!("{}", "-".repeat(60));
    for (rank, score) in ranked.iter().take(args.top).enumerate() {
        let marker = if score.index == window.best {
            "*"
        } else if window.contains(score.index) {
            "+"
        } else {
            " "
        };
        println!(
            "{:>5}  {:>6}{}  {:>14.6}  {}",
            rank + 1,
            score.index,
            marker,
            score.value,
            paths[score.index].display()
        );
    }

    println!(
        "\nSharpest frame: {} (window {}..{}, {} frames)",
        window.best,
        window.start,
        window.end,
        window.len()
    );

    Ok(())
}
