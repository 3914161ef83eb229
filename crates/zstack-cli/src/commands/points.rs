use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use zstack_core::frame::{Frame, Point};
use zstack_core::io::{collect_image_paths, load_color_image, load_image};
use zstack_core::pool::WorkerPool;
use zstack_core::quality::{best_frame_per_point, score_points};

use super::frame_bar;

#[derive(Args)]
pub struct PointsArgs {
    /// Image files or directories, in z order
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Point of interest as ROW,COL (repeatable)
    #[arg(short, long = "point", required = true, value_parser = parse_point)]
    pub points: Vec<Point>,

    /// Side length of the square scored around each point
    #[arg(long, default_value = "100")]
    pub region: usize,

    /// Score RGB images by their luminance
    #[arg(long)]
    pub color: bool,

    /// Worker threads (0 = all cores)
    #[arg(long, default_value = "0")]
    pub workers: usize,
}

fn parse_point(s: &str) -> std::result::Result<Point, String> {
    let (row, col) = s
        .split_once(',')
        .ok_or_else(|| format!("expected ROW,COL, got '{s}'"))?;
    let row = row
        .trim()
        .parse()
        .map_err(|e| format!("invalid row '{row}': {e}"))?;
    let col = col
        .trim()
        .parse()
        .map_err(|e| format!("invalid column '{col}': {e}"))?;
    Ok(Point::new(row, col))
}

pub fn run(args: &PointsArgs) -> Result<()> {
    if args.region == 0 {
        bail!("--region must be at least 1");
    }
    let paths = collect_image_paths(&args.inputs)?;

    let pb = frame_bar(paths.len(), "Reading frames")?;
    let frames = paths
        .iter()
        .enumerate()
        .map(|(i, path)| {
            let frame = if args.color {
                load_color_image(path).map(|c| c.luminance())
            } else {
                load_image(path)
            };
            pb.set_position(i as u64 + 1);
            frame
                .map(|f| f.with_index(i))
                .with_context(|| format!("Failed to read {}", path.display()))
        })
        .collect::<Result<Vec<Frame>>>()?;
    pb.finish_with_message("Frames loaded");

    let pool = WorkerPool::new(args.workers)?;
    let scores = score_points(&frames, &args.points, args.region, &pool);
    let best = best_frame_per_point(&scores, args.points.len());

    println!();
    println!("{:>12}  {:>10}  {:>14}", "Point", "Best frame", "Sharpness");
    println!("{}", "-".repeat(40));
    for (point_index, (point, best)) in args.points.iter().zip(&best).enumerate() {
        let label = format!("{},{}", point.row, point.col);
        match best {
            Some(frame) => {
                let value = scores
                    .iter()
                    .find(|s| s.point_index == point_index && s.frame_index == *frame)
                    .and_then(|s| s.score)
                    .unwrap_or(f64::NAN);
                println!("{:>12}  {:>10}  {:>14.6}", label, frame, value);
            }
            None => println!("{:>12}  {:>10}  {:>14}", label, "-", "outside"),
        }
    }

    Ok(())
}
