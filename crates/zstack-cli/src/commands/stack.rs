use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;
use zstack_core::pipeline::config::{BaseFusion, FocusMeasure, PipelineConfig};
use zstack_core::pipeline::{run_pipeline, PipelineStage, ProgressReporter};

use crate::summary::{print_pipeline_summary, print_report};

#[derive(Clone, ValueEnum)]
pub enum BandMetricArg {
    Energy,
    Deviation,
    Entropy,
}

#[derive(Clone, ValueEnum)]
pub enum BaseFusionArg {
    Deviation,
    Entropy,
    EntropyDeviation,
}

#[derive(Args)]
pub struct StackArgs {
    /// Image files or directories, in z order
    pub inputs: Vec<PathBuf>,

    /// Pipeline config file (TOML); command-line inputs and output override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output file path (.png or .tiff)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Frames kept around the sharpest frame
    #[arg(long)]
    pub window: Option<usize>,

    /// Pyramid depth (default: automatic)
    #[arg(long)]
    pub depth: Option<usize>,

    /// Odd side length of the fusion neighbourhood
    #[arg(long)]
    pub kernel: Option<usize>,

    /// Statistic used to fuse band-pass levels
    #[arg(long, value_enum)]
    pub band_metric: Option<BandMetricArg>,

    /// Rule used to fuse the coarsest level
    #[arg(long, value_enum)]
    pub base_fusion: Option<BaseFusionArg>,

    /// Fuse RGB channels
    #[arg(long)]
    pub color: bool,

    /// Worker threads (0 = all cores)
    #[arg(long)]
    pub workers: Option<usize>,
}

pub fn run(args: &StackArgs) -> Result<()> {
    let config = build_config(args)?;
    debug!(?config, "Resolved pipeline config");
    print_pipeline_summary(&config);

    let reporter = BarReporter::new()?;
    let (_, report) = run_pipeline(&config, &reporter)?;
    reporter.finish();

    print_report(&report);
    println!("\nOutput saved to {}", config.output.display());

    Ok(())
}

fn build_config(args: &StackArgs) -> Result<PipelineConfig> {
    let mut config: PipelineConfig = if let Some(ref config_path) = args.config {
        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config {}", config_path.display()))?;
        toml::from_str(&contents).context("Invalid pipeline config")?
    } else {
        PipelineConfig::default()
    };

    if !args.inputs.is_empty() {
        config.inputs = args.inputs.clone();
    }
    if let Some(ref output) = args.output {
        config.output = output.clone();
    }
    if args.color {
        config.color = true;
    }

    let composite = &mut config.composite;
    if let Some(window) = args.window {
        composite.window_size = window;
    }
    if let Some(depth) = args.depth {
        composite.pyramid_depth = Some(depth);
    }
    if let Some(kernel) = args.kernel {
        composite.fusion_kernel_radius = kernel;
    }
    if let Some(ref metric) = args.band_metric {
        composite.band_metric = match metric {
            BandMetricArg::Energy => FocusMeasure::RegionEnergy,
            BandMetricArg::Deviation => FocusMeasure::Deviation,
            BandMetricArg::Entropy => FocusMeasure::Entropy,
        };
    }
    if let Some(ref base) = args.base_fusion {
        composite.base_fusion = match base {
            BaseFusionArg::Deviation => BaseFusion::Deviation,
            BaseFusionArg::Entropy => BaseFusion::Entropy,
            BaseFusionArg::EntropyDeviation => BaseFusion::EntropyDeviation,
        };
    }
    if let Some(workers) = args.workers {
        composite.max_workers = workers;
    }

    composite.validate()?;
    Ok(config)
}

/// Drives one progress bar per pipeline stage.
struct BarReporter {
    style: ProgressStyle,
    spinner: ProgressStyle,
    current: Mutex<Option<ProgressBar>>,
}

impl BarReporter {
    fn new() -> Result<Self> {
        Ok(Self {
            style: ProgressStyle::default_bar()
                .template("{msg:24} [{bar:40}] {pos}/{len}")?
                .progress_chars("=> "),
            spinner: ProgressStyle::default_spinner().template("{msg:24} {spinner}")?,
            current: Mutex::new(None),
        })
    }

    fn finish(&self) {
        if let Ok(mut current) = self.current.lock() {
            if let Some(pb) = current.take() {
                pb.finish_and_clear();
            }
        }
    }
}

impl ProgressReporter for BarReporter {
    fn begin_stage(&self, stage: PipelineStage, total_items: Option<usize>) {
        let pb = match total_items {
            Some(total) => ProgressBar::new(total as u64).with_style(self.style.clone()),
            None => ProgressBar::new_spinner().with_style(self.spinner.clone()),
        };
        pb.set_message(stage.to_string());
        if let Ok(mut current) = self.current.lock() {
            if let Some(previous) = current.replace(pb) {
                previous.finish_and_clear();
            }
        }
    }

    fn advance(&self, items_done: usize) {
        if let Ok(current) = self.current.lock() {
            if let Some(pb) = current.as_ref() {
                pb.set_position(items_done as u64);
            }
        }
    }

    fn finish_stage(&self) {
        if let Ok(mut current) = self.current.lock() {
            if let Some(pb) = current.take() {
                pb.finish_with_message(format!("{} done", pb.message()));
            }
        }
    }
}
