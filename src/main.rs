//! Exposure Resampler - Entry Point
//!
//! Loads a proxy raster, a boundary table and an exposure table, runs the
//! disaggregation and writes the resampled exposure as JSON.

use std::path::PathBuf;

use clap::Parser;

use exposure_resampler::core::config::ResamplerConfig;
use exposure_resampler::core::error::Result;
use exposure_resampler::input::{load_boundaries, load_exposure, load_raster};
use exposure_resampler::pipeline::Pipeline;

/// Disaggregate boundary-level exposure onto a proxy raster
#[derive(Parser, Debug)]
#[command(name = "exposure_resampler")]
#[command(about = "Spread exposure totals over a proxy raster and write point samples")]
struct Args {
    /// Configuration file (TOML). Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Proxy raster (JSON)
    #[arg(long)]
    raster: PathBuf,

    /// Boundary table (JSON)
    #[arg(long)]
    boundaries: PathBuf,

    /// Exposure table (JSON)
    #[arg(long)]
    exposure: PathBuf,

    /// Output file for the resampled exposure
    #[arg(long, default_value = "resampled_exposure.json")]
    output: PathBuf,

    /// Optional file for the run report (diagnostics)
    #[arg(long)]
    report: Option<PathBuf>,

    /// Random seed, overrides the configuration
    #[arg(long)]
    seed: Option<u64>,

    /// Target resolution, overrides the configuration
    #[arg(long)]
    resolution: Option<f64>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("exposure_resampler=info")
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ResamplerConfig::from_file(path)?,
        None => ResamplerConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(resolution) = args.resolution {
        config.resolution = resolution;
    }

    let pipeline = Pipeline::new(config)?;

    let raster = load_raster(&args.raster)?;
    let boundaries = load_boundaries(&args.boundaries)?;
    let exposure = load_exposure(&args.exposure, pipeline.config())?;

    let output = pipeline.run(&raster, &boundaries, &exposure)?;

    std::fs::write(&args.output, output.to_json(pipeline.config())?)?;
    tracing::info!("Wrote {} samples to {}", output.samples.len(), args.output.display());

    if output.report.is_empty() {
        tracing::info!("Run raised no diagnostics");
    }
    if let Some(path) = &args.report {
        std::fs::write(path, output.report_json()?)?;
    }

    println!("{}", output.summary());
    Ok(())
}
