use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use trip_kinematics::config::PipelineConfig;
use trip_kinematics::pipeline;

#[derive(Parser, Debug)]
#[command(name = "trip_kinematics")]
#[command(about = "Merge phone location + orientation logs and compute distance/speed", long_about = None)]
struct Args {
    /// JSON config file (flags below override its values)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Location table (CSV, optionally .gz)
    #[arg(long)]
    location: Option<PathBuf>,

    /// Orientation table (CSV, optionally .gz)
    #[arg(long)]
    orientation: Option<PathBuf>,

    /// Keep every Nth sample in the map point report
    #[arg(long)]
    step: Option<usize>,

    /// Output directory for the merged CSV and point report
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Only print the summary, write nothing
    #[arg(long, default_value_t = false)]
    summary_only: bool,
}

impl Args {
    fn into_config(self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::load(path)
                .with_context(|| format!("reading config {}", path.display()))?,
            None => PipelineConfig::default(),
        };
        if let Some(location) = self.location {
            config.location_path = location;
        }
        if let Some(orientation) = self.orientation {
            config.orientation_path = orientation;
        }
        if let Some(step) = self.step {
            config.point_step = step;
        }
        if let Some(output_dir) = self.output_dir {
            config.output_dir = output_dir;
        }
        if self.summary_only {
            config.write_merged_csv = false;
            config.write_report = false;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Args::parse().into_config()?;
    let output = pipeline::run(&config).context("trip processing failed")?;

    println!("{}", output.summary);

    let written = output
        .write_artifacts(&config)
        .with_context(|| format!("writing results to {}", config.output_dir.display()))?;
    for path in written {
        println!("created: {}", path.display());
    }

    Ok(())
}
