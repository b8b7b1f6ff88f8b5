use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;

use crate::align::align;
use crate::config::PipelineConfig;
use crate::error::TripResult;
use crate::export::{points_file_name, write_enriched_csv, TripReport, MERGED_CSV_NAME};
use crate::kinematics::annotate;
use crate::store::SampleStore;
use crate::summary::TripSummary;
use crate::types::AlignedSample;

/// Annotated trajectory and its summary
#[derive(Debug, Clone)]
pub struct TripOutput {
    pub samples: Vec<AlignedSample>,
    pub summary: TripSummary,
}

/// Align, annotate and summarize an already loaded store.
pub fn process(store: &SampleStore) -> TripResult<TripOutput> {
    let mut samples = align(store);
    annotate(&mut samples);
    let summary = TripSummary::from_samples(&samples)?;
    log::info!(
        "Trip: {} samples, {:.3} km in {} ({:.2} km/h avg)",
        samples.len(),
        summary.total_distance_km(),
        summary.formatted_duration,
        summary.avg_speed_km_h
    );
    Ok(TripOutput { samples, summary })
}

/// Load both tables named by `config` and process them.
pub fn run(config: &PipelineConfig) -> TripResult<TripOutput> {
    log::info!("Location: {}", config.location_path.display());
    log::info!("Orientation: {}", config.orientation_path.display());
    let store = SampleStore::load(&config.location_path, &config.orientation_path)?;
    process(&store)
}

impl TripOutput {
    /// Write the merged CSV and the JSON report into `config.output_dir`.
    /// Returns the paths written.
    pub fn write_artifacts(&self, config: &PipelineConfig) -> TripResult<Vec<PathBuf>> {
        if !config.write_merged_csv && !config.write_report {
            return Ok(Vec::new());
        }
        fs::create_dir_all(&config.output_dir)?;
        let mut written = Vec::new();

        if config.write_merged_csv {
            let path = config.output_dir.join(MERGED_CSV_NAME);
            let file = BufWriter::new(File::create(&path)?);
            write_enriched_csv(file, &self.samples)?;
            log::info!("Wrote merged trajectory to {}", path.display());
            written.push(path);
        }

        if config.write_report {
            let step = config.step();
            let report = TripReport::new(
                &config.location_path,
                &config.orientation_path,
                step,
                self.summary.clone(),
                &self.samples,
            )?;
            let path = config.output_dir.join(points_file_name(step));
            report.save(&path)?;
            log::info!("Wrote {} map points to {}", report.points.len(), path.display());
            written.push(path);
        }

        Ok(written)
    }
}
