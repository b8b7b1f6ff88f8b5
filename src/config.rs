use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{TripError, TripResult};

pub const DEFAULT_LOCATION_FILE: &str = "Location.csv";
pub const DEFAULT_ORIENTATION_FILE: &str = "Orientation.csv";
pub const DEFAULT_POINT_STEP: usize = 10;

/// Pipeline settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub location_path: PathBuf,
    pub orientation_path: PathBuf,
    pub output_dir: PathBuf,
    pub point_step: usize, // decimation stride for map points, 0 is treated as 1
    pub write_merged_csv: bool,
    pub write_report: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            location_path: PathBuf::from(DEFAULT_LOCATION_FILE),
            orientation_path: PathBuf::from(DEFAULT_ORIENTATION_FILE),
            output_dir: PathBuf::from("."),
            point_step: DEFAULT_POINT_STEP,
            write_merged_csv: true,
            write_report: true,
        }
    }
}

impl PipelineConfig {
    /// Read a JSON config file. Missing keys take their default values.
    pub fn load(path: &Path) -> TripResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| TripError::MissingInput {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> TripResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn step(&self) -> NonZeroUsize {
        clamp_step(self.point_step as i64)
    }
}

/// Strides below one fall back to one.
pub fn clamp_step(step: i64) -> NonZeroUsize {
    usize::try_from(step)
        .ok()
        .and_then(NonZeroUsize::new)
        .unwrap_or(NonZeroUsize::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = PipelineConfig::from_json(r#"{ "point_step": 25, "output_dir": "out" }"#).unwrap();
        assert_eq!(config.point_step, 25);
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.location_path, PathBuf::from(DEFAULT_LOCATION_FILE));
        assert!(config.write_merged_csv);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            PipelineConfig::from_json("{ point_step: }"),
            Err(TripError::Json(_))
        ));
    }

    #[test]
    fn test_step_clamped() {
        assert_eq!(clamp_step(0).get(), 1);
        assert_eq!(clamp_step(-7).get(), 1);
        assert_eq!(clamp_step(3).get(), 3);

        let config = PipelineConfig {
            point_step: 0,
            ..PipelineConfig::default()
        };
        assert_eq!(config.step().get(), 1);
    }
}
