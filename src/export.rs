use std::fs;
use std::io::{Read, Write};
use std::num::NonZeroUsize;
use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{TripError, TripResult};
use crate::summary::TripSummary;
use crate::types::{AlignedSample, LocationSample, OrientationSample, SegmentKinematics, TrackPoint};

pub const MERGED_CSV_NAME: &str = "Location_Orientation_merged.csv";

pub fn points_file_name(step: NonZeroUsize) -> String {
    format!("route_points_step{}.json", step)
}

/// One row of the merged table. Column names match the input tables.
#[derive(Debug, Serialize, Deserialize)]
struct EnrichedRow {
    #[serde(rename = "Time (s)")]
    time: f64,
    #[serde(rename = "Latitude (°)")]
    latitude: f64,
    #[serde(rename = "Longitude (°)")]
    longitude: f64,
    #[serde(rename = "Height (m)")]
    altitude: Option<f64>,
    #[serde(rename = "Time (s)_ori")]
    orientation_time: f64,
    #[serde(rename = "Yaw (°)")]
    yaw: f64,
    #[serde(rename = "Pitch (°)")]
    pitch: f64,
    #[serde(rename = "Roll (°)")]
    roll: f64,
    segment_distance_m: f64,
    cumulative_distance_m: f64,
    speed_m_s: f64,
    speed_km_h: f64,
}

impl EnrichedRow {
    fn from_sample(sample: &AlignedSample) -> TripResult<Self> {
        let motion = sample.motion.ok_or(TripError::MissingKinematics)?;
        Ok(Self {
            time: sample.location.time,
            latitude: sample.location.latitude,
            longitude: sample.location.longitude,
            altitude: sample.location.altitude,
            orientation_time: sample.orientation.time,
            yaw: sample.orientation.yaw,
            pitch: sample.orientation.pitch,
            roll: sample.orientation.roll,
            segment_distance_m: motion.segment_distance_m,
            cumulative_distance_m: motion.cumulative_distance_m,
            speed_m_s: motion.speed_m_s,
            speed_km_h: motion.speed_km_h,
        })
    }

    fn into_sample(self) -> AlignedSample {
        AlignedSample {
            location: LocationSample::new(self.time, self.latitude, self.longitude, self.altitude),
            orientation: OrientationSample::new(self.orientation_time, self.yaw, self.pitch, self.roll),
            motion: Some(SegmentKinematics {
                segment_distance_m: self.segment_distance_m,
                cumulative_distance_m: self.cumulative_distance_m,
                speed_m_s: self.speed_m_s,
                speed_km_h: self.speed_km_h,
            }),
        }
    }
}

/// Write the annotated trajectory as CSV. Floats use shortest round-trip formatting.
pub fn write_enriched_csv<W: Write>(writer: W, samples: &[AlignedSample]) -> TripResult<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for sample in samples {
        writer.serialize(EnrichedRow::from_sample(sample)?)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn read_enriched_csv<R: Read>(reader: R) -> TripResult<Vec<AlignedSample>> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut samples = Vec::new();
    for row in reader.deserialize::<EnrichedRow>() {
        samples.push(row?.into_sample());
    }
    Ok(samples)
}

/// Every `step`-th sample, starting with the first, as a map point.
pub fn decimate(samples: &[AlignedSample], step: NonZeroUsize) -> TripResult<Vec<TrackPoint>> {
    samples
        .iter()
        .step_by(step.get())
        .map(|sample| -> TripResult<TrackPoint> {
            let motion = sample.motion.ok_or(TripError::MissingKinematics)?;
            Ok(TrackPoint {
                lat: sample.location.latitude,
                lon: sample.location.longitude,
                dist_km: motion.cumulative_distance_m / 1000.0,
                speed_kmh: motion.speed_km_h,
                alt_m: sample.location.altitude,
                yaw: sample.orientation.yaw,
                pitch: sample.orientation.pitch,
                roll: sample.orientation.roll,
                time_s: sample.location.time,
            })
        })
        .collect()
}

/// Summary plus decimated points, as handed to the map renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripReport {
    pub generated_at: String,
    pub location_file: String,
    pub orientation_file: String,
    pub step: usize,
    pub summary: TripSummary,
    pub points: Vec<TrackPoint>,
}

impl TripReport {
    pub fn new(
        location_file: &Path,
        orientation_file: &Path,
        step: NonZeroUsize,
        summary: TripSummary,
        samples: &[AlignedSample],
    ) -> TripResult<Self> {
        Ok(Self {
            generated_at: Utc::now().to_rfc3339(),
            location_file: location_file.display().to_string(),
            orientation_file: orientation_file.display().to_string(),
            step: step.get(),
            summary,
            points: decimate(samples, step)?,
        })
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn save(&self, path: &Path) -> TripResult<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinematics::annotate;

    fn trajectory(n: usize) -> Vec<AlignedSample> {
        let mut samples: Vec<AlignedSample> = (0..n)
            .map(|i| {
                let t = i as f64 * 0.5;
                let altitude = if i % 4 == 3 { None } else { Some(40.0 + 0.1 * i as f64) };
                AlignedSample::new(
                    LocationSample::new(t, 35.0 + 1.0e-5 * i as f64, 139.0 + 3.3e-6 * i as f64, altitude),
                    OrientationSample::new(t + 0.01, 0.1 * i as f64, -1.0 / 3.0, 2.0 / 7.0),
                )
            })
            .collect();
        annotate(&mut samples);
        samples
    }

    #[test]
    fn test_enriched_csv_round_trip() {
        let samples = trajectory(9);
        let mut buf = Vec::new();
        write_enriched_csv(&mut buf, &samples).unwrap();
        let restored = read_enriched_csv(buf.as_slice()).unwrap();
        assert_eq!(restored, samples);
    }

    #[test]
    fn test_enriched_csv_header() {
        let mut buf = Vec::new();
        write_enriched_csv(&mut buf, &trajectory(2)).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let header = text.lines().next().unwrap();
        assert_eq!(
            header,
            "Time (s),Latitude (°),Longitude (°),Height (m),Time (s)_ori,Yaw (°),Pitch (°),Roll (°),\
segment_distance_m,cumulative_distance_m,speed_m_s,speed_km_h"
        );
    }

    #[test]
    fn test_export_requires_kinematics() {
        let sample = AlignedSample::new(
            LocationSample::new(0.0, 35.0, 139.0, None),
            OrientationSample::new(0.0, 0.0, 0.0, 0.0),
        );
        let err = write_enriched_csv(Vec::new(), &[sample]).unwrap_err();
        assert!(matches!(err, TripError::MissingKinematics));
    }

    #[test]
    fn test_decimate_stride() {
        let samples = trajectory(23);
        let points = decimate(&samples, NonZeroUsize::new(10).unwrap()).unwrap();
        let times: Vec<f64> = points.iter().map(|p| p.time_s).collect();
        assert_eq!(times, vec![0.0, 5.0, 10.0]);

        let p = &points[1];
        let source = &samples[10];
        assert_eq!(p.dist_km, source.motion.unwrap().cumulative_distance_m / 1000.0);
        assert_eq!(p.speed_kmh, source.motion.unwrap().speed_km_h);
        assert_eq!(p.yaw, source.orientation.yaw);
        assert_eq!(p.alt_m, source.location.altitude);

        let all = decimate(&samples, NonZeroUsize::new(1).unwrap()).unwrap();
        assert_eq!(all.len(), samples.len());
    }

    #[test]
    fn test_report_json() {
        let samples = trajectory(12);
        let summary = TripSummary::from_samples(&samples).unwrap();
        let step = NonZeroUsize::new(5).unwrap();
        let report = TripReport::new(
            Path::new("Location.csv"),
            Path::new("Orientation.csv"),
            step,
            summary,
            &samples,
        )
        .unwrap();
        assert_eq!(report.points.len(), 3);

        let json = report.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["step"], 5);
        assert!(value["summary"]["formatted_duration"].is_string());
        assert!(value["points"][0]["dist_km"].is_number());
        assert_eq!(points_file_name(step), "route_points_step5.json");
    }
}
