use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{TripError, TripResult};
use crate::kinematics::MS_TO_KMH;
use crate::types::{AlignedSample, GeoPoint};

/// Trip-level statistics, computed once from an annotated trajectory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripSummary {
    pub total_time_s: f64,
    pub total_distance_m: f64,
    pub avg_speed_m_s: f64,
    pub avg_speed_km_h: f64,
    pub max_speed_km_h: f64,
    pub formatted_duration: String,
    pub start_point: GeoPoint,
    pub end_point: GeoPoint,
    pub sample_count: usize,
}

impl TripSummary {
    pub fn from_samples(samples: &[AlignedSample]) -> TripResult<Self> {
        let (first, last) = match (samples.first(), samples.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(TripError::EmptySeries { table: "aligned" }),
        };
        let last_motion = last.motion.ok_or(TripError::MissingKinematics)?;

        let total_time_s = last.time() - first.time();
        let total_distance_m = last_motion.cumulative_distance_m;
        let avg_speed_m_s = if total_time_s > 0.0 {
            total_distance_m / total_time_s
        } else {
            0.0
        };
        let max_speed_km_h = samples
            .iter()
            .filter_map(|s| s.motion.map(|m| m.speed_km_h))
            .fold(0.0, f64::max);

        Ok(Self {
            total_time_s,
            total_distance_m,
            avg_speed_m_s,
            avg_speed_km_h: avg_speed_m_s * MS_TO_KMH,
            max_speed_km_h,
            formatted_duration: format_hhmmss(total_time_s),
            start_point: first.location.point(),
            end_point: last.location.point(),
            sample_count: samples.len(),
        })
    }

    pub fn total_distance_km(&self) -> f64 {
        self.total_distance_m / 1000.0
    }
}

impl fmt::Display for TripSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- summary ---")?;
        writeln!(
            f,
            "Start: {:.6}, {:.6}",
            self.start_point.latitude, self.start_point.longitude
        )?;
        writeln!(
            f,
            "End:   {:.6}, {:.6}",
            self.end_point.latitude, self.end_point.longitude
        )?;
        writeln!(
            f,
            "Time:  {}  ({:.1} s)",
            self.formatted_duration, self.total_time_s
        )?;
        writeln!(f, "Dist:  {:.3} km", self.total_distance_km())?;
        write!(f, "Vavg:  {:.2} km/h", self.avg_speed_km_h)
    }
}

/// Render seconds as `HH:MM:SS`, rounded to the nearest second. Hours do not wrap.
pub fn format_hhmmss(seconds: f64) -> String {
    let total = if seconds.is_finite() {
        seconds.round_ties_even().max(0.0) as u64
    } else {
        0
    };
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}
