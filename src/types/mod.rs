use serde::{Deserialize, Serialize};

/// Positional fix as recorded by the phone (one row of the location table).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    pub time: f64,      // seconds
    pub latitude: f64,  // degrees
    pub longitude: f64, // degrees
    pub altitude: Option<f64>, // meters, absent when the table has no height
}

impl LocationSample {
    pub fn new(time: f64, latitude: f64, longitude: f64, altitude: Option<f64>) -> Self {
        Self {
            time,
            latitude,
            longitude,
            altitude,
        }
    }

    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// Orientation fix (one row of the orientation table). Angles in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrientationSample {
    pub time: f64,
    pub yaw: f64,
    pub pitch: f64,
    pub roll: f64,
}

impl OrientationSample {
    pub fn new(time: f64, yaw: f64, pitch: f64, roll: f64) -> Self {
        Self {
            time,
            yaw,
            pitch,
            roll,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Motion quantities derived for one aligned sample.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SegmentKinematics {
    pub segment_distance_m: f64,
    pub cumulative_distance_m: f64,
    pub speed_m_s: f64,
    pub speed_km_h: f64,
}

/// A location sample joined with its time-nearest orientation sample.
///
/// `motion` stays `None` until [`crate::kinematics::annotate`] has run over the
/// sequence the sample belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlignedSample {
    pub location: LocationSample,
    pub orientation: OrientationSample,
    pub motion: Option<SegmentKinematics>,
}

impl AlignedSample {
    pub fn new(location: LocationSample, orientation: OrientationSample) -> Self {
        Self {
            location,
            orientation,
            motion: None,
        }
    }

    pub fn time(&self) -> f64 {
        self.location.time
    }
}

/// Decimated view of one aligned sample for interactive map widgets.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub lat: f64,
    pub lon: f64,
    pub dist_km: f64,
    pub speed_kmh: f64,
    pub alt_m: Option<f64>,
    pub yaw: f64,
    pub pitch: f64,
    pub roll: f64,
    pub time_s: f64,
}
