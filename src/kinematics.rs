use crate::types::{AlignedSample, GeoPoint, SegmentKinematics};

/// Spherical Earth radius used for all horizontal distances
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;
pub const MS_TO_KMH: f64 = 3.6;

/// Great-circle distance in meters between two points (haversine).
///
/// Altitude is not part of the calculation.
pub fn haversine_m(from: GeoPoint, to: GeoPoint) -> f64 {
    let phi1 = from.latitude.to_radians();
    let phi2 = to.latitude.to_radians();
    let d_phi = (to.latitude - from.latitude).to_radians();
    let d_lambda = (to.longitude - from.longitude).to_radians();
    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.clamp(0.0, 1.0).sqrt().asin()
}

/// Speed over a segment. Zero when `dt` is not positive (duplicate or
/// out-of-order timestamps).
pub fn segment_speed(distance_m: f64, dt: f64) -> f64 {
    if dt > 0.0 {
        distance_m / dt
    } else {
        0.0
    }
}

/// Fill in segment distance, cumulative distance and speed for every sample.
///
/// The first sample always gets zero distance and speed. Cumulative distance is a
/// left-to-right prefix sum over the segment distances.
pub fn annotate(samples: &mut [AlignedSample]) {
    let segments: Vec<(f64, f64)> = std::iter::once((0.0, 0.0))
        .chain(samples.windows(2).map(|pair| {
            let distance = haversine_m(pair[0].location.point(), pair[1].location.point());
            (distance, pair[1].time() - pair[0].time())
        }))
        .collect();

    let mut cumulative = 0.0;
    for (sample, (distance, dt)) in samples.iter_mut().zip(segments) {
        cumulative += distance;
        let speed_m_s = segment_speed(distance, dt);
        sample.motion = Some(SegmentKinematics {
            segment_distance_m: distance,
            cumulative_distance_m: cumulative,
            speed_m_s,
            speed_km_h: speed_m_s * MS_TO_KMH,
        });
    }
}
