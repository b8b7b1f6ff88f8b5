//! Nearest-timestamp join of the location and orientation series.
//!
//! Every location sample is paired with the orientation sample whose timestamp is
//! closest in absolute difference. There is no tolerance window: samples outside the
//! orientation time range clamp to the first or last orientation sample.
//!
//! Ties go to the earlier timestamp. Among orientation samples sharing a timestamp the
//! first one (in sorted, file-stable order) wins.

use crate::error::{TripError, TripResult};
use crate::store::SampleStore;
use crate::types::{AlignedSample, LocationSample, OrientationSample};

pub fn align(store: &SampleStore) -> Vec<AlignedSample> {
    join_nearest(store.locations(), store.orientations())
}

/// Align two already time-sorted slices. Both must be non-empty.
pub fn align_slices(
    locations: &[LocationSample],
    orientations: &[OrientationSample],
) -> TripResult<Vec<AlignedSample>> {
    if locations.is_empty() {
        return Err(TripError::EmptySeries { table: "Location" });
    }
    if orientations.is_empty() {
        return Err(TripError::EmptySeries {
            table: "Orientation",
        });
    }
    Ok(join_nearest(locations, orientations))
}

fn join_nearest(
    locations: &[LocationSample],
    orientations: &[OrientationSample],
) -> Vec<AlignedSample> {
    let aligned: Vec<AlignedSample> = locations
        .iter()
        .filter_map(|loc| {
            nearest_index(orientations, loc.time)
                .map(|idx| AlignedSample::new(*loc, orientations[idx]))
        })
        .collect();
    log::debug!(
        "Aligned {} location samples against {} orientation samples",
        aligned.len(),
        orientations.len()
    );
    aligned
}

/// Index of the orientation sample nearest to `time`, or `None` for an empty slice.
pub fn nearest_index(orientations: &[OrientationSample], time: f64) -> Option<usize> {
    if orientations.is_empty() {
        return None;
    }

    // First sample at or after `time`.
    let after = orientations.partition_point(|o| o.time < time);
    if after == 0 {
        return Some(0);
    }

    let before = first_with_time(orientations, orientations[after - 1].time);
    if after == orientations.len() {
        return Some(before);
    }

    let gap_before = time - orientations[before].time;
    let gap_after = orientations[after].time - time;
    if gap_after < gap_before {
        Some(after)
    } else {
        Some(before)
    }
}

fn first_with_time(orientations: &[OrientationSample], time: f64) -> usize {
    orientations.partition_point(|o| o.time < time)
}
