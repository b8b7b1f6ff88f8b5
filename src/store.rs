use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use csv::{ByteRecord, ReaderBuilder};
use flate2::read::GzDecoder;

use crate::error::{TripError, TripResult};
use crate::types::{LocationSample, OrientationSample};

pub const TIME_COLUMN: &str = "Time (s)";
pub const LATITUDE_COLUMN: &str = "Latitude (°)";
pub const LONGITUDE_COLUMN: &str = "Longitude (°)";
pub const HEIGHT_COLUMN: &str = "Height (m)";
pub const YAW_COLUMN: &str = "Yaw (°)";
pub const PITCH_COLUMN: &str = "Pitch (°)";
pub const ROLL_COLUMN: &str = "Roll (°)";

const LOCATION_TABLE: &str = "Location";
const ORIENTATION_TABLE: &str = "Orientation";

/// Both input series, filtered and sorted ascending by time.
#[derive(Clone, Debug)]
pub struct SampleStore {
    locations: Vec<LocationSample>,
    orientations: Vec<OrientationSample>,
}

impl SampleStore {
    /// Build a store from in-memory records.
    ///
    /// Invalid records are dropped, the rest sorted by time (stable). Fails if either
    /// series ends up empty.
    pub fn new(
        locations: Vec<LocationSample>,
        orientations: Vec<OrientationSample>,
    ) -> TripResult<Self> {
        let locations = prepare_locations(locations);
        let orientations = prepare_orientations(orientations);

        if locations.is_empty() {
            return Err(TripError::EmptySeries {
                table: LOCATION_TABLE,
            });
        }
        if orientations.is_empty() {
            return Err(TripError::EmptySeries {
                table: ORIENTATION_TABLE,
            });
        }

        Ok(Self {
            locations,
            orientations,
        })
    }

    pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(location_path: P, orientation_path: Q) -> TripResult<Self> {
        let locations = read_locations(location_path)?;
        let orientations = read_orientations(orientation_path)?;
        Self::new(locations, orientations)
    }

    pub fn locations(&self) -> &[LocationSample] {
        &self.locations
    }

    pub fn orientations(&self) -> &[OrientationSample] {
        &self.orientations
    }
}

pub fn read_locations<P: AsRef<Path>>(path: P) -> TripResult<Vec<LocationSample>> {
    let path = path.as_ref();
    let samples = read_locations_from(open_table(path)?).map_err(|e| unreadable(path, e))?;
    log::info!("Loaded {} location samples from {}", samples.len(), path.display());
    Ok(samples)
}

pub fn read_orientations<P: AsRef<Path>>(path: P) -> TripResult<Vec<OrientationSample>> {
    let path = path.as_ref();
    let samples = read_orientations_from(open_table(path)?).map_err(|e| unreadable(path, e))?;
    log::info!("Loaded {} orientation samples from {}", samples.len(), path.display());
    Ok(samples)
}

/// Parse a location table. Rows with a missing or invalid required cell are skipped.
pub fn read_locations_from<R: Read>(reader: R) -> TripResult<Vec<LocationSample>> {
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = reader.byte_headers()?.clone();

    let time_idx = column_index(&headers, LOCATION_TABLE, TIME_COLUMN)?;
    let lat_idx = column_index(&headers, LOCATION_TABLE, LATITUDE_COLUMN)?;
    let lon_idx = column_index(&headers, LOCATION_TABLE, LONGITUDE_COLUMN)?;
    let height_idx = find_column(&headers, HEIGHT_COLUMN);

    let mut samples = Vec::new();
    let mut dropped = 0usize;
    for record in reader.byte_records() {
        let record = record?;
        let row = (
            parse_cell(&record, time_idx),
            parse_cell(&record, lat_idx),
            parse_cell(&record, lon_idx),
        );
        match row {
            (Some(time), Some(latitude), Some(longitude)) => {
                let altitude = height_idx.and_then(|idx| parse_cell(&record, idx));
                samples.push(LocationSample::new(time, latitude, longitude, altitude));
            }
            _ => dropped += 1,
        }
    }

    if dropped > 0 {
        log::debug!("Dropped {} incomplete location rows", dropped);
    }
    Ok(prepare_locations(samples))
}

/// Parse an orientation table. Rows with a missing or invalid cell are skipped.
pub fn read_orientations_from<R: Read>(reader: R) -> TripResult<Vec<OrientationSample>> {
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = reader.byte_headers()?.clone();

    let time_idx = column_index(&headers, ORIENTATION_TABLE, TIME_COLUMN)?;
    let yaw_idx = column_index(&headers, ORIENTATION_TABLE, YAW_COLUMN)?;
    let pitch_idx = column_index(&headers, ORIENTATION_TABLE, PITCH_COLUMN)?;
    let roll_idx = column_index(&headers, ORIENTATION_TABLE, ROLL_COLUMN)?;

    let mut samples = Vec::new();
    let mut dropped = 0usize;
    for record in reader.byte_records() {
        let record = record?;
        let row = (
            parse_cell(&record, time_idx),
            parse_cell(&record, yaw_idx),
            parse_cell(&record, pitch_idx),
            parse_cell(&record, roll_idx),
        );
        match row {
            (Some(time), Some(yaw), Some(pitch), Some(roll)) => {
                samples.push(OrientationSample::new(time, yaw, pitch, roll));
            }
            _ => dropped += 1,
        }
    }

    if dropped > 0 {
        log::debug!("Dropped {} incomplete orientation rows", dropped);
    }
    Ok(prepare_orientations(samples))
}

/// Reader and decoder failures on a named file surface as an input error.
fn unreadable(path: &Path, err: TripError) -> TripError {
    match err {
        TripError::Csv(_) | TripError::Io(_) => TripError::MissingInput {
            path: path.display().to_string(),
            reason: err.to_string(),
        },
        other => other,
    }
}

/// Open a table file, gunzipping `*.gz` transparently.
pub(crate) fn open_table(path: &Path) -> TripResult<Box<dyn Read>> {
    let file = File::open(path).map_err(|e| TripError::MissingInput {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    if path.extension().map(|e| e == "gz").unwrap_or(false) {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

pub(crate) fn find_column(headers: &ByteRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| {
        String::from_utf8_lossy(h).trim_start_matches('\u{feff}').trim() == name
    })
}

pub(crate) fn column_index(
    headers: &ByteRecord,
    table: &'static str,
    column: &'static str,
) -> TripResult<usize> {
    find_column(headers, column).ok_or(TripError::MissingColumn { table, column })
}

/// Empty, non-UTF-8, unparseable and non-finite cells all read as missing.
pub(crate) fn parse_cell(record: &ByteRecord, idx: usize) -> Option<f64> {
    let cell = std::str::from_utf8(record.get(idx)?).ok()?.trim();
    if cell.is_empty() {
        return None;
    }
    cell.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn location_is_valid(sample: &LocationSample) -> bool {
    sample.time.is_finite()
        && (-90.0..=90.0).contains(&sample.latitude)
        && (-180.0..=180.0).contains(&sample.longitude)
}

fn orientation_is_valid(sample: &OrientationSample) -> bool {
    sample.time.is_finite()
        && sample.yaw.is_finite()
        && sample.pitch.is_finite()
        && sample.roll.is_finite()
}

fn prepare_locations(mut samples: Vec<LocationSample>) -> Vec<LocationSample> {
    samples.retain(location_is_valid);
    for sample in samples.iter_mut() {
        sample.altitude = sample.altitude.filter(|a| a.is_finite());
    }
    samples.sort_by(|a, b| a.time.total_cmp(&b.time));
    samples
}

fn prepare_orientations(mut samples: Vec<OrientationSample>) -> Vec<OrientationSample> {
    samples.retain(orientation_is_valid);
    samples.sort_by(|a, b| a.time.total_cmp(&b.time));
    samples
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOCATION_CSV: &str = "\
\"Time (s)\",\"Latitude (°)\",\"Longitude (°)\",\"Height (m)\",\"Velocity (m/s)\"
2.0,35.0010,139.0000,41.5,1.0
0.0,35.0000,139.0000,40.0,0.0
1.0,,139.0000,40.5,0.5
3.0,35.0020,abc,42.0,1.0
4.0,35.0030,139.0000,,1.0
";

    const ORIENTATION_CSV: &str = "\
Roll (°),Time (s),Yaw (°),Pitch (°)
1.0,0.5,10.0,2.0
1.5,0.0,12.0,2.5
,1.0,11.0,2.0
";

    #[test]
    fn test_location_rows_filtered_and_sorted() {
        let samples = read_locations_from(LOCATION_CSV.as_bytes()).unwrap();
        let times: Vec<f64> = samples.iter().map(|s| s.time).collect();
        assert_eq!(times, vec![0.0, 2.0, 4.0]);
        assert_eq!(samples[0].altitude, Some(40.0));
        // Height is optional: an empty cell keeps the row.
        assert_eq!(samples[2].altitude, None);
    }

    #[test]
    fn test_orientation_column_order_irrelevant() {
        let samples = read_orientations_from(ORIENTATION_CSV.as_bytes()).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0], OrientationSample::new(0.0, 12.0, 2.5, 1.5));
        assert_eq!(samples[1], OrientationSample::new(0.5, 10.0, 2.0, 1.0));
    }

    #[test]
    fn test_location_without_height_column() {
        let csv = "Time (s),Latitude (°),Longitude (°)\n0,35,139\n";
        let samples = read_locations_from(csv.as_bytes()).unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].altitude, None);
    }

    #[test]
    fn test_missing_required_column() {
        let csv = "Time (s),Latitude (°)\n0,35\n";
        let err = read_locations_from(csv.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            TripError::MissingColumn {
                column: LONGITUDE_COLUMN,
                ..
            }
        ));
    }

    #[test]
    fn test_bom_in_first_header() {
        let csv = "\u{feff}Time (s),Yaw (°),Pitch (°),Roll (°)\n0,1,2,3\n";
        let samples = read_orientations_from(csv.as_bytes()).unwrap();
        assert_eq!(samples.len(), 1);
    }

    #[test]
    fn test_out_of_range_coordinates_dropped() {
        let locations = vec![
            LocationSample::new(0.0, 95.0, 0.0, None),
            LocationSample::new(1.0, 10.0, 200.0, None),
            LocationSample::new(2.0, 10.0, 20.0, None),
        ];
        let orientations = vec![OrientationSample::new(0.0, 0.0, 0.0, 0.0)];
        let store = SampleStore::new(locations, orientations).unwrap();
        assert_eq!(store.locations().len(), 1);
        assert_eq!(store.locations()[0].time, 2.0);
    }

    #[test]
    fn test_empty_series_rejected() {
        let locations = vec![LocationSample::new(0.0, 35.0, 139.0, None)];
        let err = SampleStore::new(locations, Vec::new()).unwrap_err();
        assert!(matches!(err, TripError::EmptySeries { table: "Orientation" }));

        let orientations = vec![OrientationSample::new(0.0, 0.0, 0.0, 0.0)];
        let err = SampleStore::new(Vec::new(), orientations).unwrap_err();
        assert!(matches!(err, TripError::EmptySeries { table: "Location" }));
    }

    #[test]
    fn test_missing_file_reported() {
        let err = read_locations("/nonexistent/Location.csv").unwrap_err();
        match err {
            TripError::MissingInput { path, .. } => assert!(path.contains("Location.csv")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_non_utf8_rows_dropped() {
        let csv: &[u8] = b"Time (s),Yaw (\xc2\xb0),Pitch (\xc2\xb0),Roll (\xc2\xb0)\n0,1,2,3\n1,\xff\xfe,2,3\n2,1,2,3\n";
        let samples = read_orientations_from(csv).unwrap();
        let times: Vec<f64> = samples.iter().map(|s| s.time).collect();
        assert_eq!(times, vec![0.0, 2.0]);

        let csv: &[u8] = b"Time (s),Latitude (\xc2\xb0),Longitude (\xc2\xb0),Height (m)\n0,35,139,\xff\n1,35.1\xfe,139,1\n";
        let samples = read_locations_from(csv).unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].altitude, None);
    }

    #[test]
    fn test_corrupt_gzip_is_input_error() {
        let path = std::env::temp_dir().join(format!("trip_store_corrupt_{}.csv.gz", std::process::id()));
        std::fs::write(&path, b"not a gzip stream").unwrap();
        let err = read_orientations(&path).unwrap_err();
        assert!(err.is_input_error(), "unexpected error: {err}");
        assert!(matches!(err, TripError::MissingInput { .. }));
    }

    #[test]
    fn test_stable_sort_on_equal_timestamps() {
        let orientations = vec![
            OrientationSample::new(1.0, 1.0, 0.0, 0.0),
            OrientationSample::new(0.0, 0.0, 0.0, 0.0),
            OrientationSample::new(1.0, 2.0, 0.0, 0.0),
        ];
        let locations = vec![LocationSample::new(0.0, 35.0, 139.0, None)];
        let store = SampleStore::new(locations, orientations).unwrap();
        let yaws: Vec<f64> = store.orientations().iter().map(|o| o.yaw).collect();
        assert_eq!(yaws, vec![0.0, 1.0, 2.0]);
    }
}
