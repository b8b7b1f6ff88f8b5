//! Trip kinematics: align phone location and orientation logs by timestamp and
//! derive distance, speed and trip summary statistics.

pub mod align;
pub mod config;
pub mod error;
pub mod export;
pub mod kinematics;
pub mod pipeline;
pub mod session;
pub mod store;
pub mod summary;
pub mod types;

pub use error::{TripError, TripResult};
pub use store::SampleStore;
pub use summary::TripSummary;
pub use types::{AlignedSample, GeoPoint, LocationSample, OrientationSample, SegmentKinematics, TrackPoint};
