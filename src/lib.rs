//! # magtrack
//!
//! Processing of marine geomagnetic survey tracks, from raw position/anomaly traces to a
//! crossover-leveled line survey ready for gridding:
//!
//! 1. [`segmentation`] – split raw tracks into straight legs (RDP) and keep the long ones.
//! 2. [`lsd`] – convert per-line files into the merged fixed-width line-survey format.
//! 3. *(external)* the crossover solver turns the `.lsd` into weighted offset observations.
//! 4. [`leveling`] – average the observations per line and apply the offsets.
pub mod constants;
pub mod geodesy;
pub mod input_files;
pub mod leveling;
pub mod lsd;
pub mod magtrack_errors;
pub mod segmentation;
pub mod time;

pub use constants::{Degree, Kilometer, LineKey, Meter};
pub use geodesy::{haversine, DistanceUnit};
pub use leveling::{corrector::LwtCorrector, CrossoverFiles, LevelingParams, OffsetSource};
pub use lsd::{converter::ConverterParams, LineRecord};
pub use magtrack_errors::MagTrackError;
pub use segmentation::{segment, SegmenterParams, TrackPoint};
