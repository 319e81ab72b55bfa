//! # Constants and type definitions for magtrack
//!
//! This module centralizes the **geodetic constants**, **processing defaults**, and **common
//! type aliases** used throughout the `magtrack` library.
//!
//! ## Overview
//!
//! - Spherical-Earth radius used by the Haversine distance
//! - Default tolerances of the segmentation, conversion and leveling stages
//! - Unit type aliases shared across the crate
//! - The (cruise, line) key used to index leveling corrections
//!
//! These definitions are used by all main modules: segmentation, line-survey conversion
//! and leveling.

// -------------------------------------------------------------------------------------------------
// Geodetic constants
// -------------------------------------------------------------------------------------------------

/// Mean Earth radius in meters (spherical model used by every distance in the crate)
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Meters in one kilometer
pub const METERS_PER_KM: f64 = 1_000.0;

/// Hours in a day
pub const HOURS_PER_DAY: f64 = 24.0;

// -------------------------------------------------------------------------------------------------
// Processing defaults
// -------------------------------------------------------------------------------------------------

/// Default RDP tolerance (degrees)
pub const DEFAULT_RDP_EPSILON: Degree = 0.001;

/// Default minimum length of a `main` segment (meters)
pub const DEFAULT_MIN_SEGMENT_LENGTH: Meter = 2_000.0;

/// Default extension of raw track files
pub const TRK_EXTENSION: &str = "trk";

/// Default extension of per-line position/anomaly files
pub const LLA_EXTENSION: &str = "lla";

/// Minimum number of valid rows for a line file to be converted
pub const DEFAULT_MIN_VALID_ROWS: usize = 2;

/// Default iteration cap of the iterative leveling pass
pub const DEFAULT_MAX_ITER: usize = 10;

/// Default convergence tolerance of the iterative leveling pass (nT)
pub const DEFAULT_LEVELING_TOL: f64 = 1e-4;

/// Default basename of the crossover solver files (`merged.lsd`, `merged.lwt`, ...)
pub const DEFAULT_BASENAME: &str = "merged";

/// Name of the line-number → filename mapping file
pub const LINE_MAPPING_FILENAME: &str = "line_index_map.csv";

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Distance in kilometers
pub type Kilometer = f64;
/// Distance in meters
pub type Meter = f64;
/// Magnetic anomaly in nanotesla
pub type NanoTesla = f64;
/// Continuous day-of-year (integer day + fraction of day)
pub type DoyTime = f64;

/// Key identifying one survey line across the crossover files: `(cruise, line)`.
///
/// In the line-survey format the cruise is the track identifier of the first column.
pub type LineKey = (i64, i64);
