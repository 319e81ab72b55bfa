//! # Track segmentation
//!
//! Splits one ordered survey track into **straight-line legs**. Breakpoints come from a
//! Ramer–Douglas–Peucker pass over the `(lon, lat)` polyline; every original sample is kept
//! and lands in exactly one segment. Each segment is then classified by its along-track
//! great-circle length as [`SegmentCategory::Main`] (long enough to be a survey line) or
//! [`SegmentCategory::Skipped`] (turns, transits and other short pieces).
//!
//! Modules
//! -----------------
//! * [`rdp`](crate::segmentation::rdp) – Retained-vertex mask of the RDP simplification.
//! * [`trk_reader`](crate::segmentation::trk_reader) – `.trk` reader (`unixtime lon lat mag`).
//! * [`splitter`](crate::segmentation::splitter) – File and directory drivers writing one
//!   `.trk` per segment plus the per-point assignment table.
//!
//! Invariants
//! -----------------
//! * Segments partition the input: concatenating their ranges gives `0..points.len()`.
//! * Segment ids are sequential from zero in track order.
//! * The first input point opens the first segment and the last input point closes the last.
//! * `length_m >= min_length` ⇔ `Main`.
//!
//! Example
//! -----------------
//! ```rust
//! use magtrack::segmentation::{segment, SegmentCategory, SegmenterParams, TrackPoint};
//!
//! let points = vec![
//!     TrackPoint { time: 0.0, lon: 10.0, lat: 0.0, mag: 100.0 },
//!     TrackPoint { time: 10.0, lon: 10.001, lat: 0.0, mag: 101.0 },
//!     TrackPoint { time: 20.0, lon: 10.1, lat: 0.0, mag: 102.0 },
//! ];
//! let params = SegmenterParams::builder()
//!     .epsilon(0.01)
//!     .min_length(5_000.0)
//!     .build()
//!     .unwrap();
//!
//! let result = segment(&points, &params);
//! assert_eq!(result.segments.len(), 1);
//! assert_eq!(result.segments[0].category, SegmentCategory::Main);
//! ```
use std::fmt;
use std::ops::Range;

use serde::Serialize;
use tracing::info;

use crate::{
    constants::{
        Degree, Meter, NanoTesla, DEFAULT_MIN_SEGMENT_LENGTH, DEFAULT_RDP_EPSILON,
        METERS_PER_KM, TRK_EXTENSION,
    },
    geodesy::{path_length, DistanceUnit},
    magtrack_errors::MagTrackError,
};

pub mod rdp;
pub mod splitter;
pub mod trk_reader;

/// One raw survey sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackPoint {
    /// Unix time (seconds)
    pub time: f64,
    pub lon: Degree,
    pub lat: Degree,
    pub mag: NanoTesla,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentCategory {
    Main,
    Skipped,
}

impl SegmentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentCategory::Main => "main",
            SegmentCategory::Skipped => "skipped",
        }
    }
}

impl fmt::Display for SegmentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A contiguous run of track points between two RDP breakpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub id: usize,
    pub category: SegmentCategory,
    /// Sum of the great-circle distances between consecutive points of the segment
    pub length_m: Meter,
    /// Row range in the input track (half-open)
    pub range: Range<usize>,
}

/// Segment id and category of one input point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointAssignment {
    pub segment_id: usize,
    pub category: SegmentCategory,
}

/// Output of [`segment`]: the input points and the segments partitioning them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentationResult {
    pub points: Vec<TrackPoint>,
    pub segments: Vec<Segment>,
}

impl SegmentationResult {
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Points belonging to `segment`.
    pub fn points_of(&self, segment: &Segment) -> &[TrackPoint] {
        &self.points[segment.range.clone()]
    }

    /// One entry per input point, in input order.
    pub fn assignment(&self) -> Vec<PointAssignment> {
        self.segments
            .iter()
            .flat_map(|s| {
                s.range.clone().map(move |_| PointAssignment {
                    segment_id: s.id,
                    category: s.category,
                })
            })
            .collect()
    }

    pub fn count(&self, category: SegmentCategory) -> usize {
        self.segments
            .iter()
            .filter(|s| s.category == category)
            .count()
    }
}

/// Split `points` into straight-line segments and classify them by length.
///
/// Arguments
/// -----------------
/// * `points` – Time-ordered samples; non-finite rows must already be removed
///   (see [`trk_reader`](crate::segmentation::trk_reader)).
/// * `params` – RDP tolerance (degrees) and minimum `main` length (meters).
///
/// Return
/// ----------
/// * The segmentation. Empty input yields an empty result.
///
/// Breakpoints
/// -----------------
/// The RDP-retained indices `i_0 = 0 < i_1 < … < i_k = n - 1` delimit the segments
/// `[i_0, i_1), [i_1, i_2), …, [i_{k-1}, n)`: the last segment also takes the final point, so
/// the final breakpoint never forms a one-point segment of its own. A single-point track gives
/// one segment of length zero.
pub fn segment(points: &[TrackPoint], params: &SegmenterParams) -> SegmentationResult {
    if points.is_empty() {
        info!("Empty track, nothing to segment");
        return SegmentationResult::default();
    }

    let coords: Vec<(Degree, Degree)> = points.iter().map(|p| (p.lon, p.lat)).collect();
    let mask = rdp::rdp_mask(&coords, params.epsilon);

    let mut breakpoints: Vec<usize> = mask
        .iter()
        .enumerate()
        .filter_map(|(i, &kept)| kept.then_some(i))
        .collect();
    let n = points.len();
    // rdp_mask always keeps both ends; the forcing keeps the invariant explicit
    if breakpoints.first() != Some(&0) {
        breakpoints.insert(0, 0);
    }
    if breakpoints.last() != Some(&(n - 1)) {
        breakpoints.push(n - 1);
    }
    if breakpoints.len() > 1 {
        breakpoints.pop();
    }
    breakpoints.push(n);

    let segments = breakpoints
        .windows(2)
        .enumerate()
        .map(|(id, w)| {
            let range = w[0]..w[1];
            let length_m = path_length(
                coords[range.clone()].iter().copied(),
                DistanceUnit::Meters,
            );
            let category = if length_m >= params.min_length {
                SegmentCategory::Main
            } else {
                SegmentCategory::Skipped
            };
            Segment {
                id,
                category,
                length_m,
                range,
            }
        })
        .collect();

    SegmentationResult {
        points: points.to_vec(),
        segments,
    }
}

/// Segmentation parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmenterParams {
    /// RDP tolerance (degrees)
    pub epsilon: Degree,
    /// Minimum along-track length of a `main` segment (meters)
    pub min_length: Meter,
    /// Extension of the raw track files picked up by the directory driver
    pub extension: String,
}

impl SegmenterParams {
    pub fn builder() -> SegmenterParamsBuilder {
        SegmenterParamsBuilder::new()
    }
}

impl Default for SegmenterParams {
    fn default() -> Self {
        SegmenterParams {
            epsilon: DEFAULT_RDP_EPSILON,
            min_length: DEFAULT_MIN_SEGMENT_LENGTH,
            extension: TRK_EXTENSION.to_string(),
        }
    }
}

/// Builder for [`SegmenterParams`], with validation.
#[derive(Debug, Clone, Default)]
pub struct SegmenterParamsBuilder {
    params: SegmenterParams,
}

impl SegmenterParamsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn epsilon(mut self, v: Degree) -> Self {
        self.params.epsilon = v;
        self
    }
    pub fn min_length(mut self, v: Meter) -> Self {
        self.params.min_length = v;
        self
    }
    /// Convenience setter in kilometers, the unit survey planners usually think in.
    pub fn min_length_km(mut self, v: f64) -> Self {
        self.params.min_length = v * METERS_PER_KM;
        self
    }
    pub fn extension(mut self, v: impl Into<String>) -> Self {
        self.params.extension = v.into();
        self
    }

    pub fn build(self) -> Result<SegmenterParams, MagTrackError> {
        let p = &self.params;
        if !(p.epsilon.is_finite() && p.epsilon >= 0.0) {
            return Err(MagTrackError::InvalidParameter(
                "epsilon must be finite and >= 0".into(),
            ));
        }
        if !(p.min_length.is_finite() && p.min_length >= 0.0) {
            return Err(MagTrackError::InvalidParameter(
                "min_length must be finite and >= 0".into(),
            ));
        }
        if p.extension.trim_start_matches('.').is_empty() {
            return Err(MagTrackError::InvalidParameter(
                "extension must not be empty".into(),
            ));
        }
        let mut params = self.params;
        params.extension = params.extension.trim_start_matches('.').to_string();
        Ok(params)
    }
}

impl fmt::Display for SegmenterParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            writeln!(f, "Segmentation Parameters")?;
            writeln!(f, "-----------------------")?;
            writeln!(f, "  epsilon    = {:<12} # RDP tolerance [deg]", self.epsilon)?;
            writeln!(
                f,
                "  min_length = {:<12} # shortest main segment [m]",
                self.min_length
            )?;
            write!(f, "  extension  = {:<12} # raw track files", self.extension)
        } else {
            write!(
                f,
                "SegmenterParams(epsilon={}, min_length={} m, *.{})",
                self.epsilon, self.min_length, self.extension
            )
        }
    }
}
