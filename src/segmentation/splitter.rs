//! # Segment writers and directory driver
//!
//! Output layout of one driver invocation:
//!
//! ```text
//! <input_dir>/splittedTRK_YYYYMMDD_HHMMSS/
//!     main_tracks/<stem>_track00.trk
//!     skipped_tracks/<stem>_track01.trk
//!     <stem>_segments.csv
//! ```
//!
//! Segment files keep the raw four-column layout with fixed precision
//! (`<int time> <lon %.7f> <lat %.7f> <mag %.1f>`). The `_segments.csv` table records the
//! segment id and category of every input point and exists only for visualisation.
use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use hifitime::Epoch;
use serde::Serialize;
use tracing::{info, warn};

use crate::{
    constants::METERS_PER_KM,
    input_files::{list_input_files, stem_of},
    magtrack_errors::MagTrackError,
    segmentation::{
        segment, trk_reader::read_trk, SegmentCategory, SegmentationResult, SegmenterParams,
        TrackPoint,
    },
    time::run_tag,
};

pub const MAIN_TRACKS_DIR: &str = "main_tracks";
pub const SKIPPED_TRACKS_DIR: &str = "skipped_tracks";

/// Format one sample in the segment-file layout.
pub fn format_trk_point(p: &TrackPoint) -> String {
    format!(
        "{} {:.7} {:.7} {:.1}",
        p.time.trunc() as i64,
        p.lon,
        p.lat,
        p.mag
    )
}

#[derive(Debug, Serialize)]
struct AssignmentRow {
    unixtime: i64,
    lon: f64,
    lat: f64,
    mag: f64,
    track: usize,
    category: SegmentCategory,
}

/// Files written for one segmented track.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitOutput {
    pub main_files: Vec<Utf8PathBuf>,
    pub skipped_files: Vec<Utf8PathBuf>,
    pub assignment_file: Option<Utf8PathBuf>,
}

/// Write every segment of `result` under `base_dir` and the per-point assignment table.
///
/// An empty result writes nothing.
pub fn write_segments(
    result: &SegmentationResult,
    stem: &str,
    base_dir: &Utf8Path,
) -> Result<SplitOutput, MagTrackError> {
    let mut output = SplitOutput::default();
    if result.is_empty() {
        return Ok(output);
    }

    let main_dir = base_dir.join(MAIN_TRACKS_DIR);
    let skip_dir = base_dir.join(SKIPPED_TRACKS_DIR);
    fs::create_dir_all(&main_dir)?;
    fs::create_dir_all(&skip_dir)?;

    for s in &result.segments {
        let (dir, files) = match s.category {
            SegmentCategory::Main => (&main_dir, &mut output.main_files),
            SegmentCategory::Skipped => (&skip_dir, &mut output.skipped_files),
        };
        let path = dir.join(format!("{stem}_track{:02}.trk", s.id));
        let body = result
            .points_of(s)
            .iter()
            .map(format_trk_point)
            .collect::<Vec<_>>()
            .join("\n");
        fs::write(&path, body)?;

        info!(
            "Saved {} segment {} ({:.2} km)",
            s.category,
            path.file_name().unwrap_or_default(),
            s.length_m / METERS_PER_KM
        );
        files.push(path);
    }

    let csv_path = base_dir.join(format!("{stem}_segments.csv"));
    let mut writer = csv::Writer::from_path(&csv_path)?;
    for (p, a) in result.points.iter().zip(result.assignment()) {
        writer.serialize(AssignmentRow {
            unixtime: p.time.trunc() as i64,
            lon: p.lon,
            lat: p.lat,
            mag: p.mag,
            track: a.segment_id,
            category: a.category,
        })?;
    }
    writer.flush()?;
    output.assignment_file = Some(csv_path);

    Ok(output)
}

/// Read, segment and write one raw track file into `base_dir`.
///
/// Errors
/// ----------
/// * [`MagTrackError::ReadError`] if the file cannot be parsed.
pub fn split_file(
    path: &Utf8Path,
    base_dir: &Utf8Path,
    params: &SegmenterParams,
) -> Result<SplitOutput, MagTrackError> {
    info!("Splitting {}", path.file_name().unwrap_or_default());
    let points = read_trk(path)?;
    if points.is_empty() {
        warn!("{path} has no usable rows, nothing to do");
        return Ok(SplitOutput::default());
    }

    let result = segment(&points, params);
    write_segments(&result, stem_of(path)?, base_dir)
}

/// Summary of a directory run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitReport {
    pub base_dir: Utf8PathBuf,
    pub outputs: Vec<(Utf8PathBuf, SplitOutput)>,
    /// Inputs skipped because they could not be read
    pub failed: Vec<Utf8PathBuf>,
}

impl SplitReport {
    /// Directory holding the `main` segments, the input of the line-survey conversion.
    pub fn main_dir(&self) -> Utf8PathBuf {
        self.base_dir.join(MAIN_TRACKS_DIR)
    }
}

/// Segment every `*.<extension>` file of `input_dir` into `base_dir`.
///
/// Files are processed in file-name order. A file that cannot be read is logged and skipped.
///
/// Errors
/// ----------
/// * [`MagTrackError::NoInputError`] if `input_dir` holds no matching file.
pub fn split_directory_into(
    input_dir: &Utf8Path,
    base_dir: &Utf8Path,
    params: &SegmenterParams,
) -> Result<SplitReport, MagTrackError> {
    let files = list_input_files(input_dir, &params.extension)?;
    fs::create_dir_all(base_dir)?;

    let mut report = SplitReport {
        base_dir: base_dir.to_path_buf(),
        ..Default::default()
    };
    for file in files {
        match split_file(&file, base_dir, params) {
            Ok(output) => report.outputs.push((file, output)),
            Err(e @ MagTrackError::ReadError { .. }) => {
                warn!("{e}, skipped");
                report.failed.push(file);
            }
            Err(e) => return Err(e),
        }
    }
    Ok(report)
}

/// Segment every raw track of `input_dir` into a fresh `splittedTRK_<UTC tag>` directory
/// next to the inputs.
pub fn split_directory(
    input_dir: &Utf8Path,
    params: &SegmenterParams,
) -> Result<SplitReport, MagTrackError> {
    let base_dir = input_dir.join(format!("splittedTRK_{}", run_tag(Epoch::now()?)));
    split_directory_into(input_dir, &base_dir, params)
}

#[cfg(test)]
mod splitter_test {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_format_trk_point() {
        let p = TrackPoint {
            time: 1718000000.9,
            lon: 142.123456789,
            lat: -38.5,
            mag: -120.04,
        };
        assert_eq!(format_trk_point(&p), "1718000000 142.1234568 -38.5000000 -120.0");
    }

    #[test]
    fn test_write_segments_layout() {
        let tmp = TempDir::new().unwrap();
        let base = Utf8Path::from_path(tmp.path()).unwrap();

        let points = vec![
            TrackPoint { time: 0.0, lon: 10.0, lat: 0.0, mag: 100.0 },
            TrackPoint { time: 10.0, lon: 10.001, lat: 0.0, mag: 101.0 },
            TrackPoint { time: 20.0, lon: 10.1, lat: 0.0, mag: 102.0 },
        ];
        let params = SegmenterParams::builder()
            .epsilon(0.01)
            .min_length(5000.0)
            .build()
            .unwrap();
        let result = segment(&points, &params);
        let output = write_segments(&result, "GS24", base).unwrap();

        assert_eq!(output.main_files, vec![base.join("main_tracks/GS24_track00.trk")]);
        assert!(output.skipped_files.is_empty());
        assert_eq!(
            fs::read_to_string(&output.main_files[0]).unwrap(),
            "0 10.0000000 0.0000000 100.0\n10 10.0010000 0.0000000 101.0\n20 10.1000000 0.0000000 102.0"
        );

        let csv = fs::read_to_string(output.assignment_file.unwrap()).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("unixtime,lon,lat,mag,track,category"));
        assert_eq!(lines.next(), Some("0,10.0,0.0,100.0,0,main"));
        assert_eq!(lines.count(), 2);
    }

    #[test]
    fn test_empty_result_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let base = Utf8Path::from_path(tmp.path()).unwrap();
        let output = write_segments(&SegmentationResult::default(), "x", base).unwrap();
        assert_eq!(output, SplitOutput::default());
        assert!(!base.join(MAIN_TRACKS_DIR).exists());
    }
}
