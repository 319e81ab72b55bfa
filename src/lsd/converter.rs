//! # `.lla` → `.lsd` conversion and merge
//!
//! Each input file is one survey line. Files are processed in **file-name order** and the
//! file at 1-based position `i` becomes line `i`; this numbering is recorded in a
//! `line_number,filename` CSV so that solver output can be traced back to its source file.
//!
//! Per line
//! -----------------
//! * `doy_time = doy + (hour + minute/60 + second/3600) / 24`
//! * `distance_km[0] = 0`, `distance_km[i] = distance_km[i-1] + haversine(row[i-1], row[i])`
//!   in input order, never re-sorted.
//! * `lon_west = lon - 360` when `lon > 180`.
//!
//! Error policy
//! -----------------
//! * Invalid rows are dropped by the reader.
//! * A file left with fewer than `min_valid_rows` rows, or that cannot be read, contributes no
//!   record but keeps its line number and its mapping entry; the merge carries on.
use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    constants::{DEFAULT_MIN_VALID_ROWS, LLA_EXTENSION},
    geodesy::{haversine, DistanceUnit},
    input_files::list_input_files,
    lsd::{
        lla_reader::{read_lla, LlaRow},
        normalize_lon_west, write_lsd, LineRecord,
    },
    magtrack_errors::MagTrackError,
};

/// Convert the valid rows of one line into line-survey records.
pub fn convert_one(rows: &[LlaRow], line_number: u32) -> Vec<LineRecord> {
    let mut distance_km = 0.0;
    let mut previous: Option<&LlaRow> = None;

    rows.iter()
        .map(|row| {
            if let Some(prev) = previous {
                distance_km += haversine(
                    prev.lon,
                    prev.lat,
                    row.lon,
                    row.lat,
                    DistanceUnit::Kilometers,
                );
            }
            previous = Some(row);

            LineRecord {
                track_id: row.track_id,
                line_number,
                year: row.time.year,
                doy_time: row.time.doy_time(),
                lon_west: normalize_lon_west(row.lon),
                lat: row.lat,
                anomaly: row.anomaly,
                distance_km,
            }
        })
        .collect()
}

/// Read and convert one `.lla` file.
///
/// Return
/// ----------
/// * The records of the line, or an empty vector when fewer than `params.min_valid_rows`
///   rows survive validation.
///
/// Errors
/// ----------
/// * [`MagTrackError::ReadError`] if the file cannot be read.
pub fn convert_file(
    path: &Utf8Path,
    line_number: u32,
    params: &ConverterParams,
) -> Result<Vec<LineRecord>, MagTrackError> {
    let rows = read_lla(path)?;
    if rows.len() < params.min_valid_rows {
        warn!(
            "Skipping {}: not enough valid rows ({})",
            path.file_name().unwrap_or_default(),
            rows.len()
        );
        return Ok(Vec::new());
    }
    Ok(convert_one(&rows, line_number))
}

/// Line number assigned to one input file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineMapping {
    pub line_number: u32,
    pub filename: String,
}

/// Merged records of all lines plus the line-number mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedSurvey {
    pub records: Vec<LineRecord>,
    pub mapping: Vec<LineMapping>,
}

/// Convert every file and merge the records in line-number order.
///
/// `files` is sorted by file name before numbering, whatever order it is given in.
pub fn convert_and_merge_all(
    files: &[Utf8PathBuf],
    params: &ConverterParams,
) -> Result<MergedSurvey, MagTrackError> {
    let mut files = files.to_vec();
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    let mut merged = MergedSurvey::default();
    for (file, line_number) in files.iter().zip(1u32..) {
        let filename = file
            .file_name()
            .ok_or_else(|| MagTrackError::Utf8PathError(format!("{file} has no file name")))?
            .to_string();
        info!("{filename} → line {line_number}");

        match convert_file(file, line_number, params) {
            Ok(records) => merged.records.extend(records),
            Err(e @ MagTrackError::ReadError { .. }) => {
                warn!("{e}, no records for line {line_number}")
            }
            Err(e) => return Err(e),
        }
        merged.mapping.push(LineMapping {
            line_number,
            filename,
        });
    }
    Ok(merged)
}

/// Write the line-number mapping as a CSV with a `line_number,filename` header.
pub fn write_line_mapping(path: &Utf8Path, mapping: &[LineMapping]) -> Result<(), MagTrackError> {
    let mut writer = csv::Writer::from_path(path)?;
    for m in mapping {
        writer.serialize(m)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read back a mapping written by [`write_line_mapping`].
pub fn read_line_mapping(path: &Utf8Path) -> Result<Vec<LineMapping>, MagTrackError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mapping = reader.deserialize().collect::<Result<Vec<LineMapping>, _>>()?;
    Ok(mapping)
}

/// Convert every `*.<extension>` file of `lla_dir`, then write the merged `.lsd` and the
/// mapping CSV.
///
/// Errors
/// ----------
/// * [`MagTrackError::NoInputError`] if `lla_dir` holds no matching file.
pub fn convert_directory(
    lla_dir: &Utf8Path,
    output_lsd: &Utf8Path,
    mapping_csv: &Utf8Path,
    params: &ConverterParams,
) -> Result<MergedSurvey, MagTrackError> {
    let files = list_input_files(lla_dir, &params.extension)?;
    let merged = convert_and_merge_all(&files, params)?;

    write_lsd(output_lsd, &merged.records)?;
    write_line_mapping(mapping_csv, &merged.mapping)?;
    info!("Merged LSD: {output_lsd}");
    info!("Mapping CSV: {mapping_csv}");
    Ok(merged)
}

/// Conversion parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ConverterParams {
    /// Extension of the per-line input files
    pub extension: String,
    /// Files with fewer valid rows than this are skipped
    pub min_valid_rows: usize,
}

impl ConverterParams {
    pub fn builder() -> ConverterParamsBuilder {
        ConverterParamsBuilder::default()
    }
}

impl Default for ConverterParams {
    fn default() -> Self {
        ConverterParams {
            extension: LLA_EXTENSION.to_string(),
            min_valid_rows: DEFAULT_MIN_VALID_ROWS,
        }
    }
}

/// Builder for [`ConverterParams`], with validation.
#[derive(Debug, Clone, Default)]
pub struct ConverterParamsBuilder {
    params: ConverterParams,
}

impl ConverterParamsBuilder {
    pub fn extension(mut self, v: impl Into<String>) -> Self {
        self.params.extension = v.into();
        self
    }
    pub fn min_valid_rows(mut self, v: usize) -> Self {
        self.params.min_valid_rows = v;
        self
    }

    pub fn build(self) -> Result<ConverterParams, MagTrackError> {
        if self.params.min_valid_rows == 0 {
            return Err(MagTrackError::InvalidParameter(
                "min_valid_rows must be >= 1".into(),
            ));
        }
        let extension = self.params.extension.trim_start_matches('.').to_string();
        if extension.is_empty() {
            return Err(MagTrackError::InvalidParameter(
                "extension must not be empty".into(),
            ));
        }
        Ok(ConverterParams {
            extension,
            ..self.params
        })
    }
}

impl fmt::Display for ConverterParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            writeln!(f, "Conversion Parameters")?;
            writeln!(f, "---------------------")?;
            writeln!(f, "  extension      = {:<8} # per-line input files", self.extension)?;
            write!(
                f,
                "  min_valid_rows = {:<8} # fewer valid rows: line skipped",
                self.min_valid_rows
            )
        } else {
            write!(
                f,
                "ConverterParams(*.{}, min_valid_rows={})",
                self.extension, self.min_valid_rows
            )
        }
    }
}

#[cfg(test)]
mod converter_test {
    use super::*;
    use crate::time::SurveyTime;
    use approx::assert_abs_diff_eq;

    fn row(hhmmss: &str, lon: f64, lat: f64) -> LlaRow {
        LlaRow {
            track_id: 211,
            time: SurveyTime::parse("20240610", hhmmss).unwrap(),
            lon,
            lat,
            anomaly: 10.0,
        }
    }

    #[test]
    fn test_convert_one() {
        let rows = [
            row("000000", 359.0, 0.0),
            row("060000", 359.5, 0.0),
            row("120000", 0.5, 0.0),
        ];
        let records = convert_one(&rows, 4);

        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.line_number == 4 && r.year == 2024));
        assert_eq!(records[0].distance_km, 0.0);
        assert_abs_diff_eq!(records[1].distance_km, 55.597, epsilon = 1e-3);
        // across the prime meridian: 359.5 → 0.5 is one degree
        assert_abs_diff_eq!(records[2].distance_km, 55.597 + 111.195, epsilon = 2e-3);

        assert_eq!(records[0].lon_west, -1.0);
        assert_eq!(records[2].lon_west, 0.5);
        assert_abs_diff_eq!(records[1].doy_time, 162.25, epsilon = 1e-12);
    }

    #[test]
    fn test_distance_is_monotonic() {
        let rows: Vec<LlaRow> = (0..20)
            .map(|i| row("000000", 140.0 + (i as f64 * 0.3).sin() * 0.01, i as f64 * 0.01))
            .collect();
        let records = convert_one(&rows, 1);
        assert!(records
            .windows(2)
            .all(|w| w[1].distance_km >= w[0].distance_km));
    }

    #[test]
    fn test_builder_validation() {
        assert!(ConverterParams::builder().min_valid_rows(0).build().is_err());
        assert!(ConverterParams::builder().extension("").build().is_err());
        assert_eq!(
            ConverterParams::builder().extension(".lla").build().unwrap(),
            ConverterParams::default()
        );
    }

    #[test]
    fn test_display() {
        let p = ConverterParams::default();
        assert_eq!(p.to_string(), "ConverterParams(*.lla, min_valid_rows=2)");
        assert_eq!(
            format!("{p:#}"),
            "Conversion Parameters\n\
             ---------------------\n  \
             extension      = lla      # per-line input files\n  \
             min_valid_rows = 2        # fewer valid rows: line skipped"
        );
    }
}
