//! # Line-survey (`.lsd`) format
//!
//! The unified per-sample record consumed by the crossover solver. One line per sample,
//! eight space-separated fixed-width fields:
//!
//! ```text
//! <track:4d> <line:5d> <year:4d> <doy_time:12.7f> <lon_west:10.5f> <lat:9.5f> <anomaly:8.2f> <distance_km:10.2f>
//! ```
//!
//! The widths and precisions are part of the solver's input contract and are reproduced
//! exactly by the [`Display`](std::fmt::Display) impl of [`LineRecord`].
//!
//! Modules
//! -----------------
//! * [`lla_reader`](crate::lsd::lla_reader) – Validating reader of the per-line `.lla` inputs.
//! * [`converter`](crate::lsd::converter) – `.lla` → `.lsd` conversion, multi-file merge and
//!   the line-number mapping table.
use std::fmt;
use std::str::FromStr;

use camino::Utf8Path;

use crate::{
    constants::{Degree, DoyTime, Kilometer, LineKey, NanoTesla},
    magtrack_errors::{MagTrackError, ParseRowError},
};

pub mod converter;
pub mod lla_reader;

const LSD_FIELDS: usize = 8;

/// Map a longitude to the `(-180, 180]` convention (values above 180 lose 360).
pub fn normalize_lon_west(lon: Degree) -> Degree {
    if lon > 180.0 {
        lon - 360.0
    } else {
        lon
    }
}

/// One sample of the merged line-survey file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineRecord {
    /// Track (cruise) identifier from the first input column
    pub track_id: i64,
    /// 1-based line number assigned from the sorted input file order
    pub line_number: u32,
    pub year: i32,
    pub doy_time: DoyTime,
    pub lon_west: Degree,
    pub lat: Degree,
    pub anomaly: NanoTesla,
    /// Along-track distance from the first sample of the line
    pub distance_km: Kilometer,
}

impl LineRecord {
    /// `(cruise, line)` key used to look up leveling corrections.
    pub fn key(&self) -> LineKey {
        (self.track_id, self.line_number as i64)
    }
}

impl fmt::Display for LineRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:4} {:5} {:4} {:12.7} {:10.5} {:9.5} {:8.2} {:10.2}",
            self.track_id,
            self.line_number,
            self.year,
            self.doy_time,
            self.lon_west,
            self.lat,
            self.anomaly,
            self.distance_km
        )
    }
}

impl FromStr for LineRecord {
    type Err = ParseRowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = s.split_whitespace().collect();
        if tokens.len() != LSD_FIELDS {
            return Err(ParseRowError::WrongFieldCount {
                expected: LSD_FIELDS,
                found: tokens.len(),
            });
        }

        Ok(LineRecord {
            track_id: parse_field(tokens[0])?,
            line_number: parse_field(tokens[1])?,
            year: parse_field(tokens[2])?,
            doy_time: parse_finite(tokens[3])?,
            lon_west: parse_finite(tokens[4])?,
            lat: parse_finite(tokens[5])?,
            anomaly: parse_finite(tokens[6])?,
            distance_km: parse_finite(tokens[7])?,
        })
    }
}

/// Parse one whitespace-delimited token, keeping it in the error on failure.
pub(crate) fn parse_field<T: FromStr>(token: &str) -> Result<T, ParseRowError> {
    token
        .parse()
        .map_err(|_| ParseRowError::InvalidNumber(token.to_string()))
}

/// Parse one numeric token and reject NaN and ±∞.
pub(crate) fn parse_finite(token: &str) -> Result<f64, ParseRowError> {
    let v: f64 = parse_field(token)?;
    if v.is_finite() {
        Ok(v)
    } else {
        Err(ParseRowError::NonFinite(token.to_string()))
    }
}

/// Read a merged `.lsd` file.
///
/// The file is a required input of the leveling stage, so any malformed line fails the read.
pub fn read_lsd(path: &Utf8Path) -> Result<Vec<LineRecord>, MagTrackError> {
    let content =
        std::fs::read_to_string(path).map_err(|e| MagTrackError::read_error(path, e))?;
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            line.parse::<LineRecord>()
                .map_err(|e| MagTrackError::read_error(path, format!("line {}: {e}", i + 1)))
        })
        .collect()
}

/// Write records to `path`, one per line, newline-terminated.
pub fn write_lsd(path: &Utf8Path, records: &[LineRecord]) -> Result<(), MagTrackError> {
    let mut body = String::with_capacity(records.len() * 80);
    for r in records {
        body.push_str(&r.to_string());
        body.push('\n');
    }
    std::fs::write(path, body)?;
    Ok(())
}

#[cfg(test)]
mod lsd_test {
    use super::*;

    fn record() -> LineRecord {
        LineRecord {
            track_id: 211,
            line_number: 3,
            year: 2024,
            doy_time: 162.7584259,
            lon_west: -141.23456,
            lat: 38.5,
            anomaly: -120.456,
            distance_km: 12.346,
        }
    }

    #[test]
    fn test_fixed_width_layout() {
        assert_eq!(
            record().to_string(),
            " 211     3 2024  162.7584259 -141.23456  38.50000  -120.46      12.35"
        );
    }

    #[test]
    fn test_parse_back() {
        let parsed: LineRecord = record().to_string().parse().unwrap();
        assert_eq!(parsed.key(), (211, 3));
        assert_eq!(parsed.year, 2024);
        assert_eq!(parsed.anomaly, -120.46);
        assert_eq!(parsed.distance_km, 12.35);
    }

    #[test]
    fn test_parse_rejects_short_row() {
        assert_eq!(
            "211 3 2024 162.5".parse::<LineRecord>(),
            Err(ParseRowError::WrongFieldCount {
                expected: 8,
                found: 4
            })
        );
        assert_eq!(
            "211 x 2024 162.5 1 2 3 4".parse::<LineRecord>(),
            Err(ParseRowError::InvalidNumber("x".into()))
        );
    }

    #[test]
    fn test_parse_rejects_non_finite() {
        assert_eq!(
            "211 3 2024 162.5 142.0 38.0 NaN 0.0".parse::<LineRecord>(),
            Err(ParseRowError::NonFinite("NaN".into()))
        );
        assert_eq!(
            "211 3 2024 162.5 142.0 38.0 -12.5 inf".parse::<LineRecord>(),
            Err(ParseRowError::NonFinite("inf".into()))
        );
    }

    #[test]
    fn test_normalize_lon_west() {
        assert_eq!(normalize_lon_west(181.0), -179.0);
        assert_eq!(normalize_lon_west(180.0), 180.0);
        assert_eq!(normalize_lon_west(359.5), -0.5);
        assert_eq!(normalize_lon_west(-75.0), -75.0);
    }
}
