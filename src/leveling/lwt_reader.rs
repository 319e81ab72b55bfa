//! Reader of the crossover solver's weighted offset observations (`.lwt`).
//!
//! Ten whitespace-separated fields per line:
//! `id cruise line offset doy1 line2 no2 doy2 mag2 weight`.
use std::str::FromStr;

use camino::Utf8Path;

use crate::{
    constants::{DoyTime, LineKey},
    lsd::{parse_field, parse_finite},
    magtrack_errors::{MagTrackError, ParseRowError},
};

const LWT_FIELDS: usize = 10;

/// One weighted offset observation between a line and its crossing partner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffsetObservation {
    pub id: i64,
    pub cruise: i64,
    pub line: i64,
    pub offset: f64,
    pub doy1: DoyTime,
    pub line2: i64,
    pub no2: i64,
    pub doy2: DoyTime,
    pub mag2: f64,
    pub weight: f64,
}

impl OffsetObservation {
    pub fn key(&self) -> LineKey {
        (self.cruise, self.line)
    }
}

impl FromStr for OffsetObservation {
    type Err = ParseRowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t: Vec<&str> = s.split_whitespace().collect();
        if t.len() != LWT_FIELDS {
            return Err(ParseRowError::WrongFieldCount {
                expected: LWT_FIELDS,
                found: t.len(),
            });
        }
        Ok(OffsetObservation {
            id: parse_field(t[0])?,
            cruise: parse_field(t[1])?,
            line: parse_field(t[2])?,
            offset: parse_finite(t[3])?,
            doy1: parse_finite(t[4])?,
            line2: parse_field(t[5])?,
            no2: parse_field(t[6])?,
            doy2: parse_finite(t[7])?,
            mag2: parse_finite(t[8])?,
            weight: parse_finite(t[9])?,
        })
    }
}

/// Read a `.lwt` file; any malformed line fails the read.
pub fn read_lwt(path: &Utf8Path) -> Result<Vec<OffsetObservation>, MagTrackError> {
    let content =
        std::fs::read_to_string(path).map_err(|e| MagTrackError::read_error(path, e))?;
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            line.parse::<OffsetObservation>()
                .map_err(|e| MagTrackError::read_error(path, format!("line {}: {e}", i + 1)))
        })
        .collect()
}

#[cfg(test)]
mod lwt_reader_test {
    use super::*;

    #[test]
    fn test_parse_observation() {
        let obs: OffsetObservation = "    1  211    3   -4.250  162.7584    5   17  163.1021    2.125   0.80000"
            .parse()
            .unwrap();
        assert_eq!(obs.key(), (211, 3));
        assert_eq!(obs.offset, -4.25);
        assert_eq!(obs.line2, 5);
        assert_eq!(obs.no2, 17);
        assert_eq!(obs.mag2, 2.125);
        assert_eq!(obs.weight, 0.8);
    }

    #[test]
    fn test_wrong_field_count() {
        assert_eq!(
            "1 211 3 -4.25".parse::<OffsetObservation>(),
            Err(ParseRowError::WrongFieldCount {
                expected: 10,
                found: 4
            })
        );
    }

    #[test]
    fn test_non_finite_values_are_rejected() {
        assert_eq!(
            "1 211 3 nan 162.75 5 17 163.10 2.125 0.8".parse::<OffsetObservation>(),
            Err(ParseRowError::NonFinite("nan".into()))
        );
        assert_eq!(
            "1 211 3 -4.25 162.75 5 17 163.10 2.125 inf".parse::<OffsetObservation>(),
            Err(ParseRowError::NonFinite("inf".into()))
        );
    }

    #[test]
    fn test_non_finite_row_fails_the_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = Utf8Path::from_path(tmp.path()).unwrap().join("merged.lwt");
        std::fs::write(
            &path,
            "1 211 3 -4.25 162.75 5 17 163.10 2.125 0.8\n2 211 3 NaN 162.76 5 18 163.10 2.0 0.8\n",
        )
        .unwrap();

        let err = read_lwt(&path).unwrap_err();
        assert_eq!(
            err,
            MagTrackError::read_error(path.clone(), "line 2: Non-finite value: NaN")
        );
    }
}
