//! Reader of the per-line `.lla` files: `track yyyymmdd hhmmss lon lat anomaly`.
//!
//! Every column is read as text and validated here, so that the converter only ever sees
//! typed rows. Rows failing a check are dropped and logged at `debug` level; only an
//! unreadable file is an error.
use camino::Utf8Path;
use tracing::debug;

use crate::{
    constants::{Degree, NanoTesla},
    lsd::{parse_field, parse_finite},
    magtrack_errors::{MagTrackError, ParseRowError},
    time::SurveyTime,
};

const LLA_FIELDS: usize = 6;

/// One validated `.lla` row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LlaRow {
    pub track_id: i64,
    pub time: SurveyTime,
    pub lon: Degree,
    pub lat: Degree,
    pub anomaly: NanoTesla,
}

impl LlaRow {
    /// Parse and validate one text row.
    pub fn parse(line: &str) -> Result<Self, ParseRowError> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() != LLA_FIELDS {
            return Err(ParseRowError::WrongFieldCount {
                expected: LLA_FIELDS,
                found: tokens.len(),
            });
        }

        let time = SurveyTime::parse(tokens[1], tokens[2])?;
        Ok(LlaRow {
            track_id: parse_field(tokens[0])?,
            time,
            lon: parse_finite(tokens[3])?,
            lat: parse_finite(tokens[4])?,
            anomaly: parse_finite(tokens[5])?,
        })
    }
}

/// Parse the content of a `.lla` file, keeping the valid rows in input order.
pub fn parse_lla(content: &str, source: &Utf8Path) -> Vec<LlaRow> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(i, line)| match LlaRow::parse(line) {
            Ok(row) => Some(row),
            Err(e) => {
                debug!("{source}:{} dropped: {e}", i + 1);
                None
            }
        })
        .collect()
}

/// Read a `.lla` file.
///
/// Errors
/// ----------
/// * [`MagTrackError::ReadError`] if the file cannot be read as text.
pub fn read_lla(path: &Utf8Path) -> Result<Vec<LlaRow>, MagTrackError> {
    let content =
        std::fs::read_to_string(path).map_err(|e| MagTrackError::read_error(path, e))?;
    Ok(parse_lla(&content, path))
}
