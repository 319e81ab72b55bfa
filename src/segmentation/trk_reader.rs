//! # Raw track (`.trk`) reader
//!
//! Whitespace-delimited text, one sample per line: `unixtime lon lat mag`.
//! Anything after a `#` is a comment; blank lines are ignored.
//!
//! Error policy
//! -----------------
//! * A token that is not a number, or a row with more than four columns, makes the whole
//!   file unreadable ([`MagTrackError::ReadError`]).
//! * Rows with missing columns or any non-finite value are dropped before segmentation.
use camino::Utf8Path;
use tracing::debug;

use crate::{
    magtrack_errors::{MagTrackError, ParseRowError},
    segmentation::TrackPoint,
};

const TRK_FIELDS: usize = 4;

/// Outcome of parsing one line of a `.trk` file.
enum TrkRow {
    Point(TrackPoint),
    Dropped(ParseRowError),
    Blank,
}

fn parse_trk_line(line: &str) -> Result<TrkRow, ParseRowError> {
    let content = line.split('#').next().unwrap_or_default();
    let tokens: Vec<&str> = content.split_whitespace().collect();

    if tokens.is_empty() {
        return Ok(TrkRow::Blank);
    }
    if tokens.len() > TRK_FIELDS {
        return Err(ParseRowError::WrongFieldCount {
            expected: TRK_FIELDS,
            found: tokens.len(),
        });
    }

    let values = tokens
        .iter()
        .map(|t| {
            t.parse::<f64>()
                .map_err(|_| ParseRowError::InvalidNumber(t.to_string()))
        })
        .collect::<Result<Vec<f64>, _>>()?;

    if values.len() < TRK_FIELDS {
        return Ok(TrkRow::Dropped(ParseRowError::WrongFieldCount {
            expected: TRK_FIELDS,
            found: values.len(),
        }));
    }
    if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
        return Ok(TrkRow::Dropped(ParseRowError::NonFinite(bad.to_string())));
    }

    Ok(TrkRow::Point(TrackPoint {
        time: values[0],
        lon: values[1],
        lat: values[2],
        mag: values[3],
    }))
}

/// Parse the content of a `.trk` file.
///
/// `source` only labels the error.
pub fn parse_trk(content: &str, source: &Utf8Path) -> Result<Vec<TrackPoint>, MagTrackError> {
    let mut points = Vec::new();
    for (lineno, line) in content.lines().enumerate() {
        match parse_trk_line(line) {
            Ok(TrkRow::Point(p)) => points.push(p),
            Ok(TrkRow::Dropped(reason)) => {
                debug!("{source}:{} dropped: {reason}", lineno + 1)
            }
            Ok(TrkRow::Blank) => {}
            Err(e) => {
                return Err(MagTrackError::read_error(
                    source,
                    format!("line {}: {e}", lineno + 1),
                ))
            }
        }
    }
    Ok(points)
}

/// Read a `.trk` file from disk.
pub fn read_trk(path: &Utf8Path) -> Result<Vec<TrackPoint>, MagTrackError> {
    let content =
        std::fs::read_to_string(path).map_err(|e| MagTrackError::read_error(path, e))?;
    parse_trk(&content, path)
}
