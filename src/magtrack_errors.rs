use camino::Utf8PathBuf;
use thiserror::Error;

/// Row-level parsing errors shared by the `.trk`, `.lla`, `.lsd` and `.lwt` readers.
///
/// Variants
/// -----------------
/// * `WrongFieldCount` – The row does not have the expected number of whitespace-separated fields.
/// * `InvalidNumber` – A field could not be parsed as a number; payload carries the offending token.
/// * `NonFinite` – A numeric field parsed to NaN or ±∞.
/// * `InvalidDate` – The `yyyymmdd` token is malformed or does not name a calendar day.
/// * `InvalidTime` – The `hhmmss` token is malformed or out of range.
#[derive(Error, Debug, PartialEq)]
pub enum ParseRowError {
    #[error("Expected {expected} fields, found {found}")]
    WrongFieldCount { expected: usize, found: usize },
    #[error("Invalid numeric field: {0}")]
    InvalidNumber(String),
    #[error("Non-finite value: {0}")]
    NonFinite(String),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Invalid time: {0}")]
    InvalidTime(String),
}

#[derive(Error, Debug)]
pub enum MagTrackError {
    #[error("Unable to read {path}: {reason}")]
    ReadError { path: Utf8PathBuf, reason: String },

    #[error("No .{1} files were found in {0}")]
    NoInputError(Utf8PathBuf, String),

    #[error("Required file not found: {0}")]
    MissingFileError(Utf8PathBuf),

    #[error("Invalid row: {0}")]
    ValidationError(#[from] ParseRowError),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("UTF-8 Path error: {0}")]
    Utf8PathError(String),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Time conversion error: {0}")]
    TimeError(#[from] hifitime::HifitimeError),
}

impl MagTrackError {
    pub(crate) fn read_error(path: impl Into<Utf8PathBuf>, reason: impl ToString) -> Self {
        MagTrackError::ReadError {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

impl PartialEq for MagTrackError {
    fn eq(&self, other: &Self) -> bool {
        use MagTrackError::*;
        match (self, other) {
            (ReadError { path: a, .. }, ReadError { path: b, .. }) => a == b,
            (NoInputError(a, x), NoInputError(b, y)) => a == b && x == y,
            (MissingFileError(a), MissingFileError(b)) => a == b,
            (ValidationError(a), ValidationError(b)) => a == b,
            (InvalidParameter(a), InvalidParameter(b)) => a == b,
            (Utf8PathError(a), Utf8PathError(b)) => a == b,

            // not comparable: equal if same variant
            (IoError(_), IoError(_)) => true,
            (CsvError(_), CsvError(_)) => true,
            (TimeError(_), TimeError(_)) => true,

            _ => false,
        }
    }
}
