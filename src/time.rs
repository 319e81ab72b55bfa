use std::sync::LazyLock;

use hifitime::{Epoch, TimeScale, Unit};
use regex::Regex;

use crate::constants::{DoyTime, HOURS_PER_DAY};
use crate::magtrack_errors::ParseRowError;

static DATE_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]{8}$").unwrap());
static TIME_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]{4,}$").unwrap());

/// Calendar timestamp of one survey sample, as read from the `yyyymmdd hhmmss` columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurveyTime {
    pub year: i32,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl SurveyTime {
    /// Parse a `yyyymmdd` / `hhmmss` token pair.
    ///
    /// Arguments
    /// -----------------
    /// * `yyyymmdd` – exactly eight digits.
    /// * `hhmmss` – at least four digits; shorter than six is padded with zeros on the right
    ///   (`"1234"` reads as 12:34:00). Characters past the sixth are ignored.
    ///
    /// Return
    /// ----------
    /// * The validated timestamp, or a [`ParseRowError`] when a token is malformed or does not
    ///   name a valid calendar instant (e.g. `20230230`, `256100`).
    pub fn parse(yyyymmdd: &str, hhmmss: &str) -> Result<Self, ParseRowError> {
        if !DATE_TOKEN.is_match(yyyymmdd) {
            return Err(ParseRowError::InvalidDate(yyyymmdd.to_string()));
        }
        if !TIME_TOKEN.is_match(hhmmss) {
            return Err(ParseRowError::InvalidTime(hhmmss.to_string()));
        }

        let padded = format!("{hhmmss:0<6}");
        let field = |s: &str| s.parse::<u8>();
        let invalid_date = |_| ParseRowError::InvalidDate(yyyymmdd.to_string());
        let invalid_time = |_| ParseRowError::InvalidTime(hhmmss.to_string());

        let time = SurveyTime {
            year: yyyymmdd[0..4].parse().map_err(invalid_date)?,
            month: field(&yyyymmdd[4..6]).map_err(invalid_date)?,
            day: field(&yyyymmdd[6..8]).map_err(invalid_date)?,
            hour: field(&padded[0..2]).map_err(invalid_time)?,
            minute: field(&padded[2..4]).map_err(invalid_time)?,
            second: field(&padded[4..6]).map_err(invalid_time)?,
        };

        if time.hour > 23 || time.minute > 59 || time.second > 59 {
            return Err(ParseRowError::InvalidTime(hhmmss.to_string()));
        }
        Epoch::maybe_from_gregorian(
            time.year,
            time.month,
            time.day,
            time.hour,
            time.minute,
            time.second,
            0,
            TimeScale::TAI,
        )
        .map_err(|_| ParseRowError::InvalidDate(yyyymmdd.to_string()))?;

        Ok(time)
    }

    /// Ordinal day of the year, 1-based (1 January → 1).
    pub fn day_of_year(&self) -> u32 {
        // TAI has no leap seconds, so the difference between two midnights is a whole number of days
        let midnight =
            Epoch::from_gregorian_at_midnight(self.year, self.month, self.day, TimeScale::TAI);
        let new_year = Epoch::from_gregorian_at_midnight(self.year, 1, 1, TimeScale::TAI);
        (midnight - new_year).to_unit(Unit::Day).round() as u32 + 1
    }

    /// Time of day in decimal hours.
    pub fn decimal_hours(&self) -> f64 {
        self.hour as f64 + self.minute as f64 / 60.0 + self.second as f64 / 3600.0
    }

    /// Continuous day-of-year: `doy + decimal_hours / 24`.
    pub fn doy_time(&self) -> DoyTime {
        self.day_of_year() as f64 + self.decimal_hours() / HOURS_PER_DAY
    }
}

/// Compact UTC tag `YYYYMMDD_HHMMSS` used to name fresh output directories.
pub fn run_tag(epoch: Epoch) -> String {
    let (y, m, d, hh, mm, ss, _) = epoch.to_gregorian_utc();
    format!("{y:04}{m:02}{d:02}_{hh:02}{mm:02}{ss:02}")
}
