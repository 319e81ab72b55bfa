//! # Crossover leveling
//!
//! Removes the systematic bias of each survey line by adding one scalar offset per
//! `(cruise, line)` key to its anomaly values. Offsets come from the weighted offset
//! observations that the external crossover solver writes for every pair of crossing lines.
//!
//! Data Model
//! -----------------
//! * [`OffsetObservation`](crate::leveling::lwt_reader::OffsetObservation) – one `.lwt` row.
//! * [`CorrectionTable`] – `(cruise, line) → (offset, weight)`, the **mean** offset and the
//!   **mean** weight of all observations sharing the key. Keys absent from the table resolve
//!   to `(0, 0)`: unmatched lines pass through unleveled.
//! * [`CorrectedRecord`] – a line record plus `anomaly + offset`, the offset and its weight.
//!
//! Modules
//! -----------------
//! * [`lwt_reader`](crate::leveling::lwt_reader) – `.lwt` reader.
//! * [`update`](crate::leveling::update) – The offset update applied at each iteration, behind
//!   the [`OffsetUpdate`](crate::leveling::update::OffsetUpdate) trait.
//! * [`corrector`](crate::leveling::corrector) – Single-pass and iterative leveling, in memory
//!   and on the solver's files.
//!
//! Corrected file (`.lncor`)
//! -----------------
//! ```text
//! <cruise> <year><int(doy_time):06> 000000 <lon:.5f> <lat:.5f> <anomaly:8.2f> <corrected:8.2f> <offset:8.4f> <weight:10.5f>
//! ```
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use camino::{Utf8Path, Utf8PathBuf};

use crate::{
    constants::{
        LineKey, NanoTesla, DEFAULT_LEVELING_TOL, DEFAULT_MAX_ITER, LINE_MAPPING_FILENAME,
    },
    leveling::lwt_reader::OffsetObservation,
    lsd::LineRecord,
    magtrack_errors::MagTrackError,
};

pub mod corrector;
pub mod lwt_reader;
pub mod update;

/// Which `.lwt` column is averaged into the per-line offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OffsetSource {
    /// The `offset` column (4th field)
    #[default]
    Offset,
    /// The `mag2` column (9th field), as averaged by earlier versions of the corrector
    Mag2,
}

impl OffsetSource {
    fn value(self, obs: &OffsetObservation) -> f64 {
        match self {
            OffsetSource::Offset => obs.offset,
            OffsetSource::Mag2 => obs.mag2,
        }
    }
}

impl FromStr for OffsetSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "offset" => Ok(OffsetSource::Offset),
            "mag2" => Ok(OffsetSource::Mag2),
            other => Err(format!("unknown offset source '{other}' (expected offset|mag2)")),
        }
    }
}

impl fmt::Display for OffsetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OffsetSource::Offset => f.write_str("offset"),
            OffsetSource::Mag2 => f.write_str("mag2"),
        }
    }
}

/// Offset and weight applied to one line.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LineCorrection {
    pub offset: NanoTesla,
    pub weight: f64,
}

/// Per-line corrections keyed by `(cruise, line)`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CorrectionTable {
    corrections: BTreeMap<LineKey, LineCorrection>,
}

impl CorrectionTable {
    /// Group observations by key and average the offset column and the weight column.
    pub fn from_observations(observations: &[OffsetObservation], source: OffsetSource) -> Self {
        let mut sums: BTreeMap<LineKey, (f64, f64, usize)> = BTreeMap::new();
        for obs in observations {
            let entry = sums.entry(obs.key()).or_insert((0.0, 0.0, 0));
            entry.0 += source.value(obs);
            entry.1 += obs.weight;
            entry.2 += 1;
        }

        let corrections = sums
            .into_iter()
            .map(|(key, (offset, weight, n))| {
                let n = n as f64;
                (
                    key,
                    LineCorrection {
                        offset: offset / n,
                        weight: weight / n,
                    },
                )
            })
            .collect();
        CorrectionTable { corrections }
    }

    /// Correction of `key`, `(0, 0)` when the line has no observation.
    pub fn get(&self, key: &LineKey) -> LineCorrection {
        self.corrections.get(key).copied().unwrap_or_default()
    }

    pub fn contains(&self, key: &LineKey) -> bool {
        self.corrections.contains_key(key)
    }

    pub fn insert(&mut self, key: LineKey, correction: LineCorrection) {
        self.corrections.insert(key, correction);
    }

    pub fn len(&self) -> usize {
        self.corrections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.corrections.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&LineKey, &LineCorrection)> {
        self.corrections.iter()
    }

    /// Sum over the keys of `self` of `|next.offset - self.offset|`, a key missing from `next`
    /// counting as a zero offset.
    pub fn total_change(&self, next: &CorrectionTable) -> f64 {
        self.corrections
            .iter()
            .map(|(key, c)| (next.get(key).offset - c.offset).abs())
            .sum()
    }

    /// Take the offsets of `next`; weights of keys already present are kept, new keys are
    /// inserted whole.
    pub fn merge_offsets(&mut self, next: &CorrectionTable) {
        for (key, c) in next.iter() {
            self.corrections
                .entry(*key)
                .and_modify(|current| current.offset = c.offset)
                .or_insert(*c);
        }
    }
}

/// A line record with its leveling correction applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrectedRecord {
    pub record: LineRecord,
    pub corrected_anomaly: NanoTesla,
    pub offset: NanoTesla,
    pub weight: f64,
}

impl CorrectedRecord {
    pub fn new(record: LineRecord, correction: LineCorrection) -> Self {
        CorrectedRecord {
            record,
            corrected_anomaly: record.anomaly + correction.offset,
            offset: correction.offset,
            weight: correction.weight,
        }
    }
}

impl fmt::Display for CorrectedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = &self.record;
        write!(
            f,
            "{} {}{:06} 000000 {:.5} {:.5} {:8.2} {:8.2} {:8.4} {:10.5}",
            r.track_id,
            r.year,
            r.doy_time.trunc() as i64,
            r.lon_west,
            r.lat,
            r.anomaly,
            self.corrected_anomaly,
            self.offset,
            self.weight
        )
    }
}

/// Paths of the files exchanged with the crossover solver for one merged survey.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossoverFiles {
    pub lsd: Utf8PathBuf,
    pub stat: Utf8PathBuf,
    pub lfind2: Utf8PathBuf,
    pub lwt: Utf8PathBuf,
    pub lncor: Utf8PathBuf,
    pub mapping: Utf8PathBuf,
}

impl CrossoverFiles {
    /// Conventional layout: `<dir>/<basename>.lsd`, `<dir>/<basename>lsd.stat`, ...
    pub fn new(output_dir: &Utf8Path, basename: &str) -> Self {
        CrossoverFiles {
            lsd: output_dir.join(format!("{basename}.lsd")),
            stat: output_dir.join(format!("{basename}lsd.stat")),
            lfind2: output_dir.join(format!("{basename}.lfind2")),
            lwt: output_dir.join(format!("{basename}.lwt")),
            lncor: output_dir.join(format!("{basename}.lncor")),
            mapping: output_dir.join(LINE_MAPPING_FILENAME),
        }
    }

    /// Fail with [`MagTrackError::MissingFileError`] unless the inputs of the leveling stage
    /// (`.lsd` and `.lwt`) exist.
    pub fn check_inputs(&self) -> Result<(), MagTrackError> {
        for path in [&self.lsd, &self.lwt] {
            if !path.is_file() {
                return Err(MagTrackError::MissingFileError(path.clone()));
            }
        }
        Ok(())
    }
}

/// Leveling parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelingParams {
    /// Iteration cap of the iterative pass
    pub max_iter: usize,
    /// Convergence threshold on the total absolute offset change (nT)
    pub tol: f64,
    pub offset_source: OffsetSource,
}

impl LevelingParams {
    pub fn builder() -> LevelingParamsBuilder {
        LevelingParamsBuilder::default()
    }
}

impl Default for LevelingParams {
    fn default() -> Self {
        LevelingParams {
            max_iter: DEFAULT_MAX_ITER,
            tol: DEFAULT_LEVELING_TOL,
            offset_source: OffsetSource::default(),
        }
    }
}

/// Builder for [`LevelingParams`], with validation.
#[derive(Debug, Clone, Default)]
pub struct LevelingParamsBuilder {
    params: LevelingParams,
}

impl LevelingParamsBuilder {
    pub fn max_iter(mut self, v: usize) -> Self {
        self.params.max_iter = v;
        self
    }
    pub fn tol(mut self, v: f64) -> Self {
        self.params.tol = v;
        self
    }
    pub fn offset_source(mut self, v: OffsetSource) -> Self {
        self.params.offset_source = v;
        self
    }

    pub fn build(self) -> Result<LevelingParams, MagTrackError> {
        if self.params.max_iter == 0 {
            return Err(MagTrackError::InvalidParameter(
                "max_iter must be >= 1".into(),
            ));
        }
        if !(self.params.tol.is_finite() && self.params.tol >= 0.0) {
            return Err(MagTrackError::InvalidParameter(
                "tol must be finite and >= 0".into(),
            ));
        }
        Ok(self.params)
    }
}

impl fmt::Display for LevelingParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            writeln!(f, "Leveling Parameters")?;
            writeln!(f, "-------------------")?;
            writeln!(f, "  max_iter      = {:<10} # iteration cap", self.max_iter)?;
            writeln!(f, "  tol           = {:<10e} # total offset change [nT]", self.tol)?;
            write!(
                f,
                "  offset_source = {:<10} # averaged .lwt column",
                self.offset_source.to_string()
            )
        } else {
            write!(
                f,
                "LevelingParams(max_iter={}, tol={:e}, offset_source={})",
                self.max_iter, self.tol, self.offset_source
            )
        }
    }
}
