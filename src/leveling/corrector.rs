//! # Single-pass and iterative leveling
//!
//! In-memory entry points ([`run`], [`run_iterative`], [`iterate`]) work on parsed records;
//! [`LwtCorrector`] wraps them with the solver's files (`.lsd` + `.lwt` → `.lncor`).
//!
//! Iteration
//! -----------------
//! Starting from the group means of the observations, each iteration asks an
//! [`OffsetUpdate`] for the next table and measures the total absolute offset change over the
//! keys of the current table. The loop stops as soon as that change is below `tol`, or after
//! `max_iter` iterations. Offsets of the update are merged into the table every iteration;
//! weights keep their initial means.
//!
//! With the default [`ObservationMeans`] update the observations are fixed, so the first
//! change is zero and the loop converges after one iteration. See
//! [`update`](crate::leveling::update) to plug in a feedback scheme.
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufWriter, Write};

use camino::{Utf8Path, Utf8PathBuf};
use tracing::info;

use crate::{
    constants::LineKey,
    leveling::{
        lwt_reader::{read_lwt, OffsetObservation},
        update::{ObservationMeans, OffsetUpdate},
        CorrectedRecord, CorrectionTable, CrossoverFiles, LevelingParams, OffsetSource,
    },
    lsd::{read_lsd, LineRecord},
    magtrack_errors::MagTrackError,
};

/// Apply `table` to every record; records without a correction get `(0, 0)`.
pub fn apply(records: &[LineRecord], table: &CorrectionTable) -> Vec<CorrectedRecord> {
    records
        .iter()
        .map(|r| CorrectedRecord::new(*r, table.get(&r.key())))
        .collect()
}

/// Single pass: correct with the group means of `observations`.
pub fn run(
    records: &[LineRecord],
    observations: &[OffsetObservation],
    source: OffsetSource,
) -> Vec<CorrectedRecord> {
    apply(
        records,
        &CorrectionTable::from_observations(observations, source),
    )
}

/// Outcome of [`iterate`].
#[derive(Debug, Clone, PartialEq)]
pub struct Convergence {
    pub table: CorrectionTable,
    pub iterations: usize,
    pub converged: bool,
    /// Total offset change measured at each iteration
    pub changes: Vec<f64>,
}

/// Iterate `updater` from `initial` until the total offset change drops below `tol` or
/// `max_iter` iterations have run.
pub fn iterate<U: OffsetUpdate + ?Sized>(
    records: &[LineRecord],
    initial: CorrectionTable,
    updater: &mut U,
    max_iter: usize,
    tol: f64,
) -> Convergence {
    let mut table = initial;
    let mut changes = Vec::with_capacity(max_iter);
    let mut converged = false;

    for i in 0..max_iter {
        let next = updater.update(records, &table);
        let total_change = table.total_change(&next);
        info!("Iteration {}: total offset change = {total_change:.6}", i + 1);
        changes.push(total_change);
        table.merge_offsets(&next);

        if total_change < tol {
            info!("Converged after {} iteration(s)", i + 1);
            converged = true;
            break;
        }
    }

    Convergence {
        table,
        iterations: changes.len(),
        converged,
        changes,
    }
}

/// Iterative pass with the default [`ObservationMeans`] update.
pub fn run_iterative(
    records: &[LineRecord],
    observations: &[OffsetObservation],
    params: &LevelingParams,
) -> (Vec<CorrectedRecord>, Convergence) {
    let initial = CorrectionTable::from_observations(observations, params.offset_source);
    let mut updater = ObservationMeans::new(observations, params.offset_source);
    let convergence = iterate(
        records,
        initial,
        &mut updater,
        params.max_iter,
        params.tol,
    );
    (apply(records, &convergence.table), convergence)
}

/// Summary of a leveling run on files.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelingReport {
    pub output: Utf8PathBuf,
    pub records_written: usize,
    /// Distinct lines of the `.lsd` that received a correction
    pub matched_lines: usize,
    /// Distinct lines of the `.lsd` written uncorrected
    pub unmatched_lines: Vec<LineKey>,
    /// `None` for a single pass
    pub convergence: Option<Convergence>,
}

/// Leveling driver over the crossover solver's files.
#[derive(Debug, Clone)]
pub struct LwtCorrector {
    files: CrossoverFiles,
    params: LevelingParams,
}

impl LwtCorrector {
    pub fn new(files: CrossoverFiles, params: LevelingParams) -> Self {
        LwtCorrector { files, params }
    }

    pub fn files(&self) -> &CrossoverFiles {
        &self.files
    }

    /// Read the `.lsd` and `.lwt` inputs.
    ///
    /// Errors
    /// ----------
    /// * [`MagTrackError::MissingFileError`] if either file is absent.
    /// * [`MagTrackError::ReadError`] if either file is malformed.
    pub fn load(&self) -> Result<(Vec<LineRecord>, Vec<OffsetObservation>), MagTrackError> {
        self.files.check_inputs()?;
        Ok((read_lsd(&self.files.lsd)?, read_lwt(&self.files.lwt)?))
    }

    /// Single pass; writes to `output`, or to the layout's `.lncor` when `None`.
    pub fn run(&self, output: Option<&Utf8Path>) -> Result<LevelingReport, MagTrackError> {
        let (records, observations) = self.load()?;
        let table = CorrectionTable::from_observations(&observations, self.params.offset_source);
        self.finish(&records, &table, output, None)
    }

    /// Iterative pass with the default [`ObservationMeans`] update.
    pub fn run_iterative(&self, output: Option<&Utf8Path>) -> Result<LevelingReport, MagTrackError> {
        let (records, observations) = self.load()?;
        let mut updater = ObservationMeans::new(&observations, self.params.offset_source);
        self.iterate_and_finish(&records, &observations, &mut updater, output)
    }

    /// Iterative pass with a caller-supplied update step.
    pub fn run_iterative_with(
        &self,
        updater: &mut dyn OffsetUpdate,
        output: Option<&Utf8Path>,
    ) -> Result<LevelingReport, MagTrackError> {
        let (records, observations) = self.load()?;
        self.iterate_and_finish(&records, &observations, updater, output)
    }

    fn iterate_and_finish<U: OffsetUpdate + ?Sized>(
        &self,
        records: &[LineRecord],
        observations: &[OffsetObservation],
        updater: &mut U,
        output: Option<&Utf8Path>,
    ) -> Result<LevelingReport, MagTrackError> {
        let initial = CorrectionTable::from_observations(observations, self.params.offset_source);
        let convergence = iterate(
            records,
            initial,
            updater,
            self.params.max_iter,
            self.params.tol,
        );
        let table = convergence.table.clone();
        self.finish(records, &table, output, Some(convergence))
    }

    fn finish(
        &self,
        records: &[LineRecord],
        table: &CorrectionTable,
        output: Option<&Utf8Path>,
        convergence: Option<Convergence>,
    ) -> Result<LevelingReport, MagTrackError> {
        let output = output.unwrap_or(self.files.lncor.as_path());
        let corrected = apply(records, table);
        write_lncor(output, &corrected)?;

        let keys: BTreeSet<LineKey> = records.iter().map(LineRecord::key).collect();
        let (matched, unmatched): (Vec<LineKey>, Vec<LineKey>) =
            keys.into_iter().partition(|k| table.contains(k));

        match &convergence {
            Some(c) => info!(
                "{} written after {} iteration(s)",
                output.file_name().unwrap_or_default(),
                c.iterations
            ),
            None => info!("{} written", output.file_name().unwrap_or_default()),
        }

        Ok(LevelingReport {
            output: output.to_path_buf(),
            records_written: corrected.len(),
            matched_lines: matched.len(),
            unmatched_lines: unmatched,
            convergence,
        })
    }
}

/// Write corrected records, one per line, newline-terminated.
pub fn write_lncor(path: &Utf8Path, records: &[CorrectedRecord]) -> Result<(), MagTrackError> {
    let mut writer = BufWriter::new(File::create(path)?);
    for r in records {
        writeln!(writer, "{r}")?;
    }
    writer.flush()?;
    Ok(())
}
