//! Offset update step of the iterative leveling pass.
//!
//! [`iterate`](crate::leveling::corrector::iterate) owns the loop and the convergence test;
//! what changes between iterations is delegated to an [`OffsetUpdate`].
//!
//! [`ObservationMeans`] re-derives the table from the solver observations it was built with.
//! Those observations never change, so the first update already equals the starting table and
//! the loop stops after one iteration. A feedback scheme that recomputes crossover mismatches
//! from the corrected anomalies of the previous pass plugs in here without touching the file
//! handling of [`corrector`](crate::leveling::corrector).
use crate::{
    leveling::{lwt_reader::OffsetObservation, CorrectionTable, OffsetSource},
    lsd::LineRecord,
};

/// Produce the next correction table from the current one.
pub trait OffsetUpdate {
    /// Arguments
    /// -----------------
    /// * `records` – The uncorrected line records.
    /// * `current` – Corrections after the previous iteration.
    fn update(&mut self, records: &[LineRecord], current: &CorrectionTable) -> CorrectionTable;
}

/// Group means of a fixed set of offset observations.
#[derive(Debug, Clone)]
pub struct ObservationMeans<'a> {
    observations: &'a [OffsetObservation],
    source: OffsetSource,
}

impl<'a> ObservationMeans<'a> {
    pub fn new(observations: &'a [OffsetObservation], source: OffsetSource) -> Self {
        ObservationMeans {
            observations,
            source,
        }
    }
}

impl OffsetUpdate for ObservationMeans<'_> {
    fn update(&mut self, _records: &[LineRecord], _current: &CorrectionTable) -> CorrectionTable {
        CorrectionTable::from_observations(self.observations, self.source)
    }
}
