//! Per event analysis: the TAC and PS aggregators and the hit matching they share.
//!
//! Aggregators never touch the registry, they record their fills in a [FillBatch] that is sent to the histogram controller.

pub mod matching;
pub mod ps;
pub mod tac;

pub use ps::PsAggregator;
pub use tac::TacAggregator;

use crate::registry::{FillValue, HistoKey};
use crate::trigger::{Subsystem, TriggerBit};

/// RF time tag matched by the time-of-flight system, the reference for TAC times.
pub const TOF_RF_TAG: &str = "TOF";
/// RF time tag matched by the pair spectrometer.
pub const PSC_RF_TAG: &str = "PSC";

/// Fills produced by one aggregator invocation for one trigger bit.
#[derive(Debug, Clone, PartialEq)]
pub struct FillBatch {
    bit: TriggerBit,
    subsystem: Subsystem,
    fills: Vec<(HistoKey, FillValue)>,
}

impl FillBatch {
    /// Create an empty batch
    pub fn new(bit: TriggerBit, subsystem: Subsystem) -> Self {
        Self {
            bit,
            subsystem,
            fills: Vec::new(),
        }
    }

    /// Record a 1D fill.
    pub fn fill(&mut self, key: HistoKey, x: f64) {
        self.fills.push((key, FillValue::X(x)));
    }

    /// Record a 2D fill.
    pub fn fill_2d(&mut self, key: HistoKey, x: f64, y: f64) {
        self.fills.push((key, FillValue::XY(x, y)));
    }

    #[allow(missing_docs)]
    pub fn bit(&self) -> TriggerBit {
        self.bit
    }

    #[allow(missing_docs)]
    pub fn subsystem(&self) -> Subsystem {
        self.subsystem
    }

    /// Recorded fills in the order they were made.
    pub fn fills(&self) -> &[(HistoKey, FillValue)] {
        &self.fills
    }

    /// Values recorded for `key`.
    pub fn values(&self, key: HistoKey) -> Vec<FillValue> {
        self.fills
            .iter()
            .filter(|(k, _)| *k == key)
            .map(|(_, value)| *value)
            .collect()
    }

    #[allow(missing_docs)]
    pub fn is_empty(&self) -> bool {
        self.fills.is_empty()
    }

    #[allow(missing_docs)]
    pub fn len(&self) -> usize {
        self.fills.len()
    }
}
