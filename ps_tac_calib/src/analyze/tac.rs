//! Contains the [TacAggregator] that fills the TAC histogram family.

use super::matching::match_in_time;
use super::{FillBatch, TOF_RF_TAG};
use crate::config::prelude::CalibOpt;
use crate::registry::HistoKey;
use calib_event_reader::prelude::{EventLoop, TacHit, TaghHit};

/// Fills the TAC family for one trigger bit of a qualifying event.
///
/// Only hits at or above the energy threshold contribute per-hit fills.
/// Every hit above threshold is paired with all tagger hodoscope hits,
/// and the closest and farthest of them in time are recorded as matched and unmatched.
#[derive(Debug, Clone, PartialEq)]
pub struct TacAggregator {
    threshold: f64,
    rebuild_tag: Box<str>,
}

impl TacAggregator {
    /// Create a new [TacAggregator] from the threshold and collection tag of the config
    pub fn new(config: &impl CalibOpt) -> Self {
        Self {
            threshold: config.tac_threshold(),
            rebuild_tag: config.tac_rebuild_func().into(),
        }
    }

    /// Record the fills of `event` into `batch`.
    pub fn aggregate(&self, event: &impl EventLoop, batch: &mut FillBatch) {
        let tac_hits = event.tac_hits(&self.rebuild_tag);
        batch.fill(HistoKey::TAC_NHITS, tac_hits.len() as f64);

        for tac_hit in tac_hits.iter().filter(|hit| hit.e >= self.threshold) {
            if let Some(rf) = event.rf_time(TOF_RF_TAG) {
                batch.fill(HistoKey::TAC_TIME, tac_hit.t);
                batch.fill(HistoKey::TAC_RF_TIME, tac_hit.t - rf.time);
                batch.fill_2d(HistoKey::TAC_TIME_VS_E, tac_hit.e, tac_hit.t);
                batch.fill_2d(HistoKey::TAC_RF_TIME_VS_E, tac_hit.e, tac_hit.t - rf.time);
            }
            fill_tagh(tac_hit, event.tagh_hits(), batch);
        }
    }
}

fn fill_tagh(tac_hit: &TacHit, tagh_hits: &[TaghHit], batch: &mut FillBatch) {
    for tagh_hit in tagh_hits {
        batch.fill(HistoKey::TAC_TAGH_TIME, tagh_hit.t - tac_hit.t);
        batch.fill(HistoKey::TAC_TAGH_ENERGY, tagh_hit.e);
    }

    if let Some(found) = match_in_time(tac_hit.t, tagh_hits, |hit| hit.t) {
        let best = &tagh_hits[found.best];
        let worst = &tagh_hits[found.worst];
        batch.fill(HistoKey::TAC_TAGH_ENERGY_MATCHED, best.e);
        batch.fill(HistoKey::TAC_TAGH_TIME_MATCHED, best.t - tac_hit.t);
        batch.fill(HistoKey::TAC_TAGH_ENERGY_UNMATCHED, worst.e);
        batch.fill(HistoKey::TAC_TAGH_TIME_UNMATCHED, worst.t - tac_hit.t);
    }
}
