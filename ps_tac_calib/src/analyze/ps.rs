//! Contains the [PsAggregator] that fills the pair spectrometer histogram family.

use super::{FillBatch, PSC_RF_TAG};
use crate::registry::HistoKey;
use calib_event_reader::prelude::EventLoop;

/// Fills the PS family for one trigger bit of a qualifying event.
///
/// Per-hit timing is only recorded for north arm hits with a TDC time,
/// tagger hodoscope totals are recorded for every PSC hit.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PsAggregator;

impl PsAggregator {
    #[allow(missing_docs)]
    pub fn new() -> Self {
        Self
    }

    /// Record the fills of `event` into `batch`.
    pub fn aggregate(&self, event: &impl EventLoop, batch: &mut FillBatch) {
        for psc_hit in event.psc_hits() {
            let timed = psc_hit.is_timed_north();
            if timed {
                batch.fill(HistoKey::PSC_TIME, psc_hit.t);
                if let Some(rf) = event.rf_time(PSC_RF_TAG) {
                    batch.fill(HistoKey::PSC_RF_TIME, psc_hit.t - rf.time);
                }
            }

            for tagh_hit in event.tagh_hits() {
                batch.fill(HistoKey::PSC_TAGH_TIME, tagh_hit.t - psc_hit.t);
                batch.fill(HistoKey::PSC_TAGH_ENERGY, tagh_hit.e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::FillValue;
    use crate::trigger::{Subsystem, TriggerBit};
    use calib_event_reader::prelude::{Arm, PscHit, RecordedEvent, TaghHit};
    use pretty_assertions::assert_eq;

    fn aggregate(event: &RecordedEvent) -> FillBatch {
        let mut batch = FillBatch::new(TriggerBit::new(0).unwrap(), Subsystem::Ps);
        PsAggregator::new().aggregate(event, &mut batch);
        batch
    }

    #[test]
    fn test_no_psc_hits_no_fills() {
        let event = RecordedEvent::new(1, 1)
            .with_tagh_hits(vec![TaghHit::new(1.0, 5.0, 1)])
            .with_rf_time("PSC", 0.0);
        assert!(aggregate(&event).is_empty());
    }

    #[test]
    fn test_timed_north_hit() {
        let event = RecordedEvent::new(1, 1)
            .with_psc_hits(vec![PscHit::new(20.0, Arm::North, 3, true)])
            .with_tagh_hits(vec![TaghHit::new(25.0, 7.5, 12)])
            .with_rf_time("PSC", 18.0);
        let batch = aggregate(&event);

        assert_eq!(
            batch.fills(),
            &[
                (HistoKey::PSC_TIME, FillValue::X(20.0)),
                (HistoKey::PSC_RF_TIME, FillValue::X(2.0)),
                (HistoKey::PSC_TAGH_TIME, FillValue::X(5.0)),
                (HistoKey::PSC_TAGH_ENERGY, FillValue::X(7.5)),
            ]
        );
    }

    #[test]
    fn test_hit_without_tdc_only_fills_tagh_totals() {
        let event = RecordedEvent::new(1, 1)
            .with_psc_hits(vec![PscHit::new(20.0, Arm::North, 3, false)])
            .with_tagh_hits(vec![TaghHit::new(25.0, 7.5, 12), TaghHit::new(10.0, 4.0, 80)])
            .with_rf_time("PSC", 18.0);
        let batch = aggregate(&event);

        assert!(batch.values(HistoKey::PSC_TIME).is_empty());
        assert!(batch.values(HistoKey::PSC_RF_TIME).is_empty());
        assert_eq!(
            batch.values(HistoKey::PSC_TAGH_TIME),
            vec![FillValue::X(5.0), FillValue::X(-10.0)]
        );
        assert_eq!(batch.values(HistoKey::PSC_TAGH_ENERGY).len(), 2);
    }

    #[test]
    fn test_south_arm_not_timed() {
        let event = RecordedEvent::new(1, 1)
            .with_psc_hits(vec![PscHit::new(20.0, Arm::South, 1, true)])
            .with_rf_time("PSC", 18.0);
        assert!(aggregate(&event).is_empty());
    }

    #[test]
    fn test_missing_rf_still_fills_psc_time() {
        let event = RecordedEvent::new(1, 1)
            .with_psc_hits(vec![PscHit::new(-4.0, Arm::North, 1, true)])
            .with_rf_time("TOF", 0.0);
        let batch = aggregate(&event);
        assert_eq!(batch.fills(), &[(HistoKey::PSC_TIME, FillValue::X(-4.0))]);
    }

    #[test]
    fn test_tagh_hits_repeat_per_psc_hit() {
        let event = RecordedEvent::new(1, 1)
            .with_psc_hits(vec![
                PscHit::new(0.0, Arm::North, 1, false),
                PscHit::new(1.0, Arm::South, 2, false),
            ])
            .with_tagh_hits(vec![TaghHit::new(3.0, 5.0, 1)]);
        let batch = aggregate(&event);
        assert_eq!(
            batch.values(HistoKey::PSC_TAGH_TIME),
            vec![FillValue::X(3.0), FillValue::X(2.0)]
        );
        assert!(batch.values(HistoKey::PSC_TAGH_TIME_MATCHED).is_empty());
    }
}
