//! Run statistics collected by the histogram controller, and the end-of-run report built from them.

pub mod report;
pub mod trigger_stats;

use crate::registry::{HistoKey, HistogramRegistry};
use crate::trigger::{Subsystem, TriggerBit};
use report::{Report, StatSummary, TriggerBitSummary};
use std::path::PathBuf;
use std::time::Duration;
pub use trigger_stats::TriggerStats;

/// Everything the histogram controller hands back when it shuts down.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// The final state of every bucket.
    pub registry: HistogramRegistry,
    #[allow(missing_docs)]
    pub trigger_stats: TriggerStats,
    /// Number of successful flushes, checkpoints and end-of-run.
    pub flushes: u64,
    /// The last container written.
    pub last_output: Option<PathBuf>,
    /// Set if the controller stopped accepting fills.
    pub fatal_error: Option<Box<str>>,
    /// Time from controller start to its shutdown.
    pub processing_time: Duration,
}

impl RunSummary {
    /// Build the end-of-run [Report].
    pub fn report(&self) -> Report {
        let mut report = Report::new(self.processing_time);
        let stats = &self.trigger_stats;
        report.add_stat(StatSummary::new(
            "Events seen".to_string(),
            stats.events_seen().to_string(),
            None,
        ));
        report.add_stat(StatSummary::new(
            "Useful events".to_string(),
            stats.useful_events().to_string(),
            Some(format!("{} dropped", stats.dropped_events())),
        ));
        report.add_stat(StatSummary::new(
            "Aggregator invocations".to_string(),
            format!(
                "{}",
                stats.invocations(Subsystem::Tac) + stats.invocations(Subsystem::Ps)
            ),
            Some(format!(
                "TAC: {} PS: {}",
                stats.invocations(Subsystem::Tac),
                stats.invocations(Subsystem::Ps)
            )),
        ));
        report.add_stat(StatSummary::new(
            "Histograms".to_string(),
            self.registry.len().to_string(),
            None,
        ));
        report.add_stat(StatSummary::new(
            "Flushes".to_string(),
            self.flushes.to_string(),
            self.last_output
                .as_ref()
                .map(|path| path.display().to_string()),
        ));
        if let Some(fatal_error) = &self.fatal_error {
            report.add_fatal_error(fatal_error.to_string());
        }

        for bit in TriggerBit::all() {
            let family_entries = |subsystem: Subsystem, probe: HistoKey| {
                self.registry
                    .is_registered(probe, bit)
                    .then(|| self.registry.family_entries(subsystem, bit))
            };
            let tac_entries = family_entries(Subsystem::Tac, HistoKey::TAC_NHITS);
            let ps_entries = family_entries(Subsystem::Ps, HistoKey::PSC_TIME);
            let fired = stats.bit_fired(bit);
            if tac_entries.is_none() && ps_entries.is_none() && fired == 0 {
                continue;
            }
            let mean_tac_rf = self
                .registry
                .bucket(HistoKey::TAC_RF_TIME, bit)
                .ok()
                .and_then(|bucket| bucket.as_1d())
                .and_then(|hist| hist.mean());
            report.add_trigger_bit(TriggerBitSummary::new(
                bit.get(),
                fired,
                tac_entries,
                ps_entries,
                mean_tac_rf,
            ));
        }
        report
    }
}
