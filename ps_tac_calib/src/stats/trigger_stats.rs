//! Contains [TriggerStats], per trigger bit counters kept by the histogram controller
use crate::trigger::{Subsystem, TriggerBit, TRIGGER_BITS};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Counts of trigger bits fired and the work they caused.
#[derive(Debug, PartialEq, Eq, Clone, Default, Deserialize, Serialize)]
pub struct TriggerStats {
    bits_fired: [u64; TRIGGER_BITS as usize],
    events_seen: u64,
    useful_events: u64,
    dropped_events: u64,
    tac_invocations: u64,
    ps_invocations: u64,
}

impl TriggerStats {
    /// Record the trigger bits of one event, `useful` if the event is relevant to TAC and/or PS.
    pub fn collect_stats(&mut self, trigger_bits: u32, useful: bool) {
        self.events_seen += 1;
        if useful {
            self.useful_events += 1;
        } else {
            self.dropped_events += 1;
        }
        TriggerBit::all()
            .filter(|bit| trigger_bits & bit.mask() != 0)
            .for_each(|bit| self.bits_fired[bit.index()] += 1);
    }

    /// Record one aggregator invocation.
    pub fn record_invocation(&mut self, subsystem: Subsystem) {
        match subsystem {
            Subsystem::Tac => self.tac_invocations += 1,
            Subsystem::Ps => self.ps_invocations += 1,
        }
    }

    /// Number of events that had `bit` set.
    pub fn bit_fired(&self, bit: TriggerBit) -> u64 {
        self.bits_fired[bit.index()]
    }

    #[allow(missing_docs)]
    pub fn events_seen(&self) -> u64 {
        self.events_seen
    }

    #[allow(missing_docs)]
    pub fn useful_events(&self) -> u64 {
        self.useful_events
    }

    #[allow(missing_docs)]
    pub fn dropped_events(&self) -> u64 {
        self.dropped_events
    }

    #[allow(missing_docs)]
    pub fn invocations(&self, subsystem: Subsystem) -> u64 {
        match subsystem {
            Subsystem::Tac => self.tac_invocations,
            Subsystem::Ps => self.ps_invocations,
        }
    }
}

impl Display for TriggerStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "events: {} useful: {} dropped: {} TAC invocations: {} PS invocations: {}",
            self.events_seen,
            self.useful_events,
            self.dropped_events,
            self.tac_invocations,
            self.ps_invocations
        )
    }
}
