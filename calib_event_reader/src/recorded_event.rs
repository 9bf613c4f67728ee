//! Contains the [RecordedEvent] that stores the collections of one event in memory and serves them through [EventLoop].

use crate::event_loop::{EventLoop, RetrieveError};
use crate::hits::{L1Trigger, PscHit, RfTime, TacHit, TaghHit};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One event as recorded by the reconstruction.
///
/// TAC hits and RF times are keyed by tag, the default TAC collection has the empty tag.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RecordedEvent {
    /// Event number within the run.
    pub event_number: u64,
    /// Run number the event belongs to.
    pub run_number: u32,
    /// Level 1 trigger word, absent for events without trigger information.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub l1_trigger: Option<L1Trigger>,
    /// TAC hit collections by tag.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tac_hits: BTreeMap<String, Vec<TacHit>>,
    /// Tagger hodoscope hits.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tagh_hits: Vec<TaghHit>,
    /// Coarse pair spectrometer hits.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub psc_hits: Vec<PscHit>,
    /// RF reference times by subsystem tag.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub rf_times: BTreeMap<String, RfTime>,
}

impl RecordedEvent {
    /// Create an empty event
    pub fn new(run_number: u32, event_number: u64) -> Self {
        Self {
            run_number,
            event_number,
            ..Default::default()
        }
    }

    /// Set the trigger bits of the event.
    pub fn with_trigger(mut self, trig_mask: u32) -> Self {
        self.l1_trigger = Some(L1Trigger {
            trig_mask,
            fp_trig_mask: 0,
        });
        self
    }

    /// Set the TAC hits of the collection named by `tag`.
    pub fn with_tac_hits(mut self, tag: &str, hits: Vec<TacHit>) -> Self {
        let _ = self.tac_hits.insert(tag.to_owned(), hits);
        self
    }

    /// Set the tagger hodoscope hits.
    pub fn with_tagh_hits(mut self, hits: Vec<TaghHit>) -> Self {
        self.tagh_hits = hits;
        self
    }

    /// Set the pair spectrometer hits.
    pub fn with_psc_hits(mut self, hits: Vec<PscHit>) -> Self {
        self.psc_hits = hits;
        self
    }

    /// Set the RF time matched by the subsystem named by `tag`.
    pub fn with_rf_time(mut self, tag: &str, time: f64) -> Self {
        let _ = self.rf_times.insert(tag.to_owned(), RfTime { time });
        self
    }
}

impl EventLoop for RecordedEvent {
    fn l1_trigger(&self) -> Result<L1Trigger, RetrieveError> {
        self.l1_trigger.ok_or(RetrieveError::Missing("L1 trigger"))
    }

    fn tac_hits(&self, tag: &str) -> &[TacHit] {
        self.tac_hits.get(tag).map(Vec::as_slice).unwrap_or_default()
    }

    fn tagh_hits(&self) -> &[TaghHit] {
        &self.tagh_hits
    }

    fn psc_hits(&self) -> &[PscHit] {
        &self.psc_hits
    }

    fn rf_time(&self, tag: &str) -> Option<RfTime> {
        self.rf_times.get(tag).copied()
    }
}
