//! Contains the [EventLoop] trait, the read interface a calibration plugin uses to pull collections out of an event.

use crate::hits::{L1Trigger, PscHit, RfTime, TacHit, TaghHit};
use std::fmt::Display;

/// Error returned when an object could not be retrieved from an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetrieveError {
    /// The event does not contain the requested object.
    Missing(&'static str),
}

impl Display for RetrieveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetrieveError::Missing(what) => write!(f, "No {what} in event"),
        }
    }
}

impl std::error::Error for RetrieveError {}

/// Read interface to the collections of one event.
///
/// Collections that are absent are returned as empty slices, reference times that are absent as [None].
/// Only the trigger word can fail, the caller decides how to treat the failure.
pub trait EventLoop {
    /// The level 1 trigger word.
    fn l1_trigger(&self) -> Result<L1Trigger, RetrieveError>;
    /// TAC hits from the collection selected by `tag`, an empty tag selects the default collection.
    fn tac_hits(&self, tag: &str) -> &[TacHit];
    /// All tagger hodoscope hits.
    fn tagh_hits(&self) -> &[TaghHit];
    /// All coarse pair spectrometer hits.
    fn psc_hits(&self) -> &[PscHit];
    /// The RF reference time matched by the subsystem named by `tag`.
    fn rf_time(&self, tag: &str) -> Option<RfTime>;
}

impl<T> EventLoop for &T
where
    T: EventLoop,
{
    fn l1_trigger(&self) -> Result<L1Trigger, RetrieveError> {
        (*self).l1_trigger()
    }
    fn tac_hits(&self, tag: &str) -> &[TacHit] {
        (*self).tac_hits(tag)
    }
    fn tagh_hits(&self) -> &[TaghHit] {
        (*self).tagh_hits()
    }
    fn psc_hits(&self) -> &[PscHit] {
        (*self).psc_hits()
    }
    fn rf_time(&self, tag: &str) -> Option<RfTime> {
        (*self).rf_time(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorded_event::RecordedEvent;
    use pretty_assertions::assert_eq;

    fn trigger_of(event: impl EventLoop) -> Result<L1Trigger, RetrieveError> {
        event.l1_trigger()
    }

    #[test]
    fn test_missing_trigger_through_reference() {
        let event = RecordedEvent::new(1, 1);
        let err = trigger_of(&event).unwrap_err();
        assert_eq!(err, RetrieveError::Missing("L1 trigger"));
        assert_eq!(err.to_string(), "No L1 trigger in event");
    }
}
