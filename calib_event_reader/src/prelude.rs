//! Re-exports of the types needed to read events and implement analysis on them
pub use super::event_loop::{EventLoop, RetrieveError};
pub use super::event_scanner::EventScanner;
pub use super::hits::{Arm, L1Trigger, PscHit, RfTime, TacHit, TaghHit};
pub use super::recorded_event::RecordedEvent;
pub use super::{init_reader, spawn_reader};
