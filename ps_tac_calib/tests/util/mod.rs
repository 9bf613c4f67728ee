#![allow(dead_code)]
/// Re-export some common utilities for system tests
pub use assert_cmd::prelude::*; // Add methods on commands
pub use assert_cmd::Command; // Get the methods for the Commands struct
pub use calib_event_reader::prelude::*;
pub use predicates::prelude::*; // Used for writing assertions
pub use temp_dir::TempDir; // Create temporary directories
use std::path::PathBuf;

/// Name of the events file written by [write_events]
pub const EVENTS_FILE: &str = "events.jsonl";

/// TAC trigger bit with the default masks
pub const TAC_BIT: u32 = 0b10;
/// PS trigger bit with the default masks
pub const PS_BIT: u32 = 0b01;

/// Event with one TAC hit above the default threshold, two TAGH hits and a TOF RF time
pub fn tac_event(run_number: u32, event_number: u64) -> RecordedEvent {
    RecordedEvent::new(run_number, event_number)
        .with_trigger(TAC_BIT)
        .with_tac_hits("", vec![TacHit::new(4.0, 900.0)])
        .with_tagh_hits(vec![
            TaghHit::new(5.0, 8.0, 101),
            TaghHit::new(-40.0, 6.5, 17),
        ])
        .with_rf_time("TOF", 1.5)
}

/// Event with one timed north PSC hit, one TAGH hit and a PSC RF time
pub fn ps_event(run_number: u32, event_number: u64) -> RecordedEvent {
    RecordedEvent::new(run_number, event_number)
        .with_trigger(PS_BIT)
        .with_psc_hits(vec![PscHit::new(12.0, Arm::North, 3, true)])
        .with_tagh_hits(vec![TaghHit::new(10.0, 9.5, 55)])
        .with_rf_time("PSC", 11.0)
}

/// Write `events` as JSON lines to [EVENTS_FILE] in `dir`
pub fn write_events(dir: &TempDir, events: &[RecordedEvent]) -> PathBuf {
    let path = dir.child(EVENTS_FILE);
    let mut lines = String::new();
    for event in events {
        lines.push_str(&serde_json::to_string(event).expect("Failed to serialize event"));
        lines.push('\n');
    }
    std::fs::write(&path, lines).expect("Failed to write events file");
    path
}

/// Number of case insensitive occurences of `pattern` in the raw output of stderr or stdout
pub fn count_no_case(byte_output: &[u8], pattern: &str) -> usize {
    let str_res = std::str::from_utf8(byte_output).expect("invalid utf-8 sequence");
    str_res
        .to_lowercase()
        .matches(&pattern.to_lowercase())
        .count()
}
