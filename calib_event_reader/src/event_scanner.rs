//! Contains the [EventScanner] that decodes newline delimited JSON events from any buffered reader.

use crate::recorded_event::RecordedEvent;
use std::io::{self, BufRead};

/// Reads one [RecordedEvent] per line, skipping blank lines.
///
/// Malformed lines are reported as [io::ErrorKind::InvalidData] with the line number.
pub struct EventScanner<R: BufRead + ?Sized> {
    reader: Box<R>,
    line_buf: String,
    lines_read: u64,
    events_read: u64,
}

impl<R: BufRead + ?Sized> EventScanner<R> {
    /// Create a new [EventScanner] that takes ownership of the reader
    pub fn new(reader: Box<R>) -> Self {
        Self {
            reader,
            line_buf: String::with_capacity(1024),
            lines_read: 0,
            events_read: 0,
        }
    }

    /// Number of events decoded so far.
    pub fn events_read(&self) -> u64 {
        self.events_read
    }

    /// Decode the next event, [None] at end of input.
    pub fn load_event(&mut self) -> Option<io::Result<RecordedEvent>> {
        loop {
            self.line_buf.clear();
            match self.reader.read_line(&mut self.line_buf) {
                Ok(0) => return None,
                Ok(_) => self.lines_read += 1,
                Err(e) => return Some(Err(e)),
            }
            let line = self.line_buf.trim();
            if line.is_empty() {
                continue;
            }
            return match serde_json::from_str::<RecordedEvent>(line) {
                Ok(event) => {
                    self.events_read += 1;
                    Some(Ok(event))
                }
                Err(e) => Some(Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("Malformed event at line {}: {e}", self.lines_read),
                ))),
            };
        }
    }
}

impl<R: BufRead + ?Sized> Iterator for EventScanner<R> {
    type Item = io::Result<RecordedEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        self.load_event()
    }
}
