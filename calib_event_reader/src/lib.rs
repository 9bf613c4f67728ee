#![warn(unused_extern_crates)]
#![deny(missing_docs)]
#![warn(missing_debug_implementations)]
#![warn(missing_copy_implementations)]
#![warn(trivial_casts, trivial_numeric_casts)]
#![warn(unused_results)]
#![warn(unused_import_braces)]
#![warn(variant_size_differences)]
#![warn(
    clippy::option_filter_map,
    clippy::manual_filter_map,
    clippy::if_not_else,
    clippy::nonminimal_bool
)]
// Performance lints
#![warn(
    clippy::needless_pass_by_value,
    clippy::unnecessary_wraps,
    clippy::mutex_integer,
    clippy::mem_forget,
    clippy::maybe_infinite_iter
)]

//! This crate contains the [EventLoop] read interface that calibration plugins pull event collections through,
//! the hit records it serves, and [RecordedEvent], an in-memory event that implements it.
//!
//! Recorded events are stored as newline delimited JSON, one event per line.
//! The [EventScanner] decodes them from any buffered reader, and [init_reader] picks a file or stdin at runtime.
//! [spawn_reader] runs a scanner on its own thread and sends chunks of events through a channel.
//!
//! # Example
//! ```text
//! use calib_event_reader::prelude::*;
//!
//! let reader = init_reader(Some(&events_path)).unwrap();
//! let scanner = EventScanner::new(reader);
//!
//! for event in scanner {
//!     let event = event.unwrap();
//!     println!("{}: {:?}", event.event_number, event.l1_trigger());
//! }
//! ```
//!
//! Example line
//!
//! ```text
//! {"event_number": 200000, "run_number": 30274, "l1_trigger": {"trig_mask": 2},
//!  "tac_hits": {"": [{"t": 1.2, "e": 812.0}]}, "tagh_hits": [{"t": 3.1, "e": 8.4, "counter_id": 120}],
//!  "rf_times": {"TOF": {"time": 0.4}}}
//! ```

pub mod event_loop;
pub mod event_scanner;
pub mod hits;
pub mod prelude;
pub mod recorded_event;

use crossbeam_channel::Receiver;
use event_scanner::EventScanner;
use recorded_event::RecordedEvent;
use std::io::{self, BufRead, IsTerminal};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Depth of the FIFO where event chunks are inserted as they are read
const CHANNEL_EVENT_CHUNK_CAPACITY: usize = 100;
const READER_BUFFER_SIZE: usize = 1024 * 50; // 50KB
/// Number of events sent per chunk
pub const EVENT_CHUNK_SIZE: usize = 100;

/// Initializes the reader based on the input mode (file or stdin) and returns it
#[inline]
pub fn init_reader(input_file: Option<impl AsRef<Path>>) -> io::Result<Box<dyn BufRead + Send>> {
    if let Some(path) = input_file {
        let f = std::fs::OpenOptions::new().read(true).open(path)?;
        Ok(Box::new(io::BufReader::with_capacity(READER_BUFFER_SIZE, f)))
    } else if !io::stdin().is_terminal() {
        Ok(Box::new(io::BufReader::with_capacity(
            READER_BUFFER_SIZE,
            io::stdin(),
        )))
    } else {
        Err(io::Error::new(io::ErrorKind::Other, "stdin not redirected!"))
    }
}

/// Spawns a reader thread that decodes events from the input and sends them in chunks to a channel
///
/// Returns the thread handle and the receiver channel.
/// The thread stops when the input is exhausted, the stop flag is raised, or the receiver is dropped.
/// A decoding error ends the thread after the events read so far are sent, the error is returned through the handle.
#[inline]
pub fn spawn_reader(
    stop_flag: Arc<AtomicBool>,
    scanner: EventScanner<impl BufRead + ?Sized + Send + 'static>,
) -> (
    std::thread::JoinHandle<io::Result<u64>>,
    Receiver<Vec<RecordedEvent>>,
) {
    let reader_thread = std::thread::Builder::new().name("Reader".to_string());
    let (send_chan, recv_chan) = crossbeam_channel::bounded(CHANNEL_EVENT_CHUNK_CAPACITY);
    let thread_handle = reader_thread
        .spawn({
            move || {
                let mut scanner = scanner;
                while !stop_flag.load(Ordering::SeqCst) {
                    let (chunk, err) = get_chunk(&mut scanner, EVENT_CHUNK_SIZE);
                    let is_last = chunk.len() < EVENT_CHUNK_SIZE || err.is_some();
                    if !chunk.is_empty() && send_chan.send(chunk).is_err() {
                        break;
                    }
                    if let Some(e) = err {
                        log::error!("Reading events stopped: {e}");
                        return Err(e);
                    }
                    if is_last {
                        break;
                    }
                }
                log::debug!("Reader done after {} events", scanner.events_read());
                Ok(scanner.events_read())
            }
        })
        .expect("Failed to spawn reader thread");
    (thread_handle, recv_chan)
}

/// Reads up to `chunk_size` events, returning what was read along with the error that ended the chunk, if any
#[inline]
fn get_chunk(
    scanner: &mut EventScanner<impl BufRead + ?Sized>,
    chunk_size: usize,
) -> (Vec<RecordedEvent>, Option<io::Error>) {
    let mut chunk = Vec::with_capacity(chunk_size);
    while chunk.len() < chunk_size {
        match scanner.load_event() {
            Some(Ok(event)) => chunk.push(event),
            Some(Err(e)) => return (chunk, Some(e)),
            None => break,
        }
    }
    (chunk, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;
    use temp_dir::TempDir;

    fn write_events(dir: &TempDir, count: u64) -> PathBuf {
        let path = dir.child("events.jsonl");
        let lines: Vec<String> = (1..=count)
            .map(|n| {
                serde_json::to_string(&RecordedEvent::new(42, n).with_trigger(0b10)).unwrap()
            })
            .collect();
        std::fs::write(&path, lines.join("\n")).unwrap();
        path
    }

    #[test]
    fn test_init_reader_from_file() {
        let tmp_d = TempDir::new().unwrap();
        let path = write_events(&tmp_d, 3);

        let reader = init_reader(Some(&path)).unwrap();
        let events: Vec<RecordedEvent> = EventScanner::new(reader).map(Result::unwrap).collect();

        assert_eq!(events.len(), 3);
        assert_eq!(events[2].event_number, 3);
        assert_eq!(events[0].run_number, 42);
    }

    #[test]
    fn test_spawn_reader_sends_all_events_in_chunks() {
        let tmp_d = TempDir::new().unwrap();
        let path = write_events(&tmp_d, 250);
        let reader = init_reader(Some(&path)).unwrap();
        let stop_flag = Arc::new(AtomicBool::new(false));

        let (handle, recv) = spawn_reader(stop_flag, EventScanner::new(reader));
        let chunk_sizes: Vec<usize> = recv.iter().map(|chunk| chunk.len()).collect();

        assert_eq!(chunk_sizes, vec![100, 100, 50]);
        assert_eq!(handle.join().unwrap().unwrap(), 250);
    }

    #[test]
    fn test_spawn_reader_returns_decode_error() {
        let tmp_d = TempDir::new().unwrap();
        let path = tmp_d.child("bad.jsonl");
        std::fs::write(&path, "{\"event_number\": 1, \"run_number\": 1}\nnot json\n").unwrap();
        let reader = init_reader(Some(&path)).unwrap();

        let (handle, recv) = spawn_reader(Arc::new(AtomicBool::new(false)), EventScanner::new(reader));
        let events: usize = recv.iter().map(|chunk| chunk.len()).sum();

        assert_eq!(events, 1);
        let err = handle.join().unwrap().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_init_reader_missing_file() {
        let tmp_d = TempDir::new().unwrap();
        let missing = tmp_d.child("missing.jsonl");
        assert!(init_reader(Some(&missing)).is_err());
    }
}
