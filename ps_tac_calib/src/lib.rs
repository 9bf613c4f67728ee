#![warn(unused_extern_crates)]
#![warn(missing_docs)]
#![warn(missing_copy_implementations)]
// Readability lints
#![warn(
    clippy::option_filter_map,
    clippy::manual_filter_map,
    clippy::if_not_else,
    clippy::nonminimal_bool,
    clippy::single_match_else,
    clippy::range_plus_one,
    clippy::int_plus_one,
    clippy::needless_range_loop,
    clippy::needless_continue,
    clippy::shadow_same,
    clippy::shadow_unrelated
)]
// Performance lints
#![warn(
    clippy::needless_pass_by_value,
    clippy::unnecessary_wraps,
    clippy::mutex_integer,
    clippy::mem_forget,
    clippy::maybe_infinite_iter
)]
// Safety lints
#![warn(unused_results)]
#![warn(unused_import_braces)]
#![warn(trivial_casts, trivial_numeric_casts)]
// Unhandled results (allow unwrap and expect as there are many cases where the unwrap is totally safe)
#![warn(clippy::map_unwrap_or)]

//! PS vs TAC calibration: histograms pair spectrometer, tagger hodoscope and TAC timing per trigger bit.
//!
//! # Usage
//!
//! ## Replaying recorded events from a file
//! ```shell
//! $ ps-tac-calib events.jsonl -o calib_out
//! ```
//!
//! ## Overriding parameters
//! Parameters are resolved from the parameters file, then `-P` assignments in order, then dedicated flags.
//! ```shell
//! $ ps-tac-calib events.jsonl -p ps_tac_calib_params.toml -P TAC:THRESHOLD=250 -P TAC:TRIGGER_MASK=0x6
//! ```
//!
//! ## Reading events from stdin
//! ```shell
//! $ cat events.jsonl | ps-tac-calib -t 8
//! ```
//!
//! The lifecycle can also be driven directly by a host through [processor::PsVsTacCalibration].

use calib_event_reader::prelude::{EventScanner, RecordedEvent};
use config::prelude::*;
use error::CalibError;
use itertools::Itertools;
use processor::PsVsTacCalibration;
use stats::RunSummary;
use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

/// Write an error message to stderr.
/// All error messages should be written through this function to ensure consistency.
#[inline]
pub fn display_error(err_msg: &str) {
    log::error!("{}", owo_colors::OwoColorize::red(&err_msg));
}

pub mod analyze;
pub mod config;
pub mod error;
pub mod histogram;
pub mod init;
pub mod processor;
pub mod registry;
pub mod sink;
pub mod stats;
pub mod trigger;
pub mod util;

/// Depth of the queue between the dispatcher and the workers, per worker
const WORKER_QUEUE_DEPTH: usize = 64;

/// Replay every event the scanner yields through the calibration lifecycle, as a host framework would.
///
/// Follows these steps:
/// 1. Validate the config, build the registry and start the histogram controller with [PsVsTacCalibration::init].
/// 2. Launch the reader thread with [calib_event_reader::spawn_reader].
/// 3. For each run (consecutive events with the same run number): begin the run, dispatch its events to the worker threads, end the run.
/// 4. Finalize and return the [RunSummary].
///
/// Raising `stop_flag` stops dispatching, the current run is still ended and the summary returned.
/// A read error ends the input, what was collected is written before the error is returned.
pub fn process<C: Config>(
    config: &C,
    scanner: EventScanner<impl BufRead + ?Sized + Send + 'static>,
    stop_flag: Arc<AtomicBool>,
) -> Result<RunSummary, CalibError> {
    let mut calibration = PsVsTacCalibration::new(config, stop_flag.clone())?;
    calibration.init()?;

    let (reader_handle, chunk_recv) =
        calib_event_reader::spawn_reader(stop_flag.clone(), scanner);
    let mut events = chunk_recv.into_iter().flatten().peekable();

    let runs_result = replay_runs(&mut calibration, &mut events, &stop_flag);

    // Disconnect the reader before joining it, it might be blocked on a full channel
    drop(events);
    let read_result = reader_handle.join().expect("Error joining reader thread");
    let summary = calibration.finalize()?;
    let runs = runs_result?;
    let events_read = read_result?;
    log::info!("{events_read} events read in {runs} runs");
    Ok(summary)
}

fn replay_runs<C: Config>(
    calibration: &mut PsVsTacCalibration<C>,
    events: &mut std::iter::Peekable<impl Iterator<Item = RecordedEvent>>,
    stop_flag: &AtomicBool,
) -> Result<u32, CalibError> {
    let mut runs = 0;
    while let Some(run_number) = events.peek().map(|event| event.run_number) {
        if stop_flag.load(Ordering::SeqCst) {
            log::debug!("Stop flag raised, run {run_number} not started");
            break;
        }
        calibration.begin_run(run_number)?;
        runs += 1;
        let run_events = events.peeking_take_while(|event| event.run_number == run_number);
        let dispatched = dispatch_run(calibration, run_events, stop_flag);
        let flushed = calibration.end_run();
        let dispatched = dispatched?;
        log::info!(
            "Run {run_number}: {dispatched} events written to {}",
            flushed?.display()
        );
    }
    Ok(runs)
}

/// Spread the events of one run over the worker threads, returns the number of events dispatched.
fn dispatch_run<C: Config>(
    calibration: &PsVsTacCalibration<C>,
    run_events: impl Iterator<Item = RecordedEvent>,
    stop_flag: &AtomicBool,
) -> Result<u64, CalibError> {
    let worker_count = calibration.config().worker_threads();
    let (send_chan, recv_chan) =
        crossbeam_channel::bounded::<RecordedEvent>(worker_count * WORKER_QUEUE_DEPTH);

    thread::scope(|scope| {
        let workers: Vec<_> = (0..worker_count)
            .map(|id| {
                let recv_chan = recv_chan.clone();
                thread::Builder::new()
                    .name(format!("worker-{id}"))
                    .spawn_scoped(scope, move || -> Result<(), CalibError> {
                        while let Ok(event) = recv_chan.recv() {
                            calibration.event(&event, event.event_number)?;
                        }
                        Ok(())
                    })
                    .expect("Failed to spawn worker thread")
            })
            .collect();
        drop(recv_chan);

        let mut dispatched = 0;
        for event in run_events {
            if stop_flag.load(Ordering::SeqCst) || send_chan.send(event).is_err() {
                break;
            }
            dispatched += 1;
        }
        drop(send_chan);

        let mut result = Ok(dispatched);
        for worker in workers {
            match worker.join().expect("Worker thread panicked") {
                Ok(()) | Err(CalibError::Stopped) => (),
                Err(e) => {
                    if result.is_ok() {
                        result = Err(e);
                    }
                }
            }
        }
        result
    })
}
