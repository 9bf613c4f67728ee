//! Contains the [HistogramController], the single writer of every histogram bucket.
//!
//! It applies fill batches, keeps the [TriggerStats], and writes the container on request.
//! A registry error is fatal: the stop flag is raised and all later fills are ignored, flushes still write what was collected.

use super::container::write_container_file;
use super::{HistoMsg, DEFAULT_OUTPUT_NAME};
use crate::analyze::FillBatch;
use crate::registry::HistogramRegistry;
use crate::stats::{RunSummary, TriggerStats};
use crate::trigger::TriggerClassifier;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Owns the registry and applies [HistoMsg]s until every sender is dropped.
pub struct HistogramController {
    registry: HistogramRegistry,
    classifier: TriggerClassifier,
    trigger_stats: TriggerStats,
    output_path: PathBuf,
    run_number: u32,
    flushes: u64,
    last_output: Option<PathBuf>,
    fatal_error: Option<Box<str>>,
    processing_time: Instant,
    recv_chan: flume::Receiver<HistoMsg>,
    // Set to None when the event loop starts, so the loop breaks once every producer is gone.
    send_chan: Option<flume::Sender<HistoMsg>>,
    end_processing_flag: Arc<AtomicBool>,
}

impl HistogramController {
    /// Create a new [HistogramController] writing to [DEFAULT_OUTPUT_NAME] in `output_dir` until told otherwise.
    pub fn new(
        registry: HistogramRegistry,
        classifier: TriggerClassifier,
        output_dir: &Path,
        end_processing_flag: Arc<AtomicBool>,
    ) -> Self {
        let (send_chan, recv_chan) = flume::unbounded();
        Self {
            registry,
            classifier,
            trigger_stats: TriggerStats::default(),
            output_path: output_dir.join(DEFAULT_OUTPUT_NAME),
            run_number: 0,
            flushes: 0,
            last_output: None,
            fatal_error: None,
            processing_time: Instant::now(),
            recv_chan,
            send_chan: Some(send_chan),
            end_processing_flag,
        }
    }

    /// Returns a clone of the channel that is used to send messages to the controller.
    ///
    /// # Panics
    /// If called after [HistogramController::run] started.
    pub fn send_channel(&self) -> flume::Sender<HistoMsg> {
        self.send_chan
            .as_ref()
            .expect("Controller is already running and does not accept new producers")
            .clone()
    }

    /// Starts the event loop, blocks until every sender is dropped.
    pub fn run(mut self) -> RunSummary {
        self.send_chan = None;

        while let Ok(msg) = self.recv_chan.recv() {
            log::trace!("Histogram controller received {msg}");
            self.update(msg);
        }

        let summary = RunSummary {
            registry: self.registry,
            trigger_stats: self.trigger_stats,
            flushes: self.flushes,
            last_output: self.last_output,
            fatal_error: self.fatal_error,
            processing_time: self.processing_time.elapsed(),
        };
        log::debug!("Histogram controller done: {}", summary.trigger_stats);
        log::debug!("\n{}", summary.report().render());
        summary
    }

    fn update(&mut self, msg: HistoMsg) {
        match msg {
            HistoMsg::Fills(batch) => self.apply(&batch),
            HistoMsg::TriggerSeen(bits) => {
                let useful = self.classifier.classify(bits).is_useful();
                self.trigger_stats.collect_stats(bits, useful);
            }
            HistoMsg::SetOutput { run_number, path } => {
                log::info!("Run {run_number}: writing histograms to {}", path.display());
                self.run_number = run_number;
                self.output_path = path;
            }
            HistoMsg::Flush { ack } => {
                let result = self.flush();
                match ack {
                    Some(ack) => {
                        if ack.send(result).is_err() {
                            log::warn!("Flush requester disconnected before the acknowledgement");
                        }
                    }
                    None => {
                        if let Err(e) = result {
                            crate::display_error(&format!(
                                "Checkpoint flush to {} failed: {e}",
                                self.output_path.display()
                            ));
                        }
                    }
                }
            }
            HistoMsg::Fatal(err) => self.fatal(err),
        }
    }

    fn apply(&mut self, batch: &FillBatch) {
        if self.fatal_error.is_some() {
            log::trace!("Fatal error already seen, ignoring {} fills", batch.len());
            return;
        }
        self.trigger_stats.record_invocation(batch.subsystem());
        for (key, value) in batch.fills() {
            if let Err(e) = self.registry.fill(*key, batch.bit(), *value) {
                self.fatal(e.to_string().into());
                return;
            }
        }
    }

    fn fatal(&mut self, err: Box<str>) {
        if self.fatal_error.is_some() {
            log::trace!("Fatal error already seen, ignoring error: {err}");
            return;
        }
        self.end_processing_flag.store(true, Ordering::SeqCst);
        crate::display_error(&format!("FATAL: {err}\nShutting down..."));
        self.fatal_error = Some(err);
    }

    fn flush(&mut self) -> io::Result<PathBuf> {
        write_container_file(&self.output_path, self.run_number, &self.registry)?;
        self.flushes += 1;
        log::debug!(
            "Flushed {} histograms to {}",
            self.registry.len(),
            self.output_path.display()
        );
        self.last_output = Some(self.output_path.clone());
        Ok(self.output_path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::super::container::read_container;
    use super::super::init_controller;
    use super::*;
    use crate::registry::HistoKey;
    use crate::trigger::{Subsystem, TriggerBit};
    use pretty_assertions::assert_eq;
    use temp_dir::TempDir;

    const CLASSIFIER: TriggerClassifier = TriggerClassifier::new(0b10, 0b01);

    fn start(
        output_dir: &Path,
    ) -> (
        std::thread::JoinHandle<RunSummary>,
        flume::Sender<HistoMsg>,
        Arc<AtomicBool>,
    ) {
        let stop_flag = Arc::new(AtomicBool::new(false));
        let registry = HistogramRegistry::from_classifier(&CLASSIFIER).unwrap();
        let (handle, send) = init_controller(registry, CLASSIFIER, output_dir, stop_flag.clone());
        (handle, send, stop_flag)
    }

    fn tac_batch(fills: &[(HistoKey, f64)]) -> FillBatch {
        let mut batch = FillBatch::new(TriggerBit::new(1).unwrap(), Subsystem::Tac);
        for (key, x) in fills {
            batch.fill(*key, *x);
        }
        batch
    }

    fn acked_flush(send: &flume::Sender<HistoMsg>) -> io::Result<PathBuf> {
        let (ack, recv) = flume::bounded(1);
        send.send(HistoMsg::Flush { ack: Some(ack) }).unwrap();
        recv.recv().unwrap()
    }

    #[test]
    fn test_fills_and_stats() {
        let tmp_d = TempDir::new().unwrap();
        let (handle, send, stop_flag) = start(tmp_d.path());

        send.send(HistoMsg::TriggerSeen(0b10)).unwrap();
        send.send(HistoMsg::TriggerSeen(0b100)).unwrap();
        send.send(HistoMsg::Fills(tac_batch(&[(HistoKey::TAC_NHITS, 1.0)])))
            .unwrap();
        drop(send);

        let summary = handle.join().unwrap();
        assert!(!stop_flag.load(Ordering::SeqCst));
        assert_eq!(summary.trigger_stats.useful_events(), 1);
        assert_eq!(summary.trigger_stats.dropped_events(), 1);
        assert_eq!(summary.trigger_stats.invocations(Subsystem::Tac), 1);
        assert_eq!(
            summary
                .registry
                .bucket(HistoKey::TAC_NHITS, TriggerBit::new(1).unwrap())
                .unwrap()
                .entries(),
            1
        );
        assert_eq!(summary.flushes, 0);
        assert!(summary.fatal_error.is_none());
    }

    #[test]
    fn test_default_output_then_run_output() {
        let tmp_d = TempDir::new().unwrap();
        let (handle, send, _) = start(tmp_d.path());

        let default_path = acked_flush(&send).unwrap();
        assert_eq!(default_path, tmp_d.path().join("tac_monitor.hist"));

        let run_path = tmp_d.path().join("ps_vs_tac_calib_12.hist");
        send.send(HistoMsg::SetOutput {
            run_number: 12,
            path: run_path.clone(),
        })
        .unwrap();
        assert_eq!(acked_flush(&send).unwrap(), run_path);
        drop(send);

        let summary = handle.join().unwrap();
        assert_eq!(summary.flushes, 2);
        assert_eq!(summary.last_output, Some(run_path.clone()));
        assert_eq!(read_container(&run_path).unwrap().run_number, 12);
    }

    #[test]
    fn test_consecutive_flushes_byte_identical() {
        let tmp_d = TempDir::new().unwrap();
        let (handle, send, _) = start(tmp_d.path());
        send.send(HistoMsg::Fills(tac_batch(&[
            (HistoKey::TAC_TIME, 2.0),
            (HistoKey::TAC_TAGH_ENERGY, 9.0),
        ])))
        .unwrap();

        let path = acked_flush(&send).unwrap();
        let first = std::fs::read(&path).unwrap();
        let path = acked_flush(&send).unwrap();
        let second = std::fs::read(&path).unwrap();
        assert_eq!(first, second);

        drop(send);
        let _ = handle.join().unwrap();
    }

    #[test]
    fn test_unregistered_fill_is_fatal() {
        let tmp_d = TempDir::new().unwrap();
        let (handle, send, stop_flag) = start(tmp_d.path());

        // PS family is only registered on bit 0
        let mut batch = FillBatch::new(TriggerBit::new(1).unwrap(), Subsystem::Ps);
        batch.fill(HistoKey::PSC_TIME, 1.0);
        send.send(HistoMsg::Fills(batch)).unwrap();
        send.send(HistoMsg::Fills(tac_batch(&[(HistoKey::TAC_NHITS, 1.0)])))
            .unwrap();
        drop(send);

        let summary = handle.join().unwrap();
        assert!(stop_flag.load(Ordering::SeqCst));
        assert_eq!(
            summary.fatal_error.as_deref(),
            Some("PSC_TIME_1 was never registered")
        );
        // Later batches are ignored
        assert_eq!(
            summary
                .registry
                .bucket(HistoKey::TAC_NHITS, TriggerBit::new(1).unwrap())
                .unwrap()
                .entries(),
            0
        );
    }

    #[test]
    fn test_dimension_mismatch_is_fatal() {
        let tmp_d = TempDir::new().unwrap();
        let (handle, send, stop_flag) = start(tmp_d.path());
        let mut batch = FillBatch::new(TriggerBit::new(1).unwrap(), Subsystem::Tac);
        batch.fill(HistoKey::TAC_TIME_VS_E, 1.0);
        send.send(HistoMsg::Fills(batch)).unwrap();
        drop(send);

        let summary = handle.join().unwrap();
        assert!(stop_flag.load(Ordering::SeqCst));
        assert!(summary.fatal_error.is_some());
    }

    #[test]
    fn test_flush_error_is_acknowledged() {
        let tmp_d = TempDir::new().unwrap();
        let (handle, send, stop_flag) = start(&tmp_d.path().join("missing_dir"));

        assert!(acked_flush(&send).is_err());
        // Checkpoint failures are only logged
        send.send(HistoMsg::Flush { ack: None }).unwrap();
        drop(send);

        let summary = handle.join().unwrap();
        assert_eq!(summary.flushes, 0);
        assert!(!stop_flag.load(Ordering::SeqCst));
    }

    #[test]
    fn test_2d_fill_routing() {
        let tmp_d = TempDir::new().unwrap();
        let (handle, send, _) = start(tmp_d.path());
        let mut batch = FillBatch::new(TriggerBit::new(1).unwrap(), Subsystem::Tac);
        batch.fill_2d(HistoKey::TAC_TIME_VS_E, 600.0, 1.0);
        send.send(HistoMsg::Fills(batch)).unwrap();
        drop(send);

        let summary = handle.join().unwrap();
        let hist = summary
            .registry
            .bucket(HistoKey::TAC_TIME_VS_E, TriggerBit::new(1).unwrap())
            .unwrap()
            .as_2d()
            .unwrap();
        assert_eq!(hist.filled_cells(), 1);
        assert_eq!(hist.entries(), 1);
    }
}
