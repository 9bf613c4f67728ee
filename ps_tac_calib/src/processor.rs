#![allow(non_camel_case_types)] // An exception to the Rust naming convention, for the state machine macro types
//! Contains [PsVsTacCalibration], the event processor the host calls through its lifecycle callbacks.
//!
//! `event` is the only callback taking `&self`, it is called concurrently from the worker threads.
//! Every other callback takes `&mut self` so the borrow checker keeps them out of a running dispatch.

use self::CalibLifecycle::Created_;
use crate::analyze::{FillBatch, PsAggregator, TacAggregator};
use crate::config::prelude::*;
use crate::error::CalibError;
use crate::registry::HistogramRegistry;
use crate::sink::{self, HistoMsg};
use crate::stats::RunSummary;
use crate::trigger::{Subsystem, TriggerClassifier};
use calib_event_reader::prelude::EventLoop;
use sm::sm;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

sm! {
    // All states have the '_' suffix and events have '_' prefix so they show up as `STATE_BY_EVENT` in the generated code
    CalibLifecycle {
        InitialStates { Created_ }

        _Init {
            Created_ => Ready_
        }

        _BeginRun {
            Ready_ => Running_,
            RunEnded_ => Running_
        }

        _EndRun {
            Running_ => RunEnded_
        }

        _Finalize {
            Ready_ => Finalized_,
            RunEnded_ => Finalized_
        }
    }
}

use CalibLifecycle::Variant as state;

fn state_name(lifecycle: &state) -> &'static str {
    match lifecycle {
        state::InitialCreated_(_) => "created",
        state::Ready_By_Init(_) => "ready",
        state::Running_By_BeginRun(_) => "running",
        state::RunEnded_By_EndRun(_) => "between runs",
        state::Finalized_By_Finalize(_) => "finalized",
    }
}

// Everything built by `init` and torn down by `finalize`.
struct Pipeline {
    classifier: TriggerClassifier,
    tac: TacAggregator,
    ps: PsAggregator,
    send_chan: flume::Sender<HistoMsg>,
    controller: JoinHandle<RunSummary>,
}

/// The PS vs TAC calibration event processor.
pub struct PsVsTacCalibration<C: Config> {
    config: C,
    lifecycle: state,
    stop_flag: Arc<AtomicBool>,
    pipeline: Option<Pipeline>,
    run_number: Option<u32>,
}

impl<C: Config> PsVsTacCalibration<C> {
    /// Create the processor, fails if the config is invalid.
    pub fn new(config: C, stop_flag: Arc<AtomicBool>) -> Result<Self, CalibError> {
        config
            .validate_args()
            .map_err(|e| CalibError::Config(e.into()))?;
        Ok(Self {
            config,
            lifecycle: CalibLifecycle::Machine::new(Created_).as_enum(),
            stop_flag,
            pipeline: None,
            run_number: None,
        })
    }

    /// Name of the current lifecycle state.
    pub fn state(&self) -> &'static str {
        state_name(&self.lifecycle)
    }

    /// Run number of the current or last run.
    pub fn run_number(&self) -> Option<u32> {
        self.run_number
    }

    #[allow(missing_docs)]
    pub fn config(&self) -> &C {
        &self.config
    }

    fn invalid_state(&self, operation: &'static str) -> CalibError {
        CalibError::InvalidState {
            operation,
            state: self.state(),
        }
    }

    /// Build the classifier, aggregators and histogram registry, and start the histogram controller.
    pub fn init(&mut self) -> Result<(), CalibError> {
        use CalibLifecycle as event;
        // Committed once the pipeline is built, a failed init stays in `created`
        let ready = match self.lifecycle.clone() {
            state::InitialCreated_(stm) => stm.transition(event::_Init).as_enum(),
            _ => return Err(self.invalid_state("init")),
        };

        log::debug!(
            "TAGH flash ADC mean time: {} ns, TAGM flash ADC mean time: {} ns",
            self.config.tagh_fadc_mean_time(),
            self.config.tagm_fadc_mean_time()
        );
        let classifier = TriggerClassifier::new(
            self.config.tac_trigger_mask(),
            self.config.ps_trigger_mask(),
        );
        let registry = HistogramRegistry::from_classifier(&classifier)?;
        log::info!(
            "TAC mask {:#06X}, PS mask {:#06X}: {} histograms registered",
            classifier.mask(Subsystem::Tac),
            classifier.mask(Subsystem::Ps),
            registry.len()
        );
        let (controller, send_chan) = sink::init_controller(
            registry,
            classifier,
            self.config.output_dir(),
            self.stop_flag.clone(),
        );
        self.pipeline = Some(Pipeline {
            classifier,
            tac: TacAggregator::new(&self.config),
            ps: PsAggregator::new(),
            send_chan,
            controller,
        });
        self.lifecycle = ready;
        Ok(())
    }

    fn pipeline(&self, operation: &'static str) -> Result<&Pipeline, CalibError> {
        self.pipeline
            .as_ref()
            .ok_or_else(|| self.invalid_state(operation))
    }

    /// Point the output at the container of `run_number`.
    pub fn begin_run(&mut self, run_number: u32) -> Result<(), CalibError> {
        use CalibLifecycle as event;
        self.lifecycle = match self.lifecycle.clone() {
            state::Ready_By_Init(stm) => stm.transition(event::_BeginRun).as_enum(),
            state::RunEnded_By_EndRun(stm) => stm.transition(event::_BeginRun).as_enum(),
            _ => return Err(self.invalid_state("begin a run")),
        };
        self.run_number = Some(run_number);

        let path = self
            .config
            .output_dir()
            .join(sink::run_output_name(run_number));
        self.pipeline("begin a run")?
            .send_chan
            .send(HistoMsg::SetOutput { run_number, path })
            .map_err(|_| CalibError::ControllerGone)
    }

    /// Process one event.
    ///
    /// Events without a relevant trigger bit are only counted. Each (bit, subsystem) pair of the fan-out
    /// sends one [FillBatch] to the histogram controller, a checkpoint is requested when `event_number`
    /// is a multiple of the checkpoint interval.
    pub fn event(&self, event: &impl EventLoop, event_number: u64) -> Result<(), CalibError> {
        if !matches!(self.lifecycle, state::Running_By_BeginRun(_)) {
            return Err(self.invalid_state("process an event"));
        }
        if self.stop_flag.load(Ordering::SeqCst) {
            return Err(CalibError::Stopped);
        }
        let pipeline = self.pipeline("process an event")?;
        let send = |msg: HistoMsg| {
            pipeline
                .send_chan
                .send(msg)
                .map_err(|_| CalibError::ControllerGone)
        };

        let trigger_bits = match event.l1_trigger() {
            Ok(trigger) => trigger.trig_mask,
            Err(e) => {
                log::trace!("Event {event_number}: {e}");
                0
            }
        };
        send(HistoMsg::TriggerSeen(trigger_bits))?;
        if !pipeline.classifier.classify(trigger_bits).is_useful() {
            return Ok(());
        }

        for (bit, subsystem) in pipeline.classifier.fan_out(trigger_bits) {
            let mut batch = FillBatch::new(bit, subsystem);
            match subsystem {
                Subsystem::Tac => pipeline.tac.aggregate(event, &mut batch),
                Subsystem::Ps => pipeline.ps.aggregate(event, &mut batch),
            }
            send(HistoMsg::Fills(batch))?;
        }

        let interval = self.config.checkpoint_interval();
        if interval != 0 && event_number % interval == 0 {
            log::debug!("Checkpoint at event {event_number}");
            send(HistoMsg::Flush { ack: None })?;
        }
        Ok(())
    }

    /// Write every histogram to the run's container, returns the path written.
    pub fn end_run(&mut self) -> Result<PathBuf, CalibError> {
        use CalibLifecycle as event;
        self.lifecycle = match self.lifecycle.clone() {
            state::Running_By_BeginRun(stm) => stm.transition(event::_EndRun).as_enum(),
            _ => return Err(self.invalid_state("end a run")),
        };

        let (ack, ack_recv) = flume::bounded(1);
        self.pipeline("end a run")?
            .send_chan
            .send(HistoMsg::Flush { ack: Some(ack) })
            .map_err(|_| CalibError::ControllerGone)?;
        let path = ack_recv.recv().map_err(|_| CalibError::ControllerGone)??;
        log::info!("End of run: histograms written to {}", path.display());
        Ok(path)
    }

    /// Stop the histogram controller and hand back everything it collected.
    pub fn finalize(&mut self) -> Result<RunSummary, CalibError> {
        use CalibLifecycle as event;
        self.lifecycle = match self.lifecycle.clone() {
            state::Ready_By_Init(stm) => stm.transition(event::_Finalize).as_enum(),
            state::RunEnded_By_EndRun(stm) => stm.transition(event::_Finalize).as_enum(),
            _ => return Err(self.invalid_state("finalize")),
        };

        let Pipeline {
            send_chan,
            controller,
            ..
        } = self
            .pipeline
            .take()
            .ok_or_else(|| self.invalid_state("finalize"))?;
        drop(send_chan);
        let summary = controller
            .join()
            .expect("Histogram controller thread panicked");
        log::debug!("Finalized after {} flushes", summary.flushes);
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::HistoKey;
    use crate::sink::container::read_container;
    use crate::trigger::TriggerBit;
    use calib_event_reader::prelude::{RecordedEvent, TacHit, TaghHit};
    use pretty_assertions::assert_eq;
    use temp_dir::TempDir;

    fn calibration(config: MockConfig) -> PsVsTacCalibration<MockConfig> {
        PsVsTacCalibration::new(config, Arc::new(AtomicBool::new(false))).unwrap()
    }

    fn tac_event(event_number: u64) -> RecordedEvent {
        RecordedEvent::new(7, event_number)
            .with_trigger(0b10)
            .with_tac_hits("", vec![TacHit::new(1.0, 800.0)])
            .with_tagh_hits(vec![TaghHit::new(3.0, 9.0, 12)])
            .with_rf_time("TOF", 0.5)
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = MockConfig {
            tac_threshold: -1.0,
            ..Default::default()
        };
        let res = PsVsTacCalibration::new(config, Arc::new(AtomicBool::new(false)));
        assert!(matches!(res, Err(CalibError::Config(_))));
    }

    #[test]
    fn test_event_outside_run_rejected() {
        let tmp_d = TempDir::new().unwrap();
        let mut calib = calibration(MockConfig::new_with_output_dir(tmp_d.path()));
        assert!(matches!(
            calib.event(&tac_event(1), 1),
            Err(CalibError::InvalidState { state: "created", .. })
        ));
        calib.init().unwrap();
        assert!(matches!(
            calib.event(&tac_event(1), 1),
            Err(CalibError::InvalidState { state: "ready", .. })
        ));
        let _ = calib.finalize().unwrap();
    }

    #[test]
    fn test_init_reaches_ready_with_pipeline() {
        let tmp_d = TempDir::new().unwrap();
        let mut calib = calibration(MockConfig::new_with_output_dir(tmp_d.path()));
        assert_eq!(calib.state(), "created");
        assert!(calib.pipeline.is_none());

        calib.init().unwrap();
        assert_eq!(calib.state(), "ready");
        assert!(calib.pipeline.is_some());

        // A rejected second init leaves the running pipeline in place
        assert!(matches!(
            calib.init(),
            Err(CalibError::InvalidState { state: "ready", .. })
        ));
        assert!(calib.pipeline.is_some());
        let _ = calib.finalize().unwrap();
    }

    #[test]
    fn test_lifecycle_order_enforced() {
        let tmp_d = TempDir::new().unwrap();
        let mut calib = calibration(MockConfig::new_with_output_dir(tmp_d.path()));
        assert!(calib.begin_run(1).is_err());
        assert!(calib.end_run().is_err());
        calib.init().unwrap();
        assert!(calib.init().is_err());
        assert!(calib.end_run().is_err());
        calib.begin_run(1).unwrap();
        assert!(matches!(
            calib.finalize(),
            Err(CalibError::InvalidState {
                operation: "finalize",
                state: "running"
            })
        ));
        let _ = calib.end_run().unwrap();
        assert_eq!(calib.state(), "between runs");
        let _ = calib.finalize().unwrap();
        assert_eq!(calib.state(), "finalized");
        assert!(calib.begin_run(2).is_err());
    }

    #[test]
    fn test_run_fills_and_writes_container() {
        let tmp_d = TempDir::new().unwrap();
        let mut calib = calibration(MockConfig::new_with_output_dir(tmp_d.path()));
        calib.init().unwrap();
        calib.begin_run(7).unwrap();
        calib.event(&tac_event(1), 1).unwrap();
        // Not useful with the default masks
        calib
            .event(&RecordedEvent::new(7, 2).with_trigger(0b100), 2)
            .unwrap();
        let path = calib.end_run().unwrap();
        assert_eq!(path, tmp_d.path().join("ps_vs_tac_calib_7.hist"));

        let summary = calib.finalize().unwrap();
        assert_eq!(summary.trigger_stats.events_seen(), 2);
        assert_eq!(summary.trigger_stats.dropped_events(), 1);
        assert_eq!(summary.flushes, 1);

        let container = read_container(&path).unwrap();
        assert_eq!(container.run_number, 7);
        assert_eq!(container.histograms.len(), 30);
        let bit1 = TriggerBit::new(1).unwrap();
        let matched = container
            .get(&HistoKey::TAC_TAGH_TIME_MATCHED.bucket_name(bit1))
            .unwrap();
        assert_eq!(matched.entries(), 1);
    }

    #[test]
    fn test_checkpoints_follow_interval() {
        let tmp_d = TempDir::new().unwrap();
        let mut calib = calibration(MockConfig {
            checkpoint_interval: 2,
            ..MockConfig::new_with_output_dir(tmp_d.path())
        });
        calib.init().unwrap();
        calib.begin_run(3).unwrap();
        for event_number in 1..=5 {
            calib.event(&tac_event(event_number), event_number).unwrap();
        }
        let _ = calib.end_run().unwrap();
        let summary = calib.finalize().unwrap();
        // Events 2 and 4, then end of run
        assert_eq!(summary.flushes, 3);
    }

    #[test]
    fn test_zero_interval_disables_checkpoints() {
        let tmp_d = TempDir::new().unwrap();
        let mut calib = calibration(MockConfig {
            checkpoint_interval: 0,
            ..MockConfig::new_with_output_dir(tmp_d.path())
        });
        calib.init().unwrap();
        calib.begin_run(3).unwrap();
        calib.event(&tac_event(0), 0).unwrap();
        let _ = calib.end_run().unwrap();
        assert_eq!(calib.finalize().unwrap().flushes, 1);
    }

    #[test]
    fn test_stop_flag_stops_events() {
        let tmp_d = TempDir::new().unwrap();
        let stop_flag = Arc::new(AtomicBool::new(false));
        let mut calib = PsVsTacCalibration::new(
            MockConfig::new_with_output_dir(tmp_d.path()),
            stop_flag.clone(),
        )
        .unwrap();
        calib.init().unwrap();
        calib.begin_run(1).unwrap();
        stop_flag.store(true, Ordering::SeqCst);
        assert!(matches!(
            calib.event(&tac_event(1), 1),
            Err(CalibError::Stopped)
        ));
        // What was collected can still be written
        let _ = calib.end_run().unwrap();
        let _ = calib.finalize().unwrap();
    }

    #[test]
    fn test_end_run_surfaces_write_error() {
        let tmp_d = TempDir::new().unwrap();
        let mut calib = calibration(MockConfig::new_with_output_dir(
            &tmp_d.path().join("does_not_exist"),
        ));
        calib.init().unwrap();
        calib.begin_run(1).unwrap();
        assert!(matches!(calib.end_run(), Err(CalibError::Io(_))));
        let summary = calib.finalize().unwrap();
        assert_eq!(summary.flushes, 0);
    }
}
