//! Persistence sink: the histogram controller thread that owns every bucket, and the container it writes.
//!
//! Workers never touch buckets, they send [HistoMsg]s to the controller which applies them in arrival order.

pub mod container;
pub mod controller;

use crate::analyze::FillBatch;
use crate::registry::HistogramRegistry;
use crate::stats::RunSummary;
use crate::trigger::TriggerClassifier;
use controller::HistogramController;
use std::fmt::Display;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread::{Builder, JoinHandle};

/// Output name used until a run begins.
pub const DEFAULT_OUTPUT_NAME: &str = "tac_monitor.hist";

/// Output name of the container for `run_number`.
pub fn run_output_name(run_number: u32) -> String {
    format!("ps_vs_tac_calib_{run_number}.hist")
}

/// Messages accepted by the histogram controller.
#[derive(Debug)]
pub enum HistoMsg {
    /// Fills from one aggregator invocation.
    Fills(FillBatch),
    /// Trigger bits of one event, before it is classified.
    TriggerSeen(u32),
    /// Point subsequent flushes at a new container.
    SetOutput {
        #[allow(missing_docs)]
        run_number: u32,
        #[allow(missing_docs)]
        path: PathBuf,
    },
    /// Write every bucket, optionally reporting the outcome.
    Flush {
        /// Receives the written path, or the error.
        ack: Option<flume::Sender<io::Result<PathBuf>>>,
    },
    /// Stop accepting fills.
    Fatal(Box<str>),
}

impl Display for HistoMsg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HistoMsg::Fills(batch) => write!(
                f,
                "{} fills for {} on bit {}",
                batch.len(),
                batch.subsystem(),
                batch.bit()
            ),
            HistoMsg::TriggerSeen(bits) => write!(f, "trigger {bits:#018b}"),
            HistoMsg::SetOutput { run_number, path } => {
                write!(f, "output for run {run_number}: {}", path.display())
            }
            HistoMsg::Flush { ack } => {
                if ack.is_some() {
                    write!(f, "flush (acknowledged)")
                } else {
                    write!(f, "checkpoint flush")
                }
            }
            HistoMsg::Fatal(err) => write!(f, "fatal: {err}"),
        }
    }
}

/// Spawns a thread with the [HistogramController] running, and returns the thread handle and the channel to send [HistoMsg]s to.
///
/// The thread finishes once every sender is dropped and hands back the [RunSummary].
pub fn init_controller(
    registry: HistogramRegistry,
    classifier: TriggerClassifier,
    output_dir: &Path,
    stop_flag: Arc<AtomicBool>,
) -> (JoinHandle<RunSummary>, flume::Sender<HistoMsg>) {
    log::trace!("Initializing histogram controller");
    let mut controller = HistogramController::new(registry, classifier, output_dir, stop_flag);
    let send_chan = controller.send_channel();

    let controller_thread = Builder::new()
        .name("histogram_controller".to_string())
        .spawn(move || controller.run())
        .expect("Failed to spawn histogram controller thread");
    (controller_thread, send_chan)
}
