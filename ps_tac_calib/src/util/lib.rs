//! Miscellaneous utility functions

use crate::config::prelude::*;
use crate::config::Cfg;
use std::sync::{atomic::AtomicBool, Arc};

/// Start the [stderrlog] instance, and immediately use it to log the resolved parameters.
pub fn init_error_logger(cfg: &(impl UtilOpt + InputOutputOpt)) {
    stderrlog::new()
        .module("ps_tac_calib")
        .module("calib_event_reader")
        .verbosity(cfg.verbosity() as usize)
        .init()
        .expect("Failed to initialize logger");
    match cfg.input_file() {
        Some(path) => log::trace!("Reading events from {}", path.display()),
        None => log::trace!("Reading events from stdin"),
    }
    log::trace!("Writing histograms to {}", cfg.output_dir().display());
    log::trace!("Starting ps-tac-calib with args: {:#?}", Cfg::global());
}

/// Initializes the Ctrl+C handler to facilitate graceful shutdown on Ctrl+C
///
/// Also handles SIGTERM and SIGHUP if the `termination` feature is enabled
pub fn init_ctrlc_handler(stop_flag: Arc<AtomicBool>) {
    // Handles SIGINT, SIGTERM and SIGHUP (as the `termination` feature is  enabled)
    ctrlc::set_handler({
        let mut stop_sig_count = 0;
        move || {
            log::warn!(
                "Stop Ctrl+C, SIGTERM, or SIGHUP received, writing histograms and stopping, please wait..."
            );
            stop_flag.store(true, std::sync::atomic::Ordering::SeqCst);
            stop_sig_count += 1;
            if stop_sig_count > 1 {
                log::warn!("Second stop signal received, ungraceful shutdown.");
                std::process::exit(1);
            }
        }
    })
    .expect("Error setting Ctrl-C handler");
}

/// Exits the program with the appropriate exit code
pub fn exit(exit_code: u8) -> std::process::ExitCode {
    if exit_code == 0 {
        log::debug!("Exit successful from event processing");
        std::process::ExitCode::SUCCESS
    } else {
        std::process::ExitCode::from(exit_code)
    }
}
