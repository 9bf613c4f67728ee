//! Contains the [run] function that is the entry point for the `ps-tac-calib` binary
use crate::config::prelude::*;
use crate::config::{init_config, Cfg, PARAMS_TOML_TEMPLATE_NAME};
use crate::util::lib::{self, init_ctrlc_handler, init_error_logger};
use calib_event_reader::prelude::{init_reader, EventScanner};
use std::io::{self, Write};
use std::path::Path;
use std::process::ExitCode;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Entry point for ps-tac-calib
pub fn run() -> ExitCode {
    human_panic::setup_panic!();

    if let Err(e) = init_config() {
        eprintln!("{e}");
        return ExitCode::from(1);
    };

    init_error_logger(Cfg::global());

    if Cfg::global().generate_params_toml_enabled() {
        if let Err(e) = Cfg::global().generate_params_toml(Path::new(PARAMS_TOML_TEMPLATE_NAME)) {
            crate::display_error(&format!(
                "Failed to write '{PARAMS_TOML_TEMPLATE_NAME}': {e}"
            ));
            return ExitCode::from(1);
        }
        log::warn!("'{PARAMS_TOML_TEMPLATE_NAME}' file generated in current directory. Use it to set calibration parameters. Exiting...");
        return ExitCode::from(0);
    }

    if let Some(shell) = Cfg::global().generate_completions {
        Cfg::generate_completion_script(shell);
        log::warn!("Completions generated for {shell:?}. Exiting...");
        return ExitCode::from(0);
    }

    let stop_flag = Arc::new(AtomicBool::new(false));
    // Handles SIGINT, SIGTERM and SIGHUP (as the `termination` feature is  enabled)
    init_ctrlc_handler(stop_flag.clone());

    let reader = match init_reader(Cfg::global().input_file()) {
        Ok(reader) => reader,
        Err(e) => {
            crate::display_error(&format!("Cannot read events: {e}"));
            return lib::exit(1);
        }
    };

    let exit_code: u8 = match crate::process(
        Cfg::global(),
        EventScanner::new(reader),
        stop_flag,
    ) {
        Ok(summary) => {
            print_report(&summary.report().render());
            u8::from(summary.fatal_error.is_some())
        }
        Err(e) => {
            crate::display_error(&format!("Processing failed: {e}"));
            1
        }
    };

    lib::exit(exit_code)
}

fn print_report(rendered: &str) {
    let mut stdout = io::stdout().lock();
    if let Err(e) = writeln!(stdout, "{rendered}") {
        if e.kind() != io::ErrorKind::BrokenPipe {
            crate::display_error(&format!("Failed to print report: {e}"));
        }
    }
}
