//! Contains the [Cfg] struct that parses and stores the command line arguments and the resolved calibration parameters
//!
//! [Cfg] uses procedural macros from the `clap` library to implement most of the argument parsing and validation logic.
//! The calibration parameters are resolved from the parameters TOML file, then `-P KEY=VALUE` assignments in order, then the dedicated flags.

use crate::error::CalibError;
use clap::Parser;
use clap_complete::Shell;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub mod calib;
pub mod inputoutput;
pub mod lib;
pub mod params;
pub mod prelude;
pub mod test_util;
pub mod util;

use prelude::*;

/// Name of the parameters template written by `--generate-params-toml`
pub const PARAMS_TOML_TEMPLATE_NAME: &str = "ps_tac_calib_params.toml";

/// The [CONFIG] static variable is used to store the [Cfg] created from the parsed command line arguments
pub static CONFIG: OnceLock<Cfg> = OnceLock::new();

/// The [Cfg] struct uses procedural macros and implements the [Config] trait, to provide convenient access to the command line arguments.
#[derive(Parser, Debug)]
#[command(name = "ps-tac-calib - PS vs TAC calibration histogram aggregator")]
#[command(bin_name = "ps-tac-calib", version)]
#[command(about = "Replays recorded events through the PS vs TAC calibration and writes the histograms.")]
#[command(
    long_about = "\nps-tac-calib replays recorded events through the PS vs TAC calibration.\n\
Events are read as JSON lines, histograms are filled per trigger bit\n\
and written to ps_vs_tac_calib_<run>.hist in the output directory."
)]
#[command(propagate_version = true)]
pub struct Cfg {
    /// Input file of JSON lines events (default: stdin)
    #[arg(name = "Events", value_hint = clap::ValueHint::FilePath)]
    file: Option<PathBuf>,

    /// Path to a parameters TOML file
    #[arg(
        short = 'p',
        long = "params",
        visible_alias = "params-toml",
        value_hint = clap::ValueHint::FilePath
    )]
    params_toml: Option<PathBuf>,

    /// Set a parameter with a host-style KEY=VALUE assignment, e.g. `-P TAC:THRESHOLD=250`. Applied in order after the parameters file
    #[arg(short = 'P', long = "parameter", value_name = "KEY=VALUE")]
    parameters: Vec<String>,

    /// Directory the histogram container is written to, overrides CALIB:OUTPUT_DIR
    #[arg(short = 'o', long = "output-dir", value_hint = clap::ValueHint::DirPath)]
    output_dir: Option<PathBuf>,

    /// Number of worker threads, overrides CALIB:WORKER_THREADS
    #[arg(short = 't', long = "threads")]
    worker_threads: Option<usize>,

    /// Verbosity level 0-4 (Errors, Warnings, Info, Debug, Trace)
    #[arg(short = 'v', long = "verbosity", default_value_t = 1)]
    verbosity: u8,

    /// Generate a parameters TOML file with the defaults filled in, in the current directory.
    #[arg(short, long, default_value_t = false, visible_aliases = ["gen-toml", "gen-params"])]
    generate_params_toml: bool,

    /// Generate completion scripts for the specified shell.
    /// Note: The completion script is printed to stdout
    #[arg(
        long = "generate-completions",
        value_hint = clap::ValueHint::Other,
        value_name = "SHELL"
    )]
    pub generate_completions: Option<Shell>,

    #[arg(skip)]
    params: CalibParams,
}

impl Cfg {
    /// Get a reference to the global config
    pub fn global() -> &'static Cfg {
        CONFIG.get().expect("Config is not initialized")
    }

    /// Resolve the calibration parameters from the parameters file, the `-P` assignments and the dedicated flags.
    pub fn load_params(&mut self) -> Result<(), CalibError> {
        let mut params = match &self.params_toml {
            Some(path) => CalibParams::from_toml_file(path)?,
            None => CalibParams::default(),
        };
        for assignment in &self.parameters {
            params.apply_assignment(assignment)?;
        }
        if let Some(dir) = &self.output_dir {
            params.set_output_dir(dir);
        }
        if let Some(threads) = self.worker_threads {
            params.set_worker_threads(threads);
        }
        self.params = params;
        Ok(())
    }

    /// Set one parameter from a host-style key, e.g. `TAC:THRESHOLD`.
    pub fn set_parameter(&mut self, key: &str, value: &str) -> Result<(), CalibError> {
        self.params.set_parameter(key, value)
    }

    /// The resolved calibration parameters
    pub fn params(&self) -> &CalibParams {
        &self.params
    }

    #[allow(missing_docs)]
    pub fn generate_params_toml_enabled(&self) -> bool {
        self.generate_params_toml
    }

    /// Write the parameters template with the defaults filled in to `path`.
    pub fn generate_params_toml(&self, path: &Path) -> io::Result<()> {
        std::fs::write(path, CalibParams::with_defaults().template_toml())
    }

    /// Generate completion scripts for the specified shell.
    pub fn generate_completion_script(shell: Shell) {
        clap_complete::generate(
            shell,
            &mut <Cfg as clap::CommandFactory>::command(),
            "ps-tac-calib",
            &mut io::stdout(),
        );
    }
}

/// Implementing the config super trait requires implementing all the sub traits
impl Config for Cfg {}

impl CalibOpt for Cfg {
    fn tagh_fadc_mean_time(&self) -> f64 {
        self.params.tagh_fadc_mean_time()
    }
    fn tagm_fadc_mean_time(&self) -> f64 {
        self.params.tagm_fadc_mean_time()
    }
    fn tac_threshold(&self) -> f64 {
        self.params.tac_threshold()
    }
    fn tac_rebuild_func(&self) -> &str {
        self.params.tac_rebuild_func()
    }
    fn tac_trigger_mask(&self) -> u32 {
        self.params.tac_trigger_mask()
    }
    fn ps_trigger_mask(&self) -> u32 {
        self.params.ps_trigger_mask()
    }
}

impl InputOutputOpt for Cfg {
    #[inline]
    fn input_file(&self) -> Option<&Path> {
        self.file.as_deref()
    }
    #[inline]
    fn output_dir(&self) -> &Path {
        self.params.output_dir()
    }
    #[inline]
    fn checkpoint_interval(&self) -> u64 {
        self.params.checkpoint_interval()
    }
}

impl UtilOpt for Cfg {
    #[inline]
    fn verbosity(&self) -> u8 {
        self.verbosity
    }
    #[inline]
    fn worker_threads(&self) -> usize {
        self.params.worker_threads()
    }
}

/// Get the [config][super::config::Cfg] from the command line arguments and set the static [CONFIG] variable.
pub fn init_config() -> Result<(), String> {
    let mut cfg = <super::config::Cfg as clap::Parser>::parse();
    cfg.load_params().map_err(|e| e.to_string())?;
    cfg.validate_args()?;
    crate::config::CONFIG
        .set(cfg)
        .map_err(|_| "Config is already initialized".to_string())
}
