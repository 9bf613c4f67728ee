#![allow(missing_docs)]

use super::params::*;
use super::prelude::*;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
/// Complete configurable Mock config for testing
pub struct MockConfig {
    pub tagh_fadc_mean_time: f64,
    pub tagm_fadc_mean_time: f64,
    pub tac_threshold: f64,
    pub tac_rebuild_func: String,
    pub tac_trigger_mask: u32,
    pub ps_trigger_mask: u32,
    pub input_file: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub checkpoint_interval: u64,
    pub verbosity: u8,
    pub worker_threads: usize,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl MockConfig {
    pub fn new() -> Self {
        Self {
            tagh_fadc_mean_time: DEFAULT_TAGH_FADC_MEAN_TIME,
            tagm_fadc_mean_time: DEFAULT_TAGM_FADC_MEAN_TIME,
            tac_threshold: DEFAULT_TAC_THRESHOLD,
            tac_rebuild_func: String::new(),
            tac_trigger_mask: DEFAULT_TAC_TRIGGER_MASK,
            ps_trigger_mask: DEFAULT_PS_TRIGGER_MASK,
            input_file: None,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            checkpoint_interval: DEFAULT_CHECKPOINT_INTERVAL,
            verbosity: 0,
            worker_threads: DEFAULT_WORKER_THREADS,
        }
    }

    pub fn new_with_output_dir(output_dir: &Path) -> Self {
        Self {
            output_dir: output_dir.to_owned(),
            ..Default::default()
        }
    }
}

impl Config for MockConfig {}

impl CalibOpt for MockConfig {
    fn tagh_fadc_mean_time(&self) -> f64 {
        self.tagh_fadc_mean_time
    }
    fn tagm_fadc_mean_time(&self) -> f64 {
        self.tagm_fadc_mean_time
    }
    fn tac_threshold(&self) -> f64 {
        self.tac_threshold
    }
    fn tac_rebuild_func(&self) -> &str {
        &self.tac_rebuild_func
    }
    fn tac_trigger_mask(&self) -> u32 {
        self.tac_trigger_mask
    }
    fn ps_trigger_mask(&self) -> u32 {
        self.ps_trigger_mask
    }
}

impl InputOutputOpt for MockConfig {
    fn input_file(&self) -> Option<&Path> {
        self.input_file.as_deref()
    }
    fn output_dir(&self) -> &Path {
        &self.output_dir
    }
    fn checkpoint_interval(&self) -> u64 {
        self.checkpoint_interval
    }
}

impl UtilOpt for MockConfig {
    fn verbosity(&self) -> u8 {
        self.verbosity
    }
    fn worker_threads(&self) -> usize {
        self.worker_threads
    }
}
