//! Contains [CalibParams], the startup parameters of the calibration, read from a TOML file and/or host-style `KEY=VALUE` assignments.
use crate::error::CalibError;
use descriptive_toml_derive::TomlConfig;
use serde_derive::{Deserialize, Serialize};
use std::path::Path;

/// Default expected TAGH time in the flash ADC window.
pub const DEFAULT_TAGH_FADC_MEAN_TIME: f64 = 100.0;
/// Default expected TAGM time in the flash ADC window.
pub const DEFAULT_TAGM_FADC_MEAN_TIME: f64 = 90.0;
/// Default minimum TAC energy.
pub const DEFAULT_TAC_THRESHOLD: f64 = 500.0;
/// Default TAC trigger mask.
pub const DEFAULT_TAC_TRIGGER_MASK: u32 = 0b10;
/// Default PS trigger mask.
pub const DEFAULT_PS_TRIGGER_MASK: u32 = 0b01;
/// Default number of events between checkpoints.
pub const DEFAULT_CHECKPOINT_INTERVAL: u64 = 200_000;
/// Default output directory.
pub const DEFAULT_OUTPUT_DIR: &str = ".";
/// Default number of worker threads.
pub const DEFAULT_WORKER_THREADS: usize = 4;

/// Host-style keys accepted by [CalibParams::set_parameter].
pub const PARAMETER_KEYS: [&str; 9] = [
    "TAC:TAGH_FADC_MEAN_TIME",
    "TAC:TAGM_FADC_MEAN_TIME",
    "TAC:THRESHOLD",
    "TAC:REBUILD_FUNC",
    "TAC:TRIGGER_MASK",
    "PS:TRIGGER_MASK",
    "CALIB:CHECKPOINT_EVENTS",
    "CALIB:OUTPUT_DIR",
    "CALIB:WORKER_THREADS",
];

/// Calibration parameters, every field falls back to its default when unset.
#[derive(TomlConfig, Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CalibParams {
    #[description = "Expected TAGH time in the flash ADC window in ns (TAC:TAGH_FADC_MEAN_TIME)"]
    #[example = "100.0"]
    tagh_fadc_mean_time: Option<f64>,

    #[description = "Expected TAGM time in the flash ADC window in ns (TAC:TAGM_FADC_MEAN_TIME)"]
    #[example = "90.0"]
    tagm_fadc_mean_time: Option<f64>,

    #[description = "Minimum TAC energy for a hit to be considered (TAC:THRESHOLD)"]
    #[example = "500.0, 250.5"]
    tac_threshold: Option<f64>,

    #[description = "Tag of the TAC hit collection to use, empty for the default collection (TAC:REBUILD_FUNC)"]
    #[example = "Calib"]
    tac_rebuild_func: Option<String>,

    #[description = "Trigger bits relevant to the TAC (TAC:TRIGGER_MASK)"]
    #[example = "2, 0b10"]
    tac_trigger_mask: Option<u32>,

    #[description = "Trigger bits relevant to the pair spectrometer (PS:TRIGGER_MASK)"]
    #[example = "1, 0b01"]
    ps_trigger_mask: Option<u32>,

    #[description = "Events between checkpoint flushes, 0 disables checkpoints (CALIB:CHECKPOINT_EVENTS)"]
    #[example = "200000"]
    checkpoint_interval: Option<u64>,

    #[description = "Directory the histogram container is written to (CALIB:OUTPUT_DIR)"]
    #[example = "calib_out"]
    output_dir: Option<String>,

    #[description = "Worker threads used to process events (CALIB:WORKER_THREADS)"]
    #[example = "4"]
    worker_threads: Option<usize>,
}

impl CalibParams {
    /// Parameters with every numeric default filled in, used for the generated template.
    pub fn with_defaults() -> Self {
        Self {
            tagh_fadc_mean_time: Some(DEFAULT_TAGH_FADC_MEAN_TIME),
            tagm_fadc_mean_time: Some(DEFAULT_TAGM_FADC_MEAN_TIME),
            tac_threshold: Some(DEFAULT_TAC_THRESHOLD),
            tac_rebuild_func: None,
            tac_trigger_mask: Some(DEFAULT_TAC_TRIGGER_MASK),
            ps_trigger_mask: Some(DEFAULT_PS_TRIGGER_MASK),
            checkpoint_interval: Some(DEFAULT_CHECKPOINT_INTERVAL),
            output_dir: None,
            worker_threads: Some(DEFAULT_WORKER_THREADS),
        }
    }

    /// Commented TOML template, set fields are written out and unset fields are commented.
    pub fn template_toml(&self) -> String {
        self.to_string_pretty_toml()
    }

    /// Deserialize a TOML parameters file.
    pub fn from_toml_file(path: &Path) -> Result<Self, CalibError> {
        let toml_str = std::fs::read_to_string(path).map_err(|e| {
            CalibError::Config(format!("Cannot read {}: {e}", path.display()).into())
        })?;
        toml::from_str(&toml_str).map_err(|e| {
            CalibError::Config(format!("Cannot parse {}: {e}", path.display()).into())
        })
    }

    /// Set one parameter from a host-style key and a string value.
    pub fn set_parameter(&mut self, key: &str, value: &str) -> Result<(), CalibError> {
        let value = value.trim();
        match key {
            "TAC:TAGH_FADC_MEAN_TIME" => self.tagh_fadc_mean_time = Some(parse_num(key, value)?),
            "TAC:TAGM_FADC_MEAN_TIME" => self.tagm_fadc_mean_time = Some(parse_num(key, value)?),
            "TAC:THRESHOLD" => self.tac_threshold = Some(parse_num(key, value)?),
            "TAC:REBUILD_FUNC" => self.tac_rebuild_func = Some(value.to_owned()),
            "TAC:TRIGGER_MASK" => self.tac_trigger_mask = Some(parse_mask(key, value)?),
            "PS:TRIGGER_MASK" => self.ps_trigger_mask = Some(parse_mask(key, value)?),
            "CALIB:CHECKPOINT_EVENTS" => self.checkpoint_interval = Some(parse_num(key, value)?),
            "CALIB:OUTPUT_DIR" => self.output_dir = Some(value.to_owned()),
            "CALIB:WORKER_THREADS" => self.worker_threads = Some(parse_num(key, value)?),
            _ => {
                return Err(CalibError::Config(
                    format!(
                        "Unknown parameter {key}, expected one of: {}",
                        PARAMETER_KEYS.join(", ")
                    )
                    .into(),
                ))
            }
        }
        log::debug!("Parameter {key} set to {value}");
        Ok(())
    }

    /// Apply a `KEY=VALUE` assignment.
    pub fn apply_assignment(&mut self, assignment: &str) -> Result<(), CalibError> {
        let (key, value) = assignment.split_once('=').ok_or_else(|| {
            CalibError::Config(format!("Expected KEY=VALUE, got: {assignment}").into())
        })?;
        self.set_parameter(key.trim(), value)
    }

    /// Override the output directory.
    pub fn set_output_dir(&mut self, dir: &Path) {
        self.output_dir = Some(dir.to_string_lossy().into_owned());
    }

    /// Override the number of worker threads.
    pub fn set_worker_threads(&mut self, threads: usize) {
        self.worker_threads = Some(threads);
    }

    #[allow(missing_docs)]
    pub fn tagh_fadc_mean_time(&self) -> f64 {
        self.tagh_fadc_mean_time
            .unwrap_or(DEFAULT_TAGH_FADC_MEAN_TIME)
    }

    #[allow(missing_docs)]
    pub fn tagm_fadc_mean_time(&self) -> f64 {
        self.tagm_fadc_mean_time
            .unwrap_or(DEFAULT_TAGM_FADC_MEAN_TIME)
    }

    #[allow(missing_docs)]
    pub fn tac_threshold(&self) -> f64 {
        self.tac_threshold.unwrap_or(DEFAULT_TAC_THRESHOLD)
    }

    #[allow(missing_docs)]
    pub fn tac_rebuild_func(&self) -> &str {
        self.tac_rebuild_func.as_deref().unwrap_or_default()
    }

    #[allow(missing_docs)]
    pub fn tac_trigger_mask(&self) -> u32 {
        self.tac_trigger_mask.unwrap_or(DEFAULT_TAC_TRIGGER_MASK)
    }

    #[allow(missing_docs)]
    pub fn ps_trigger_mask(&self) -> u32 {
        self.ps_trigger_mask.unwrap_or(DEFAULT_PS_TRIGGER_MASK)
    }

    #[allow(missing_docs)]
    pub fn checkpoint_interval(&self) -> u64 {
        self.checkpoint_interval
            .unwrap_or(DEFAULT_CHECKPOINT_INTERVAL)
    }

    #[allow(missing_docs)]
    pub fn output_dir(&self) -> &Path {
        Path::new(self.output_dir.as_deref().unwrap_or(DEFAULT_OUTPUT_DIR))
    }

    #[allow(missing_docs)]
    pub fn worker_threads(&self) -> usize {
        self.worker_threads.unwrap_or(DEFAULT_WORKER_THREADS)
    }
}

fn parse_num<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, CalibError>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| CalibError::Config(format!("{key}: cannot parse '{value}': {e}").into()))
}

/// Masks are accepted in binary (`0b`), hexadecimal (`0x`) or decimal notation.
fn parse_mask(key: &str, value: &str) -> Result<u32, CalibError> {
    let parsed = if let Some(bin) = value.strip_prefix("0b").or(value.strip_prefix("0B")) {
        u32::from_str_radix(bin, 2)
    } else if let Some(hex) = value.strip_prefix("0x").or(value.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16)
    } else {
        value.parse()
    };
    parsed.map_err(|e| CalibError::Config(format!("{key}: cannot parse mask '{value}': {e}").into()))
}
