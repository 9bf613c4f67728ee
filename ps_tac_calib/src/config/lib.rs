//! Contains the [Config] super trait, and all the sub traits required by it
//!
//! Implementing the [Config] super trait is required by configs passed to the calibration plugin and the run driver.

use super::{calib::CalibOpt, inputoutput::InputOutputOpt, util::UtilOpt};
use crate::trigger::TRIGGER_BITS_MASK;

/// Super trait for all the traits that needed to be implemented by the config struct
pub trait Config: Send + Sync + std::marker::Sized
where
    // Subtraits that group together related configuration options
    Self: CalibOpt + InputOutputOpt + UtilOpt,
{
    /// Validate the arguments of the config
    fn validate_args(&self) -> Result<(), String> {
        if self.worker_threads() == 0 {
            return Err("Invalid config: Worker threads must be at least 1".to_string());
        }
        for (name, mask) in [
            ("TAC:TRIGGER_MASK", self.tac_trigger_mask()),
            ("PS:TRIGGER_MASK", self.ps_trigger_mask()),
        ] {
            if mask & TRIGGER_BITS_MASK == 0 {
                return Err(format!(
                    "Invalid config: {name} has no bit set in 0..16 (got: {mask:#X})"
                ));
            }
        }
        let threshold = self.tac_threshold();
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(format!(
                "Invalid config: TAC:THRESHOLD must be finite and non-negative (got: {threshold})"
            ));
        }
        Ok(())
    }
}

impl<T> Config for &T
where
    T: Config,
{
    fn validate_args(&self) -> Result<(), String> {
        (*self).validate_args()
    }
}

impl<T> Config for std::sync::Arc<T>
where
    T: Config,
{
    fn validate_args(&self) -> Result<(), String> {
        (**self).validate_args()
    }
}
