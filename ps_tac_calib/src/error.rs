//! Contains [CalibError], the error type returned by the calibration lifecycle and the run driver.

use crate::registry::RegistryError;
use std::fmt::Display;
use std::io;

/// Errors surfaced to the host of the calibration plugin.
#[derive(Debug)]
pub enum CalibError {
    /// Invalid configuration or parameter.
    Config(Box<str>),
    /// A lifecycle callback was invoked in a state that does not allow it.
    InvalidState {
        /// The callback that was invoked.
        operation: &'static str,
        /// The state the plugin was in.
        state: &'static str,
    },
    /// Processing was stopped by a fatal error or a stop signal.
    Stopped,
    /// The histogram controller is no longer receiving.
    ControllerGone,
    /// Reading events or writing the output container failed.
    Io(io::Error),
    /// Histogram registry contract violation.
    Registry(RegistryError),
}

impl Display for CalibError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CalibError::Config(msg) => write!(f, "{msg}"),
            CalibError::InvalidState { operation, state } => {
                write!(f, "Cannot {operation} while {state}")
            }
            CalibError::Stopped => write!(f, "Processing stopped"),
            CalibError::ControllerGone => write!(f, "Histogram controller disconnected"),
            CalibError::Io(e) => write!(f, "I/O error: {e}"),
            CalibError::Registry(e) => write!(f, "Histogram registry: {e}"),
        }
    }
}

impl std::error::Error for CalibError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CalibError::Io(e) => Some(e),
            CalibError::Registry(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for CalibError {
    fn from(e: io::Error) -> Self {
        CalibError::Io(e)
    }
}

impl From<RegistryError> for CalibError {
    fn from(e: RegistryError) -> Self {
        CalibError::Registry(e)
    }
}
