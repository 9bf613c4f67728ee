//! Reconstructed hit records for the subsystems read by the calibration plugins.
//!
//! All times are in nanoseconds. Energies are in the units the reconstruction produces for each subsystem
//! (ADC units for the TAC, GeV for the tagger hodoscope).

use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Hit in the total absorption counter.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TacHit {
    /// Hit time.
    pub t: f64,
    /// Deposited energy.
    pub e: f64,
}

impl TacHit {
    /// Create a new [TacHit]
    pub const fn new(t: f64, e: f64) -> Self {
        Self { t, e }
    }
}

/// Hit in the tagger hodoscope.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TaghHit {
    /// Hit time.
    pub t: f64,
    /// Tagged photon energy.
    pub e: f64,
    /// Hodoscope counter number.
    #[serde(default)]
    pub counter_id: u32,
}

impl TaghHit {
    /// Create a new [TaghHit]
    pub const fn new(t: f64, e: f64, counter_id: u32) -> Self {
        Self { t, e, counter_id }
    }
}

/// Pair spectrometer arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Arm {
    #[default]
    /// North arm, the one read out with TDCs in the calibration runs.
    North,
    /// South arm.
    South,
}

impl Display for Arm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Arm::North => write!(f, "North"),
            Arm::South => write!(f, "South"),
        }
    }
}

/// Hit in the coarse pair spectrometer.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PscHit {
    /// Hit time.
    pub t: f64,
    /// Which arm of the spectrometer fired.
    pub arm: Arm,
    /// Module number within the arm.
    #[serde(default)]
    pub module: u32,
    /// Whether a TDC time contributed to the hit.
    pub has_tdc: bool,
}

impl PscHit {
    /// Create a new [PscHit]
    pub const fn new(t: f64, arm: Arm, module: u32, has_tdc: bool) -> Self {
        Self {
            t,
            arm,
            module,
            has_tdc,
        }
    }

    /// True for hits that carry a TDC time in the north arm.
    pub fn is_timed_north(&self) -> bool {
        self.has_tdc && self.arm == Arm::North
    }
}

/// Accelerator RF reference time, as matched by a given subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RfTime {
    /// Reference time.
    pub time: f64,
}

/// Level 1 trigger word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct L1Trigger {
    /// Main trigger bits, bit `i` set means trigger condition `i` fired.
    pub trig_mask: u32,
    /// Front panel trigger bits.
    #[serde(default)]
    pub fp_trig_mask: u32,
}

impl Display for L1Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "trig_mask: {:#018b} fp_trig_mask: {:#X}",
            self.trig_mask, self.fp_trig_mask
        )
    }
}
