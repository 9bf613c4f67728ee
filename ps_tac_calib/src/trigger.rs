//! Trigger bit classification and fan-out.
//!
//! An event is useful when its trigger word shares at least one bit with the TAC mask or the PS mask.
//! Useful events are fanned out over the 16 trigger bits: every bit that is set in the event and in a subsystem mask
//! drives one aggregation for that subsystem, so a multi-bit event is counted once per matching bit.

use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Number of trigger bits considered.
pub const TRIGGER_BITS: u8 = 16;
/// Mask of the trigger bits considered.
pub const TRIGGER_BITS_MASK: u32 = (1 << TRIGGER_BITS) - 1;

/// Position of a trigger bit, always in the range 0..16.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TriggerBit(u8);

impl TriggerBit {
    /// Returns [None] for positions outside 0..16.
    pub const fn new(bit: u8) -> Option<Self> {
        if bit < TRIGGER_BITS {
            Some(Self(bit))
        } else {
            None
        }
    }

    /// Bit position.
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Single bit mask for this position.
    pub const fn mask(self) -> u32 {
        1 << self.0
    }

    /// All trigger bits, ascending.
    pub fn all() -> impl Iterator<Item = TriggerBit> {
        (0..TRIGGER_BITS).map(TriggerBit)
    }

    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

impl Display for TriggerBit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Subsystem whose histogram family a trigger bit drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Subsystem {
    /// Total absorption counter family.
    Tac,
    /// Pair spectrometer family.
    Ps,
}

impl Display for Subsystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Subsystem::Tac => write!(f, "TAC"),
            Subsystem::Ps => write!(f, "PS"),
        }
    }
}

/// Result of classifying one trigger word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TriggerClass {
    /// The trigger word shares a bit with the TAC mask.
    pub is_tac: bool,
    /// The trigger word shares a bit with the PS mask.
    pub is_ps: bool,
}

impl TriggerClass {
    /// Useful events are processed, all others are dropped.
    pub fn is_useful(self) -> bool {
        self.is_tac || self.is_ps
    }
}

/// Classifies trigger words against the TAC and PS masks.
///
/// The masks are independent, they may overlap and need not cover every bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerClassifier {
    tac_mask: u32,
    ps_mask: u32,
}

impl TriggerClassifier {
    /// Create a new [TriggerClassifier] from the two subsystem masks
    pub const fn new(tac_mask: u32, ps_mask: u32) -> Self {
        Self { tac_mask, ps_mask }
    }

    /// Mask of the bits relevant to `subsystem`.
    pub const fn mask(&self, subsystem: Subsystem) -> u32 {
        match subsystem {
            Subsystem::Tac => self.tac_mask,
            Subsystem::Ps => self.ps_mask,
        }
    }

    /// Classify a trigger word.
    pub const fn classify(&self, trigger_bits: u32) -> TriggerClass {
        TriggerClass {
            is_tac: trigger_bits & self.tac_mask != 0,
            is_ps: trigger_bits & self.ps_mask != 0,
        }
    }

    /// Every `(bit, subsystem)` pair the trigger word drives, bits ascending, TAC before PS on the same bit.
    pub fn fan_out(&self, trigger_bits: u32) -> impl Iterator<Item = (TriggerBit, Subsystem)> {
        let classifier = *self;
        TriggerBit::all().flat_map(move |bit| {
            [Subsystem::Tac, Subsystem::Ps]
                .into_iter()
                .filter(move |&subsystem| trigger_bits & classifier.mask(subsystem) & bit.mask() != 0)
                .map(move |subsystem| (bit, subsystem))
        })
    }

    /// Every `(bit, subsystem)` pair that needs a histogram family.
    pub fn registration_plan(&self) -> impl Iterator<Item = (TriggerBit, Subsystem)> {
        self.fan_out(TRIGGER_BITS_MASK)
    }
}
