//! The closed set of measurement keys and the fixed shape of the histogram behind each.
#![allow(non_camel_case_types)]

use crate::histogram::{Axis, Bucket, Histogram1D, Histogram2D};
use crate::trigger::{Subsystem, TriggerBit};
use std::fmt::Display;

/// Axis binning as declared in the key table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisSpec {
    /// Number of bins.
    pub bins: u32,
    /// Lower edge, inclusive.
    pub min: f64,
    /// Upper edge, exclusive.
    pub max: f64,
    /// Axis title.
    pub title: &'static str,
}

const fn axis(bins: u32, min: f64, max: f64, title: &'static str) -> AxisSpec {
    AxisSpec {
        bins,
        min,
        max,
        title,
    }
}

impl AxisSpec {
    fn build(&self) -> Axis {
        Axis::new(self.bins, self.min, self.max, self.title)
    }
}

/// Dimensionality and binning of a key's histograms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    #[allow(missing_docs)]
    OneD(AxisSpec),
    #[allow(missing_docs)]
    TwoD(AxisSpec, AxisSpec),
}

/// Measurement key. Together with a [TriggerBit] it addresses exactly one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(missing_docs)]
pub enum HistoKey {
    // TAC family
    TAC_NHITS,
    TAC_TIME,
    TAC_RF_TIME,
    TAC_ADCAMP,
    TAC_ADCTIME,
    TAC_TIME_VS_E,
    TAC_RF_TIME_VS_E,
    TAC_TAGH_ENERGY,
    TAC_TAGH_ENERGY_MATCHED,
    TAC_TAGH_ENERGY_UNMATCHED,
    TAC_TAGH_TIME,
    TAC_TAGH_TIME_MATCHED,
    TAC_TAGH_TIME_UNMATCHED,
    TACAMPvsTAGHID,
    TAC_TAGHTIMEvsTAGHID,
    TAC_TAGM_ID_UNMATCHED,
    TAC_TAGM_ID_MATCHED,
    TAC_TAGM_TIME,
    TACAMPvsTAGMID,
    TAC_TAGMTIMEvsTAGMID,
    // PS family
    PSC_TIME,
    PSC_RF_TIME,
    PSC_TAGH_TIME,
    PSC_TAGH_TIME_MATCHED,
    PSC_TAGH_TIME_UNMATCHED,
    PSC_TAGH_ENERGY,
    PSC_TAGH_ENERGY_MATCHED,
    PSC_TAGH_ENERGY_UNMATCHED,
    PSC_TAGH_ID_UNMATCHED,
    PSC_TAGH_ID_MATCHED,
}

const TAGH_ENERGY: AxisSpec = axis(500, 3.0, 12.0, "Tagger Hodoscope Energy (GeV)");
const TAGH_TIME: AxisSpec = axis(600, -300.0, 300.0, "TAGH time (ns)");
const PSC_TAGH_TIME_FINE: AxisSpec = axis(10_000, -300.0, 300.0, "TAGH time (ns)");
const TAGH_ID: AxisSpec = axis(320, 0.0, 320.0, "Tagger Hodoscope Det. Number [#]");
const TAGM_ID: AxisSpec = axis(110, 0.0, 110.0, "Tagger Microscope Det. Number [#]");
const TAC_FADC_PEAK: AxisSpec = axis(1000, 10.0, 5000.0, "FlashADC peak for TAC");
const TAC_ENERGY: AxisSpec = axis(5000, 0.0, 10_000.0, "TAC energy");

impl HistoKey {
    /// Number of keys.
    pub const COUNT: usize = 30;

    /// Every key, TAC family first, in declaration order.
    pub const ALL: [HistoKey; HistoKey::COUNT] = [
        HistoKey::TAC_NHITS,
        HistoKey::TAC_TIME,
        HistoKey::TAC_RF_TIME,
        HistoKey::TAC_ADCAMP,
        HistoKey::TAC_ADCTIME,
        HistoKey::TAC_TIME_VS_E,
        HistoKey::TAC_RF_TIME_VS_E,
        HistoKey::TAC_TAGH_ENERGY,
        HistoKey::TAC_TAGH_ENERGY_MATCHED,
        HistoKey::TAC_TAGH_ENERGY_UNMATCHED,
        HistoKey::TAC_TAGH_TIME,
        HistoKey::TAC_TAGH_TIME_MATCHED,
        HistoKey::TAC_TAGH_TIME_UNMATCHED,
        HistoKey::TACAMPvsTAGHID,
        HistoKey::TAC_TAGHTIMEvsTAGHID,
        HistoKey::TAC_TAGM_ID_UNMATCHED,
        HistoKey::TAC_TAGM_ID_MATCHED,
        HistoKey::TAC_TAGM_TIME,
        HistoKey::TACAMPvsTAGMID,
        HistoKey::TAC_TAGMTIMEvsTAGMID,
        HistoKey::PSC_TIME,
        HistoKey::PSC_RF_TIME,
        HistoKey::PSC_TAGH_TIME,
        HistoKey::PSC_TAGH_TIME_MATCHED,
        HistoKey::PSC_TAGH_TIME_UNMATCHED,
        HistoKey::PSC_TAGH_ENERGY,
        HistoKey::PSC_TAGH_ENERGY_MATCHED,
        HistoKey::PSC_TAGH_ENERGY_UNMATCHED,
        HistoKey::PSC_TAGH_ID_UNMATCHED,
        HistoKey::PSC_TAGH_ID_MATCHED,
    ];

    pub(crate) const fn index(self) -> usize {
        self as usize
    }

    /// Keys of one subsystem family.
    pub fn family(subsystem: Subsystem) -> impl Iterator<Item = HistoKey> {
        HistoKey::ALL
            .into_iter()
            .filter(move |key| key.subsystem() == subsystem)
    }

    /// Which family the key belongs to.
    pub const fn subsystem(self) -> Subsystem {
        if self.index() < HistoKey::PSC_TIME.index() {
            Subsystem::Tac
        } else {
            Subsystem::Ps
        }
    }

    /// Look up a key by name.
    pub fn from_name(name: &str) -> Option<HistoKey> {
        HistoKey::ALL.into_iter().find(|key| key.name() == name)
    }

    /// The key name, the prefix of every bucket name.
    pub const fn name(self) -> &'static str {
        match self {
            HistoKey::TAC_NHITS => "TAC_NHITS",
            HistoKey::TAC_TIME => "TAC_TIME",
            HistoKey::TAC_RF_TIME => "TAC_RF_TIME",
            HistoKey::TAC_ADCAMP => "TAC_ADCAMP",
            HistoKey::TAC_ADCTIME => "TAC_ADCTIME",
            HistoKey::TAC_TIME_VS_E => "TAC_TIME_VS_E",
            HistoKey::TAC_RF_TIME_VS_E => "TAC_RF_TIME_VS_E",
            HistoKey::TAC_TAGH_ENERGY => "TAC_TAGH_ENERGY",
            HistoKey::TAC_TAGH_ENERGY_MATCHED => "TAC_TAGH_ENERGY_MATCHED",
            HistoKey::TAC_TAGH_ENERGY_UNMATCHED => "TAC_TAGH_ENERGY_UNMATCHED",
            HistoKey::TAC_TAGH_TIME => "TAC_TAGH_TIME",
            HistoKey::TAC_TAGH_TIME_MATCHED => "TAC_TAGH_TIME_MATCHED",
            HistoKey::TAC_TAGH_TIME_UNMATCHED => "TAC_TAGH_TIME_UNMATCHED",
            HistoKey::TACAMPvsTAGHID => "TACAMPvsTAGHID",
            HistoKey::TAC_TAGHTIMEvsTAGHID => "TAC_TAGHTIMEvsTAGHID",
            HistoKey::TAC_TAGM_ID_UNMATCHED => "TAC_TAGM_ID_UNMATCHED",
            HistoKey::TAC_TAGM_ID_MATCHED => "TAC_TAGM_ID_MATCHED",
            HistoKey::TAC_TAGM_TIME => "TAC_TAGM_TIME",
            HistoKey::TACAMPvsTAGMID => "TACAMPvsTAGMID",
            HistoKey::TAC_TAGMTIMEvsTAGMID => "TAC_TAGMTIMEvsTAGMID",
            HistoKey::PSC_TIME => "PSC_TIME",
            HistoKey::PSC_RF_TIME => "PSC_RF_TIME",
            HistoKey::PSC_TAGH_TIME => "PSC_TAGH_TIME",
            HistoKey::PSC_TAGH_TIME_MATCHED => "PSC_TAGH_TIME_MATCHED",
            HistoKey::PSC_TAGH_TIME_UNMATCHED => "PSC_TAGH_TIME_UNMATCHED",
            HistoKey::PSC_TAGH_ENERGY => "PSC_TAGH_ENERGY",
            HistoKey::PSC_TAGH_ENERGY_MATCHED => "PSC_TAGH_ENERGY_MATCHED",
            HistoKey::PSC_TAGH_ENERGY_UNMATCHED => "PSC_TAGH_ENERGY_UNMATCHED",
            HistoKey::PSC_TAGH_ID_UNMATCHED => "PSC_TAGH_ID_UNMATCHED",
            HistoKey::PSC_TAGH_ID_MATCHED => "PSC_TAGH_ID_MATCHED",
        }
    }

    /// Title prefix, the trigger bit is appended to it.
    pub const fn title_prefix(self) -> &'static str {
        match self {
            HistoKey::TAC_NHITS => "Number of hits in TAC",
            HistoKey::TAC_TIME => "TAC time",
            HistoKey::TAC_RF_TIME => "TAC time wrt RF",
            HistoKey::TAC_ADCAMP => "TAC Signal Amplitude for Trigger ",
            HistoKey::TAC_ADCTIME => "TAC Signal time for Trigger ",
            HistoKey::TAC_TIME_VS_E => "TAC time vs TAC energy",
            HistoKey::TAC_RF_TIME_VS_E => "TAC time wrt RF vs TAC energy",
            HistoKey::TAC_TAGH_ENERGY => "TAC TAGH Hits Energy for Trigger ",
            HistoKey::TAC_TAGH_ENERGY_MATCHED => "Matched to TAC TAGH Hits Energy for Trigger ",
            HistoKey::TAC_TAGH_ENERGY_UNMATCHED => {
                "Accidental to TAC TAGH Hits Energy for Trigger "
            }
            HistoKey::TAC_TAGH_TIME => "TAGH Signal time relative to TAC for Trigger ",
            HistoKey::TAC_TAGH_TIME_MATCHED => {
                "TAGH Signal time relative to TAC for matched hits for Trigger "
            }
            HistoKey::TAC_TAGH_TIME_UNMATCHED => {
                "TAGH Signal time relative to TAC for unmatched hits for Trigger "
            }
            HistoKey::TACAMPvsTAGHID => "TAC FADC Amplitude vs TAGH ID ",
            HistoKey::TAC_TAGHTIMEvsTAGHID => "TAGH Time relative to TAC vs TAGH ID ",
            HistoKey::TAC_TAGM_ID_UNMATCHED => {
                "Accidental to TAC TAGM Hits Detector ID for Trigger "
            }
            HistoKey::TAC_TAGM_ID_MATCHED => "Matched to TAC TAGM Hits Detector ID for Trigger ",
            HistoKey::TAC_TAGM_TIME => "TAGM Signal time relative to TAC for Trigger ",
            HistoKey::TACAMPvsTAGMID => "TAC FADC Amplitude vs TAGM ID ",
            HistoKey::TAC_TAGMTIMEvsTAGMID => "TAGM Time relative to TAC vs TAGM ID ",
            HistoKey::PSC_TIME => "PSC time",
            HistoKey::PSC_RF_TIME => "PSC time wrt RF",
            HistoKey::PSC_TAGH_TIME => "TAGH Signal time relative to PS for Trigger ",
            HistoKey::PSC_TAGH_TIME_MATCHED => {
                "TAGH Signal time relative to PSC for matched hits for Trigger "
            }
            HistoKey::PSC_TAGH_TIME_UNMATCHED => {
                "TAGH Signal time relative to PSC for unmatched hits for Trigger "
            }
            HistoKey::PSC_TAGH_ENERGY => "PSC TAGH Hits Energy for Trigger ",
            HistoKey::PSC_TAGH_ENERGY_MATCHED => "Matched to PSC TAGH Hits Energy for Trigger ",
            HistoKey::PSC_TAGH_ENERGY_UNMATCHED => {
                "Accidental to PSC TAGH Hits Energy for Trigger "
            }
            HistoKey::PSC_TAGH_ID_UNMATCHED => "Accidental to PS TAGH Hits Detector ID for Trigger ",
            HistoKey::PSC_TAGH_ID_MATCHED => "Matched to PS TAGH Hits Detector ID for Trigger ",
        }
    }

    /// Fixed binning of the key's histograms.
    pub const fn shape(self) -> Shape {
        match self {
            HistoKey::TAC_NHITS => {
                Shape::OneD(axis(7, 0.0, 7.0, "number of hits from FADC FPGA [#]"))
            }
            HistoKey::TAC_TIME => Shape::OneD(axis(1200, -30.0, 30.0, "TAC time [ns]")),
            HistoKey::TAC_RF_TIME => Shape::OneD(axis(1200, -30.0, 30.0, "TAC - RF time [ns]")),
            HistoKey::TAC_ADCAMP => Shape::OneD(axis(500, 0.0, 5000.0, "TAC Amplitude")),
            HistoKey::TAC_ADCTIME => Shape::OneD(axis(400, 0.0, 400.0, "FlashADC peak time (ns)")),
            HistoKey::TAC_TIME_VS_E => {
                Shape::TwoD(TAC_ENERGY, axis(500, -20.0, 20.0, "TAC time [ns]"))
            }
            HistoKey::TAC_RF_TIME_VS_E => {
                Shape::TwoD(TAC_ENERGY, axis(500, -20.0, 20.0, "TAC - RF time [ns]"))
            }
            HistoKey::TAC_TAGH_ENERGY
            | HistoKey::TAC_TAGH_ENERGY_MATCHED
            | HistoKey::TAC_TAGH_ENERGY_UNMATCHED
            | HistoKey::PSC_TAGH_ENERGY
            | HistoKey::PSC_TAGH_ENERGY_MATCHED
            | HistoKey::PSC_TAGH_ENERGY_UNMATCHED => Shape::OneD(TAGH_ENERGY),
            HistoKey::TAC_TAGH_TIME
            | HistoKey::TAC_TAGH_TIME_MATCHED
            | HistoKey::TAC_TAGH_TIME_UNMATCHED => Shape::OneD(TAGH_TIME),
            HistoKey::TACAMPvsTAGHID => Shape::TwoD(TAGH_ID, TAC_FADC_PEAK),
            HistoKey::TAC_TAGHTIMEvsTAGHID => {
                Shape::TwoD(TAGH_ID, axis(400, 0.0, 400.0, "TAGH time"))
            }
            HistoKey::TAC_TAGM_ID_UNMATCHED | HistoKey::TAC_TAGM_ID_MATCHED => {
                Shape::OneD(TAGM_ID)
            }
            HistoKey::TAC_TAGM_TIME => {
                Shape::OneD(axis(400, 0.0, 400.0, "FlashADC peak time (ns)"))
            }
            HistoKey::TACAMPvsTAGMID => Shape::TwoD(TAGM_ID, TAC_FADC_PEAK),
            HistoKey::TAC_TAGMTIMEvsTAGMID => {
                Shape::TwoD(TAGM_ID, axis(400, 0.0, 400.0, "TAGM time"))
            }
            HistoKey::PSC_TIME => Shape::OneD(axis(10_000, -300.0, 300.0, "PSC time [ns]")),
            HistoKey::PSC_RF_TIME => {
                Shape::OneD(axis(10_000, -300.0, 300.0, "PSC - RF time [ns]"))
            }
            // Negative TAGH - PSC differences land in the underflow
            HistoKey::PSC_TAGH_TIME => {
                Shape::OneD(axis(400, 0.0, 400.0, "FlashADC peak time (ns)"))
            }
            HistoKey::PSC_TAGH_TIME_MATCHED | HistoKey::PSC_TAGH_TIME_UNMATCHED => {
                Shape::OneD(PSC_TAGH_TIME_FINE)
            }
            HistoKey::PSC_TAGH_ID_UNMATCHED | HistoKey::PSC_TAGH_ID_MATCHED => {
                Shape::OneD(TAGH_ID)
            }
        }
    }

    /// Bucket name for `bit`, `<KEY>_<bit>`.
    pub fn bucket_name(self, bit: TriggerBit) -> String {
        format!("{}_{bit}", self.name())
    }

    /// Create the empty bucket for `bit`.
    pub fn new_bucket(self, bit: TriggerBit) -> Bucket {
        let name = self.bucket_name(bit);
        let title = format!("{}{bit}", self.title_prefix());
        match self.shape() {
            Shape::OneD(x) => Bucket::OneD(Histogram1D::new(&name, &title, x.build())),
            Shape::TwoD(x, y) => {
                Bucket::TwoD(Histogram2D::new(&name, &title, x.build(), y.build()))
            }
        }
    }
}

impl Display for HistoKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
