//! Contains the [HistogramRegistry], the fixed set of buckets addressed by ([HistoKey], [TriggerBit]).
//!
//! The registry is populated once at initialization for every trigger bit relevant to TAC and/or PS,
//! and only ever mutated by the histogram controller afterwards.

pub mod histo_key;

pub use histo_key::{AxisSpec, HistoKey, Shape};

use crate::histogram::Bucket;
use crate::trigger::{Subsystem, TriggerBit, TriggerClassifier, TRIGGER_BITS};
use std::fmt::Display;

/// Value of one fill.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FillValue {
    /// Fill of a 1D bucket.
    X(f64),
    /// Fill of a 2D bucket.
    XY(f64, f64),
}

/// Registry contract violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    /// The bucket was registered before.
    AlreadyRegistered(HistoKey, TriggerBit),
    /// No bucket was registered for the pair.
    Unregistered(HistoKey, TriggerBit),
    /// A 1D value was routed to a 2D bucket or the reverse.
    DimensionMismatch(HistoKey, TriggerBit),
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::AlreadyRegistered(key, bit) => {
                write!(f, "{} already registered", key.bucket_name(*bit))
            }
            RegistryError::Unregistered(key, bit) => {
                write!(f, "{} was never registered", key.bucket_name(*bit))
            }
            RegistryError::DimensionMismatch(key, bit) => {
                write!(f, "{} filled with wrong dimension", key.bucket_name(*bit))
            }
        }
    }
}

impl std::error::Error for RegistryError {}

const SLOTS: usize = HistoKey::COUNT * TRIGGER_BITS as usize;

/// Dense (key, bit) addressed bucket store.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramRegistry {
    slots: Vec<Option<Bucket>>,
    registered: usize,
}

impl Default for HistogramRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HistogramRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            slots: vec![None; SLOTS],
            registered: 0,
        }
    }

    /// Register the TAC family for every TAC bit and the PS family for every PS bit.
    pub fn from_classifier(classifier: &TriggerClassifier) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for (bit, subsystem) in classifier.registration_plan() {
            registry.register_family(subsystem, bit)?;
        }
        log::debug!("Registered {} histograms", registry.len());
        Ok(registry)
    }

    const fn slot(key: HistoKey, bit: TriggerBit) -> usize {
        key.index() * TRIGGER_BITS as usize + bit.index()
    }

    /// Register one bucket.
    pub fn register(&mut self, key: HistoKey, bit: TriggerBit) -> Result<&mut Bucket, RegistryError> {
        let slot = &mut self.slots[Self::slot(key, bit)];
        if slot.is_some() {
            return Err(RegistryError::AlreadyRegistered(key, bit));
        }
        self.registered += 1;
        Ok(slot.insert(key.new_bucket(bit)))
    }

    /// Register every key of a subsystem family for `bit`.
    pub fn register_family(&mut self, subsystem: Subsystem, bit: TriggerBit) -> Result<(), RegistryError> {
        for key in HistoKey::family(subsystem) {
            let _ = self.register(key, bit)?;
        }
        Ok(())
    }

    #[allow(missing_docs)]
    pub fn is_registered(&self, key: HistoKey, bit: TriggerBit) -> bool {
        self.slots[Self::slot(key, bit)].is_some()
    }

    /// The bucket for the pair, an error if it was never registered.
    pub fn bucket(&self, key: HistoKey, bit: TriggerBit) -> Result<&Bucket, RegistryError> {
        self.slots[Self::slot(key, bit)]
            .as_ref()
            .ok_or(RegistryError::Unregistered(key, bit))
    }

    /// Route one fill to its bucket.
    pub fn fill(&mut self, key: HistoKey, bit: TriggerBit, value: FillValue) -> Result<(), RegistryError> {
        let bucket = self.slots[Self::slot(key, bit)]
            .as_mut()
            .ok_or(RegistryError::Unregistered(key, bit))?;
        match (bucket, value) {
            (Bucket::OneD(hist), FillValue::X(x)) => hist.fill(x),
            (Bucket::TwoD(hist), FillValue::XY(x, y)) => hist.fill(x, y),
            _ => return Err(RegistryError::DimensionMismatch(key, bit)),
        }
        Ok(())
    }

    /// Number of registered buckets.
    pub fn len(&self) -> usize {
        self.registered
    }

    #[allow(missing_docs)]
    pub fn is_empty(&self) -> bool {
        self.registered == 0
    }

    /// Registered buckets in key order, then bit order.
    pub fn iter(&self) -> impl Iterator<Item = &Bucket> {
        self.slots.iter().flatten()
    }

    /// Registered buckets with their address, in the order of [HistogramRegistry::iter].
    pub fn iter_keyed(&self) -> impl Iterator<Item = (HistoKey, TriggerBit, &Bucket)> {
        HistoKey::ALL.into_iter().flat_map(move |key| {
            TriggerBit::all().filter_map(move |bit| {
                self.slots[Self::slot(key, bit)]
                    .as_ref()
                    .map(|bucket| (key, bit, bucket))
            })
        })
    }

    /// Sum of the entries of every bucket of `subsystem` registered for `bit`.
    pub fn family_entries(&self, subsystem: Subsystem, bit: TriggerBit) -> u64 {
        HistoKey::family(subsystem)
            .filter_map(|key| self.bucket(key, bit).ok())
            .map(Bucket::entries)
            .sum()
    }
}
