//! Fixed binning histogram buckets.
//!
//! Contains [Histogram1D] and [Histogram2D] and the [Bucket] enum the registry stores them as.

pub mod axis;
pub mod hist1d;
pub mod hist2d;

pub use axis::{Axis, AxisPosition};
pub use hist1d::Histogram1D;
pub use hist2d::Histogram2D;

/// One registered histogram.
#[derive(Debug, Clone, PartialEq)]
pub enum Bucket {
    #[allow(missing_docs)]
    OneD(Histogram1D),
    #[allow(missing_docs)]
    TwoD(Histogram2D),
}

impl Bucket {
    /// Unique name, `<KEY>_<bit>`.
    pub fn name(&self) -> &str {
        match self {
            Bucket::OneD(h) => h.name(),
            Bucket::TwoD(h) => h.name(),
        }
    }

    /// Display title.
    pub fn title(&self) -> &str {
        match self {
            Bucket::OneD(h) => h.title(),
            Bucket::TwoD(h) => h.title(),
        }
    }

    /// Number of fills, including under and overflow.
    pub fn entries(&self) -> u64 {
        match self {
            Bucket::OneD(h) => h.entries(),
            Bucket::TwoD(h) => h.entries(),
        }
    }

    /// 1 or 2.
    pub fn dimension(&self) -> u8 {
        match self {
            Bucket::OneD(_) => 1,
            Bucket::TwoD(_) => 2,
        }
    }

    /// The 1D histogram, if this is one.
    pub fn as_1d(&self) -> Option<&Histogram1D> {
        match self {
            Bucket::OneD(h) => Some(h),
            Bucket::TwoD(_) => None,
        }
    }

    /// The 2D histogram, if this is one.
    pub fn as_2d(&self) -> Option<&Histogram2D> {
        match self {
            Bucket::TwoD(h) => Some(h),
            Bucket::OneD(_) => None,
        }
    }
}
