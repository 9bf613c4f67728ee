//! Fixed binning along one axis.

/// Where a value lands on an [Axis].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisPosition {
    /// Below the lower edge.
    Underflow,
    /// Zero based bin index.
    Bin(u32),
    /// At or above the upper edge, or not a number.
    Overflow,
}

/// Equal width bins over `[min, max)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    bins: u32,
    min: f64,
    max: f64,
    title: Box<str>,
}

impl Axis {
    /// Create a new [Axis], `bins` must be non-zero and `min < max`.
    pub fn new(bins: u32, min: f64, max: f64, title: &str) -> Self {
        debug_assert!(bins > 0 && min < max, "Degenerate axis {min}..{max}");
        Self {
            bins,
            min,
            max,
            title: title.into(),
        }
    }

    #[allow(missing_docs)]
    pub fn bins(&self) -> u32 {
        self.bins
    }
    #[allow(missing_docs)]
    pub fn min(&self) -> f64 {
        self.min
    }
    #[allow(missing_docs)]
    pub fn max(&self) -> f64 {
        self.max
    }
    #[allow(missing_docs)]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Width of one bin.
    pub fn bin_width(&self) -> f64 {
        (self.max - self.min) / f64::from(self.bins)
    }

    /// Centre of bin `bin`.
    pub fn bin_center(&self, bin: u32) -> f64 {
        self.min + (f64::from(bin) + 0.5) * self.bin_width()
    }

    /// Locate `value` on the axis.
    pub fn locate(&self, value: f64) -> AxisPosition {
        if value < self.min {
            AxisPosition::Underflow
        } else if value >= self.max || value.is_nan() {
            AxisPosition::Overflow
        } else {
            let bin = (f64::from(self.bins) * (value - self.min) / (self.max - self.min)) as u32;
            // Rounding right below the upper edge
            AxisPosition::Bin(bin.min(self.bins - 1))
        }
    }
}
