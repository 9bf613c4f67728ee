//! One dimensional histogram with dense bin storage.

use super::axis::{Axis, AxisPosition};

/// Unit weight 1D histogram.
///
/// Every fill counts as an entry, in range fills also feed the running sums used by [Histogram1D::mean].
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram1D {
    name: Box<str>,
    title: Box<str>,
    axis: Axis,
    contents: Vec<f64>,
    underflow: f64,
    overflow: f64,
    entries: u64,
    sum_w: f64,
    sum_wx: f64,
}

impl Histogram1D {
    /// Create an empty histogram
    pub fn new(name: &str, title: &str, axis: Axis) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            contents: vec![0.0; axis.bins() as usize],
            axis,
            underflow: 0.0,
            overflow: 0.0,
            entries: 0,
            sum_w: 0.0,
            sum_wx: 0.0,
        }
    }

    /// Restore a histogram from stored contents, returns [None] if the contents do not match the axis.
    pub fn from_parts(
        name: &str,
        title: &str,
        axis: Axis,
        contents: Vec<f64>,
        underflow: f64,
        overflow: f64,
        entries: u64,
    ) -> Option<Self> {
        if contents.len() != axis.bins() as usize {
            return None;
        }
        let mut hist = Self::new(name, title, axis);
        hist.sum_w = contents.iter().sum();
        hist.sum_wx = contents
            .iter()
            .enumerate()
            .map(|(bin, w)| w * hist.axis.bin_center(bin as u32))
            .sum();
        hist.contents = contents;
        hist.underflow = underflow;
        hist.overflow = overflow;
        hist.entries = entries;
        Some(hist)
    }

    /// Add one count at `x`.
    pub fn fill(&mut self, x: f64) {
        self.entries += 1;
        match self.axis.locate(x) {
            AxisPosition::Underflow => self.underflow += 1.0,
            AxisPosition::Overflow => self.overflow += 1.0,
            AxisPosition::Bin(bin) => {
                self.contents[bin as usize] += 1.0;
                self.sum_w += 1.0;
                self.sum_wx += x;
            }
        }
    }

    #[allow(missing_docs)]
    pub fn name(&self) -> &str {
        &self.name
    }
    #[allow(missing_docs)]
    pub fn title(&self) -> &str {
        &self.title
    }
    #[allow(missing_docs)]
    pub fn axis(&self) -> &Axis {
        &self.axis
    }
    /// Bin contents, underflow and overflow excluded.
    pub fn contents(&self) -> &[f64] {
        &self.contents
    }
    /// Content of `bin`, [None] past the last bin.
    pub fn bin_content(&self, bin: u32) -> Option<f64> {
        self.contents.get(bin as usize).copied()
    }
    #[allow(missing_docs)]
    pub fn underflow(&self) -> f64 {
        self.underflow
    }
    #[allow(missing_docs)]
    pub fn overflow(&self) -> f64 {
        self.overflow
    }
    /// Number of fills, including under and overflow.
    pub fn entries(&self) -> u64 {
        self.entries
    }

    /// Sum of the in range contents.
    pub fn integral(&self) -> f64 {
        self.sum_w
    }

    /// Mean of the in range fills, [None] when nothing landed in range.
    pub fn mean(&self) -> Option<f64> {
        (self.sum_w > 0.0).then(|| self.sum_wx / self.sum_w)
    }
}
