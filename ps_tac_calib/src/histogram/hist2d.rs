//! Two dimensional histogram with sparse cell storage.

use super::axis::{Axis, AxisPosition};
use std::collections::BTreeMap;

/// Unit weight 2D histogram.
///
/// Cells are keyed by `y_bin * x_bins + x_bin` and only stored once filled.
/// A fill outside either axis counts as underflow if any coordinate is below its axis, otherwise as overflow.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram2D {
    name: Box<str>,
    title: Box<str>,
    x_axis: Axis,
    y_axis: Axis,
    cells: BTreeMap<u32, f64>,
    underflow: f64,
    overflow: f64,
    entries: u64,
}

impl Histogram2D {
    /// Create an empty histogram
    pub fn new(name: &str, title: &str, x_axis: Axis, y_axis: Axis) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            x_axis,
            y_axis,
            cells: BTreeMap::new(),
            underflow: 0.0,
            overflow: 0.0,
            entries: 0,
        }
    }

    /// Restore a histogram from stored cells, returns [None] if a cell index is outside the grid.
    pub fn from_parts(
        name: &str,
        title: &str,
        (x_axis, y_axis): (Axis, Axis),
        cells: BTreeMap<u32, f64>,
        underflow: f64,
        overflow: f64,
        entries: u64,
    ) -> Option<Self> {
        let cell_count = u64::from(x_axis.bins()) * u64::from(y_axis.bins());
        if cells.keys().any(|&cell| u64::from(cell) >= cell_count) {
            return None;
        }
        let mut hist = Self::new(name, title, x_axis, y_axis);
        hist.cells = cells;
        hist.underflow = underflow;
        hist.overflow = overflow;
        hist.entries = entries;
        Some(hist)
    }

    /// Add one count at `(x, y)`.
    pub fn fill(&mut self, x: f64, y: f64) {
        self.entries += 1;
        match (self.x_axis.locate(x), self.y_axis.locate(y)) {
            (AxisPosition::Bin(x_bin), AxisPosition::Bin(y_bin)) => {
                let cell = self.cell_index(x_bin, y_bin);
                *self.cells.entry(cell).or_default() += 1.0;
            }
            (AxisPosition::Underflow, _) | (_, AxisPosition::Underflow) => self.underflow += 1.0,
            _ => self.overflow += 1.0,
        }
    }

    fn cell_index(&self, x_bin: u32, y_bin: u32) -> u32 {
        y_bin * self.x_axis.bins() + x_bin
    }

    /// Content of the cell at `(x_bin, y_bin)`.
    pub fn cell_content(&self, x_bin: u32, y_bin: u32) -> f64 {
        if x_bin >= self.x_axis.bins() || y_bin >= self.y_axis.bins() {
            return 0.0;
        }
        self.cells
            .get(&self.cell_index(x_bin, y_bin))
            .copied()
            .unwrap_or_default()
    }

    /// Filled cells in ascending cell index order.
    pub fn cells(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.cells.iter().map(|(&cell, &content)| (cell, content))
    }

    /// Number of filled cells.
    pub fn filled_cells(&self) -> usize {
        self.cells.len()
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
    pub fn x_axis(&self) -> &Axis {
        &self.x_axis
    }
    #[allow(missing_docs)]
    pub fn y_axis(&self) -> &Axis {
        &self.y_axis
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
        self.cells.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn time_vs_energy() -> Histogram2D {
        Histogram2D::new(
            "TAC_TIME_VS_E_1",
            "TAC time vs TAC energy1",
            Axis::new(5000, 0.0, 10_000.0, "TAC energy"),
            Axis::new(500, -20.0, 20.0, "TAC time [ns]"),
        )
    }

    #[test]
    fn test_fill_cell() {
        let mut hist = time_vs_energy();
        hist.fill(600.0, 0.0);
        hist.fill(601.0, 0.01);

        // 600 / 2 = bin 300 on x, 0 ns is bin 250 on y
        assert_eq!(hist.cell_content(300, 250), 2.0);
        assert_eq!(hist.filled_cells(), 1);
        assert_eq!(hist.entries(), 2);
        assert_eq!(hist.cells().collect::<Vec<_>>(), vec![(250 * 5000 + 300, 2.0)]);
    }

    #[test]
    fn test_flow_classification() {
        let mut hist = time_vs_energy();
        hist.fill(-1.0, 0.0);
        hist.fill(600.0, -25.0);
        hist.fill(20_000.0, -25.0);
        hist.fill(20_000.0, 0.0);
        hist.fill(600.0, 20.0);

        assert_eq!(hist.underflow(), 3.0);
        assert_eq!(hist.overflow(), 2.0);
        assert_eq!(hist.integral(), 0.0);
        assert_eq!(hist.entries(), 5);
    }

    #[test]
    fn test_from_parts_rejects_cell_outside_grid() {
        let x = Axis::new(2, 0.0, 2.0, "x");
        let y = Axis::new(2, 0.0, 2.0, "y");
        let cells = BTreeMap::from([(4, 1.0)]);
        assert!(Histogram2D::from_parts("a", "b", (x.clone(), y.clone()), cells, 0.0, 0.0, 1).is_none());
        let cells = BTreeMap::from([(3, 1.0)]);
        let hist = Histogram2D::from_parts("a", "b", (x, y), cells, 0.0, 0.0, 1).unwrap();
        assert_eq!(hist.cell_content(1, 1), 1.0);
    }
}
