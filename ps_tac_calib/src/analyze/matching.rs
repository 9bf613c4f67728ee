//! Nearest and farthest in time hit selection.

use itertools::{Itertools, MinMaxResult};

/// Indices of the closest and the farthest hit from a reference time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeMatch {
    /// Closest hit, the first one on ties.
    pub best: usize,
    /// Farthest hit, the last one on ties.
    pub worst: usize,
}

/// Single scan over `hits` ranking them by `|time_of(hit) - reference_time|`.
///
/// Returns [None] for no hits. With one hit `best == worst`, with more `best != worst`.
pub fn match_in_time<H>(
    reference_time: f64,
    hits: &[H],
    time_of: impl Fn(&H) -> f64,
) -> Option<TimeMatch> {
    match hits
        .iter()
        .map(|hit| (time_of(hit) - reference_time).abs())
        .position_minmax_by(f64::total_cmp)
    {
        MinMaxResult::NoElements => None,
        MinMaxResult::OneElement(idx) => Some(TimeMatch {
            best: idx,
            worst: idx,
        }),
        MinMaxResult::MinMax(best, worst) => Some(TimeMatch { best, worst }),
    }
}
