//! Pairwise comparison of the two sides on a lower-is-better metric.

use std::fmt;

use crate::aggregate::AggregatedResult;
use crate::scenario::Side;

/// Outcome of a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Winner {
    /// Candidate strictly better
    Candidate,
    /// Baseline strictly better
    Baseline,
    /// Exactly equal
    Tie,
}

impl Winner {
    /// The same outcome seen with the sides swapped.
    pub fn flipped(self) -> Winner {
        match self {
            Winner::Candidate => Winner::Baseline,
            Winner::Baseline => Winner::Candidate,
            Winner::Tie => Winner::Tie,
        }
    }

    /// The winning side, if any.
    pub fn side(self) -> Option<Side> {
        match self {
            Winner::Candidate => Some(Side::Candidate),
            Winner::Baseline => Some(Side::Baseline),
            Winner::Tie => None,
        }
    }
}

impl fmt::Display for Winner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Winner::Candidate => "CANDIDATE",
            Winner::Baseline => "BASELINE",
            Winner::Tie => "TIE",
        })
    }
}

/// Winner of one (scenario, metric) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComparisonResult {
    /// Side with the strictly smaller value
    pub winner: Winner,
    /// Improvement relative to the loser, in `[0, 100)`; zero only for ties
    pub improvement_pct: u32,
    /// Absolute difference in the metric's own unit
    pub margin: u64,
    /// The winning value; zero for ties
    pub best: u64,
}

impl ComparisonResult {
    /// A tie.
    pub const TIE: ComparisonResult = ComparisonResult {
        winner: Winner::Tie,
        improvement_pct: 0,
        margin: 0,
        best: 0,
    };

    /// How many times the loser's value exceeds the winner's, e.g. `1.19`
    /// for 50 against 42.
    ///
    /// `Some(1.0)` for ties and `None` when the winner measured zero.
    pub fn ratio(&self) -> Option<f64> {
        match self.winner {
            Winner::Tie => Some(1.0),
            _ if self.best == 0 => None,
            _ => Some((self.best + self.margin) as f64 / self.best as f64),
        }
    }
}

/// Compares two lower-is-better values.
///
/// `improvement_pct = round((loser - winner) * 100 / loser)`, rounding half
/// up. A strict winner always reports at least 1% and at most 99%, so the
/// percentage stays in `[0, 100)` and is zero exactly for ties.
pub fn compare(candidate: u64, baseline: u64) -> ComparisonResult {
    let (winner, best, loser) = match candidate.cmp(&baseline) {
        std::cmp::Ordering::Equal => return ComparisonResult::TIE,
        std::cmp::Ordering::Less => (Winner::Candidate, candidate, baseline),
        std::cmp::Ordering::Greater => (Winner::Baseline, baseline, candidate),
    };

    let margin = loser - best;
    let rounded = (u128::from(margin) * 200 + u128::from(loser)) / (2 * u128::from(loser));

    ComparisonResult {
        winner,
        improvement_pct: rounded.clamp(1, 99) as u32,
        margin,
        best,
    }
}

/// Compares mean durations.
pub fn compare_durations(
    candidate: &AggregatedResult,
    baseline: &AggregatedResult,
) -> ComparisonResult {
    compare(candidate.avg_duration_ms, baseline.avg_duration_ms)
}

/// Compares repository footprints in KB. `margin` is the absolute saving.
pub fn compare_storage(candidate_kb: u64, baseline_kb: u64) -> ComparisonResult {
    compare(candidate_kb, baseline_kb)
}
