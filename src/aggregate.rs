//! Statistical reduction of trials.

use crate::trial::Trial;

/// Mean/best/peak statistics over the trials of one (scenario, tool, operation).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregatedResult {
    /// Truncated arithmetic mean of durations
    pub avg_duration_ms: u64,
    /// Fastest trial
    pub best_duration_ms: u64,
    /// Truncated mean of per-trial average memory
    pub avg_memory_mb: u64,
    /// Highest per-trial peak memory
    pub peak_memory_mb: u64,
    /// Number of trials reduced
    pub trials: usize,
    /// Trials whose command did not exit successfully
    pub failed_trials: usize,
}

/// Reduces `trials`. Returns `None` for an empty slice.
///
/// Integer means are truncated, so `best_duration_ms <= avg_duration_ms`
/// always holds, as does `avg_memory_mb <= peak_memory_mb`.
pub fn aggregate(trials: &[Trial]) -> Option<AggregatedResult> {
    let count = trials.len() as u128;
    if count == 0 {
        return None;
    }

    let total_duration: u128 = trials.iter().map(|t| u128::from(t.duration_ms)).sum();
    let total_memory: u128 = trials.iter().map(|t| u128::from(t.avg_memory_mb)).sum();

    Some(AggregatedResult {
        avg_duration_ms: (total_duration / count) as u64,
        best_duration_ms: trials.iter().map(|t| t.duration_ms).min()?,
        avg_memory_mb: (total_memory / count) as u64,
        peak_memory_mb: trials.iter().map(|t| t.peak_memory_mb).max()?,
        trials: trials.len(),
        failed_trials: trials.iter().filter(|t| !t.succeeded()).count(),
    })
}
