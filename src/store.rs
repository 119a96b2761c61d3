//! Run-scoped stores of aggregated results and comparison winners.
//!
//! Both stores are write-once per key and live for exactly one harness run.
//! They are threaded through the pipeline as plain values.

use std::collections::HashMap;
use std::fmt;

use crate::aggregate::AggregatedResult;
use crate::compare::ComparisonResult;
use crate::error::{HarnessError, Result};
use crate::scenario::{Category, Operation, Side};

/// Footprint of one tool's metadata directory after a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageMeasurement {
    /// Tool measured
    pub side: Side,
    /// Size in KB, rounded up
    pub size_kb: u64,
}

/// Aggregated results keyed by (scenario, side, operation).
#[derive(Debug, Default)]
pub struct ResultsStore {
    results: HashMap<(String, Side, Operation), AggregatedResult>,
    storage: HashMap<(String, Side), StorageMeasurement>,
}

impl ResultsStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a result. Each triple may be written once.
    pub fn record(
        &mut self,
        scenario: &str,
        side: Side,
        operation: Operation,
        result: AggregatedResult,
    ) -> Result<()> {
        let key = (scenario.to_string(), side, operation);
        if self.results.contains_key(&key) {
            return Err(HarnessError::DuplicateEntry(format!(
                "{}/{}/{}",
                scenario,
                side.key(),
                operation
            )));
        }
        self.results.insert(key, result);
        Ok(())
    }

    /// Looks up a result.
    pub fn get(
        &self,
        scenario: &str,
        side: Side,
        operation: Operation,
    ) -> Option<&AggregatedResult> {
        self.results.get(&(scenario.to_string(), side, operation))
    }

    /// Records a storage measurement. Each (scenario, side) may be written once.
    pub fn record_storage(
        &mut self,
        scenario: &str,
        measurement: StorageMeasurement,
    ) -> Result<()> {
        let key = (scenario.to_string(), measurement.side);
        if self.storage.contains_key(&key) {
            return Err(HarnessError::DuplicateEntry(format!(
                "{}/{}/storage",
                scenario,
                measurement.side.key()
            )));
        }
        self.storage.insert(key, measurement);
        Ok(())
    }

    /// Looks up a storage measurement.
    pub fn storage(&self, scenario: &str, side: Side) -> Option<&StorageMeasurement> {
        self.storage.get(&(scenario.to_string(), side))
    }

    /// Number of aggregated results.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Returns true if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty() && self.storage.is_empty()
    }
}

/// What a winner record compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    /// Mean duration of a timed operation
    Duration(Operation),
    /// Repository footprint
    Storage,
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Duration(op) => write!(f, "{}", op),
            Metric::Storage => f.write_str("storage"),
        }
    }
}

/// One comparison outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WinnerRecord {
    /// Scenario key
    pub scenario: String,
    /// Scenario category
    pub category: Category,
    /// What was compared
    pub metric: Metric,
    /// Outcome
    pub comparison: ComparisonResult,
}

/// Comparison outcomes keyed by (scenario, metric), in insertion order.
#[derive(Debug, Default)]
pub struct WinnersStore {
    records: Vec<WinnerRecord>,
}

impl WinnersStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an outcome. Each (scenario, metric) may be written once.
    pub fn record(
        &mut self,
        scenario: &str,
        category: Category,
        metric: Metric,
        comparison: ComparisonResult,
    ) -> Result<()> {
        if self.get(scenario, metric).is_some() {
            return Err(HarnessError::DuplicateEntry(format!("{}/{}", scenario, metric)));
        }
        self.records.push(WinnerRecord {
            scenario: scenario.to_string(),
            category,
            metric,
            comparison,
        });
        Ok(())
    }

    /// Looks up an outcome.
    pub fn get(&self, scenario: &str, metric: Metric) -> Option<&ComparisonResult> {
        self.records
            .iter()
            .find(|r| r.scenario == scenario && r.metric == metric)
            .map(|r| &r.comparison)
    }

    /// Records of scored timed operations. Untracked operations such as
    /// `init` are left out.
    pub fn timed(&self) -> impl Iterator<Item = &WinnerRecord> {
        self.records
            .iter()
            .filter(|r| matches!(r.metric, Metric::Duration(op) if op.is_tracked()))
    }

    /// Storage records only.
    pub fn storage(&self) -> impl Iterator<Item = &WinnerRecord> {
        self.records.iter().filter(|r| r.metric == Metric::Storage)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
