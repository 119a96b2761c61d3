//! Repeated, sampled executions of one operation.

use tracing::{debug, warn};

use crate::aggregate::{AggregatedResult, aggregate};
use crate::error::{HarnessError, Result};
use crate::sampler::{MemoryStats, ResourceSampler};
use crate::timer::{CommandOutcome, CommandSpec, ProcessTimer, Timing};

/// One timed, sampled execution of one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trial {
    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,
    /// Mean resident memory over the run, MiB
    pub avg_memory_mb: u64,
    /// Peak resident memory over the run, MiB
    pub peak_memory_mb: u64,
    /// How the command ended
    pub outcome: CommandOutcome,
}

impl Trial {
    /// Combines a timing with the memory observed during it.
    pub fn new(timing: &Timing, memory: &MemoryStats) -> Self {
        Self {
            duration_ms: timing.duration_ms(),
            avg_memory_mb: memory.avg_mb(),
            peak_memory_mb: memory.peak_mb(),
            outcome: timing.outcome,
        }
    }

    /// Returns true if the command exited with status 0.
    pub fn succeeded(&self) -> bool {
        self.outcome.is_success()
    }
}

/// Every trial of one operation plus their reduction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialSummary {
    /// Raw trials, in execution order
    pub trials: Vec<Trial>,
    /// Aggregated statistics
    pub result: AggregatedResult,
}

/// Times and samples commands. Setting up each repetition is left to the caller.
#[derive(Debug)]
pub struct TrialRunner<'a> {
    timer: &'a ProcessTimer,
    sampler: ResourceSampler,
}

impl<'a> TrialRunner<'a> {
    /// Creates a runner.
    pub fn new(timer: &'a ProcessTimer, sampler: ResourceSampler) -> Self {
        Self { timer, sampler }
    }

    /// Measures a single execution of `cmd`.
    pub fn measure(&self, cmd: &CommandSpec) -> Result<Trial> {
        let sampler = self.sampler.start(&cmd.process_name)?;
        let timing = self.timer.time(cmd);
        let memory = sampler.finish();

        Ok(Trial::new(&timing?, &memory))
    }

    /// Runs `repetitions` trials (at least one).
    ///
    /// `prepare` is called before every repetition with the attempt number and
    /// returns the command to measure, so the caller can re-establish whatever
    /// state the operation consumes.
    pub fn run<F>(&self, repetitions: usize, mut prepare: F) -> Result<TrialSummary>
    where
        F: FnMut(usize) -> Result<CommandSpec>,
    {
        let repetitions = repetitions.max(1);
        let mut trials = Vec::with_capacity(repetitions);

        for attempt in 0..repetitions {
            let cmd = prepare(attempt)?;
            let trial = self.measure(&cmd)?;

            if !trial.succeeded() {
                warn!(
                    command = %cmd.display(),
                    attempt,
                    outcome = ?trial.outcome,
                    "command did not succeed, timing kept and flagged"
                );
            }
            debug!(
                command = %cmd.display(),
                attempt,
                duration_ms = trial.duration_ms,
                peak_memory_mb = trial.peak_memory_mb,
                "trial complete"
            );

            trials.push(trial);
        }

        let result = aggregate(&trials)
            .ok_or_else(|| HarnessError::InvalidConfig("no trials were run".into()))?;
        Ok(TrialSummary { trials, result })
    }
}
