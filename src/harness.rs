//! Orchestration of a full comparison run.
//!
//! The harness checks prerequisites, then walks the configured scenarios in
//! order. Each scenario gets a pristine fixture; every trial works on a fresh
//! copy of it so the measured operation always sees the same starting state.
//! Results are compared right after each scenario and the report is flushed,
//! so an aborted run still leaves a readable partial log.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use sysinfo::System;
use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::compare::{compare_durations, compare_storage};
use crate::config::{HarnessConfig, ToolSpec};
use crate::error::{HarnessError, Result};
use crate::fixture::{self, FixtureBuilder, FixtureSource};
use crate::insight::{Insights, synthesize};
use crate::report::{EnvironmentInfo, Reporter};
use crate::sampler::{ResourceSampler, check_process_table};
use crate::scenario::{Operation, Scenario, Side};
use crate::store::{Metric, ResultsStore, StorageMeasurement, WinnersStore};
use crate::timer::{CommandOutcome, CommandSpec, ProcessTimer, ShutdownFlag};
use crate::trial::TrialRunner;

/// First line of each tool's `--version` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolVersions {
    /// Candidate version
    pub candidate: String,
    /// Baseline version
    pub baseline: String,
}

/// Everything a finished (or interrupted) run produced.
#[derive(Debug)]
pub struct RunSummary {
    /// Aggregated results and storage measurements
    pub results: ResultsStore,
    /// Comparison outcomes
    pub winners: WinnersStore,
    /// Cross-scenario analysis
    pub insights: Insights,
    /// Scenarios measured to completion
    pub completed: usize,
    /// Keys of scenarios that were skipped after an error
    pub skipped: Vec<String>,
    /// True if the run stopped early on user request
    pub interrupted: bool,
}

/// Drives both tools through the configured scenarios.
#[derive(Debug)]
pub struct Harness {
    config: HarnessConfig,
    shutdown: ShutdownFlag,
}

impl Harness {
    /// Creates a harness. Triggering `shutdown` stops the run at the next
    /// opportunity and kills any command in flight.
    pub fn new(config: HarnessConfig, shutdown: ShutdownFlag) -> Self {
        Self { config, shutdown }
    }

    /// Active configuration.
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Fails fast unless both tools run and the process table is readable.
    ///
    /// `--version` is subject to the command timeout like any measured command.
    pub fn check_prerequisites(&self) -> Result<ToolVersions> {
        let timer = ProcessTimer::new(self.config.command_timeout, self.shutdown.clone());
        let versions = ToolVersions {
            candidate: tool_version(&self.config.candidate, &timer)?,
            baseline: tool_version(&self.config.baseline, &timer)?,
        };
        check_process_table()?;
        Ok(versions)
    }

    /// Runs every scenario and renders the report through `reporter`.
    pub fn run<O: Write, L: Write>(&self, reporter: &mut Reporter<O, L>) -> Result<RunSummary> {
        self.run_with(reporter, &FixtureBuilder::new(Utc::now()))
    }

    /// Like [`run`](Self::run), with scenario fixtures produced by `fixtures`.
    pub fn run_with<O: Write, L: Write>(
        &self,
        reporter: &mut Reporter<O, L>,
        fixtures: &dyn FixtureSource,
    ) -> Result<RunSummary> {
        let versions = self.check_prerequisites()?;
        let env = collect_environment(versions);
        reporter.preamble(&env, &self.config)?;
        reporter.flush()?;

        let workspace = self.workspace()?;
        let timer = ProcessTimer::new(self.config.command_timeout, self.shutdown.clone());
        let session = Session {
            config: &self.config,
            workspace: workspace.path(),
            fixtures,
            timer: &timer,
            runner: TrialRunner::new(&timer, ResourceSampler::new(self.config.sample_interval)),
        };

        let mut results = ResultsStore::new();
        let mut winners = WinnersStore::new();
        let mut completed = 0;
        let mut skipped = Vec::new();
        let mut interrupted = false;

        for scenario in &self.config.scenarios {
            if self.shutdown.is_triggered() {
                interrupted = true;
                break;
            }

            let key = scenario.key();
            info!(
                scenario = %key,
                files = scenario.file_count,
                size = %scenario.file_size,
                "running scenario"
            );

            match session.scenario(scenario, &mut results, &mut winners) {
                Ok(()) => {
                    reporter.scenario(scenario, &results, &winners)?;
                    completed += 1;
                }
                Err(HarnessError::Interrupted) => {
                    warn!(scenario = %key, "interrupted, stopping after partial results");
                    interrupted = true;
                }
                Err(err) => {
                    warn!(scenario = %key, error = %err, "scenario skipped");
                    reporter.scenario_skipped(scenario, &err)?;
                    skipped.push(key);
                }
            }
            reporter.flush()?;

            if interrupted {
                break;
            }
        }

        // a flag raised while the last command was exiting
        interrupted |= self.shutdown.is_triggered();

        let insights = synthesize(&winners, &self.config.insight);
        reporter.summary(&insights, interrupted)?;
        reporter.flush()?;

        let root = workspace.path().to_path_buf();
        if let Err(source) = workspace.close() {
            let err = HarnessError::Cleanup { path: root, source };
            warn!(error = %err, "workspace left behind");
        }

        Ok(RunSummary {
            results,
            winners,
            insights,
            completed,
            skipped,
            interrupted,
        })
    }

    fn workspace(&self) -> Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("vcs-duel-");
        let dir = match &self.config.work_root {
            Some(root) => {
                fs::create_dir_all(root)?;
                builder.tempdir_in(root)?
            }
            None => builder.tempdir()?,
        };
        debug!(path = %dir.path().display(), "workspace created");
        Ok(dir)
    }
}

/// Borrowed state shared by every scenario of one run.
struct Session<'a> {
    config: &'a HarnessConfig,
    workspace: &'a Path,
    fixtures: &'a dyn FixtureSource,
    timer: &'a ProcessTimer,
    runner: TrialRunner<'a>,
}

impl Session<'_> {
    fn scenario(
        &self,
        scenario: &Scenario,
        results: &mut ResultsStore,
        winners: &mut WinnersStore,
    ) -> Result<()> {
        let key = scenario.key();
        let dir = ScenarioDir::create(self.workspace.join(&key))?;
        let pristine = dir.path().join("fixture");
        self.fixtures.build(scenario, &pristine)?;

        for side in Side::BOTH {
            let tool = self.config.tool(side);
            let repo = dir.path().join(side.key());
            let empty = dir.path().join(format!("{}-init", side.key()));

            for op in Operation::ALL {
                let repetitions = self.config.trials.for_operation(op);
                let target = if op == Operation::Init { &empty } else { &repo };
                let summary = self.runner.run(repetitions, |attempt| {
                    debug!(scenario = %key, tool = %tool.name, %op, attempt, "preparing trial");
                    self.prepare(&key, tool, &pristine, target, op)?;
                    Ok(operation_command(tool, target, op, &key))
                })?;
                results.record(&key, side, op, summary.result)?;
            }

            // the repository left by the last commit trial
            let size_kb = dir_size(&tool.metadata_path(&repo))?.div_ceil(1024);
            results.record_storage(&key, StorageMeasurement { side, size_kb })?;
        }

        for op in Operation::ALL {
            if let (Some(candidate), Some(baseline)) = (
                results.get(&key, Side::Candidate, op),
                results.get(&key, Side::Baseline, op),
            ) {
                let comparison = compare_durations(candidate, baseline);
                winners.record(&key, scenario.category, Metric::Duration(op), comparison)?;
            }
        }

        if let (Some(candidate), Some(baseline)) = (
            results.storage(&key, Side::Candidate),
            results.storage(&key, Side::Baseline),
        ) {
            let comparison = compare_storage(candidate.size_kb, baseline.size_kb);
            winners.record(&key, scenario.category, Metric::Storage, comparison)?;
        }

        Ok(())
    }

    /// Recreates `repo` and brings it to the state `op` expects: empty for
    /// `init`, a copy of the pristine fixture otherwise. Nothing here is timed.
    fn prepare(
        &self,
        key: &str,
        tool: &ToolSpec,
        pristine: &Path,
        repo: &Path,
        op: Operation,
    ) -> Result<()> {
        if repo.exists() {
            fs::remove_dir_all(repo)?;
        }
        if op == Operation::Init {
            fs::create_dir_all(repo)?;
            return Ok(());
        }
        fixture::copy_tree(pristine, repo).map_err(|e| HarnessError::fixture(key, e))?;

        self.untimed(tool.command(repo, ["init"]))?;
        for args in &tool.setup {
            self.untimed(tool.command(repo, args))?;
        }
        if matches!(op, Operation::Commit) {
            self.untimed(tool.command(repo, ["add", "."]))?;
        }
        Ok(())
    }

    fn untimed(&self, cmd: CommandSpec) -> Result<()> {
        let timing = self.timer.time(&cmd)?;
        if !timing.outcome.is_success() {
            warn!(
                command = %cmd.display(),
                outcome = ?timing.outcome,
                "setup command did not succeed"
            );
        }
        Ok(())
    }
}

fn operation_command(tool: &ToolSpec, repo: &Path, op: Operation, key: &str) -> CommandSpec {
    match op {
        Operation::Init => tool.command(repo, ["init"]),
        Operation::Add => tool.command(repo, ["add", "."]),
        Operation::Commit => {
            let message = format!("Benchmark {}", key);
            tool.command(repo, ["commit", "-m", message.as_str()])
        }
    }
}

/// Scenario directory removed when dropped, on every exit path.
struct ScenarioDir {
    path: PathBuf,
}

impl ScenarioDir {
    fn create(path: PathBuf) -> io::Result<Self> {
        fs::create_dir_all(&path)?;
        Ok(Self { path })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScenarioDir {
    fn drop(&mut self) {
        if let Err(source) = fs::remove_dir_all(&self.path) {
            let err = HarnessError::Cleanup {
                path: self.path.clone(),
                source,
            };
            warn!(error = %err, "scenario directory left behind");
        }
    }
}

/// Total size in bytes of the regular files under `path`; 0 if it does not exist.
pub fn dir_size(path: &Path) -> io::Result<u64> {
    if !path.exists() {
        return Ok(0);
    }

    let mut total = 0;
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            total += dir_size(&entry.path())?;
        } else if file_type.is_file() {
            total += entry.metadata()?.len();
        }
    }
    Ok(total)
}

fn tool_version(tool: &ToolSpec, timer: &ProcessTimer) -> Result<String> {
    let cmd = tool.command(&std::env::temp_dir(), ["--version"]);
    let (timing, stdout) = timer.output(&cmd).map_err(|e| match e {
        HarnessError::Spawn { source, .. } => HarnessError::PrerequisiteMissing(format!(
            "{} ({}) cannot be run: {}",
            tool.name,
            tool.program.display(),
            source
        )),
        other => other,
    })?;

    match timing.outcome {
        CommandOutcome::Succeeded => {}
        CommandOutcome::Failed { code } => {
            let status = code.map_or_else(|| "a signal".to_string(), |c| format!("code {}", c));
            return Err(HarnessError::PrerequisiteMissing(format!(
                "{} --version exited with {}",
                tool.name, status
            )));
        }
        CommandOutcome::TimedOut => {
            return Err(HarnessError::PrerequisiteMissing(format!(
                "{} --version did not finish within {}ms",
                tool.name,
                timing.duration_ms()
            )));
        }
    }

    let stdout = String::from_utf8_lossy(&stdout);
    Ok(stdout
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("unknown version")
        .to_string())
}

fn collect_environment(versions: ToolVersions) -> EnvironmentInfo {
    let mut sys = System::new_all();
    sys.refresh_all();

    let cpu_brand = sys
        .cpus()
        .first()
        .map(|cpu| cpu.brand().trim().to_string())
        .unwrap_or_else(|| "Unknown CPU".to_string());

    EnvironmentInfo {
        started_at: Utc::now(),
        os: format!(
            "{} {}",
            System::name().unwrap_or_else(|| "Unknown".to_string()),
            System::os_version().unwrap_or_else(|| "Unknown".to_string())
        ),
        cpu_brand,
        cpu_cores: sys.cpus().len(),
        total_memory_mb: sys.total_memory() / 1024 / 1024,
        candidate_version: versions.candidate,
        baseline_version: versions.baseline,
    }
}
