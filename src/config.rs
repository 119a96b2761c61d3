//! Harness configuration: measured tools, scenario selection and tunables.
//!
//! Defaults describe the full suite. `from_env` applies `DUEL_*` overrides:
//!
//! - `DUEL_MODE=quick|full` (quick runs one trial per operation)
//! - `DUEL_SCENARIOS=10x1KB,100x4KB` and `DUEL_CATEGORIES=SMALL,HUGE_FILES`
//! - `DUEL_INIT_TRIALS`, `DUEL_ADD_TRIALS`, `DUEL_COMMIT_TRIALS`
//! - `DUEL_SAMPLE_MS`, `DUEL_TIMEOUT_SECS` (0 disables the timeout)
//! - `DUEL_STRENGTH_PCT`, `DUEL_CAVEAT_PCT`

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{HarnessError, Result};
use crate::insight::InsightConfig;
use crate::sampler::DEFAULT_INTERVAL;
use crate::scenario::{Category, DEFAULT_SCENARIOS, Operation, Scenario, Side};
use crate::timer::CommandSpec;

/// Default per-command timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// Default results log.
pub const DEFAULT_LOG_PATH: &str = "target/vcs_duel_results.log";

/// How to drive one measured tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSpec {
    /// Display name
    pub name: String,
    /// Executable
    pub program: PathBuf,
    /// Metadata directory created by `init`, relative to the repository root
    pub metadata_dir: String,
    /// Untimed commands run right after `init`
    pub setup: Vec<Vec<String>>,
    /// Process-table name, when it differs from the executable's file name
    pub process_name: Option<String>,
}

impl ToolSpec {
    /// Creates a tool with no setup commands.
    pub fn new(
        name: impl Into<String>,
        program: impl Into<PathBuf>,
        metadata_dir: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            metadata_dir: metadata_dir.into(),
            setup: Vec::new(),
            process_name: None,
        }
    }

    /// The default candidate.
    pub fn blaze() -> Self {
        Self::new("blaze", "blaze", ".blaze")
    }

    /// The default baseline, with an identity configured so commits succeed.
    pub fn git() -> Self {
        Self::new("git", "git", ".git")
            .with_setup(&["config", "user.email", "bench@example.com"])
            .with_setup(&["config", "user.name", "Bench User"])
            .with_setup(&["config", "commit.gpgsign", "false"])
    }

    /// Adds an untimed setup command.
    pub fn with_setup(mut self, args: &[&str]) -> Self {
        self.setup.push(args.iter().map(|s| s.to_string()).collect());
        self
    }

    /// Builds a command for this tool.
    pub fn command<I, S>(&self, cwd: &Path, args: I) -> CommandSpec
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let spec = CommandSpec::new(&self.program, cwd)
            .args(args.into_iter().map(|a| a.as_ref().to_string()));
        match &self.process_name {
            Some(name) => spec.process_name(name.clone()),
            None => spec,
        }
    }

    /// Metadata directory inside `repo`.
    pub fn metadata_path(&self, repo: &Path) -> PathBuf {
        repo.join(&self.metadata_dir)
    }
}

/// Repetitions per operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialCounts {
    /// Trials of `init`, reported but unscored
    pub init: usize,
    /// Trials of `add`
    pub add: usize,
    /// Trials of `commit`, costlier to set up
    pub commit: usize,
}

impl Default for TrialCounts {
    fn default() -> Self {
        Self {
            init: 3,
            add: 3,
            commit: 2,
        }
    }
}

impl TrialCounts {
    /// One trial each.
    pub fn quick() -> Self {
        Self {
            init: 1,
            add: 1,
            commit: 1,
        }
    }

    /// Repetitions for `operation`.
    pub fn for_operation(&self, operation: Operation) -> usize {
        match operation {
            Operation::Init => self.init,
            Operation::Add => self.add,
            Operation::Commit => self.commit,
        }
    }
}

/// Everything a harness run needs.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Tool being evaluated
    pub candidate: ToolSpec,
    /// Reference tool
    pub baseline: ToolSpec,
    /// Scenarios, consumed in order
    pub scenarios: Vec<Scenario>,
    /// Repetitions per operation
    pub trials: TrialCounts,
    /// Memory poll interval
    pub sample_interval: Duration,
    /// Per-command timeout, `None` to wait forever
    pub command_timeout: Option<Duration>,
    /// Append-only results log
    pub log_path: PathBuf,
    /// Parent directory for the scratch workspace (system temp dir if `None`)
    pub work_root: Option<PathBuf>,
    /// Insight thresholds and categories
    pub insight: InsightConfig,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            candidate: ToolSpec::blaze(),
            baseline: ToolSpec::git(),
            scenarios: DEFAULT_SCENARIOS.to_vec(),
            trials: TrialCounts::default(),
            sample_interval: DEFAULT_INTERVAL,
            command_timeout: Some(DEFAULT_TIMEOUT),
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            work_root: None,
            insight: InsightConfig::default(),
        }
    }
}

impl HarnessConfig {
    /// Tool for `side`.
    pub fn tool(&self, side: Side) -> &ToolSpec {
        match side {
            Side::Candidate => &self.candidate,
            Side::Baseline => &self.baseline,
        }
    }

    /// Defaults with `DUEL_*` environment overrides.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults with overrides read through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(mode) = lookup("DUEL_MODE") {
            config.trials = match mode.trim() {
                "quick" => TrialCounts::quick(),
                "full" | "" => TrialCounts::default(),
                other => {
                    return Err(HarnessError::InvalidConfig(format!(
                        "DUEL_MODE must be quick or full, got {:?}",
                        other
                    )));
                }
            };
        }

        if let Some(value) = lookup("DUEL_INIT_TRIALS") {
            config.trials.init = parse_positive("DUEL_INIT_TRIALS", &value)?;
        }
        if let Some(value) = lookup("DUEL_ADD_TRIALS") {
            config.trials.add = parse_positive("DUEL_ADD_TRIALS", &value)?;
        }
        if let Some(value) = lookup("DUEL_COMMIT_TRIALS") {
            config.trials.commit = parse_positive("DUEL_COMMIT_TRIALS", &value)?;
        }
        if let Some(value) = lookup("DUEL_SAMPLE_MS") {
            config.sample_interval =
                Duration::from_millis(parse_positive("DUEL_SAMPLE_MS", &value)? as u64);
        }
        if let Some(value) = lookup("DUEL_TIMEOUT_SECS") {
            let secs: u64 = parse("DUEL_TIMEOUT_SECS", &value)?;
            config.command_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        if let Some(value) = lookup("DUEL_STRENGTH_PCT") {
            config.insight.strength_threshold_pct = parse_pct("DUEL_STRENGTH_PCT", &value)?;
        }
        if let Some(value) = lookup("DUEL_CAVEAT_PCT") {
            config.insight.caveat_threshold_pct = parse_pct("DUEL_CAVEAT_PCT", &value)?;
        }
        if config.insight.caveat_threshold_pct > config.insight.strength_threshold_pct {
            return Err(HarnessError::InvalidConfig(
                "caveat threshold exceeds strength threshold".into(),
            ));
        }

        if let Some(value) = lookup("DUEL_CATEGORIES") {
            let categories = split_list(&value)
                .map(str::parse::<Category>)
                .collect::<Result<Vec<_>>>()?;
            if !categories.is_empty() {
                config.scenarios.retain(|s| categories.contains(&s.category));
                config.insight.categories = categories;
            }
        }

        if let Some(value) = lookup("DUEL_SCENARIOS") {
            let keys: Vec<&str> = split_list(&value).collect();
            if let Some(unknown) = keys
                .iter()
                .find(|k| !DEFAULT_SCENARIOS.iter().any(|s| s.key() == **k))
            {
                return Err(HarnessError::InvalidConfig(format!("unknown scenario: {}", unknown)));
            }
            if !keys.is_empty() {
                config.scenarios.retain(|s| keys.contains(&s.key().as_str()));
            }
        }

        if config.scenarios.is_empty() {
            return Err(HarnessError::InvalidConfig(
                "scenario filters matched nothing".into(),
            ));
        }

        Ok(config)
    }
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn parse<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| HarnessError::InvalidConfig(format!("{}={:?}: {}", key, value, e)))
}

fn parse_positive(key: &str, value: &str) -> Result<usize> {
    match parse::<usize>(key, value)? {
        0 => Err(HarnessError::InvalidConfig(format!("{} must be at least 1", key))),
        n => Ok(n),
    }
}

fn parse_pct(key: &str, value: &str) -> Result<u32> {
    match parse::<u32>(key, value)? {
        pct if pct <= 100 => Ok(pct),
        _ => Err(HarnessError::InvalidConfig(format!("{} must be within 0..=100", key))),
    }
}
