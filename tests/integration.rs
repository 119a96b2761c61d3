//! Integration tests for vcs-duel.
//!
//! The measured tools are small shell scripts, so these tests only run on unix.
#![cfg(unix)]

use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::thread;
use std::time::{Duration, Instant};

use tempfile::TempDir;
use vcs_duel::compare::Winner;
use vcs_duel::fixture::{FixtureBuilder, FixtureSource};
use vcs_duel::insight::InsightConfig;
use vcs_duel::scenario::FileSize;
use vcs_duel::store::Metric;
use vcs_duel::{
    Category, Harness, HarnessConfig, HarnessError, Operation, Reporter, RunSummary, Scenario,
    ShutdownFlag, Side, ToolNames, ToolSpec, TrialCounts,
};

const KEY: &str = "10x1KB";

const FAST: &str = r#"
case "$1" in
  --version) echo "fastvcs 1.0.0" ;;
  init) mkdir -p .fast ;;
  add) : ;;
  commit) printf 'tree\n' > .fast/COMMIT ;;
  *) exit 2 ;;
esac
"#;

const SLOW: &str = r#"
case "$1" in
  --version) echo "slowvcs 2.0.0" ;;
  init) mkdir -p .slow ;;
  config) : ;;
  add) sleep 0.3 ;;
  commit) sleep 0.3; mkdir -p .slow/objects; cp -R bucket_000 .slow/objects/ ;;
  *) exit 2 ;;
esac
"#;

const BROKEN_COMMIT: &str = r#"
case "$1" in
  --version) echo "brokenvcs 0.0.1" ;;
  init) mkdir -p .broken ;;
  add) : ;;
  commit) exit 1 ;;
  *) exit 2 ;;
esac
"#;

const HANGING_ADD: &str = r#"
case "$1" in
  --version) echo "hangvcs 0.1" ;;
  init) mkdir -p .hang ;;
  add) sleep 5 ;;
  commit) : ;;
  *) exit 2 ;;
esac
"#;

fn fake_tool(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}", body)).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

struct Fixture {
    dir: TempDir,
    config: HarnessConfig,
}

impl Fixture {
    fn new(candidate: (&str, &str, &str), baseline: (&str, &str, &str)) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("bin");
        fs::create_dir_all(&bin).unwrap();

        let (name, body, meta) = candidate;
        let candidate = ToolSpec::new(name, fake_tool(&bin, name, body), meta);
        let (name, body, meta) = baseline;
        let baseline = ToolSpec::new(name, fake_tool(&bin, name, body), meta)
            .with_setup(&["config", "user.name", "Bench User"]);

        let config = HarnessConfig {
            candidate,
            baseline,
            scenarios: vec![Scenario::new(10, FileSize::kb(1), "Tiny project", Category::Small)],
            trials: TrialCounts {
                init: 1,
                add: 2,
                commit: 1,
            },
            sample_interval: Duration::from_millis(10),
            command_timeout: Some(Duration::from_secs(30)),
            log_path: dir.path().join("logs").join("results.log"),
            work_root: Some(dir.path().join("work")),
            insight: InsightConfig::default(),
        };

        Self { dir, config }
    }

    fn run(&self, shutdown: ShutdownFlag) -> (Result, String) {
        let builder = FixtureBuilder::new(chrono::Utc::now());
        self.run_with(shutdown, &builder)
    }

    fn run_with(&self, shutdown: ShutdownFlag, fixtures: &dyn FixtureSource) -> (Result, String) {
        let names = ToolNames::from_config(&self.config);
        let mut reporter = Reporter::new(Vec::new(), Vec::new(), names, false);
        let result = Harness::new(self.config.clone(), shutdown).run_with(&mut reporter, fixtures);
        let (_, log) = reporter.into_inner();
        (result, String::from_utf8(log).unwrap())
    }

    fn work_is_clean(&self) -> bool {
        let work = self.dir.path().join("work");
        !work.exists() || fs::read_dir(work).unwrap().next().is_none()
    }
}

type Result = std::result::Result<RunSummary, HarnessError>;

/// Fails to build one scenario and builds the others normally.
struct FailingFixtures {
    fail: &'static str,
    inner: FixtureBuilder,
}

impl FixtureSource for FailingFixtures {
    fn build(&self, scenario: &Scenario, dir: &Path) -> vcs_duel::Result<()> {
        if scenario.key() == self.fail {
            return Err(HarnessError::FixtureGeneration {
                scenario: scenario.key(),
                source: io::Error::other("disk full"),
            });
        }
        self.inner.build(scenario, dir)
    }
}

#[test]
fn test_full_run_candidate_wins() {
    let fixture = Fixture::new(("fastvcs", FAST, ".fast"), ("slowvcs", SLOW, ".slow"));
    let (result, log) = fixture.run(ShutdownFlag::new());
    let summary = result.unwrap();

    assert_eq!(summary.completed, 1);
    assert!(summary.skipped.is_empty());
    assert!(!summary.interrupted);

    let add = summary.results.get(KEY, Side::Candidate, Operation::Add).unwrap();
    assert_eq!(add.trials, 2);
    assert_eq!(add.failed_trials, 0);
    assert!(add.best_duration_ms <= add.avg_duration_ms);

    let slow_add = summary.results.get(KEY, Side::Baseline, Operation::Add).unwrap();
    assert!(slow_add.best_duration_ms >= 300);

    for op in Operation::TRACKED {
        let comparison = summary.winners.get(KEY, Metric::Duration(op)).unwrap();
        assert_eq!(comparison.winner, Winner::Candidate);
        assert!(comparison.improvement_pct > 0 && comparison.improvement_pct < 100);
    }

    // init is measured and compared but stays out of the totals
    let init = summary.results.get(KEY, Side::Baseline, Operation::Init).unwrap();
    assert_eq!(init.trials, 1);
    assert!(summary.winners.get(KEY, Metric::Duration(Operation::Init)).is_some());
    assert_eq!(summary.insights.totals.total(), 2);

    let candidate_kb = summary.results.storage(KEY, Side::Candidate).unwrap().size_kb;
    let baseline_kb = summary.results.storage(KEY, Side::Baseline).unwrap().size_kb;
    assert_eq!(candidate_kb, 1);
    assert_eq!(baseline_kb, 10);
    let storage = summary.winners.get(KEY, Metric::Storage).unwrap();
    assert_eq!(storage.winner, Winner::Candidate);
    assert_eq!(storage.margin, 9);

    let champion = summary.insights.champion.unwrap();
    assert_eq!(champion.side, Side::Candidate);
    assert_eq!(champion.victory_rate_pct, 100);

    assert!(log.contains("Candidate: fastvcs (fastvcs 1.0.0)"));
    assert!(log.contains("Baseline:  slowvcs (slowvcs 2.0.0)"));
    assert!(log.contains("10x1KB Tiny project"));
    assert!(log.contains("Champion: fastvcs with a 100% victory rate"));
    assert!(log.contains("Strength: fastvcs is a strong fit for small repos"));
    assert!(log.contains("Operations compared: 2"));
    assert!(log.lines().any(|l| l.trim_start().starts_with("init*")));
    assert!(!log.contains('\u{1b}'));

    assert!(fixture.work_is_clean());
}

#[test]
fn test_failed_commands_are_flagged_not_dropped() {
    let fixture = Fixture::new(("brokenvcs", BROKEN_COMMIT, ".broken"), ("slowvcs", SLOW, ".slow"));
    let (result, log) = fixture.run(ShutdownFlag::new());
    let summary = result.unwrap();

    let commit = summary.results.get(KEY, Side::Candidate, Operation::Commit).unwrap();
    assert_eq!(commit.trials, 1);
    assert_eq!(commit.failed_trials, 1);
    assert!(summary.winners.get(KEY, Metric::Duration(Operation::Commit)).is_some());

    assert!(log.contains("1 of 1 brokenvcs commit trials did not exit successfully"));
}

#[test]
fn test_timeout_kills_and_flags() {
    let mut fixture = Fixture::new(("fastvcs", FAST, ".fast"), ("hangvcs", HANGING_ADD, ".hang"));
    fixture.config.trials = TrialCounts::quick();
    fixture.config.command_timeout = Some(Duration::from_millis(300));

    let (result, _) = fixture.run(ShutdownFlag::new());
    let summary = result.unwrap();

    let add = summary.results.get(KEY, Side::Baseline, Operation::Add).unwrap();
    assert_eq!(add.failed_trials, 1);
    assert!(add.avg_duration_ms < 5_000);
}

#[test]
fn test_interrupt_before_first_scenario() {
    let fixture = Fixture::new(("fastvcs", FAST, ".fast"), ("slowvcs", SLOW, ".slow"));
    let shutdown = ShutdownFlag::new();
    shutdown.trigger();

    let (result, log) = fixture.run(shutdown);
    let summary = result.unwrap();

    assert!(summary.interrupted);
    assert_eq!(summary.completed, 0);
    assert!(summary.winners.is_empty());
    assert!(log.contains("Partial results"));
    assert!(log.contains("No operations were compared."));
    assert!(fixture.work_is_clean());
}

#[test]
fn test_interrupt_during_command() {
    let mut fixture = Fixture::new(("fastvcs", FAST, ".fast"), ("slowvcs", SLOW, ".slow"));
    let started = fixture.dir.path().join("commit-started");
    let release = fixture.dir.path().join("commit-release");

    // the commit exits on its own once the flag is up, like a tool that
    // handles SIGINT itself
    let body = format!(
        r#"
case "$1" in
  --version) echo "stopvcs 1.0" ;;
  init) mkdir -p .stop ;;
  add) : ;;
  commit)
    touch '{}'
    while [ ! -e '{}' ]; do sleep 0.01; done
    exit 130 ;;
  *) exit 2 ;;
esac
"#,
        started.display(),
        release.display()
    );
    let bin = fixture.dir.path().join("bin");
    fixture.config.baseline = ToolSpec::new("stopvcs", fake_tool(&bin, "stopvcs", &body), ".stop");

    let shutdown = ShutdownFlag::new();
    let flag = shutdown.clone();
    let watcher = thread::spawn(move || {
        let give_up = Instant::now() + Duration::from_secs(30);
        while !started.exists() && Instant::now() < give_up {
            thread::sleep(Duration::from_millis(5));
        }
        flag.trigger();
        fs::write(&release, b"").unwrap();
    });

    let (result, log) = fixture.run(shutdown);
    watcher.join().unwrap();
    let summary = result.unwrap();

    assert!(summary.interrupted);
    assert_eq!(summary.completed, 0);
    assert!(summary.skipped.is_empty());
    assert!(summary.results.get(KEY, Side::Baseline, Operation::Commit).is_none());
    assert!(summary.winners.is_empty());
    assert!(log.contains("Partial results"));
    assert!(fixture.work_is_clean());
}

#[test]
fn test_fixture_failure_skips_only_that_scenario() {
    let mut fixture = Fixture::new(("fastvcs", FAST, ".fast"), ("slowvcs", SLOW, ".slow"));
    fixture.config.trials = TrialCounts::quick();
    fixture.config.scenarios.push(Scenario::new(5, FileSize::kb(2), "Next", Category::Small));

    let fixtures = FailingFixtures {
        fail: KEY,
        inner: FixtureBuilder::new(chrono::Utc::now()),
    };
    let (result, log) = fixture.run_with(ShutdownFlag::new(), &fixtures);
    let summary = result.unwrap();

    assert_eq!(summary.skipped, vec![KEY.to_string()]);
    assert_eq!(summary.completed, 1);
    assert!(!summary.interrupted);
    assert!(summary.winners.get(KEY, Metric::Duration(Operation::Add)).is_none());
    assert!(summary.winners.get("5x2KB", Metric::Duration(Operation::Add)).is_some());
    assert!(summary.winners.get("5x2KB", Metric::Storage).is_some());

    assert!(log.contains("skipped 10x1KB: Fixture generation failed for 10x1KB: disk full"));
    assert!(log.contains("5x2KB Next"));
    assert!(fixture.work_is_clean());
}

#[test]
fn test_missing_candidate_fails_fast() {
    let mut fixture = Fixture::new(("fastvcs", FAST, ".fast"), ("slowvcs", SLOW, ".slow"));
    fixture.config.candidate.program = fixture.dir.path().join("bin").join("nope");

    let (result, log) = fixture.run(ShutdownFlag::new());
    assert!(matches!(result, Err(HarnessError::PrerequisiteMissing(_))));
    assert!(log.is_empty());
}

#[test]
fn test_log_file_appends_across_runs() {
    let fixture = Fixture::new(("fastvcs", FAST, ".fast"), ("slowvcs", SLOW, ".slow"));
    let names = ToolNames::from_config(&fixture.config);

    for _ in 0..2 {
        let mut reporter = Reporter::open(&fixture.config.log_path, names.clone(), false).unwrap();
        Harness::new(fixture.config.clone(), ShutdownFlag::new())
            .run(&mut reporter)
            .unwrap();
    }

    let log = fs::read_to_string(&fixture.config.log_path).unwrap();
    assert_eq!(log.matches("EXECUTIVE SUMMARY").count(), 2);
    assert!(!log.contains('\u{1b}'));
}

#[test]
fn test_cli_list() {
    let output = Command::new(env!("CARGO_BIN_EXE_vcs-duel"))
        .arg("--list")
        .env("DUEL_CATEGORIES", "SMALL")
        .env_remove("DUEL_SCENARIOS")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("10x1KB"));
    assert!(stdout.contains("100x4KB"));
    assert!(!stdout.contains("2x64MB"));
}

#[test]
fn test_cli_exit_codes() {
    let dir = tempfile::tempdir().unwrap();

    let bad_env = Command::new(env!("CARGO_BIN_EXE_vcs-duel"))
        .arg("--list")
        .env("DUEL_MODE", "turbo")
        .output()
        .unwrap();
    assert_eq!(bad_env.status.code(), Some(1));

    let missing = Command::new(env!("CARGO_BIN_EXE_vcs-duel"))
        .arg("--candidate")
        .arg(dir.path().join("no-such-tool"))
        .arg("--log")
        .arg(dir.path().join("results.log"))
        .env_remove("DUEL_MODE")
        .output()
        .unwrap();
    assert_eq!(missing.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&missing.stderr);
    assert!(stderr.contains("no-such-tool"));
}
