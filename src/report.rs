//! Report rendering to standard output with a plain-text log mirror.
//!
//! Every line is assembled from toned segments. Standard output gets the
//! styled form (colors when enabled, decorative glyphs always); the log gets
//! the same text with decoration removed and never contains ANSI escapes.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Stdout, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use owo_colors::OwoColorize;

use crate::aggregate::AggregatedResult;
use crate::compare::{ComparisonResult, Winner};
use crate::config::HarnessConfig;
use crate::error::{HarnessError, Result};
use crate::insight::{Insights, Recommendation, RecommendationKind, Subject, Tally};
use crate::scenario::{Operation, Scenario, Side};
use crate::store::{Metric, ResultsStore, WinnersStore};

const RULE_WIDTH: usize = 78;

/// Host and tool details printed before the first scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentInfo {
    /// Run start
    pub started_at: DateTime<Utc>,
    /// Operating system name and version
    pub os: String,
    /// CPU brand string
    pub cpu_brand: String,
    /// Logical cores
    pub cpu_cores: usize,
    /// Installed memory, MiB
    pub total_memory_mb: u64,
    /// `--version` output of the candidate
    pub candidate_version: String,
    /// `--version` output of the baseline
    pub baseline_version: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tone {
    Plain,
    Heading,
    Good,
    Bad,
    Warn,
    Muted,
    /// Shown on stdout only
    Decor,
}

#[derive(Debug, Clone)]
struct Segment {
    tone: Tone,
    text: String,
}

#[derive(Debug, Clone, Default)]
struct Line {
    segments: Vec<Segment>,
}

impl Line {
    fn new() -> Self {
        Self::default()
    }

    fn of(tone: Tone, text: impl Into<String>) -> Self {
        Self::new().with(tone, text)
    }

    fn with(mut self, tone: Tone, text: impl Into<String>) -> Self {
        self.segments.push(Segment {
            tone,
            text: text.into(),
        });
        self
    }

    fn is_decor_only(&self) -> bool {
        !self.segments.is_empty() && self.segments.iter().all(|s| s.tone == Tone::Decor)
    }

    fn plain(&self) -> String {
        self.segments
            .iter()
            .filter(|s| s.tone != Tone::Decor)
            .map(|s| s.text.as_str())
            .collect::<String>()
            .trim_end()
            .to_string()
    }

    fn styled(&self, color: bool) -> String {
        self.segments
            .iter()
            .map(|s| {
                if !color {
                    return s.text.clone();
                }
                match s.tone {
                    Tone::Plain => s.text.clone(),
                    Tone::Heading => s.text.bright_cyan().bold().to_string(),
                    Tone::Good => s.text.bright_green().to_string(),
                    Tone::Bad => s.text.bright_red().to_string(),
                    Tone::Warn => s.text.bright_yellow().to_string(),
                    Tone::Muted => s.text.dimmed().to_string(),
                    Tone::Decor => s.text.bright_blue().to_string(),
                }
            })
            .collect()
    }
}

/// Display names of the two tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolNames {
    /// Candidate name
    pub candidate: String,
    /// Baseline name
    pub baseline: String,
}

impl ToolNames {
    /// Names taken from the configured tools.
    pub fn from_config(config: &HarnessConfig) -> Self {
        Self {
            candidate: config.candidate.name.clone(),
            baseline: config.baseline.name.clone(),
        }
    }

    fn of(&self, side: Side) -> &str {
        match side {
            Side::Candidate => &self.candidate,
            Side::Baseline => &self.baseline,
        }
    }
}

/// Renders the comparison report.
pub struct Reporter<O: Write, L: Write> {
    out: O,
    log: L,
    names: ToolNames,
    color: bool,
}

impl Reporter<Stdout, BufWriter<File>> {
    /// Reports to stdout and appends to the log at `log_path`, creating its
    /// parent directory if needed.
    pub fn open(log_path: &Path, names: ToolNames, color: bool) -> Result<Self> {
        if let Some(parent) = log_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let log = OpenOptions::new().create(true).append(true).open(log_path)?;
        Ok(Self::new(io::stdout(), BufWriter::new(log), names, color))
    }
}

impl<O: Write, L: Write> Reporter<O, L> {
    /// Creates a reporter over arbitrary sinks.
    pub fn new(out: O, log: L, names: ToolNames, color: bool) -> Self {
        Self {
            out,
            log,
            names,
            color,
        }
    }

    fn emit(&mut self, line: Line) -> io::Result<()> {
        writeln!(self.out, "{}", line.styled(self.color))?;
        if !line.is_decor_only() {
            writeln!(self.log, "{}", line.plain())?;
        }
        Ok(())
    }

    fn blank(&mut self) -> io::Result<()> {
        self.emit(Line::new())
    }

    fn rule(&mut self) -> io::Result<()> {
        self.emit(Line::of(Tone::Decor, "═".repeat(RULE_WIDTH)))
    }

    /// Environment and version preamble.
    pub fn preamble(&mut self, env: &EnvironmentInfo, config: &HarnessConfig) -> Result<()> {
        self.rule()?;
        let started = env.started_at.format("%Y-%m-%d %H:%M:%S UTC");
        self.emit(
            Line::of(Tone::Decor, "⚔  ")
                .with(
                    Tone::Heading,
                    format!("{} vs {}", self.names.candidate, self.names.baseline),
                )
                .with(Tone::Muted, format!("  started {}", started)),
        )?;
        self.rule()?;
        self.emit(Line::of(Tone::Plain, format!("OS:        {}", env.os)))?;
        self.emit(Line::of(
            Tone::Plain,
            format!("CPU:       {} ({} cores)", env.cpu_brand, env.cpu_cores),
        ))?;
        self.emit(Line::of(Tone::Plain, format!("Memory:    {} MB", env.total_memory_mb)))?;
        self.emit(Line::of(
            Tone::Plain,
            format!("Candidate: {} ({})", self.names.candidate, env.candidate_version),
        ))?;
        self.emit(Line::of(
            Tone::Plain,
            format!("Baseline:  {} ({})", self.names.baseline, env.baseline_version),
        ))?;
        let timeout = match config.command_timeout {
            Some(t) => format!("{}s", t.as_secs()),
            None => "none".to_string(),
        };
        self.emit(Line::of(
            Tone::Muted,
            format!(
                "Scenarios: {}, trials init/add/commit: {}/{}/{}, sampling every {}ms, timeout {}",
                config.scenarios.len(),
                config.trials.init,
                config.trials.add,
                config.trials.commit,
                config.sample_interval.as_millis(),
                timeout
            ),
        ))?;
        self.blank()?;
        Ok(())
    }

    /// Per-scenario table: one row per operation plus storage. The `init` row
    /// is informational and marked as unscored.
    pub fn scenario(
        &mut self,
        scenario: &Scenario,
        results: &ResultsStore,
        winners: &WinnersStore,
    ) -> Result<()> {
        let key = scenario.key();
        self.emit(
            Line::of(Tone::Decor, "▶ ")
                .with(Tone::Heading, key.clone())
                .with(
                    Tone::Muted,
                    format!(" {} [{}]", scenario.description, scenario.category.label()),
                ),
        )?;
        self.emit(Line::of(
            Tone::Muted,
            format!(
                "  {:<9} {:>16} {:>16} {:>10} {:>8} {:>7}  {}",
                "op",
                self.names.baseline,
                self.names.candidate,
                "winner",
                "gain",
                "ratio",
                format!("memory avg/peak MB ({} | {})", self.names.baseline, self.names.candidate)
            ),
        ))?;

        let mut notes = Vec::new();
        let mut unscored = false;
        for op in Operation::ALL {
            let baseline = results.get(&key, Side::Baseline, op);
            let candidate = results.get(&key, Side::Candidate, op);
            let comparison = winners.get(&key, Metric::Duration(op));

            let label = if op.is_tracked() {
                op.key().to_string()
            } else {
                unscored |= baseline.is_some() || candidate.is_some();
                format!("{}*", op.key())
            };
            let line = Line::of(
                Tone::Plain,
                format!(
                    "  {:<9} {:>16} {:>16} ",
                    label,
                    duration_cell(baseline),
                    duration_cell(candidate)
                ),
            );
            let line = self.verdict(line, comparison);
            let line = line.with(
                Tone::Muted,
                format!("  {} | {}", memory_cell(baseline), memory_cell(candidate)),
            );
            self.emit(line)?;

            for (side, result) in [(Side::Baseline, baseline), (Side::Candidate, candidate)] {
                if let Some(r) = result.filter(|r| r.failed_trials > 0) {
                    notes.push(format!(
                        "{} of {} {} {} trials did not exit successfully",
                        r.failed_trials,
                        r.trials,
                        self.names.of(side),
                        op.key()
                    ));
                }
            }
        }

        let baseline_kb = results.storage(&key, Side::Baseline).map(|m| m.size_kb);
        let candidate_kb = results.storage(&key, Side::Candidate).map(|m| m.size_kb);
        let line = Line::of(
            Tone::Plain,
            format!(
                "  {:<9} {:>16} {:>16} ",
                "storage",
                kb_cell(baseline_kb),
                kb_cell(candidate_kb)
            ),
        );
        let storage = winners.get(&key, Metric::Storage);
        let mut line = self.verdict(line, storage);
        if let Some(c) = storage.filter(|c| c.winner != Winner::Tie) {
            line = line.with(Tone::Muted, format!("  saves {}KB", c.margin));
        }
        self.emit(line)?;

        if unscored {
            self.emit(Line::of(
                Tone::Muted,
                "  * reported for reference, not counted in the summary",
            ))?;
        }
        for note in notes {
            self.emit(Line::of(Tone::Decor, "  ⚠ ").with(Tone::Warn, format!("note: {}", note)))?;
        }
        self.blank()?;
        Ok(())
    }

    fn verdict(&self, line: Line, comparison: Option<&ComparisonResult>) -> Line {
        match comparison {
            Some(c) => {
                let (tone, name) = match c.winner.side() {
                    Some(Side::Candidate) => (Tone::Good, self.names.of(Side::Candidate)),
                    Some(Side::Baseline) => (Tone::Bad, self.names.of(Side::Baseline)),
                    None => (Tone::Muted, "tie"),
                };
                line.with(tone, format!("{:>10}", name))
                    .with(Tone::Plain, format!(" {:>7}%", c.improvement_pct))
                    .with(Tone::Muted, format!(" {:>7}", ratio_cell(c)))
            }
            None => line.with(Tone::Muted, format!("{:>10} {:>8} {:>7}", "n/a", "-", "-")),
        }
    }

    /// Notes a scenario that could not be measured.
    pub fn scenario_skipped(&mut self, scenario: &Scenario, reason: &HarnessError) -> Result<()> {
        self.emit(
            Line::of(Tone::Decor, "⚠ ")
                .with(Tone::Warn, format!("skipped {}: {}", scenario.key(), reason)),
        )?;
        self.blank()?;
        Ok(())
    }

    /// Executive summary, category breakdown and recommendations.
    pub fn summary(&mut self, insights: &Insights, interrupted: bool) -> Result<()> {
        self.rule()?;
        self.emit(Line::of(Tone::Heading, "EXECUTIVE SUMMARY"))?;
        self.rule()?;
        if interrupted {
            self.emit(Line::of(
                Tone::Warn,
                "Partial results: the run was interrupted before every scenario completed.",
            ))?;
        }

        let totals = insights.totals;
        self.emit(Line::of(
            Tone::Plain,
            format!("Operations compared: {}", totals.total()),
        ))?;
        self.emit(
            Line::of(Tone::Plain, "  ")
                .with(
                    Tone::Good,
                    format!("{} wins: {}", self.names.candidate, totals.candidate_wins),
                )
                .with(Tone::Plain, "   ")
                .with(
                    Tone::Bad,
                    format!("{} wins: {}", self.names.baseline, totals.baseline_wins),
                )
                .with(Tone::Plain, "   ")
                .with(Tone::Muted, format!("ties: {}", totals.ties)),
        )?;

        let champion = match insights.champion {
            Some(c) => Line::of(Tone::Decor, "🏆 ").with(
                if c.side == Side::Candidate { Tone::Good } else { Tone::Bad },
                format!(
                    "Champion: {} with a {}% victory rate",
                    self.names.of(c.side),
                    c.victory_rate_pct
                ),
            ),
            None if totals.total() == 0 => Line::of(Tone::Muted, "No operations were compared."),
            None => Line::of(
                Tone::Muted,
                format!("No champion: both tools won {} operations.", totals.candidate_wins),
            ),
        };
        self.emit(champion)?;
        if insights.storage.total() > 0 {
            let storage = format!("Storage: {}", self.tally(&insights.storage));
            self.emit(Line::of(Tone::Plain, storage))?;
        }
        self.blank()?;

        self.emit(Line::of(Tone::Heading, "PERFORMANCE BY CATEGORY"))?;
        self.emit(Line::of(
            Tone::Muted,
            format!(
                "  {:<18} {:>4} {:>10} {:>10} {:>5} {:>9}",
                "category", "ops", self.names.candidate, self.names.baseline, "ties", "win rate"
            ),
        ))?;
        for c in &insights.categories {
            let rate = match c.win_rate_pct {
                Some(r) => format!("{}%", r),
                None => "n/a".to_string(),
            };
            self.emit(Line::of(
                Tone::Plain,
                format!(
                    "  {:<18} {:>4} {:>10} {:>10} {:>5} {:>9}",
                    c.category.label(),
                    c.tally.total(),
                    c.tally.candidate_wins,
                    c.tally.baseline_wins,
                    c.tally.ties,
                    rate
                ),
            ))?;
        }
        self.blank()?;

        self.emit(Line::of(Tone::Heading, "RECOMMENDATIONS"))?;
        if insights.recommendations.is_empty() {
            self.emit(Line::of(
                Tone::Muted,
                "  No category crossed the recommendation thresholds.",
            ))?;
        }
        for rec in &insights.recommendations {
            let line = self.recommendation(rec);
            self.emit(line)?;
        }
        self.blank()?;
        Ok(())
    }

    fn tally(&self, tally: &Tally) -> String {
        format!(
            "{} smaller in {}, {} smaller in {}, equal in {}",
            self.names.candidate,
            tally.candidate_wins,
            self.names.baseline,
            tally.baseline_wins,
            tally.ties
        )
    }

    fn recommendation(&self, rec: &Recommendation) -> Line {
        let candidate = &self.names.candidate;
        let baseline = &self.names.baseline;
        let (glyph, tone, text) = match (rec.kind, rec.subject) {
            (RecommendationKind::Strength, Subject::Category(c)) => (
                "✔ ",
                Tone::Good,
                format!(
                    "Strength: {} is a strong fit for {} ({}% win rate)",
                    candidate,
                    c.label().to_lowercase(),
                    rec.win_rate_pct
                ),
            ),
            (RecommendationKind::Caveat, Subject::Category(c)) => (
                "✘ ",
                Tone::Bad,
                format!(
                    "Caveat: {} remains the better choice for {} ({} wins {}%)",
                    baseline,
                    c.label().to_lowercase(),
                    candidate,
                    rec.win_rate_pct
                ),
            ),
            (RecommendationKind::Strength, Subject::Storage) => (
                "✔ ",
                Tone::Good,
                format!(
                    "Strength: {} keeps repositories smaller ({}% of scenarios)",
                    candidate, rec.win_rate_pct
                ),
            ),
            (RecommendationKind::Caveat, Subject::Storage) => (
                "✘ ",
                Tone::Bad,
                format!(
                    "Caveat: {} repositories are usually larger ({} smaller in {}% of scenarios)",
                    candidate, candidate, rec.win_rate_pct
                ),
            ),
        };
        Line::of(Tone::Plain, "  ").with(Tone::Decor, glyph).with(tone, text)
    }

    /// Flushes both sinks.
    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        self.log.flush()?;
        Ok(())
    }

    /// Returns the underlying sinks.
    pub fn into_inner(self) -> (O, L) {
        (self.out, self.log)
    }
}

fn duration_cell(result: Option<&AggregatedResult>) -> String {
    match result {
        Some(r) => format!("{}ms (best {})", r.avg_duration_ms, r.best_duration_ms),
        None => "n/a".to_string(),
    }
}

/// Loser over winner, e.g. `1.19x`.
fn ratio_cell(comparison: &ComparisonResult) -> String {
    match comparison.ratio() {
        Some(ratio) => format!("{:.2}x", ratio),
        None => "-".to_string(),
    }
}

fn memory_cell(result: Option<&AggregatedResult>) -> String {
    match result {
        Some(r) => format!("{}/{}", r.avg_memory_mb, r.peak_memory_mb),
        None => "-".to_string(),
    }
}

fn kb_cell(kb: Option<u64>) -> String {
    match kb {
        Some(kb) => format!("{}KB", kb),
        None => "n/a".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::{compare, compare_durations, compare_storage};
    use crate::insight::{InsightConfig, synthesize};
    use crate::scenario::DEFAULT_SCENARIOS;
    use crate::store::StorageMeasurement;

    fn names() -> ToolNames {
        ToolNames {
            candidate: "blaze".into(),
            baseline: "git".into(),
        }
    }

    fn result(avg: u64, best: u64, failed: usize) -> AggregatedResult {
        AggregatedResult {
            avg_duration_ms: avg,
            best_duration_ms: best,
            avg_memory_mb: 12,
            peak_memory_mb: 20,
            trials: 3,
            failed_trials: failed,
        }
    }

    fn populated() -> (Scenario, ResultsStore, WinnersStore) {
        let scenario = DEFAULT_SCENARIOS[0];
        let key = scenario.key();
        let mut results = ResultsStore::new();
        let mut winners = WinnersStore::new();

        let runs = [
            (Operation::Init, result(9, 8, 0), result(3, 3, 0)),
            (Operation::Add, result(50, 48, 0), result(42, 40, 0)),
            (Operation::Commit, result(120, 118, 1), result(120, 110, 0)),
        ];
        for (op, candidate, baseline) in runs {
            results.record(&key, Side::Candidate, op, candidate).unwrap();
            results.record(&key, Side::Baseline, op, baseline).unwrap();
            let comparison = compare_durations(&candidate, &baseline);
            winners
                .record(&key, scenario.category, Metric::Duration(op), comparison)
                .unwrap();
        }
        for (side, size_kb) in [(Side::Candidate, 1536), (Side::Baseline, 2048)] {
            results.record_storage(&key, StorageMeasurement { side, size_kb }).unwrap();
        }
        winners
            .record(&key, scenario.category, Metric::Storage, compare_storage(1536, 2048))
            .unwrap();

        (scenario, results, winners)
    }

    fn render(color: bool, interrupted: bool) -> (String, String) {
        let (scenario, results, winners) = populated();
        let mut reporter = Reporter::new(Vec::new(), Vec::new(), names(), color);
        reporter.scenario(&scenario, &results, &winners).unwrap();
        let insights = synthesize(&winners, &InsightConfig::default());
        reporter.summary(&insights, interrupted).unwrap();
        reporter.flush().unwrap();
        let (out, log) = reporter.into_inner();
        (String::from_utf8(out).unwrap(), String::from_utf8(log).unwrap())
    }

    #[test]
    fn test_scenario_table_contents() {
        let (_, log) = render(false, false);
        assert!(log.contains("10x1KB Tiny project [Small repos]"));

        let add = log.lines().find(|l| l.trim_start().starts_with("add")).unwrap();
        assert!(add.contains("42ms (best 40)"));
        assert!(add.contains("50ms (best 48)"));
        assert!(add.contains("git"));
        assert!(add.contains("16%"));
        assert!(add.contains("1.19x"));

        let commit = log.lines().find(|l| l.trim_start().starts_with("commit")).unwrap();
        assert!(commit.contains("tie"));
        assert!(commit.contains("0%"));
        assert!(commit.contains("1.00x"));

        let init = log.lines().find(|l| l.trim_start().starts_with("init*")).unwrap();
        assert!(init.contains("3ms (best 3)"));
        assert!(init.contains("3.00x"));
        assert!(log.contains("* reported for reference, not counted in the summary"));

        let storage = log.lines().find(|l| l.trim_start().starts_with("storage")).unwrap();
        assert!(storage.contains("2048KB"));
        assert!(storage.contains("1536KB"));
        assert!(storage.contains("blaze"));
        assert!(storage.contains("saves 512KB"));

        assert!(log.contains("note: 1 of 3 blaze commit trials did not exit successfully"));
    }

    #[test]
    fn test_log_has_no_markup() {
        let (out, log) = render(true, false);
        assert!(out.contains('\u{1b}'));
        assert!(!log.contains('\u{1b}'));
        for glyph in ["═", "▶", "⚠", "🏆", "✔", "✘", "⚔"] {
            assert!(!log.contains(glyph), "log contains {}", glyph);
        }
        assert!(out.contains("═"));
    }

    #[test]
    fn test_no_color_stdout_is_plain() {
        let (out, _) = render(false, false);
        assert!(!out.contains('\u{1b}'));
        assert!(out.contains("▶ 10x1KB"));
    }

    #[test]
    fn test_summary_contents() {
        let (_, log) = render(false, false);
        assert!(log.contains("EXECUTIVE SUMMARY"));
        assert!(log.contains("Operations compared: 2"));
        assert!(log.contains("blaze wins: 0"));
        assert!(log.contains("git wins: 1"));
        assert!(log.contains("ties: 1"));
        assert!(log.contains("Champion: git with a 100% victory rate"));
        assert!(log.contains("Storage: blaze smaller in 1, git smaller in 0, equal in 0"));
        assert!(log.contains("PERFORMANCE BY CATEGORY"));
        assert!(log.contains("Caveat: git remains the better choice for small repos"));
        assert!(log.contains("Strength: blaze keeps repositories smaller (100% of scenarios)"));
        assert!(!log.contains("Partial results"));
    }

    #[test]
    fn test_preamble() {
        let env = EnvironmentInfo {
            started_at: chrono::TimeZone::with_ymd_and_hms(&Utc, 2024, 5, 1, 8, 30, 0).unwrap(),
            os: "Linux 6.1".into(),
            cpu_brand: "Test CPU".into(),
            cpu_cores: 8,
            total_memory_mb: 16384,
            candidate_version: "blaze 0.3.0".into(),
            baseline_version: "git version 2.43.0".into(),
        };
        let mut config = HarnessConfig::default();
        config.command_timeout = None;

        let mut reporter = Reporter::new(Vec::new(), Vec::new(), names(), true);
        reporter.preamble(&env, &config).unwrap();
        let (_, log) = reporter.into_inner();
        let log = String::from_utf8(log).unwrap();

        assert!(log.starts_with("blaze vs git  started 2024-05-01 08:30:00 UTC\n"));
        assert!(log.contains("CPU:       Test CPU (8 cores)"));
        assert!(log.contains("Candidate: blaze (blaze 0.3.0)"));
        assert!(log.contains("Baseline:  git (git version 2.43.0)"));
        assert!(log.contains(
            "Scenarios: 9, trials init/add/commit: 3/3/2, sampling every 50ms, timeout none"
        ));
        assert!(!log.contains('\u{1b}'));
    }

    #[test]
    fn test_interrupted_banner() {
        let (_, log) = render(false, true);
        assert!(log.contains("Partial results"));
    }

    #[test]
    fn test_empty_summary() {
        let mut reporter = Reporter::new(Vec::new(), Vec::new(), names(), false);
        let insights = synthesize(&WinnersStore::new(), &InsightConfig::default());
        reporter.summary(&insights, true).unwrap();
        let (_, log) = reporter.into_inner();
        let log = String::from_utf8(log).unwrap();
        assert!(log.contains("No operations were compared."));
        assert!(log.contains("No category crossed the recommendation thresholds."));
        assert!(log.contains("n/a"));
    }

    #[test]
    fn test_skipped_scenario() {
        let mut reporter = Reporter::new(Vec::new(), Vec::new(), names(), false);
        let err = HarnessError::fixture("2x64MB", io::Error::other("disk full"));
        reporter.scenario_skipped(&DEFAULT_SCENARIOS[8], &err).unwrap();
        let (_, log) = reporter.into_inner();
        let log = String::from_utf8(log).unwrap();
        assert!(log.starts_with("skipped 2x64MB:"));
        assert!(log.contains("disk full"));
    }

    #[test]
    fn test_open_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("results.log");
        for _ in 0..2 {
            let mut reporter = Reporter::open(&path, names(), false).unwrap();
            let insights = synthesize(&WinnersStore::new(), &InsightConfig::default());
            reporter.summary(&insights, false).unwrap();
            reporter.flush().unwrap();
        }
        let log = fs::read_to_string(&path).unwrap();
        assert_eq!(log.matches("EXECUTIVE SUMMARY").count(), 2);
    }

    #[test]
    fn test_storage_tie_has_no_saving() {
        let mut winners = WinnersStore::new();
        let scenario = DEFAULT_SCENARIOS[1];
        winners
            .record(&scenario.key(), scenario.category, Metric::Storage, compare(10, 10))
            .unwrap();
        let mut reporter = Reporter::new(Vec::new(), Vec::new(), names(), false);
        reporter.scenario(&scenario, &ResultsStore::new(), &winners).unwrap();
        let (_, log) = reporter.into_inner();
        let log = String::from_utf8(log).unwrap();
        assert!(!log.contains("saves"));
        assert!(log.contains("n/a"));
        assert!(!log.contains("reported for reference"));
    }
}
