//! vcs-duel CLI - head-to-head benchmark of two version control tools
//!
//! Usage:
//!   vcs-duel [OPTIONS]
//!   vcs-duel --list
//!
//! Tunables not exposed as flags are read from `DUEL_*` environment variables.

use anyhow::{Context, Result, bail};
use clap::Parser;
use owo_colors::OwoColorize;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;
use vcs_duel::{Harness, HarnessConfig, HarnessError, Reporter, ShutdownFlag, ToolNames, ToolSpec};

const DEFAULT_TRACE_FILTER: &str = "vcs_duel=warn";

/// Compare a candidate VCS against a baseline on identical workloads
#[derive(Parser)]
#[command(name = "vcs-duel")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Candidate executable
    #[arg(long, value_name = "PATH")]
    candidate: Option<PathBuf>,

    /// Baseline executable
    #[arg(long, value_name = "PATH")]
    baseline: Option<PathBuf>,

    /// Metadata directory the candidate creates on init
    #[arg(long, value_name = "DIR")]
    candidate_dir: Option<String>,

    /// Metadata directory the baseline creates on init
    #[arg(long, value_name = "DIR")]
    baseline_dir: Option<String>,

    /// Append-only results log
    #[arg(long, value_name = "PATH")]
    log: Option<PathBuf>,

    /// Per-command timeout in seconds (0 disables)
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Parent directory for scratch repositories
    #[arg(long, value_name = "DIR")]
    work_dir: Option<PathBuf>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Print the selected scenarios and exit
    #[arg(long)]
    list: bool,
}

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_PREREQUISITE_MISSING: i32 = 3;
const EXIT_USER_CANCELLED: i32 = 5;

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".bright_red().bold(), e);
            exit_code_for(&e)
        }
    };
    process::exit(code);
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::fmt;

    let builder = fmt().with_writer(io::stderr);
    let builder = match std::env::var("RUST_LOG")
        .ok()
        .and_then(|expr| EnvFilter::try_new(expr).ok())
    {
        Some(filter) => builder.with_env_filter(filter),
        None => builder.with_env_filter(DEFAULT_TRACE_FILTER),
    };
    let _ = builder.try_init();
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.chain().find_map(|e| e.downcast_ref::<HarnessError>()) {
        Some(HarnessError::PrerequisiteMissing(_)) => EXIT_PREREQUISITE_MISSING,
        Some(HarnessError::Interrupted) => EXIT_USER_CANCELLED,
        _ => EXIT_ERROR,
    }
}

fn run(cli: Cli) -> Result<i32> {
    let color = !cli.no_color && io::stdout().is_terminal();
    let config = build_config(&cli)?;

    if cli.list {
        print_scenarios(&config, color);
        return Ok(EXIT_SUCCESS);
    }

    let shutdown = ShutdownFlag::new();
    let handler_flag = shutdown.clone();
    ctrlc::set_handler(move || {
        eprintln!("\n\n🛑 Received Ctrl+C, stopping and writing partial results...\n");
        handler_flag.trigger();
    })
    .context("Failed to install Ctrl+C handler")?;

    let names = ToolNames::from_config(&config);
    let mut reporter = Reporter::open(&config.log_path, names, color)
        .with_context(|| format!("Failed to open results log {}", config.log_path.display()))?;
    let log_path = config.log_path.clone();

    let summary = Harness::new(config, shutdown).run(&mut reporter)?;

    if summary.interrupted {
        return Ok(EXIT_USER_CANCELLED);
    }
    if summary.completed == 0 && !summary.skipped.is_empty() {
        bail!(
            "every scenario was skipped ({}); see {}",
            summary.skipped.join(", "),
            log_path.display()
        );
    }

    if color {
        println!("{} results appended to {}", "Done:".bright_green().bold(), log_path.display());
    } else {
        println!("Done: results appended to {}", log_path.display());
    }
    Ok(EXIT_SUCCESS)
}

fn build_config(cli: &Cli) -> Result<HarnessConfig> {
    let mut config = HarnessConfig::from_env().context("Invalid DUEL_* environment")?;

    if let Some(path) = &cli.candidate {
        retarget(&mut config.candidate, path);
    }
    if let Some(path) = &cli.baseline {
        retarget(&mut config.baseline, path);
    }
    if let Some(dir) = &cli.candidate_dir {
        config.candidate.metadata_dir = dir.clone();
    }
    if let Some(dir) = &cli.baseline_dir {
        config.baseline.metadata_dir = dir.clone();
    }
    if let Some(log) = &cli.log {
        config.log_path = log.clone();
    }
    if let Some(secs) = cli.timeout {
        config.command_timeout = (secs > 0).then(|| Duration::from_secs(secs));
    }
    if let Some(dir) = &cli.work_dir {
        config.work_root = Some(dir.clone());
    }

    Ok(config)
}

/// Points `tool` at another executable, keeping its setup commands.
fn retarget(tool: &mut ToolSpec, path: &Path) {
    if let Some(stem) = path.file_stem() {
        tool.name = stem.to_string_lossy().into_owned();
    }
    tool.program = path.to_path_buf();
}

fn print_scenarios(config: &HarnessConfig, color: bool) {
    let header = format!(
        "{:<12} {:<12} {:>10}  {}",
        "scenario", "category", "total", "description"
    );
    if color {
        println!("{}", header.bright_cyan().bold());
    } else {
        println!("{}", header);
    }

    for scenario in &config.scenarios {
        println!(
            "{:<12} {:<12} {:>10}  {}",
            scenario.key(),
            scenario.category.key(),
            format_size(scenario.total_bytes()),
            scenario.description
        );
    }
}

fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;

    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} {}", bytes, UNITS[unit])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}
