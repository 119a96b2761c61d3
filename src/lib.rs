//! # vcs-duel
//!
//! A head-to-head performance harness for version control command-line
//! tools.
//!
//! A *candidate* tool and a *baseline* tool are driven through the same
//! workload scenarios. Every tracked operation (`add`, `commit`) is run
//! several times on a fresh copy of a generated fixture while the process
//! table is sampled for resident memory; `init` is timed too but only
//! reported. Trials are reduced to mean/best/peak
//! statistics, each pair is compared, and a report with per-category insights
//! is written to stdout and appended to a plain-text log.
//!
//! ## Quick Start
//!
//! ```no_run
//! use vcs_duel::{Harness, HarnessConfig, Reporter, ShutdownFlag, ToolNames};
//!
//! let config = HarnessConfig::from_env()?;
//! let names = ToolNames::from_config(&config);
//! let mut reporter = Reporter::open(&config.log_path, names, true)?;
//! let summary = Harness::new(config, ShutdownFlag::new()).run(&mut reporter)?;
//! println!("{} scenarios measured", summary.completed);
//! # Ok::<(), vcs_duel::HarnessError>(())
//! ```
//!
//! ## Pipeline
//!
//! 1. [`fixture`] materializes a scenario's files deterministically
//! 2. [`trial`] times each command ([`timer`]) while [`sampler`] polls memory
//! 3. [`aggregate`] reduces trials, [`compare`] picks a winner per operation
//! 4. [`insight`] summarizes the winners, [`report`] renders everything
//!
//! The individual stages are public so they can be reused on their own.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod aggregate;
pub mod compare;
pub mod config;
mod error;
pub mod fixture;
pub mod harness;
pub mod insight;
pub mod report;
pub mod sampler;
pub mod scenario;
pub mod store;
pub mod timer;
pub mod trial;

pub use config::{HarnessConfig, ToolSpec, TrialCounts};
pub use error::{HarnessError, Result};
pub use harness::{Harness, RunSummary};
pub use report::{Reporter, ToolNames};
pub use scenario::{Category, DEFAULT_SCENARIOS, Operation, Scenario, Side, Workload};
pub use timer::ShutdownFlag;
