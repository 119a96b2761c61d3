//! Error types for harness operations.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Result type for harness operations.
pub type Result<T> = std::result::Result<T, HarnessError>;

/// Errors that can occur while preparing, measuring or reporting a run.
#[derive(Debug)]
pub enum HarnessError {
    /// A scenario's fixture files could not be materialized.
    FixtureGeneration {
        /// Key of the scenario being built
        scenario: String,
        /// Underlying I/O failure
        source: io::Error,
    },

    /// A measured tool or an OS capability the harness relies on is unavailable.
    PrerequisiteMissing(String),

    /// A command could not be started at all.
    Spawn {
        /// Program that failed to start
        program: String,
        /// Underlying I/O failure
        source: io::Error,
    },

    /// A working directory could not be removed.
    Cleanup {
        /// Directory that was left behind
        path: PathBuf,
        /// Underlying I/O failure
        source: io::Error,
    },

    /// The run was interrupted by the user.
    Interrupted,

    /// A store entry was written twice.
    DuplicateEntry(String),

    /// A configuration value could not be understood.
    InvalidConfig(String),

    /// Any other I/O failure (report output, directory setup).
    Io(io::Error),
}

impl HarnessError {
    pub(crate) fn fixture(scenario: impl Into<String>, source: io::Error) -> Self {
        HarnessError::FixtureGeneration {
            scenario: scenario.into(),
            source,
        }
    }
}

impl fmt::Display for HarnessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HarnessError::FixtureGeneration { scenario, source } => {
                write!(f, "Fixture generation failed for {}: {}", scenario, source)
            }
            HarnessError::PrerequisiteMissing(msg) => write!(f, "Prerequisite missing: {}", msg),
            HarnessError::Spawn { program, source } => {
                write!(f, "Failed to start {}: {}", program, source)
            }
            HarnessError::Cleanup { path, source } => {
                write!(f, "Failed to remove {}: {}", path.display(), source)
            }
            HarnessError::Interrupted => write!(f, "Run cancelled by user"),
            HarnessError::DuplicateEntry(key) => write!(f, "Duplicate store entry: {}", key),
            HarnessError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            HarnessError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for HarnessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HarnessError::FixtureGeneration { source, .. }
            | HarnessError::Spawn { source, .. }
            | HarnessError::Cleanup { source, .. } => Some(source),
            HarnessError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for HarnessError {
    fn from(err: io::Error) -> Self {
        HarnessError::Io(err)
    }
}
