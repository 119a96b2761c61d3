//! Wall-clock timing of a single external command.
//!
//! The exit status of the measured command never fails the measurement: a
//! nonzero exit is reported as [`CommandOutcome::Failed`] alongside the
//! elapsed time. Commands that outlive the configured timeout are killed.

use std::ffi::OsString;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use tracing::warn;

use crate::error::{HarnessError, Result};

/// How often a running child is polled for completion.
const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// A fully resolved command line, ready to run in a working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Executable to run
    pub program: PathBuf,
    /// Arguments, in order
    pub args: Vec<OsString>,
    /// Working directory
    pub cwd: PathBuf,
    /// Name under which the process appears in the process table
    pub process_name: String,
}

impl CommandSpec {
    /// Creates a command with no arguments.
    pub fn new(program: impl Into<PathBuf>, cwd: impl Into<PathBuf>) -> Self {
        let program = program.into();
        let process_name = program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            program,
            args: Vec::new(),
            cwd: cwd.into(),
            process_name,
        }
    }

    /// Appends arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Overrides the name used to find the process while it runs.
    pub fn process_name(mut self, name: impl Into<String>) -> Self {
        self.process_name = name.into();
        self
    }

    /// Command line as shown in diagnostics.
    pub fn display(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }
}

/// Cooperative cancellation shared between the signal handler and the harness.
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag(Arc<AtomicBool>);

impl ShutdownFlag {
    /// Creates an untriggered flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests shutdown.
    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns true once shutdown was requested.
    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// How a measured command ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Exit code 0
    Succeeded,
    /// Nonzero exit, or killed by a signal (`code` is `None`)
    Failed {
        /// Exit code, if any
        code: Option<i32>,
    },
    /// Killed after exceeding the timeout
    TimedOut,
}

impl CommandOutcome {
    /// Returns true for a zero exit status.
    pub fn is_success(self) -> bool {
        matches!(self, CommandOutcome::Succeeded)
    }
}

/// Elapsed time and outcome of one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Monotonic wall-clock duration
    pub elapsed: Duration,
    /// How the command ended
    pub outcome: CommandOutcome,
}

impl Timing {
    /// Elapsed time in whole milliseconds.
    pub fn duration_ms(&self) -> u64 {
        u64::try_from(self.elapsed.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Runs commands synchronously and measures them.
///
/// Each command starts in its own process group, so a kill reaches every
/// process the tool forked.
#[derive(Debug, Clone)]
pub struct ProcessTimer {
    timeout: Option<Duration>,
    shutdown: ShutdownFlag,
}

impl ProcessTimer {
    /// Creates a timer. `timeout = None` waits forever.
    pub fn new(timeout: Option<Duration>, shutdown: ShutdownFlag) -> Self {
        Self { timeout, shutdown }
    }

    /// Runs `cmd` to completion, discarding its output.
    pub fn time(&self, cmd: &CommandSpec) -> Result<Timing> {
        self.run(cmd, false).map(|(timing, _)| timing)
    }

    /// Runs `cmd` to completion and returns what it wrote to stdout.
    ///
    /// Subject to the same timeout and shutdown handling as [`time`](Self::time).
    pub fn output(&self, cmd: &CommandSpec) -> Result<(Timing, Vec<u8>)> {
        self.run(cmd, true)
    }

    fn run(&self, cmd: &CommandSpec, capture: bool) -> Result<(Timing, Vec<u8>)> {
        let stdout = if capture {
            Stdio::piped()
        } else {
            Stdio::null()
        };
        let mut command = Command::new(&cmd.program);
        command
            .args(&cmd.args)
            .current_dir(&cmd.cwd)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(Stdio::null());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let start = Instant::now();
        let mut child = command.spawn().map_err(|source| HarnessError::Spawn {
            program: cmd.display(),
            source,
        })?;
        let reader = child.stdout.take().map(|mut stdout| {
            thread::spawn(move || {
                let mut buf = Vec::new();
                let _ = stdout.read_to_end(&mut buf);
                buf
            })
        });
        let deadline = self.timeout.map(|t| start + t);

        let timing = loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    let elapsed = start.elapsed();
                    // a flag raised while the child was exiting still cancels the run
                    if self.shutdown.is_triggered() {
                        return Err(HarnessError::Interrupted);
                    }
                    let outcome = if status.success() {
                        CommandOutcome::Succeeded
                    } else {
                        CommandOutcome::Failed {
                            code: status.code(),
                        }
                    };
                    break Timing { elapsed, outcome };
                }
                Ok(None) => {}
                Err(e) => {
                    terminate(&mut child);
                    return Err(e.into());
                }
            }

            if self.shutdown.is_triggered() {
                terminate(&mut child);
                return Err(HarnessError::Interrupted);
            }

            if deadline.is_some_and(|d| Instant::now() >= d) {
                terminate(&mut child);
                let elapsed = start.elapsed();
                warn!(command = %cmd.display(), ?elapsed, "command timed out and was killed");
                break Timing {
                    elapsed,
                    outcome: CommandOutcome::TimedOut,
                };
            }

            thread::sleep(POLL_INTERVAL);
        };

        let stdout = reader
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();
        Ok((timing, stdout))
    }
}

/// Kills the child's whole process group, then reaps the child.
fn terminate(child: &mut Child) {
    #[cfg(unix)]
    {
        use nix::sys::signal::{Signal, killpg};
        use nix::unistd::Pid;

        // the child leads its own group, so its pid is the group id
        if let Ok(pid) = i32::try_from(child.id()) {
            let _ = killpg(Pid::from_raw(pid), Signal::SIGKILL);
        }
    }
    let _ = child.kill();
    let _ = child.wait();
}
