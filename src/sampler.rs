//! Background memory sampling of the process under measurement.
//!
//! A sampler is one thread polling the OS process table at a fixed interval,
//! summing resident memory of every process whose name matches the measured
//! tool. It is cancelled through a channel, so a stop request wakes it
//! immediately instead of waiting out the poll interval. Dropping the handle
//! cancels and joins the thread too, which keeps a polling loop from
//! outliving the measurement on early returns and unwinding.

use std::ffi::OsStr;
use std::io;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System};

use crate::error::{HarnessError, Result};

/// Default poll interval.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(50);

/// Linux truncates process names to this many bytes.
const COMM_LEN: usize = 15;

const MIB: u64 = 1024 * 1024;

/// Memory readings collected over one command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryStats {
    /// Highest summed resident memory seen
    pub peak_bytes: u64,
    /// Mean over all polls that found the process
    pub avg_bytes: u64,
    /// Number of such polls
    pub samples: usize,
}

impl MemoryStats {
    /// Reduces a sample log.
    pub fn from_samples(samples: &[u64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }

        let total: u128 = samples.iter().map(|&s| u128::from(s)).sum();
        Self {
            peak_bytes: samples.iter().copied().max().unwrap_or(0),
            avg_bytes: u64::try_from(total / samples.len() as u128).unwrap_or(u64::MAX),
            samples: samples.len(),
        }
    }

    /// Peak in whole MiB.
    pub fn peak_mb(&self) -> u64 {
        self.peak_bytes / MIB
    }

    /// Average in whole MiB.
    pub fn avg_mb(&self) -> u64 {
        self.avg_bytes / MIB
    }
}

/// Starts samplers with a fixed poll interval.
#[derive(Debug, Clone, Copy)]
pub struct ResourceSampler {
    interval: Duration,
}

impl Default for ResourceSampler {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL)
    }
}

impl ResourceSampler {
    /// Creates a sampler factory.
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Starts polling for processes named `process_name`.
    pub fn start(&self, process_name: &str) -> io::Result<SamplerHandle> {
        let (stop_tx, stop_rx) = mpsc::channel();
        let name = process_name.to_string();
        let interval = self.interval;

        let worker = thread::Builder::new()
            .name("memory-sampler".into())
            .spawn(move || sample_loop(&name, interval, &stop_rx))?;

        Ok(SamplerHandle {
            stop: Some(stop_tx),
            worker: Some(worker),
        })
    }
}

/// A running sampler. Finish it to collect its readings.
#[derive(Debug)]
pub struct SamplerHandle {
    stop: Option<Sender<()>>,
    worker: Option<JoinHandle<MemoryStats>>,
}

impl SamplerHandle {
    /// Stops polling and returns what was observed.
    pub fn finish(mut self) -> MemoryStats {
        self.shutdown()
    }

    fn shutdown(&mut self) -> MemoryStats {
        // Disconnecting the channel wakes the worker.
        drop(self.stop.take());
        self.worker
            .take()
            .and_then(|worker| worker.join().ok())
            .unwrap_or_default()
    }
}

impl Drop for SamplerHandle {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

fn sample_loop(name: &str, interval: Duration, stop: &Receiver<()>) -> MemoryStats {
    let mut system = System::new();
    let mut samples = Vec::new();

    loop {
        system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing().with_memory(),
        );
        if let Some(bytes) = resident_bytes(&system, name) {
            samples.push(bytes);
        }

        match stop.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => continue,
            _ => break,
        }
    }

    MemoryStats::from_samples(&samples)
}

fn resident_bytes(system: &System, name: &str) -> Option<u64> {
    let mut matched = false;
    let mut total = 0u64;

    for process in system.processes().values() {
        // Threads show up as tasks sharing their parent's memory.
        if process.thread_kind().is_some() {
            continue;
        }
        if matches_process_name(process.name(), name) {
            matched = true;
            total = total.saturating_add(process.memory());
        }
    }

    matched.then_some(total)
}

/// Returns true if a process-table `name` belongs to the tool `target`.
pub fn matches_process_name(name: &OsStr, target: &str) -> bool {
    let name = name.to_string_lossy();
    if name == target {
        return true;
    }

    target.len() > COMM_LEN && target.get(..COMM_LEN).is_some_and(|prefix| name == prefix)
}

/// Verifies the process table can be read on this system.
pub fn check_process_table() -> Result<()> {
    if !sysinfo::IS_SUPPORTED_SYSTEM {
        return Err(HarnessError::PrerequisiteMissing(
            "process table queries are not supported on this platform".into(),
        ));
    }

    let pid = sysinfo::get_current_pid()
        .map_err(|e| HarnessError::PrerequisiteMissing(format!("cannot resolve own pid: {}", e)))?;

    let mut system = System::new();
    system.refresh_processes_specifics(
        ProcessesToUpdate::Some(&[pid]),
        false,
        ProcessRefreshKind::nothing().with_memory(),
    );

    match system.process(pid) {
        Some(_) => Ok(()),
        None => Err(HarnessError::PrerequisiteMissing(
            "process table is not readable".into(),
        )),
    }
}
