//! Workload definitions: scenarios, sizes, categories and the sides being compared.

use std::fmt;
use std::str::FromStr;

use crate::error::HarnessError;

/// Unit tag for a fixture file size. Multiples of 1024.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SizeUnit {
    /// Bytes
    B,
    /// Kibibytes
    KB,
    /// Mebibytes
    MB,
    /// Gibibytes
    GB,
}

impl SizeUnit {
    /// Number of bytes in one unit.
    pub const fn multiplier(self) -> u64 {
        match self {
            SizeUnit::B => 1,
            SizeUnit::KB => 1024,
            SizeUnit::MB => 1024 * 1024,
            SizeUnit::GB => 1024 * 1024 * 1024,
        }
    }

    fn tag(self) -> &'static str {
        match self {
            SizeUnit::B => "B",
            SizeUnit::KB => "KB",
            SizeUnit::MB => "MB",
            SizeUnit::GB => "GB",
        }
    }
}

/// A byte count carrying the unit it was declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileSize {
    /// Magnitude in `unit`s
    pub value: u64,
    /// Declared unit
    pub unit: SizeUnit,
}

impl FileSize {
    /// Size in bytes.
    pub const fn bytes(value: u64) -> Self {
        Self {
            value,
            unit: SizeUnit::B,
        }
    }

    /// Size in kibibytes.
    pub const fn kb(value: u64) -> Self {
        Self {
            value,
            unit: SizeUnit::KB,
        }
    }

    /// Size in mebibytes.
    pub const fn mb(value: u64) -> Self {
        Self {
            value,
            unit: SizeUnit::MB,
        }
    }

    /// Exact byte target.
    pub const fn as_bytes(&self) -> u64 {
        self.value * self.unit.multiplier()
    }
}

impl fmt::Display for FileSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.tag())
    }
}

/// Coarse workload-size classification used to segment win rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    /// A handful of small files
    Small,
    /// Typical project size
    Medium,
    /// Very many files
    LargeScale,
    /// Few files in the megabyte range
    LargeFiles,
    /// Files of tens of megabytes or more
    HugeFiles,
}

impl Category {
    /// Every category, in reporting order.
    pub const ALL: [Category; 5] = [
        Category::Small,
        Category::Medium,
        Category::LargeScale,
        Category::LargeFiles,
        Category::HugeFiles,
    ];

    /// Upper-case tag used in configuration.
    pub fn key(self) -> &'static str {
        match self {
            Category::Small => "SMALL",
            Category::Medium => "MEDIUM",
            Category::LargeScale => "LARGE_SCALE",
            Category::LargeFiles => "LARGE_FILES",
            Category::HugeFiles => "HUGE_FILES",
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Category::Small => "Small repos",
            Category::Medium => "Medium repos",
            Category::LargeScale => "Large file counts",
            Category::LargeFiles => "Large files",
            Category::HugeFiles => "Huge files",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Category {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase().replace('-', "_");
        Category::ALL
            .into_iter()
            .find(|c| c.key() == wanted)
            .ok_or_else(|| HarnessError::InvalidConfig(format!("unknown category: {:?}", s)))
    }
}

/// What the fixture files contain and how they are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Workload {
    /// Text, base64 and record files rotating by index, in numbered buckets
    #[default]
    Generated,
    /// Every file byte-identical, to exercise content deduplication
    Duplicate,
    /// A project tree: source files, config, docs and binary assets
    Mixed,
}

impl Workload {
    /// Suffix appended to the scenario key; empty for generated fixtures.
    pub fn suffix(self) -> &'static str {
        match self {
            Workload::Generated => "",
            Workload::Duplicate => "-dup",
            Workload::Mixed => "-mixed",
        }
    }
}

/// One workload run against both tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scenario {
    /// Number of files to generate (always positive)
    pub file_count: u32,
    /// Exact size of each file
    pub file_size: FileSize,
    /// Short description for the report
    pub description: &'static str,
    /// Category used for insight partitioning
    pub category: Category,
    /// File contents and layout
    pub workload: Workload,
}

impl Scenario {
    /// Creates a scenario definition.
    pub const fn new(
        file_count: u32,
        file_size: FileSize,
        description: &'static str,
        category: Category,
    ) -> Self {
        Self {
            file_count,
            file_size,
            description,
            category,
            workload: Workload::Generated,
        }
    }

    /// Same scenario with a different workload.
    pub const fn with_workload(mut self, workload: Workload) -> Self {
        self.workload = workload;
        self
    }

    /// Store key, e.g. `100x4KB` or `50x48KB-dup`.
    pub fn key(&self) -> String {
        format!(
            "{}x{}{}",
            self.file_count,
            self.file_size,
            self.workload.suffix()
        )
    }

    /// Total bytes the fixture occupies.
    pub fn total_bytes(&self) -> u64 {
        u64::from(self.file_count) * self.file_size.as_bytes()
    }
}

/// The default suite, consumed top to bottom.
pub const DEFAULT_SCENARIOS: &[Scenario] = &[
    Scenario::new(10, FileSize::kb(1), "Tiny project", Category::Small),
    Scenario::new(100, FileSize::kb(4), "Small source tree", Category::Small),
    Scenario::new(28, FileSize::kb(8), "Mixed project layout", Category::Small)
        .with_workload(Workload::Mixed),
    Scenario::new(500, FileSize::kb(16), "Medium codebase", Category::Medium),
    Scenario::new(50, FileSize::kb(48), "Duplicated content", Category::Medium)
        .with_workload(Workload::Duplicate),
    Scenario::new(5_000, FileSize::kb(2), "Many small files", Category::LargeScale),
    Scenario::new(10_000, FileSize::kb(1), "Monorepo-scale file count", Category::LargeScale),
    Scenario::new(20, FileSize::mb(1), "Binary assets", Category::LargeFiles),
    Scenario::new(2, FileSize::mb(64), "Media blobs", Category::HugeFiles),
];

/// One of the two tools under comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Side {
    /// The tool being evaluated
    Candidate,
    /// The reference tool
    Baseline,
}

impl Side {
    /// Both sides in execution order.
    pub const BOTH: [Side; 2] = [Side::Candidate, Side::Baseline];

    /// Directory-safe name.
    pub fn key(self) -> &'static str {
        match self {
            Side::Candidate => "candidate",
            Side::Baseline => "baseline",
        }
    }

    /// The other side.
    pub fn opponent(self) -> Side {
        match self {
            Side::Candidate => Side::Baseline,
            Side::Baseline => Side::Candidate,
        }
    }
}

/// A timed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operation {
    /// `init` in an empty directory. Reported, never scored.
    Init,
    /// `add .` on a freshly initialised repository
    Add,
    /// `commit -m` with everything staged
    Commit,
}

impl Operation {
    /// Every measured operation, in execution order.
    pub const ALL: [Operation; 3] = [Operation::Init, Operation::Add, Operation::Commit];

    /// Operations that count toward totals, champion and category rates.
    pub const TRACKED: [Operation; 2] = [Operation::Add, Operation::Commit];

    /// Lower-case name.
    pub fn key(self) -> &'static str {
        match self {
            Operation::Init => "init",
            Operation::Add => "add",
            Operation::Commit => "commit",
        }
    }

    /// True for operations that are scored.
    pub fn is_tracked(self) -> bool {
        Operation::TRACKED.contains(&self)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
