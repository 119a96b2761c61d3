//! Deterministic fixture generation.
//!
//! Every scenario materializes `file_count` files of exactly `file_size`
//! bytes. For generated workloads the content rotates over three kinds keyed
//! by `index % 3`; duplicate workloads repeat one file body, and mixed
//! workloads lay out a small project tree. All randomness is seeded from the
//! scenario key and file index, so building the same scenario twice with the
//! same builder yields byte-identical trees.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fake::Fake;
use fake::faker::name::en::Name;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::error::{HarnessError, Result};
use crate::scenario::{Scenario, Workload};

/// Write granularity; huge files are streamed in pieces of this size.
const CHUNK_SIZE: usize = 64 * 1024;

/// Files per sub-directory.
const FILES_PER_BUCKET: u32 = 1000;

/// Encoded content wraps like `base64` output.
const LINE_WIDTH: u64 = 76;

const BASE64_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// What a single fixture file contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// A short line repeated to size
    Compressible,
    /// Random bytes rendered through a base64 alphabet
    Encoded,
    /// Metadata header followed by random filler
    Record,
    /// The same body for every file of the scenario
    Duplicate,
    /// Rust-looking source text
    Source,
    /// Raw random bytes
    Binary,
}

impl ContentKind {
    /// Kind used for the file at `index` of a generated workload.
    pub fn for_index(index: u32) -> Self {
        match index % 3 {
            0 => ContentKind::Compressible,
            1 => ContentKind::Encoded,
            _ => ContentKind::Record,
        }
    }

    /// Kind used for the file at `index` of `workload`.
    pub fn for_file(workload: Workload, index: u32) -> Self {
        match workload {
            Workload::Generated => Self::for_index(index),
            Workload::Duplicate => ContentKind::Duplicate,
            Workload::Mixed => match index % 4 {
                0 => ContentKind::Source,
                1 => ContentKind::Record,
                2 => ContentKind::Compressible,
                _ => ContentKind::Binary,
            },
        }
    }
}

/// Produces the pristine files a scenario is measured against.
pub trait FixtureSource {
    /// Writes every file of `scenario` under `dir`.
    fn build(&self, scenario: &Scenario, dir: &Path) -> Result<()>;
}

/// Materializes scenario fixtures on disk.
#[derive(Debug, Clone)]
pub struct FixtureBuilder {
    stamp: DateTime<Utc>,
}

impl FixtureBuilder {
    /// Creates a builder whose record headers carry `stamp`.
    pub fn new(stamp: DateTime<Utc>) -> Self {
        Self { stamp }
    }

    /// Writes every file of `scenario` under `dir`.
    pub fn build(&self, scenario: &Scenario, dir: &Path) -> Result<()> {
        let key = scenario.key();

        self.build_files(scenario, &key, dir)
            .map_err(|e| HarnessError::fixture(&key, e))?;

        debug!(
            scenario = %key,
            files = scenario.file_count,
            bytes = scenario.total_bytes(),
            "fixture built"
        );
        Ok(())
    }

    fn build_files(&self, scenario: &Scenario, key: &str, dir: &Path) -> io::Result<()> {
        fs::create_dir_all(dir)?;
        let size = scenario.file_size.as_bytes();
        let mut last_parent = None;

        for index in 0..scenario.file_count {
            let rel = relative_path(scenario.workload, index);
            let parent = rel.parent().map(Path::to_path_buf);
            if parent != last_parent {
                if let Some(parent) = &parent {
                    fs::create_dir_all(dir.join(parent))?;
                }
                last_parent = parent;
            }

            let kind = ContentKind::for_file(scenario.workload, index);
            let mut out = BufWriter::with_capacity(CHUNK_SIZE, File::create(dir.join(&rel))?);
            self.write_content(key, kind, index, size, &mut out)?;
            out.flush()?;
        }

        Ok(())
    }

    /// Streams `kind` content for file `index` into `out`, returning the bytes
    /// written.
    ///
    /// The result is always exactly `size` bytes long.
    pub fn write_content<W: Write>(
        &self,
        key: &str,
        kind: ContentKind,
        index: u32,
        size: u64,
        out: &mut W,
    ) -> io::Result<u64> {
        let mut rng = StdRng::seed_from_u64(seed_for(key, index));

        match kind {
            ContentKind::Compressible => {
                let line = format!(
                    "{} file {:06}: the quick brown fox jumps over the lazy dog\n",
                    key, index
                );
                write_repeating(out, line.as_bytes(), size)
            }
            ContentKind::Encoded => write_encoded(out, &mut rng, size),
            ContentKind::Record => {
                let author: String = Name().fake_with_rng(&mut rng);
                let header = format!(
                    concat!(
                        "# record {:06}\n# scenario: {}\n# author: {}\n",
                        "# generated: {}\n# bytes: {}\n\n"
                    ),
                    index,
                    key,
                    author,
                    self.stamp.format("%Y-%m-%dT%H:%M:%SZ"),
                    size
                );

                let header = header.as_bytes();
                let head_len = header.len().min(usize::try_from(size).unwrap_or(usize::MAX));
                out.write_all(&header[..head_len])?;

                let filler = write_random(out, &mut rng, size - head_len as u64)?;
                Ok(head_len as u64 + filler)
            }
            ContentKind::Duplicate => {
                let line = format!("{}: this content is shared by every file\n", key);
                write_repeating(out, line.as_bytes(), size)
            }
            ContentKind::Source => write_source(out, key, index, size),
            ContentKind::Binary => write_random(out, &mut rng, size),
        }
    }
}

impl FixtureSource for FixtureBuilder {
    fn build(&self, scenario: &Scenario, dir: &Path) -> Result<()> {
        FixtureBuilder::build(self, scenario, dir)
    }
}

/// Path of file `index` relative to the fixture root.
pub fn relative_path(workload: Workload, index: u32) -> PathBuf {
    let bucket = format!("bucket_{:03}", index / FILES_PER_BUCKET);
    match workload {
        Workload::Generated => PathBuf::from(bucket).join(format!("file_{:06}.txt", index)),
        Workload::Duplicate => PathBuf::from(bucket).join(format!("dup_{:06}.txt", index)),
        Workload::Mixed => match ContentKind::for_file(workload, index) {
            ContentKind::Source => PathBuf::from("src").join(format!("module_{:06}.rs", index)),
            ContentKind::Record => PathBuf::from("docs").join(format!("note_{:06}.md", index)),
            ContentKind::Binary => PathBuf::from("assets").join(format!("blob_{:06}.dat", index)),
            _ => PathBuf::from("config").join(format!("settings_{:06}.conf", index)),
        },
    }
}

/// Recursively copies `src` into `dst`, creating `dst` if needed.
pub fn copy_tree(src: &Path, dst: &Path) -> io::Result<()> {
    fs::create_dir_all(dst)?;

    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_tree(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }

    Ok(())
}

/// FNV-1a over the scenario key and file index.
fn seed_for(key: &str, index: u32) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    key.bytes()
        .chain(index.to_le_bytes())
        .fold(OFFSET, |hash, byte| (hash ^ u64::from(byte)).wrapping_mul(PRIME))
}

fn write_repeating<W: Write>(out: &mut W, pattern: &[u8], size: u64) -> io::Result<u64> {
    let mut chunk = Vec::with_capacity(CHUNK_SIZE);
    while chunk.len() + pattern.len() <= CHUNK_SIZE {
        chunk.extend_from_slice(pattern);
    }
    if chunk.is_empty() {
        chunk.extend_from_slice(&pattern[..CHUNK_SIZE.min(pattern.len())]);
    }

    let mut remaining = size;
    while remaining > 0 {
        let n = chunk.len().min(usize::try_from(remaining).unwrap_or(usize::MAX));
        out.write_all(&chunk[..n])?;
        remaining -= n as u64;
    }

    Ok(size)
}

fn write_source<W: Write>(out: &mut W, key: &str, index: u32, size: u64) -> io::Result<u64> {
    let mut buf = format!("// {} module {:06}\n\n", key, index).into_bytes();
    let mut item = 0u64;
    let mut written = 0u64;

    while written < size {
        while buf.len() < CHUNK_SIZE {
            write!(
                buf,
                "pub fn item_{}_{}(x: u64) -> u64 {{\n    x.wrapping_mul({}) ^ {}\n}}\n\n",
                index,
                item,
                item + 1,
                index
            )?;
            item += 1;
        }

        let n = buf.len().min(usize::try_from(size - written).unwrap_or(usize::MAX));
        out.write_all(&buf[..n])?;
        written += n as u64;
        buf.clear();
    }

    Ok(written)
}

fn write_encoded<W: Write>(out: &mut W, rng: &mut StdRng, size: u64) -> io::Result<u64> {
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut written = 0u64;

    while written < size {
        let n = CHUNK_SIZE.min(usize::try_from(size - written).unwrap_or(usize::MAX));
        rng.fill(&mut buf[..n]);

        for (i, byte) in buf[..n].iter_mut().enumerate() {
            let pos = written + i as u64;
            *byte = if pos % (LINE_WIDTH + 1) == LINE_WIDTH {
                b'\n'
            } else {
                BASE64_ALPHABET[usize::from(*byte & 63)]
            };
        }

        out.write_all(&buf[..n])?;
        written += n as u64;
    }

    Ok(written)
}

fn write_random<W: Write>(out: &mut W, rng: &mut StdRng, size: u64) -> io::Result<u64> {
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut written = 0u64;

    while written < size {
        let n = CHUNK_SIZE.min(usize::try_from(size - written).unwrap_or(usize::MAX));
        rng.fill(&mut buf[..n]);
        out.write_all(&buf[..n])?;
        written += n as u64;
    }

    Ok(written)
}
