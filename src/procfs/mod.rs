//! Counters and gauges from the /proc filesystem
//!
//! Each source knows the path it reads from so that plugins (and tests) can
//! point it at a copy of the real file.

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::num;
use std::ops::Div;
use std::path::{Path, PathBuf};
use std::result::Result as StdResult;
use std::str::FromStr;

use derive_more::From;
use lazy_static::lazy_static;
use regex::Regex;
use serde_derive::Deserialize;
use tracing::trace;

use crate::sampler::MetricSource;

pub const PROC_STAT: &str = "/proc/stat";
pub const PROC_LOADAVG: &str = "/proc/loadavg";

/// ProcFs errors
///
/// Every error from in this module can be converted into a `ProcFsError`
#[derive(Debug, From)]
pub enum ProcFsError {
    /// Errors originating in IO
    Io(io::Error),
    /// Error pulling all required data out of procfs
    InsufficientData(String),
    /// Happens when we try to parse a float from something in procfs
    InvalidFloat(num::ParseFloatError),
    /// Happens when we try to parse an int from something in procfs
    InvalidInt(num::ParseIntError),
}

impl fmt::Display for ProcFsError {
    fn fmt(&self, f: &mut fmt::Formatter) -> StdResult<(), fmt::Error> {
        use self::ProcFsError::*;
        match *self {
            Io(ref e) => write!(f, "{}", e),
            InsufficientData(ref e) => write!(f, "{}", e),
            InvalidFloat(ref e) => write!(f, "{}", e),
            InvalidInt(ref e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ProcFsError {}

/// All the results are results with `ProcFsError`s
pub type Result<T> = StdResult<T, ProcFsError>;

fn read_file(path: &Path) -> Result<String> {
    let mut fh = File::open(path)
        .map_err(|e| io::Error::new(e.kind(), format!("{}: {}", path.display(), e)))?;
    let mut contents = String::new();
    fh.read_to_string(&mut contents)?;
    Ok(contents)
}

// ////////////////////////////////////////////////////////////////////////////
// /proc/stat counters

/// A system-wide counter from /proc/stat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatKey {
    /// `ctxt`: context switches across all CPUs since boot
    ContextSwitches,
    /// `intr`: interrupts serviced since boot, the first number on the line
    Interrupts,
}

impl StatKey {
    /// The name of the line in /proc/stat
    pub fn name(self) -> &'static str {
        match self {
            StatKey::ContextSwitches => "ctxt",
            StatKey::Interrupts => "intr",
        }
    }
}

impl fmt::Display for StatKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Pull the counter for `key` out of the contents of /proc/stat
pub fn parse_counter(contents: &str, key: StatKey) -> Result<u64> {
    for line in contents.lines() {
        let mut fields = line.split_whitespace();
        if fields.next() != Some(key.name()) {
            continue;
        }
        return match fields.next() {
            Some(value) => Ok(value.parse()?),
            None => Err(ProcFsError::InsufficientData(format!(
                "no value on the '{}' line",
                key
            ))),
        };
    }
    Err(ProcFsError::InsufficientData(format!(
        "no '{}' line found",
        key
    )))
}

/// Reads one /proc/stat counter every time it is sampled
#[derive(Debug, Clone)]
pub struct StatCounter {
    path: PathBuf,
    key: StatKey,
}

impl StatCounter {
    pub fn new<P: Into<PathBuf>>(path: P, key: StatKey) -> StatCounter {
        StatCounter {
            path: path.into(),
            key,
        }
    }

    pub fn key(&self) -> StatKey {
        self.key
    }

    pub fn load(&self) -> Result<u64> {
        let contents = read_file(&self.path)?;
        let value = parse_counter(&contents, self.key)?;
        trace!(key = self.key.name(), value, path = %self.path.display(), "read counter");
        Ok(value)
    }
}

impl MetricSource for StatCounter {
    type Error = ProcFsError;
    fn read(&mut self) -> Result<u64> {
        self.load()
    }
}

/// Count the per-cpu lines in the contents of /proc/stat
///
/// This does not include the `total` line.
pub fn count_cpus(contents: &str) -> Result<usize> {
    let cpus = contents
        .lines()
        .filter(|line| {
            line.starts_with("cpu")
                && line[3..]
                    .chars()
                    .next()
                    .map_or(false, |c| c.is_ascii_digit())
        })
        .count();
    if cpus == 0 {
        return Err(ProcFsError::InsufficientData(
            "no per-cpu lines found".to_owned(),
        ));
    }
    Ok(cpus)
}

/// The number of online CPUs according to a /proc/stat file
pub fn online_cpus<P: AsRef<Path>>(path: P) -> Result<usize> {
    count_cpus(&read_file(path.as_ref())?)
}

// ////////////////////////////////////////////////////////////////////////////
// Load average

lazy_static! {
    static ref LOADAVG_SEPARATOR: Regex = Regex::new(r"[ ,]+").unwrap();
}

#[derive(PartialEq, PartialOrd, Debug, Clone, Copy, Deserialize)]
pub struct LoadAvg {
    pub one: f64,
    pub five: f64,
    pub fifteen: f64,
}

impl LoadAvg {
    /// Load from a file in /proc/loadavg format
    pub fn load<P: AsRef<Path>>(path: P) -> Result<LoadAvg> {
        let contents = read_file(path.as_ref())?;
        Self::from_str(&contents)
    }

    /// The 1, 5 and 15 minute averages, in that order
    pub fn values(&self) -> [f64; 3] {
        [self.one, self.five, self.fifteen]
    }
}

impl Div<usize> for LoadAvg {
    type Output = LoadAvg;

    /// Divide by an integer. Useful to divide by the number of CPUs
    fn div(self, rhs: usize) -> LoadAvg {
        LoadAvg {
            one: self.one / rhs as f64,
            five: self.five / rhs as f64,
            fifteen: self.fifteen / rhs as f64,
        }
    }
}

impl FromStr for LoadAvg {
    type Err = ProcFsError;

    fn from_str(contents: &str) -> Result<LoadAvg> {
        let fields = LOADAVG_SEPARATOR
            .split(contents.trim())
            .take(3)
            .map(|load| load.parse())
            .collect::<StdResult<Vec<f64>, _>>()?;
        if fields.len() < 3 {
            return Err(ProcFsError::InsufficientData(format!(
                "expected three load averages, found '{}'",
                contents.trim()
            )));
        }
        Ok(LoadAvg {
            one: fields[0],
            five: fields[1],
            fifteen: fields[2],
        })
    }
}

impl fmt::Display for LoadAvg {
    fn fmt(&self, f: &mut fmt::Formatter) -> StdResult<(), fmt::Error> {
        write!(
            f,
            "{:.2}, {:.2}, {:.2}",
            self.one, self.five, self.fifteen
        )
    }
}
