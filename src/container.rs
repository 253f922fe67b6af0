//! Container runtime checks
//!
//! Talking to Docker or Podman is left to an implementation of
//! [`ContainerInventory`]; this module only knows what to do with the
//! records it returns.

use std::collections::BTreeMap;
use std::fmt;
use std::io;

use derive_more::From;
use tracing::debug;

use crate::perfdata::{status_line, PerfData};
use crate::range::{evaluate_single, ThresholdSet};
use crate::sampler::{sample_deltas, Clock};
use crate::Status;

/// One container as listed by the runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerState {
    pub id: String,
    pub image: String,
    /// The runtime's own state name, e.g. `running` or `exited`
    pub state: String,
}

impl ContainerState {
    pub fn is_running(&self) -> bool {
        self.state.eq_ignore_ascii_case("running")
    }
}

/// Memory counters for one container, in bytes and event counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContainerStats {
    pub cache: u64,
    pub rss: u64,
    pub swap: u64,
    pub unevictable: u64,
    pub pgfault: u64,
    pub pgmajfault: u64,
    pub pgpgin: u64,
    pub pgpgout: u64,
}

impl ContainerStats {
    /// Bytes charged to the container: cache, rss and swap
    ///
    /// Saturates rather than overflowing on nonsense from the runtime.
    pub fn memory_used(&self) -> u64 {
        self.cache.saturating_add(self.rss).saturating_add(self.swap)
    }

    /// The monotonic counters, in the order reported by [`memory_report`]
    fn counters(&self) -> Vec<u64> {
        vec![self.pgfault, self.pgmajfault, self.pgpgin, self.pgpgout]
    }
}

#[derive(Debug, From)]
pub enum ContainerError {
    Io(io::Error),
    /// The runtime answered, but not with anything usable
    Runtime(String),
}

impl fmt::Display for ContainerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ContainerError::Io(ref e) => write!(f, "unable to reach container runtime: {}", e),
            ContainerError::Runtime(ref msg) => write!(f, "container runtime error: {}", msg),
        }
    }
}

impl std::error::Error for ContainerError {}

pub type Result<T> = std::result::Result<T, ContainerError>;

/// Whatever can enumerate containers and report their memory use
pub trait ContainerInventory {
    fn list(&self) -> Result<Vec<ContainerState>>;
    fn stats(&self, id: &str) -> Result<ContainerStats>;
}

/// The running containers, optionally only those built from `image`
pub fn running_containers<I>(inventory: &I, image: Option<&str>) -> Result<Vec<ContainerState>>
where
    I: ContainerInventory + ?Sized,
{
    let containers = inventory
        .list()?
        .into_iter()
        .filter(ContainerState::is_running)
        .filter(|c| image.map_or(true, |image| c.image == image))
        .collect::<Vec<_>>();
    debug!(count = containers.len(), ?image, "found running containers");
    Ok(containers)
}

/// One perfdata item per image, counting its running containers
///
/// Images are sorted so the output is stable between runs.
pub fn running_perfdata(containers: &[ContainerState]) -> Vec<PerfData> {
    let mut per_image = BTreeMap::new();
    for container in containers {
        *per_image.entry(container.image.as_str()).or_insert(0u64) += 1;
    }
    per_image
        .into_iter()
        .map(|(image, count)| PerfData::new(image, count))
        .collect()
}

/// Units for reporting memory sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryUnit {
    Bytes,
    KiloBytes,
    MegaBytes,
    GigaBytes,
}

impl MemoryUnit {
    pub fn convert(self, bytes: u64) -> u64 {
        match self {
            MemoryUnit::Bytes => bytes,
            MemoryUnit::KiloBytes => bytes >> 10,
            MemoryUnit::MegaBytes => bytes >> 20,
            MemoryUnit::GigaBytes => bytes >> 30,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            MemoryUnit::Bytes => "B",
            MemoryUnit::KiloBytes => "kB",
            MemoryUnit::MegaBytes => "MB",
            MemoryUnit::GigaBytes => "GB",
        }
    }
}

impl Default for MemoryUnit {
    fn default() -> MemoryUnit {
        MemoryUnit::KiloBytes
    }
}

/// Memory usage of one container plus how its paging counters moved
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryReport {
    /// cache + rss + swap, in `unit`s
    pub used: u64,
    pub unit: MemoryUnit,
    pub perfdata: Vec<PerfData>,
}

/// Read a container's stats twice, `delay_secs` apart
///
/// Sizes come from the second read; the page counters are reported as
/// raw deltas over the delay, not as rates.
pub fn memory_report<I, C>(
    inventory: &I,
    id: &str,
    unit: MemoryUnit,
    clock: &mut C,
    delay_secs: u64,
) -> Result<MemoryReport>
where
    I: ContainerInventory + ?Sized,
    C: Clock,
{
    let mut latest = ContainerStats::default();
    let deltas = sample_deltas(
        || {
            latest = inventory.stats(id)?;
            Ok::<_, ContainerError>(latest.counters())
        },
        clock,
        delay_secs,
    )?;
    debug!(id, delay_secs, ?deltas, "page counter deltas");

    let sizes = [
        ("cache", latest.cache),
        ("rss", latest.rss),
        ("swap", latest.swap),
        ("unevictable", latest.unevictable),
    ];
    let counters = ["pgfault", "pgmajfault", "pgpgin", "pgpgout"];

    let perfdata = sizes
        .iter()
        .map(|&(label, bytes)| PerfData::new(label, unit.convert(bytes)).unit(unit.suffix()))
        .chain(
            counters
                .iter()
                .zip(deltas.iter())
                .map(|(label, delta)| PerfData::new(*label, delta)),
        )
        .collect();

    Ok(MemoryReport {
        used: unit.convert(latest.memory_used()),
        unit,
        perfdata,
    })
}

/// Judge the number of running containers
///
/// ```text
/// CONTAINERS OK - 2 running container(s) of type "nginx" | nginx=2
/// ```
pub fn container_check<I>(
    inventory: &I,
    image: Option<&str>,
    thresholds: &ThresholdSet,
) -> (Status, String)
where
    I: ContainerInventory + ?Sized,
{
    let running = match running_containers(inventory, image) {
        Ok(running) => running,
        Err(e) => return unknown("CONTAINERS", &e),
    };
    let count = running.len() as u64;
    let status = evaluate_single(count, thresholds);
    let message = match image {
        Some(image) => format!("{} running container(s) of type \"{}\"", count, image),
        None => format!("{} running container(s)", count),
    };
    let perfdata = running_perfdata(&running);
    (status, status_line("CONTAINERS", status, &message, &perfdata))
}

/// Judge the memory used by one container, in `unit`s
pub fn memory_check<I, C>(
    inventory: &I,
    id: &str,
    unit: MemoryUnit,
    thresholds: &ThresholdSet,
    clock: &mut C,
    delay_secs: u64,
) -> (Status, String)
where
    I: ContainerInventory + ?Sized,
    C: Clock,
{
    let report = match memory_report(inventory, id, unit, clock, delay_secs) {
        Ok(report) => report,
        Err(e) => return unknown("MEMORY", &e),
    };
    let status = evaluate_single(report.used, thresholds);
    let message = format!("{} {} memory used", report.used, unit.suffix());
    (status, status_line("MEMORY", status, &message, &report.perfdata))
}

fn unknown(program: &str, e: &ContainerError) -> (Status, String) {
    let status = Status::Unknown;
    (status, status_line(program, status, &e.to_string(), &[]))
}
