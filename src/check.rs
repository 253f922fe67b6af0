//! Shared plumbing for the counter rate checks
//!
//! `check-cswch` and `check-intr` differ only in which `/proc/stat` line
//! they sample and what they call it, so everything else lives here.

use std::fmt::Display;
use std::path::PathBuf;

use serde_derive::Deserialize;
use structopt::StructOpt;
use tracing::{debug, warn};

use crate::perfdata::{status_line, PerfData};
use crate::procfs::StatKey;
use crate::range::{evaluate_single, ThresholdSet};
use crate::sampler::{sample_rate, Clock, MetricSource, Reading, SamplingParams};
use crate::Status;

/// Arguments common to every counter rate check
#[derive(Deserialize, Debug, StructOpt)]
pub struct CounterArgs {
    #[structopt(
        short = "w",
        long = "warning",
        help = "Range of rates that is OK before warning, e.g. 5000 or @10:20"
    )]
    pub warning: Option<String>,
    #[structopt(
        short = "c",
        long = "critical",
        help = "Range of rates that is OK before going critical"
    )]
    pub critical: Option<String>,
    #[structopt(
        short = "v",
        long = "verbose",
        help = "Print every counter reading and log debug output"
    )]
    pub verbose: bool,
    #[structopt(
        long = "proc-stat",
        env = "KSTAT_PROC_STAT",
        default_value = "/proc/stat",
        hidden = true
    )]
    pub proc_stat: PathBuf,
    #[structopt(help = "Seconds to wait between samples", default_value = "1")]
    pub delay: u64,
    #[structopt(
        help = "Number of samples to take. With 1 the raw counter is reported",
        default_value = "2"
    )]
    pub count: u32,
}

impl CounterArgs {
    pub fn sampling(&self) -> Result<SamplingParams, String> {
        SamplingParams::new(self.delay, self.count).map_err(|e| e.to_string())
    }

    pub fn thresholds(&self) -> Result<ThresholdSet, String> {
        ThresholdSet::from_args(self.warning.as_deref(), self.critical.as_deref())
            .map_err(|e| e.to_string())
    }
}

/// A check that reports how fast a kernel counter grows
#[derive(Debug, Clone, Copy)]
pub struct RateCheck {
    /// Prefix of the status line
    pub program: &'static str,
    /// Perfdata label
    pub label: &'static str,
    /// What is being counted, for the status message
    pub description: &'static str,
    pub key: StatKey,
}

pub const CONTEXT_SWITCHES: RateCheck = RateCheck {
    program: "CSWCH",
    label: "cswch",
    description: "number of context switches",
    key: StatKey::ContextSwitches,
};

pub const INTERRUPTS: RateCheck = RateCheck {
    program: "INTR",
    label: "intr",
    description: "number of interrupts",
    key: StatKey::Interrupts,
};

impl RateCheck {
    /// Validate `args`, sample `source` and build the status line
    ///
    /// Invalid thresholds or sampling parameters are reported as `Unknown`
    /// before anything is read.
    pub fn run<S, C>(&self, args: &CounterArgs, source: &mut S, clock: &mut C) -> (Status, String)
    where
        S: MetricSource,
        S::Error: Display,
        C: Clock,
    {
        let thresholds = match args.thresholds() {
            Ok(thresholds) => thresholds,
            Err(e) => return self.unknown(&e),
        };
        let params = match args.sampling() {
            Ok(params) => params,
            Err(e) => return self.unknown(&e),
        };
        if !thresholds.is_defined() {
            warn!("no warning or critical threshold given, status will be UNKNOWN");
        }
        debug!(
            delay = params.delay,
            count = params.count,
            runtime_secs = params.max_runtime().as_secs(),
            "sampling {}",
            self.key
        );

        let key = self.key;
        let mut echo = |reading: Reading| match reading.rate {
            None => println!("{} = {}", key, reading.counter),
            Some(rate) => println!("{} = {} --> {}/s", key, reading.counter, rate),
        };
        let observer: Option<&mut dyn FnMut(Reading)> = if args.verbose {
            Some(&mut echo)
        } else {
            None
        };

        match sample_rate(source, clock, params.delay, params.count, observer) {
            Ok(value) => self.report(value, &params, &thresholds),
            Err(e) => self.unknown(&format!("unable to read {}: {}", self.key, e)),
        }
    }

    /// Evaluate a sampled value and format it
    pub fn report(
        &self,
        value: u64,
        params: &SamplingParams,
        thresholds: &ThresholdSet,
    ) -> (Status, String) {
        let status = evaluate_single(value, thresholds);
        let unit = params.rate_unit();
        let perfdata = PerfData::new(format!("{}{}", self.label, unit), value)
            .thresholds(*thresholds);
        let message = format!("{}{} {}", self.description, unit, value);
        (status, status_line(self.program, status, &message, &[perfdata]))
    }

    fn unknown(&self, message: &str) -> (Status, String) {
        let status = Status::Unknown;
        (status, status_line(self.program, status, message, &[]))
    }
}
