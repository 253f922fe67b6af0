//! Check the load average of the system
//!
//! Load average is the number of processes *waiting* to do work in a queue, either
//! due to IO or CPU constraints. The numbers used to check are the load averaged
//! over 1, 5 and 15 minutes, respectively

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde_derive::Deserialize;
use structopt::StructOpt;
use tracing::debug;

use kstat_plugins::perfdata::{status_line, PerfData};
use kstat_plugins::procfs::{online_cpus, LoadAvg};
use kstat_plugins::range::{evaluate_multi, MetricThreshold, Range, ThresholdSet};
use kstat_plugins::{logging, usage_error, Status};

const WINDOWS: [&str; 3] = ["load1", "load5", "load15"];

/// Check the load average of the system
///
/// Load average is the number of processes *waiting* to do work in a queue, either
/// due to IO or CPU constraints. The numbers used to check are the load averaged
/// over 1, 5 and 15 minutes, respectively.
///
/// Only the windows selected with -1, -5 and -L affect the result; with none
/// of them all three do. Unselected windows are still reported.
#[derive(Deserialize, Debug, StructOpt)]
#[structopt(
    name = "check-load (part of kstat-plugins)",
    setting = structopt::clap::AppSettings::ColoredHelp
)]
struct Args {
    #[structopt(
        short = "w",
        long = "warning",
        help = "Averages to warn above, either one value or three comma separated ones"
    )]
    warning: Option<LoadLimits>,
    #[structopt(
        short = "c",
        long = "critical",
        help = "Averages to go critical above, either one value or three comma separated ones"
    )]
    critical: Option<LoadLimits>,
    #[structopt(
        short = "r",
        long = "percpu",
        help = "Divide the load averages by the number of CPUs"
    )]
    per_cpu: bool,
    #[structopt(short = "1", long = "load1", help = "Check the 1 minute average")]
    load1: bool,
    #[structopt(short = "5", long = "load5", help = "Check the 5 minute average")]
    load5: bool,
    #[structopt(short = "L", long = "load15", help = "Check the 15 minute average")]
    load15: bool,
    #[structopt(short = "v", long = "verbose", help = "Log how every window was judged")]
    verbose: bool,
    #[structopt(
        long = "proc-loadavg",
        env = "KSTAT_PROC_LOADAVG",
        default_value = "/proc/loadavg",
        hidden = true
    )]
    proc_loadavg: PathBuf,
    #[structopt(
        long = "proc-stat",
        env = "KSTAT_PROC_STAT",
        default_value = "/proc/stat",
        hidden = true
    )]
    proc_stat: PathBuf,
}

impl Args {
    fn required(&self) -> [bool; 3] {
        let selected = [self.load1, self.load5, self.load15];
        if selected.iter().any(|s| *s) {
            selected
        } else {
            [true; 3]
        }
    }

    /// One threshold set per window
    fn thresholds(&self) -> Result<[ThresholdSet; 3], String> {
        if self.warning.is_none() && self.critical.is_none() {
            return Err("at least one of --warning or --critical is required".to_owned());
        }
        let mut sets = [ThresholdSet::default(); 3];
        for (i, set) in sets.iter_mut().enumerate() {
            let warning = self.warning.map(|w| w.0[i]);
            let critical = self.critical.map(|c| c.0[i]);
            if let (Some(w), Some(c)) = (warning, critical) {
                if w > c {
                    return Err(format!(
                        "{} warning threshold {} is greater than critical threshold {}",
                        WINDOWS[i], w, c
                    ));
                }
            }
            *set = ThresholdSet::new(below(warning)?, below(critical)?);
        }
        Ok(sets)
    }
}

/// `0:limit`, or nothing if there is no limit
fn below(limit: Option<f64>) -> Result<Range, String> {
    match limit {
        Some(limit) => Range::new(0.0, limit, false).map_err(|e| e.to_string()),
        None => Ok(Range::undefined()),
    }
}

/// Load thresholds for the three windows
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
struct LoadLimits([f64; 3]);

impl FromStr for LoadLimits {
    type Err = String;

    fn from_str(s: &str) -> Result<LoadLimits, String> {
        let values = s
            .split(',')
            .map(|v| {
                v.trim()
                    .parse::<f64>()
                    .map_err(|_| format!("invalid load average '{}'", v))
                    .and_then(|v| {
                        if v.is_finite() && v >= 0.0 {
                            Ok(v)
                        } else {
                            Err(format!("load average must be a non-negative number, not {}", v))
                        }
                    })
            })
            .collect::<Result<Vec<f64>, String>>()?;
        match values.as_slice() {
            [all] => Ok(LoadLimits([*all; 3])),
            [one, five, fifteen] => Ok(LoadLimits([*one, *five, *fifteen])),
            _ => Err(format!(
                "expected 1 or 3 comma separated load averages, got '{}'",
                s
            )),
        }
    }
}

impl fmt::Display for LoadLimits {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{},{},{}", self.0[0], self.0[1], self.0[2])
    }
}

fn do_check(args: &Args, actual: LoadAvg, num_cpus: usize) -> (Status, String) {
    let thresholds = match args.thresholds() {
        Ok(thresholds) => thresholds,
        Err(e) => return (Status::Unknown, status_line("LOAD", Status::Unknown, &e, &[])),
    };
    let actual = actual / num_cpus.max(1);
    let required = args.required();

    let metrics = actual
        .values()
        .iter()
        .zip(thresholds.iter())
        .zip(required.iter())
        .map(|((value, set), required)| MetricThreshold::new(*value, *set, *required))
        .collect::<Vec<_>>();
    for (window, metric) in WINDOWS.iter().zip(metrics.iter()) {
        debug!(
            window,
            value = metric.value,
            required = metric.required,
            status = %metric.status(),
            "judged load window"
        );
    }
    let status = evaluate_multi(&metrics);

    let perfdata = WINDOWS
        .iter()
        .zip(metrics.iter())
        .map(|(window, metric)| {
            PerfData::new(*window, format!("{:.2}", metric.value))
                .thresholds(metric.thresholds)
                .min(0.0)
        })
        .collect::<Vec<_>>();
    let cpu_str = if args.per_cpu && num_cpus > 1 {
        format!(" (divided by {} cpus)", num_cpus)
    } else {
        String::new()
    };
    let message = format!("average{}: {}", cpu_str, actual);
    (status, status_line("LOAD", status, &message, &perfdata))
}

#[cfg_attr(test, allow(dead_code))]
fn exit_unknown(e: &dyn fmt::Display) -> ! {
    println!("{}", status_line("LOAD", Status::Unknown, &e.to_string(), &[]));
    Status::Unknown.exit()
}

#[cfg_attr(test, allow(dead_code))]
fn main() {
    let args = Args::from_iter_safe(std::env::args()).unwrap_or_else(|e| usage_error(e));
    logging::init(args.verbose);

    let num_cpus = if args.per_cpu {
        online_cpus(&args.proc_stat).unwrap_or_else(|e| exit_unknown(&e))
    } else {
        1
    };
    let actual = LoadAvg::load(&args.proc_loadavg).unwrap_or_else(|e| exit_unknown(&e));

    let (status, line) = do_check(&args, actual, num_cpus);
    println!("{}", line);
    status.exit();
}
