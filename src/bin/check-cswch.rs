//! Check the number of context switches per second
//!
//! The kernel counts context switches across all CPUs in the `ctxt` line of
//! `/proc/stat`. The counter is read `count` times, `delay` seconds apart,
//! and the last per-second rate is checked.

use serde_derive::Deserialize;
use structopt::StructOpt;

use kstat_plugins::check::{CounterArgs, CONTEXT_SWITCHES};
use kstat_plugins::procfs::StatCounter;
use kstat_plugins::sampler::SystemClock;
use kstat_plugins::{logging, usage_error};

/// Check the number of context switches per second
///
/// With a count of 1 the raw counter since boot is checked instead of a
/// rate.
#[derive(Deserialize, Debug, StructOpt)]
#[structopt(
    name = "check-cswch (part of kstat-plugins)",
    setting = structopt::clap::AppSettings::ColoredHelp
)]
struct Args {
    #[structopt(flatten)]
    counter: CounterArgs,
}

#[cfg_attr(test, allow(dead_code))]
fn main() {
    let args = Args::from_iter_safe(std::env::args()).unwrap_or_else(|e| usage_error(e));
    logging::init(args.counter.verbose);

    let mut source = StatCounter::new(&args.counter.proc_stat, CONTEXT_SWITCHES.key);
    let (status, line) = CONTEXT_SWITCHES.run(&args.counter, &mut source, &mut SystemClock);
    println!("{}", line);
    status.exit();
}
