//! Check the number of interrupts per second
//!
//! The first number on the `intr` line of `/proc/stat` is the total of all
//! interrupts serviced since boot, numbered and unnumbered. It is sampled
//! the same way as the context switch counter.

use serde_derive::Deserialize;
use structopt::StructOpt;

use kstat_plugins::check::{CounterArgs, INTERRUPTS};
use kstat_plugins::procfs::StatCounter;
use kstat_plugins::sampler::SystemClock;
use kstat_plugins::{logging, usage_error};

/// Check the number of interrupts per second
///
/// With a count of 1 the raw counter since boot is checked instead of a
/// rate.
#[derive(Deserialize, Debug, StructOpt)]
#[structopt(
    name = "check-intr (part of kstat-plugins)",
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

    let mut source = StatCounter::new(&args.counter.proc_stat, INTERRUPTS.key);
    let (status, line) = INTERRUPTS.run(&args.counter, &mut source, &mut SystemClock);
    println!("{}", line);
    status.exit();
}
