//! Kstat Plugins: Nagios-compatible checks built on a shared threshold engine
//!
//! Every check in this crate follows the same shape: turn the operator's
//! `-w`/`-c` arguments into [`range::ThresholdSet`]s, sample a value (either
//! a single gauge reading or a counter rate via [`sampler::sample_rate`]),
//! evaluate it and exit with the matching [`Status`].
//!
//! ```rust
//! use kstat_plugins::range::{evaluate_single, ThresholdSet};
//! use kstat_plugins::Status;
//!
//! let thresholds = ThresholdSet::from_args(Some("10"), Some("20")).unwrap();
//! assert_eq!(evaluate_single(15.0, &thresholds), Status::Warning);
//! ```
//!
//! See the [`scripts`] module for the command line interface of each
//! plugin.

use std::fmt;
use std::process;
use std::str::FromStr;

use serde_derive::Deserialize;
use structopt::clap;

pub mod check;
pub mod container;
pub mod logging;
pub mod perfdata;
pub mod procfs;
pub mod range;
pub mod sampler;
pub mod scripts;

/// The outcome of a check
///
/// Variants are declared in exit-code order, so the derived ordering is the
/// one monitoring systems use when several results are combined: `Unknown`
/// outranks everything, then `Critical > Warning > Ok`.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Warning,
    Critical,
    Unknown,
}

impl Status {
    /// The process exit code that Nagios-compatible systems expect
    pub fn code(self) -> i32 {
        match self {
            Status::Ok => 0,
            Status::Warning => 1,
            Status::Critical => 2,
            Status::Unknown => 3,
        }
    }

    #[cfg_attr(test, allow(dead_code))]
    pub fn exit(self) -> ! {
        process::exit(self.code())
    }

    pub fn str_values() -> [&'static str; 4] {
        ["ok", "warning", "critical", "unknown"]
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match *self {
            Status::Ok => "OK",
            Status::Warning => "WARNING",
            Status::Critical => "CRITICAL",
            Status::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct InvalidStatus(String);

impl fmt::Display for InvalidStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Unexpected status '{}', expected one of: {}",
            self.0,
            Status::str_values().join(", ")
        )
    }
}

impl std::error::Error for InvalidStatus {}

impl FromStr for Status {
    type Err = InvalidStatus;
    fn from_str(s: &str) -> Result<Status, InvalidStatus> {
        match s.to_lowercase().as_ref() {
            "ok" => Ok(Status::Ok),
            "warn" | "warning" => Ok(Status::Warning),
            "critical" => Ok(Status::Critical),
            "unknown" => Ok(Status::Unknown),
            _ => Err(InvalidStatus(s.to_owned())),
        }
    }
}

/// Handle a command line parsing failure the way monitoring systems expect
///
/// `--help` and `--version` exit successfully, anything else is reported on
/// stdout and exits `UNKNOWN` (clap's own exit code would read as WARNING).
pub fn usage_error(err: clap::Error) -> ! {
    match err.kind {
        clap::ErrorKind::HelpDisplayed | clap::ErrorKind::VersionDisplayed => err.exit(),
        _ => {
            println!("{}", err.message);
            Status::Unknown.exit()
        }
    }
}

#[cfg(test)]
mod test {
    use super::Status;

    #[test]
    fn exit_codes_match_nagios() {
        assert_eq!(Status::Ok.code(), 0);
        assert_eq!(Status::Warning.code(), 1);
        assert_eq!(Status::Critical.code(), 2);
        assert_eq!(Status::Unknown.code(), 3);
    }

    #[test]
    fn state_text() {
        assert_eq!(Status::Ok.to_string(), "OK");
        assert_eq!(Status::Warning.to_string(), "WARNING");
        assert_eq!(Status::Critical.to_string(), "CRITICAL");
        assert_eq!(Status::Unknown.to_string(), "UNKNOWN");
    }

    #[test]
    fn ordering_follows_exit_codes() {
        assert!(Status::Critical > Status::Warning);
        assert!(Status::Warning > Status::Ok);
        assert!(Status::Unknown > Status::Critical);
        assert_eq!(
            vec![Status::Ok, Status::Critical, Status::Warning]
                .into_iter()
                .max(),
            Some(Status::Critical)
        );
    }

    #[test]
    fn can_parse_from_str() {
        for value in Status::str_values().iter() {
            value.parse::<Status>().unwrap();
        }
        assert_eq!("warn".parse::<Status>(), Ok(Status::Warning));
        assert_eq!("CRITICAL".parse::<Status>(), Ok(Status::Critical));
        assert!("dependent".parse::<Status>().is_err());
    }
}
