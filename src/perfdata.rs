//! The single line of output every plugin prints
//!
//! ```text
//! CSWCH OK - number of context switches/s 1520 | cswch/s=1520;5000;10000
//! ```
//!
//! Everything after the `|` is performance data: space separated
//! `label=value[unit];[warn];[crit];[min];[max]` items that graphing
//! systems pick up.

use std::fmt;

use itertools::Itertools;

use crate::range::ThresholdSet;
use crate::Status;

/// One performance data item
#[derive(Debug, Clone, PartialEq)]
pub struct PerfData {
    label: String,
    value: String,
    unit: String,
    thresholds: ThresholdSet,
    min: Option<f64>,
    max: Option<f64>,
}

impl PerfData {
    pub fn new<L, V>(label: L, value: V) -> PerfData
    where
        L: Into<String>,
        V: fmt::Display,
    {
        PerfData {
            label: label.into(),
            value: value.to_string(),
            unit: String::new(),
            thresholds: ThresholdSet::default(),
            min: None,
            max: None,
        }
    }

    pub fn unit<U: Into<String>>(mut self, unit: U) -> PerfData {
        self.unit = unit.into();
        self
    }

    pub fn thresholds(mut self, thresholds: ThresholdSet) -> PerfData {
        self.thresholds = thresholds;
        self
    }

    pub fn min(mut self, min: f64) -> PerfData {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> PerfData {
        self.max = Some(max);
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    fn write_label(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.label.contains(|c: char| c == ' ' || c == '=' || c == '\'') {
            write!(f, "'{}'", self.label.replace('\'', "''"))
        } else {
            f.write_str(&self.label)
        }
    }
}

impl fmt::Display for PerfData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.write_label(f)?;
        write!(f, "={}{}", self.value, self.unit)?;

        let has_limits = self.min.is_some() || self.max.is_some();
        if self.thresholds.is_defined() || has_limits {
            write!(
                f,
                ";{};{}",
                self.thresholds.warning, self.thresholds.critical
            )?;
        }
        if has_limits {
            let limit = |l: Option<f64>| l.map(|l| l.to_string()).unwrap_or_default();
            write!(f, ";{};{}", limit(self.min), limit(self.max))?;
        }
        Ok(())
    }
}

/// Build the full plugin output line
///
/// The `|` separator is only added when there is performance data to
/// follow it.
pub fn status_line(program: &str, status: Status, message: &str, perfdata: &[PerfData]) -> String {
    if perfdata.is_empty() {
        format!("{} {} - {}", program, status, message)
    } else {
        format!(
            "{} {} - {} | {}",
            program,
            status,
            message,
            perfdata.iter().join(" ")
        )
    }
}
