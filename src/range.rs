//! Nagios threshold ranges
//!
//! Operators describe thresholds with the syntax shared by most monitoring
//! plugins:
//!
//! | spec       | alert when the value is  |
//! |------------|--------------------------|
//! | `10`       | `< 0` or `> 10`          |
//! | `10:`      | `< 10`                   |
//! | `~:10`     | `> 10`                   |
//! | `10:20`    | `< 10` or `> 20`         |
//! | `@10:20`   | `>= 10` and `<= 20`      |
//!
//! A plain range names the band of acceptable values, a leading `@` flips it
//! so that it names the band that alerts.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::Status;

/// A value to check against a range
///
/// Counters stay integers so that they compare exactly against integer
/// bounds, however large they get.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Measurement {
    Int(i128),
    Real(f64),
}

impl From<u64> for Measurement {
    fn from(value: u64) -> Measurement {
        Measurement::Int(i128::from(value))
    }
}

impl From<i64> for Measurement {
    fn from(value: i64) -> Measurement {
        Measurement::Int(i128::from(value))
    }
}

impl From<f64> for Measurement {
    fn from(value: f64) -> Measurement {
        Measurement::Real(value)
    }
}

impl PartialOrd for Measurement {
    fn partial_cmp(&self, other: &Measurement) -> Option<Ordering> {
        use self::Measurement::*;
        match (*self, *other) {
            (Int(a), Int(b)) => Some(a.cmp(&b)),
            (Real(a), Real(b)) => a.partial_cmp(&b),
            (Int(a), Real(b)) => cmp_int_real(a, b),
            (Real(a), Int(b)) => cmp_int_real(b, a).map(Ordering::reverse),
        }
    }
}

/// Exact comparison, without rounding `int` to the nearest float
fn cmp_int_real(int: i128, real: f64) -> Option<Ordering> {
    if real.is_nan() {
        return None;
    }
    let floor = real.floor();
    // saturates for infinities and anything beyond i128
    let whole = floor as i128;
    Some(match int.cmp(&whole) {
        Ordering::Equal if real > floor || real == f64::INFINITY => Ordering::Less,
        Ordering::Equal if real == f64::NEG_INFINITY => Ordering::Greater,
        ord => ord,
    })
}

/// One end of a range
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    /// `~`
    NegInf,
    /// Parsed from a threshold argument
    Int(i64),
    /// Built programmatically, e.g. for load averages
    Real(f64),
    /// An empty end
    PosInf,
}

impl Bound {
    fn from_f64(value: f64) -> Bound {
        if value == f64::NEG_INFINITY {
            Bound::NegInf
        } else if value == f64::INFINITY {
            Bound::PosInf
        } else {
            Bound::Real(value)
        }
    }

    fn measurement(self) -> Measurement {
        match self {
            Bound::NegInf => Measurement::Real(f64::NEG_INFINITY),
            Bound::Int(n) => Measurement::from(n),
            Bound::Real(r) => Measurement::Real(r),
            Bound::PosInf => Measurement::Real(f64::INFINITY),
        }
    }

    fn is_zero(self) -> bool {
        match self {
            Bound::Int(n) => n == 0,
            Bound::Real(r) => r == 0.0,
            _ => false,
        }
    }
}

impl PartialOrd for Bound {
    fn partial_cmp(&self, other: &Bound) -> Option<Ordering> {
        self.measurement().partial_cmp(&other.measurement())
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Bound::NegInf => f.write_str("~"),
            Bound::Int(n) => write!(f, "{}", n),
            Bound::Real(r) => write!(f, "{}", r),
            Bound::PosInf => Ok(()),
        }
    }
}

/// One threshold boundary
///
/// Ranges parsed from text always have exact integer bounds; [`Range::new`]
/// accepts fractional ones for checks like load averages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    start: Bound,
    end: Bound,
    inverted: bool,
    defined: bool,
}

impl Range {
    /// A range that was never configured
    ///
    /// It contains every value, and [`evaluate_single`] ignores it.
    pub fn undefined() -> Range {
        Range {
            start: Bound::NegInf,
            end: Bound::PosInf,
            inverted: false,
            defined: false,
        }
    }

    /// Build a range from explicit bounds
    pub fn new(start: f64, end: f64, inverted: bool) -> Result<Range, RangeError> {
        if start.is_nan() || end.is_nan() {
            return Err(RangeError::InvalidNumber(format!("{}:{}", start, end)));
        }
        Range::from_bounds(Bound::from_f64(start), Bound::from_f64(end), inverted)
            .ok_or_else(|| RangeError::Reversed(format!("{}:{}", start, end)))
    }

    fn from_bounds(start: Bound, end: Bound, inverted: bool) -> Option<Range> {
        if start > end {
            return None;
        }
        Some(Range {
            start,
            end,
            inverted,
            defined: true,
        })
    }

    /// `~:limit`, alert whenever the value goes above `limit`
    pub fn at_most(limit: f64) -> Result<Range, RangeError> {
        Range::new(f64::NEG_INFINITY, limit, false)
    }

    pub fn start(&self) -> Bound {
        self.start
    }

    pub fn end(&self) -> Bound {
        self.end
    }

    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    pub fn is_defined(&self) -> bool {
        self.defined
    }

    /// Whether `value` is in the non-alerting part of this range
    ///
    /// For a plain range that is the band itself, for an inverted (`@`)
    /// range it is everything outside the band.
    pub fn contains<V: Into<Measurement>>(&self, value: V) -> bool {
        if !self.defined {
            return true;
        }
        let value = value.into();
        let start = self.start.measurement();
        let end = self.end.measurement();
        if self.inverted {
            value < start || value > end
        } else {
            start <= value && value <= end
        }
    }
}

impl Default for Range {
    fn default() -> Range {
        Range::undefined()
    }
}

impl FromStr for Range {
    type Err = RangeError;
    fn from_str(spec: &str) -> Result<Range, RangeError> {
        parse_range(spec)
    }
}

/// Renders the canonical threshold syntax, suitable for perfdata
impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if !self.defined {
            return Ok(());
        }
        if self.inverted {
            f.write_str("@")?;
        }
        if self.start.is_zero() && self.end != Bound::PosInf {
            return write!(f, "{}", self.end);
        }
        write!(f, "{}:{}", self.start, self.end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    /// Nothing (or only `@`) was given
    Empty(String),
    /// The part before `:` is neither `~` nor an integer
    InvalidStart(String),
    /// The part after `:` is not an integer
    InvalidEnd(String),
    /// A spec without `:` is not an integer
    InvalidNumber(String),
    /// The start of the range is greater than its end
    Reversed(String),
}

impl fmt::Display for RangeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use self::RangeError::*;
        match *self {
            Empty(ref spec) => write!(f, "empty threshold '{}'", spec),
            InvalidStart(ref field) => write!(
                f,
                "expected '~' or an integer before ':', found '{}'",
                field
            ),
            InvalidEnd(ref field) => write!(
                f,
                "expected an integer or nothing after ':', found '{}'",
                field
            ),
            InvalidNumber(ref field) => write!(f, "expected an integer, found '{}'", field),
            Reversed(ref spec) => write!(f, "start of range is greater than its end in '{}'", spec),
        }
    }
}

impl std::error::Error for RangeError {}

/// Parse a `[@]start:end`, `[@]~:end`, `[@]start:` or `[@]N` threshold
pub fn parse_range(spec: &str) -> Result<Range, RangeError> {
    let (inverted, body) = match spec.strip_prefix('@') {
        Some(rest) => (true, rest),
        None => (false, spec),
    };
    if body.is_empty() {
        return Err(RangeError::Empty(spec.to_owned()));
    }

    let (start, end) = match body.find(':') {
        Some(delim) => {
            let (lhs, rhs) = (&body[..delim], &body[delim + 1..]);
            let start = if lhs == "~" {
                Bound::NegInf
            } else {
                parse_int(lhs).ok_or_else(|| RangeError::InvalidStart(lhs.to_owned()))?
            };
            let end = if rhs.is_empty() {
                Bound::PosInf
            } else {
                parse_int(rhs).ok_or_else(|| RangeError::InvalidEnd(rhs.to_owned()))?
            };
            (start, end)
        }
        None => {
            let end = parse_int(body).ok_or_else(|| RangeError::InvalidNumber(body.to_owned()))?;
            (Bound::Int(0), end)
        }
    };

    Range::from_bounds(start, end, inverted).ok_or_else(|| RangeError::Reversed(spec.to_owned()))
}

/// An optionally signed base 10 integer, nothing else
fn parse_int(field: &str) -> Option<Bound> {
    field.parse::<i64>().ok().map(Bound::Int)
}

/// The warning and critical ranges for one metric
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ThresholdSet {
    pub warning: Range,
    pub critical: Range,
}

impl ThresholdSet {
    pub fn new(warning: Range, critical: Range) -> ThresholdSet {
        ThresholdSet { warning, critical }
    }

    /// Parse the `-w`/`-c` pair, either of which may be absent
    pub fn from_args(
        warning: Option<&str>,
        critical: Option<&str>,
    ) -> Result<ThresholdSet, RangeError> {
        let parse = |spec: Option<&str>| spec.map(parse_range).unwrap_or_else(|| Ok(Range::undefined()));
        Ok(ThresholdSet {
            warning: parse(warning)?,
            critical: parse(critical)?,
        })
    }

    pub fn is_defined(&self) -> bool {
        self.warning.is_defined() || self.critical.is_defined()
    }

    pub fn evaluate<V: Into<Measurement>>(&self, value: V) -> Status {
        evaluate_single(value, self)
    }
}

/// Decide the status of a single value
///
/// Critical always wins over warning. With no thresholds at all there is
/// nothing to compare against, so the answer is `Unknown`.
pub fn evaluate_single<V: Into<Measurement>>(value: V, thresholds: &ThresholdSet) -> Status {
    let value = value.into();
    let ThresholdSet { warning, critical } = *thresholds;
    if !warning.is_defined() && !critical.is_defined() {
        Status::Unknown
    } else if critical.is_defined() && !critical.contains(value) {
        Status::Critical
    } else if warning.is_defined() && !warning.contains(value) {
        Status::Warning
    } else {
        Status::Ok
    }
}

/// One of several related values reported by a single check
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricThreshold {
    pub value: f64,
    pub thresholds: ThresholdSet,
    /// Optional metrics are reported but never change the overall status
    pub required: bool,
}

impl MetricThreshold {
    pub fn new(value: f64, thresholds: ThresholdSet, required: bool) -> MetricThreshold {
        MetricThreshold {
            value,
            thresholds,
            required,
        }
    }

    /// This metric's own status, regardless of whether it is required
    pub fn status(&self) -> Status {
        evaluate_single(self.value, &self.thresholds)
    }
}

/// The worst status among the required metrics
///
/// A required metric without any thresholds opts out instead of making the
/// whole check `Unknown`, and a check with no required metrics is `Ok`.
pub fn evaluate_multi(metrics: &[MetricThreshold]) -> Status {
    metrics
        .iter()
        .filter(|metric| metric.required)
        .map(|metric| match metric.status() {
            Status::Unknown => Status::Ok,
            status => status,
        })
        .max()
        .unwrap_or(Status::Ok)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Status;

    fn r(spec: &str) -> Range {
        parse_range(spec).unwrap()
    }

    fn thresholds(warning: &str, critical: &str) -> ThresholdSet {
        ThresholdSet::from_args(Some(warning), Some(critical)).unwrap()
    }

    #[test]
    fn single_value_is_zero_to_n() {
        let range = r("10");
        assert_eq!((range.start(), range.end()), (Bound::Int(0), Bound::Int(10)));
        assert!(!range.is_inverted());
        assert!(range.is_defined());
        assert!(range.contains(0.0));
        assert!(range.contains(10.0));
        assert!(!range.contains(-1.0));
        assert!(!range.contains(11.0));
    }

    #[test]
    fn open_upper_bound() {
        let range = r("10:");
        assert_eq!(range.end(), Bound::PosInf);
        assert!(!range.contains(9.0));
        assert!(range.contains(10.0));
        assert!(range.contains(1e18));
    }

    #[test]
    fn open_lower_bound() {
        let range = r("~:10");
        assert_eq!(range.start(), Bound::NegInf);
        assert!(range.contains(-1e18));
        assert!(range.contains(10.0));
        assert!(!range.contains(11.0));
    }

    #[test]
    fn closed_range() {
        let range = r("5:10");
        assert!(!range.contains(4.0));
        assert!(range.contains(5.0));
        assert!(range.contains(7.0));
        assert!(range.contains(10.0));
        assert!(!range.contains(11.0));
    }

    #[test]
    fn inverted_range_alerts_inside() {
        let range = r("@5:10");
        assert!(range.is_inverted());
        assert!(range.contains(4.0));
        assert!(!range.contains(5.0));
        assert!(!range.contains(10.0));
        assert!(range.contains(11.0));

        let range = r("@~:10");
        assert!(!range.contains(-100.0));
        assert!(!range.contains(10.0));
        assert!(range.contains(10.5));
    }

    #[test]
    fn signed_bounds() {
        let range = r("-10:-5");
        assert!(range.contains(-7.0));
        assert!(!range.contains(0.0));
        assert_eq!(r("+3:+5"), r("3:5"));
    }

    #[test]
    fn everything_range() {
        let range = r("~:");
        assert!(range.contains(f64::NEG_INFINITY));
        assert!(range.contains(0.0));
        assert!(range.contains(f64::INFINITY));
    }

    #[test]
    fn rejects_malformed_specs() {
        assert_eq!(parse_range(""), Err(RangeError::Empty("".to_owned())));
        assert_eq!(parse_range("@"), Err(RangeError::Empty("@".to_owned())));
        assert_eq!(
            parse_range(":10"),
            Err(RangeError::InvalidStart("".to_owned()))
        );
        assert_eq!(
            parse_range("10:5"),
            Err(RangeError::Reversed("10:5".to_owned()))
        );
        assert_eq!(
            parse_range("10a"),
            Err(RangeError::InvalidNumber("10a".to_owned()))
        );
        assert_eq!(
            parse_range("a:10"),
            Err(RangeError::InvalidStart("a".to_owned()))
        );
    }

    #[test]
    fn rejects_trailing_and_embedded_garbage() {
        assert!(parse_range("5:10x").is_err());
        assert!(parse_range("5 :10").is_err());
        assert!(parse_range(" 5").is_err());
        assert!(parse_range("1:2:3").is_err());
        assert!(parse_range("~").is_err());
        assert!(parse_range("@@5").is_err());
        assert!(parse_range("1.5").is_err());
        // N is shorthand for 0:N, so a negative N can never be valid
        assert_eq!(
            parse_range("-5"),
            Err(RangeError::Reversed("-5".to_owned()))
        );
    }

    #[test]
    fn display_is_canonical() {
        for spec in &["10", "@10", "10:", "~:10", "5:10", "@5:10", "@~:10", "-5:-1", "~:"] {
            assert_eq!(&r(spec).to_string(), spec);
        }
        assert_eq!(Range::undefined().to_string(), "");
        assert_eq!(Range::at_most(1.5).unwrap().to_string(), "~:1.5");
        assert_eq!(Range::new(0.0, 3.5, false).unwrap().to_string(), "3.5");
    }

    #[test]
    fn large_bounds_stay_exact() {
        // 2^53 + 1 and 2^53 are the same f64
        assert_eq!(
            parse_range("9007199254740993:9007199254740992"),
            Err(RangeError::Reversed(
                "9007199254740993:9007199254740992".to_owned()
            ))
        );
        let range = r("9007199254740992:9007199254740993");
        assert_eq!(range.start(), Bound::Int(9_007_199_254_740_992));
        assert_eq!(range.end(), Bound::Int(9_007_199_254_740_993));

        for spec in &["9223372036854775807", "-9223372036854775808:", "@1:9223372036854775807"] {
            assert_eq!(&r(spec).to_string(), spec);
        }
    }

    #[test]
    fn large_counters_compare_exactly() {
        let set = ThresholdSet::from_args(None, Some("9007199254740992")).unwrap();
        assert_eq!(evaluate_single(9_007_199_254_740_992u64, &set), Status::Ok);
        assert_eq!(
            evaluate_single(9_007_199_254_740_993u64, &set),
            Status::Critical
        );

        let range = r("~:9223372036854775807");
        assert!(range.contains(i64::max_value()));
        assert!(!range.contains(u64::max_value()));
        assert!(r("0:").contains(u64::max_value()));
    }

    #[test]
    fn integers_compare_exactly_against_fractional_bounds() {
        let range = Range::new(0.0, 2.5, false).unwrap();
        assert!(range.contains(2u64));
        assert!(!range.contains(3u64));
        assert!(range.contains(2.5));

        let range = Range::new(9_007_199_254_740_992.0, f64::INFINITY, true).unwrap();
        assert!(range.contains(9_007_199_254_740_991u64));
        assert!(!range.contains(9_007_199_254_740_993u64));
        assert!(!range.contains(u64::max_value()));
        assert!(!Range::at_most(1.0).unwrap().contains(f64::NAN));
    }

    #[test]
    fn new_enforces_invariant() {
        assert!(Range::new(2.0, 1.0, false).is_err());
        assert!(Range::new(f64::NAN, 1.0, false).is_err());
        assert!(Range::new(1.0, 1.0, true).is_ok());
    }

    #[test]
    fn undefined_range_contains_everything() {
        let range = Range::undefined();
        assert!(!range.is_defined());
        assert!(range.contains(-1e300));
        assert!(range.contains(1e300));
    }

    #[test]
    fn critical_beats_warning() {
        let set = thresholds("10", "20");
        assert_eq!(evaluate_single(5.0, &set), Status::Ok);
        assert_eq!(evaluate_single(15.0, &set), Status::Warning);
        assert_eq!(evaluate_single(25.0, &set), Status::Critical);

        // a value outside both is critical even if the ranges are nested oddly
        let set = thresholds("~:5", "~:50");
        assert_eq!(evaluate_single(100.0, &set), Status::Critical);
        let set = thresholds("@0:100", "@50:60");
        assert_eq!(evaluate_single(55.0, &set), Status::Critical);
    }

    #[test]
    fn only_one_threshold_defined() {
        let set = ThresholdSet::from_args(None, Some("10")).unwrap();
        assert_eq!(evaluate_single(5.0, &set), Status::Ok);
        assert_eq!(evaluate_single(11.0, &set), Status::Critical);

        let set = ThresholdSet::from_args(Some("10"), None).unwrap();
        assert_eq!(evaluate_single(11.0, &set), Status::Warning);
    }

    #[test]
    fn unknown_when_unset() {
        let set = ThresholdSet::default();
        assert!(!set.is_defined());
        for value in &[f64::NEG_INFINITY, -1.0, 0.0, 1.0, 1e18, f64::INFINITY] {
            assert_eq!(evaluate_single(*value, &set), Status::Unknown);
        }
    }

    #[test]
    fn from_args_fails_on_first_bad_range() {
        assert_eq!(
            ThresholdSet::from_args(Some("10:5"), Some("x")),
            Err(RangeError::Reversed("10:5".to_owned()))
        );
        assert_eq!(
            ThresholdSet::from_args(Some("10"), Some("x")),
            Err(RangeError::InvalidNumber("x".to_owned()))
        );
    }

    fn load(value: f64, warn: f64, crit: f64, required: bool) -> MetricThreshold {
        MetricThreshold::new(
            value,
            ThresholdSet::new(Range::at_most(warn).unwrap(), Range::at_most(crit).unwrap()),
            required,
        )
    }

    #[test]
    fn multi_metric_takes_worst_required() {
        let loads = [
            load(2.8, 3.0, 4.0, true),
            load(1.9, 1.5, 4.0, true),
            load(1.3, 1.5, 4.0, true),
        ];
        assert_eq!(evaluate_multi(&loads), Status::Warning);

        let loads = [
            load(2.8, 1.0, 3.0, true),
            load(1.9, 2.0, 3.0, true),
            load(5.5, 2.0, 4.0, true),
        ];
        assert_eq!(evaluate_multi(&loads), Status::Critical);
    }

    #[test]
    fn optional_metrics_do_not_escalate() {
        let loads = [
            load(2.8, 3.0, 4.0, true),
            load(1.9, 1.5, 4.0, false),
            load(1.3, 1.5, 4.0, true),
        ];
        assert_eq!(evaluate_multi(&loads), Status::Ok);
        // but the breach is still visible on the metric itself
        assert_eq!(loads[1].status(), Status::Warning);
    }

    #[test]
    fn multi_metric_without_required_is_ok() {
        let loads = [load(100.0, 1.0, 2.0, false), load(100.0, 1.0, 2.0, false)];
        assert_eq!(evaluate_multi(&loads), Status::Ok);
        assert_eq!(evaluate_multi(&[]), Status::Ok);
    }

    #[test]
    fn multi_metric_ignores_unconfigured_metrics() {
        let metrics = [
            MetricThreshold::new(1e9, ThresholdSet::default(), true),
            load(1.0, 2.0, 3.0, true),
        ];
        assert_eq!(evaluate_multi(&metrics), Status::Ok);
        assert_eq!(metrics[0].status(), Status::Unknown);
    }
}
