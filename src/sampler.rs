//! Turn monotonic counters into rates
//!
//! Most kernel statistics (context switches, interrupts, page faults) are
//! counters that only ever go up. To check them against a threshold we read
//! the counter, sleep, read it again and divide the difference by the time
//! slept.

use std::fmt;
use std::thread;
use std::time::Duration;

use serde_derive::Deserialize;
use tracing::{debug, trace};

/// The longest delay between samples that a plugin will accept, in seconds
pub const DELAY_MAX: u64 = 86_400;
/// The most samples that a plugin will take
pub const COUNT_MAX: u32 = 86_400;

/// Something that can produce the current value of a counter
pub trait MetricSource {
    type Error;
    fn read(&mut self) -> Result<u64, Self::Error>;
}

impl<F, E> MetricSource for F
where
    F: FnMut() -> Result<u64, E>,
{
    type Error = E;
    fn read(&mut self) -> Result<u64, E> {
        self()
    }
}

/// Blocks the current thread between samples
pub trait Clock {
    fn sleep(&mut self, period: Duration);
}

/// Actually sleeps
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn sleep(&mut self, period: Duration) {
        thread::sleep(period)
    }
}

/// One value read from a counter, handed to sampling observers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reading {
    /// Which read this was, starting at 0
    pub iteration: u32,
    /// The raw counter value
    pub counter: u64,
    /// Per second change since the previous read, absent for the first one
    pub rate: Option<u64>,
}

enum SamplerState {
    /// About to call `read()`
    AwaitingSample,
    /// Waiting `delay_secs` before the next read
    Sleeping,
}

/// Read `source` `iterations` times, `delay_secs` apart, and return the
/// last per-second rate
///
/// With one iteration (or zero) no rate can be computed and the raw counter
/// value is returned instead; callers should drop any `/s` unit when
/// reporting it.
///
/// Deltas use wrapping subtraction: if the counter resets between two reads
/// the result is a huge bogus rate rather than an error.
///
/// `delay_secs` must be non-zero whenever `iterations > 1`, callers
/// validate it with [`SamplingParams::new`].
pub fn sample_rate<S, C>(
    source: &mut S,
    clock: &mut C,
    delay_secs: u64,
    iterations: u32,
    mut observer: Option<&mut dyn FnMut(Reading)>,
) -> Result<u64, S::Error>
where
    S: MetricSource,
    C: Clock,
{
    debug_assert!(iterations <= 1 || delay_secs > 0, "delay must be positive");
    let iterations = iterations.max(1);
    let mut state = SamplerState::AwaitingSample;
    let mut taken = 0;
    let mut previous: Option<u64> = None;

    let result = loop {
        match state {
            SamplerState::AwaitingSample => {
                let counter = source.read()?;
                let rate = previous.map(|prev| counter.wrapping_sub(prev) / delay_secs);
                trace!(iteration = taken, counter, ?rate, "sampled counter");
                if let Some(observe) = observer.as_mut() {
                    observe(Reading {
                        iteration: taken,
                        counter,
                        rate,
                    });
                }
                previous = Some(counter);
                taken += 1;
                if taken >= iterations {
                    break rate.unwrap_or(counter);
                }
                state = SamplerState::Sleeping;
            }
            SamplerState::Sleeping => {
                clock.sleep(Duration::from_secs(delay_secs));
                state = SamplerState::AwaitingSample;
            }
        }
    };

    debug!(samples = taken, delay_secs, result, "finished sampling");
    Ok(result)
}

/// Read a group of counters twice, `delay_secs` apart, and return how much
/// each one grew
///
/// The deltas are not divided by the delay. Counters are paired up by
/// position; if the two reads return different numbers of counters the
/// extra ones are dropped.
pub fn sample_deltas<F, E, C>(mut read: F, clock: &mut C, delay_secs: u64) -> Result<Vec<u64>, E>
where
    F: FnMut() -> Result<Vec<u64>, E>,
    C: Clock,
{
    let start = read()?;
    clock.sleep(Duration::from_secs(delay_secs));
    let end = read()?;
    Ok(start
        .iter()
        .zip(end.iter())
        .map(|(start, end)| end.wrapping_sub(*start))
        .collect())
}

/// Validated `[delay [count]]` arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SamplingParams {
    pub delay: u64,
    pub count: u32,
}

impl SamplingParams {
    pub fn new(delay: u64, count: u32) -> Result<SamplingParams, SamplingError> {
        if delay == 0 {
            return Err(SamplingError::ZeroDelay);
        }
        if delay > DELAY_MAX {
            return Err(SamplingError::DelayTooLarge(delay));
        }
        if count == 0 {
            return Err(SamplingError::ZeroCount);
        }
        if count > COUNT_MAX {
            return Err(SamplingError::CountTooLarge(count));
        }
        Ok(SamplingParams { delay, count })
    }

    /// `/s` when the result will be a rate, nothing for a raw counter
    pub fn rate_unit(&self) -> &'static str {
        if self.count > 1 {
            "/s"
        } else {
            ""
        }
    }

    /// How long sampling will block for
    pub fn max_runtime(&self) -> Duration {
        Duration::from_secs(self.delay * u64::from(self.count.saturating_sub(1)))
    }
}

impl Default for SamplingParams {
    fn default() -> SamplingParams {
        SamplingParams { delay: 1, count: 2 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingError {
    ZeroDelay,
    DelayTooLarge(u64),
    ZeroCount,
    CountTooLarge(u32),
}

impl fmt::Display for SamplingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use self::SamplingError::*;
        match *self {
            ZeroDelay => f.write_str("delay must be positive integer"),
            DelayTooLarge(delay) => write!(
                f,
                "too large delay value {} (greater than {})",
                delay, DELAY_MAX
            ),
            ZeroCount => f.write_str("count must be positive integer"),
            CountTooLarge(count) => write!(
                f,
                "too large count value {} (greater than {})",
                count, COUNT_MAX
            ),
        }
    }
}

impl std::error::Error for SamplingError {}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use super::*;

    /// Records sleeps instead of performing them
    #[derive(Default)]
    struct FakeClock {
        slept: Vec<Duration>,
    }

    impl Clock for FakeClock {
        fn sleep(&mut self, period: Duration) {
            self.slept.push(period);
        }
    }

    fn scripted(values: Vec<u64>) -> impl FnMut() -> Result<u64, String> {
        let mut values = values.into_iter();
        move || values.next().ok_or_else(|| "ran out of samples".to_owned())
    }

    #[test]
    fn single_sample_is_raw_counter() {
        let mut clock = FakeClock::default();
        let mut source = scripted(vec![13_817_032]);
        let value = sample_rate(&mut source, &mut clock, 1, 1, None).unwrap();
        assert_eq!(value, 13_817_032);
        assert!(clock.slept.is_empty());

        // delay does not matter
        let mut source = scripted(vec![42]);
        assert_eq!(sample_rate(&mut source, &mut clock, 30, 1, None), Ok(42));
        assert!(clock.slept.is_empty());
    }

    #[test]
    fn zero_iterations_reads_once() {
        let mut clock = FakeClock::default();
        let mut source = scripted(vec![7, 100]);
        assert_eq!(sample_rate(&mut source, &mut clock, 1, 0, None), Ok(7));
    }

    #[test]
    fn two_samples_give_rate() {
        let mut clock = FakeClock::default();
        let mut source = scripted(vec![100, 160]);
        let rate = sample_rate(&mut source, &mut clock, 2, 2, None).unwrap();
        assert_eq!(rate, 30);
        assert_eq!(clock.slept, vec![Duration::from_secs(2)]);
    }

    #[test]
    fn returns_last_rate_and_reports_every_reading() {
        let mut clock = FakeClock::default();
        let mut source = scripted(vec![100, 110, 150, 160]);
        let mut seen = vec![];
        let rate = {
            let mut record = |reading: Reading| seen.push(reading);
            sample_rate(&mut source, &mut clock, 1, 4, Some(&mut record)).unwrap()
        };
        assert_eq!(rate, 10);
        assert_eq!(clock.slept.len(), 3);
        assert_eq!(
            seen,
            vec![
                Reading {
                    iteration: 0,
                    counter: 100,
                    rate: None,
                },
                Reading {
                    iteration: 1,
                    counter: 110,
                    rate: Some(10),
                },
                Reading {
                    iteration: 2,
                    counter: 150,
                    rate: Some(40),
                },
                Reading {
                    iteration: 3,
                    counter: 160,
                    rate: Some(10),
                },
            ]
        );
    }

    #[test]
    fn rate_uses_integer_division() {
        let mut clock = FakeClock::default();
        let mut source = scripted(vec![0, 10]);
        assert_eq!(sample_rate(&mut source, &mut clock, 3, 2, None), Ok(3));
    }

    #[test]
    fn counter_reset_wraps() {
        let mut clock = FakeClock::default();
        let mut source = scripted(vec![100, 40]);
        let rate = sample_rate(&mut source, &mut clock, 1, 2, None).unwrap();
        assert_eq!(rate, u64::max_value() - 59);
    }

    #[test]
    fn source_errors_propagate() {
        let mut clock = FakeClock::default();
        let mut source = scripted(vec![100]);
        assert_eq!(
            sample_rate(&mut source, &mut clock, 1, 3, None),
            Err("ran out of samples".to_owned())
        );

        let mut broken = || -> Result<u64, String> { Err("unreadable".to_owned()) };
        assert_eq!(
            sample_rate(&mut broken, &mut clock, 1, 1, None),
            Err("unreadable".to_owned())
        );
    }

    #[test]
    fn deltas_pair_counters_by_position() {
        let mut clock = FakeClock::default();
        let mut reads = vec![vec![10, 20, 30], vec![15, 20, 29]].into_iter();
        let deltas = sample_deltas(
            || reads.next().ok_or("no more reads"),
            &mut clock,
            5,
        )
        .unwrap();
        assert_eq!(deltas, vec![5, 0, u64::max_value()]);
        assert_eq!(clock.slept, vec![Duration::from_secs(5)]);
    }

    #[test]
    fn sampling_params_are_validated() {
        assert_eq!(SamplingParams::new(0, 2), Err(SamplingError::ZeroDelay));
        assert_eq!(
            SamplingParams::new(DELAY_MAX + 1, 2),
            Err(SamplingError::DelayTooLarge(DELAY_MAX + 1))
        );
        assert_eq!(SamplingParams::new(1, 0), Err(SamplingError::ZeroCount));
        assert_eq!(
            SamplingParams::new(1, COUNT_MAX + 1),
            Err(SamplingError::CountTooLarge(COUNT_MAX + 1))
        );
        assert_eq!(
            SamplingParams::new(5, 3),
            Ok(SamplingParams { delay: 5, count: 3 })
        );
    }

    #[test]
    fn rate_unit_and_runtime() {
        let single = SamplingParams::new(10, 1).unwrap();
        assert_eq!(single.rate_unit(), "");
        assert_eq!(single.max_runtime(), Duration::from_secs(0));

        let params = SamplingParams::new(2, 4).unwrap();
        assert_eq!(params.rate_unit(), "/s");
        assert_eq!(params.max_runtime(), Duration::from_secs(6));
        assert_eq!(SamplingParams::default().rate_unit(), "/s");
    }
}
