//! Monotonic elapsed-time clock.
//!
//! A stopwatch with an epoch captured by `start()` and a sample instant
//! captured by `stop()`; `elapsed_micros()` is the distance between them.

use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::scheduler::Event;

/// Upper bound on back-to-back reads while waiting for the clock to tick.
const CALIBRATION_READS: u32 = 1_000_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClockError {
    #[error("monotonic clock did not advance after {0} reads")]
    Stalled(u32),
}

/// Elapsed-time source used by the reporting loop.
///
/// `start()` must be called before `elapsed_micros()` is meaningful.
pub trait Clock {
    /// Records the current instant as the reference epoch.
    fn start(&mut self);
    /// Records the current instant as the latest sample.
    fn stop(&mut self);
    /// Microseconds between the epoch and the latest sample.
    fn elapsed_micros(&self) -> i64;
}

/// [`Clock`] backed by [`std::time::Instant`].
#[derive(Debug, Clone, Copy)]
pub struct StopWatch {
    epoch: Option<Instant>,
    sample: Option<Instant>,
}

impl StopWatch {
    pub fn new() -> Self {
        Self {
            epoch: None,
            sample: None,
        }
    }

    /// Measures the smallest step the monotonic clock can resolve.
    ///
    /// Fails if the clock never moves, which leaves the monitor unable to
    /// stamp intervals.
    pub fn calibrate() -> Result<Duration, ClockError> {
        let first = Instant::now();
        for _ in 0..CALIBRATION_READS {
            let step = Instant::now().duration_since(first);
            if !step.is_zero() {
                return Ok(step);
            }
        }
        Err(ClockError::Stalled(CALIBRATION_READS))
    }
}

impl Default for StopWatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for StopWatch {
    fn start(&mut self) {
        let now = Instant::now();
        self.epoch = Some(now);
        self.sample = Some(now);
    }

    fn stop(&mut self) {
        self.sample = Some(Instant::now());
    }

    fn elapsed_micros(&self) -> i64 {
        match (self.epoch, self.sample) {
            (Some(epoch), Some(sample)) => {
                i64::try_from(sample.duration_since(epoch).as_micros()).unwrap_or(i64::MAX)
            }
            _ => 0,
        }
    }
}

/// Whole seconds the monitor has been alive.
///
/// The `+ 0.01` absorbs timer granularity so a firing that lands a few
/// microseconds early still reports the full second.
pub fn time_alive_secs(elapsed_micros: i64) -> u64 {
    let secs = (elapsed_micros as f64 / 1_000_000.0 + 0.01).floor();
    if secs <= 0.0 { 0 } else { secs as u64 }
}

/// Outcome of the startup clock self-test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelfTest {
    /// Measured length of the wait, in microseconds.
    Measured(i64),
    /// A shutdown request arrived during the wait.
    Interrupted,
}

/// Sleeps for `wait` and reports how long that actually took.
///
/// The wait is a receive on the event channel, so a termination signal
/// cuts it short instead of being held back until the sleep ends.
pub fn self_test(wait: Duration, events: &Receiver<Event>) -> SelfTest {
    let before = Instant::now();
    let deadline = before + wait;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match events.recv_timeout(remaining) {
            Ok(Event::Shutdown) => return SelfTest::Interrupted,
            // Nothing arms the timer before the self-test runs.
            Ok(Event::Tick) => continue,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    if Instant::now() < deadline {
        std::thread::sleep(deadline.saturating_duration_since(Instant::now()));
    }
    let micros = i64::try_from(before.elapsed().as_micros()).unwrap_or(i64::MAX);
    SelfTest::Measured(micros)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::mpsc;

    /// Clock whose readings are set by hand, optionally moving forward by
    /// `step_micros` on every `stop()`.
    #[derive(Debug, Default)]
    pub(crate) struct ManualClock {
        pub now_micros: i64,
        pub step_micros: i64,
        epoch: i64,
        sample: i64,
    }

    impl ManualClock {
        pub(crate) fn stepping(step_micros: i64) -> Self {
            Self {
                step_micros,
                ..Self::default()
            }
        }
    }

    impl Clock for ManualClock {
        fn start(&mut self) {
            self.epoch = self.now_micros;
            self.sample = self.now_micros;
        }

        fn stop(&mut self) {
            self.now_micros += self.step_micros;
            self.sample = self.now_micros;
        }

        fn elapsed_micros(&self) -> i64 {
            self.sample - self.epoch
        }
    }

    #[test]
    fn stopwatch_is_non_decreasing() {
        let mut sw = StopWatch::new();
        sw.start();
        let mut last = sw.elapsed_micros();
        assert_eq!(last, 0);
        for _ in 0..1000 {
            sw.stop();
            let now = sw.elapsed_micros();
            assert!(now >= last);
            last = now;
        }
    }

    #[test]
    fn stopwatch_measures_sleep() {
        let mut sw = StopWatch::new();
        sw.start();
        std::thread::sleep(Duration::from_millis(20));
        sw.stop();
        assert!(sw.elapsed_micros() >= 20_000);
    }

    #[test]
    fn calibrate_finds_a_step() {
        let step = StopWatch::calibrate().unwrap();
        assert!(!step.is_zero());
        assert!(step < Duration::from_millis(100));
    }

    #[test]
    fn time_alive_rounds_early_firings_up() {
        assert_eq!(time_alive_secs(0), 0);
        assert_eq!(time_alive_secs(1_999_950), 2);
        assert_eq!(time_alive_secs(2_000_000), 2);
        assert_eq!(time_alive_secs(2_500_000), 2);
        assert_eq!(time_alive_secs(2_989_000), 2);
        assert_eq!(time_alive_secs(-5), 0);
    }

    #[test]
    fn time_alive_monotonic_over_firings() {
        let mut clock = ManualClock::default();
        clock.start();
        let mut last = 0;
        for n in 1..=50 {
            // firings jitter a few hundred microseconds either side of 2s
            let jitter = if n % 2 == 0 { -300 } else { 400 };
            clock.now_micros = n * 2_000_000 + jitter;
            clock.stop();
            let alive = time_alive_secs(clock.elapsed_micros());
            assert!(alive >= last);
            assert_eq!(alive, (n * 2) as u64);
            last = alive;
        }
    }

    #[test]
    fn self_test_measures_wait() {
        let (_tx, rx) = mpsc::channel();
        match self_test(Duration::from_millis(30), &rx) {
            SelfTest::Measured(us) => assert!(us >= 30_000),
            SelfTest::Interrupted => panic!("no shutdown was sent"),
        }
    }

    #[test]
    fn self_test_interrupted_by_shutdown() {
        let (tx, rx) = mpsc::channel();
        tx.send(Event::Shutdown).unwrap();
        assert_eq!(
            self_test(Duration::from_secs(10), &rx),
            SelfTest::Interrupted
        );
    }
}
