//! Repeating interval timer feeding the reporting loop.
//!
//! The timer never does any sampling itself: each firing becomes an
//! [`Event::Tick`] on the main loop's channel, and termination signals
//! arrive on the same channel as [`Event::Shutdown`]. The main thread is
//! the single consumer and does all the real work, one event at a time.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, error, trace};

/// Longest single sleep of the timer thread, so a disarm is noticed promptly.
const DISARM_POLL: Duration = Duration::from_millis(100);

/// Asynchronous notification delivered to the main loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// The interval timer fired.
    Tick,
    /// A termination signal was received.
    Shutdown,
}

/// Where the reporting loop is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// No timer armed; only a shutdown can happen.
    Idle,
    Armed,
    Reporting,
    Terminated,
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SchedulerState::Idle => "idle",
            SchedulerState::Armed => "armed",
            SchedulerState::Reporting => "reporting",
            SchedulerState::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum TimerError {
    #[error("invalid timer interval {0:?}")]
    InvalidInterval(Duration),
    #[error("set interval timer failed: {0}")]
    Spawn(#[source] std::io::Error),
}

/// A repeating real-time timer; dropping it disarms the timer.
pub struct IntervalTimer {
    interval: Duration,
    disarmed: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl IntervalTimer {
    /// Arms a timer that sends [`Event::Tick`] every `interval`.
    ///
    /// Deadlines are absolute (`armed_at + n * interval`), so a slow tick
    /// never pushes later ones back.
    pub fn arm(interval: Duration, events: Sender<Event>) -> Result<Self, TimerError> {
        let armed_at = Instant::now();
        // The first deadline must be representable; later overflow is
        // handled in the timer thread.
        if interval.is_zero() || armed_at.checked_add(interval).is_none() {
            return Err(TimerError::InvalidInterval(interval));
        }

        let disarmed = Arc::new(AtomicBool::new(false));
        let stop = disarmed.clone();

        let handle = std::thread::Builder::new()
            .name("interval-timer".to_string())
            .spawn(move || run_timer(armed_at, interval, &stop, &events))
            .map_err(TimerError::Spawn)?;

        debug!("interval timer armed: {:?}", interval);
        Ok(Self {
            interval,
            disarmed,
            handle: Some(handle),
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Stops further firings and waits for the timer thread to exit.
    pub fn disarm(mut self) {
        self.stop_thread();
    }

    fn stop_thread(&mut self) {
        self.disarmed.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for IntervalTimer {
    fn drop(&mut self) {
        self.stop_thread();
    }
}

fn run_timer(armed_at: Instant, interval: Duration, stop: &AtomicBool, events: &Sender<Event>) {
    let mut firings: u32 = 0;
    loop {
        firings = firings.saturating_add(1);
        let Some(deadline) = interval
            .checked_mul(firings)
            .and_then(|offset| armed_at.checked_add(offset))
        else {
            error!("interval timer deadline overflowed after {} firings", firings - 1);
            return;
        };

        loop {
            if stop.load(Ordering::SeqCst) {
                return;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            std::thread::sleep(remaining.min(DISARM_POLL));
        }

        trace!("interval timer fired (#{})", firings);
        if events.send(Event::Tick).is_err() {
            // Receiver gone: the main loop has exited.
            return;
        }
    }
}
