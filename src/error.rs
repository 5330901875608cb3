//! Fatal error type for the monitor.

use thiserror::Error;

use crate::clock::ClockError;
use crate::collector::CollectError;
use crate::report::SinkError;
use crate::scheduler::TimerError;

/// Conditions that stop the monitor with a non-zero exit status.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("clock calibration failed: {0}")]
    Clock(#[from] ClockError),
    #[error(transparent)]
    Timer(#[from] TimerError),
    #[error(transparent)]
    Sink(#[from] SinkError),
    #[error("baseline counter collection failed: {0}")]
    Baseline(#[source] CollectError),
}
